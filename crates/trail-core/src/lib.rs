//! Shared types for trail: the error taxonomy and the normalized error record.

pub mod error;
pub mod types;

pub use error::AppError;
pub use types::{ErrorRecord, ErrorSource, Location, OutputFormat, render_error_record};
