//! Synchronization with the remote trail service: session upload and
//! download, the shared resolution index, and cloud AI suggestions.

pub mod api;
pub mod client;
pub mod sync;

pub use api::{RemoteApi, Resolution, Suggestion};
pub use client::HttpRemote;
pub use sync::RemoteSync;
