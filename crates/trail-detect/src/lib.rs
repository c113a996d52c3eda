//! Error detection: an ordered chain of strategies (lint, syntax check) whose
//! first informative result is normalized into [`trail_core::ErrorRecord`]s.

pub mod lint;
pub mod matchers;
pub mod pipeline;
pub mod snippet;
pub mod strategy;
pub mod syntax;
pub mod worktree;

pub use matchers::{TextMatch, extract_from_text};
pub use pipeline::{DetectionPipeline, user_provided_fallback};
pub use strategy::{Strategy, StrategyOutcome};
pub use worktree::modified_files;
