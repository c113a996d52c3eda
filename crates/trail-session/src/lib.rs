//! Debugging sessions: the persisted model, its on-disk store and the
//! lifecycle transitions driven by the CLI.

pub mod git;
pub mod lifecycle;
pub mod state;
pub mod store;
pub mod validate;

pub use lifecycle::{RecordStartOutcome, RecordStopOutcome, SessionLifecycle};
pub use state::{
    CommandEntry, DiffEntry, GitContext, LifecycleState, Session, SessionMetadata, SessionStatus,
};
pub use store::SessionStore;
pub use validate::{new_session_id, validate_session_id};
