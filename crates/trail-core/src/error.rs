#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Tool '{tool}' unavailable: {reason}")]
    ToolUnavailable { tool: String, reason: String },

    #[error("Could not parse {tool} output: {reason}")]
    ParseFailure { tool: String, reason: String },

    #[error("Session '{0}' not found")]
    SessionNotFound(String),

    #[error("No active session")]
    NoActiveSession,

    #[error("Session '{0}' is already active")]
    AlreadyActive(String),

    #[error("Invalid session ID '{0}': expected 1-64 characters of [A-Za-z0-9_-]")]
    InvalidSessionId(String),

    #[error("Cannot {action} a session that is {state}")]
    InvalidTransition { action: String, state: String },

    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Session '{0}' has no recorded commands")]
    EmptySession(String),
}

impl AppError {
    /// Whether this error is a precondition failure that should end the
    /// process with a non-zero exit code.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::SessionNotFound(_)
                | Self::NoActiveSession
                | Self::AlreadyActive(_)
                | Self::InvalidSessionId(_)
                | Self::InvalidTransition { .. }
                | Self::EmptySession(_)
        )
    }
}
