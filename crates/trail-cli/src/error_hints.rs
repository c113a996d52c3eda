//! User-facing hints and exit codes for command failures.

use anyhow::Error;
use trail_core::AppError;

const HINT_NO_ACTIVE: &str = "hint: start a session with 'trail start' or pick one with 'trail checkout <id>'";
const HINT_SESSION_NOT_FOUND: &str = "hint: list local sessions with 'trail list'";
const HINT_ALREADY_ACTIVE: &str =
    "hint: finish it with 'trail end', or replace it with 'trail start --force'";
const HINT_EMPTY_SESSION: &str =
    "hint: record commands with 'trail record start' and 'trail exec -- <command>'";
const HINT_NOT_RECORDING: &str = "hint: begin recording with 'trail record start'";
const HINT_ENDED: &str = "hint: ended sessions are read-only; start a new one with 'trail start'";
const HINT_AUTH: &str = "hint: set TRAIL_TOKEN or run 'trail config set-token <token>'";
const HINT_NETWORK: &str =
    "hint: check that the trail service is reachable (override the endpoint with TRAIL_API_URL)";

fn find_app_error(err: &Error) -> Option<&AppError> {
    err.chain().find_map(|cause| cause.downcast_ref::<AppError>())
}

pub(crate) fn suggest_fix(err: &Error) -> Option<&'static str> {
    match find_app_error(err)? {
        AppError::NoActiveSession => Some(HINT_NO_ACTIVE),
        AppError::SessionNotFound(_) => Some(HINT_SESSION_NOT_FOUND),
        AppError::AlreadyActive(_) => Some(HINT_ALREADY_ACTIVE),
        AppError::EmptySession(_) => Some(HINT_EMPTY_SESSION),
        AppError::InvalidTransition { state, .. } if state == "ended" => Some(HINT_ENDED),
        AppError::InvalidTransition { .. } => Some(HINT_NOT_RECORDING),
        AppError::AuthError(_) => Some(HINT_AUTH),
        AppError::NetworkError(_) => Some(HINT_NETWORK),
        _ => None,
    }
}

/// Precondition failures and unexpected errors exit 1; remote and tool
/// problems are reported but exit 0.
pub(crate) fn exit_code(err: &Error) -> i32 {
    match find_app_error(err) {
        Some(app_err) if app_err.is_precondition() => 1,
        Some(_) => 0,
        None => 1,
    }
}
