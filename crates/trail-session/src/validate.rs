//! Session id generation and validation

use anyhow::Result;
use trail_core::AppError;

const MAX_ID_LEN: usize = 64;

/// Generate a new session id (ULID, 26 Crockford base32 characters).
pub fn new_session_id() -> String {
    ulid::Ulid::new().to_string()
}

/// Accept ids that are safe as a file name and a URL path segment.
///
/// Locally generated ids are ULIDs, but ids arriving from the remote are
/// opaque, so only the character set and length are enforced.
pub fn validate_session_id(id: &str) -> Result<()> {
    let valid = !id.is_empty()
        && id.len() <= MAX_ID_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if !valid {
        return Err(AppError::InvalidSessionId(id.to_string()).into());
    }
    Ok(())
}
