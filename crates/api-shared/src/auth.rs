//! API key authentication.
//!
//! The expected key is resolved at startup and handed in by the caller; nothing here reads
//! the environment.

/// Header carrying the caller's API key.
pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing x-api-key header")]
    MissingKey,
    #[error("Invalid API key")]
    InvalidKey,
}

/// Validates the provided API key against the expected key.
///
/// When `expected_key` is `None`, authentication is disabled and every request passes.
pub fn validate_api_key(
    provided_key: Option<&str>,
    expected_key: Option<&str>,
) -> Result<(), AuthError> {
    let Some(expected_key) = expected_key else {
        return Ok(());
    };

    match provided_key {
        None => Err(AuthError::MissingKey),
        Some(key) if key == expected_key => Ok(()),
        Some(_) => Err(AuthError::InvalidKey),
    }
}
