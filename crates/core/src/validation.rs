//! Input validation utilities.
//!
//! Checks applied by the state adapters before a key reaches storage.

use crate::constants::COMPOSITE_KEY_NAMESPACE;
use crate::state::{StateError, StateResult};

/// Validates that `key` can be used as a world-state key.
///
/// The host store rejects empty keys and reserves keys that begin with U+0000 for its
/// composite-key namespace, so both are refused here as well.
///
/// # Errors
///
/// Returns [`StateError::InvalidKey`] if the key is empty or starts with U+0000.
pub fn validate_state_key(key: &str) -> StateResult<()> {
    if key.is_empty() {
        return Err(StateError::InvalidKey("key must not be empty".into()));
    }

    if key.starts_with(COMPOSITE_KEY_NAMESPACE) {
        return Err(StateError::InvalidKey(format!(
            "key {:?} starts with the reserved composite-key namespace",
            key
        )));
    }

    Ok(())
}
