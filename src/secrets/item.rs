//! Secret item and name validation.

use std::fmt;

use super::error::{Result, SecretsError};

/// Longest accepted secret name, in bytes.
pub const MAX_NAME_LEN: usize = 256;

/// A named secret value as stored in a backend.
#[derive(Clone, PartialEq, Eq)]
pub struct Item {
    pub name: String,
    pub value: String,
}

impl Item {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into() }
    }
}

impl fmt::Debug for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Item").field("name", &self.name).field("value", &"[REDACTED]").finish()
    }
}

/// Check that a caller-supplied secret name is usable by every backend.
///
/// Rejects empty or whitespace-only names, names longer than
/// [`MAX_NAME_LEN`] bytes, and names containing control characters.
pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(SecretsError::validation("secret name cannot be empty"));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(SecretsError::validation(format!(
            "secret name exceeds {} bytes",
            MAX_NAME_LEN
        )));
    }
    if name.chars().any(char::is_control) {
        return Err(SecretsError::validation("secret name contains control characters"));
    }
    Ok(())
}
