//! # Error Handling
//!
//! Process-level errors for vaultgate startup and serving. Request-time
//! failures use [`SecretsError`](crate::secrets::SecretsError) and are mapped
//! to HTTP responses by [`ApiError`](crate::api::error::ApiError).

use crate::secrets::SecretsError;

/// Custom result type for vaultgate startup operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for vaultgate startup
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Backend selection, initialization or authentication failures
    #[error("Secret backend error: {0}")]
    Secrets(#[from] SecretsError),

    /// Listener and HTTP server errors
    #[error("Transport error: {0}")]
    Transport(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secrets_error_converts() {
        let err: Error = SecretsError::authentication_failed("bad token").into();
        assert!(matches!(err, Error::Secrets(_)));
        assert!(err.to_string().contains("bad token"));
    }

    #[test]
    fn test_constructors() {
        assert_eq!(Error::config("missing backend").to_string(), "Configuration error: missing backend");
        assert!(matches!(Error::transport("bind failed"), Error::Transport(_)));
    }
}
