//! Error taxonomy for secret backend and orchestration operations.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Result type for secrets operations.
pub type Result<T> = std::result::Result<T, SecretsError>;

/// Backend-agnostic classification of a failed secrets operation.
///
/// Every [`SecretsError`] maps to exactly one kind. The boundary layer only
/// ever looks at the kind when choosing a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    AuthenticationFailure,
    BackendUnavailable,
    ValidationError,
    /// The operation's context was cancelled or its deadline expired.
    Cancelled,
    Unknown,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::AlreadyExists => "already_exists",
            Self::AuthenticationFailure => "authentication_failure",
            Self::BackendUnavailable => "backend_unavailable",
            Self::ValidationError => "validation_error",
            Self::Cancelled => "cancelled",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur during secrets operations.
///
/// Messages carry secret names but never secret values.
#[derive(Error, Debug)]
pub enum SecretsError {
    /// Secret not found in the backend.
    #[error("Secret not found: {name}")]
    NotFound { name: String },

    /// A secret with this name already exists.
    #[error("Secret already exists: {name}")]
    AlreadyExists { name: String },

    /// Credentials were rejected, expired, or belong to another backend instance.
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// The backend could not be reached or refused to serve the request.
    #[error("Backend unavailable: {message}")]
    BackendUnavailable { message: String },

    /// Caller-supplied input was rejected.
    #[error("Validation failed: {message}")]
    Validation { message: String },

    /// The operation's context was cancelled before it completed.
    #[error("Operation cancelled")]
    Cancelled,

    /// The operation's context deadline passed before it completed.
    #[error("Operation exceeded its deadline")]
    DeadlineExceeded,

    /// No factory is registered under the requested backend name.
    #[error("Unknown secret backend '{requested}' (available: {})", .available.join(", "))]
    UnknownBackend { requested: String, available: Vec<String> },

    /// Backend failure that does not map onto a more specific kind.
    #[error("Backend error: {message}")]
    Unknown {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl SecretsError {
    /// Create a not found error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Create an already exists error.
    pub fn already_exists(name: impl Into<String>) -> Self {
        Self::AlreadyExists { name: name.into() }
    }

    /// Create an authentication failed error.
    pub fn authentication_failed(message: impl Into<String>) -> Self {
        Self::AuthenticationFailed { message: message.into() }
    }

    /// Create a backend unavailable error.
    pub fn backend_unavailable(message: impl Into<String>) -> Self {
        Self::BackendUnavailable { message: message.into() }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }

    /// Create an unclassified backend error.
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::Unknown { message: message.into(), source: None }
    }

    /// Create an unclassified backend error that keeps its cause.
    pub fn unknown_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Unknown { message: message.into(), source: Some(Box::new(source)) }
    }

    /// The taxonomy kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::AuthenticationFailed { .. } => ErrorKind::AuthenticationFailure,
            Self::BackendUnavailable { .. } => ErrorKind::BackendUnavailable,
            Self::Validation { .. } => ErrorKind::ValidationError,
            Self::Cancelled | Self::DeadlineExceeded => ErrorKind::Cancelled,
            Self::UnknownBackend { .. } | Self::Unknown { .. } => ErrorKind::Unknown,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}
