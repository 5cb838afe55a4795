//! Authenticated backend session.

use chrono::{DateTime, Utc};
use std::fmt;
use std::time::{Duration, Instant};
use uuid::Uuid;

use super::error::{Result, SecretsError};
use super::types::SecretString;

/// Authenticated context produced by exactly one
/// [`SecretBackend::authenticate`](super::SecretBackend::authenticate) call.
///
/// A session is immutable once issued and is shared by every request task
/// for the lifetime of the process. It is bound to the backend instance that
/// issued it: presenting it to any other instance fails with
/// `AuthenticationFailure`, as does presenting it after it expired. There is
/// no refresh path.
#[derive(Clone)]
pub struct Session {
    id: Uuid,
    backend_type: String,
    instance_id: Uuid,
    issued_at: DateTime<Utc>,
    expires_at: Option<Instant>,
    credential: Option<SecretString>,
}

impl Session {
    /// Issue a session for the backend instance `instance_id`.
    pub fn new(backend_type: impl Into<String>, instance_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            backend_type: backend_type.into(),
            instance_id,
            issued_at: Utc::now(),
            expires_at: None,
            credential: None,
        }
    }

    /// Limit the session to `ttl` from now.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.expires_at = Some(Instant::now() + ttl);
        self
    }

    /// Attach the backend credential the session was established with.
    pub fn with_credential(mut self, credential: SecretString) -> Self {
        self.credential = Some(credential);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn backend_type(&self) -> &str {
        &self.backend_type
    }

    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn credential(&self) -> Option<&SecretString> {
        self.credential.as_ref()
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Check that this session may be used against backend instance `instance_id`.
    pub fn validate_for(&self, instance_id: Uuid) -> Result<()> {
        if self.instance_id != instance_id {
            return Err(SecretsError::authentication_failed(format!(
                "session {} was issued by another {} backend instance",
                self.id, self.backend_type
            )));
        }
        if self.is_expired() {
            return Err(SecretsError::authentication_failed(format!(
                "session {} has expired; restart the process to re-authenticate",
                self.id
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("backend_type", &self.backend_type)
            .field("instance_id", &self.instance_id)
            .field("issued_at", &self.issued_at)
            .field("expires", &self.expires_at.is_some())
            .field("credential", &self.credential)
            .finish()
    }
}
