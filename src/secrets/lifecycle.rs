//! Backend session lifecycle.
//!
//! Owns the process-wide backend handle and drives it through
//! `Unauthenticated -> Authenticating -> Authenticated -> Closed`.
//!
//! Request traffic enters through [`BackendLifecycle::enter`], which hands out
//! a shared guard on the in-flight gate. [`BackendLifecycle::close`] cancels
//! the shutdown token, takes the gate exclusively once every guard has been
//! dropped, and only then releases the backend.

use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{RwLock, RwLockReadGuard};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::backend::SecretBackend;
use super::context::OpContext;
use super::error::{Result, SecretsError};
use super::session::Session;

/// Lifecycle state of the process-wide backend session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Unauthenticated,
    Authenticating,
    Authenticated,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Authenticating => "authenticating",
            Self::Authenticated => "authenticated",
            Self::Closed => "closed",
        };
        f.write_str(label)
    }
}

/// Shared guard held for the duration of one orchestrator operation.
pub type InFlight<'a> = RwLockReadGuard<'a, ()>;

pub struct BackendLifecycle {
    backend: Arc<dyn SecretBackend>,
    state: Mutex<SessionState>,
    gate: RwLock<()>,
    shutdown: CancellationToken,
    closed: AtomicBool,
}

impl fmt::Debug for BackendLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendLifecycle")
            .field("backend_type", &self.backend.backend_type())
            .field("state", &self.state())
            .finish()
    }
}

impl BackendLifecycle {
    pub fn new(backend: Arc<dyn SecretBackend>) -> Self {
        Self {
            backend,
            state: Mutex::new(SessionState::Unauthenticated),
            gate: RwLock::new(()),
            shutdown: CancellationToken::new(),
            closed: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> SessionState {
        *self.lock_state()
    }

    pub fn backend(&self) -> &Arc<dyn SecretBackend> {
        &self.backend
    }

    /// Root token every request context is derived from. Cancelled by `close`.
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    /// Initialize and authenticate the backend, exactly once.
    ///
    /// On failure the lifecycle returns to `Unauthenticated` and the error is
    /// returned unchanged; callers treat it as fatal.
    pub async fn start(&self, ctx: &OpContext) -> Result<Session> {
        {
            let mut state = self.lock_state();
            if *state != SessionState::Unauthenticated {
                return Err(SecretsError::validation(format!(
                    "backend session already started (state: {})",
                    *state
                )));
            }
            *state = SessionState::Authenticating;
        }

        let backend_type = self.backend.backend_type().to_string();
        match self.establish(ctx).await {
            Ok(session) => {
                *self.lock_state() = SessionState::Authenticated;
                info!(
                    backend_type = %backend_type,
                    session_id = %session.id(),
                    "Backend session established"
                );
                Ok(session)
            }
            Err(e) => {
                *self.lock_state() = SessionState::Unauthenticated;
                error!(backend_type = %backend_type, error = %e, "Backend startup failed");
                Err(e)
            }
        }
    }

    async fn establish(&self, ctx: &OpContext) -> Result<Session> {
        ctx.run(self.backend.init(ctx)).await?;
        debug!(backend_type = %self.backend.backend_type(), "Backend initialized");
        ctx.run(self.backend.authenticate(ctx)).await
    }

    /// Admit one operation. Fails with `BackendUnavailable` before `start`
    /// has succeeded and once `close` has begun.
    pub async fn enter(&self) -> Result<InFlight<'_>> {
        self.ensure_open()?;
        let guard = self.gate.read().await;
        // close() may have started while we waited for the gate.
        self.ensure_open()?;
        Ok(guard)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.shutdown.is_cancelled() {
            return Err(SecretsError::backend_unavailable("backend closed"));
        }
        match self.state() {
            SessionState::Authenticated => Ok(()),
            SessionState::Closed => Err(SecretsError::backend_unavailable("backend closed")),
            other => Err(SecretsError::backend_unavailable(format!(
                "backend session not established (state: {})",
                other
            ))),
        }
    }

    /// Release the backend. Only the first call has any effect.
    pub async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            debug!("Backend lifecycle already closed");
            return Ok(());
        }

        info!(backend_type = %self.backend.backend_type(), "Closing backend");
        self.shutdown.cancel();
        let _drained = self.gate.write().await;
        *self.lock_state() = SessionState::Closed;

        match self.backend.close().await {
            Ok(()) => {
                info!(backend_type = %self.backend.backend_type(), "Backend closed");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Backend reported an error while closing");
                Err(e)
            }
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        // The state is a plain enum; a poisoned lock still holds a valid value.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
