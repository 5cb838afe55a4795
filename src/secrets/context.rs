//! Cancellable, deadline-bound execution context for backend operations.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::error::{Result, SecretsError};

/// Execution context handed to every capability call.
///
/// Cancelling the context, or letting its deadline pass, aborts any
/// operation driven through [`OpContext::run`] with
/// [`SecretsError::Cancelled`] or [`SecretsError::DeadlineExceeded`]
/// respectively. Neither is ever reported as `BackendUnavailable`.
#[derive(Debug, Clone)]
pub struct OpContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl OpContext {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self { token: CancellationToken::new(), deadline: None }
    }

    /// A context cancelled together with `parent`.
    pub fn from_token(parent: &CancellationToken) -> Self {
        Self { token: parent.child_token(), deadline: None }
    }

    /// Derive a context that is cancelled whenever this one is.
    pub fn child(&self) -> Self {
        Self { token: self.token.child_token(), deadline: self.deadline }
    }

    /// Tighten the deadline to at most `timeout` from now.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        self.deadline = Some(match self.deadline {
            Some(existing) if existing < candidate => existing,
            _ => candidate,
        });
        self
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fail immediately if the context is already cancelled or expired.
    pub fn check(&self) -> Result<()> {
        if self.token.is_cancelled() {
            return Err(SecretsError::Cancelled);
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(SecretsError::DeadlineExceeded);
        }
        Ok(())
    }

    /// Drive `operation` to completion unless the context is cancelled or
    /// its deadline passes first, in which case the operation is dropped.
    pub async fn run<F, T>(&self, operation: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.check()?;

        let deadline = self.deadline;
        let expired = async move {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(SecretsError::Cancelled),
            _ = expired => Err(SecretsError::DeadlineExceeded),
            result = operation => result,
        }
    }
}

impl Default for OpContext {
    fn default() -> Self {
        Self::background()
    }
}
