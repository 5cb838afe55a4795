//! Secret backend capability interface.
//!
//! Defines the single seam the orchestrator depends on. Every concrete store
//! (in-memory, environment, Vault) implements [`SecretBackend`] and is chosen
//! at startup through the [`BackendRegistry`](super::BackendRegistry).

use async_trait::async_trait;
use std::collections::BTreeMap;
use uuid::Uuid;

use super::context::OpContext;
use super::error::{Result, SecretsError};
use super::session::Session;

/// Configuration bundle handed to a backend factory.
///
/// `prefix` scopes every item name the backend exposes. `options` are opaque
/// backend-specific settings (region, project id, address, token, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendOptions {
    pub prefix: String,
    pub options: BTreeMap<String, String>,
}

impl BackendOptions {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into(), options: BTreeMap::new() }
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Look up an option, treating blank values as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str).filter(|value| !value.trim().is_empty())
    }

    /// Look up an option the backend cannot run without.
    pub fn require(&self, key: &str) -> Result<&str> {
        self.get(key).ok_or_else(|| {
            SecretsError::validation(format!("missing required backend option '{}'", key))
        })
    }

    /// Parse an optional numeric option.
    pub fn get_u64(&self, key: &str) -> Result<Option<u64>> {
        self.get(key)
            .map(|raw| {
                raw.trim().parse::<u64>().map_err(|e| {
                    SecretsError::validation(format!("backend option '{}' is invalid: {}", key, e))
                })
            })
            .transpose()
    }
}

/// Capability interface every secret store must satisfy.
///
/// Implementations are shared by all request tasks for the lifetime of the
/// process and MUST be safe for concurrent invocation; the orchestrator does
/// not serialize calls. Every operation takes an [`OpContext`] and must
/// return promptly with `Cancelled` once the context is cancelled.
///
/// Implementations classify their own native failures into the
/// [`ErrorKind`](super::ErrorKind) taxonomy where the mapping is clean and
/// report everything else as `Unknown`.
#[async_trait]
pub trait SecretBackend: Send + Sync + std::fmt::Debug {
    /// Registry name of this backend type.
    fn backend_type(&self) -> &str;

    /// Identity of this backend instance. Sessions are bound to it.
    fn instance_id(&self) -> Uuid;

    /// Establish or validate connectivity and configuration. Idempotent.
    async fn init(&self, ctx: &OpContext) -> Result<()>;

    /// Exchange credentials for a session.
    ///
    /// Invalid or expired credentials fail with `AuthenticationFailure`.
    async fn authenticate(&self, ctx: &OpContext) -> Result<Session>;

    /// Names of all items under this backend's prefix. Values are not fetched.
    async fn list_items(&self, ctx: &OpContext, session: &Session) -> Result<Vec<String>>;

    /// Existence probe, independent of [`SecretBackend::get_value`].
    async fn item_exists(&self, ctx: &OpContext, name: &str, session: &Session) -> Result<bool>;

    /// Fetch an item's value. Absent items fail with `NotFound`.
    async fn get_value(&self, ctx: &OpContext, name: &str, session: &Session) -> Result<String>;

    /// Store a new item. Behaviour for an existing name is backend-defined.
    async fn create_item(
        &self,
        ctx: &OpContext,
        name: &str,
        value: &str,
        session: &Session,
    ) -> Result<()>;

    async fn update_item(
        &self,
        ctx: &OpContext,
        name: &str,
        value: &str,
        session: &Session,
    ) -> Result<()>;

    async fn delete_item(&self, ctx: &OpContext, name: &str, session: &Session) -> Result<()>;

    /// Release client resources. Called exactly once, at shutdown.
    async fn close(&self) -> Result<()>;

    /// Whether [`SecretBackend::create_item_if_absent`] is atomic for this backend.
    fn supports_conditional_create(&self) -> bool {
        false
    }

    /// Atomically create an item only if the name is free.
    ///
    /// Returns `true` when the item was created and `false` when the name
    /// already existed. Only called when
    /// [`SecretBackend::supports_conditional_create`] returns `true`.
    async fn create_item_if_absent(
        &self,
        _ctx: &OpContext,
        _name: &str,
        _value: &str,
        _session: &Session,
    ) -> Result<bool> {
        Err(SecretsError::unknown(format!(
            "{} backend does not support conditional create",
            self.backend_type()
        )))
    }
}
