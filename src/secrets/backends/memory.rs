//! In-memory secret backend
//!
//! Keeps items in a process-local map. Intended for tests and local
//! development; nothing survives a restart.
//!
//! ## Options
//!
//! - `token` / `expected_token`: when `expected_token` is set, `authenticate`
//!   fails unless `token` matches it
//! - `session_ttl_secs`: issue sessions that expire after this many seconds

use async_trait::async_trait;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use crate::secrets::backend::{BackendOptions, SecretBackend};
use crate::secrets::context::OpContext;
use crate::secrets::error::{Result, SecretsError};
use crate::secrets::registry::BackendRegistry;
use crate::secrets::session::Session;
use crate::secrets::types::SecretString;

/// Registry name of this backend.
pub const BACKEND_TYPE: &str = "memory";

/// Register the in-memory backend.
pub fn register(registry: &mut BackendRegistry) {
    registry.register(BACKEND_TYPE, |options| Ok(Box::new(MemoryBackend::new(options)?)));
}

/// Process-local secret store.
///
/// Keys are stored as `prefix/name`; only keys under this instance's prefix
/// are visible through the capability interface. Conditional create is
/// atomic because the existence check and insert happen under one write lock.
pub struct MemoryBackend {
    instance_id: Uuid,
    prefix: String,
    token: Option<SecretString>,
    expected_token: Option<SecretString>,
    session_ttl: Option<Duration>,
    store: RwLock<BTreeMap<String, String>>,
    closed: AtomicBool,
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let items = self.store.read().map(|store| store.len()).unwrap_or_default();
        f.debug_struct("MemoryBackend")
            .field("instance_id", &self.instance_id)
            .field("prefix", &self.prefix)
            .field("items", &items)
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl MemoryBackend {
    pub fn new(options: &BackendOptions) -> Result<Self> {
        Ok(Self {
            instance_id: Uuid::new_v4(),
            prefix: options.prefix.trim_matches('/').to_string(),
            token: options.get("token").map(SecretString::from),
            expected_token: options.get("expected_token").map(SecretString::from),
            session_ttl: options.get_u64("session_ttl_secs")?.map(Duration::from_secs),
            store: RwLock::new(BTreeMap::new()),
            closed: AtomicBool::new(false),
        })
    }

    /// Insert an item directly, bypassing sessions.
    #[cfg(test)]
    pub(crate) fn seed(&self, name: &str, value: &str) {
        let key = self.key(name);
        self.store.write().expect("memory store poisoned").insert(key, value.to_string());
    }

    fn key(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", self.prefix, name)
        }
    }

    fn strip<'a>(&self, key: &'a str) -> Option<&'a str> {
        if self.prefix.is_empty() {
            Some(key)
        } else {
            key.strip_prefix(self.prefix.as_str()).and_then(|rest| rest.strip_prefix('/'))
        }
    }

    /// Common preconditions for every item operation.
    fn guard(&self, ctx: &OpContext, session: &Session) -> Result<()> {
        ctx.check()?;
        if self.closed.load(Ordering::Acquire) {
            return Err(SecretsError::backend_unavailable("memory backend is closed"));
        }
        session.validate_for(self.instance_id)
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, BTreeMap<String, String>>> {
        self.store.read().map_err(|_| SecretsError::unknown("memory store lock poisoned"))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, BTreeMap<String, String>>> {
        self.store.write().map_err(|_| SecretsError::unknown("memory store lock poisoned"))
    }
}

#[async_trait]
impl SecretBackend for MemoryBackend {
    fn backend_type(&self) -> &str {
        BACKEND_TYPE
    }

    fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    async fn init(&self, ctx: &OpContext) -> Result<()> {
        ctx.check()?;
        if self.closed.load(Ordering::Acquire) {
            return Err(SecretsError::backend_unavailable("memory backend is closed"));
        }
        debug!(prefix = %self.prefix, "Memory backend ready");
        Ok(())
    }

    async fn authenticate(&self, ctx: &OpContext) -> Result<Session> {
        ctx.check()?;
        if let Some(expected) = &self.expected_token {
            match &self.token {
                Some(token) if token == expected => {}
                Some(_) => return Err(SecretsError::authentication_failed("invalid token")),
                None => return Err(SecretsError::authentication_failed("token is required")),
            }
        }

        let mut session = Session::new(BACKEND_TYPE, self.instance_id);
        if let Some(ttl) = self.session_ttl {
            session = session.with_ttl(ttl);
        }
        if let Some(token) = &self.token {
            session = session.with_credential(token.clone());
        }
        info!(session_id = %session.id(), "Authenticated against memory backend");
        Ok(session)
    }

    async fn list_items(&self, ctx: &OpContext, session: &Session) -> Result<Vec<String>> {
        self.guard(ctx, session)?;
        let store = self.read()?;
        Ok(store.keys().filter_map(|key| self.strip(key)).map(str::to_string).collect())
    }

    async fn item_exists(&self, ctx: &OpContext, name: &str, session: &Session) -> Result<bool> {
        self.guard(ctx, session)?;
        Ok(self.read()?.contains_key(&self.key(name)))
    }

    async fn get_value(&self, ctx: &OpContext, name: &str, session: &Session) -> Result<String> {
        self.guard(ctx, session)?;
        self.read()?.get(&self.key(name)).cloned().ok_or_else(|| SecretsError::not_found(name))
    }

    async fn create_item(
        &self,
        ctx: &OpContext,
        name: &str,
        value: &str,
        session: &Session,
    ) -> Result<()> {
        self.guard(ctx, session)?;
        // Last write wins for a pre-existing name.
        self.write()?.insert(self.key(name), value.to_string());
        Ok(())
    }

    async fn update_item(
        &self,
        ctx: &OpContext,
        name: &str,
        value: &str,
        session: &Session,
    ) -> Result<()> {
        self.guard(ctx, session)?;
        match self.write()?.get_mut(&self.key(name)) {
            Some(existing) => {
                *existing = value.to_string();
                Ok(())
            }
            None => Err(SecretsError::not_found(name)),
        }
    }

    async fn delete_item(&self, ctx: &OpContext, name: &str, session: &Session) -> Result<()> {
        self.guard(ctx, session)?;
        self.write()?.remove(&self.key(name)).map(|_| ()).ok_or_else(|| SecretsError::not_found(name))
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        info!("Memory backend closed");
        Ok(())
    }

    fn supports_conditional_create(&self) -> bool {
        true
    }

    async fn create_item_if_absent(
        &self,
        ctx: &OpContext,
        name: &str,
        value: &str,
        session: &Session,
    ) -> Result<bool> {
        self.guard(ctx, session)?;
        match self.write()?.entry(self.key(name)) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(value.to_string());
                Ok(true)
            }
        }
    }
}
