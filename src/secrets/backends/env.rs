//! Environment variable secret backend
//!
//! Read-only backend that serves secrets from process environment variables.
//! Intended for development and for container platforms that inject secrets
//! as variables; it is NOT a substitute for a real secrets manager.
//!
//! # Naming
//!
//! An item `name` under prefix `app` is read from `APP_NAME`: both parts are
//! upper-cased and every character outside `[A-Za-z0-9]` becomes `_`. Listing
//! reverses the prefix strip and lower-cases the remainder, so the mapping is
//! lossy: `db-password` is stored as `APP_DB_PASSWORD` and listed as
//! `db_password`. Both names resolve to the same variable on `get`.
//!
//! # Limitations
//!
//! - create, update and delete fail with `ValidationError` (read-only)
//! - no versioning, no authentication
//! - the prefix may not fall inside the server's own `VAULTGATE_` namespace,
//!   and variables the server reads as configuration (`PORT`, `VAULT_TOKEN`,
//!   ...) are never listed or served, whatever the prefix

use async_trait::async_trait;
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;
use uuid::Uuid;

use crate::config::{is_config_var, CONFIG_ENV_PREFIX};
use crate::secrets::backend::{BackendOptions, SecretBackend};
use crate::secrets::context::OpContext;
use crate::secrets::error::{Result, SecretsError};
use crate::secrets::registry::BackendRegistry;
use crate::secrets::session::Session;

/// Registry name of this backend.
pub const BACKEND_TYPE: &str = "env";

/// Register the environment variable backend.
pub fn register(registry: &mut BackendRegistry) {
    registry.register(BACKEND_TYPE, |options| Ok(Box::new(EnvVarBackend::new(options)?)));
}

/// Read-only backend over process environment variables.
#[derive(Debug)]
pub struct EnvVarBackend {
    instance_id: Uuid,
    var_prefix: String,
    closed: AtomicBool,
}

impl EnvVarBackend {
    pub fn new(options: &BackendOptions) -> Result<Self> {
        let prefix = normalize(&options.prefix);
        if prefix.is_empty() {
            return Err(SecretsError::validation(
                "env backend requires a non-empty prefix to scope variable names",
            ));
        }
        let var_prefix = format!("{}_", prefix);
        if var_prefix.starts_with(CONFIG_ENV_PREFIX) {
            return Err(SecretsError::validation(format!(
                "env backend prefix '{}' overlaps the server configuration namespace {}*; \
                 choose another prefix",
                options.prefix, CONFIG_ENV_PREFIX
            )));
        }
        Ok(Self { instance_id: Uuid::new_v4(), var_prefix, closed: AtomicBool::new(false) })
    }

    /// Environment variable consulted for item `name`.
    pub fn var_name(&self, name: &str) -> String {
        format!("{}{}", self.var_prefix, normalize(name))
    }

    fn guard(&self, ctx: &OpContext, session: &Session) -> Result<()> {
        ctx.check()?;
        if self.closed.load(Ordering::Acquire) {
            return Err(SecretsError::backend_unavailable("env backend is closed"));
        }
        session.validate_for(self.instance_id)
    }

    fn read_only(&self, name: &str) -> SecretsError {
        SecretsError::validation(format!(
            "cannot modify '{}': env backend is read-only",
            name
        ))
    }
}

fn normalize(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect()
}

#[async_trait]
impl SecretBackend for EnvVarBackend {
    fn backend_type(&self) -> &str {
        BACKEND_TYPE
    }

    fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    async fn init(&self, ctx: &OpContext) -> Result<()> {
        ctx.check()?;
        info!(var_prefix = %self.var_prefix, "Environment backend ready");
        Ok(())
    }

    async fn authenticate(&self, ctx: &OpContext) -> Result<Session> {
        ctx.check()?;
        Ok(Session::new(BACKEND_TYPE, self.instance_id))
    }

    async fn list_items(&self, ctx: &OpContext, session: &Session) -> Result<Vec<String>> {
        self.guard(ctx, session)?;
        let mut names: Vec<String> = env::vars_os()
            .filter_map(|(key, _)| key.into_string().ok())
            .filter(|key| !is_config_var(key))
            .filter_map(|key| {
                key.strip_prefix(self.var_prefix.as_str())
                    .filter(|rest| !rest.is_empty())
                    .map(str::to_lowercase)
            })
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }

    async fn item_exists(&self, ctx: &OpContext, name: &str, session: &Session) -> Result<bool> {
        self.guard(ctx, session)?;
        let var = self.var_name(name);
        Ok(!is_config_var(&var) && env::var_os(var).is_some())
    }

    async fn get_value(&self, ctx: &OpContext, name: &str, session: &Session) -> Result<String> {
        self.guard(ctx, session)?;
        let var = self.var_name(name);
        if is_config_var(&var) {
            return Err(SecretsError::not_found(name));
        }
        match env::var(var) {
            Ok(value) => Ok(value),
            Err(env::VarError::NotPresent) => Err(SecretsError::not_found(name)),
            Err(env::VarError::NotUnicode(_)) => Err(SecretsError::unknown(format!(
                "environment value for '{}' is not valid UTF-8",
                name
            ))),
        }
    }

    async fn create_item(
        &self,
        ctx: &OpContext,
        name: &str,
        _value: &str,
        session: &Session,
    ) -> Result<()> {
        self.guard(ctx, session)?;
        Err(self.read_only(name))
    }

    async fn update_item(
        &self,
        ctx: &OpContext,
        name: &str,
        _value: &str,
        session: &Session,
    ) -> Result<()> {
        self.guard(ctx, session)?;
        Err(self.read_only(name))
    }

    async fn delete_item(&self, ctx: &OpContext, name: &str, session: &Session) -> Result<()> {
        self.guard(ctx, session)?;
        Err(self.read_only(name))
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
