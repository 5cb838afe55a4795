//! HashiCorp Vault KV v2 secret backend.
//!
//! Items live at `<mount>/data/<prefix>/<name>` and are stored as a single
//! field map `{"value": <secret>}`.
//!
//! # Options
//!
//! - `address` (required): Vault server address
//! - `token` (required): Vault token
//! - `namespace`: Vault Enterprise namespace
//! - `mount`: KV v2 mount path (default: `secret`)
//!
//! # Error mapping
//!
//! | Vault response | Kind |
//! |---|---|
//! | 401 / 403 | `AuthenticationFailure` |
//! | 404 | `NotFound` |
//! | transport failure | `BackendUnavailable` |
//! | anything else | `Unknown` |

use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info};
use uuid::Uuid;
use vaultrs::client::{VaultClient, VaultClientSettingsBuilder};
use vaultrs::error::ClientError;
use vaultrs::kv2;

use crate::secrets::backend::{BackendOptions, SecretBackend};
use crate::secrets::context::OpContext;
use crate::secrets::error::{Result, SecretsError};
use crate::secrets::registry::BackendRegistry;
use crate::secrets::session::Session;
use crate::secrets::types::SecretString;

/// Registry name of this backend.
pub const BACKEND_TYPE: &str = "vault";

const DEFAULT_MOUNT: &str = "secret";
const VALUE_FIELD: &str = "value";

/// Register the Vault KV v2 backend.
pub fn register(registry: &mut BackendRegistry) {
    registry.register(BACKEND_TYPE, |options| Ok(Box::new(VaultBackend::new(options)?)));
}

/// Vault KV v2 backend.
pub struct VaultBackend {
    instance_id: Uuid,
    client: VaultClient,
    address: String,
    mount: String,
    prefix: String,
    token: SecretString,
    closed: AtomicBool,
}

impl std::fmt::Debug for VaultBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultBackend")
            .field("instance_id", &self.instance_id)
            .field("address", &self.address)
            .field("mount", &self.mount)
            .field("prefix", &self.prefix)
            .field("client", &"[VaultClient]")
            .finish()
    }
}

impl VaultBackend {
    /// Build the client. No network traffic happens until `init`.
    pub fn new(options: &BackendOptions) -> Result<Self> {
        let address = options.require("address")?.to_string();
        let token = SecretString::from(options.require("token")?);
        let mount = options.get("mount").unwrap_or(DEFAULT_MOUNT).trim_matches('/').to_string();

        let mut settings_builder = VaultClientSettingsBuilder::default();
        settings_builder.address(&address);
        settings_builder.token(token.expose_secret());
        if let Some(namespace) = options.get("namespace") {
            settings_builder.namespace(Some(namespace.to_string()));
        }

        let settings = settings_builder.build().map_err(|e| {
            SecretsError::validation(format!("Invalid Vault configuration: {}", e))
        })?;
        let client = VaultClient::new(settings).map_err(|e| {
            SecretsError::unknown_with_source("Failed to create Vault client", e)
        })?;

        Ok(Self {
            instance_id: Uuid::new_v4(),
            client,
            address,
            mount,
            prefix: options.prefix.trim_matches('/').to_string(),
            token,
            closed: AtomicBool::new(false),
        })
    }

    fn path(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", self.prefix, name)
        }
    }

    fn guard(&self, ctx: &OpContext, session: &Session) -> Result<()> {
        ctx.check()?;
        if self.closed.load(Ordering::Acquire) {
            return Err(SecretsError::backend_unavailable("vault backend is closed"));
        }
        session.validate_for(self.instance_id)
    }

    async fn write(&self, ctx: &OpContext, name: &str, value: &str) -> Result<()> {
        let path = self.path(name);
        let data = HashMap::from([(VALUE_FIELD.to_string(), value.to_string())]);
        request(ctx, kv2::set(&self.client, &self.mount, &path, &data))
            .await?
            .map_err(|e| {
                error!(error = %e, name = %name, "Failed to write secret to Vault");
                classify(e, name)
            })?;
        Ok(())
    }
}

/// Race a Vault request against the context, keeping the native error for
/// status-specific handling by the caller.
async fn request<F, T>(ctx: &OpContext, call: F) -> Result<std::result::Result<T, ClientError>>
where
    F: Future<Output = std::result::Result<T, ClientError>>,
{
    ctx.run(async move { Ok(call.await) }).await
}

/// Map a vaultrs failure onto the error taxonomy.
fn classify(err: ClientError, name: &str) -> SecretsError {
    match err {
        ClientError::APIError { code: 404, .. } => SecretsError::not_found(name),
        ClientError::APIError { code: 401 | 403, errors } => {
            SecretsError::authentication_failed(format!("Vault denied access: {}", errors.join("; ")))
        }
        ClientError::RestClientError { source } => {
            SecretsError::backend_unavailable(format!("Vault unreachable: {}", source))
        }
        other => SecretsError::unknown_with_source("Vault request failed", other),
    }
}

#[async_trait]
impl SecretBackend for VaultBackend {
    fn backend_type(&self) -> &str {
        BACKEND_TYPE
    }

    fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    async fn init(&self, ctx: &OpContext) -> Result<()> {
        match request(ctx, vaultrs::sys::health(&self.client)).await? {
            Ok(_) => {
                info!(address = %self.address, mount = %self.mount, "Connected to Vault");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, address = %self.address, "Vault health check failed");
                Err(SecretsError::backend_unavailable(format!("Vault health check failed: {}", e)))
            }
        }
    }

    async fn authenticate(&self, ctx: &OpContext) -> Result<Session> {
        let lookup = request(ctx, vaultrs::token::lookup_self(&self.client)).await?;
        match lookup {
            Ok(_) => {
                let session = Session::new(BACKEND_TYPE, self.instance_id)
                    .with_credential(self.token.clone());
                info!(session_id = %session.id(), "Authenticated against Vault");
                Ok(session)
            }
            Err(ClientError::APIError { code: 400 | 401 | 403, .. }) => {
                Err(SecretsError::authentication_failed("Vault rejected the configured token"))
            }
            Err(e) => Err(classify(e, "token")),
        }
    }

    async fn list_items(&self, ctx: &OpContext, session: &Session) -> Result<Vec<String>> {
        self.guard(ctx, session)?;
        match request(ctx, kv2::list(&self.client, &self.mount, &self.prefix)).await? {
            // Trailing '/' marks a sub-folder, not an item.
            Ok(keys) => Ok(keys.into_iter().filter(|key| !key.ends_with('/')).collect()),
            Err(ClientError::APIError { code: 404, .. }) => Ok(Vec::new()),
            Err(e) => {
                error!(error = %e, prefix = %self.prefix, "Failed to list secrets from Vault");
                Err(classify(e, &self.prefix))
            }
        }
    }

    async fn item_exists(&self, ctx: &OpContext, name: &str, session: &Session) -> Result<bool> {
        self.guard(ctx, session)?;
        let path = self.path(name);
        match request(ctx, kv2::read_metadata(&self.client, &self.mount, &path)).await? {
            Ok(_) => Ok(true),
            Err(ClientError::APIError { code: 404, .. }) => Ok(false),
            Err(e) => Err(classify(e, name)),
        }
    }

    async fn get_value(&self, ctx: &OpContext, name: &str, session: &Session) -> Result<String> {
        self.guard(ctx, session)?;
        let path = self.path(name);
        let secret: HashMap<String, String> =
            request(ctx, kv2::read(&self.client, &self.mount, &path))
                .await?
                .map_err(|e| classify(e, name))?;

        secret.get(VALUE_FIELD).cloned().ok_or_else(|| {
            SecretsError::unknown(format!("Secret '{}' has no '{}' field", name, VALUE_FIELD))
        })
    }

    async fn create_item(
        &self,
        ctx: &OpContext,
        name: &str,
        value: &str,
        session: &Session,
    ) -> Result<()> {
        self.guard(ctx, session)?;
        self.write(ctx, name, value).await?;
        info!(name = %name, mount = %self.mount, "Stored secret in Vault");
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
        self.write(ctx, name, value).await?;
        info!(name = %name, mount = %self.mount, "Updated secret in Vault");
        Ok(())
    }

    async fn delete_item(&self, ctx: &OpContext, name: &str, session: &Session) -> Result<()> {
        self.guard(ctx, session)?;
        let path = self.path(name);
        // Removes every version, not just the latest.
        request(ctx, kv2::delete_metadata(&self.client, &self.mount, &path))
            .await?
            .map_err(|e| classify(e, name))?;
        info!(name = %name, mount = %self.mount, "Deleted secret from Vault");
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        info!(address = %self.address, "Vault backend closed");
        Ok(())
    }
}
