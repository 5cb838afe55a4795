//! # Configuration Settings
//!
//! Defines the configuration structure for vaultgate.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use validator::Validate;

use crate::errors::{Error, Result};
use crate::secrets::BackendOptions;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
pub struct AppConfig {
    /// HTTP server configuration
    #[validate(nested)]
    pub server: ServerConfig,

    /// Secret backend selection
    #[validate(nested)]
    pub backend: BackendConfig,

    /// Logging configuration
    #[validate(nested)]
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self)
            .map_err(|e| Error::config(format!("Invalid configuration: {}", e)))?;

        self.server.bind_address()?;

        if self.backend.backend_type.trim().is_empty() {
            return Err(Error::config(
                "No secret backend selected; set VAULTGATE_BACKEND or pass --backend",
            ));
        }

        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    /// Server bind address
    #[validate(length(min = 1, message = "Host cannot be empty"))]
    pub host: String,

    /// Server port
    #[validate(range(min = 1, max = 65535, message = "Port must be between 1 and 65535"))]
    pub port: u16,

    /// Per-request deadline in seconds
    #[validate(range(
        min = 1,
        max = 300,
        message = "Request timeout must be between 1 and 300 seconds"
    ))]
    pub request_timeout_seconds: u64,

    /// How long in-flight requests may run after a shutdown signal
    #[validate(range(max = 300, message = "Shutdown grace must be at most 300 seconds"))]
    pub shutdown_grace_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_seconds: 30,
            shutdown_grace_seconds: 5,
        }
    }
}

impl ServerConfig {
    /// Socket address to bind. IPv6 hosts may be given bare (`::`) or
    /// bracketed (`[::]`).
    pub fn bind_address(&self) -> Result<SocketAddr> {
        let host = self.host.trim();
        let host = host.strip_prefix('[').and_then(|h| h.strip_suffix(']')).unwrap_or(host);
        let ip: IpAddr = host
            .parse()
            .map_err(|e| Error::config(format!("Invalid bind address '{}': {}", self.host, e)))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_seconds)
    }
}

/// Secret backend selection and its opaque options.
#[derive(Clone, Serialize, Deserialize, Validate)]
pub struct BackendConfig {
    /// Registered backend type name
    pub backend_type: String,

    /// Scope applied to every item name
    #[validate(length(max = 256, message = "Prefix must be at most 256 bytes"))]
    pub prefix: String,

    /// Backend-specific options (region, address, token, ...)
    #[serde(skip_serializing)]
    pub options: BTreeMap<String, String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self { backend_type: String::new(), prefix: "vaultgate".to_string(), options: BTreeMap::new() }
    }
}

// Option values may carry credentials; only keys are printed.
impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("backend_type", &self.backend_type)
            .field("prefix", &self.prefix)
            .field("options", &self.options.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl BackendConfig {
    /// Configuration bundle handed to the backend factory.
    pub fn backend_options(&self) -> BackendOptions {
        BackendOptions { prefix: self.prefix.clone(), options: self.options.clone() }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ObservabilityConfig {
    /// Default log filter when RUST_LOG is unset
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Emit logs as JSON lines
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self { log_level: "info".to_string(), json_logs: false }
    }
}
