//! # Structured Logging
//!
//! Installs the global `tracing` subscriber. `RUST_LOG` takes precedence over
//! the configured level; JSON output is opt-in.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{AppConfig, ObservabilityConfig};
use crate::errors::{Error, Result};

/// Create a tracing span for request tracking.
///
/// ```rust,ignore
/// let span = request_span!("GET", "/v1/secrets");
/// let span = request_span!("GET", "/v1/secrets", request_id = %id);
/// ```
#[macro_export]
macro_rules! request_span {
    ($method:expr, $path:expr) => {
        tracing::info_span!(
            "http_request",
            method = %$method,
            path = %$path,
            request_id = %uuid::Uuid::new_v4()
        )
    };
    ($method:expr, $path:expr, request_id = $($id:tt)+) => {
        tracing::info_span!(
            "http_request",
            method = %$method,
            path = %$path,
            request_id = $($id)+
        )
    };
}

/// Default filter directive for `level`, keeping dependencies at `warn`.
pub fn default_directive(level: &str) -> String {
    format!("vaultgate={level},tower_http={level},warn")
}

/// Install the global subscriber.
///
/// Fails if a subscriber is already installed.
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(&config.log_level)));

    let installed = if config.json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
    };

    installed.map_err(|e| Error::config(format!("Failed to initialize logging: {}", e)))
}

/// Log configuration at startup. Backend option values are never logged.
pub fn log_config_info(config: &AppConfig) {
    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        backend_type = %config.backend.backend_type,
        prefix = %config.backend.prefix,
        backend_options = ?config.backend.options.keys().collect::<Vec<_>>(),
        request_timeout_secs = config.server.request_timeout_seconds,
        shutdown_grace_secs = config.server.shutdown_grace_seconds,
        json_logs = config.observability.json_logs,
        "vaultgate configuration"
    );
}
