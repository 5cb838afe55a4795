//! # Configuration Management
//!
//! Configuration is read from the process environment (after `.env` has been
//! loaded by `main`) and then overridden by command line flags.
//!
//! | Variable | Default |
//! |---|---|
//! | `VAULTGATE_BACKEND` | required |
//! | `VAULTGATE_PREFIX` | `vaultgate` |
//! | `VAULTGATE_BIND_ADDRESS` | `0.0.0.0` |
//! | `PORT` / `VAULTGATE_PORT` | `8080` |
//! | `VAULTGATE_REQUEST_TIMEOUT_SECS` | `30` |
//! | `VAULTGATE_SHUTDOWN_GRACE_SECS` | `5` |
//! | `VAULTGATE_LOG_LEVEL` | `info` |
//! | `VAULTGATE_LOG_JSON` | `false` |
//!
//! Backend options come from well-known provider variables (see
//! [`WELL_KNOWN_OPTIONS`]) and from `VAULTGATE_OPT_<KEY>`, which wins.

pub mod settings;

pub use settings::{AppConfig, BackendConfig, ObservabilityConfig, ServerConfig};

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::str::FromStr;

use crate::errors::{Error, Result};

/// Namespace of the server's own configuration variables.
pub const CONFIG_ENV_PREFIX: &str = "VAULTGATE_";

/// Prefix for arbitrary backend options, e.g. `VAULTGATE_OPT_MOUNT=kv`.
pub const OPTION_ENV_PREFIX: &str = "VAULTGATE_OPT_";

/// Provider variables mapped onto backend option keys.
pub const WELL_KNOWN_OPTIONS: &[(&str, &str)] = &[
    ("AWS_REGION", "region"),
    ("AWS_ENDPOINT", "endpoint"),
    ("GCP_PROJECT_ID", "project_id"),
    ("VAULT_ADDR", "address"),
    ("VAULT_TOKEN", "token"),
    ("VAULT_NAMESPACE", "namespace"),
];

/// Whether the server reads `var` as configuration. Such variables are
/// never served as secrets.
pub fn is_config_var(var: &str) -> bool {
    var.starts_with(CONFIG_ENV_PREFIX)
        || var == "PORT"
        || var == "RUST_LOG"
        || WELL_KNOWN_OPTIONS.iter().any(|(name, _)| *name == var)
}

/// Values supplied on the command line. `None` keeps the environment value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub backend: Option<String>,
    pub prefix: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
    pub json_logs: bool,
}

impl AppConfig {
    /// Create configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(unicode_vars(std::env::vars_os()))
    }

    /// Create configuration from an explicit set of variables.
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: BTreeMap<String, String> = vars.into_iter().collect();
        let get = |key: &str| vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

        let mut config = AppConfig::default();

        if let Some(backend) = get("VAULTGATE_BACKEND") {
            config.backend.backend_type = backend.to_string();
        }
        if let Some(prefix) = get("VAULTGATE_PREFIX") {
            config.backend.prefix = prefix.to_string();
        }
        config.backend.options = backend_options(&vars);

        if let Some(host) = get("VAULTGATE_BIND_ADDRESS") {
            config.server.host = host.to_string();
        }
        if let Some(port) = get("VAULTGATE_PORT").or_else(|| get("PORT")) {
            config.server.port = parse("port", port)?;
        }
        if let Some(timeout) = get("VAULTGATE_REQUEST_TIMEOUT_SECS") {
            config.server.request_timeout_seconds = parse("VAULTGATE_REQUEST_TIMEOUT_SECS", timeout)?;
        }
        if let Some(grace) = get("VAULTGATE_SHUTDOWN_GRACE_SECS") {
            config.server.shutdown_grace_seconds = parse("VAULTGATE_SHUTDOWN_GRACE_SECS", grace)?;
        }

        if let Some(level) = get("VAULTGATE_LOG_LEVEL") {
            config.observability.log_level = level.to_string();
        }
        if let Some(json) = get("VAULTGATE_LOG_JSON") {
            config.observability.json_logs = matches!(json.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }

        Ok(config)
    }

    /// Apply command line overrides on top of the environment.
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(backend) = overrides.backend {
            self.backend.backend_type = backend;
        }
        if let Some(prefix) = overrides.prefix {
            self.backend.prefix = prefix;
        }
        if let Some(host) = overrides.host {
            self.server.host = host;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(level) = overrides.log_level {
            self.observability.log_level = level;
        }
        if overrides.json_logs {
            self.observability.json_logs = true;
        }
    }
}

/// Drop variables whose name or value is not valid UTF-8.
fn unicode_vars<I>(vars: I) -> impl Iterator<Item = (String, String)>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    vars.into_iter()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
}

fn backend_options(vars: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    let mut options = BTreeMap::new();
    for (var, key) in WELL_KNOWN_OPTIONS {
        if let Some(value) = vars.get(*var).filter(|v| !v.trim().is_empty()) {
            options.insert(key.to_string(), value.clone());
        }
    }
    // Explicit options override the well-known names.
    for (var, value) in vars {
        if let Some(key) = var.strip_prefix(OPTION_ENV_PREFIX).filter(|key| !key.is_empty()) {
            options.insert(key.to_ascii_lowercase(), value.clone());
        }
    }
    options
}

fn parse<T>(name: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e| Error::config(format!("Invalid {} '{}': {}", name, raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_config_from_vars_defaults() {
        let config = AppConfig::from_vars(Vec::new()).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.request_timeout_seconds, 30);
        assert_eq!(config.server.shutdown_grace_seconds, 5);
        assert_eq!(config.backend.prefix, "vaultgate");
        assert!(config.backend.backend_type.is_empty());
        assert_eq!(config.observability.log_level, "info");
        assert!(!config.observability.json_logs);
    }

    #[test]
    fn test_config_from_vars() {
        let config = AppConfig::from_vars(vars(&[
            ("VAULTGATE_BACKEND", "vault"),
            ("VAULTGATE_PREFIX", "payments"),
            ("PORT", "9090"),
            ("VAULTGATE_REQUEST_TIMEOUT_SECS", "10"),
            ("VAULTGATE_LOG_JSON", "true"),
        ]))
        .unwrap();

        assert_eq!(config.backend.backend_type, "vault");
        assert_eq!(config.backend.prefix, "payments");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.request_timeout_seconds, 10);
        assert!(config.observability.json_logs);
    }

    #[test]
    fn test_vaultgate_port_wins_over_port() {
        let config =
            AppConfig::from_vars(vars(&[("PORT", "9090"), ("VAULTGATE_PORT", "7070")])).unwrap();
        assert_eq!(config.server.port, 7070);
    }

    #[test]
    fn test_invalid_port_is_config_error() {
        let err = AppConfig::from_vars(vars(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_backend_option_sources() {
        let config = AppConfig::from_vars(vars(&[
            ("AWS_REGION", "eu-west-1"),
            ("GCP_PROJECT_ID", "acme-prod"),
            ("VAULT_ADDR", "https://vault.internal:8200"),
            ("VAULTGATE_OPT_ADDRESS", "http://127.0.0.1:8200"),
            ("VAULTGATE_OPT_MOUNT", "kv"),
            ("AWS_ENDPOINT", ""),
        ]))
        .unwrap();

        let options = &config.backend.options;
        assert_eq!(options.get("region").map(String::as_str), Some("eu-west-1"));
        assert_eq!(options.get("project_id").map(String::as_str), Some("acme-prod"));
        assert_eq!(options.get("address").map(String::as_str), Some("http://127.0.0.1:8200"));
        assert_eq!(options.get("mount").map(String::as_str), Some("kv"));
        assert!(!options.contains_key("endpoint"));
    }

    #[test]
    fn test_config_vars_are_recognized() {
        for var in ["VAULTGATE_BACKEND", "VAULTGATE_OPT_TOKEN", "PORT", "VAULT_TOKEN", "AWS_REGION"] {
            assert!(is_config_var(var), "{var}");
        }
        for var in ["APP_DB_PASSWORD", "VAULT_DB_PASSWORD", "PORTAL_KEY"] {
            assert!(!is_config_var(var), "{var}");
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_non_unicode_variables_are_skipped() {
        use std::os::unix::ffi::OsStringExt;

        let raw = vec![
            (OsString::from("VAULTGATE_BACKEND"), OsString::from("memory")),
            (OsString::from("VAULTGATE_PREFIX"), OsString::from_vec(vec![0x66, 0xff])),
            (OsString::from_vec(vec![0xfe, 0x41]), OsString::from("x")),
        ];

        let config = AppConfig::from_vars(unicode_vars(raw)).unwrap();
        assert_eq!(config.backend.backend_type, "memory");
        assert_eq!(config.backend.prefix, "vaultgate");
    }

    #[test]
    fn test_overrides_replace_environment() {
        let mut config = AppConfig::from_vars(vars(&[("VAULTGATE_BACKEND", "env")])).unwrap();
        config.apply_overrides(ConfigOverrides {
            backend: Some("memory".to_string()),
            port: Some(3000),
            json_logs: true,
            ..Default::default()
        });

        assert_eq!(config.backend.backend_type, "memory");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.backend.prefix, "vaultgate");
        assert!(config.observability.json_logs);
    }
}
