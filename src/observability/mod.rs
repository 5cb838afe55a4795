//! # Observability Infrastructure
//!
//! Structured logging and HTTP request logging for vaultgate.

pub mod logging;
pub mod http_tracing;

pub use http_tracing::log_http_requests;
pub use logging::{init_logging, log_config_info};
