//! # vaultgate
//!
//! A uniform REST interface over pluggable secret-management backends.
//!
//! ## Architecture
//!
//! ```text
//! REST API (axum) → SecretsOrchestrator → SecretBackend (memory | env | vault)
//!                          ↑
//!        BackendRegistry → BackendLifecycle (init, authenticate, close)
//! ```
//!
//! ## Core Components
//!
//! - **secrets**: capability interface, registry, lifecycle and orchestrator
//! - **api**: HTTP routing, DTOs and error mapping
//! - **startup**: backend selection and session bootstrap
//! - **config** / **observability**: environment configuration and logging

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod observability;
pub mod secrets;
pub mod startup;

// Re-export commonly used types and traits
pub use config::AppConfig;
pub use errors::{Error, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
