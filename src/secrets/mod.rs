//! Backend abstraction and orchestration for secret stores.
//!
//! # Architecture
//!
//! ```text
//! BackendRegistry --create--> Box<dyn SecretBackend>
//!                                   |
//!                           BackendLifecycle (init + authenticate once, close once)
//!                                   |
//!                           SecretsOrchestrator (shared by every request task)
//! ```
//!
//! The [`SecretBackend`] trait is the only seam between the orchestrator and a
//! concrete store. Backends are selected by name at startup through the
//! [`BackendRegistry`]; every operation carries an [`OpContext`] for
//! cancellation and deadlines, and every failure is classified by
//! [`ErrorKind`].
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use vaultgate::secrets::{
//!     BackendLifecycle, BackendOptions, BackendRegistry, OpContext, SecretsOrchestrator,
//! };
//!
//! let registry = BackendRegistry::with_builtin_backends();
//! let backend = registry.create("memory", &BackendOptions::new("vaultgate"))?;
//! let lifecycle = Arc::new(BackendLifecycle::new(backend.into()));
//! let session = lifecycle.start(&OpContext::background()).await?;
//!
//! let secrets = SecretsOrchestrator::new(lifecycle, session);
//! secrets.create(&OpContext::background(), "db-password", "s3cr3t").await?;
//! ```

pub mod backend;
pub mod backends;
pub mod context;
pub mod error;
pub mod item;
pub mod lifecycle;
pub mod orchestrator;
pub mod registry;
pub mod session;
#[cfg(test)]
pub(crate) mod testing;
pub mod types;

pub use backend::{BackendOptions, SecretBackend};
pub use context::OpContext;
pub use error::{ErrorKind, Result, SecretsError};
pub use item::{validate_name, Item, MAX_NAME_LEN};
pub use lifecycle::{BackendLifecycle, SessionState};
pub use orchestrator::SecretsOrchestrator;
pub use registry::{BackendFactory, BackendRegistry};
pub use session::Session;
pub use types::SecretString;
