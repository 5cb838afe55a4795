//! Concrete secret backends
//!
//! ## Supported Backends
//!
//! - **memory**: process-local store for tests and local development
//! - **env**: read-only store over `<PREFIX>_<NAME>` environment variables
//! - **vault**: HashiCorp Vault KV v2 engine (`vault` feature)
//!
//! Each backend module exposes a `register` function. [`register_builtin`]
//! calls them in a fixed order; nothing registers itself on import.

pub mod env;
pub mod memory;
#[cfg(feature = "vault")]
pub mod vault;

pub use env::EnvVarBackend;
pub use memory::MemoryBackend;
#[cfg(feature = "vault")]
pub use vault::VaultBackend;

use super::registry::BackendRegistry;

/// Register every backend compiled into this build.
pub fn register_builtin(registry: &mut BackendRegistry) {
    memory::register(registry);
    env::register(registry);
    #[cfg(feature = "vault")]
    vault::register(registry);
}
