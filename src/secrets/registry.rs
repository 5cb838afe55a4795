//! Secret backend registry
//!
//! Maps a backend type name to the factory that constructs it. The registry
//! is filled by an explicit registration step at process start and is only
//! read afterwards.

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use super::backend::{BackendOptions, SecretBackend};
use super::backends;
use super::error::{Result, SecretsError};

/// Constructor for a backend instance, given its configuration bundle.
pub type BackendFactory =
    Arc<dyn Fn(&BackendOptions) -> Result<Box<dyn SecretBackend>> + Send + Sync>;

/// Registry of backend factories keyed by backend type name.
#[derive(Clone, Default)]
pub struct BackendRegistry {
    factories: BTreeMap<String, BackendFactory>,
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRegistry").field("backends", &self.names()).finish()
    }
}

impl BackendRegistry {
    /// Create a registry with no backends.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every backend compiled into this build.
    pub fn with_builtin_backends() -> Self {
        let mut registry = Self::new();
        backends::register_builtin(&mut registry);
        registry
    }

    /// Register a backend factory under `name`.
    ///
    /// # Panics
    ///
    /// Panics if `name` is already registered. The set of backends is fixed
    /// at build time, so a duplicate is a programming error.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&BackendOptions) -> Result<Box<dyn SecretBackend>> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.factories.contains_key(&name) {
            panic!("secret backend '{}' registered twice", name);
        }
        info!(backend_type = %name, "Registering secret backend");
        self.factories.insert(name, Arc::new(factory));
    }

    /// Resolve the factory for `name`.
    ///
    /// Fails with [`SecretsError::UnknownBackend`] naming the requested value
    /// and every registered name.
    pub fn lookup(&self, name: &str) -> Result<&BackendFactory> {
        self.factories.get(name).ok_or_else(|| SecretsError::UnknownBackend {
            requested: name.to_string(),
            available: self.names().into_iter().map(str::to_string).collect(),
        })
    }

    /// Resolve and invoke the factory for `name`.
    pub fn create(&self, name: &str, options: &BackendOptions) -> Result<Box<dyn SecretBackend>> {
        let factory = self.lookup(name)?;
        debug!(backend_type = %name, prefix = %options.prefix, "Constructing secret backend");
        factory(options)
    }

    /// Check if a backend is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered backend names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}
