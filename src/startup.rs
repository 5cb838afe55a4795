//! Startup sequence for vaultgate
//!
//! Resolves the configured backend through the registry, runs `init` and
//! `authenticate` exactly once, and assembles the orchestrator that serves
//! every request. Any failure here is fatal: the process must not serve
//! traffic without an authenticated session.

use std::sync::Arc;
use tracing::{error, info};

use crate::config::BackendConfig;
use crate::errors::{Error, Result};
use crate::secrets::{BackendLifecycle, BackendRegistry, OpContext, SecretsOrchestrator};

/// Running secrets stack handed to the HTTP layer.
#[derive(Debug, Clone)]
pub struct SecretsRuntime {
    pub orchestrator: Arc<SecretsOrchestrator>,
    pub lifecycle: Arc<BackendLifecycle>,
}

/// Select, initialize and authenticate the configured backend.
pub async fn bootstrap(
    config: &BackendConfig,
    registry: &BackendRegistry,
    ctx: &OpContext,
) -> Result<SecretsRuntime> {
    if config.backend_type.trim().is_empty() {
        return Err(Error::config("No secret backend selected; set VAULTGATE_BACKEND or pass --backend"));
    }

    let backend = registry.create(&config.backend_type, &config.backend_options()).map_err(|e| {
        error!(backend_type = %config.backend_type, error = %e, "Failed to construct secret backend");
        Error::from(e)
    })?;

    let lifecycle = Arc::new(BackendLifecycle::new(Arc::from(backend)));
    let session = lifecycle.start(ctx).await?;

    info!(
        backend_type = %config.backend_type,
        prefix = %config.prefix,
        session_id = %session.id(),
        "Secret backend ready"
    );

    let orchestrator = Arc::new(SecretsOrchestrator::new(lifecycle.clone(), session));
    Ok(SecretsRuntime { orchestrator, lifecycle })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::{ErrorKind, SecretsError, SessionState};

    fn backend_config(backend_type: &str) -> BackendConfig {
        BackendConfig { backend_type: backend_type.to_string(), ..Default::default() }
    }

    #[tokio::test]
    async fn test_bootstrap_memory_backend() {
        let registry = BackendRegistry::with_builtin_backends();
        let runtime =
            bootstrap(&backend_config("memory"), &registry, &OpContext::background()).await.unwrap();

        assert_eq!(runtime.orchestrator.backend_type(), "memory");
        assert_eq!(runtime.lifecycle.state(), SessionState::Authenticated);
    }

    #[tokio::test]
    async fn test_unknown_backend_is_fatal() {
        let registry = BackendRegistry::with_builtin_backends();
        let err = bootstrap(&backend_config("gcpsecrets"), &registry, &OpContext::background())
            .await
            .unwrap_err();

        match err {
            Error::Secrets(SecretsError::UnknownBackend { requested, available }) => {
                assert_eq!(requested, "gcpsecrets");
                assert!(available.contains(&"memory".to_string()));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_selector_is_fatal() {
        let registry = BackendRegistry::with_builtin_backends();
        let err =
            bootstrap(&backend_config("  "), &registry, &OpContext::background()).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_authentication_failure_is_fatal() {
        let registry = BackendRegistry::with_builtin_backends();
        let mut config = backend_config("memory");
        config.options.insert("token".to_string(), "wrong".to_string());
        config.options.insert("expected_token".to_string(), "right".to_string());

        let err = bootstrap(&config, &registry, &OpContext::background()).await.unwrap_err();
        match err {
            Error::Secrets(inner) => assert_eq!(inner.kind(), ErrorKind::AuthenticationFailure),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_env_backend_with_default_prefix_is_fatal() {
        // The default prefix would expose VAULTGATE_* configuration.
        std::env::set_var("VAULTGATE_OPT_EXPECTED_TOKEN", "super-admin-token");
        let registry = BackendRegistry::with_builtin_backends();
        let err =
            bootstrap(&backend_config("env"), &registry, &OpContext::background()).await.unwrap_err();
        std::env::remove_var("VAULTGATE_OPT_EXPECTED_TOKEN");

        match err {
            Error::Secrets(inner) => assert_eq!(inner.kind(), ErrorKind::ValidationError),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_env_backend_does_not_serve_option_variables() {
        std::env::set_var("VAULTGATE_OPT_TOKEN", "option-secret");
        let registry = BackendRegistry::with_builtin_backends();
        let mut config = backend_config("env");
        config.prefix = "vgstartup".to_string();
        let runtime = bootstrap(&config, &registry, &OpContext::background()).await.unwrap();

        let ctx = OpContext::background();
        let names = runtime.orchestrator.list(&ctx).await.unwrap();
        assert!(names.iter().all(|name| !name.contains("token")));
        let err = runtime.orchestrator.get(&ctx, "opt_token").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        std::env::remove_var("VAULTGATE_OPT_TOKEN");
    }
}
