//! Secrets orchestrator.
//!
//! Single entry point for request traffic. Wraps the process-wide backend and
//! session and layers create/update/delete semantics on top of the capability
//! interface:
//!
//! - `create` never clobbers an existing name (`AlreadyExists`)
//! - `update` never resurrects an absent name (`NotFound`)
//! - `delete` of an absent name is `NotFound`, not a silent success
//!
//! Backends that offer atomic conditional create get it; all others fall back
//! to an existence check followed by the mutation. That fallback is not
//! atomic: two concurrent creates of one name can both pass the check.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::backend::SecretBackend;
use super::context::OpContext;
use super::error::{ErrorKind, Result, SecretsError};
use super::item::{validate_name, Item};
use super::lifecycle::BackendLifecycle;
use super::session::Session;

#[derive(Debug, Clone)]
pub struct SecretsOrchestrator {
    lifecycle: Arc<BackendLifecycle>,
    session: Session,
}

impl SecretsOrchestrator {
    /// Build the orchestrator around a started lifecycle and its session.
    pub fn new(lifecycle: Arc<BackendLifecycle>, session: Session) -> Self {
        Self { lifecycle, session }
    }

    pub fn backend_type(&self) -> &str {
        self.backend().backend_type()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn lifecycle(&self) -> &Arc<BackendLifecycle> {
        &self.lifecycle
    }

    /// Context for one request: cancelled on shutdown, bounded by `timeout`.
    pub fn request_context(&self, timeout: Duration) -> OpContext {
        OpContext::from_token(self.lifecycle.shutdown_token()).with_timeout(timeout)
    }

    fn backend(&self) -> &Arc<dyn SecretBackend> {
        self.lifecycle.backend()
    }

    /// Names of every item visible under the backend prefix, in backend order.
    #[instrument(skip(self, ctx), fields(backend = %self.backend_type()))]
    pub async fn list(&self, ctx: &OpContext) -> Result<Vec<String>> {
        let _in_flight = self.lifecycle.enter().await?;
        let names = ctx
            .run(self.backend().list_items(ctx, &self.session))
            .await
            .inspect_err(|e| report("list", None, e))?;
        debug!(count = names.len(), "Listed secrets");
        Ok(names)
    }

    #[instrument(skip(self, ctx), fields(backend = %self.backend_type()))]
    pub async fn get(&self, ctx: &OpContext, name: &str) -> Result<Item> {
        validate_name(name)?;
        let _in_flight = self.lifecycle.enter().await?;
        let value = ctx
            .run(self.backend().get_value(ctx, name, &self.session))
            .await
            .inspect_err(|e| report("get", Some(name), e))?;
        debug!("Fetched secret");
        Ok(Item::new(name, value))
    }

    #[instrument(skip(self, ctx, value), fields(backend = %self.backend_type()))]
    pub async fn create(&self, ctx: &OpContext, name: &str, value: &str) -> Result<()> {
        validate_name(name)?;
        let _in_flight = self.lifecycle.enter().await?;
        self.create_unclobbered(ctx, name, value)
            .await
            .inspect_err(|e| report("create", Some(name), e))?;
        info!("Created secret");
        Ok(())
    }

    async fn create_unclobbered(&self, ctx: &OpContext, name: &str, value: &str) -> Result<()> {
        let backend = self.backend();
        if backend.supports_conditional_create() {
            let created =
                ctx.run(backend.create_item_if_absent(ctx, name, value, &self.session)).await?;
            return if created { Ok(()) } else { Err(SecretsError::already_exists(name)) };
        }

        if ctx.run(backend.item_exists(ctx, name, &self.session)).await? {
            return Err(SecretsError::already_exists(name));
        }
        ctx.run(backend.create_item(ctx, name, value, &self.session)).await
    }

    #[instrument(skip(self, ctx, value), fields(backend = %self.backend_type()))]
    pub async fn update(&self, ctx: &OpContext, name: &str, value: &str) -> Result<()> {
        validate_name(name)?;
        let _in_flight = self.lifecycle.enter().await?;
        self.require_existing(ctx, name).await?;
        ctx.run(self.backend().update_item(ctx, name, value, &self.session))
            .await
            .inspect_err(|e| report("update", Some(name), e))?;
        info!("Updated secret");
        Ok(())
    }

    #[instrument(skip(self, ctx), fields(backend = %self.backend_type()))]
    pub async fn delete(&self, ctx: &OpContext, name: &str) -> Result<()> {
        validate_name(name)?;
        let _in_flight = self.lifecycle.enter().await?;
        self.require_existing(ctx, name).await?;
        ctx.run(self.backend().delete_item(ctx, name, &self.session))
            .await
            .inspect_err(|e| report("delete", Some(name), e))?;
        info!("Deleted secret");
        Ok(())
    }

    async fn require_existing(&self, ctx: &OpContext, name: &str) -> Result<()> {
        let exists = ctx
            .run(self.backend().item_exists(ctx, name, &self.session))
            .await
            .inspect_err(|e| report("exists", Some(name), e))?;
        if exists {
            Ok(())
        } else {
            Err(SecretsError::not_found(name))
        }
    }
}

/// Log a failed backend call. Caller mistakes stay at debug level.
fn report(operation: &str, name: Option<&str>, err: &SecretsError) {
    let name = name.unwrap_or("-");
    match err.kind() {
        ErrorKind::NotFound | ErrorKind::AlreadyExists | ErrorKind::ValidationError => {
            debug!(operation, name, kind = %err.kind(), "Secret operation rejected");
        }
        kind => {
            warn!(operation, name, kind = %kind, error = %err, "Secret operation failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::backend::BackendOptions;
    use crate::secrets::backends::MemoryBackend;
    use crate::secrets::testing::ProbeBackend;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    async fn orchestrator_over(backend: Arc<dyn SecretBackend>) -> SecretsOrchestrator {
        let lifecycle = Arc::new(BackendLifecycle::new(backend));
        let session = lifecycle.start(&OpContext::background()).await.unwrap();
        SecretsOrchestrator::new(lifecycle, session)
    }

    async fn memory_orchestrator() -> SecretsOrchestrator {
        let backend = MemoryBackend::new(&BackendOptions::new("vaultgate")).unwrap();
        orchestrator_over(Arc::new(backend)).await
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let orchestrator = memory_orchestrator().await;
        let ctx = OpContext::background();

        orchestrator.create(&ctx, "db-password", "s3cr3t").await.unwrap();
        let item = orchestrator.get(&ctx, "db-password").await.unwrap();
        assert_eq!(item, Item::new("db-password", "s3cr3t"));
        assert_eq!(orchestrator.backend_type(), "memory");
    }

    #[tokio::test]
    async fn test_lifecycle_scenario() {
        let orchestrator = memory_orchestrator().await;
        let ctx = OpContext::background();

        orchestrator.create(&ctx, "db-password", "s3cr3t").await.unwrap();
        assert_eq!(orchestrator.list(&ctx).await.unwrap(), vec!["db-password".to_string()]);
        assert_eq!(orchestrator.get(&ctx, "db-password").await.unwrap().value, "s3cr3t");

        orchestrator.update(&ctx, "db-password", "n3wpass").await.unwrap();
        assert_eq!(orchestrator.get(&ctx, "db-password").await.unwrap().value, "n3wpass");

        orchestrator.delete(&ctx, "db-password").await.unwrap();
        let err = orchestrator.get(&ctx, "db-password").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = orchestrator.delete(&ctx, "db-password").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_create_does_not_clobber_with_check_then_act() {
        let probe = Arc::new(ProbeBackend::new());
        probe.seed("api-key", "original");
        let orchestrator = orchestrator_over(probe.clone()).await;
        let ctx = OpContext::background();

        let err = orchestrator.create(&ctx, "api-key", "replacement").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(ProbeBackend::count(&probe.creates), 0);
        assert_eq!(orchestrator.get(&ctx, "api-key").await.unwrap().value, "original");
    }

    #[tokio::test]
    async fn test_create_does_not_clobber_with_conditional_create() {
        let probe = Arc::new(ProbeBackend::new().with_conditional_create());
        probe.seed("api-key", "original");
        let orchestrator = orchestrator_over(probe.clone()).await;
        let ctx = OpContext::background();

        let err = orchestrator.create(&ctx, "api-key", "replacement").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(orchestrator.get(&ctx, "api-key").await.unwrap().value, "original");

        orchestrator.create(&ctx, "fresh", "value").await.unwrap();
        assert_eq!(ProbeBackend::count(&probe.creates), 2);
    }

    #[tokio::test]
    async fn test_update_does_not_resurrect() {
        let probe = Arc::new(ProbeBackend::new());
        let orchestrator = orchestrator_over(probe.clone()).await;
        let ctx = OpContext::background();

        let err = orchestrator.update(&ctx, "ghost", "boo").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(ProbeBackend::count(&probe.updates), 0);
        assert!(!orchestrator.list(&ctx).await.unwrap().contains(&"ghost".to_string()));
    }

    #[tokio::test]
    async fn test_delete_absent_does_not_call_backend() {
        let probe = Arc::new(ProbeBackend::new());
        let orchestrator = orchestrator_over(probe.clone()).await;

        let err = orchestrator.delete(&OpContext::background(), "ghost").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(ProbeBackend::count(&probe.deletes), 0);
    }

    #[tokio::test]
    async fn test_invalid_names_rejected_before_backend() {
        let probe = Arc::new(ProbeBackend::new());
        let orchestrator = orchestrator_over(probe.clone()).await;
        let ctx = OpContext::background();

        for name in ["", "   ", "bad\nname"] {
            let err = orchestrator.create(&ctx, name, "v").await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ValidationError);
        }
        assert_eq!(ProbeBackend::count(&probe.creates), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_yields_cancelled_not_unavailable() {
        let probe = Arc::new(ProbeBackend::new().stalling_reads());
        probe.seed("slow", "value");
        let orchestrator = orchestrator_over(probe).await;

        let ctx = orchestrator.request_context(Duration::from_secs(30));
        let err = orchestrator.get(&ctx, "slow").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
    }

    #[tokio::test]
    async fn test_shutdown_cancels_in_flight_operation() {
        let probe = Arc::new(ProbeBackend::new().stalling_reads());
        probe.seed("slow", "value");
        let orchestrator = orchestrator_over(probe.clone()).await;

        let pending = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move {
                let ctx = orchestrator.request_context(Duration::from_secs(300));
                orchestrator.get(&ctx, "slow").await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        orchestrator.lifecycle().close().await.unwrap();
        let err = pending.await.unwrap().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert_eq!(ProbeBackend::count(&probe.closes), 1);

        let err = orchestrator.list(&OpContext::background()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BackendUnavailable);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Create(String),
        Update(String),
        Delete(String),
    }

    fn op() -> impl Strategy<Value = Op> {
        let name = prop::sample::select(vec!["alpha", "beta", "gamma", "delta"]);
        prop_oneof![
            name.clone().prop_map(|n| Op::Create(n.to_string())),
            name.clone().prop_map(|n| Op::Update(n.to_string())),
            name.prop_map(|n| Op::Delete(n.to_string())),
        ]
    }

    proptest! {
        #[test]
        fn prop_list_matches_gettable_names(ops in prop::collection::vec(op(), 0..24)) {
            let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
            runtime.block_on(async {
                let orchestrator = memory_orchestrator().await;
                let ctx = OpContext::background();
                let mut expected = BTreeSet::new();

                for op in ops {
                    match op {
                        Op::Create(name) => {
                            let created = orchestrator.create(&ctx, &name, "v").await.is_ok();
                            prop_assert_eq!(created, expected.insert(name));
                        }
                        Op::Update(name) => {
                            let updated = orchestrator.update(&ctx, &name, "v2").await.is_ok();
                            prop_assert_eq!(updated, expected.contains(&name));
                        }
                        Op::Delete(name) => {
                            let deleted = orchestrator.delete(&ctx, &name).await.is_ok();
                            prop_assert_eq!(deleted, expected.remove(&name));
                        }
                    }
                }

                let listed = orchestrator.list(&ctx).await.unwrap();
                let unique: BTreeSet<String> = listed.iter().cloned().collect();
                prop_assert_eq!(unique.len(), listed.len());
                prop_assert_eq!(&unique, &expected);
                for name in &listed {
                    prop_assert!(orchestrator.get(&ctx, name).await.is_ok());
                }
                Ok(())
            })?;
        }
    }
}
