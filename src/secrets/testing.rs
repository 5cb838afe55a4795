//! Instrumented backend for unit tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

use super::backend::{BackendOptions, SecretBackend};
use super::backends::MemoryBackend;
use super::context::OpContext;
use super::error::Result;
use super::session::Session;

/// Memory-backed store that counts mutations and can stall reads.
#[derive(Debug)]
pub(crate) struct ProbeBackend {
    inner: MemoryBackend,
    conditional: bool,
    stall_reads: bool,
    pub creates: AtomicUsize,
    pub updates: AtomicUsize,
    pub deletes: AtomicUsize,
    pub closes: AtomicUsize,
}

impl ProbeBackend {
    /// Probe without conditional create, forcing the check-then-act path.
    pub fn new() -> Self {
        Self {
            inner: MemoryBackend::new(&BackendOptions::new("probe")).expect("memory backend"),
            conditional: false,
            stall_reads: false,
            creates: AtomicUsize::new(0),
            updates: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
        }
    }

    pub fn with_conditional_create(mut self) -> Self {
        self.conditional = true;
        self
    }

    /// Make `get_value` block until its context gives up.
    pub fn stalling_reads(mut self) -> Self {
        self.stall_reads = true;
        self
    }

    pub fn seed(&self, name: &str, value: &str) {
        self.inner.seed(name, value);
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretBackend for ProbeBackend {
    fn backend_type(&self) -> &str {
        "probe"
    }

    fn instance_id(&self) -> Uuid {
        self.inner.instance_id()
    }

    async fn init(&self, ctx: &OpContext) -> Result<()> {
        self.inner.init(ctx).await
    }

    async fn authenticate(&self, ctx: &OpContext) -> Result<Session> {
        self.inner.authenticate(ctx).await
    }

    async fn list_items(&self, ctx: &OpContext, session: &Session) -> Result<Vec<String>> {
        self.inner.list_items(ctx, session).await
    }

    async fn item_exists(&self, ctx: &OpContext, name: &str, session: &Session) -> Result<bool> {
        self.inner.item_exists(ctx, name, session).await
    }

    async fn get_value(&self, ctx: &OpContext, name: &str, session: &Session) -> Result<String> {
        if self.stall_reads {
            std::future::pending::<()>().await;
        }
        self.inner.get_value(ctx, name, session).await
    }

    async fn create_item(
        &self,
        ctx: &OpContext,
        name: &str,
        value: &str,
        session: &Session,
    ) -> Result<()> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.inner.create_item(ctx, name, value, session).await
    }

    async fn update_item(
        &self,
        ctx: &OpContext,
        name: &str,
        value: &str,
        session: &Session,
    ) -> Result<()> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.inner.update_item(ctx, name, value, session).await
    }

    async fn delete_item(&self, ctx: &OpContext, name: &str, session: &Session) -> Result<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete_item(ctx, name, session).await
    }

    async fn close(&self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.inner.close().await
    }

    fn supports_conditional_create(&self) -> bool {
        self.conditional
    }

    async fn create_item_if_absent(
        &self,
        ctx: &OpContext,
        name: &str,
        value: &str,
        session: &Session,
    ) -> Result<bool> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.inner.create_item_if_absent(ctx, name, value, session).await
    }
}
