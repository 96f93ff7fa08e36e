//! Per-worker connection state.
//!
//! A [`WorkerSession`] is created by `init_thread`, passed by `&mut` to every
//! operation the worker issues, and consumed by `cleanup_thread`. What it holds
//! depends on the connection mode: a [`PooledSession`] keeps one connection and
//! a statement cache for its whole life, while a [`PerCallSession`] holds
//! nothing and opens a fresh connection per operation.

mod per_call;
mod pooled;

use async_trait::async_trait;
use mysql_async::Value;

pub use per_call::PerCallSession;
pub use pooled::PooledSession;

use crate::error::KvBenchError;
use crate::types::{ConnectionMode, Row};

#[async_trait]
pub trait ConnectionSession: Send {
    fn mode(&self) -> ConnectionMode;

    /// Run a row-returning statement and decode every row.
    async fn query(
        &mut self,
        sql: &str,
        args: Vec<Value>,
        capacity: usize,
    ) -> Result<Vec<Row>, KvBenchError>;

    /// Run a statement and discard any result.
    async fn execute(&mut self, sql: &str, args: Vec<Value>) -> Result<(), KvBenchError>;

    /// Number of prepared statements currently held.
    fn cached_statements(&self) -> usize;

    /// Close cached statements and give back any owned connection. A
    /// connection left mid-command by a dropped operation is discarded instead.
    /// Failures are logged, never returned.
    async fn close(self: Box<Self>);
}

/// Private state of one benchmark worker.
pub struct WorkerSession {
    worker_id: usize,
    total_workers: usize,
    inner: Box<dyn ConnectionSession>,
}

impl WorkerSession {
    pub(crate) fn new(
        worker_id: usize,
        total_workers: usize,
        inner: Box<dyn ConnectionSession>,
    ) -> Self {
        Self {
            worker_id,
            total_workers,
            inner,
        }
    }

    #[must_use]
    pub fn worker_id(&self) -> usize {
        self.worker_id
    }

    #[must_use]
    pub fn total_workers(&self) -> usize {
        self.total_workers
    }

    #[must_use]
    pub fn mode(&self) -> ConnectionMode {
        self.inner.mode()
    }

    #[must_use]
    pub fn cached_statements(&self) -> usize {
        self.inner.cached_statements()
    }

    pub(crate) fn inner_mut(&mut self) -> &mut dyn ConnectionSession {
        self.inner.as_mut()
    }

    pub(crate) async fn close(self) {
        tracing::debug!(worker_id = self.worker_id, "closing worker session");
        self.inner.close().await;
    }
}

impl std::fmt::Debug for WorkerSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerSession")
            .field("worker_id", &self.worker_id)
            .field("total_workers", &self.total_workers)
            .field("mode", &self.mode())
            .field("cached_statements", &self.cached_statements())
            .finish()
    }
}
