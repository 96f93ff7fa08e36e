use std::sync::Arc;

use async_trait::async_trait;

use crate::error::KvBenchError;
use crate::properties::Properties;
use crate::session::WorkerSession;
use crate::types::{Row, Values};

/// The CRUD contract a workload driver invokes.
///
/// Implementations are shared by every worker behind an `Arc`; per-worker state
/// lives in the [`WorkerSession`] each worker obtains from
/// [`init_thread`](KvDb::init_thread) and passes to every operation.
#[async_trait]
pub trait KvDb: Send + Sync {
    /// Set up the private state for worker `worker_id` of `total_workers`.
    async fn init_thread(
        &self,
        worker_id: usize,
        total_workers: usize,
    ) -> Result<WorkerSession, KvBenchError>;

    /// Tear a worker session down. Failures are logged, never returned.
    async fn cleanup_thread(&self, session: WorkerSession);

    /// Read one record. `fields` of `None` or an empty slice selects every column.
    /// Returns `Ok(None)` when the key does not exist.
    async fn read(
        &self,
        session: &mut WorkerSession,
        table: &str,
        key: &str,
        fields: Option<&[String]>,
    ) -> Result<Option<Row>, KvBenchError>;

    /// Up to `count` records with keys `>= start_key`, in ascending key order.
    async fn scan(
        &self,
        session: &mut WorkerSession,
        table: &str,
        start_key: &str,
        count: usize,
        fields: Option<&[String]>,
    ) -> Result<Vec<Row>, KvBenchError>;

    async fn update(
        &self,
        session: &mut WorkerSession,
        table: &str,
        key: &str,
        values: &Values,
    ) -> Result<(), KvBenchError>;

    /// Insert a record; an existing key is left untouched.
    async fn insert(
        &self,
        session: &mut WorkerSession,
        table: &str,
        key: &str,
        values: &Values,
    ) -> Result<(), KvBenchError>;

    async fn delete(
        &self,
        session: &mut WorkerSession,
        table: &str,
        key: &str,
    ) -> Result<(), KvBenchError>;

    /// Refresh table statistics on a connection of its own.
    async fn analyze(&self, table: &str) -> Result<(), KvBenchError>;

    /// Release shared resources. Safe to call more than once.
    async fn close(&self);
}

/// Builds a [`KvDb`] from a property bag.
#[async_trait]
pub trait DbCreator: Send + Sync {
    async fn create(&self, props: &Properties) -> Result<Arc<dyn KvDb>, KvBenchError>;
}
