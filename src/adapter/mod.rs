mod bootstrap;

use async_trait::async_trait;
use mysql_async::prelude::Queryable;
use mysql_async::{Statement, Value};

use crate::codec::field_pairs;
use crate::config::MysqlConfig;
use crate::db::KvDb;
use crate::error::KvBenchError;
use crate::pool::{ConnectionPool, MysqlManager};
use crate::properties::Properties;
use crate::query_builder::{QueryBuilder, analyze_table_sql, insert_args, update_args};
use crate::session::{ConnectionSession, PerCallSession, PooledSession, WorkerSession};
use crate::statement_cache::{StatementCache, UnboundedStatementCache};
use crate::types::{ConnectionMode, Row, Values};

/// MySQL-protocol adapter shared by every worker of a benchmark run.
///
/// Construction resolves the configuration, opens the pool and bootstraps the
/// table. Each worker then gets its own [`WorkerSession`] from
/// [`init_thread`](KvDb::init_thread); the adapter itself holds no per-worker
/// state and is shared behind an `Arc`.
#[derive(Debug)]
pub struct MysqlAdapter {
    config: MysqlConfig,
    pool: ConnectionPool,
    queries: QueryBuilder,
}

impl MysqlAdapter {
    /// # Errors
    /// Fails on an invalid property, or if the table bootstrap fails.
    pub async fn new(props: &Properties) -> Result<Self, KvBenchError> {
        Self::with_config(MysqlConfig::from_properties(props)?).await
    }

    /// # Errors
    /// Fails if the pool cannot be built or the table bootstrap fails; the pool
    /// is closed before returning the error.
    pub async fn with_config(config: MysqlConfig) -> Result<Self, KvBenchError> {
        let pool = ConnectionPool::new(
            MysqlManager::new(config.opts()),
            config.pool_limits(),
            config.silence,
        )?;
        let adapter = Self {
            queries: QueryBuilder::new(config.force_index),
            config,
            pool,
        };
        if let Err(err) = adapter.create_table().await {
            adapter.pool.close();
            return Err(err);
        }
        tracing::debug!(
            host = %adapter.config.host,
            port = adapter.config.port,
            db = %adapter.config.db_name,
            mode = ?adapter.config.mode,
            "mysql adapter ready"
        );
        Ok(adapter)
    }

    #[must_use]
    pub fn config(&self) -> &MysqlConfig {
        &self.config
    }

    #[must_use]
    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    /// Like [`init_thread`](KvDb::init_thread) but with a caller-supplied
    /// statement cache for persistent sessions. Short sessions ignore it.
    ///
    /// # Errors
    /// Fails if the session cannot get a connection.
    pub async fn init_thread_with_cache(
        &self,
        worker_id: usize,
        total_workers: usize,
        cache: Box<dyn StatementCache<Statement>>,
    ) -> Result<WorkerSession, KvBenchError> {
        let inner: Box<dyn ConnectionSession> = match self.config.mode {
            ConnectionMode::Persistent => Box::new(
                PooledSession::open(self.pool.clone(), cache, self.config.silence).await?,
            ),
            ConnectionMode::Short => Box::new(PerCallSession::open(self.pool.clone()).await?),
        };
        tracing::debug!(worker_id, total_workers, "worker session opened");
        Ok(WorkerSession::new(worker_id, total_workers, inner))
    }

    /// Server id of the connection that serves a statement on this session.
    /// Short sessions get a different answer on every call.
    ///
    /// # Errors
    /// Fails if the statement fails or returns something other than an id.
    pub async fn connection_id(&self, session: &mut WorkerSession) -> Result<u64, KvBenchError> {
        let rows = self
            .query(session, "SELECT CONNECTION_ID()", Vec::new(), 1)
            .await?;
        rows.into_iter()
            .next()
            .and_then(|row| row.into_values().next())
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .and_then(|id| id.parse().ok())
            .ok_or_else(|| {
                KvBenchError::ConnectionError("CONNECTION_ID() returned no id".to_string())
            })
    }

    async fn query(
        &self,
        session: &mut WorkerSession,
        sql: &str,
        args: Vec<Value>,
        capacity: usize,
    ) -> Result<Vec<Row>, KvBenchError> {
        self.log_statement(sql, &args);
        session.inner_mut().query(sql, args, capacity).await
    }

    async fn execute(
        &self,
        session: &mut WorkerSession,
        sql: &str,
        args: Vec<Value>,
    ) -> Result<(), KvBenchError> {
        self.log_statement(sql, &args);
        session.inner_mut().execute(sql, args).await
    }

    fn log_statement(&self, sql: &str, args: &[Value]) {
        if self.config.verbose {
            let args: Vec<String> = args.iter().map(|arg| arg.as_sql(false)).collect();
            tracing::info!(sql, ?args, "executing statement");
        }
    }
}

#[async_trait]
impl KvDb for MysqlAdapter {
    async fn init_thread(
        &self,
        worker_id: usize,
        total_workers: usize,
    ) -> Result<WorkerSession, KvBenchError> {
        self.init_thread_with_cache(
            worker_id,
            total_workers,
            Box::new(UnboundedStatementCache::new()),
        )
        .await
    }

    async fn cleanup_thread(&self, session: WorkerSession) {
        session.close().await;
    }

    async fn read(
        &self,
        session: &mut WorkerSession,
        table: &str,
        key: &str,
        fields: Option<&[String]>,
    ) -> Result<Option<Row>, KvBenchError> {
        let sql = self.queries.read(table, fields);
        let args = vec![Value::Bytes(key.as_bytes().to_vec())];
        let rows = self.query(session, &sql, args, 1).await?;
        Ok(rows.into_iter().next())
    }

    async fn scan(
        &self,
        session: &mut WorkerSession,
        table: &str,
        start_key: &str,
        count: usize,
        fields: Option<&[String]>,
    ) -> Result<Vec<Row>, KvBenchError> {
        let sql = self.queries.scan(table, fields);
        let args = vec![
            Value::Bytes(start_key.as_bytes().to_vec()),
            Value::from(count as u64),
        ];
        self.query(session, &sql, args, count).await
    }

    async fn update(
        &self,
        session: &mut WorkerSession,
        table: &str,
        key: &str,
        values: &Values,
    ) -> Result<(), KvBenchError> {
        let pairs = field_pairs(values);
        let sql = self.queries.update(table, &pairs);
        self.execute(session, &sql, update_args(key, &pairs)).await
    }

    async fn insert(
        &self,
        session: &mut WorkerSession,
        table: &str,
        key: &str,
        values: &Values,
    ) -> Result<(), KvBenchError> {
        let pairs = field_pairs(values);
        let sql = self.queries.insert(table, &pairs);
        self.execute(session, &sql, insert_args(key, &pairs)).await
    }

    async fn delete(
        &self,
        session: &mut WorkerSession,
        table: &str,
        key: &str,
    ) -> Result<(), KvBenchError> {
        let sql = self.queries.delete(table);
        let args = vec![Value::Bytes(key.as_bytes().to_vec())];
        self.execute(session, &sql, args).await
    }

    async fn analyze(&self, table: &str) -> Result<(), KvBenchError> {
        let sql = analyze_table_sql(table);
        self.log_statement(&sql, &[]);
        let mut conn = self.pool.acquire().await?;
        let result = conn.query_drop(sql.as_str()).await;
        self.pool.release(conn).await;
        Ok(result?)
    }

    async fn close(&self) {
        if !self.pool.is_closed() {
            tracing::debug!(status = ?self.pool.status(), "closing mysql adapter");
            self.pool.close();
        }
    }
}
