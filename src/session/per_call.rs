use async_trait::async_trait;
use mysql_async::Value;
use mysql_async::prelude::Queryable;

use super::ConnectionSession;
use crate::error::{KvBenchError, is_stale};
use crate::pool::{ConnectionPool, PooledConn};
use crate::results::decode_rows;
use crate::types::{ConnectionMode, Row};

/// Short-connection session. Holds nothing between operations: each one runs
/// on a connection opened for it and closed right after, and its statement is
/// prepared, executed and closed in that single round.
#[derive(Debug)]
pub struct PerCallSession {
    pool: ConnectionPool,
}

impl PerCallSession {
    /// Opens and closes one connection to check the server is reachable.
    ///
    /// # Errors
    /// Fails if that connection cannot be opened.
    pub async fn open(pool: ConnectionPool) -> Result<Self, KvBenchError> {
        let conn = pool.acquire().await?;
        pool.release(conn).await;
        Ok(Self { pool })
    }

    async fn finish<T>(
        &self,
        conn: PooledConn,
        result: Result<T, mysql_async::Error>,
    ) -> Result<T, KvBenchError> {
        match result {
            Err(err) if is_stale(&err) => {
                conn.discard();
                Err(err.into())
            }
            other => {
                self.pool.release(conn).await;
                Ok(other?)
            }
        }
    }
}

#[async_trait]
impl ConnectionSession for PerCallSession {
    fn mode(&self) -> ConnectionMode {
        ConnectionMode::Short
    }

    async fn query(
        &mut self,
        sql: &str,
        args: Vec<Value>,
        capacity: usize,
    ) -> Result<Vec<Row>, KvBenchError> {
        let mut conn = self.pool.acquire().await?;
        let result = conn.exec::<mysql_async::Row, _, _>(sql, args).await;
        let rows = self.finish(conn, result).await?;
        Ok(decode_rows(rows, capacity))
    }

    async fn execute(&mut self, sql: &str, args: Vec<Value>) -> Result<(), KvBenchError> {
        let mut conn = self.pool.acquire().await?;
        let result = conn.exec_drop(sql, args).await;
        self.finish(conn, result).await
    }

    fn cached_statements(&self) -> usize {
        0
    }

    async fn close(self: Box<Self>) {}
}
