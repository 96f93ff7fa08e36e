use async_trait::async_trait;
use mysql_async::prelude::Queryable;
use mysql_async::{Statement, Value};

use super::ConnectionSession;
use crate::error::{KvBenchError, invalidates_statement, is_stale};
use crate::pool::{ConnectionPool, PooledConn};
use crate::results::decode_rows;
use crate::statement_cache::StatementCache;
use crate::types::{ConnectionMode, Row};

/// Persistent-mode session: one connection held for the worker's lifetime and
/// the statements prepared on it, keyed by SQL text.
///
/// An operation dropped while its command is on the wire leaves the reply
/// unread on the connection. `in_flight` records that; the next call replaces
/// the connection, and `close` discards it instead of giving it back.
pub struct PooledSession {
    pool: ConnectionPool,
    conn: PooledConn,
    cache: Box<dyn StatementCache<Statement>>,
    silence: bool,
    in_flight: bool,
}

/// Discards the connection unless it is taken back out.
struct DiscardOnDrop(Option<PooledConn>);

impl Drop for DiscardOnDrop {
    fn drop(&mut self) {
        if let Some(conn) = self.0.take() {
            conn.discard();
        }
    }
}

impl PooledSession {
    /// # Errors
    /// Fails if no connection can be acquired.
    pub async fn open(
        pool: ConnectionPool,
        cache: Box<dyn StatementCache<Statement>>,
        silence: bool,
    ) -> Result<Self, KvBenchError> {
        let conn = pool.acquire().await?;
        tracing::debug!(connection_id = conn.id(), "pooled session opened");
        Ok(Self {
            pool,
            conn,
            cache,
            silence,
            in_flight: false,
        })
    }

    /// Server-side id of the connection this session currently owns.
    #[must_use]
    pub fn connection_id(&self) -> u32 {
        self.conn.id()
    }

    /// Cached statement for `sql`, preparing it on a miss. A prepare that fails
    /// on a dead connection reconnects and prepares once more.
    async fn statement(&mut self, sql: &str) -> Result<Statement, KvBenchError> {
        if let Some(stmt) = self.cache.get(sql) {
            return Ok(stmt.clone());
        }
        self.in_flight = true;
        let stmt = match self.conn.prep(sql).await {
            Ok(stmt) => stmt,
            Err(err) if is_stale(&err) => {
                tracing::debug!(error = %err, "prepare hit a stale connection, reconnecting");
                self.reconnect().await?;
                self.in_flight = true;
                let retried = self.conn.prep(sql).await;
                self.in_flight = false;
                retried?
            }
            Err(err) => {
                self.in_flight = false;
                return Err(err.into());
            }
        };
        self.in_flight = false;
        self.cache.insert(sql.to_string(), stmt.clone());
        Ok(stmt)
    }

    /// Replace the connection if the previous operation was dropped mid-command.
    async fn recover(&mut self) -> Result<(), KvBenchError> {
        if self.in_flight {
            tracing::debug!(
                connection_id = self.conn.id(),
                "previous operation abandoned mid-command, replacing connection"
            );
            self.reconnect().await?;
        }
        Ok(())
    }

    /// Swap in a fresh connection. Statements prepared on the old one are
    /// dropped with it.
    async fn reconnect(&mut self) -> Result<(), KvBenchError> {
        let fresh = self.pool.acquire().await?;
        let stale = std::mem::replace(&mut self.conn, fresh);
        stale.discard();
        self.in_flight = false;
        let dropped = self.cache.drain().len();
        tracing::debug!(
            connection_id = self.conn.id(),
            dropped_statements = dropped,
            "session reconnected"
        );
        Ok(())
    }

    fn invalidate(&mut self, sql: &str, err: &mysql_async::Error) {
        if invalidates_statement(err) && self.cache.remove(sql).is_some() {
            tracing::debug!(sql, error = %err, "evicted cached statement");
        }
    }
}

#[async_trait]
impl ConnectionSession for PooledSession {
    fn mode(&self) -> ConnectionMode {
        ConnectionMode::Persistent
    }

    async fn query(
        &mut self,
        sql: &str,
        args: Vec<Value>,
        capacity: usize,
    ) -> Result<Vec<Row>, KvBenchError> {
        self.recover().await?;
        let stmt = self.statement(sql).await?;
        self.in_flight = true;
        let result = self.conn.exec::<mysql_async::Row, _, _>(&stmt, args).await;
        self.in_flight = false;
        match result {
            Ok(rows) => Ok(decode_rows(rows, capacity)),
            Err(err) => {
                self.invalidate(sql, &err);
                Err(err.into())
            }
        }
    }

    async fn execute(&mut self, sql: &str, args: Vec<Value>) -> Result<(), KvBenchError> {
        self.recover().await?;
        let stmt = self.statement(sql).await?;
        self.in_flight = true;
        let result = self.conn.exec_drop(&stmt, args).await;
        self.in_flight = false;
        if let Err(err) = result {
            self.invalidate(sql, &err);
            return Err(err.into());
        }
        Ok(())
    }

    fn cached_statements(&self) -> usize {
        self.cache.len()
    }

    async fn close(self: Box<Self>) {
        let PooledSession {
            pool,
            conn,
            mut cache,
            silence,
            in_flight,
        } = *self;
        if in_flight {
            tracing::debug!(
                connection_id = conn.id(),
                "discarding connection with an unread reply"
            );
            conn.discard();
            return;
        }
        // a close dropped partway must not hand the connection back
        let mut held = DiscardOnDrop(Some(conn));
        for stmt in cache.drain() {
            let Some(conn) = held.0.as_mut() else {
                return;
            };
            if let Err(err) = conn.close(stmt).await {
                if !silence {
                    tracing::warn!(error = %err, "error closing prepared statement");
                }
                if is_stale(&err) {
                    return;
                }
            }
        }
        if let Some(conn) = held.0.take() {
            pool.release(conn).await;
        }
    }
}
