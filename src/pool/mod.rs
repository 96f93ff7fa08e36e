mod connection;
mod manager;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use deadpool::managed::{Manager, Object, Pool};
use mysql_async::Conn;

pub use connection::PooledConn;
pub use manager::MysqlManager;

use crate::config::PoolLimits;
use crate::error::KvBenchError;
use connection::{OpenGuard, Slot};

/// Point-in-time view of the pool's connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    /// Connections currently open, idle or checked out.
    pub open: usize,
    /// Open connections waiting in the pool.
    pub idle: usize,
    pub max_open: Option<usize>,
    pub max_idle: usize,
}

#[derive(Clone)]
enum PoolInner {
    Bounded(Pool<MysqlManager>),
    Unbounded(Arc<UnboundedPool>),
}

struct UnboundedPool {
    manager: MysqlManager,
    open: Arc<AtomicUsize>,
    closed: AtomicBool,
}

/// The connection pool shared by every worker of an adapter.
///
/// A bounded pool (persistent mode) is a deadpool pool capped at `max_open`;
/// on release, connections beyond `max_idle` idle ones are closed instead of
/// kept. An unbounded pool (short mode, `max_idle` 0) opens a new connection
/// for every acquisition and closes it on release, so nothing is ever reused.
#[derive(Clone)]
pub struct ConnectionPool {
    inner: PoolInner,
    limits: PoolLimits,
    silence: bool,
}

impl std::fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("status", &self.status())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl ConnectionPool {
    /// # Errors
    /// Returns `KvBenchError::ConfigError` if the bounded pool cannot be built.
    pub fn new(
        manager: MysqlManager,
        limits: PoolLimits,
        silence: bool,
    ) -> Result<Self, KvBenchError> {
        let inner = match limits.max_open {
            Some(max_open) => {
                let pool = Pool::builder(manager)
                    .max_size(max_open)
                    .build()
                    .map_err(|e| {
                        KvBenchError::ConfigError(format!("Failed to create MySQL pool: {e}"))
                    })?;
                PoolInner::Bounded(pool)
            }
            None => PoolInner::Unbounded(Arc::new(UnboundedPool {
                manager,
                open: Arc::new(AtomicUsize::new(0)),
                closed: AtomicBool::new(false),
            })),
        };
        Ok(Self {
            inner,
            limits,
            silence,
        })
    }

    #[must_use]
    pub fn limits(&self) -> PoolLimits {
        self.limits
    }

    /// Check a connection out, waiting while a bounded pool is at `max_open`.
    ///
    /// # Errors
    /// Returns `KvBenchError::PoolError` or `KvBenchError::MysqlError` if no connection can be
    /// opened, and `KvBenchError::ConnectionError` once the pool is closed.
    pub async fn acquire(&self) -> Result<PooledConn, KvBenchError> {
        match &self.inner {
            PoolInner::Bounded(pool) => Ok(PooledConn::pooled(pool.get().await?)),
            PoolInner::Unbounded(inner) => {
                if inner.closed.load(Ordering::Acquire) {
                    return Err(KvBenchError::ConnectionError(
                        "connection pool is closed".to_string(),
                    ));
                }
                let conn = inner.manager.connect().await?;
                Ok(PooledConn::detached(conn, OpenGuard::new(&inner.open)))
            }
        }
    }

    /// Give a connection back. It is kept for reuse only while the pool holds
    /// fewer than `max_idle` idle connections; otherwise it is disconnected.
    /// Disconnect failures are logged and never returned.
    pub async fn release(&self, conn: PooledConn) {
        match conn.into_slot() {
            Slot::Pooled(obj) => {
                if self.idle_connections() >= self.limits.max_idle {
                    self.disconnect(Object::take(obj)).await;
                    return;
                }
                drop(obj);
                // concurrent releases can all pass the check above
                if let PoolInner::Bounded(pool) = &self.inner {
                    for conn in trim_idle(pool, self.limits.max_idle) {
                        self.disconnect(conn).await;
                    }
                }
            }
            Slot::Detached { conn, open } => {
                self.disconnect(conn).await;
                drop(open);
            }
        }
    }

    #[must_use]
    pub fn status(&self) -> PoolStatus {
        let (open, idle) = match &self.inner {
            PoolInner::Bounded(pool) => {
                let status = pool.status();
                (status.size, status.available)
            }
            PoolInner::Unbounded(inner) => (inner.open.load(Ordering::Acquire), 0),
        };
        PoolStatus {
            open,
            idle,
            max_open: self.limits.max_open,
            max_idle: self.limits.max_idle,
        }
    }

    /// Stop handing out connections and drop the idle ones. Connections still
    /// checked out are closed when they come back.
    pub fn close(&self) {
        match &self.inner {
            PoolInner::Bounded(pool) => pool.close(),
            PoolInner::Unbounded(inner) => inner.closed.store(true, Ordering::Release),
        }
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        match &self.inner {
            PoolInner::Bounded(pool) => pool.is_closed(),
            PoolInner::Unbounded(inner) => inner.closed.load(Ordering::Acquire),
        }
    }

    fn idle_connections(&self) -> usize {
        match &self.inner {
            PoolInner::Bounded(pool) => pool.status().available,
            PoolInner::Unbounded(_) => 0,
        }
    }

    async fn disconnect(&self, conn: Conn) {
        let id = conn.id();
        if let Err(err) = conn.disconnect().await {
            if !self.silence {
                tracing::warn!(connection_id = id, error = %err, "error closing mysql connection");
            }
        }
    }
}

/// Detach idle objects beyond the first `max_idle` and hand them back.
fn trim_idle<M: Manager>(pool: &Pool<M>, max_idle: usize) -> Vec<M::Type> {
    let mut kept = 0;
    pool.retain(|_, _| {
        kept += 1;
        kept <= max_idle
    })
    .removed
}
