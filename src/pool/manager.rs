use std::fmt;

use deadpool::managed::{Manager, Metrics, RecycleResult};
use mysql_async::prelude::Queryable;
use mysql_async::{Conn, Opts};

/// deadpool manager for `mysql_async` connections.
pub struct MysqlManager {
    opts: Opts,
}

impl MysqlManager {
    #[must_use]
    pub fn new(opts: Opts) -> Self {
        Self { opts }
    }

    /// Open a connection outside of any pool bookkeeping.
    pub(crate) async fn connect(&self) -> Result<Conn, mysql_async::Error> {
        Conn::new(self.opts.clone()).await
    }
}

// Opts carries the password, so only the endpoint is shown.
impl fmt::Debug for MysqlManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MysqlManager")
            .field("host", &self.opts.ip_or_hostname())
            .field("port", &self.opts.tcp_port())
            .field("db_name", &self.opts.db_name())
            .finish()
    }
}

impl Manager for MysqlManager {
    type Type = Conn;
    type Error = mysql_async::Error;

    async fn create(&self) -> Result<Self::Type, Self::Error> {
        self.connect().await
    }

    async fn recycle(&self, conn: &mut Self::Type, _metrics: &Metrics) -> RecycleResult<Self::Error> {
        // Idle connections may have been closed by the server in the meantime.
        conn.ping().await?;
        Ok(())
    }
}
