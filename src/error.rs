use mysql_async::{DriverError, ServerError};
use thiserror::Error;

/// Server error codes that mean the session's connection is gone.
const ER_SERVER_SHUTDOWN: u16 = 1053;
const ER_CONNECTION_KILLED: u16 = 1927;
const ER_CLIENT_INTERACTION_TIMEOUT: u16 = 4031;
/// The statement id is no longer known to the server.
pub(crate) const ER_UNKNOWN_STMT_HANDLER: u16 = 1243;

#[derive(Debug, Error)]
pub enum KvBenchError {
    #[error(transparent)]
    MysqlError(#[from] mysql_async::Error),

    #[error(transparent)]
    PoolError(#[from] deadpool::managed::PoolError<mysql_async::Error>),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Unknown backend: {0}")]
    UnknownBackend(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Operation deadline exceeded")]
    DeadlineExceeded,
}

impl KvBenchError {
    /// True when the failure means the underlying connection can no longer be used.
    #[must_use]
    pub fn is_stale_connection(&self) -> bool {
        match self {
            KvBenchError::MysqlError(err) => is_stale(err),
            KvBenchError::PoolError(deadpool::managed::PoolError::Backend(err)) => is_stale(err),
            _ => false,
        }
    }
}

pub(crate) fn is_stale(err: &mysql_async::Error) -> bool {
    match err {
        mysql_async::Error::Io(_) | mysql_async::Error::Driver(DriverError::ConnectionClosed) => {
            true
        }
        mysql_async::Error::Server(ServerError { code, .. }) => matches!(
            *code,
            ER_SERVER_SHUTDOWN | ER_CONNECTION_KILLED | ER_CLIENT_INTERACTION_TIMEOUT
        ),
        _ => false,
    }
}

/// Cached statements that fail this way are dropped from the session cache.
pub(crate) fn invalidates_statement(err: &mysql_async::Error) -> bool {
    match err {
        mysql_async::Error::Server(ServerError { code, .. }) => *code == ER_UNKNOWN_STMT_HANDLER,
        other => is_stale(other),
    }
}
