//! Key/value benchmark adapter for MySQL-protocol databases (MySQL, TiDB,
//! MariaDB).
//!
//! A workload driver builds one [`MysqlAdapter`] (usually through a
//! [`DbRegistry`]), gives every worker its own [`WorkerSession`] from
//! [`KvDb::init_thread`], and runs read/scan/update/insert/delete operations
//! against it. In persistent mode each session pins one pooled connection and
//! caches its prepared statements; in short-connection mode every operation
//! runs on a connection opened and closed for it.

pub mod adapter;
pub mod cancel;
pub mod codec;
pub mod config;
pub mod db;
pub mod error;
pub mod pool;
pub mod prelude;
pub mod properties;
pub mod query_builder;
pub mod registry;
pub mod results;
pub mod schema;
pub mod session;
pub mod statement_cache;
pub mod types;

pub use adapter::MysqlAdapter;
pub use config::{MysqlConfig, PoolLimits, TableConfig};
pub use db::{DbCreator, KvDb};
pub use error::KvBenchError;
pub use pool::{ConnectionPool, PoolStatus};
pub use properties::Properties;
pub use registry::{DbRegistry, MysqlCreator, register_mysql_family};
pub use session::WorkerSession;
pub use types::{Backend, ConnectionMode, Row, Values};
