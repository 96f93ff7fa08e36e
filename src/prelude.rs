//! Convenient imports for driving an adapter.
//!
//! This module re-exports the types a workload driver needs to create a
//! database by name and run operations against it.

pub use crate::adapter::MysqlAdapter;
pub use crate::cancel::{with_cancellation, with_deadline};
pub use crate::db::{DbCreator, KvDb};
pub use crate::error::KvBenchError;
pub use crate::properties::Properties;
pub use crate::registry::{DbRegistry, register_mysql_family};
pub use crate::session::WorkerSession;
pub use crate::types::{Backend, ConnectionMode, Row, Values};
