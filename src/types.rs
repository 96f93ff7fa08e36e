use std::collections::HashMap;
use std::fmt;

use clap::ValueEnum;

/// A single result row: column name to raw bytes, independent of declared SQL type.
pub type Row = HashMap<String, Vec<u8>>;

/// Field values supplied on the write path (update/insert).
pub type Values = HashMap<String, Vec<u8>>;

/// Wire-compatible engines this adapter is registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Backend {
    /// MySQL
    Mysql,
    /// TiDB (MySQL protocol)
    Tidb,
    /// `MariaDB`
    Mariadb,
}

impl Backend {
    pub const ALL: [Backend; 3] = [Backend::Mysql, Backend::Tidb, Backend::Mariadb];

    /// Registry name of this backend.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Backend::Mysql => "mysql",
            Backend::Tidb => "tidb",
            Backend::Mariadb => "mariadb",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How worker sessions hold connections. Fixed for the lifetime of an adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// One pooled connection per worker for its whole lifetime; statements cached.
    Persistent,
    /// A fresh connection per operation, closed on release; nothing cached.
    Short,
}
