use mysql_async::{Opts, OptsBuilder};

use crate::error::KvBenchError;
use crate::properties::{
    DO_TRANSACTIONS, DROP_DATA, FIELD_COUNT, FIELD_COUNT_DEFAULT, FIELD_LENGTH,
    FIELD_LENGTH_DEFAULT, FIELDS, MYSQL_DB_NAME, MYSQL_FORCE_INDEX, MYSQL_HOST, MYSQL_PASSWORD,
    MYSQL_PORT, MYSQL_USER, Properties, SILENCE, TABLE_NAME, TABLE_NAME_DEFAULT, THREAD_COUNT,
    THREAD_COUNT_DEFAULT, USE_SHORT_CONN, VERBOSE,
};
use crate::schema::FieldSpec;
use crate::types::ConnectionMode;

/// Connection ceilings for the shared pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolLimits {
    /// Maximum simultaneously open connections; `None` is unbounded.
    pub max_open: Option<usize>,
    /// Connections kept open after release; beyond this they are closed.
    pub max_idle: usize,
}

impl PoolLimits {
    /// Persistent mode keeps one connection per worker plus headroom; short mode
    /// keeps nothing idle so a released connection is never handed out again.
    #[must_use]
    pub fn for_mode(mode: ConnectionMode, thread_count: usize) -> Self {
        match mode {
            ConnectionMode::Persistent => Self {
                max_open: Some(thread_count * 2),
                max_idle: thread_count + 1,
            },
            ConnectionMode::Short => Self {
                max_open: None,
                max_idle: 0,
            },
        }
    }
}

/// Settings consumed by the one-time table bootstrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableConfig {
    pub name: String,
    pub field_count: usize,
    pub field_length: usize,
    pub fields: Option<FieldSpec>,
    pub drop_data: bool,
    pub do_transactions: bool,
}

impl TableConfig {
    /// The table is only dropped for a load run that asked for it.
    #[must_use]
    pub fn should_drop(&self) -> bool {
        self.drop_data && !self.do_transactions
    }
}

/// Fully resolved adapter configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct MysqlConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub db_name: String,
    pub force_index: bool,
    pub mode: ConnectionMode,
    pub thread_count: usize,
    pub verbose: bool,
    pub silence: bool,
    pub table: TableConfig,
}

impl std::fmt::Debug for MysqlConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MysqlConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("db_name", &self.db_name)
            .field("force_index", &self.force_index)
            .field("mode", &self.mode)
            .field("thread_count", &self.thread_count)
            .field("verbose", &self.verbose)
            .field("silence", &self.silence)
            .field("table", &self.table)
            .finish()
    }
}

impl MysqlConfig {
    /// Resolve the adapter configuration from the driver's property bag.
    ///
    /// # Errors
    /// Returns `KvBenchError::ConfigError` if any value fails to parse, the thread count is
    /// zero, or the explicit field spec is malformed.
    pub fn from_properties(props: &Properties) -> Result<Self, KvBenchError> {
        let thread_count = props.get_parsed::<i64>(THREAD_COUNT, THREAD_COUNT_DEFAULT)?;
        let thread_count = usize::try_from(thread_count)
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                KvBenchError::ConfigError(format!(
                    "{THREAD_COUNT} must be at least 1, got {thread_count}"
                ))
            })?;

        let mode = if props.get_bool(USE_SHORT_CONN, false)? {
            ConnectionMode::Short
        } else {
            ConnectionMode::Persistent
        };

        let fields = props.get_string(FIELDS, "");
        let fields = if fields.trim().is_empty() {
            None
        } else {
            Some(FieldSpec::parse(&fields)?)
        };

        let table = TableConfig {
            name: props.get_string(TABLE_NAME, TABLE_NAME_DEFAULT),
            field_count: props.get_parsed(FIELD_COUNT, FIELD_COUNT_DEFAULT as usize)?,
            field_length: props.get_parsed(FIELD_LENGTH, FIELD_LENGTH_DEFAULT as usize)?,
            fields,
            drop_data: props.get_bool(DROP_DATA, false)?,
            do_transactions: props.get_bool(DO_TRANSACTIONS, true)?,
        };
        if table.name.trim().is_empty() {
            return Err(KvBenchError::ConfigError(format!(
                "{TABLE_NAME} must not be empty"
            )));
        }

        Ok(Self {
            host: props.get_string(MYSQL_HOST, "127.0.0.1"),
            port: props.get_parsed(MYSQL_PORT, 3306)?,
            user: props.get_string(MYSQL_USER, "root"),
            password: props.get_string(MYSQL_PASSWORD, ""),
            db_name: props.get_string(MYSQL_DB_NAME, "test"),
            force_index: props.get_bool(MYSQL_FORCE_INDEX, true)?,
            mode,
            thread_count,
            verbose: props.get_bool(VERBOSE, false)?,
            silence: props.get_bool(SILENCE, true)?,
            table,
        })
    }

    #[must_use]
    pub fn pool_limits(&self) -> PoolLimits {
        PoolLimits::for_mode(self.mode, self.thread_count)
    }

    /// Driver options for one backend connection.
    ///
    /// The driver's own per-connection statement cache is disabled: persistent
    /// sessions keep their own cache and close those statements at cleanup.
    /// Short-mode statements are never closed explicitly; they go away with the
    /// connection, which is disconnected right after the operation.
    #[must_use]
    pub fn opts(&self) -> Opts {
        let password = (!self.password.is_empty()).then(|| self.password.clone());
        OptsBuilder::default()
            .ip_or_hostname(self.host.clone())
            .tcp_port(self.port)
            .user(Some(self.user.clone()))
            .pass(password)
            .db_name(Some(self.db_name.clone()))
            .stmt_cache_size(Some(0))
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_resolve_to_persistent_mode() {
        let config = MysqlConfig::from_properties(&Properties::new()).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 3306);
        assert_eq!(config.user, "root");
        assert_eq!(config.db_name, "test");
        assert!(config.force_index);
        assert!(!config.verbose);
        assert!(config.silence);
        assert_eq!(config.mode, ConnectionMode::Persistent);
        assert_eq!(config.thread_count, 200);
        assert_eq!(config.table.name, "usertable");
        assert_eq!(config.table.field_count, 10);
        assert_eq!(config.table.field_length, 100);
        assert!(config.table.fields.is_none());
        assert!(!config.table.should_drop());
    }

    #[test]
    fn pool_limits_follow_mode() {
        assert_eq!(
            PoolLimits::for_mode(ConnectionMode::Persistent, 8),
            PoolLimits {
                max_open: Some(16),
                max_idle: 9
            }
        );
        assert_eq!(
            PoolLimits::for_mode(ConnectionMode::Short, 8),
            PoolLimits {
                max_open: None,
                max_idle: 0
            }
        );
    }

    #[test]
    fn short_connection_and_bootstrap_flags() {
        let props = Properties::new()
            .with(USE_SHORT_CONN, "true")
            .with(THREAD_COUNT, "4")
            .with(DROP_DATA, "true")
            .with(DO_TRANSACTIONS, "false")
            .with(FIELDS, "A:INT,B:TEXT");
        let config = MysqlConfig::from_properties(&props).unwrap();
        assert_eq!(config.mode, ConnectionMode::Short);
        assert_eq!(config.pool_limits().max_idle, 0);
        assert!(config.table.should_drop());
        assert_eq!(config.table.fields.unwrap().columns().len(), 2);
    }

    #[test]
    fn drop_requires_load_phase() {
        let props = Properties::new().with(DROP_DATA, "true");
        let config = MysqlConfig::from_properties(&props).unwrap();
        assert!(!config.table.should_drop());
    }

    #[test]
    fn rejects_zero_threads_and_bad_values() {
        for props in [
            Properties::new().with(THREAD_COUNT, "0"),
            Properties::new().with(THREAD_COUNT, "-3"),
            Properties::new().with(MYSQL_PORT, "70000"),
            Properties::new().with(FIELDS, "broken"),
            Properties::new().with(TABLE_NAME, " "),
        ] {
            assert!(matches!(
                MysqlConfig::from_properties(&props),
                Err(KvBenchError::ConfigError(_))
            ));
        }
    }

    #[test]
    fn debug_output_hides_password() {
        let props = Properties::new().with(MYSQL_PASSWORD, "hunter2");
        let config = MysqlConfig::from_properties(&props).unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
    }
}
