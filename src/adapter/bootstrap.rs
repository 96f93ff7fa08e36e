use mysql_async::prelude::Queryable;

use super::MysqlAdapter;
use crate::error::KvBenchError;
use crate::query_builder::{create_table_sql, drop_table_sql};

impl MysqlAdapter {
    /// Create the benchmark table if it is missing, dropping it first for a
    /// load run with `dropdata` set. Runs on a connection of its own, outside
    /// any worker session.
    ///
    /// # Errors
    /// Propagates connection and DDL failures.
    pub async fn create_table(&self) -> Result<(), KvBenchError> {
        let table = &self.config.table;
        let mut conn = self.pool.acquire().await?;
        let mut result = Ok(());
        if table.should_drop() {
            let sql = drop_table_sql(&table.name);
            if self.config.verbose {
                tracing::info!(sql = %sql, "dropping table");
            }
            result = conn.query_drop(sql.as_str()).await;
        }
        if result.is_ok() {
            let sql = create_table_sql(table);
            if self.config.verbose {
                tracing::info!(sql = %sql, "creating table");
            }
            result = conn.query_drop(sql.as_str()).await;
        }
        self.pool.release(conn).await;
        Ok(result?)
    }
}
