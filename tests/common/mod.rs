#![allow(dead_code)]

use std::collections::HashMap;

use kvbench_mysql::{KvBenchError, MysqlAdapter, Properties, Values};
use mysql_async::prelude::Queryable;

/// Properties for a live server named by `KVBENCH_MYSQL_HOST`, or `None` when
/// the tests should be skipped. Every call gets its own table.
pub fn mysql_props(test: &str) -> Option<Properties> {
    let Ok(host) = std::env::var("KVBENCH_MYSQL_HOST") else {
        eprintln!("[{test}] KVBENCH_MYSQL_HOST not set, skipping");
        return None;
    };
    let mut props = Properties::new()
        .with("mysql.host", host)
        .with("table", unique_table(test))
        .with("fieldcount", "3")
        .with("fieldlength", "100")
        .with("threadcount", "4");
    for (var, key) in [
        ("KVBENCH_MYSQL_PORT", "mysql.port"),
        ("KVBENCH_MYSQL_USER", "mysql.user"),
        ("KVBENCH_MYSQL_PASSWORD", "mysql.password"),
        ("KVBENCH_MYSQL_DB", "mysql.db"),
    ] {
        if let Ok(value) = std::env::var(var) {
            props.set(key, value);
        }
    }
    Some(props)
}

fn unique_table(test: &str) -> String {
    let ns = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .subsec_nanos();
    format!("kv_{test}_{}_{ns}", std::process::id())
}

pub fn values(items: &[(&str, &str)]) -> Values {
    items
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.as_bytes().to_vec()))
        .collect()
}

pub fn text(row: &HashMap<String, Vec<u8>>, column: &str) -> String {
    String::from_utf8(row[column].clone()).unwrap()
}

pub fn table(adapter: &MysqlAdapter) -> String {
    adapter.config().table.name.clone()
}

/// Run raw SQL on a connection of its own.
pub async fn run_sql(adapter: &MysqlAdapter, sql: &str) -> Result<(), KvBenchError> {
    let mut conn = adapter.pool().acquire().await?;
    let result = conn.query_drop(sql).await;
    adapter.pool().release(conn).await;
    Ok(result?)
}

pub async fn drop_table(adapter: &MysqlAdapter) -> Result<(), KvBenchError> {
    run_sql(adapter, &format!("DROP TABLE IF EXISTS {}", table(adapter))).await
}
