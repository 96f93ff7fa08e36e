use super::KEY_COLUMN;
use crate::config::TableConfig;

/// `CREATE TABLE IF NOT EXISTS` for the benchmark table: a 64-character key plus
/// either `fieldcount` generated `FIELDi VARCHAR(fieldlength)` columns or the
/// explicit field spec.
#[must_use]
pub fn create_table_sql(table: &TableConfig) -> String {
    let mut sql = format!(
        "CREATE TABLE IF NOT EXISTS {} ({KEY_COLUMN} VARCHAR(64) PRIMARY KEY",
        table.name
    );
    match &table.fields {
        Some(spec) => sql.push_str(&spec.to_sql_fragment()),
        None => {
            for i in 0..table.field_count {
                sql.push_str(&format!(", FIELD{i} VARCHAR({})", table.field_length));
            }
        }
    }
    sql.push_str(");");
    sql
}

#[must_use]
pub fn drop_table_sql(table: &str) -> String {
    format!("DROP TABLE IF EXISTS {table}")
}

#[must_use]
pub fn analyze_table_sql(table: &str) -> String {
    format!("ANALYZE TABLE {table}")
}
