use super::{KEY_COLUMN, QueryBuilder, SqlBuf};

impl QueryBuilder {
    /// `SELECT` of one row by exact key. `None` or an empty slice selects every column.
    #[must_use]
    pub fn read(&self, table: &str, fields: Option<&[String]>) -> SqlBuf {
        let mut buf = self.select_prefix(table, fields);
        buf.push_str(" WHERE ");
        buf.push_str(KEY_COLUMN);
        buf.push_str(" = ?");
        buf
    }

    /// Range `SELECT` starting at a key, in ascending key order, bounded by a `LIMIT ?` argument.
    #[must_use]
    pub fn scan(&self, table: &str, fields: Option<&[String]>) -> SqlBuf {
        let mut buf = self.select_prefix(table, fields);
        buf.push_str(" WHERE ");
        buf.push_str(KEY_COLUMN);
        buf.push_str(" >= ? ORDER BY ");
        buf.push_str(KEY_COLUMN);
        buf.push_str(" LIMIT ?");
        buf
    }

    fn select_prefix(&self, table: &str, fields: Option<&[String]>) -> SqlBuf {
        let mut buf = self.bufs.get();
        buf.push_str("SELECT ");
        match fields {
            Some(fields) if !fields.is_empty() => {
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        buf.push(',');
                    }
                    buf.push_str(field);
                }
            }
            _ => buf.push('*'),
        }
        self.push_from(&mut buf, table);
        buf
    }
}
