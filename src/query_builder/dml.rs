use mysql_async::Value;

use super::{KEY_COLUMN, QueryBuilder, SqlBuf};
use crate::codec::FieldPair;

impl QueryBuilder {
    /// `UPDATE table SET f1 = ?, f2 = ? WHERE YCSB_KEY = ?` over the given pairs.
    #[must_use]
    pub fn update(&self, table: &str, pairs: &[FieldPair<'_>]) -> SqlBuf {
        let mut buf = self.bufs.get();
        buf.push_str("UPDATE ");
        buf.push_str(table);
        buf.push_str(" SET ");
        for (i, pair) in pairs.iter().enumerate() {
            if i > 0 {
                buf.push_str(", ");
            }
            buf.push_str(pair.field);
            buf.push_str(" = ?");
        }
        buf.push_str(" WHERE ");
        buf.push_str(KEY_COLUMN);
        buf.push_str(" = ?");
        buf
    }

    /// `INSERT IGNORE INTO table (YCSB_KEY, f1, ...) VALUES (?, ?, ...)`.
    #[must_use]
    pub fn insert(&self, table: &str, pairs: &[FieldPair<'_>]) -> SqlBuf {
        let mut buf = self.bufs.get();
        buf.push_str("INSERT IGNORE INTO ");
        buf.push_str(table);
        buf.push_str(" (");
        buf.push_str(KEY_COLUMN);
        for pair in pairs {
            buf.push_str(", ");
            buf.push_str(pair.field);
        }
        buf.push_str(") VALUES (?");
        for _ in pairs {
            buf.push_str(", ?");
        }
        buf.push(')');
        buf
    }

    #[must_use]
    pub fn delete(&self, table: &str) -> SqlBuf {
        let mut buf = self.bufs.get();
        buf.push_str("DELETE FROM ");
        buf.push_str(table);
        buf.push_str(" WHERE ");
        buf.push_str(KEY_COLUMN);
        buf.push_str(" = ?");
        buf
    }
}

/// Bind a raw field value. The literal strings `true` and `false` bind as
/// booleans so they land correctly in BOOLEAN columns.
#[must_use]
pub fn bind_value(value: &[u8]) -> Value {
    match value {
        b"true" => Value::from(true),
        b"false" => Value::from(false),
        other => Value::Bytes(other.to_vec()),
    }
}

/// Arguments for [`QueryBuilder::update`]: the field values, then the key.
#[must_use]
pub fn update_args(key: &str, pairs: &[FieldPair<'_>]) -> Vec<Value> {
    let mut args = Vec::with_capacity(pairs.len() + 1);
    args.extend(pairs.iter().map(|p| bind_value(p.value)));
    args.push(Value::Bytes(key.as_bytes().to_vec()));
    args
}

/// Arguments for [`QueryBuilder::insert`]: the key, then the field values.
#[must_use]
pub fn insert_args(key: &str, pairs: &[FieldPair<'_>]) -> Vec<Value> {
    let mut args = Vec::with_capacity(pairs.len() + 1);
    args.push(Value::Bytes(key.as_bytes().to_vec()));
    args.extend(pairs.iter().map(|p| bind_value(p.value)));
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::field_pairs;
    use crate::types::Values;

    fn values(items: &[(&str, &str)]) -> Values {
        items
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.as_bytes().to_vec()))
            .collect()
    }

    #[test]
    fn update_sets_fields_in_name_order() {
        let vals = values(&[("FIELD1", "b"), ("FIELD0", "a")]);
        let pairs = field_pairs(&vals);
        let qb = QueryBuilder::new(true);
        assert_eq!(
            &*qb.update("usertable", &pairs),
            "UPDATE usertable SET FIELD0 = ?, FIELD1 = ? WHERE YCSB_KEY = ?"
        );
        assert_eq!(
            update_args("user1", &pairs),
            vec![
                Value::Bytes(b"a".to_vec()),
                Value::Bytes(b"b".to_vec()),
                Value::Bytes(b"user1".to_vec()),
            ]
        );
    }

    #[test]
    fn insert_lists_key_first() {
        let vals = values(&[("FIELD1", "b"), ("FIELD0", "a")]);
        let pairs = field_pairs(&vals);
        let qb = QueryBuilder::new(true);
        assert_eq!(
            &*qb.insert("usertable", &pairs),
            "INSERT IGNORE INTO usertable (YCSB_KEY, FIELD0, FIELD1) VALUES (?, ?, ?)"
        );
        assert_eq!(
            insert_args("user1", &pairs),
            vec![
                Value::Bytes(b"user1".to_vec()),
                Value::Bytes(b"a".to_vec()),
                Value::Bytes(b"b".to_vec()),
            ]
        );
    }

    #[test]
    fn insert_with_no_fields_writes_only_the_key() {
        let qb = QueryBuilder::new(false);
        assert_eq!(
            &*qb.insert("t", &[]),
            "INSERT IGNORE INTO t (YCSB_KEY) VALUES (?)"
        );
    }

    #[test]
    fn delete_never_uses_the_index_hint() {
        let qb = QueryBuilder::new(true);
        assert_eq!(&*qb.delete("t"), "DELETE FROM t WHERE YCSB_KEY = ?");
    }

    #[test]
    fn boolean_literals_bind_as_booleans() {
        assert_eq!(bind_value(b"true"), Value::from(true));
        assert_eq!(bind_value(b"false"), Value::from(false));
        assert_eq!(bind_value(b"TRUE"), Value::Bytes(b"TRUE".to_vec()));
        assert_eq!(bind_value(b""), Value::Bytes(Vec::new()));
    }
}
