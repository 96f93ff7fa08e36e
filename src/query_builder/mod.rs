use std::ops::Deref;
use std::sync::{Arc, Mutex};

mod ddl;
mod dml;
mod select;

pub use ddl::{analyze_table_sql, create_table_sql, drop_table_sql};
pub use dml::{bind_value, insert_args, update_args};

/// Primary-key column of every benchmark table.
pub const KEY_COLUMN: &str = "YCSB_KEY";

/// Hint pinning the primary-key index when `mysql.force_index` is on.
pub const FORCE_INDEX_PRIMARY: &str = "FORCE INDEX(`PRIMARY`)";

const BUF_CAPACITY: usize = 256;
const MAX_POOLED_BUFS: usize = 64;

/// Recycled `String` buffers for SQL text construction.
#[derive(Debug, Clone, Default)]
pub struct BufPool {
    bufs: Arc<Mutex<Vec<String>>>,
}

impl BufPool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self) -> SqlBuf {
        let buf = self
            .bufs
            .lock()
            .ok()
            .and_then(|mut bufs| bufs.pop())
            .unwrap_or_else(|| String::with_capacity(BUF_CAPACITY));
        SqlBuf {
            buf,
            pool: self.clone(),
        }
    }

    fn put(&self, mut buf: String) {
        buf.clear();
        if let Ok(mut bufs) = self.bufs.lock() {
            if bufs.len() < MAX_POOLED_BUFS {
                bufs.push(buf);
            }
        }
    }

    #[must_use]
    pub fn idle(&self) -> usize {
        self.bufs.lock().map(|bufs| bufs.len()).unwrap_or(0)
    }
}

/// SQL text borrowed from a [`BufPool`]; the buffer goes back to the pool on drop.
#[derive(Debug)]
pub struct SqlBuf {
    buf: String,
    pool: BufPool,
}

impl SqlBuf {
    pub(crate) fn push_str(&mut self, s: &str) {
        self.buf.push_str(s);
    }

    pub(crate) fn push(&mut self, c: char) {
        self.buf.push(c);
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.buf
    }
}

impl Deref for SqlBuf {
    type Target = str;

    fn deref(&self) -> &str {
        &self.buf
    }
}

impl Drop for SqlBuf {
    fn drop(&mut self) {
        self.pool.put(std::mem::take(&mut self.buf));
    }
}

/// Generates the CRUD statement shapes for a table keyed on [`KEY_COLUMN`].
///
/// No generated text is cached here; sessions cache the prepared statements
/// derived from it.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    force_index: bool,
    bufs: BufPool,
}

impl QueryBuilder {
    #[must_use]
    pub fn new(force_index: bool) -> Self {
        Self {
            force_index,
            bufs: BufPool::new(),
        }
    }

    #[must_use]
    pub fn force_index(&self) -> bool {
        self.force_index
    }

    #[must_use]
    pub fn buffers(&self) -> &BufPool {
        &self.bufs
    }

    fn push_from(&self, buf: &mut SqlBuf, table: &str) {
        buf.push_str(" FROM ");
        buf.push_str(table);
        if self.force_index {
            buf.push(' ');
            buf.push_str(FORCE_INDEX_PRIMARY);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffers_are_recycled() {
        let pool = BufPool::new();
        {
            let mut buf = pool.get();
            buf.push_str("SELECT 1");
            assert_eq!(&*buf, "SELECT 1");
        }
        assert_eq!(pool.idle(), 1);
        let buf = pool.get();
        assert!(buf.is_empty());
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn pool_keeps_a_bounded_number_of_buffers() {
        let pool = BufPool::new();
        let held: Vec<_> = (0..MAX_POOLED_BUFS + 5).map(|_| pool.get()).collect();
        drop(held);
        assert_eq!(pool.idle(), MAX_POOLED_BUFS);
    }
}
