//! Per-session prepared statement cache keyed by exact SQL text.
//!
//! The default cache never evicts: a benchmark run only produces a handful of
//! statement shapes (times the distinct read/scan projections), so the map
//! stays small. A workload that generates many distinct field subsets will
//! grow it without bound; plug in another [`StatementCache`] for that case.

use std::collections::HashMap;

pub trait StatementCache<S>: Send {
    fn get(&self, sql: &str) -> Option<&S>;

    /// Insert a statement, returning the one it replaced.
    fn insert(&mut self, sql: String, stmt: S) -> Option<S>;

    fn remove(&mut self, sql: &str) -> Option<S>;

    /// Remove and return every cached statement.
    fn drain(&mut self) -> Vec<S>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug)]
pub struct UnboundedStatementCache<S> {
    stmts: HashMap<String, S>,
}

impl<S> Default for UnboundedStatementCache<S> {
    fn default() -> Self {
        Self {
            stmts: HashMap::new(),
        }
    }
}

impl<S> UnboundedStatementCache<S> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: Send> StatementCache<S> for UnboundedStatementCache<S> {
    fn get(&self, sql: &str) -> Option<&S> {
        self.stmts.get(sql)
    }

    fn insert(&mut self, sql: String, stmt: S) -> Option<S> {
        self.stmts.insert(sql, stmt)
    }

    fn remove(&mut self, sql: &str) -> Option<S> {
        self.stmts.remove(sql)
    }

    fn drain(&mut self) -> Vec<S> {
        self.stmts.drain().map(|(_, stmt)| stmt).collect()
    }

    fn len(&self) -> usize {
        self.stmts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_by_exact_text() {
        let mut cache = UnboundedStatementCache::new();
        assert!(cache.insert("SELECT 1".to_string(), 1).is_none());
        assert_eq!(cache.get("SELECT 1"), Some(&1));
        assert_eq!(cache.get("select 1"), None);
        assert_eq!(cache.get("SELECT 1 "), None);
    }

    #[test]
    fn insert_replaces_and_returns_previous() {
        let mut cache = UnboundedStatementCache::new();
        cache.insert("q".to_string(), "old");
        assert_eq!(cache.insert("q".to_string(), "new"), Some("old"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn drain_empties_the_cache() {
        let mut cache: Box<dyn StatementCache<u32>> = Box::new(UnboundedStatementCache::new());
        for (i, sql) in ["a", "b", "c"].into_iter().enumerate() {
            cache.insert(sql.to_string(), i as u32);
        }
        assert_eq!(cache.remove("b"), Some(1));
        let mut drained = cache.drain();
        drained.sort_unstable();
        assert_eq!(drained, [0, 2]);
        assert!(cache.is_empty());
    }
}
