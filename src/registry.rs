use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::adapter::MysqlAdapter;
use crate::db::{DbCreator, KvDb};
use crate::error::KvBenchError;
use crate::properties::Properties;
use crate::types::Backend;

/// Name to factory map owned by the hosting driver.
#[derive(Clone, Default)]
pub struct DbRegistry {
    creators: HashMap<String, Arc<dyn DbCreator>>,
}

impl DbRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the MySQL family already registered.
    #[must_use]
    pub fn with_mysql_family() -> Self {
        let mut registry = Self::new();
        register_mysql_family(&mut registry);
        registry
    }

    /// Register `creator` under `name`, returning any creator it replaces.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        creator: Arc<dyn DbCreator>,
    ) -> Option<Arc<dyn DbCreator>> {
        self.creators.insert(name.into(), creator)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn DbCreator>> {
        self.creators.get(name).cloned()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.creators.contains_key(name)
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.creators.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Build the database registered under `name`.
    ///
    /// # Errors
    /// Returns `KvBenchError::UnknownBackend` for an unregistered name, otherwise whatever
    /// the creator fails with.
    pub async fn create(
        &self,
        name: &str,
        props: &Properties,
    ) -> Result<Arc<dyn KvDb>, KvBenchError> {
        let creator = self
            .get(name)
            .ok_or_else(|| KvBenchError::UnknownBackend(name.to_string()))?;
        tracing::debug!(backend = name, "creating database");
        creator.create(props).await
    }
}

impl std::fmt::Debug for DbRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbRegistry")
            .field("names", &self.names())
            .finish()
    }
}

/// Creates a [`MysqlAdapter`]; the same creator serves every MySQL-protocol engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlCreator;

#[async_trait]
impl DbCreator for MysqlCreator {
    async fn create(&self, props: &Properties) -> Result<Arc<dyn KvDb>, KvBenchError> {
        Ok(Arc::new(MysqlAdapter::new(props).await?))
    }
}

/// Register [`MysqlCreator`] under every [`Backend`] name.
pub fn register_mysql_family(registry: &mut DbRegistry) {
    let creator: Arc<dyn DbCreator> = Arc::new(MysqlCreator);
    for backend in Backend::ALL {
        registry.register(backend.name(), Arc::clone(&creator));
    }
}
