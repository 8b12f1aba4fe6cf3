//! Registry of named databases.
//!
//! A [`Registry`] maps names to open [`Db`] handles. All reads and writes of
//! the map go through one lock; the lock is never held while a pool is being
//! opened or closed. [`DbProvider`] resolves a name against the registry each
//! time it is used.

use crate::db::schema::{self, ModelRegistry};
use crate::db::{Db, DbPool};
use crate::error::{DbError, DbResult};
use crate::hook::{DefaultExecutorHook, ExecutorHook};
use crate::models::{DatabaseConfiguration, Dms};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Name → database map with register/unregister lifecycle.
///
/// Cloning is cheap and yields a handle to the same registry.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    databases: Arc<RwLock<HashMap<String, Arc<Db>>>>,
    models: ModelRegistry,
}

impl Registry {
    /// Create an empty registry with its own model set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry that auto-creates the tables of `models`.
    pub fn with_models(models: ModelRegistry) -> Self {
        Self {
            databases: Arc::default(),
            models,
        }
    }

    /// Models created on registrations with `auto_create_tables`.
    pub fn models(&self) -> &ModelRegistry {
        &self.models
    }

    /// Open, optionally initialise, and register a database.
    ///
    /// Fails with [`DbError::DatabaseConflict`] if the name is taken; the
    /// existing entry is left untouched. A pool opened by a failed
    /// registration is closed before returning.
    pub async fn register_db(&self, config: DatabaseConfiguration) -> DbResult<()> {
        config.validate()?;
        let DatabaseConfiguration {
            name,
            dsn,
            system,
            auto_create_tables,
            executor_hook,
            pool_options,
        } = config;

        // Early check for existing registration
        if self.databases.read().await.contains_key(&name) {
            return Err(DbError::database_conflict(name));
        }

        info!(
            name = %name,
            system = %system,
            driver = system.driver_name(),
            auto_create_tables,
            "Registering database"
        );

        let pool = DbPool::open(&dsn, system, &pool_options).await?;
        self.initialise(&name, &pool, system, auto_create_tables).await?;

        let hook: Arc<dyn ExecutorHook> =
            executor_hook.unwrap_or_else(|| Arc::new(DefaultExecutorHook));
        let hook_name = hook.name();
        let db = Arc::new(Db::new(name.clone(), system, pool, hook));
        self.publish(db).await?;

        info!(name = %name, executor_hook = hook_name, "Database registered");
        Ok(())
    }

    /// Create the registered tables on a freshly opened pool.
    ///
    /// The pool is closed if table creation fails.
    async fn initialise(
        &self,
        name: &str,
        pool: &DbPool,
        system: Dms,
        auto_create_tables: bool,
    ) -> DbResult<()> {
        if !auto_create_tables {
            return Ok(());
        }
        let tables = self.models.tables();
        if let Err(e) = schema::create_tables(pool, system, &tables).await {
            warn!(name = %name, error = %e, "Table creation failed, closing connection");
            pool.close().await;
            return Err(e);
        }
        Ok(())
    }

    /// Insert `db` unless its name was taken while it was being opened, in
    /// which case its pool is closed.
    async fn publish(&self, db: Arc<Db>) -> DbResult<()> {
        // Re-check after async work; a concurrent registration may have won.
        let rejected = {
            let mut databases = self.databases.write().await;
            if databases.contains_key(db.name()) {
                Some(db)
            } else {
                databases.insert(db.name().to_string(), db);
                None
            }
        }; // Lock released here

        if let Some(db) = rejected {
            warn!(name = %db.name(), "Concurrent registration detected, closing connection");
            db.close().await;
            return Err(DbError::database_conflict(db.name()));
        }
        Ok(())
    }

    /// Remove a database and close its connections.
    ///
    /// Fails with [`DbError::DbNotFound`] if nothing is registered under `name`.
    pub async fn unregister_db(&self, name: &str) -> DbResult<()> {
        let db = self
            .databases
            .write()
            .await
            .remove(name)
            .ok_or_else(|| DbError::db_not_found(name))?;

        db.close().await;
        info!(name = %name, "Database unregistered");
        Ok(())
    }

    /// Unregister every database.
    pub async fn unregister_all(&self) {
        let drained: Vec<(String, Arc<Db>)> = self.databases.write().await.drain().collect();
        for (name, db) in drained {
            info!(name = %name, "Closing database");
            db.close().await;
        }
    }

    /// Resolve the live handle registered under `name`.
    pub async fn get(&self, name: &str) -> DbResult<Arc<Db>> {
        self.databases
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| DbError::db_not_found(name))
    }

    /// Create a provider for `name`.
    pub async fn provider(&self, name: &str) -> DbResult<DbProvider> {
        DbProvider::new(self, name).await
    }

    /// Check if a database is registered under `name`.
    pub async fn contains(&self, name: &str) -> bool {
        self.databases.read().await.contains_key(name)
    }

    /// Registered names, sorted.
    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.databases.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Get the number of registered databases.
    pub async fn len(&self) -> usize {
        self.databases.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Accessor for one registered database.
///
/// Holds only the name; every call to [`DbProvider::db`] looks the name up
/// again, so an unregistration is observed as [`DbError::DbNotFound`].
#[derive(Debug, Clone)]
pub struct DbProvider {
    registry: Registry,
    name: String,
}

impl DbProvider {
    /// Create a provider, failing with [`DbError::DbNotFound`] if `name` is not registered.
    pub async fn new(registry: &Registry, name: impl Into<String>) -> DbResult<Self> {
        let name = name.into();
        if !registry.contains(&name).await {
            return Err(DbError::db_not_found(name));
        }
        Ok(Self {
            registry: registry.clone(),
            name,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolve the live handle.
    pub async fn db(&self) -> DbResult<Arc<Db>> {
        self.registry.get(&self.name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolOptions;
    use crate::db::{ColumnDef, ColumnType, TableDef};
    use crate::error::DbErrorKind;

    fn memory_config(name: &str) -> DatabaseConfiguration {
        DatabaseConfiguration::new(name, ":memory:", Dms::Sqlite3)
    }

    #[tokio::test]
    async fn test_registry_creation() {
        let registry = Registry::new();
        assert_eq!(registry.len().await, 0);
        assert!(registry.is_empty().await);
        assert!(registry.models().is_empty());
    }

    #[tokio::test]
    async fn test_get_not_found() {
        let registry = Registry::new();
        let result = registry.get("nonexistent").await;
        assert!(matches!(result, Err(DbError::DbNotFound { .. })));
    }

    #[tokio::test]
    async fn test_register_and_names() {
        let registry = Registry::new();
        registry.register_db(memory_config("b")).await.unwrap();
        registry.register_db(memory_config("a")).await.unwrap();
        assert_eq!(registry.names().await, vec!["a", "b"]);
        assert!(registry.contains("a").await);
    }

    #[tokio::test]
    async fn test_invalid_configuration_rejected_before_connecting() {
        let registry = Registry::new();
        let err = registry.register_db(memory_config("")).await.unwrap_err();
        assert!(matches!(err, DbError::InvalidInput { .. }));
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let registry = Registry::new();
        let clone = registry.clone();
        clone.register_db(memory_config("shared")).await.unwrap();
        assert!(registry.contains("shared").await);
    }

    #[tokio::test]
    async fn test_unregister_all() {
        let registry = Registry::new();
        registry.register_db(memory_config("one")).await.unwrap();
        registry.register_db(memory_config("two")).await.unwrap();
        let one = registry.get("one").await.unwrap();

        registry.unregister_all().await;
        assert!(registry.is_empty().await);
        assert!(one.pool().is_closed());
    }

    fn broken_table() -> TableDef {
        // SQLite rejects the unbalanced default expression.
        TableDef::new("broken")
            .column(ColumnDef::new("id", ColumnType::Integer).default_value("("))
    }

    #[tokio::test]
    async fn test_rejected_ddl_closes_pool() {
        let registry = Registry::new();
        registry.models().register_table(broken_table());
        let pool = DbPool::open(":memory:", Dms::Sqlite3, &PoolOptions::default())
            .await
            .unwrap();

        let err = registry
            .initialise("broken", &pool, Dms::Sqlite3, true)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), DbErrorKind::Schema);
        assert!(pool.is_closed());
    }

    #[tokio::test]
    async fn test_initialise_skipped_without_auto_create() {
        let registry = Registry::new();
        registry.models().register_table(broken_table());
        let pool = DbPool::open(":memory:", Dms::Sqlite3, &PoolOptions::default())
            .await
            .unwrap();

        registry
            .initialise("broken", &pool, Dms::Sqlite3, false)
            .await
            .unwrap();
        assert!(!pool.is_closed());
        pool.close().await;
    }

    #[tokio::test]
    async fn test_register_with_rejected_ddl_leaves_registry_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.sqlite");
        let registry = Registry::new();
        registry.models().register_table(broken_table());

        let err = registry
            .register_db(
                DatabaseConfiguration::new("broken", path.to_str().unwrap(), Dms::Sqlite3)
                    .with_auto_create_tables(true),
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), DbErrorKind::Schema);
        assert!(err.to_string().contains("broken"));
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_publish_conflict_closes_losing_pool() {
        let registry = Registry::new();
        registry.register_db(memory_config("main")).await.unwrap();
        let winner = registry.get("main").await.unwrap();

        let pool = DbPool::open(":memory:", Dms::Sqlite3, &PoolOptions::default())
            .await
            .unwrap();
        let loser = Arc::new(Db::new(
            "main".to_string(),
            Dms::Sqlite3,
            pool.clone(),
            Arc::new(DefaultExecutorHook),
        ));

        let err = registry.publish(loser).await.unwrap_err();
        assert!(err.is_conflict());
        assert!(pool.is_closed());
        assert!(!winner.pool().is_closed());
        assert!(Arc::ptr_eq(&winner, &registry.get("main").await.unwrap()));

        registry.unregister_all().await;
    }
}
