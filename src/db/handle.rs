//! Handle to a registered database.

use crate::db::executor::{QueryExecutor, QueryRow, QueryRows};
use crate::db::pool::DbPool;
use crate::db::schema;
use crate::error::DbResult;
use crate::hook::ExecutorHook;
use crate::models::{Dms, QueryArg};
use std::sync::Arc;

/// An open database together with its dialect and executor hook.
///
/// Created by [`Registry::register_db`](crate::Registry::register_db) and shared
/// as `Arc<Db>`. Dialect and hook are fixed for the handle's lifetime; changing
/// either requires unregistering and registering again.
pub struct Db {
    name: String,
    system: Dms,
    pool: DbPool,
    hook: Arc<dyn ExecutorHook>,
}

impl Db {
    pub(crate) fn new(
        name: String,
        system: Dms,
        pool: DbPool,
        hook: Arc<dyn ExecutorHook>,
    ) -> Self {
        Self {
            name,
            system,
            pool,
            hook,
        }
    }

    /// Name the database is registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dialect chosen at registration.
    pub fn system(&self) -> Dms {
        self.system
    }

    /// Hook wrapped around every SELECT on this database.
    pub fn executor_hook(&self) -> &Arc<dyn ExecutorHook> {
        &self.hook
    }

    /// Underlying connection pool.
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    fn executor(&self) -> QueryExecutor<'_> {
        QueryExecutor::new(&self.pool, self.hook.as_ref())
    }

    /// Fetch at most one row, bracketed by the `*_select_one` hooks.
    pub async fn select_one(&self, sql: &str, args: &[QueryArg]) -> DbResult<Option<QueryRow>> {
        self.executor().select_one(sql, args).await
    }

    /// Fetch every row, bracketed by the `*_select` hooks.
    pub async fn select(&self, sql: &str, args: &[QueryArg]) -> DbResult<QueryRows> {
        self.executor().select(sql, args).await
    }

    /// Execute a statement that returns no rows and report the affected row count.
    pub async fn execute(&self, sql: &str, args: &[QueryArg]) -> DbResult<u64> {
        self.executor().execute(sql, args).await
    }

    /// Base tables present in the database.
    pub async fn table_names(&self) -> DbResult<Vec<String>> {
        schema::table_names(&self.pool).await
    }

    pub(crate) async fn close(&self) {
        self.pool.close().await;
    }
}

impl std::fmt::Debug for Db {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Db")
            .field("name", &self.name)
            .field("system", &self.system)
            .field("executor_hook", &self.hook.name())
            .field("closed", &self.pool.is_closed())
            .finish()
    }
}
