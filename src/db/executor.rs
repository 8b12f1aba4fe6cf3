//! Query execution with executor hooks.
//!
//! [`QueryExecutor`] issues statements through a [`DbPool`] and brackets every
//! SELECT with the database's [`ExecutorHook`]:
//!
//! - `before_*` runs immediately before the driver call
//! - `after_*` runs once the driver call returns, on success and on failure
//! - requests rejected before reaching the driver (empty SQL) run no hook
//!
//! Rows are returned in the driver's own row type; mapping them is up to the
//! caller.

use crate::db::params::{bind_mysql_param, bind_postgres_param, bind_sqlite_param};
use crate::db::Backend;
use crate::db::pool::DbPool;
use crate::error::{DbError, DbResult};
use crate::hook::ExecutorHook;
use crate::impl_db_dispatch;
use crate::models::QueryArg;
use sqlx::mysql::MySqlRow;
use sqlx::postgres::PgRow;
use sqlx::sqlite::SqliteRow;
use std::time::Instant;
use tracing::debug;

/// A single row in the driver's row type.
pub enum QueryRow {
    MySql(MySqlRow),
    Postgres(PgRow),
    Sqlite(SqliteRow),
}

impl QueryRow {
    pub fn as_sqlite(&self) -> Option<&SqliteRow> {
        match self {
            Self::Sqlite(row) => Some(row),
            _ => None,
        }
    }

    pub fn as_mysql(&self) -> Option<&MySqlRow> {
        match self {
            Self::MySql(row) => Some(row),
            _ => None,
        }
    }

    pub fn as_postgres(&self) -> Option<&PgRow> {
        match self {
            Self::Postgres(row) => Some(row),
            _ => None,
        }
    }

    /// Column names in result order.
    pub fn column_names(&self) -> Vec<String> {
        use sqlx::Row;
        match self {
            Self::MySql(row) => column_names(row.columns()),
            Self::Postgres(row) => column_names(row.columns()),
            Self::Sqlite(row) => column_names(row.columns()),
        }
    }
}

/// All rows of a result set in the driver's row type.
pub enum QueryRows {
    MySql(Vec<MySqlRow>),
    Postgres(Vec<PgRow>),
    Sqlite(Vec<SqliteRow>),
}

impl QueryRows {
    pub fn len(&self) -> usize {
        match self {
            Self::MySql(rows) => rows.len(),
            Self::Postgres(rows) => rows.len(),
            Self::Sqlite(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_sqlite(&self) -> Option<&[SqliteRow]> {
        match self {
            Self::Sqlite(rows) => Some(rows),
            _ => None,
        }
    }

    pub fn as_mysql(&self) -> Option<&[MySqlRow]> {
        match self {
            Self::MySql(rows) => Some(rows),
            _ => None,
        }
    }

    pub fn as_postgres(&self) -> Option<&[PgRow]> {
        match self {
            Self::Postgres(rows) => Some(rows),
            _ => None,
        }
    }

    /// Column names of the result set; empty when there are no rows.
    pub fn column_names(&self) -> Vec<String> {
        use sqlx::Row;
        match self {
            Self::MySql(rows) => rows.first().map(|r| column_names(r.columns())),
            Self::Postgres(rows) => rows.first().map(|r| column_names(r.columns())),
            Self::Sqlite(rows) => rows.first().map(|r| column_names(r.columns())),
        }
        .unwrap_or_default()
    }

    /// Split into individual rows.
    pub fn into_rows(self) -> Vec<QueryRow> {
        match self {
            Self::MySql(rows) => rows.into_iter().map(QueryRow::MySql).collect(),
            Self::Postgres(rows) => rows.into_iter().map(QueryRow::Postgres).collect(),
            Self::Sqlite(rows) => rows.into_iter().map(QueryRow::Sqlite).collect(),
        }
    }
}

impl QueryRow {
    fn backend(&self) -> Backend {
        match self {
            Self::MySql(_) => Backend::MySql,
            Self::Postgres(_) => Backend::Postgres,
            Self::Sqlite(_) => Backend::Sqlite,
        }
    }
}

impl QueryRows {
    fn backend(&self) -> Backend {
        match self {
            Self::MySql(_) => Backend::MySql,
            Self::Postgres(_) => Backend::Postgres,
            Self::Sqlite(_) => Backend::Sqlite,
        }
    }
}

// Driver rows do not all implement Debug.
impl std::fmt::Debug for QueryRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryRow")
            .field("backend", &self.backend())
            .field("columns", &self.column_names())
            .finish()
    }
}

impl std::fmt::Debug for QueryRows {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryRows")
            .field("backend", &self.backend())
            .field("columns", &self.column_names())
            .field("rows", &self.len())
            .finish()
    }
}

/// Executes statements against one pool on behalf of one hook.
pub struct QueryExecutor<'a> {
    pool: &'a DbPool,
    hook: &'a dyn ExecutorHook,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(pool: &'a DbPool, hook: &'a dyn ExecutorHook) -> Self {
        Self { pool, hook }
    }

    /// Fetch at most one row.
    pub async fn select_one(&self, sql: &str, args: &[QueryArg]) -> DbResult<Option<QueryRow>> {
        ensure_statement(sql)?;
        let start = Instant::now();

        self.hook.before_select_one(sql, args);
        let result = impl_db_dispatch!(self.pool, {
            MySql(p) => mysql::fetch_optional(p, sql, args).await.map(|r| r.map(QueryRow::MySql)),
            Postgres(p) => postgres::fetch_optional(p, sql, args).await.map(|r| r.map(QueryRow::Postgres)),
            Sqlite(p) => sqlite::fetch_optional(p, sql, args).await.map(|r| r.map(QueryRow::Sqlite)),
        });
        self.hook.after_select_one(sql, args);

        debug!(
            sql = %sql,
            params = args.len(),
            found = ?result.as_ref().ok().map(Option::is_some),
            execution_time_ms = start.elapsed().as_millis() as u64,
            "select_one executed"
        );
        result.map_err(|e| self.pool.error(e))
    }

    /// Fetch every row.
    pub async fn select(&self, sql: &str, args: &[QueryArg]) -> DbResult<QueryRows> {
        ensure_statement(sql)?;
        let start = Instant::now();

        self.hook.before_select(sql, args);
        let result = impl_db_dispatch!(self.pool, {
            MySql(p) => mysql::fetch_all(p, sql, args).await.map(QueryRows::MySql),
            Postgres(p) => postgres::fetch_all(p, sql, args).await.map(QueryRows::Postgres),
            Sqlite(p) => sqlite::fetch_all(p, sql, args).await.map(QueryRows::Sqlite),
        });
        self.hook.after_select(sql, args);

        debug!(
            sql = %sql,
            params = args.len(),
            rows = ?result.as_ref().ok().map(QueryRows::len),
            execution_time_ms = start.elapsed().as_millis() as u64,
            "select executed"
        );
        result.map_err(|e| self.pool.error(e))
    }

    /// Execute a statement that returns no rows. Not hooked.
    pub async fn execute(&self, sql: &str, args: &[QueryArg]) -> DbResult<u64> {
        ensure_statement(sql)?;
        let start = Instant::now();

        let rows_affected = impl_db_dispatch!(self.pool, {
            MySql(p) => mysql::execute(p, sql, args).await,
            Postgres(p) => postgres::execute(p, sql, args).await,
            Sqlite(p) => sqlite::execute(p, sql, args).await,
        })
        .map_err(|e| self.pool.error(e))?;

        debug!(
            sql = %sql,
            params = args.len(),
            rows_affected,
            execution_time_ms = start.elapsed().as_millis() as u64,
            "Statement executed"
        );
        Ok(rows_affected)
    }
}

fn column_names<C: sqlx::Column>(columns: &[C]) -> Vec<String> {
    columns.iter().map(|c| c.name().to_string()).collect()
}

fn ensure_statement(sql: &str) -> DbResult<()> {
    if sql.trim().is_empty() {
        return Err(DbError::invalid_input("SQL statement cannot be empty"));
    }
    Ok(())
}

// =============================================================================
// Database-Specific Implementations
// =============================================================================
//
// Each module below provides the same interface adapted to its database type.
// Without arguments the raw SQL is sent unprepared, which some statements
// (e.g. DDL on MySQL) require.

mod mysql {
    use super::*;
    use sqlx::{Executor, MySqlPool};

    pub async fn fetch_optional(
        pool: &MySqlPool,
        sql: &str,
        args: &[QueryArg],
    ) -> Result<Option<MySqlRow>, sqlx::Error> {
        if args.is_empty() {
            return pool.fetch_optional(sql).await;
        }
        let mut query = sqlx::query(sql);
        for arg in args {
            query = bind_mysql_param(query, arg);
        }
        query.fetch_optional(pool).await
    }

    pub async fn fetch_all(
        pool: &MySqlPool,
        sql: &str,
        args: &[QueryArg],
    ) -> Result<Vec<MySqlRow>, sqlx::Error> {
        if args.is_empty() {
            return pool.fetch_all(sql).await;
        }
        let mut query = sqlx::query(sql);
        for arg in args {
            query = bind_mysql_param(query, arg);
        }
        query.fetch_all(pool).await
    }

    pub async fn execute(
        pool: &MySqlPool,
        sql: &str,
        args: &[QueryArg],
    ) -> Result<u64, sqlx::Error> {
        if args.is_empty() {
            return pool.execute(sql).await.map(|r| r.rows_affected());
        }
        let mut query = sqlx::query(sql);
        for arg in args {
            query = bind_mysql_param(query, arg);
        }
        query.execute(pool).await.map(|r| r.rows_affected())
    }
}

mod postgres {
    use super::*;
    use sqlx::{Executor, PgPool};

    pub async fn fetch_optional(
        pool: &PgPool,
        sql: &str,
        args: &[QueryArg],
    ) -> Result<Option<PgRow>, sqlx::Error> {
        if args.is_empty() {
            return pool.fetch_optional(sql).await;
        }
        let mut query = sqlx::query(sql);
        for arg in args {
            query = bind_postgres_param(query, arg);
        }
        query.fetch_optional(pool).await
    }

    pub async fn fetch_all(
        pool: &PgPool,
        sql: &str,
        args: &[QueryArg],
    ) -> Result<Vec<PgRow>, sqlx::Error> {
        if args.is_empty() {
            return pool.fetch_all(sql).await;
        }
        let mut query = sqlx::query(sql);
        for arg in args {
            query = bind_postgres_param(query, arg);
        }
        query.fetch_all(pool).await
    }

    pub async fn execute(pool: &PgPool, sql: &str, args: &[QueryArg]) -> Result<u64, sqlx::Error> {
        if args.is_empty() {
            return pool.execute(sql).await.map(|r| r.rows_affected());
        }
        let mut query = sqlx::query(sql);
        for arg in args {
            query = bind_postgres_param(query, arg);
        }
        query.execute(pool).await.map(|r| r.rows_affected())
    }
}

mod sqlite {
    use super::*;
    use sqlx::{Executor, SqlitePool};

    pub async fn fetch_optional(
        pool: &SqlitePool,
        sql: &str,
        args: &[QueryArg],
    ) -> Result<Option<SqliteRow>, sqlx::Error> {
        if args.is_empty() {
            return pool.fetch_optional(sql).await;
        }
        let mut query = sqlx::query(sql);
        for arg in args {
            query = bind_sqlite_param(query, arg);
        }
        query.fetch_optional(pool).await
    }

    pub async fn fetch_all(
        pool: &SqlitePool,
        sql: &str,
        args: &[QueryArg],
    ) -> Result<Vec<SqliteRow>, sqlx::Error> {
        if args.is_empty() {
            return pool.fetch_all(sql).await;
        }
        let mut query = sqlx::query(sql);
        for arg in args {
            query = bind_sqlite_param(query, arg);
        }
        query.fetch_all(pool).await
    }

    pub async fn execute(
        pool: &SqlitePool,
        sql: &str,
        args: &[QueryArg],
    ) -> Result<u64, sqlx::Error> {
        if args.is_empty() {
            return pool.execute(sql).await.map(|r| r.rows_affected());
        }
        let mut query = sqlx::query(sql);
        for arg in args {
            query = bind_sqlite_param(query, arg);
        }
        query.execute(pool).await.map(|r| r.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolOptions;
    use crate::hook::DefaultExecutorHook;
    use crate::models::Dms;
    use crate::query_args;
    use sqlx::Row;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingHook {
        calls: Mutex<Vec<String>>,
    }

    impl RecordingHook {
        fn record(&self, event: &str, query: &str) {
            self.calls.lock().unwrap().push(format!("{event}:{query}"));
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ExecutorHook for RecordingHook {
        fn before_select_one(&self, query: &str, _args: &[QueryArg]) {
            self.record("before_select_one", query);
        }
        fn after_select_one(&self, query: &str, _args: &[QueryArg]) {
            self.record("after_select_one", query);
        }
        fn before_select(&self, query: &str, _args: &[QueryArg]) {
            self.record("before_select", query);
        }
        fn after_select(&self, query: &str, _args: &[QueryArg]) {
            self.record("after_select", query);
        }
    }

    async fn memory_pool() -> DbPool {
        DbPool::open(":memory:", Dms::Sqlite3, &PoolOptions::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_select_brackets_with_hook() {
        let pool = memory_pool().await;
        let hook = RecordingHook::default();
        let executor = QueryExecutor::new(&pool, &hook);

        let rows = executor.select("SELECT 1 AS n UNION SELECT 2", &[]).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            hook.calls(),
            vec![
                "before_select:SELECT 1 AS n UNION SELECT 2",
                "after_select:SELECT 1 AS n UNION SELECT 2",
            ]
        );
    }

    #[tokio::test]
    async fn test_select_one_with_args() {
        let pool = memory_pool().await;
        let hook = RecordingHook::default();
        let executor = QueryExecutor::new(&pool, &hook);

        let row = executor
            .select_one("SELECT ? + ? AS total", &query_args![40, 2])
            .await
            .unwrap()
            .unwrap();
        let total: i64 = row.as_sqlite().unwrap().get("total");
        assert_eq!(total, 42);
        assert_eq!(row.column_names(), vec!["total"]);
        assert_eq!(hook.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_after_hook_runs_on_failure() {
        let pool = memory_pool().await;
        let hook = RecordingHook::default();
        let executor = QueryExecutor::new(&pool, &hook);

        let err = executor
            .select("SELECT * FROM missing_table", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Database { .. }));
        assert_eq!(
            hook.calls(),
            vec![
                "before_select:SELECT * FROM missing_table",
                "after_select:SELECT * FROM missing_table",
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_sql_runs_no_hook() {
        let pool = memory_pool().await;
        let hook = RecordingHook::default();
        let executor = QueryExecutor::new(&pool, &hook);

        let err = executor.select_one("   ", &[]).await.unwrap_err();
        assert!(matches!(err, DbError::InvalidInput { .. }));
        assert!(hook.calls().is_empty());
    }

    #[tokio::test]
    async fn test_execute_is_not_hooked() {
        let pool = memory_pool().await;
        let hook = RecordingHook::default();
        let executor = QueryExecutor::new(&pool, &hook);

        executor
            .execute("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)", &[])
            .await
            .unwrap();
        let affected = executor
            .execute(
                "INSERT INTO t (name) VALUES (?), (?)",
                &query_args!["a", None::<String>],
            )
            .await
            .unwrap();
        assert_eq!(affected, 2);
        assert!(hook.calls().is_empty());
    }

    #[tokio::test]
    async fn test_select_one_no_rows() {
        let pool = memory_pool().await;
        let executor = QueryExecutor::new(&pool, &DefaultExecutorHook);
        let row = executor
            .select_one("SELECT 1 WHERE 1 = 0", &[])
            .await
            .unwrap();
        assert!(row.is_none());
    }

    #[tokio::test]
    async fn test_rows_debug_shows_shape() {
        let pool = memory_pool().await;
        let executor = QueryExecutor::new(&pool, &DefaultExecutorHook);

        let rows = executor
            .select("SELECT 1 AS a, 2 AS b", &[])
            .await
            .unwrap();
        let debug = format!("{:?}", rows);
        assert!(debug.contains("Sqlite"));
        assert!(debug.contains("\"a\""));
        assert!(debug.contains("rows: 1"));

        let row = rows.into_rows().pop().unwrap();
        assert!(format!("{:?}", row).starts_with("QueryRow"));
    }
}
