//! dbreg
//!
//! A registry of named SQL databases (SQLite, MySQL, PostgreSQL). Each
//! registered database carries its dialect and an executor hook that is called
//! around every SELECT issued through it.
//!
//! Most applications build a [`Registry`] at startup and pass it to whatever
//! needs to resolve databases. The free functions in this module operate on a
//! process-wide default registry instead.
//!
//! ```no_run
//! use dbreg::{DatabaseConfiguration, Dms};
//!
//! # async fn run() -> dbreg::DbResult<()> {
//! dbreg::register_db(
//!     DatabaseConfiguration::new("main", "/tmp/main.sqlite", Dms::Sqlite3)
//!         .with_auto_create_tables(true),
//! )
//! .await?;
//!
//! let db = dbreg::new_db_provider("main").await?.db().await?;
//! assert_eq!(db.system(), Dms::Sqlite3);
//!
//! dbreg::unregister_db("main").await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod hook;
pub mod models;
pub mod registry;

use std::sync::LazyLock;

pub use config::{Config, PoolOptions};
pub use db::{
    Backend, ColumnDef, ColumnType, Db, ModelRegistry, QueryRow, QueryRows, TableDef, TableModel,
};
pub use error::{DbError, DbErrorKind, DbResult};
pub use hook::{DefaultExecutorHook, ExecutorHook, TracingExecutorHook};
pub use models::{DatabaseConfiguration, Dms, QueryArg};
pub use registry::{DbProvider, Registry};

static DEFAULT_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

/// The process-wide default registry.
pub fn registry() -> &'static Registry {
    &DEFAULT_REGISTRY
}

/// Register a database in the default registry.
pub async fn register_db(config: DatabaseConfiguration) -> DbResult<()> {
    registry().register_db(config).await
}

/// Unregister a database from the default registry.
pub async fn unregister_db(name: &str) -> DbResult<()> {
    registry().unregister_db(name).await
}

/// Create a provider for a database in the default registry.
pub async fn new_db_provider(name: &str) -> DbResult<DbProvider> {
    registry().provider(name).await
}

/// Register a model whose table the default registry creates on auto-create.
pub fn register_model<M: TableModel>() {
    registry().models().register::<M>();
}
