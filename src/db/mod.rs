//! Database access layer.
//!
//! This module provides:
//! - Backend identifiers and dispatch macros
//! - Connection pools per driver
//! - Query execution wrapped by executor hooks
//! - Table models and automatic table creation
//! - The registered database handle

pub mod executor;
pub mod handle;
#[macro_use]
pub mod macros;
pub mod params;
pub mod pool;
pub mod schema;

pub use executor::{QueryExecutor, QueryRow, QueryRows};
pub use handle::Db;
pub use macros::Backend;
pub use pool::DbPool;
pub use schema::{ColumnDef, ColumnType, ModelRegistry, TableDef, TableModel};
