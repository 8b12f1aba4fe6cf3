//! Backend identifiers and dispatch macros for the query layer.
//!
//! The query layer keeps one pool type per driver. [`Backend`] names those
//! drivers, and [`impl_db_dispatch!`] expands a match over
//! [`DbPool`](crate::db::DbPool) variants so each call site stays linear.

use crate::models::Dms;
use sqlx::Database;

/// Database backend type for dispatch operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    Sqlite,
    MySql,
    Postgres,
}

impl Backend {
    /// Name the sqlx driver reports for this backend.
    pub fn name(self) -> &'static str {
        match self {
            Self::Sqlite => sqlx::Sqlite::NAME,
            Self::MySql => sqlx::MySql::NAME,
            Self::Postgres => sqlx::Postgres::NAME,
        }
    }

    /// System this backend serves.
    pub fn dms(self) -> Dms {
        match self {
            Self::Sqlite => Dms::Sqlite3,
            Self::MySql => Dms::MySql,
            Self::Postgres => Dms::PostgreSql,
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Macro for generating database dispatch match arms.
///
/// This macro generates match arms for `DbPool` variants, reducing the need
/// to manually write repetitive match statements.
///
/// # Example
///
/// ```ignore
/// impl_db_dispatch!(pool, {
///     MySql(p) => do_mysql(p),
///     Postgres(p) => do_postgres(p),
///     Sqlite(p) => do_sqlite(p),
/// });
/// ```
#[macro_export]
macro_rules! impl_db_dispatch {
    ($pool:expr, { $($variant:ident($p:ident) => $body:expr),+ $(,)? }) => {
        match $pool {
            $(
                $crate::db::pool::DbPool::$variant($p) => $body,
            )+
        }
    };
}

pub use impl_db_dispatch;
