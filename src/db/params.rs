//! Parameter binding utilities for database queries.
//!
//! Binds [`QueryArg`] values to driver-specific query objects.

use crate::models::QueryArg;
use sqlx::mysql::MySqlArguments;
use sqlx::postgres::PgArguments;
use sqlx::sqlite::SqliteArguments;
use sqlx::types::Json;
use sqlx::{MySql, Postgres, Sqlite};

/// Bind an argument to a MySQL query.
pub(crate) fn bind_mysql_param<'q>(
    query: sqlx::query::Query<'q, MySql, MySqlArguments>,
    param: &'q QueryArg,
) -> sqlx::query::Query<'q, MySql, MySqlArguments> {
    match param {
        QueryArg::Null => query.bind(None::<String>),
        QueryArg::Bool(v) => query.bind(*v),
        QueryArg::Int(v) => query.bind(*v),
        QueryArg::Float(v) => query.bind(*v),
        QueryArg::Text(v) => query.bind(v.as_str()),
        QueryArg::Bytes(v) => query.bind(v.as_slice()),
        QueryArg::Json(v) => query.bind(Json(v)),
    }
}

/// Bind an argument to a PostgreSQL query.
pub(crate) fn bind_postgres_param<'q>(
    query: sqlx::query::Query<'q, Postgres, PgArguments>,
    param: &'q QueryArg,
) -> sqlx::query::Query<'q, Postgres, PgArguments> {
    match param {
        QueryArg::Null => query.bind(None::<String>),
        QueryArg::Bool(v) => query.bind(*v),
        QueryArg::Int(v) => query.bind(*v),
        QueryArg::Float(v) => query.bind(*v),
        QueryArg::Text(v) => query.bind(v.as_str()),
        QueryArg::Bytes(v) => query.bind(v.as_slice()),
        QueryArg::Json(v) => query.bind(Json(v)),
    }
}

/// Bind an argument to a SQLite query.
pub(crate) fn bind_sqlite_param<'q>(
    query: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
    param: &'q QueryArg,
) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
    match param {
        QueryArg::Null => query.bind(None::<String>),
        QueryArg::Bool(v) => query.bind(*v),
        QueryArg::Int(v) => query.bind(*v),
        QueryArg::Float(v) => query.bind(*v),
        QueryArg::Text(v) => query.bind(v.as_str()),
        QueryArg::Bytes(v) => query.bind(v.as_slice()),
        // SQLite doesn't have native JSON type, store as string
        QueryArg::Json(v) => query.bind(v.to_string()),
    }
}
