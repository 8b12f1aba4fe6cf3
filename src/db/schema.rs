//! Table models and automatic table creation.
//!
//! Models are registered once in a [`ModelRegistry`]. When a database is
//! registered with `auto_create_tables`, every registered model is rendered as
//! a `CREATE TABLE IF NOT EXISTS` statement for that database's dialect and
//! executed in registration order.

use crate::db::pool::DbPool;
use crate::error::{DbError, DbResult};
use crate::models::Dms;
use sqlx::Executor;
use std::borrow::Cow;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

/// Logical column type, rendered per dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    BigInt,
    Real,
    Text,
    Varchar(u16),
    Boolean,
    Blob,
    Timestamp,
}

impl ColumnType {
    /// SQL type name for `dms`.
    pub fn sql_name(self, dms: Dms) -> Cow<'static, str> {
        let name = match (self, dms) {
            (Self::Integer, Dms::MySql) => "INT",
            (Self::Integer, _) => "INTEGER",
            (Self::BigInt, Dms::Sqlite3) => "INTEGER",
            (Self::BigInt, _) => "BIGINT",
            (Self::Real, Dms::Sqlite3) => "REAL",
            (Self::Real, Dms::MySql) => "DOUBLE",
            (Self::Real, Dms::PostgreSql) => "DOUBLE PRECISION",
            (Self::Text, _) => "TEXT",
            (Self::Varchar(len), _) => return Cow::Owned(format!("VARCHAR({})", len)),
            (Self::Boolean, Dms::Sqlite3) => "INTEGER",
            (Self::Boolean, _) => "BOOLEAN",
            (Self::Blob, Dms::PostgreSql) => "BYTEA",
            (Self::Blob, Dms::MySql) => "LONGBLOB",
            (Self::Blob, Dms::Sqlite3) => "BLOB",
            (Self::Timestamp, Dms::PostgreSql) => "TIMESTAMPTZ",
            (Self::Timestamp, Dms::MySql) => "DATETIME",
            (Self::Timestamp, Dms::Sqlite3) => "TIMESTAMP",
        };
        Cow::Borrowed(name)
    }
}

/// Column of a table model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
    pub primary_key: bool,
    pub auto_increment: bool,
    pub nullable: bool,
    pub unique: bool,
    /// Raw SQL default expression
    pub default: Option<String>,
}

impl ColumnDef {
    /// Create a NOT NULL column.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            primary_key: false,
            auto_increment: false,
            nullable: false,
            unique: false,
            default: None,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Implies primary key.
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self.primary_key = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn default_value(mut self, expr: impl Into<String>) -> Self {
        self.default = Some(expr.into());
        self
    }

    fn definition(&self, dms: Dms, inline_primary_key: bool) -> String {
        let quoted = dms.quote_identifier(&self.name);

        if self.auto_increment {
            return match dms {
                Dms::Sqlite3 => format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", quoted),
                Dms::PostgreSql => {
                    let serial = match self.column_type {
                        ColumnType::BigInt => "BIGSERIAL",
                        _ => "SERIAL",
                    };
                    format!("{} {} PRIMARY KEY", quoted, serial)
                }
                Dms::MySql => format!(
                    "{} {} NOT NULL AUTO_INCREMENT PRIMARY KEY",
                    quoted,
                    self.column_type.sql_name(dms)
                ),
            };
        }

        let mut def = format!("{} {}", quoted, self.column_type.sql_name(dms));
        if inline_primary_key && self.primary_key {
            def.push_str(" PRIMARY KEY");
        } else if !self.nullable {
            def.push_str(" NOT NULL");
        }
        if self.unique && !self.primary_key {
            def.push_str(" UNIQUE");
        }
        if let Some(default) = &self.default {
            def.push_str(" DEFAULT ");
            def.push_str(default);
        }
        def
    }
}

/// Table created by the schema manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDef {
    pub name: String,
    pub columns: Vec<ColumnDef>,
}

impl TableDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    /// Render `CREATE TABLE IF NOT EXISTS` for `dms`.
    ///
    /// A single primary key column is declared inline; composite keys become a
    /// table constraint.
    pub fn create_table_sql(&self, dms: Dms) -> String {
        let pk_columns: Vec<&ColumnDef> = self.columns.iter().filter(|c| c.primary_key).collect();
        let inline_pk = pk_columns.len() == 1;

        let mut parts: Vec<String> = self
            .columns
            .iter()
            .map(|c| c.definition(dms, inline_pk))
            .collect();

        if pk_columns.len() > 1 {
            let cols: Vec<String> = pk_columns
                .iter()
                .map(|c| dms.quote_identifier(&c.name))
                .collect();
            parts.push(format!("PRIMARY KEY ({})", cols.join(", ")));
        }

        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n  {}\n)",
            dms.quote_identifier(&self.name),
            parts.join(",\n  ")
        )
    }

    fn validate(&self) -> DbResult<()> {
        if self.name.trim().is_empty() {
            return Err(DbError::schema("Table name cannot be empty", ""));
        }
        if self.columns.is_empty() {
            return Err(DbError::schema("Table has no columns", &self.name));
        }
        let auto_increment = self.columns.iter().filter(|c| c.auto_increment).count();
        let primary_keys = self.columns.iter().filter(|c| c.primary_key).count();
        if auto_increment > 0 && primary_keys > 1 {
            return Err(DbError::schema(
                "Auto-increment columns cannot be part of a composite primary key",
                &self.name,
            ));
        }
        Ok(())
    }
}

/// A type with a table definition.
pub trait TableModel {
    fn table() -> TableDef;
}

/// Ordered, thread-safe set of models to create on registration.
///
/// Cloning shares the same underlying set.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    tables: Arc<RwLock<Vec<TableDef>>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the table of model `M`.
    pub fn register<M: TableModel>(&self) {
        self.register_table(M::table());
    }

    /// Register a table definition. A table with the same name is replaced in place.
    pub fn register_table(&self, table: TableDef) {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        match tables.iter_mut().find(|t| t.name == table.name) {
            Some(existing) => *existing = table,
            None => tables.push(table),
        }
    }

    /// Snapshot of the registered tables in registration order.
    pub fn tables(&self) -> Vec<TableDef> {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.tables.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Create every table in `tables` on `pool`, stopping at the first failure.
pub async fn create_tables(pool: &DbPool, dms: Dms, tables: &[TableDef]) -> DbResult<()> {
    for table in tables {
        table.validate()?;
        let sql = table.create_table_sql(dms);
        debug!(table = %table.name, system = %dms, sql = %sql, "Creating table");

        let result = match pool {
            DbPool::MySql(p) => p.execute(sql.as_str()).await.map(|_| ()),
            DbPool::Postgres(p) => p.execute(sql.as_str()).await.map(|_| ()),
            DbPool::Sqlite(p) => p.execute(sql.as_str()).await.map(|_| ()),
        };
        result.map_err(|e| {
            DbError::schema(format!("Failed to create table: {}", e), &table.name)
        })?;
    }

    info!(count = tables.len(), system = %dms, "Tables created");
    Ok(())
}

/// List base table names in the connected database, sorted.
pub async fn table_names(pool: &DbPool) -> DbResult<Vec<String>> {
    let names = match pool {
        DbPool::MySql(p) => {
            sqlx::query_scalar::<_, String>(queries::mysql::LIST_TABLES)
                .fetch_all(p)
                .await
        }
        DbPool::Postgres(p) => {
            sqlx::query_scalar::<_, String>(queries::postgres::LIST_TABLES)
                .fetch_all(p)
                .await
        }
        DbPool::Sqlite(p) => {
            sqlx::query_scalar::<_, String>(queries::sqlite::LIST_TABLES)
                .fetch_all(p)
                .await
        }
    };
    names.map_err(|e| pool.error(e))
}

mod queries {
    pub mod mysql {
        pub const LIST_TABLES: &str = r#"
            SELECT CAST(table_name AS CHAR) FROM information_schema.tables
            WHERE table_schema = DATABASE()
            AND table_type = 'BASE TABLE'
            ORDER BY table_name
            "#;
    }

    pub mod postgres {
        pub const LIST_TABLES: &str = r#"
            SELECT table_name::text FROM information_schema.tables
            WHERE table_schema = current_schema()
            AND table_type = 'BASE TABLE'
            ORDER BY table_name
            "#;
    }

    pub mod sqlite {
        pub const LIST_TABLES: &str = r#"
            SELECT name FROM sqlite_master
            WHERE type = 'table'
            AND name NOT LIKE 'sqlite_%'
            ORDER BY name
            "#;
    }
}
