//! Supported database management systems.
//!
//! [`Dms`] is the dialect chosen for a registered database. It derives the
//! driver name used to open connections and the [`Backend`] the query layer
//! dispatches on. Both mappings are exhaustive matches without a wildcard arm.

use crate::db::Backend;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Database management system of a registered database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dms {
    #[serde(rename = "sqlite3")]
    Sqlite3,
    /// Includes MariaDB
    #[serde(rename = "mysql")]
    MySql,
    #[serde(rename = "postgres")]
    PostgreSql,
}

impl Dms {
    /// Every supported system.
    pub const ALL: [Dms; 3] = [Dms::Sqlite3, Dms::MySql, Dms::PostgreSql];

    /// Lowercase driver identifier.
    pub fn driver_name(self) -> &'static str {
        match self {
            Self::Sqlite3 => "sqlite3",
            Self::MySql => "mysql",
            Self::PostgreSql => "postgres",
        }
    }

    /// Backend of the query layer that executes statements for this system.
    pub fn backend(self) -> Backend {
        match self {
            Self::Sqlite3 => Backend::Sqlite,
            Self::MySql => Backend::MySql,
            Self::PostgreSql => Backend::Postgres,
        }
    }

    /// Get the display name for this system.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Sqlite3 => "SQLite",
            Self::MySql => "MySQL",
            Self::PostgreSql => "PostgreSQL",
        }
    }

    /// Parse the system from a connection URL scheme.
    pub fn from_connection_string(connection_string: &str) -> Option<Self> {
        let lower = connection_string.to_lowercase();
        if lower.starts_with("postgres://") || lower.starts_with("postgresql://") {
            Some(Self::PostgreSql)
        } else if lower.starts_with("mysql://") || lower.starts_with("mariadb://") {
            Some(Self::MySql)
        } else if lower.starts_with("sqlite://") || lower.starts_with("sqlite:") {
            Some(Self::Sqlite3)
        } else {
            None
        }
    }

    /// Quote an identifier for use in generated DDL.
    pub fn quote_identifier(self, name: &str) -> String {
        match self {
            Self::MySql => format!("`{}`", name.replace('`', "``")),
            Self::Sqlite3 | Self::PostgreSql => format!("\"{}\"", name.replace('"', "\"\"")),
        }
    }
}

impl std::fmt::Display for Dms {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Error returned when a string names no supported system.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown database system: {0}")]
pub struct UnknownDms(pub String);

impl FromStr for Dms {
    type Err = UnknownDms;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite3" | "sqlite" => Ok(Self::Sqlite3),
            "mysql" | "mariadb" => Ok(Self::MySql),
            "postgres" | "postgresql" | "pg" => Ok(Self::PostgreSql),
            _ => Err(UnknownDms(s.to_string())),
        }
    }
}
