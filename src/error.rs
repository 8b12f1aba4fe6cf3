//! Error types for the database registry.
//!
//! All errors are variants of [`DbError`]. Callers that need to branch on a
//! specific failure compare [`DbError::kind`] against a [`DbErrorKind`] instead
//! of inspecting messages.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database '{name}' is already registered")]
    DatabaseConflict { name: String },

    #[error("Database '{name}' is not registered")]
    DbNotFound { name: String },

    #[error("Connection failed: {message}")]
    Connection { message: String, suggestion: String },

    #[error("Schema error: {message} (object: {object})")]
    Schema { message: String, object: String },

    #[error("Database error: {message}")]
    Database {
        message: String,
        /// e.g., "42P01" for undefined table
        sql_state: Option<String>,
        suggestion: String,
    },

    #[error("Timeout: {operation} exceeded {elapsed_secs}s")]
    Timeout {
        operation: String,
        elapsed_secs: u32,
    },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Field-less discriminant of [`DbError`], used for identity comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DbErrorKind {
    DatabaseConflict,
    DbNotFound,
    Connection,
    Schema,
    Database,
    Timeout,
    InvalidInput,
    Internal,
}

impl DbError {
    /// Create a conflict error for an already registered name.
    pub fn database_conflict(name: impl Into<String>) -> Self {
        Self::DatabaseConflict { name: name.into() }
    }

    /// Create a not-found error for an unregistered name.
    pub fn db_not_found(name: impl Into<String>) -> Self {
        Self::DbNotFound { name: name.into() }
    }

    /// Create a connection error with a helpful suggestion.
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create a schema error.
    pub fn schema(message: impl Into<String>, object: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
            object: object.into(),
        }
    }

    /// Create a database error with optional SQL state.
    pub fn database(
        message: impl Into<String>,
        sql_state: Option<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::Database {
            message: message.into(),
            sql_state,
            suggestion: suggestion.into(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(operation: impl Into<String>, elapsed_secs: u32) -> Self {
        Self::Timeout {
            operation: operation.into(),
            elapsed_secs,
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> DbErrorKind {
        match self {
            Self::DatabaseConflict { .. } => DbErrorKind::DatabaseConflict,
            Self::DbNotFound { .. } => DbErrorKind::DbNotFound,
            Self::Connection { .. } => DbErrorKind::Connection,
            Self::Schema { .. } => DbErrorKind::Schema,
            Self::Database { .. } => DbErrorKind::Database,
            Self::Timeout { .. } => DbErrorKind::Timeout,
            Self::InvalidInput { .. } => DbErrorKind::InvalidInput,
            Self::Internal { .. } => DbErrorKind::Internal,
        }
    }

    /// True if a database with this name was already registered.
    pub fn is_conflict(&self) -> bool {
        self.kind() == DbErrorKind::DatabaseConflict
    }

    /// True if no database with this name is registered.
    pub fn is_not_found(&self) -> bool {
        self.kind() == DbErrorKind::DbNotFound
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Connection { suggestion, .. } => Some(suggestion),
            Self::Database { suggestion, .. } => Some(suggestion),
            _ => None,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Timeout { .. })
    }
}

/// Convert sqlx errors to DbError.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(msg) => DbError::connection(
                msg.to_string(),
                "Check the connection string format and credentials",
            ),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                DbError::database(
                    db_err.message(),
                    code,
                    "Check the SQL syntax and referenced objects",
                )
            }
            sqlx::Error::RowNotFound => DbError::database(
                "No rows returned",
                None,
                "Verify the query conditions match existing data",
            ),
            // The limit lives on the pool; DbPool::error reports it as a timeout.
            sqlx::Error::PoolTimedOut => DbError::connection(
                "Timed out acquiring a connection from the pool",
                "Raise acquire_timeout or max_connections, or check database load",
            ),
            sqlx::Error::PoolClosed => DbError::connection(
                "Connection pool is closed",
                "The database was unregistered; resolve it again through its provider",
            ),
            sqlx::Error::Io(io_err) => DbError::connection(
                format!("I/O error: {}", io_err),
                "Check network connectivity and database server status",
            ),
            sqlx::Error::Tls(tls_err) => DbError::connection(
                format!("TLS error: {}", tls_err),
                "Verify TLS configuration and certificates",
            ),
            sqlx::Error::Protocol(msg) => DbError::connection(
                format!("Protocol error: {}", msg),
                "Check database server compatibility",
            ),
            sqlx::Error::ColumnNotFound(col) => {
                DbError::schema(format!("Column not found: {}", col), col)
            }
            sqlx::Error::ColumnDecode { index, source } => {
                DbError::internal(format!("Failed to decode column {}: {}", index, source))
            }
            sqlx::Error::Decode(source) => DbError::internal(format!("Decode error: {}", source)),
            sqlx::Error::WorkerCrashed => DbError::internal("Database worker crashed"),
            _ => DbError::internal(format!("Unknown database error: {}", err)),
        }
    }
}

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;
