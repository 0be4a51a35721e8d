//! Error types for SQLite operations.

use cairn_migrate::DatabaseError;
use thiserror::Error;

/// Result type for SQLite operations.
pub type SqliteResult<T> = Result<T, SqliteError>;

/// Error type for SQLite operations.
#[derive(Debug, Error)]
pub enum SqliteError {
    /// SQLite driver error.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
    /// An update matched no history row.
    #[error("No history row with installed_rank {0}")]
    RowNotFound(i64),
}

impl SqliteError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl From<SqliteError> for DatabaseError {
    fn from(err: SqliteError) -> Self {
        match err {
            SqliteError::Sqlite(e) => DatabaseError::with_source(e.to_string(), e),
            other => DatabaseError::new(other.to_string()),
        }
    }
}
