//! Error types for sqltable

use thiserror::Error;

/// Result type alias for sqltable operations
pub type DbResult<T> = Result<T, DbError>;

/// Error types for table operations
#[derive(Debug, Error)]
pub enum DbError {
    /// A mutation was attempted on a read-only table
    #[error("Table is read only")]
    ReadOnly,

    /// Database connection error
    #[error("{0}")]
    Connection(String),

    /// Query execution error reported by the driver
    #[error("{0}")]
    Query(String),

    /// A validator hook rejected the operation
    #[error("{0}")]
    Validation(String),

    /// The assembled SQL matched an injection pattern
    #[error("Suspicious pattern found in SQL: {pattern}")]
    SuspiciousSql { pattern: &'static str },

    /// Statement assembly failed
    #[error("Build error: {0}")]
    Build(String),

    /// Unknown dialect name
    #[error("Unsupported dialect: {0}")]
    UnsupportedDialect(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl DbError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a build error
    pub fn build(message: impl Into<String>) -> Self {
        Self::Build(message.into())
    }

    /// Create a connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Check if this is a read-only error
    pub fn is_read_only(&self) -> bool {
        matches!(self, Self::ReadOnly)
    }

    /// Check if this error was raised by the injection guard
    pub fn is_suspicious(&self) -> bool {
        matches!(self, Self::SuspiciousSql { .. })
    }

    /// Check if the statement never reached the database because it could not be built
    pub fn is_build_failure(&self) -> bool {
        matches!(self, Self::SuspiciousSql { .. } | Self::Build(_))
    }
}

impl From<tokio_postgres::Error> for DbError {
    fn from(err: tokio_postgres::Error) -> Self {
        match err.as_db_error() {
            Some(db_err) => Self::Query(db_err.message().to_string()),
            None if err.is_closed() => Self::Connection(err.to_string()),
            None => Self::Query(err.to_string()),
        }
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(_, Some(message)) => Self::Query(message),
            other => Self::Query(other.to_string()),
        }
    }
}
