//! Error types for the event store

use pulse_core::PulseError;
use std::time::Duration;
use thiserror::Error;

/// Type alias for Results using StorageError
pub type Result<T> = std::result::Result<T, StorageError>;

/// Main error type for store operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// The backing medium could not be opened or reached
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// An operation did not finish within its bound
    #[error("Operation '{operation}' timed out after {elapsed:?}")]
    Timeout {
        /// Store operation that was running
        operation: &'static str,
        /// Bound that was exceeded
        elapsed: Duration,
    },

    /// A statement failed to execute
    #[error("Query failed: {0}")]
    Query(String),

    /// Tables or indexes could not be created
    #[error("Schema error: {0}")]
    Schema(String),

    /// A stored row could not be decoded
    #[error("Corrupt row: {0}")]
    Corrupt(String),

    /// Invalid store configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StorageError {
    /// Check if the error is retryable
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Unavailable(_))
    }

    /// Check if the error came from a row that is already stored
    #[must_use]
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::Corrupt(_))
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, _)
                if matches!(
                    code.code,
                    rusqlite::ErrorCode::DatabaseBusy
                        | rusqlite::ErrorCode::DatabaseLocked
                        | rusqlite::ErrorCode::CannotOpen
                ) =>
            {
                Self::Unavailable(err.to_string())
            }
            rusqlite::Error::FromSqlConversionFailure(..)
            | rusqlite::Error::InvalidColumnType(..)
            | rusqlite::Error::IntegralValueOutOfRange(..) => Self::Corrupt(err.to_string()),
            _ => Self::Query(err.to_string()),
        }
    }
}

impl From<tokio_rusqlite::Error> for StorageError {
    fn from(err: tokio_rusqlite::Error) -> Self {
        match err {
            tokio_rusqlite::Error::Rusqlite(inner) => inner.into(),
            tokio_rusqlite::Error::ConnectionClosed => {
                Self::Unavailable("connection closed".to_string())
            }
            other => Self::Query(other.to_string()),
        }
    }
}

impl From<StorageError> for PulseError {
    fn from(err: StorageError) -> Self {
        PulseError::storage(err)
    }
}
