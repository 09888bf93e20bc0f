//! Error taxonomy shared across Pulse crates.
//!
//! Storage backends have their own richer error type; it is folded into
//! [`PulseError::Storage`] at the service boundary so that the HTTP layer
//! only ever has to map one enum onto status codes.

use std::fmt;
use thiserror::Error;

/// The main error type for the Pulse service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PulseError {
    /// A required field is missing or has the wrong type
    #[error("Validation error: {0}")]
    Validation(String),

    /// The auth gate rejected the request
    #[error("Unauthorized")]
    Unauthorized,

    /// The event store is unreachable or a query failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// No route matched
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Listener or runtime failure outside the request path
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PulseError {
    /// Create a new validation error
    pub fn validation<T: fmt::Display>(msg: T) -> Self {
        Self::Validation(msg.to_string())
    }

    /// Create a new storage error
    pub fn storage<T: fmt::Display>(msg: T) -> Self {
        Self::Storage(msg.to_string())
    }

    /// Create a new not found error
    pub fn not_found<T: fmt::Display>(msg: T) -> Self {
        Self::NotFound(msg.to_string())
    }

    /// Create a new configuration error
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Self::Configuration(msg.to_string())
    }

    /// Create a new internal error
    pub fn internal<T: fmt::Display>(msg: T) -> Self {
        Self::Internal(msg.to_string())
    }

    /// Check if this error is a client error (4xx-style)
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::Unauthorized | Self::NotFound(_)
        )
    }

    /// Check if this error is a server error (5xx-style)
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Storage(_) | Self::Configuration(_) | Self::Internal(_)
        )
    }
}

/// Result type alias for Pulse operations
pub type PulseResult<T> = Result<T, PulseError>;

impl From<serde_json::Error> for PulseError {
    fn from(err: serde_json::Error) -> Self {
        Self::Validation(err.to_string())
    }
}
