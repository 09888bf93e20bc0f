//! Emitter error types

use thiserror::Error;

/// Result type for emitter operations
pub type Result<T> = std::result::Result<T, EmitterError>;

/// Ways a send can fail
#[derive(Error, Debug)]
pub enum EmitterError {
    /// Analytics are switched off
    #[error("Analytics disabled")]
    Disabled,

    /// The request never produced a response
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("Server rejected event ({status}): {message}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// `error` field of the response body, if any
        message: String,
    },

    /// The server answered 2xx with a body we could not read
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl EmitterError {
    /// Whether retrying the same request could succeed
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(err) => err.is_timeout() || err.is_connect(),
            Self::Rejected { status, .. } => *status >= 500,
            Self::Disabled | Self::InvalidResponse(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let server_side = EmitterError::Rejected {
            status: 500,
            message: "Database error".to_string(),
        };
        let client_side = EmitterError::Rejected {
            status: 401,
            message: "Unauthorized".to_string(),
        };
        assert!(server_side.is_transient());
        assert!(!client_side.is_transient());
        assert!(!EmitterError::Disabled.is_transient());
    }
}
