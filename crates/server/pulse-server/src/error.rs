//! HTTP error mapping
//!
//! Every failure a handler can produce ends up here and leaves as a JSON
//! object with an `error` field. Storage diagnostics are logged, never sent.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pulse_core::PulseError;
use pulse_store::StorageError;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error};

/// Errors returned by request handlers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Missing, blank or mistyped field, or a body that is not JSON
    #[error("{0}")]
    Validation(String),

    /// The auth gate rejected the request
    #[error("Unauthorized")]
    Unauthorized,

    /// No route matched
    #[error("Not found")]
    NotFound,

    /// The event store failed; the detail is for logs only
    #[error("Database error: {0}")]
    Storage(String),
}

impl ApiError {
    /// Log a failed store operation, count it, and wrap it
    pub fn storage(operation: &'static str, err: StorageError) -> Self {
        error!(
            operation,
            error = %err,
            retryable = err.is_retryable(),
            corrupt = err.is_corrupt(),
            "Storage operation failed"
        );
        metrics::counter!("pulse_storage_failures_total", "operation" => operation).increment(1);
        Self::Storage(err.to_string())
    }

    /// HTTP status for this error
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PulseError> for ApiError {
    fn from(err: PulseError) -> Self {
        match err {
            PulseError::Validation(msg) => Self::Validation(msg),
            PulseError::Unauthorized => Self::Unauthorized,
            PulseError::NotFound(_) => Self::NotFound,
            PulseError::Storage(msg)
            | PulseError::Configuration(msg)
            | PulseError::Internal(msg) => Self::Storage(msg),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            Self::Validation(msg) => {
                debug!(reason = %msg, "Rejected invalid payload");
                msg.clone()
            }
            Self::Unauthorized => "Unauthorized".to_string(),
            Self::NotFound => "Not found".to_string(),
            Self::Storage(_) => "Database error".to_string(),
        };

        (self.status(), Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_of(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_storage_detail_is_not_leaked() {
        let err = ApiError::storage(
            "append_error",
            StorageError::Query("no such table: errors".to_string()),
        );
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Database error"}));
    }

    #[tokio::test]
    async fn test_validation_message_is_returned() {
        let (status, body) = body_of(PulseError::validation("missing field `userId`").into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "missing field `userId`"}));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from(PulseError::storage("down")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
