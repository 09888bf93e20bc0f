//! Ingestion payloads and their validation.
//!
//! Payloads are the JSON bodies posted by the desktop client. Deserialising
//! enforces presence and JSON type of every field; [`ReplacementPayload::validate`]
//! and friends then apply the rules serde cannot express and produce a draft
//! event ready for the store.

use crate::error::{PulseError, PulseResult};
use crate::event::{NewError, NewReplacement, NewUserAction};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Request metadata the server can attach to a payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Value of the `User-Agent` header
    pub user_agent: Option<String>,
    /// Client address as seen by the server
    pub ip_address: Option<String>,
}

/// Body of `POST /api/analytics/text-replacement`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplacementPayload {
    /// Anonymous user identifier
    pub user_id: String,
    /// Desktop application version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
    /// Operating system of the client
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    /// Whether the replacement succeeded
    pub success: bool,
    /// Replacement strategy that ran
    pub method: String,
    /// Process name of the target application
    pub target_app: String,
    /// Length of the replaced text, 0 when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_length: Option<u64>,
    /// Time the replacement took, 0 when absent
    #[serde(default, alias = "responseTime", skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
    /// Client user agent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Client address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
}

/// Body of `POST /api/analytics/error`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    /// Anonymous user identifier
    pub user_id: String,
    /// Desktop application version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
    /// Operating system of the client
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    /// Error class
    pub error_type: String,
    /// Human readable message
    pub error_message: String,
    /// Application the error occurred in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_app: Option<String>,
    /// Stack trace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
}

/// Body of `POST /api/analytics/user-action`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserActionPayload {
    /// Anonymous user identifier
    pub user_id: String,
    /// Kind of action taken
    pub action_type: String,
    /// Application the action relates to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_app: Option<String>,
    /// Desktop application version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
    /// Operating system of the client
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
}

fn decode<T: DeserializeOwned>(value: serde_json::Value) -> PulseResult<T> {
    serde_json::from_value(value).map_err(PulseError::validation)
}

fn require(field: &str, value: &str) -> PulseResult<()> {
    if value.trim().is_empty() {
        return Err(PulseError::validation(format!(
            "field `{field}` must not be empty"
        )));
    }
    Ok(())
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl ReplacementPayload {
    /// Decode from a JSON value
    pub fn from_value(value: serde_json::Value) -> PulseResult<Self> {
        decode(value)
    }

    /// Fill `userAgent` and `ipAddress` from the request when the client left them out
    #[must_use]
    pub fn with_context(mut self, context: &RequestContext) -> Self {
        if is_blank(self.user_agent.as_deref()) {
            self.user_agent.clone_from(&context.user_agent);
        }
        if is_blank(self.ip_address.as_deref()) {
            self.ip_address.clone_from(&context.ip_address);
        }
        self
    }

    /// Apply the remaining rules and produce a draft event
    pub fn validate(self) -> PulseResult<NewReplacement> {
        require("userId", &self.user_id)?;
        require("method", &self.method)?;
        require("targetApp", &self.target_app)?;

        Ok(NewReplacement {
            user_id: self.user_id,
            app_version: non_blank(self.app_version),
            os: non_blank(self.os),
            success: self.success,
            method: self.method,
            target_app: self.target_app,
            text_length: self.text_length.unwrap_or(0),
            response_time_ms: self.response_time_ms.unwrap_or(0),
            user_agent: non_blank(self.user_agent),
            ip_address: non_blank(self.ip_address),
        })
    }
}

impl ErrorPayload {
    /// Decode from a JSON value
    pub fn from_value(value: serde_json::Value) -> PulseResult<Self> {
        decode(value)
    }

    /// Apply the remaining rules and produce a draft event
    pub fn validate(self) -> PulseResult<NewError> {
        require("userId", &self.user_id)?;
        require("errorType", &self.error_type)?;
        require("errorMessage", &self.error_message)?;

        Ok(NewError {
            user_id: self.user_id,
            app_version: non_blank(self.app_version),
            os: non_blank(self.os),
            error_type: self.error_type,
            error_message: self.error_message,
            target_app: non_blank(self.target_app),
            stack_trace: non_blank(self.stack_trace),
        })
    }
}

impl UserActionPayload {
    /// Decode from a JSON value
    pub fn from_value(value: serde_json::Value) -> PulseResult<Self> {
        decode(value)
    }

    /// Apply the remaining rules and produce a draft event
    pub fn validate(self) -> PulseResult<NewUserAction> {
        require("userId", &self.user_id)?;
        require("actionType", &self.action_type)?;

        Ok(NewUserAction {
            user_id: self.user_id,
            action_type: self.action_type,
            target_app: non_blank(self.target_app),
            app_version: non_blank(self.app_version),
            os: non_blank(self.os),
        })
    }
}
