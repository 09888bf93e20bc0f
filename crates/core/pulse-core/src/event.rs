//! Event data model.
//!
//! Events are append-only. A store turns a draft (`New*`) into a stored event
//! by assigning an [`EventId`] and stamping the server time; nothing else
//! constructs stored events outside of tests and storage backends.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier assigned by the store at insertion time.
///
/// Ids are unique per event kind and increase with insertion order, so
/// ordering by id is ordering by insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub i64);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for EventId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// The three kinds of telemetry event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A text replacement attempt
    Replacement,
    /// An error raised inside the desktop application
    Error,
    /// A user interaction
    UserAction,
}

impl EventKind {
    /// Stable label used in logs and metric labels
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Replacement => "replacement",
            Self::Error => "error",
            Self::UserAction => "user_action",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated replacement attempt, not yet stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReplacement {
    /// Anonymous user identifier
    pub user_id: String,
    /// Desktop application version
    pub app_version: Option<String>,
    /// Operating system of the client
    pub os: Option<String>,
    /// Whether the replacement succeeded
    pub success: bool,
    /// Replacement strategy that ran
    pub method: String,
    /// Process name of the target application
    pub target_app: String,
    /// Length of the replaced text
    pub text_length: u64,
    /// Time the replacement took
    pub response_time_ms: u64,
    /// Client user agent
    pub user_agent: Option<String>,
    /// Client address
    pub ip_address: Option<String>,
}

impl NewReplacement {
    /// Stamp this draft into a stored event
    #[must_use]
    pub fn into_event(self, id: EventId, timestamp: DateTime<Utc>) -> ReplacementEvent {
        ReplacementEvent {
            id,
            timestamp,
            user_id: self.user_id,
            app_version: self.app_version,
            os: self.os,
            success: self.success,
            method: self.method,
            target_app: self.target_app,
            text_length: self.text_length,
            response_time_ms: self.response_time_ms,
            user_agent: self.user_agent,
            ip_address: self.ip_address,
        }
    }
}

/// Stored replacement attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplacementEvent {
    /// Store-assigned id
    pub id: EventId,
    /// Server receive time
    pub timestamp: DateTime<Utc>,
    /// Anonymous user identifier
    pub user_id: String,
    /// Desktop application version
    pub app_version: Option<String>,
    /// Operating system of the client
    pub os: Option<String>,
    /// Whether the replacement succeeded
    pub success: bool,
    /// Replacement strategy that ran
    pub method: String,
    /// Process name of the target application
    pub target_app: String,
    /// Length of the replaced text
    pub text_length: u64,
    /// Time the replacement took
    pub response_time_ms: u64,
    /// Client user agent
    pub user_agent: Option<String>,
    /// Client address
    pub ip_address: Option<String>,
}

/// Validated error report, not yet stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewError {
    /// Anonymous user identifier
    pub user_id: String,
    /// Desktop application version
    pub app_version: Option<String>,
    /// Operating system of the client
    pub os: Option<String>,
    /// Error class
    pub error_type: String,
    /// Human readable message
    pub error_message: String,
    /// Application the error occurred in
    pub target_app: Option<String>,
    /// Stack trace, if the client captured one
    pub stack_trace: Option<String>,
}

impl NewError {
    /// Stamp this draft into a stored event
    #[must_use]
    pub fn into_event(self, id: EventId, timestamp: DateTime<Utc>) -> ErrorEvent {
        ErrorEvent {
            id,
            timestamp,
            user_id: self.user_id,
            app_version: self.app_version,
            os: self.os,
            error_type: self.error_type,
            error_message: self.error_message,
            target_app: self.target_app,
            stack_trace: self.stack_trace,
        }
    }
}

/// Stored error report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEvent {
    /// Store-assigned id
    pub id: EventId,
    /// Server receive time
    pub timestamp: DateTime<Utc>,
    /// Anonymous user identifier
    pub user_id: String,
    /// Desktop application version
    pub app_version: Option<String>,
    /// Operating system of the client
    pub os: Option<String>,
    /// Error class
    pub error_type: String,
    /// Human readable message
    pub error_message: String,
    /// Application the error occurred in
    pub target_app: Option<String>,
    /// Stack trace, if the client captured one
    pub stack_trace: Option<String>,
}

/// Validated user action, not yet stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUserAction {
    /// Anonymous user identifier
    pub user_id: String,
    /// Kind of action taken
    pub action_type: String,
    /// Application the action relates to
    pub target_app: Option<String>,
    /// Desktop application version
    pub app_version: Option<String>,
    /// Operating system of the client
    pub os: Option<String>,
}

impl NewUserAction {
    /// Stamp this draft into a stored event
    #[must_use]
    pub fn into_event(self, id: EventId, timestamp: DateTime<Utc>) -> UserActionEvent {
        UserActionEvent {
            id,
            timestamp,
            user_id: self.user_id,
            action_type: self.action_type,
            target_app: self.target_app,
            app_version: self.app_version,
            os: self.os,
        }
    }
}

/// Stored user action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserActionEvent {
    /// Store-assigned id
    pub id: EventId,
    /// Server receive time
    pub timestamp: DateTime<Utc>,
    /// Anonymous user identifier
    pub user_id: String,
    /// Kind of action taken
    pub action_type: String,
    /// Application the action relates to
    pub target_app: Option<String>,
    /// Desktop application version
    pub app_version: Option<String>,
    /// Operating system of the client
    pub os: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_event_id_serializes_as_bare_integer() {
        let json = serde_json::to_string(&EventId(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn test_stamping_keeps_fields() {
        let draft = NewUserAction {
            user_id: "user_1".to_string(),
            action_type: "settings_opened".to_string(),
            target_app: None,
            app_version: Some("1.2.0".to_string()),
            os: Some("win32".to_string()),
        };
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let event = draft.into_event(EventId(7), at);

        assert_eq!(event.id, EventId(7));
        assert_eq!(event.timestamp, at);
        assert_eq!(event.action_type, "settings_opened");
        assert_eq!(event.app_version.as_deref(), Some("1.2.0"));
    }

    #[test]
    fn test_replacement_event_json_is_camel_case() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let event = NewReplacement {
            user_id: "user_1".to_string(),
            app_version: None,
            os: None,
            success: true,
            method: "TextPatternReplacer".to_string(),
            target_app: "WINWORD.EXE".to_string(),
            text_length: 12,
            response_time_ms: 80,
            user_agent: None,
            ip_address: None,
        }
        .into_event(EventId(1), at);

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["targetApp"], "WINWORD.EXE");
        assert_eq!(value["responseTimeMs"], 80);
        assert_eq!(value["id"], 1);
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(EventKind::Replacement.as_str(), "replacement");
        assert_eq!(EventKind::UserAction.to_string(), "user_action");
    }
}
