//! Rows returned by the aggregation engine
//!
//! Field names serialise in camelCase; these structs are the JSON bodies of
//! the `/api/metrics/*` endpoints.

use chrono::{DateTime, NaiveDate, Utc};
use pulse_core::{ErrorEvent, EventId};
use serde::{Deserialize, Serialize};

/// Headline numbers over all replacement events
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    /// Number of replacement events
    pub total_replacements: u64,
    /// Distinct users across replacement events
    pub unique_users: u64,
    /// Number of error events
    pub total_errors: u64,
    /// Number of user-action events
    pub total_user_actions: u64,
    /// Mean response time, rounded
    pub avg_response_time_ms: u64,
    /// Percentage of successful replacements
    pub success_rate: f64,
}

/// Replacement activity for one UTC calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyUsage {
    /// The day, `YYYY-MM-DD`
    pub date: NaiveDate,
    /// Replacements that day
    pub replacement_count: u64,
    /// Distinct users that day
    pub unique_user_count: u64,
}

/// One row of the recent-errors listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorSummary {
    /// Store id of the error
    pub id: EventId,
    /// Error class
    pub error_type: String,
    /// Human readable message
    pub error_message: String,
    /// Application the error occurred in
    pub target_app: Option<String>,
    /// Reporting user
    pub user_id: String,
    /// Desktop application version
    pub app_version: Option<String>,
    /// Operating system of the client
    pub os: Option<String>,
    /// Server receive time
    pub timestamp: DateTime<Utc>,
}

impl From<ErrorEvent> for ErrorSummary {
    fn from(event: ErrorEvent) -> Self {
        Self {
            id: event.id,
            error_type: event.error_type,
            error_message: event.error_message,
            target_app: event.target_app,
            user_id: event.user_id,
            app_version: event.app_version,
            os: event.os,
            timestamp: event.timestamp,
        }
    }
}

/// Per-user replacement activity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    /// The user
    pub user_id: String,
    /// Replacements by this user
    pub replacement_count: u64,
    /// Mean response time, rounded
    pub avg_response_time_ms: u64,
    /// Timestamp of the user's latest replacement
    pub last_seen_at: DateTime<Utc>,
}

/// Per-application replacement activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppStats {
    /// Target application
    pub target_app: String,
    /// Replacements in this application
    pub usage_count: u64,
    /// Distinct users in this application
    pub unique_user_count: u64,
    /// Mean response time, rounded
    pub avg_response_time_ms: u64,
    /// Percentage of successful replacements
    pub success_rate_pct: f64,
}

/// Per-method replacement activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodStats {
    /// Replacement strategy
    pub method: String,
    /// Replacements using this strategy
    pub usage_count: u64,
    /// Mean response time, rounded
    pub avg_response_time_ms: u64,
    /// Percentage of successful replacements
    pub success_rate_pct: f64,
}

/// Replacement activity for one UTC minute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinuteActivity {
    /// Start of the minute
    pub minute_bucket: DateTime<Utc>,
    /// Replacements in the minute
    pub replacement_count: u64,
    /// Distinct users in the minute
    pub unique_user_count: u64,
}

/// Per-action-type counts over user actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionStats {
    /// Kind of action
    pub action_type: String,
    /// Actions of this kind
    pub count: u64,
    /// Distinct users taking this action
    pub unique_user_count: u64,
}
