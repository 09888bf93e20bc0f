//! The store abstraction the service is written against

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use pulse_core::{
    ErrorEvent, EventId, NewError, NewReplacement, NewUserAction, ReplacementEvent,
    UserActionEvent,
};

/// Row ordering for listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    /// Id ascending, i.e. insertion order
    #[default]
    OldestFirst,
    /// Id descending
    NewestFirst,
}

/// Selection applied to a read
///
/// `since` is inclusive and `until` exclusive. Counts and aggregates ignore `limit` and `order`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventFilter {
    /// Earliest timestamp to include
    pub since: Option<DateTime<Utc>>,
    /// First timestamp to exclude
    pub until: Option<DateTime<Utc>>,
    /// Maximum number of rows
    pub limit: Option<usize>,
    /// Row ordering
    pub order: Order,
}

impl EventFilter {
    /// Every event, oldest first
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// The `limit` most recent events
    #[must_use]
    pub fn newest(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            order: Order::NewestFirst,
            ..Self::default()
        }
    }

    /// Restrict to events at or after `at`
    #[must_use]
    pub fn since(mut self, at: DateTime<Utc>) -> Self {
        self.since = Some(at);
        self
    }

    /// Restrict to events strictly before `at`
    #[must_use]
    pub fn until(mut self, at: DateTime<Utc>) -> Self {
        self.until = Some(at);
        self
    }

    /// Cap the number of rows
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the row ordering
    #[must_use]
    pub fn order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    /// Whether a timestamp falls inside the window
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.since.map_or(true, |since| at >= since) && self.until.map_or(true, |until| at < until)
    }
}

/// Field replacement events are grouped on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupBy {
    /// `user_id`
    User,
    /// `target_app`
    TargetApp,
    /// `method`
    Method,
    /// UTC calendar day of the timestamp
    Day,
    /// UTC minute of the timestamp
    Minute,
}

/// Value identifying one group
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupKey {
    /// A text column value
    Text(String),
    /// A UTC calendar day
    Day(NaiveDate),
    /// Start of a UTC minute
    Minute(DateTime<Utc>),
}

impl GroupKey {
    /// The text value, for `User`, `TargetApp` and `Method` groupings
    #[must_use]
    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Text(value) => Some(value),
            Self::Day(_) | Self::Minute(_) => None,
        }
    }
}

/// Aggregate over a set of replacement events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReplacementTally {
    /// Number of events
    pub count: u64,
    /// Events with `success = true`
    pub successes: u64,
    /// Sum of `response_time_ms`
    pub response_total_ms: u64,
    /// Distinct `user_id` values
    pub unique_users: u64,
    /// Latest timestamp in the set
    pub last_seen: Option<DateTime<Utc>>,
}

/// One group of a [`GroupBy`] query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementGroup {
    /// Group value
    pub key: GroupKey,
    /// Aggregate over the group
    pub tally: ReplacementTally,
}

/// Aggregate over the user actions sharing one `action_type`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionGroup {
    /// Action type
    pub action_type: String,
    /// Number of actions
    pub count: u64,
    /// Distinct `user_id` values
    pub unique_users: u64,
}

/// Append-only storage for the three event kinds.
///
/// Every append is atomic: a row is either fully visible to readers or not
/// present at all. Ids are unique per kind and increase with insertion order.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Short backend label reported by the health probe
    fn backend_name(&self) -> &'static str;

    /// Create the backing tables if they do not exist. Safe to call repeatedly
    /// and concurrently.
    async fn ensure_schema(&self) -> Result<()>;

    /// Cheap reachability check
    async fn ping(&self) -> Result<()>;

    /// Store a replacement attempt
    async fn append_replacement(&self, event: NewReplacement) -> Result<EventId>;

    /// Store an error report
    async fn append_error(&self, event: NewError) -> Result<EventId>;

    /// Store a user action
    async fn append_user_action(&self, event: NewUserAction) -> Result<EventId>;

    /// Read replacement attempts
    async fn replacements(&self, filter: &EventFilter) -> Result<Vec<ReplacementEvent>>;

    /// Read error reports
    async fn errors(&self, filter: &EventFilter) -> Result<Vec<ErrorEvent>>;

    /// Read user actions
    async fn user_actions(&self, filter: &EventFilter) -> Result<Vec<UserActionEvent>>;

    /// Count replacement attempts in the filter's window
    async fn count_replacements(&self, filter: &EventFilter) -> Result<u64>;

    /// Count error reports in the filter's window
    async fn count_errors(&self, filter: &EventFilter) -> Result<u64>;

    /// Count user actions in the filter's window
    async fn count_user_actions(&self, filter: &EventFilter) -> Result<u64>;

    /// Aggregate every replacement event in the filter's window
    async fn summarize_replacements(&self, filter: &EventFilter) -> Result<ReplacementTally>;

    /// Aggregate replacement events in the filter's window per group.
    ///
    /// Groups come back in ascending key order; only observed keys appear.
    async fn group_replacements(
        &self,
        filter: &EventFilter,
        by: GroupBy,
    ) -> Result<Vec<ReplacementGroup>>;

    /// Aggregate user actions in the filter's window per action type, in
    /// ascending type order
    async fn group_user_actions(&self, filter: &EventFilter) -> Result<Vec<ActionGroup>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_window_bounds() {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let filter = EventFilter::all()
            .since(start)
            .until(start + Duration::days(1));

        assert!(filter.contains(start));
        assert!(filter.contains(start + Duration::hours(23)));
        assert!(!filter.contains(start + Duration::days(1)));
        assert!(!filter.contains(start - Duration::seconds(1)));
    }

    #[test]
    fn test_newest() {
        let filter = EventFilter::newest(5);
        assert_eq!(filter.limit, Some(5));
        assert_eq!(filter.order, Order::NewestFirst);
        assert!(filter.since.is_none());
    }
}
