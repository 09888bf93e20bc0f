//! The aggregation engine
//!
//! Counting and grouping happen inside the store; the engine turns the
//! store's tallies into report rows, ranks them and applies limits. Groups
//! are keyed by the values actually observed, so a breakdown never contains
//! a zero-count row or a key nobody submitted.

use crate::report::{
    ActionStats, AppStats, DailyUsage, ErrorSummary, MethodStats, MinuteActivity, Overview,
    UserStats,
};
use crate::stats::{avg_response_ms, by_count_desc, success_rate};
use crate::window::{day_window_start, minute_floor, minute_window_start};
use chrono::Duration;
use pulse_core::Clock;
use pulse_store::{
    EventFilter, EventStore, GroupBy, GroupKey, ReplacementGroup, ReplacementTally, Result,
};
use std::sync::Arc;
use tracing::debug;

/// Upper bound on rows returned by [`AggregationEngine::real_time_by_minute`]
pub const MAX_MINUTE_BUCKETS: u32 = 60;

/// Computes dashboard statistics from stored events
#[derive(Clone)]
pub struct AggregationEngine {
    store: Arc<dyn EventStore>,
    clock: Arc<dyn Clock>,
}

impl AggregationEngine {
    /// Create an engine reading from `store`, with windows anchored on `clock`
    pub fn new(store: Arc<dyn EventStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// The store this engine reads from
    pub fn store(&self) -> &Arc<dyn EventStore> {
        &self.store
    }

    /// Totals, distinct users, mean response time and success rate
    pub async fn overview(&self) -> Result<Overview> {
        let all = EventFilter::all();
        let tally = self.store.summarize_replacements(&all).await?;
        let total_errors = self.store.count_errors(&all).await?;
        let total_user_actions = self.store.count_user_actions(&all).await?;

        Ok(Overview {
            total_replacements: tally.count,
            unique_users: tally.unique_users,
            total_errors,
            total_user_actions,
            avg_response_time_ms: avg_response_ms(&tally),
            success_rate: success_rate(&tally),
        })
    }

    /// Replacements per UTC day over the trailing `window_days`, newest day first
    pub async fn usage_by_day(&self, window_days: u32) -> Result<Vec<DailyUsage>> {
        let now = self.clock.now();
        let filter = EventFilter::all()
            .since(day_window_start(now, window_days))
            .until(day_window_start(now, 1) + Duration::days(1));
        let groups = self.store.group_replacements(&filter, GroupBy::Day).await?;
        debug!(window_days, days = groups.len(), "Computing daily usage");

        Ok(groups
            .into_iter()
            .rev()
            .filter_map(|ReplacementGroup { key, tally }| match key {
                GroupKey::Day(date) => Some(DailyUsage {
                    date,
                    replacement_count: tally.count,
                    unique_user_count: tally.unique_users,
                }),
                _ => None,
            })
            .collect())
    }

    /// The `limit` most recently stored errors, newest first
    pub async fn recent_errors(&self, limit: usize) -> Result<Vec<ErrorSummary>> {
        let errors = self.store.errors(&EventFilter::newest(limit)).await?;
        Ok(errors.into_iter().map(ErrorSummary::from).collect())
    }

    /// Most active users by replacement count, ties broken by user id
    pub async fn top_users(&self, limit: usize) -> Result<Vec<UserStats>> {
        let groups = self.text_groups(GroupBy::User).await?;

        let mut rows: Vec<UserStats> = groups
            .into_iter()
            .filter_map(|(user_id, tally)| {
                tally.last_seen.map(|last_seen_at| UserStats {
                    user_id,
                    replacement_count: tally.count,
                    avg_response_time_ms: avg_response_ms(&tally),
                    last_seen_at,
                })
            })
            .collect();

        by_count_desc(&mut rows, |row| row.replacement_count);
        rows.truncate(limit);
        Ok(rows)
    }

    /// Usage per target application, busiest first
    pub async fn app_breakdown(&self, limit: usize) -> Result<Vec<AppStats>> {
        let groups = self.text_groups(GroupBy::TargetApp).await?;

        let mut rows: Vec<AppStats> = groups
            .into_iter()
            .map(|(target_app, tally)| AppStats {
                target_app,
                usage_count: tally.count,
                unique_user_count: tally.unique_users,
                avg_response_time_ms: avg_response_ms(&tally),
                success_rate_pct: success_rate(&tally),
            })
            .collect();

        by_count_desc(&mut rows, |row| row.usage_count);
        rows.truncate(limit);
        Ok(rows)
    }

    /// Usage per replacement method, most used first
    pub async fn method_breakdown(&self) -> Result<Vec<MethodStats>> {
        let groups = self.text_groups(GroupBy::Method).await?;

        let mut rows: Vec<MethodStats> = groups
            .into_iter()
            .map(|(method, tally)| MethodStats {
                method,
                usage_count: tally.count,
                avg_response_time_ms: avg_response_ms(&tally),
                success_rate_pct: success_rate(&tally),
            })
            .collect();

        by_count_desc(&mut rows, |row| row.usage_count);
        Ok(rows)
    }

    /// Replacements per UTC minute over the trailing window, newest first.
    ///
    /// The window is capped at [`MAX_MINUTE_BUCKETS`] minutes.
    pub async fn real_time_by_minute(&self, window_minutes: u32) -> Result<Vec<MinuteActivity>> {
        let minutes = window_minutes.clamp(1, MAX_MINUTE_BUCKETS);
        let now = self.clock.now();
        let filter = EventFilter::all()
            .since(minute_window_start(now, minutes))
            .until(minute_floor(now) + Duration::minutes(1));
        let groups = self.store.group_replacements(&filter, GroupBy::Minute).await?;

        Ok(groups
            .into_iter()
            .rev()
            .filter_map(|ReplacementGroup { key, tally }| match key {
                GroupKey::Minute(minute_bucket) => Some(MinuteActivity {
                    minute_bucket,
                    replacement_count: tally.count,
                    unique_user_count: tally.unique_users,
                }),
                _ => None,
            })
            .take(MAX_MINUTE_BUCKETS as usize)
            .collect())
    }

    /// User actions per action type, most frequent first
    pub async fn action_breakdown(&self, limit: usize) -> Result<Vec<ActionStats>> {
        let groups = self.store.group_user_actions(&EventFilter::all()).await?;

        let mut rows: Vec<ActionStats> = groups
            .into_iter()
            .map(|group| ActionStats {
                action_type: group.action_type,
                count: group.count,
                unique_user_count: group.unique_users,
            })
            .collect();

        by_count_desc(&mut rows, |row| row.count);
        rows.truncate(limit);
        Ok(rows)
    }

    /// All-time replacement groups over a text column, in ascending key order
    async fn text_groups(&self, by: GroupBy) -> Result<Vec<(String, ReplacementTally)>> {
        let groups = self.store.group_replacements(&EventFilter::all(), by).await?;
        Ok(groups
            .into_iter()
            .filter_map(|group| group.key.into_text().map(|key| (key, group.tally)))
            .collect())
    }
}

impl std::fmt::Debug for AggregationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AggregationEngine")
            .field("backend", &self.store.backend_name())
            .finish()
    }
}
