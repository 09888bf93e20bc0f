//! Store backends

pub mod memory;
pub mod sqlite;

use crate::traits::{
    ActionGroup, EventFilter, GroupBy, GroupKey, Order, ReplacementGroup, ReplacementTally,
};
use chrono::{DateTime, Duration, DurationRound, Utc};
use pulse_core::{EventId, ReplacementEvent, UserActionEvent};
use std::collections::{BTreeMap, HashSet};

/// Apply ordering and limit to rows already filtered by window and held in id order
pub(crate) fn select<T>(
    rows: impl DoubleEndedIterator<Item = T>,
    filter: &EventFilter,
) -> Vec<T> {
    let limit = filter.limit.unwrap_or(usize::MAX);
    match filter.order {
        Order::OldestFirst => rows.take(limit).collect(),
        Order::NewestFirst => rows.rev().take(limit).collect(),
    }
}

/// Next id after `last`, starting at 1
pub(crate) fn next_id(last: Option<EventId>) -> EventId {
    EventId(last.map_or(1, |id| id.0 + 1))
}

/// Start of the UTC minute containing `at`
fn minute_of(at: DateTime<Utc>) -> DateTime<Utc> {
    at.duration_trunc(Duration::minutes(1)).unwrap_or(at)
}

/// Running totals for one group, borrowing user ids from the events
#[derive(Default)]
struct Accumulator<'a> {
    tally: ReplacementTally,
    users: HashSet<&'a str>,
}

impl<'a> Accumulator<'a> {
    fn record(&mut self, event: &'a ReplacementEvent) {
        self.tally.count += 1;
        if event.success {
            self.tally.successes += 1;
        }
        self.tally.response_total_ms = self
            .tally
            .response_total_ms
            .saturating_add(event.response_time_ms);
        self.users.insert(event.user_id.as_str());
        self.tally.last_seen = self.tally.last_seen.max(Some(event.timestamp));
    }

    fn finish(mut self) -> ReplacementTally {
        self.tally.unique_users = self.users.len() as u64;
        self.tally
    }
}

/// Aggregate in-process events the way the SQL backend does with `GROUP BY`
pub(crate) fn summarize<'a>(events: impl Iterator<Item = &'a ReplacementEvent>) -> ReplacementTally {
    let mut acc = Accumulator::default();
    for event in events {
        acc.record(event);
    }
    acc.finish()
}

pub(crate) fn group<'a>(
    events: impl Iterator<Item = &'a ReplacementEvent>,
    by: GroupBy,
) -> Vec<ReplacementGroup> {
    let mut groups: BTreeMap<GroupKey, Accumulator<'a>> = BTreeMap::new();
    for event in events {
        let key = match by {
            GroupBy::User => GroupKey::Text(event.user_id.clone()),
            GroupBy::TargetApp => GroupKey::Text(event.target_app.clone()),
            GroupBy::Method => GroupKey::Text(event.method.clone()),
            GroupBy::Day => GroupKey::Day(event.timestamp.date_naive()),
            GroupBy::Minute => GroupKey::Minute(minute_of(event.timestamp)),
        };
        groups.entry(key).or_default().record(event);
    }

    groups
        .into_iter()
        .map(|(key, acc)| ReplacementGroup {
            key,
            tally: acc.finish(),
        })
        .collect()
}

pub(crate) fn group_actions<'a>(
    actions: impl Iterator<Item = &'a UserActionEvent>,
) -> Vec<ActionGroup> {
    let mut groups: BTreeMap<&'a str, (u64, HashSet<&'a str>)> = BTreeMap::new();
    for action in actions {
        let (count, users) = groups.entry(action.action_type.as_str()).or_default();
        *count += 1;
        users.insert(action.user_id.as_str());
    }

    groups
        .into_iter()
        .map(|(action_type, (count, users))| ActionGroup {
            action_type: action_type.to_string(),
            count,
            unique_users: users.len() as u64,
        })
        .collect()
}
