//! Shared fixtures and store contract checks for pulse-store tests

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use pulse_core::{EventId, ManualClock, NewError, NewReplacement, NewUserAction};
use pulse_store::{
    open_store, ActionGroup, EventFilter, EventStore, GroupBy, GroupKey, ReplacementTally,
    SqliteConfig, StoreConfig,
};
use std::collections::HashSet;
use std::sync::Arc;
use tempfile::TempDir;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Fixed instant every fixture clock starts at
pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
}

/// A store plus the clock that stamps its events
pub struct StoreFixture {
    _temp_dir: Option<TempDir>,
    pub store: Arc<dyn EventStore>,
    pub clock: ManualClock,
}

impl StoreFixture {
    pub async fn memory() -> Self {
        init_tracing();
        let clock = ManualClock::new(start());
        let store = open_store(&StoreConfig::Memory, Arc::new(clock.clone()))
            .await
            .unwrap();
        Self {
            _temp_dir: None,
            store,
            clock,
        }
    }

    pub async fn sqlite() -> Self {
        init_tracing();
        let temp_dir = TempDir::new().unwrap();
        let config = StoreConfig::sqlite(temp_dir.path().join("analytics.db"));
        let clock = ManualClock::new(start());
        let store = open_store(&config, Arc::new(clock.clone())).await.unwrap();
        Self {
            _temp_dir: Some(temp_dir),
            store,
            clock,
        }
    }

    pub async fn sqlite_in_memory() -> Self {
        init_tracing();
        let config = StoreConfig::Sqlite(SqliteConfig {
            path: ":memory:".into(),
            ..SqliteConfig::default()
        });
        let clock = ManualClock::new(start());
        let store = open_store(&config, Arc::new(clock.clone())).await.unwrap();
        Self {
            _temp_dir: None,
            store,
            clock,
        }
    }
}

pub fn replacement(user: &str, app: &str, method: &str, success: bool, ms: u64) -> NewReplacement {
    NewReplacement {
        user_id: user.to_string(),
        app_version: Some("1.4.2".to_string()),
        os: Some("win32".to_string()),
        success,
        method: method.to_string(),
        target_app: app.to_string(),
        text_length: 24,
        response_time_ms: ms,
        user_agent: None,
        ip_address: Some("127.0.0.1".to_string()),
    }
}

pub fn error(user: &str, error_type: &str) -> NewError {
    NewError {
        user_id: user.to_string(),
        app_version: Some("1.4.2".to_string()),
        os: Some("win32".to_string()),
        error_type: error_type.to_string(),
        error_message: format!("{error_type} raised"),
        target_app: None,
        stack_trace: Some("at replace (replacer.rs:10)".to_string()),
    }
}

pub fn action(user: &str, action_type: &str) -> NewUserAction {
    NewUserAction {
        user_id: user.to_string(),
        action_type: action_type.to_string(),
        target_app: Some("notepad.exe".to_string()),
        app_version: None,
        os: None,
    }
}

/// Appended events read back in insertion order with every field intact
pub async fn check_append_and_read(fixture: &StoreFixture) {
    let store = &fixture.store;
    let first = store
        .append_replacement(replacement("user_a", "notepad.exe", "Win32DirectReplacer", true, 120))
        .await
        .unwrap();
    let second = store
        .append_replacement(replacement("user_b", "WINWORD.EXE", "TextPatternReplacer", false, 80))
        .await
        .unwrap();
    assert!(second > first);

    let rows = store.replacements(&EventFilter::all()).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].id, first);
    assert_eq!(rows[0].timestamp, start());
    assert_eq!(rows[0].user_id, "user_a");
    assert_eq!(rows[0].response_time_ms, 120);
    assert_eq!(rows[0].ip_address.as_deref(), Some("127.0.0.1"));
    assert!(rows[0].user_agent.is_none());
    assert!(!rows[1].success);
    assert_eq!(rows[1].target_app, "WINWORD.EXE");

    let err_id = store.append_error(error("user_a", "ClipboardError")).await.unwrap();
    let errors = store.errors(&EventFilter::all()).await.unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].id, err_id);
    assert_eq!(errors[0].error_message, "ClipboardError raised");
    assert!(errors[0].target_app.is_none());

    store.append_user_action(action("user_c", "settings_opened")).await.unwrap();
    let actions = store.user_actions(&EventFilter::all()).await.unwrap();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].target_app.as_deref(), Some("notepad.exe"));

    assert_eq!(store.count_replacements(&EventFilter::all()).await.unwrap(), 2);
    assert_eq!(store.count_errors(&EventFilter::all()).await.unwrap(), 1);
    assert_eq!(store.count_user_actions(&EventFilter::all()).await.unwrap(), 1);
}

/// Newest-first listings with a limit return the most recent inserts
pub async fn check_newest_first(fixture: &StoreFixture) {
    let store = &fixture.store;
    let mut ids = Vec::new();
    for kind in ["First", "Second", "Third"] {
        ids.push(store.append_error(error("user_a", kind)).await.unwrap());
        fixture.clock.advance(Duration::seconds(1));
    }

    let recent = store.errors(&EventFilter::newest(2)).await.unwrap();
    let recent_ids: Vec<EventId> = recent.iter().map(|e| e.id).collect();
    assert_eq!(recent_ids, vec![ids[2], ids[1]]);
    assert_eq!(recent[0].error_type, "Third");
}

/// `since` is inclusive, `until` exclusive, for reads and counts alike
pub async fn check_time_window(fixture: &StoreFixture) {
    let store = &fixture.store;
    for day in 0..3 {
        fixture.clock.set(start() + Duration::days(day));
        store
            .append_user_action(action(&format!("user_{day}"), "hotkey_pressed"))
            .await
            .unwrap();
    }

    let window = EventFilter::all()
        .since(start() + Duration::days(1))
        .until(start() + Duration::days(2));
    let rows = store.user_actions(&window).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].user_id, "user_1");
    assert_eq!(store.count_user_actions(&window).await.unwrap(), 1);

    let open_ended = EventFilter::all().since(start() + Duration::days(1));
    assert_eq!(store.count_user_actions(&open_ended).await.unwrap(), 2);
}

/// Concurrent appends all land, each with its own id
pub async fn check_concurrent_appends(fixture: &StoreFixture, n: usize) {
    let handles: Vec<_> = (0..n)
        .map(|i| {
            let store = Arc::clone(&fixture.store);
            tokio::spawn(async move {
                store
                    .append_replacement(replacement(
                        &format!("user_{}", i % 7),
                        "notepad.exe",
                        "Win32DirectReplacer",
                        i % 3 != 0,
                        i as u64,
                    ))
                    .await
            })
        })
        .collect();

    let mut ids = HashSet::new();
    for result in futures::future::join_all(handles).await {
        let id = result.unwrap().unwrap();
        assert!(ids.insert(id), "duplicate id {id}");
    }

    assert_eq!(ids.len(), n);
    assert_eq!(
        fixture.store.count_replacements(&EventFilter::all()).await.unwrap(),
        n as u64
    );
}

/// Schema creation is idempotent and safe to race
pub async fn check_schema_is_idempotent(fixture: &StoreFixture) {
    let (a, b) = tokio::join!(fixture.store.ensure_schema(), fixture.store.ensure_schema());
    a.unwrap();
    b.unwrap();
    fixture.store.ensure_schema().await.unwrap();
    fixture.store.ping().await.unwrap();
}

/// Aggregates agree with the rows they summarize, with groups in ascending key order
pub async fn check_grouped_summaries(fixture: &StoreFixture) {
    let store = &fixture.store;
    let next_day = start() + Duration::days(1);

    store
        .append_replacement(replacement("user_a", "notepad.exe", "Win32DirectReplacer", true, 100))
        .await
        .unwrap();
    store
        .append_replacement(replacement("user_b", "notepad.exe", "TextPatternReplacer", false, 50))
        .await
        .unwrap();
    fixture.clock.set(next_day);
    store
        .append_replacement(replacement("user_a", "WINWORD.EXE", "Win32DirectReplacer", true, 30))
        .await
        .unwrap();
    fixture.clock.set(next_day + Duration::seconds(90));
    store
        .append_replacement(replacement("user_c", "notepad.exe", "Win32DirectReplacer", true, 20))
        .await
        .unwrap();

    let summary = store.summarize_replacements(&EventFilter::all()).await.unwrap();
    assert_eq!(
        summary,
        ReplacementTally {
            count: 4,
            successes: 3,
            response_total_ms: 200,
            unique_users: 3,
            last_seen: Some(next_day + Duration::seconds(90)),
        }
    );

    let empty = EventFilter::all().since(start() + Duration::days(10));
    assert_eq!(
        store.summarize_replacements(&empty).await.unwrap(),
        ReplacementTally::default()
    );
    assert!(store.group_replacements(&empty, GroupBy::User).await.unwrap().is_empty());

    let users = store
        .group_replacements(&EventFilter::all(), GroupBy::User)
        .await
        .unwrap();
    let keys: Vec<GroupKey> = users.iter().map(|g| g.key.clone()).collect();
    assert_eq!(
        keys,
        ["user_a", "user_b", "user_c"].map(|u| GroupKey::Text(u.to_string())).to_vec()
    );
    assert_eq!(
        users[0].tally,
        ReplacementTally {
            count: 2,
            successes: 2,
            response_total_ms: 130,
            unique_users: 1,
            last_seen: Some(next_day),
        }
    );

    // Byte order: upper case sorts first
    let apps = store
        .group_replacements(&EventFilter::all(), GroupBy::TargetApp)
        .await
        .unwrap();
    let apps: Vec<(GroupKey, u64)> = apps.into_iter().map(|g| (g.key, g.tally.count)).collect();
    assert_eq!(
        apps,
        vec![
            (GroupKey::Text("WINWORD.EXE".to_string()), 1),
            (GroupKey::Text("notepad.exe".to_string()), 3),
        ]
    );

    let methods = store
        .group_replacements(&EventFilter::all(), GroupBy::Method)
        .await
        .unwrap();
    assert_eq!(methods.len(), 2);
    assert_eq!(methods[0].key, GroupKey::Text("TextPatternReplacer".to_string()));
    assert_eq!(methods[0].tally.successes, 0);

    let days = store
        .group_replacements(&EventFilter::all(), GroupBy::Day)
        .await
        .unwrap();
    let days: Vec<(GroupKey, u64)> = days.into_iter().map(|g| (g.key, g.tally.count)).collect();
    assert_eq!(
        days,
        vec![
            (GroupKey::Day(start().date_naive()), 2),
            (GroupKey::Day(next_day.date_naive()), 2),
        ]
    );

    let minutes = store
        .group_replacements(&EventFilter::all().since(next_day), GroupBy::Minute)
        .await
        .unwrap();
    let minutes: Vec<GroupKey> = minutes.into_iter().map(|g| g.key).collect();
    assert_eq!(
        minutes,
        vec![
            GroupKey::Minute(next_day),
            GroupKey::Minute(next_day + Duration::minutes(1)),
        ]
    );

    for (user, kind) in [
        ("user_a", "hotkey_pressed"),
        ("user_a", "hotkey_pressed"),
        ("user_b", "settings_opened"),
        ("user_b", "hotkey_pressed"),
    ] {
        store.append_user_action(action(user, kind)).await.unwrap();
    }
    let actions = store.group_user_actions(&EventFilter::all()).await.unwrap();
    assert_eq!(
        actions,
        vec![
            ActionGroup {
                action_type: "hotkey_pressed".to_string(),
                count: 3,
                unique_users: 2,
            },
            ActionGroup {
                action_type: "settings_opened".to_string(),
                count: 1,
                unique_users: 1,
            },
        ]
    );
}
