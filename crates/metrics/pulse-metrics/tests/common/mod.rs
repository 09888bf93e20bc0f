//! Engine fixtures: an in-memory store and a manual clock shared by both

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use pulse_core::{ManualClock, NewError, NewReplacement, NewUserAction};
use pulse_metrics::AggregationEngine;
use pulse_store::{EventStore, MemoryEventStore};
use std::sync::Arc;

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 14, 30, 20).unwrap()
}

pub struct Harness {
    pub engine: AggregationEngine,
    pub store: Arc<dyn EventStore>,
    pub clock: ManualClock,
}

impl Harness {
    pub fn new() -> Self {
        let clock = ManualClock::new(now());
        let store: Arc<dyn EventStore> = Arc::new(MemoryEventStore::new(Arc::new(clock.clone())));
        let engine = AggregationEngine::new(Arc::clone(&store), Arc::new(clock.clone()));
        Self { engine, store, clock }
    }

    pub async fn replacement(&self, user: &str, app: &str, method: &str, success: bool, ms: u64) {
        self.store
            .append_replacement(NewReplacement {
                user_id: user.to_string(),
                app_version: Some("1.4.2".to_string()),
                os: Some("win32".to_string()),
                success,
                method: method.to_string(),
                target_app: app.to_string(),
                text_length: 10,
                response_time_ms: ms,
                user_agent: None,
                ip_address: None,
            })
            .await
            .unwrap();
    }

    pub async fn error(&self, user: &str, error_type: &str) {
        self.store
            .append_error(NewError {
                user_id: user.to_string(),
                app_version: None,
                os: None,
                error_type: error_type.to_string(),
                error_message: format!("{error_type} happened"),
                target_app: Some("notepad.exe".to_string()),
                stack_trace: None,
            })
            .await
            .unwrap();
    }

    pub async fn action(&self, user: &str, action_type: &str) {
        self.store
            .append_user_action(NewUserAction {
                user_id: user.to_string(),
                action_type: action_type.to_string(),
                target_app: None,
                app_version: None,
                os: None,
            })
            .await
            .unwrap();
    }
}
