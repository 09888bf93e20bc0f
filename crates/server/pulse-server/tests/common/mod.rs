//! Router fixtures for pulse-server tests

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{DateTime, TimeZone, Utc};
use http_body_util::BodyExt;
use metrics_exporter_prometheus::PrometheusHandle;
use pulse_core::{
    ErrorEvent, EventId, ManualClock, NewError, NewReplacement, NewUserAction, ReplacementEvent,
    UserActionEvent,
};
use pulse_server::{create_router, install_recorder, ApiState};
use pulse_store::{
    ActionGroup, EventFilter, EventStore, GroupBy, MemoryEventStore, ReplacementGroup,
    ReplacementTally, Result, StorageError,
};
use serde_json::Value;
use std::sync::{Arc, OnceLock};
use tower::ServiceExt;

pub const API_KEY: &str = "test-secret-key";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// The process-wide recorder, installed on first use
pub fn recorder() -> PrometheusHandle {
    static RECORDER: OnceLock<PrometheusHandle> = OnceLock::new();
    RECORDER
        .get_or_init(|| install_recorder().unwrap())
        .clone()
}

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 14, 30, 20).unwrap()
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<dyn EventStore>,
    pub clock: ManualClock,
}

impl TestApp {
    pub fn new() -> Self {
        init_tracing();
        let clock = ManualClock::new(now());
        let store: Arc<dyn EventStore> = Arc::new(MemoryEventStore::new(Arc::new(clock.clone())));
        Self::with_store(store, clock)
    }

    pub fn failing() -> Self {
        init_tracing();
        Self::with_store(Arc::new(FailingEventStore), ManualClock::new(now()))
    }

    /// A memory-backed app serving the global recorder on `/metrics`
    pub fn with_metrics() -> Self {
        let mut app = Self::new();
        let state = ApiState::new(Arc::clone(&app.store), Arc::new(app.clock.clone()), API_KEY)
            .with_metrics(recorder());
        app.router = create_router(state, true);
        app
    }

    fn with_store(store: Arc<dyn EventStore>, clock: ManualClock) -> Self {
        let state = ApiState::new(Arc::clone(&store), Arc::new(clock.clone()), API_KEY);
        Self {
            router: create_router(state, true),
            store,
            clock,
        }
    }

    /// Send a request whose response body is plain text
    pub async fn send_text(&self, request: Request<Body>) -> (StatusCode, String) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(authorized(Method::GET, uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            authorized(Method::POST, uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }
}

pub fn authorized(method: Method, uri: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {API_KEY}"))
}

pub fn replacement_body(user: &str, app: &str) -> Value {
    serde_json::json!({
        "userId": user,
        "appVersion": "1.4.2",
        "os": "win32",
        "success": true,
        "method": "Win32DirectReplacer",
        "targetApp": app,
        "textLength": 42,
        "responseTimeMs": 120,
    })
}

/// A store whose medium is permanently unreachable
pub struct FailingEventStore;

fn unreachable() -> StorageError {
    StorageError::Unavailable("connection refused".to_string())
}

#[async_trait]
impl EventStore for FailingEventStore {
    fn backend_name(&self) -> &'static str {
        "failing"
    }

    async fn ensure_schema(&self) -> Result<()> {
        Err(unreachable())
    }

    async fn ping(&self) -> Result<()> {
        Err(unreachable())
    }

    async fn append_replacement(&self, _event: NewReplacement) -> Result<EventId> {
        Err(unreachable())
    }

    async fn append_error(&self, _event: NewError) -> Result<EventId> {
        Err(unreachable())
    }

    async fn append_user_action(&self, _event: NewUserAction) -> Result<EventId> {
        Err(unreachable())
    }

    async fn replacements(&self, _filter: &EventFilter) -> Result<Vec<ReplacementEvent>> {
        Err(unreachable())
    }

    async fn errors(&self, _filter: &EventFilter) -> Result<Vec<ErrorEvent>> {
        Err(unreachable())
    }

    async fn user_actions(&self, _filter: &EventFilter) -> Result<Vec<UserActionEvent>> {
        Err(unreachable())
    }

    async fn count_replacements(&self, _filter: &EventFilter) -> Result<u64> {
        Err(unreachable())
    }

    async fn count_errors(&self, _filter: &EventFilter) -> Result<u64> {
        Err(unreachable())
    }

    async fn count_user_actions(&self, _filter: &EventFilter) -> Result<u64> {
        Err(unreachable())
    }

    async fn summarize_replacements(&self, _filter: &EventFilter) -> Result<ReplacementTally> {
        Err(unreachable())
    }

    async fn group_replacements(
        &self,
        _filter: &EventFilter,
        _by: GroupBy,
    ) -> Result<Vec<ReplacementGroup>> {
        Err(unreachable())
    }

    async fn group_user_actions(&self, _filter: &EventFilter) -> Result<Vec<ActionGroup>> {
        Err(unreachable())
    }
}
