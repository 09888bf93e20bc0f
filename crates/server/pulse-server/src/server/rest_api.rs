//! Router assembly and the unauthenticated endpoints

use super::{exporter, ingest, metrics_api};
use crate::auth::require_api_key;
use crate::error::ApiError;
use crate::{SERVICE_NAME, VERSION};
use axum::{
    extract::State,
    middleware,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use pulse_core::Clock;
use pulse_metrics::AggregationEngine;
use pulse_store::EventStore;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

/// State shared across handlers
#[derive(Clone)]
pub struct ApiState {
    pub(crate) store: Arc<dyn EventStore>,
    pub(crate) engine: AggregationEngine,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) metrics: Option<PrometheusHandle>,
    api_key: Arc<str>,
}

impl ApiState {
    /// Build handler state around an opened store
    pub fn new(store: Arc<dyn EventStore>, clock: Arc<dyn Clock>, api_key: &str) -> Self {
        let engine = AggregationEngine::new(Arc::clone(&store), Arc::clone(&clock));
        Self {
            store,
            engine,
            clock,
            metrics: None,
            api_key: Arc::from(api_key),
        }
    }

    /// Serve the recorder's output on `GET /metrics`
    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    pub(crate) fn api_key(&self) -> &str {
        &self.api_key
    }
}

/// Create the API router
pub fn create_router(state: ApiState, enable_cors: bool) -> Router {
    let protected = Router::new()
        // Ingestion
        .route("/api/analytics/text-replacement", post(ingest::text_replacement))
        .route("/api/analytics/error", post(ingest::error))
        .route("/api/analytics/user-action", post(ingest::user_action))
        // Dashboard metrics
        .route("/api/metrics/overview", get(metrics_api::overview))
        .route("/api/metrics/usage", get(metrics_api::usage))
        .route("/api/metrics/errors", get(metrics_api::errors))
        .route("/api/metrics/users", get(metrics_api::users))
        .route("/api/metrics/apps", get(metrics_api::apps))
        .route("/api/metrics/methods", get(metrics_api::methods))
        .route("/api/metrics/real-time", get(metrics_api::real_time))
        .route("/api/metrics/actions", get(metrics_api::actions))
        // Prometheus
        .route("/metrics", get(exporter::render))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key));

    let router = Router::new()
        .route("/", get(service_index))
        .route("/api/health", get(health))
        .merge(protected)
        .fallback(not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: DateTime<Utc>,
    database: &'static str,
    backend: &'static str,
}

/// Liveness probe. Always 200; store trouble shows up as `degraded`.
async fn health(State(state): State<ApiState>) -> Json<HealthResponse> {
    let (status, database) = match state.store.ping().await {
        Ok(()) => ("healthy", "connected"),
        Err(err) => {
            warn!(error = %err, "Health probe could not reach the event store");
            ("degraded", "unavailable")
        }
    };

    Json(HealthResponse {
        status,
        timestamp: state.clock.now(),
        database,
        backend: state.store.backend_name(),
    })
}

async fn service_index(State(state): State<ApiState>) -> Json<serde_json::Value> {
    Json(json!({
        "service": SERVICE_NAME,
        "version": VERSION,
        "backend": state.store.backend_name(),
        "endpoints": {
            "health": "GET /api/health",
            "ingest": [
                "POST /api/analytics/text-replacement",
                "POST /api/analytics/error",
                "POST /api/analytics/user-action",
            ],
            "metrics": [
                "GET /api/metrics/overview",
                "GET /api/metrics/usage?days=30",
                "GET /api/metrics/errors?limit=10",
                "GET /api/metrics/users?limit=10",
                "GET /api/metrics/apps?limit=20",
                "GET /api/metrics/methods",
                "GET /api/metrics/real-time?minutes=60",
                "GET /api/metrics/actions?limit=20",
            ],
            "prometheus": "GET /metrics",
        },
    }))
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}
