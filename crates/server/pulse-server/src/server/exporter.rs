//! Prometheus exposition of the service counters

use super::rest_api::ApiState;
use crate::error::ApiError;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use pulse_core::{PulseError, PulseResult};

/// Install the process-wide Prometheus recorder and describe the service
/// counters. A process holds at most one recorder, so this succeeds once.
pub fn install_recorder() -> PulseResult<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| PulseError::config(format!("Failed to install Prometheus recorder: {e}")))?;

    metrics::describe_counter!(
        "pulse_events_ingested_total",
        "Events stored, labelled by kind"
    );
    metrics::describe_counter!(
        "pulse_storage_failures_total",
        "Failed store operations, labelled by operation"
    );

    Ok(handle)
}

/// `GET /metrics`: text exposition, or 404 when no recorder was installed
pub(crate) async fn render(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let handle = state.metrics.as_ref().ok_or(ApiError::NotFound)?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    ))
}
