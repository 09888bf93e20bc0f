//! Ingestion endpoints

use super::ApiState;
use crate::error::ApiError;
use axum::extract::rejection::JsonRejection;
use axum::extract::{ConnectInfo, State};
use axum::http::header::USER_AGENT;
use axum::http::HeaderMap;
use axum::Json;
use pulse_core::{
    ErrorPayload, EventId, EventKind, ReplacementPayload, RequestContext, UserActionPayload,
};
use serde::Serialize;
use serde_json::Value;
use std::net::SocketAddr;
use tracing::info;

/// Body returned for every stored event
#[derive(Debug, Serialize)]
pub(crate) struct IngestResponse {
    success: bool,
    id: EventId,
}

pub(crate) async fn text_replacement(
    State(state): State<ApiState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<IngestResponse>, ApiError> {
    let Json(body) = body?;
    let context = request_context(&headers, peer.map(|ConnectInfo(addr)| addr));
    let draft = ReplacementPayload::from_value(body)?
        .with_context(&context)
        .validate()?;

    let user_id = draft.user_id.clone();
    let target_app = draft.target_app.clone();
    let id = state
        .store
        .append_replacement(draft)
        .await
        .map_err(|e| ApiError::storage("append_replacement", e))?;

    stored(EventKind::Replacement, id, &user_id, Some(&target_app));
    Ok(Json(IngestResponse { success: true, id }))
}

pub(crate) async fn error(
    State(state): State<ApiState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<IngestResponse>, ApiError> {
    let Json(body) = body?;
    let draft = ErrorPayload::from_value(body)?.validate()?;

    let user_id = draft.user_id.clone();
    let target_app = draft.target_app.clone();
    let id = state
        .store
        .append_error(draft)
        .await
        .map_err(|e| ApiError::storage("append_error", e))?;

    stored(EventKind::Error, id, &user_id, target_app.as_deref());
    Ok(Json(IngestResponse { success: true, id }))
}

pub(crate) async fn user_action(
    State(state): State<ApiState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<IngestResponse>, ApiError> {
    let Json(body) = body?;
    let draft = UserActionPayload::from_value(body)?.validate()?;

    let user_id = draft.user_id.clone();
    let target_app = draft.target_app.clone();
    let id = state
        .store
        .append_user_action(draft)
        .await
        .map_err(|e| ApiError::storage("append_user_action", e))?;

    stored(EventKind::UserAction, id, &user_id, target_app.as_deref());
    Ok(Json(IngestResponse { success: true, id }))
}

fn stored(kind: EventKind, id: EventId, user_id: &str, target_app: Option<&str>) {
    info!(
        kind = kind.as_str(),
        id = id.0,
        user_id,
        target_app = target_app.unwrap_or("-"),
        "Stored event"
    );
    metrics::counter!("pulse_events_ingested_total", "kind" => kind.as_str()).increment(1);
}

/// Client metadata taken from the request itself
fn request_context(headers: &HeaderMap, peer: Option<SocketAddr>) -> RequestContext {
    let header = |name| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    let forwarded_for = header("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    RequestContext {
        user_agent: header(USER_AGENT.as_str()).map(str::to_string),
        ip_address: forwarded_for
            .map(str::to_string)
            .or_else(|| peer.map(|addr| addr.ip().to_string())),
    }
}
