//! Dashboard metrics endpoints

use super::ApiState;
use crate::error::ApiError;
use crate::query::{
    ACTIONS_LIMIT, APPS_LIMIT, ERRORS_LIMIT, REAL_TIME_MINUTES, USAGE_DAYS, USERS_LIMIT,
};
use axum::extract::{Query, State};
use axum::Json;
use pulse_metrics::{
    ActionStats, AppStats, DailyUsage, ErrorSummary, MethodStats, MinuteActivity, Overview,
    UserStats,
};
use std::collections::HashMap;

type Params = Query<HashMap<String, String>>;

pub(crate) async fn overview(State(state): State<ApiState>) -> Result<Json<Overview>, ApiError> {
    state
        .engine
        .overview()
        .await
        .map(Json)
        .map_err(|e| ApiError::storage("overview", e))
}

pub(crate) async fn usage(
    State(state): State<ApiState>,
    Query(params): Params,
) -> Result<Json<Vec<DailyUsage>>, ApiError> {
    state
        .engine
        .usage_by_day(USAGE_DAYS.read(&params))
        .await
        .map(Json)
        .map_err(|e| ApiError::storage("usage_by_day", e))
}

pub(crate) async fn errors(
    State(state): State<ApiState>,
    Query(params): Params,
) -> Result<Json<Vec<ErrorSummary>>, ApiError> {
    state
        .engine
        .recent_errors(ERRORS_LIMIT.read(&params) as usize)
        .await
        .map(Json)
        .map_err(|e| ApiError::storage("recent_errors", e))
}

pub(crate) async fn users(
    State(state): State<ApiState>,
    Query(params): Params,
) -> Result<Json<Vec<UserStats>>, ApiError> {
    state
        .engine
        .top_users(USERS_LIMIT.read(&params) as usize)
        .await
        .map(Json)
        .map_err(|e| ApiError::storage("top_users", e))
}

pub(crate) async fn apps(
    State(state): State<ApiState>,
    Query(params): Params,
) -> Result<Json<Vec<AppStats>>, ApiError> {
    state
        .engine
        .app_breakdown(APPS_LIMIT.read(&params) as usize)
        .await
        .map(Json)
        .map_err(|e| ApiError::storage("app_breakdown", e))
}

pub(crate) async fn methods(
    State(state): State<ApiState>,
) -> Result<Json<Vec<MethodStats>>, ApiError> {
    state
        .engine
        .method_breakdown()
        .await
        .map(Json)
        .map_err(|e| ApiError::storage("method_breakdown", e))
}

pub(crate) async fn real_time(
    State(state): State<ApiState>,
    Query(params): Params,
) -> Result<Json<Vec<MinuteActivity>>, ApiError> {
    state
        .engine
        .real_time_by_minute(REAL_TIME_MINUTES.read(&params))
        .await
        .map(Json)
        .map_err(|e| ApiError::storage("real_time_by_minute", e))
}

pub(crate) async fn actions(
    State(state): State<ApiState>,
    Query(params): Params,
) -> Result<Json<Vec<ActionStats>>, ApiError> {
    state
        .engine
        .action_breakdown(ACTIONS_LIMIT.read(&params) as usize)
        .await
        .map(Json)
        .map_err(|e| ApiError::storage("action_breakdown", e))
}
