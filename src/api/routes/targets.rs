//! Target registry and history endpoints

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::api::{
    error::{ApiError, ApiResult},
    state::ApiState,
    types::{HealthRecordResponse, HistoryResponse, TargetResponse},
};
use crate::storage::{NewTarget, TargetFilter};

/// Default number of history records returned per query
const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Query parameters for target listings
#[derive(Debug, Deserialize)]
pub struct ListTargetsQuery {
    is_production: Option<bool>,
    #[serde(default)]
    skip: usize,
    limit: Option<usize>,
}

/// Query parameters for history queries
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    limit: Option<usize>,
}

/// GET /api/v1/targets
pub async fn list_targets(
    State(state): State<ApiState>,
    Query(query): Query<ListTargetsQuery>,
) -> ApiResult<Json<Vec<TargetResponse>>> {
    let filter = TargetFilter {
        is_production: query.is_production,
        skip: query.skip,
        limit: query.limit,
    };

    let targets = state.storage.list_targets(filter).await?;

    Ok(Json(targets.into_iter().map(TargetResponse::from).collect()))
}

/// POST /api/v1/targets
pub async fn create_target(
    State(state): State<ApiState>,
    Json(target): Json<NewTarget>,
) -> ApiResult<Json<TargetResponse>> {
    if state
        .storage
        .get_target_by_name(&target.name)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict("Target already registered".to_string()));
    }

    let created = state.storage.insert_target(target).await?;
    Ok(Json(created.into()))
}

/// GET /api/v1/targets/{id}
pub async fn get_target(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<TargetResponse>> {
    let target = state
        .storage
        .get_target(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Target not found".to_string()))?;

    Ok(Json(target.into()))
}

/// PUT /api/v1/targets/{id}
pub async fn update_target(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Json(target): Json<NewTarget>,
) -> ApiResult<Json<TargetResponse>> {
    let updated = state
        .storage
        .update_target(id, target)
        .await?
        .ok_or_else(|| ApiError::NotFound("Target not found".to_string()))?;

    Ok(Json(updated.into()))
}

/// DELETE /api/v1/targets/{id}
pub async fn delete_target(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<TargetResponse>> {
    let deleted = state
        .storage
        .delete_target(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Target not found".to_string()))?;

    Ok(Json(deleted.into()))
}

/// GET /api/v1/targets/{id}/health?limit=N
///
/// The N most recent health records for a target, newest first.
/// An unknown id or an empty history is a 200 with an empty list -
/// absence of history is a valid state, not a fault.
pub async fn get_target_history(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<HistoryResponse>> {
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);

    let records = state.storage.latest_health_records(id, limit).await?;

    let records: Vec<HealthRecordResponse> =
        records.into_iter().map(HealthRecordResponse::from).collect();

    Ok(Json(HistoryResponse {
        target_id: id,
        count: records.len(),
        records,
    }))
}
