//! Tag management endpoints

use axum::{
    Json,
    extract::{Path, State},
};

use crate::api::{
    error::{ApiError, ApiResult},
    state::ApiState,
    types::{CreateTag, TagResponse},
};

/// GET /api/v1/tags
pub async fn list_tags(State(state): State<ApiState>) -> ApiResult<Json<Vec<TagResponse>>> {
    let tags = state.storage.list_tags().await?;
    Ok(Json(tags.into_iter().map(TagResponse::from).collect()))
}

/// POST /api/v1/tags
pub async fn create_tag(
    State(state): State<ApiState>,
    Json(tag): Json<CreateTag>,
) -> ApiResult<Json<TagResponse>> {
    if state.storage.get_tag_by_name(&tag.name).await?.is_some() {
        return Err(ApiError::Conflict("Tag already exists".to_string()));
    }

    let created = state.storage.insert_tag(&tag.name).await?;
    Ok(Json(created.into()))
}

/// DELETE /api/v1/tags/{id}
pub async fn delete_tag(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<TagResponse>> {
    let deleted = state
        .storage
        .delete_tag(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Tag not found".to_string()))?;

    Ok(Json(deleted.into()))
}
