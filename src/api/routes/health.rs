//! Service liveness endpoints

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::warn;

use crate::api::{error::ApiResult, state::ApiState, types::{HealthResponse, TickResponse}};

/// GET /api/v1/health
///
/// Pings the storage backend. 200 when reachable, 503 otherwise.
pub async fn health_check(State(state): State<ApiState>) -> impl IntoResponse {
    match state.storage.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "up".to_string(),
                timestamp: chrono::Utc::now().to_rfc3339(),
            }),
        ),
        Err(e) => {
            warn!("storage ping failed: {e}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "down".to_string(),
                    timestamp: chrono::Utc::now().to_rfc3339(),
                }),
            )
        }
    }
}

/// POST /api/v1/ticks
///
/// Trigger an immediate probe cycle, bypassing the interval timer.
pub async fn trigger_tick(State(state): State<ApiState>) -> ApiResult<Json<TickResponse>> {
    let summary = state.scheduler.tick_now().await?;

    Ok(Json(TickResponse {
        targets: summary.targets,
        recorded: summary.recorded,
    }))
}
