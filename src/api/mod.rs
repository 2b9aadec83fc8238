//! REST API for the registry and the health history
//!
//! ## Architecture
//!
//! - **Axum** web framework with tower-http middleware
//! - **Storage backend** shared with the scheduler for queries
//!
//! ## Endpoints
//!
//! - `GET /api/v1/health` - Service liveness (storage ping)
//! - `POST /api/v1/ticks` - Trigger an immediate probe cycle
//! - `GET/POST /api/v1/targets` - List / register targets
//! - `GET/PUT/DELETE /api/v1/targets/{id}` - Manage one target
//! - `GET /api/v1/targets/{id}/health` - Recent health history
//! - `GET/POST /api/v1/tags`, `DELETE /api/v1/tags/{id}` - Tags

pub mod error;
pub mod routes;
pub mod state;
pub mod types;

pub use error::{ApiError, ApiResult};
pub use state::ApiState;
pub use types::{
    HealthRecordResponse, HealthResponse, HistoryResponse, TagResponse, TargetResponse,
    TickResponse,
};

use std::net::SocketAddr;

use axum::{
    Router,
    routing::{get, post},
};
use tracing::info;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bind address (e.g., "0.0.0.0:8080")
    pub bind_addr: SocketAddr,

    /// Enable CORS for external dashboards
    pub enable_cors: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".parse().expect("valid literal address"),
            enable_cors: true,
        }
    }
}

/// Build the application router
pub fn router(state: ApiState, enable_cors: bool) -> Router {
    use tower_http::cors::{Any, CorsLayer};
    use tower_http::trace::TraceLayer;

    let mut app = Router::new()
        .route("/api/v1/health", get(routes::health::health_check))
        .route("/api/v1/ticks", post(routes::health::trigger_tick))
        .route(
            "/api/v1/targets",
            get(routes::targets::list_targets).post(routes::targets::create_target),
        )
        .route(
            "/api/v1/targets/:id",
            get(routes::targets::get_target)
                .put(routes::targets::update_target)
                .delete(routes::targets::delete_target),
        )
        .route(
            "/api/v1/targets/:id/health",
            get(routes::targets::get_target_history),
        )
        .route(
            "/api/v1/tags",
            get(routes::tags::list_tags).post(routes::tags::create_tag),
        )
        .route("/api/v1/tags/:id", axum::routing::delete(routes::tags::delete_tag))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    app
}

/// Spawn the API server
///
/// Starts an Axum HTTP server in a background task and returns the
/// server's local address.
pub async fn spawn_api_server(config: ApiConfig, state: ApiState) -> anyhow::Result<SocketAddr> {
    info!("starting API server on {}", config.bind_addr);

    let app = router(state, config.enable_cors);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    let addr = listener.local_addr()?;

    info!("API server listening on {}", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("API server error: {}", e);
        }
    });

    Ok(addr)
}
