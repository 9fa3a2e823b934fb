//! Read-only JSON API over the status store

use crate::{
    error::{AppError, Result},
    handlers::health::{handle_liveness, handle_readiness},
    models::request::ApiResponse,
    websocket::websocket_handler,
    AppState,
};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tracing::debug;

pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handle_root))
        .route("/live", get(handle_liveness))
        .route("/ready", get(handle_readiness))
        .route("/api/status", get(handle_get_statuses))
        .route("/api/status/:name", get(handle_get_status))
        .route("/api/stats", get(handle_stats))
        .route("/ws", get(websocket_handler))
}

async fn handle_root(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::success(serde_json::json!({
        "app": state.app_name,
        "version": state.version,
        "orchestrator": state.orchestrator.state(),
        "endpoints": {
            "statuses": "/api/status",
            "status": "/api/status/{name}",
            "stats": "/api/stats",
            "live": "/live",
            "ready": "/ready",
            "websocket": "/ws"
        }
    })))
}

async fn handle_get_statuses(State(state): State<AppState>) -> impl IntoResponse {
    let statuses = state.orchestrator.current_statuses();
    debug!("GET /api/status - {} entries", statuses.len());
    Json(ApiResponse::success(statuses))
}

async fn handle_get_status(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse> {
    debug!("GET /api/status/{}", name);

    let result = state
        .orchestrator
        .store()
        .get(&name)
        .ok_or_else(|| AppError::NotFound(format!("No application named '{}' is monitored", name)))?;

    Ok(Json(ApiResponse::success(result)))
}

async fn handle_stats(State(state): State<AppState>) -> impl IntoResponse {
    let stats = state.orchestrator.stats();
    let subscribers = state.websocket_manager.connection_count().await;

    Json(ApiResponse::success(serde_json::json!({
        "orchestrator": state.orchestrator.state(),
        "cycles": stats,
        "subscribers": subscribers
    })))
}
