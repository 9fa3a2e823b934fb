//! Liveness and readiness of the monitor itself

use crate::{models::request::ApiResponse, AppState};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use tracing::{debug, warn};

pub async fn handle_readiness(State(state): State<AppState>) -> impl IntoResponse {
    debug!("GET /ready - Readiness probe");

    let orchestrator_state = state.orchestrator.state();

    if state.orchestrator.is_running() {
        (
            StatusCode::OK,
            Json(ApiResponse::success(serde_json::json!({
                "status": "ready",
                "orchestrator": orchestrator_state,
                "timestamp": chrono::Utc::now().timestamp()
            }))),
        )
    } else {
        warn!("Readiness probe failed: orchestrator is {}", orchestrator_state);
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse::error(format!(
                "Service not ready: orchestrator is {}",
                orchestrator_state
            ))),
        )
    }
}

pub async fn handle_liveness() -> impl IntoResponse {
    debug!("GET /live - Liveness probe");

    (
        StatusCode::OK,
        Json(ApiResponse::success(serde_json::json!({
            "status": "alive",
            "timestamp": chrono::Utc::now().timestamp()
        }))),
    )
}
