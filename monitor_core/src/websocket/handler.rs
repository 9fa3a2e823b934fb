use axum::{
    extract::{
        ws::{WebSocketUpgrade, WebSocket},
        State,
    },
    response::Response,
};
use tracing::{info, warn};

use crate::orchestrator::Orchestrator;
use crate::websocket::manager::WebSocketManager;
use crate::AppState;
use std::sync::Arc;

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> Response {
    info!("WebSocket connection request received");

    let ws_manager = state.websocket_manager.clone();
    let orchestrator = state.orchestrator.clone();

    ws.on_upgrade(move |socket| handle_socket(socket, ws_manager, orchestrator))
}

async fn handle_socket(
    socket: WebSocket,
    ws_manager: WebSocketManager,
    orchestrator: Arc<Orchestrator>,
) {
    info!("WebSocket connection established");

    if let Err(e) = ws_manager
        .handle_connection(socket, || orchestrator.current_statuses())
        .await
    {
        warn!("WebSocket connection error: {}", e);
    }

    info!("WebSocket connection closed");
}
