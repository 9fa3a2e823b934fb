//! Core library for the health monitor: probes, scheduling, status storage,
//! live notification and the HTTP surface over them.

pub mod broadcaster;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod orchestrator;
pub mod probes;
pub mod store;
pub mod websocket;

pub use broadcaster::Broadcaster;
pub use config::{load_targets, try_load_targets, AppConfig};
pub use error::{AppError, Result};
pub use handlers::routes::create_routes;
pub use models::{ApplicationTarget, ApplicationType, HealthCheckResult, HealthStatus};
pub use orchestrator::{CycleStats, CycleSummary, Orchestrator, OrchestratorSettings, OrchestratorState};
pub use probes::{DatabaseProbe, HttpProbe, ProbeStrategy, StrategyRegistry};
pub use store::StatusStore;
pub use websocket::{websocket_handler, WebSocketManager};

use axum::Router;
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tracing::{error, info};

#[derive(Clone)]
pub struct AppState {
    pub app_name: String,
    pub version: String,
    pub orchestrator: Arc<Orchestrator>,
    pub websocket_manager: WebSocketManager,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>, websocket_manager: WebSocketManager) -> Self {
        Self {
            app_name: "Health Monitor".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            orchestrator,
            websocket_manager,
        }
    }

    /// Wires a stopped orchestrator that publishes to this state's own
    /// WebSocket manager.
    pub fn from_config(config: &AppConfig, registry: StrategyRegistry) -> Self {
        let websocket_manager = WebSocketManager::new(&config.websocket);
        let orchestrator = Arc::new(Orchestrator::new(
            OrchestratorSettings::from(&config.monitor),
            registry,
            StatusStore::new(),
            Arc::new(websocket_manager.clone()),
        ));
        Self::new(orchestrator, websocket_manager)
    }
}

pub fn create_app(state: AppState, config: &AppConfig) -> Router {
    create_routes()
        .layer(middleware::cors::cors_layer_from_config(&config.server))
        .layer(middleware::logging::logging_layer())
        .with_state(state)
}

pub async fn run_server(app: Router, addr: SocketAddr) -> Result<()> {
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
