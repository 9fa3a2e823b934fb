//! Main entry point for the health monitor binary

use anyhow::Result;
use monitor_core::{create_app, load_targets, run_server, AppConfig, AppState, StrategyRegistry};
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = AppConfig::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    info!("Configuration loaded successfully");
    info!("Server will bind to: {}", config.bind_address());

    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address: {}", e))?;

    let targets = load_targets(&config.monitor.targets_file);
    if targets.is_empty() {
        warn!(
            "No applications loaded from {}; cycles will be no-ops",
            config.monitor.targets_file.display()
        );
    }

    let registry = StrategyRegistry::with_defaults()
        .map_err(|e| anyhow::anyhow!("Failed to build probe registry: {}", e))?;

    let state = AppState::from_config(&config, registry);
    info!("App: {} v{}", state.app_name, state.version);

    state
        .orchestrator
        .start(targets)
        .map_err(|e| anyhow::anyhow!("Failed to start orchestrator: {}", e))?;

    let orchestrator = state.orchestrator.clone();
    let app = create_app(state, &config);

    run_server(app, addr).await?;

    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_seconds);
    if tokio::time::timeout(shutdown_timeout, orchestrator.stop()).await.is_err() {
        warn!("Orchestrator did not stop within {:?}", shutdown_timeout);
    }

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let default_level = if cfg!(debug_assertions) { "debug" } else { "info" };

        format!(
            "{}={},monitor_core={},tower_http=info",
            env!("CARGO_CRATE_NAME").replace('-', "_"),
            default_level,
            default_level
        )
        .into()
    });

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let is_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    if is_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer.pretty())
            .init();
    }
}
