use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    routing::get,
    Router,
};
use monitor_core::{
    create_app, load_targets, websocket::WebSocketMessage, AppConfig, AppState, HealthCheckResult,
    HealthStatus, StrategyRegistry,
};
use std::collections::HashMap;
use std::io::Write;
use std::net::SocketAddr;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::sync::mpsc;
use tower::ServiceExt;

async fn spawn_monitored_service() -> SocketAddr {
    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route(
            "/down",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn write_targets_file(addr: SocketAddr) -> NamedTempFile {
    let json = serde_json::json!({
        "Applications": [
            { "Name": "api", "Type": "HTTP", "Target": format!("http://{}/health", addr) },
            { "Name": "legacy", "Type": "HTTP", "Target": format!("http://{}/down", addr) },
            { "Name": "db1", "Type": "DB", "Target": "sqlite::memory:", "Query": "SELECT 1" },
            { "Name": "db2", "Type": "DB", "Target": "sqlite::memory:" },
            { "Name": "x", "Type": "FTP", "Target": "ftp://localhost" }
        ]
    });

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(json.to_string().as_bytes()).unwrap();
    file
}

fn immediate_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.monitor.initial_delay_seconds = 0;
    config.monitor.check_interval_seconds = 3600;
    config
}

async fn collect_updates(
    rx: &mut mpsc::Receiver<WebSocketMessage>,
    expected: usize,
) -> HashMap<String, HealthCheckResult> {
    let mut updates = HashMap::new();
    while updates.len() < expected {
        let message = tokio::time::timeout(Duration::from_secs(10), rx.recv())
            .await
            .expect("timed out waiting for health updates")
            .expect("subscriber channel closed");
        if let WebSocketMessage::HealthUpdate(result) = message {
            updates.insert(result.application_name.clone(), result);
        }
    }
    updates
}

#[tokio::test]
async fn test_first_cycle_updates_store_and_subscribers() {
    let addr = spawn_monitored_service().await;
    let targets_file = write_targets_file(addr);
    let targets = load_targets(targets_file.path());
    assert_eq!(targets.len(), 5);

    let config = immediate_config();
    let state = AppState::from_config(&config, StrategyRegistry::with_defaults().unwrap());
    let (_subscriber, mut rx) = state.websocket_manager.subscribe().await.unwrap();

    state.orchestrator.start(targets).unwrap();
    let updates = collect_updates(&mut rx, 5).await;
    state.orchestrator.stop().await;

    assert_eq!(updates["api"].status, HealthStatus::Healthy);
    assert!(updates["api"].error_message.is_none());

    assert_eq!(updates["legacy"].status, HealthStatus::Unhealthy);
    assert!(updates["legacy"]
        .error_message
        .as_deref()
        .unwrap()
        .starts_with("Unexpected status code: 503"));

    assert_eq!(updates["db1"].status, HealthStatus::Healthy);

    assert_eq!(updates["db2"].status, HealthStatus::Unhealthy);
    assert_eq!(
        updates["db2"].error_message.as_deref(),
        Some("Database query is missing.")
    );

    assert_eq!(updates["x"].status, HealthStatus::Unhealthy);
    assert!(updates["x"]
        .error_message
        .as_deref()
        .unwrap()
        .starts_with("Configuration error:"));

    // What subscribers saw is what the store holds.
    for (name, update) in &updates {
        assert_eq!(state.orchestrator.store().get(name).as_ref(), Some(update));
    }
}

#[tokio::test]
async fn test_api_serves_latest_results() {
    let addr = spawn_monitored_service().await;
    let targets_file = write_targets_file(addr);
    let config = immediate_config();
    let state = AppState::from_config(&config, StrategyRegistry::with_defaults().unwrap());
    let (_subscriber, mut rx) = state.websocket_manager.subscribe().await.unwrap();

    state.orchestrator.start(load_targets(targets_file.path())).unwrap();
    collect_updates(&mut rx, 5).await;

    let app = create_app(state.clone(), &config);
    let response = app
        .oneshot(Request::builder().uri("/api/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    let entries = body["data"].as_array().unwrap();
    assert_eq!(entries.len(), 5);
    assert!(entries.iter().all(|entry| entry["status"] != "Unknown"));

    state.orchestrator.stop().await;
}

#[tokio::test]
async fn test_missing_targets_file_yields_idle_monitor() {
    let targets = load_targets("/definitely/not/here/healthcheckconfig.json");
    assert!(targets.is_empty());

    let state = AppState::from_config(&immediate_config(), StrategyRegistry::with_defaults().unwrap());
    let (_subscriber, mut rx) = state.websocket_manager.subscribe().await.unwrap();

    state.orchestrator.start(targets).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(state.orchestrator.current_statuses().is_empty());
    assert!(rx.try_recv().is_err());
    assert_eq!(state.orchestrator.stats().cycles_completed, 1);

    state.orchestrator.stop().await;
}
