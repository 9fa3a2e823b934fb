#[cfg(test)]
mod tests {
    use crate::broadcaster::Broadcaster;
    use crate::config::WebSocketConfig;
    use crate::models::{HealthCheckResult, HealthStatus};
    use crate::websocket::{
        manager::{greeting, WebSocketConnection, WebSocketManager},
        messages::{WebSocketEvent, WebSocketMessage},
    };
    use std::time::Duration;
    use tokio::sync::mpsc;
    use uuid::Uuid;

    fn manager_with(max_connections: usize, message_buffer_size: usize) -> WebSocketManager {
        WebSocketManager::new(&WebSocketConfig {
            max_connections,
            message_buffer_size,
        })
    }

    fn sample_result(name: &str) -> HealthCheckResult {
        HealthCheckResult::healthy(name, Duration::from_millis(5))
    }

    #[tokio::test]
    async fn test_websocket_connection_creation() {
        let (tx, _rx) = mpsc::channel(1);
        let connection = WebSocketConnection::new(tx);

        assert!(!connection.id.is_nil());
    }

    #[tokio::test]
    async fn test_websocket_connection_send() {
        let (tx, mut rx) = mpsc::channel(4);
        let connection = WebSocketConnection::new(tx);

        assert!(connection.send(WebSocketMessage::Ping).is_ok());

        let received = rx.recv().await.unwrap();
        assert!(matches!(received, WebSocketMessage::Ping));
    }

    #[tokio::test]
    async fn test_subscribe_and_remove() {
        let manager = WebSocketManager::default();
        assert_eq!(manager.connection_count().await, 0);

        let (id, _rx) = manager.subscribe().await.unwrap();
        assert_eq!(manager.connection_count().await, 1);

        manager.remove_connection(&id).await;
        assert_eq!(manager.connection_count().await, 0);
    }

    #[tokio::test]
    async fn test_subscriber_limit() {
        let manager = manager_with(1, 4);
        let _first = manager.subscribe().await.unwrap();

        assert!(manager.subscribe().await.is_err());
        assert_eq!(manager.connection_count().await, 1);
    }

    #[tokio::test]
    async fn test_publish_reaches_every_subscriber() {
        let manager = WebSocketManager::default();
        let (_id1, mut rx1) = manager.subscribe().await.unwrap();
        let (_id2, mut rx2) = manager.subscribe().await.unwrap();

        manager.publish(&sample_result("api")).await;

        for rx in [&mut rx1, &mut rx2] {
            match rx.recv().await.unwrap() {
                WebSocketMessage::HealthUpdate(result) => {
                    assert_eq!(result.application_name, "api");
                    assert_eq!(result.status, HealthStatus::Healthy);
                }
                other => panic!("unexpected message: {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_slow_subscriber_is_skipped_without_blocking() {
        let manager = manager_with(10, 1);
        let (_slow, mut slow_rx) = manager.subscribe().await.unwrap();
        let (_fast, mut fast_rx) = manager.subscribe().await.unwrap();

        let first = manager
            .broadcast(WebSocketEvent::HealthUpdate(sample_result("first")))
            .await;
        assert_eq!(first.delivered, 2);

        fast_rx.recv().await.unwrap();

        let second = tokio::time::timeout(
            Duration::from_secs(1),
            manager.broadcast(WebSocketEvent::HealthUpdate(sample_result("second"))),
        )
        .await
        .expect("broadcast must not wait for a full subscriber");

        assert_eq!(second.delivered, 1);
        assert_eq!(second.skipped, 1);
        assert_eq!(manager.connection_count().await, 2);

        match fast_rx.recv().await.unwrap() {
            WebSocketMessage::HealthUpdate(result) => assert_eq!(result.application_name, "second"),
            other => panic!("unexpected message: {:?}", other),
        }
        match slow_rx.recv().await.unwrap() {
            WebSocketMessage::HealthUpdate(result) => assert_eq!(result.application_name, "first"),
            other => panic!("unexpected message: {:?}", other),
        }
        assert!(slow_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_disconnected_subscriber_is_removed() {
        let manager = WebSocketManager::default();
        let (_gone, gone_rx) = manager.subscribe().await.unwrap();
        let (_alive, mut alive_rx) = manager.subscribe().await.unwrap();
        drop(gone_rx);

        let report = manager
            .broadcast(WebSocketEvent::HealthUpdate(sample_result("api")))
            .await;

        assert_eq!(report.delivered, 1);
        assert_eq!(report.removed, 1);
        assert_eq!(manager.connection_count().await, 1);
        assert!(alive_rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_noop() {
        let manager = WebSocketManager::default();
        let report = manager
            .broadcast(WebSocketEvent::HealthUpdate(sample_result("api")))
            .await;

        assert_eq!(report.delivered, 0);
        assert_eq!(report.skipped, 0);
        assert_eq!(report.removed, 0);
    }

    #[test]
    fn test_message_serialization() {
        let message = WebSocketMessage::HealthUpdate(HealthCheckResult::unhealthy(
            "db1",
            "Database query is missing.",
            Duration::ZERO,
        ));
        let json = message.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["type"], "HealthUpdate");
        assert_eq!(value["data"]["application_name"], "db1");
        assert_eq!(value["data"]["status"], "Unhealthy");

        let connected = WebSocketMessage::Connected { connection_id: Uuid::nil() };
        let value: serde_json::Value = serde_json::from_str(&connected.to_json().unwrap()).unwrap();
        assert_eq!(value["type"], "Connected");

        let ping = WebSocketMessage::from_json(r#"{"type":"Ping"}"#).unwrap();
        assert!(matches!(ping, WebSocketMessage::Ping));
    }

    #[test]
    fn test_event_conversion() {
        let snapshot = WebSocketEvent::Snapshot(vec![sample_result("a"), sample_result("b")]);
        match WebSocketMessage::from(snapshot) {
            WebSocketMessage::Snapshot(results) => assert_eq!(results.len(), 2),
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_greeting_sends_connected_then_snapshot() {
        let id = Uuid::new_v4();
        let [first, second] = greeting(id, vec![sample_result("a")]);

        match first {
            WebSocketMessage::Connected { connection_id } => assert_eq!(connection_id, id),
            other => panic!("unexpected message: {:?}", other),
        }
        let value: serde_json::Value = serde_json::from_str(&second.to_json().unwrap()).unwrap();
        assert_eq!(value["type"], "Snapshot");
        assert_eq!(value["data"][0]["application_name"], "a");
    }
}
