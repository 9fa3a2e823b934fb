use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tokio::sync::mpsc::error::TrySendError;
use uuid::Uuid;
use axum::extract::ws::{WebSocket, Message};
use futures_util::{SinkExt, StreamExt};
use tracing::{info, warn, error, debug};
use chrono::{DateTime, Utc};

use crate::broadcaster::Broadcaster;
use crate::config::WebSocketConfig;
use crate::error::{AppError, Result};
use crate::models::HealthCheckResult;
use crate::websocket::messages::{WebSocketMessage, WebSocketEvent};

#[derive(Debug)]
pub struct WebSocketConnection {
    pub id: Uuid,
    pub connected_at: DateTime<Utc>,
    pub sender: mpsc::Sender<WebSocketMessage>,
}

impl WebSocketConnection {
    pub fn new(sender: mpsc::Sender<WebSocketMessage>) -> Self {
        Self {
            id: Uuid::new_v4(),
            connected_at: Utc::now(),
            sender,
        }
    }

    /// Queues a message without waiting for buffer space.
    pub fn send(&self, message: WebSocketMessage) -> std::result::Result<(), TrySendError<WebSocketMessage>> {
        self.sender.try_send(message)
    }
}

/// What happened to one broadcast.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub skipped: usize,
    pub removed: usize,
}

#[derive(Debug, Clone)]
pub struct WebSocketManager {
    connections: Arc<RwLock<HashMap<Uuid, WebSocketConnection>>>,
    max_connections: usize,
    message_buffer_size: usize,
}

impl Default for WebSocketManager {
    fn default() -> Self {
        Self::new(&WebSocketConfig::default())
    }
}

impl WebSocketManager {
    pub fn new(config: &WebSocketConfig) -> Self {
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
            max_connections: config.max_connections,
            message_buffer_size: config.message_buffer_size.max(1),
        }
    }

    pub async fn add_connection(&self, connection: WebSocketConnection) -> Result<()> {
        let connection_id = connection.id;
        let mut connections = self.connections.write().await;
        if connections.len() >= self.max_connections {
            return Err(AppError::WebSocket(format!(
                "Subscriber limit of {} reached",
                self.max_connections
            )));
        }
        connections.insert(connection_id, connection);
        info!("WebSocket connection added: {}", connection_id);
        Ok(())
    }

    /// Registers a new subscriber and hands back its receiving end.
    pub async fn subscribe(&self) -> Result<(Uuid, mpsc::Receiver<WebSocketMessage>)> {
        let (tx, rx) = mpsc::channel(self.message_buffer_size);
        let connection = WebSocketConnection::new(tx);
        let connection_id = connection.id;
        self.add_connection(connection).await?;
        Ok((connection_id, rx))
    }

    pub async fn remove_connection(&self, connection_id: &Uuid) {
        let mut connections = self.connections.write().await;
        if let Some(connection) = connections.remove(connection_id) {
            let duration = Utc::now() - connection.connected_at;
            info!(
                "WebSocket connection removed: {} (connected for {}s)",
                connection_id,
                duration.num_seconds()
            );
        }
    }

    pub async fn connection_count(&self) -> usize {
        let connections = self.connections.read().await;
        connections.len()
    }

    pub async fn broadcast(&self, event: WebSocketEvent) -> DeliveryReport {
        let message = WebSocketMessage::from(event);
        let recipients: Vec<(Uuid, mpsc::Sender<WebSocketMessage>)> = {
            let connections = self.connections.read().await;
            connections
                .iter()
                .map(|(id, connection)| (*id, connection.sender.clone()))
                .collect()
        };

        let mut report = DeliveryReport::default();
        let mut failed_connections = Vec::new();

        for (connection_id, sender) in recipients {
            match sender.try_send(message.clone()) {
                Ok(()) => report.delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!("Connection {} is not keeping up, skipping message", connection_id);
                    report.skipped += 1;
                }
                Err(TrySendError::Closed(_)) => {
                    failed_connections.push(connection_id);
                }
            }
        }

        if !failed_connections.is_empty() {
            let mut connections = self.connections.write().await;
            for connection_id in failed_connections {
                if connections.remove(&connection_id).is_some() {
                    report.removed += 1;
                    info!("Removed failed connection: {}", connection_id);
                }
            }
        }

        report
    }

    /// Serves one WebSocket client until either side closes.
    ///
    /// The client first receives `Connected`, then a `Snapshot` taken after
    /// it was registered, then live updates.
    pub async fn handle_connection<F>(&self, socket: WebSocket, snapshot: F) -> Result<()>
    where
        F: FnOnce() -> Vec<HealthCheckResult>,
    {
        let (mut sender, mut receiver) = socket.split();
        let (connection_id, mut rx) = self.subscribe().await?;
        let pong_sender = {
            let connections = self.connections.read().await;
            connections.get(&connection_id).map(|c| c.sender.clone())
        };

        for message in greeting(connection_id, snapshot()) {
            let json = message.to_json()?;
            if sender.send(Message::Text(json)).await.is_err() {
                self.remove_connection(&connection_id).await;
                return Err(AppError::WebSocket("Client closed during handshake".to_string()));
            }
        }

        let mut outgoing_task = tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                let json = match message.to_json() {
                    Ok(json) => json,
                    Err(e) => {
                        error!("Failed to serialize WebSocket message: {}", e);
                        continue;
                    }
                };

                if sender.send(Message::Text(json)).await.is_err() {
                    debug!("WebSocket connection closed, stopping outgoing message handler");
                    break;
                }
            }
        });

        let mut incoming_task = tokio::spawn(async move {
            while let Some(msg) = receiver.next().await {
                match msg {
                    Ok(Message::Text(text)) => {
                        debug!("Received WebSocket message: {}", text);

                        match WebSocketMessage::from_json(&text) {
                            Ok(WebSocketMessage::Ping) => {
                                if let Some(pong) = &pong_sender {
                                    let _ = pong.try_send(WebSocketMessage::Pong);
                                }
                            }
                            Ok(_) => {
                                debug!("Received unhandled WebSocket message type");
                            }
                            Err(e) => {
                                debug!("Ignoring malformed WebSocket message: {}", e);
                            }
                        }
                    }
                    Ok(Message::Close(_)) => {
                        debug!("WebSocket connection closed by client");
                        break;
                    }
                    Err(e) => {
                        warn!("WebSocket error: {}", e);
                        break;
                    }
                    _ => {}
                }
            }
        });

        tokio::select! {
            _ = &mut outgoing_task => {
                debug!("Outgoing message handler completed");
                incoming_task.abort();
            }
            _ = &mut incoming_task => {
                debug!("Incoming message handler completed");
                outgoing_task.abort();
            }
        }

        self.remove_connection(&connection_id).await;
        Ok(())
    }
}

/// Messages sent to a new subscriber before any live update.
pub(crate) fn greeting(connection_id: Uuid, snapshot: Vec<HealthCheckResult>) -> [WebSocketMessage; 2] {
    [
        WebSocketMessage::Connected { connection_id },
        WebSocketMessage::from(WebSocketEvent::Snapshot(snapshot)),
    ]
}

#[async_trait::async_trait]
impl Broadcaster for WebSocketManager {
    async fn publish(&self, result: &HealthCheckResult) {
        let report = self.broadcast(WebSocketEvent::HealthUpdate(result.clone())).await;
        debug!(
            "Published {} update: {} delivered, {} skipped, {} removed",
            result.application_name, report.delivered, report.skipped, report.removed
        );
    }
}
