use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::HealthCheckResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum WebSocketMessage {
    HealthUpdate(HealthCheckResult),
    Snapshot(Vec<HealthCheckResult>),
    Connected { connection_id: Uuid },
    Ping,
    Pong,
    Error { message: String },
}

#[derive(Debug, Clone)]
pub enum WebSocketEvent {
    HealthUpdate(HealthCheckResult),
    Snapshot(Vec<HealthCheckResult>),
}

impl From<WebSocketEvent> for WebSocketMessage {
    fn from(event: WebSocketEvent) -> Self {
        match event {
            WebSocketEvent::HealthUpdate(result) => WebSocketMessage::HealthUpdate(result),
            WebSocketEvent::Snapshot(results) => WebSocketMessage::Snapshot(results),
        }
    }
}

impl WebSocketMessage {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
