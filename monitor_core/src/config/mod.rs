pub mod settings;
pub mod targets;

pub use settings::{AppConfig, MonitorConfig, ServerConfig, WebSocketConfig};
pub use targets::{load_targets, try_load_targets};
