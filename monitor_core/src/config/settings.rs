use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub monitor: MonitorConfig,
    pub websocket: WebSocketConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_seconds: u64,
    /// Origins allowed to call the API from a browser. Empty allows any origin.
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub check_interval_seconds: u64,
    pub initial_delay_seconds: u64,
    pub targets_file: PathBuf,
    pub max_concurrent_checks: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebSocketConfig {
    pub max_connections: usize,
    pub message_buffer_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            shutdown_timeout_seconds: 10,
            cors_origins: Vec::new(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            check_interval_seconds: 30,
            initial_delay_seconds: 5,
            targets_file: PathBuf::from("healthcheckconfig.json"),
            max_concurrent_checks: 16,
        }
    }
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            max_connections: 1000,
            message_buffer_size: 64,
        }
    }
}

impl MonitorConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_seconds)
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs(self.initial_delay_seconds)
    }
}

impl AppConfig {
    /// Defaults, then `config.toml` when present, then `APP_` environment
    /// variables such as `APP_MONITOR__CHECK_INTERVAL_SECONDS=10`.
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?);

        if std::path::Path::new("config.toml").exists() {
            builder = builder.add_source(File::with_name("config"));
        }

        builder = builder.add_source(
            Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let app_config: AppConfig = config.try_deserialize()?;

        app_config.validate()?;

        Ok(app_config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message("Server port cannot be 0".to_string()));
        }

        if self.monitor.check_interval_seconds == 0 {
            return Err(ConfigError::Message(
                "Check interval must be greater than 0".to_string(),
            ));
        }

        if self.monitor.max_concurrent_checks == 0 {
            return Err(ConfigError::Message(
                "Max concurrent checks must be greater than 0".to_string(),
            ));
        }

        if self.monitor.targets_file.as_os_str().is_empty() {
            return Err(ConfigError::Message(
                "Targets file path cannot be empty".to_string(),
            ));
        }

        if self.websocket.max_connections == 0 {
            return Err(ConfigError::Message(
                "WebSocket max connections must be greater than 0".to_string(),
            ));
        }

        if self.websocket.message_buffer_size == 0 {
            return Err(ConfigError::Message(
                "WebSocket message buffer size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
