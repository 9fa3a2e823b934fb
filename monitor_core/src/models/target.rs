//! Monitored application definitions

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

pub const DEFAULT_EXPECTED_RESPONSE_CODE: u16 = 200;
pub const DEFAULT_METHOD: &str = "GET";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Tag selecting which probe strategy handles a target.
///
/// Unrecognised tags are kept verbatim so that a misconfigured target
/// surfaces as a configuration error at check time instead of failing the
/// whole targets file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ApplicationType {
    Http,
    Database,
    Other(String),
}

impl From<String> for ApplicationType {
    fn from(tag: String) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "http" | "https" => ApplicationType::Http,
            "db" | "database" => ApplicationType::Database,
            _ => ApplicationType::Other(tag),
        }
    }
}

impl From<&str> for ApplicationType {
    fn from(tag: &str) -> Self {
        ApplicationType::from(tag.to_string())
    }
}

impl From<ApplicationType> for String {
    fn from(application_type: ApplicationType) -> Self {
        application_type.to_string()
    }
}

impl std::fmt::Display for ApplicationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApplicationType::Http => write!(f, "HTTP"),
            ApplicationType::Database => write!(f, "DB"),
            ApplicationType::Other(tag) => write!(f, "{}", tag),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApplicationTarget {
    pub name: String,
    #[serde(rename = "Type")]
    pub application_type: ApplicationType,
    #[serde(default)]
    pub target: String,
    #[serde(default = "default_expected_response_code")]
    pub expected_response_code: u16,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub request_body: Option<String>,
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub degraded_threshold_ms: Option<u64>,
}

fn default_expected_response_code() -> u16 {
    DEFAULT_EXPECTED_RESPONSE_CODE
}

fn default_method() -> String {
    DEFAULT_METHOD.to_string()
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

impl ApplicationTarget {
    pub fn new(
        name: impl Into<String>,
        application_type: impl Into<ApplicationType>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            application_type: application_type.into(),
            target: target.into(),
            expected_response_code: DEFAULT_EXPECTED_RESPONSE_CODE,
            method: DEFAULT_METHOD.to_string(),
            request_body: None,
            headers: None,
            query: None,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            degraded_threshold_ms: None,
        }
    }

    pub fn http(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new(name, ApplicationType::Http, url)
    }

    pub fn database(
        name: impl Into<String>,
        connection: impl Into<String>,
        query: impl Into<String>,
    ) -> Self {
        Self::new(name, ApplicationType::Database, connection).with_query(query)
    }

    pub fn with_expected_response_code(mut self, code: u16) -> Self {
        self.expected_response_code = code;
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.request_body = Some(body.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_timeout_seconds(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    pub fn with_degraded_threshold_ms(mut self, threshold_ms: u64) -> Self {
        self.degraded_threshold_ms = Some(threshold_ms);
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TargetsFile {
    #[serde(default)]
    pub applications: Vec<ApplicationTarget>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_application_type_parsing() {
        assert_eq!(ApplicationType::from("HTTP"), ApplicationType::Http);
        assert_eq!(ApplicationType::from("http"), ApplicationType::Http);
        assert_eq!(ApplicationType::from("DB"), ApplicationType::Database);
        assert_eq!(ApplicationType::from("database"), ApplicationType::Database);
        assert_eq!(
            ApplicationType::from("unregistered-type"),
            ApplicationType::Other("unregistered-type".to_string())
        );
    }

    #[test]
    fn test_application_type_display_keeps_unknown_tag() {
        assert_eq!(ApplicationType::Http.to_string(), "HTTP");
        assert_eq!(ApplicationType::Database.to_string(), "DB");
        assert_eq!(ApplicationType::from("grpc").to_string(), "grpc");
    }

    #[test]
    fn test_target_defaults_from_json() {
        let json = r#"{ "Name": "api", "Type": "HTTP", "Target": "http://x/health" }"#;
        let target: ApplicationTarget = serde_json::from_str(json).unwrap();

        assert_eq!(target.name, "api");
        assert_eq!(target.application_type, ApplicationType::Http);
        assert_eq!(target.expected_response_code, 200);
        assert_eq!(target.method, "GET");
        assert_eq!(target.timeout_seconds, 30);
        assert!(target.headers.is_none());
        assert!(target.query.is_none());
    }

    #[test]
    fn test_targets_file_parsing() {
        let json = r#"{
            "Applications": [
                { "Name": "api", "Type": "HTTP", "Target": "http://x/health", "ExpectedResponseCode": 204,
                  "Method": "POST", "RequestBody": "{}", "Headers": { "X-Probe": "1" }, "TimeoutSeconds": 5 },
                { "Name": "db1", "Type": "DB", "Target": "sqlite::memory:", "Query": "SELECT 1" }
            ]
        }"#;
        let file: TargetsFile = serde_json::from_str(json).unwrap();

        assert_eq!(file.applications.len(), 2);
        let api = &file.applications[0];
        assert_eq!(api.expected_response_code, 204);
        assert_eq!(api.method, "POST");
        assert_eq!(api.timeout(), Duration::from_secs(5));
        assert_eq!(api.headers.as_ref().unwrap()["X-Probe"], "1");

        let db = &file.applications[1];
        assert_eq!(db.application_type, ApplicationType::Database);
        assert_eq!(db.query.as_deref(), Some("SELECT 1"));
    }

    #[test]
    fn test_builder_helpers() {
        let target = ApplicationTarget::http("api", "http://x/health")
            .with_method("PUT")
            .with_body("payload")
            .with_header("Content-Type", "text/plain")
            .with_expected_response_code(201)
            .with_timeout_seconds(2);

        assert_eq!(target.method, "PUT");
        assert_eq!(target.request_body.as_deref(), Some("payload"));
        assert_eq!(target.expected_response_code, 201);
        assert_eq!(target.timeout(), Duration::from_secs(2));
    }
}
