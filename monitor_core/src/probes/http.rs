//! Probe for applications reachable over HTTP

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method};
use std::time::Instant;
use tracing::{debug, warn};

use crate::error::{AppError, Result};
use crate::models::{ApplicationTarget, ApplicationType, HealthCheckResult};
use super::strategy::ProbeStrategy;

const BODY_SNIPPET_CHARS: usize = 512;
const DEFAULT_CONTENT_TYPE: &str = "application/json";

#[derive(Clone)]
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("monitor/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(client))
    }

    /// Uses a caller-configured client, e.g. one with proxies or custom TLS roots.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn build_headers(target: &ApplicationTarget) -> HeaderMap {
        let mut headers = HeaderMap::new();

        if let Some(configured) = &target.headers {
            for (name, value) in configured {
                match (
                    HeaderName::from_bytes(name.as_bytes()),
                    HeaderValue::from_str(value),
                ) {
                    (Ok(name), Ok(value)) => {
                        headers.insert(name, value);
                    }
                    _ => {
                        warn!("Skipping invalid header '{}' for application {}", name, target.name);
                    }
                }
            }
        }

        headers
    }

    fn carries_body(method: &Method) -> bool {
        *method == Method::POST || *method == Method::PUT || *method == Method::PATCH
    }
}

#[async_trait::async_trait]
impl ProbeStrategy for HttpProbe {
    fn application_type(&self) -> ApplicationType {
        ApplicationType::Http
    }

    async fn probe(&self, target: &ApplicationTarget) -> HealthCheckResult {
        let start = Instant::now();

        if target.target.trim().is_empty() {
            return HealthCheckResult::unhealthy(
                &target.name,
                "HTTP target URL is missing.",
                start.elapsed(),
            );
        }

        let method = match Method::from_bytes(target.method.trim().to_ascii_uppercase().as_bytes()) {
            Ok(method) => method,
            Err(_) => {
                return HealthCheckResult::unhealthy(
                    &target.name,
                    format!("Invalid HTTP method '{}'.", target.method),
                    start.elapsed(),
                );
            }
        };

        let headers = Self::build_headers(target);
        let mut request = self
            .client
            .request(method.clone(), target.target.as_str())
            .timeout(target.timeout());

        if let Some(body) = target.request_body.as_deref().filter(|b| !b.is_empty()) {
            if Self::carries_body(&method) {
                if !headers.contains_key(CONTENT_TYPE) {
                    request = request.header(CONTENT_TYPE, DEFAULT_CONTENT_TYPE);
                }
                request = request.body(body.to_string());
            }
        }
        let request = request.headers(headers);

        debug!("Sending {} {} for application {}", method, target.target, target.name);

        let start = Instant::now();
        let outcome = request.send().await;
        let elapsed = start.elapsed();

        match outcome {
            Ok(response) => {
                let status = response.status();
                if status.as_u16() == target.expected_response_code {
                    return HealthCheckResult::success(
                        &target.name,
                        elapsed,
                        target.degraded_threshold_ms,
                    );
                }

                let body = match response.text().await {
                    Ok(text) => snippet(&text),
                    Err(e) => format!("<unreadable body: {}>", e),
                };

                HealthCheckResult::unhealthy(
                    &target.name,
                    format!("Unexpected status code: {}. Response: {}", status.as_u16(), body),
                    elapsed,
                )
            }
            Err(e) if e.is_timeout() => HealthCheckResult::unhealthy(
                &target.name,
                format!("Request timed out after {} seconds.", target.timeout_seconds),
                elapsed,
            ),
            Err(e) if e.is_connect() || e.is_request() || e.is_redirect() => {
                HealthCheckResult::unhealthy(
                    &target.name,
                    format!("HTTP request failed: {}", e),
                    elapsed,
                )
            }
            Err(e) => HealthCheckResult::unhealthy(
                &target.name,
                format!("An unexpected error occurred: {}", e),
                elapsed,
            ),
        }
    }

    fn name(&self) -> &str {
        "http"
    }
}

fn snippet(body: &str) -> String {
    let mut chars = body.chars();
    let head: String = chars.by_ref().take(BODY_SNIPPET_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
