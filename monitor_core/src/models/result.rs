//! Health check outcomes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const AWAITING_FIRST_CHECK: &str = "No health check has completed yet.";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum HealthStatus {
    Unknown,
    Healthy,
    Unhealthy,
    Degraded,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Unknown => write!(f, "unknown"),
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Unhealthy => write!(f, "unhealthy"),
            HealthStatus::Degraded => write!(f, "degraded"),
        }
    }
}

/// One probe outcome for one application.
///
/// `error_message` is `Some` exactly when `status` is not `Healthy`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthCheckResult {
    pub application_name: String,
    pub status: HealthStatus,
    pub response_time_ms: u64,
    pub last_checked_utc: DateTime<Utc>,
    pub error_message: Option<String>,
}

impl HealthCheckResult {
    pub fn unknown(application_name: impl Into<String>) -> Self {
        Self {
            application_name: application_name.into(),
            status: HealthStatus::Unknown,
            response_time_ms: 0,
            last_checked_utc: Utc::now(),
            error_message: Some(AWAITING_FIRST_CHECK.to_string()),
        }
    }

    pub fn healthy(application_name: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            application_name: application_name.into(),
            status: HealthStatus::Healthy,
            response_time_ms: duration_to_ms(elapsed),
            last_checked_utc: Utc::now(),
            error_message: None,
        }
    }

    pub fn degraded(
        application_name: impl Into<String>,
        message: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            application_name: application_name.into(),
            status: HealthStatus::Degraded,
            response_time_ms: duration_to_ms(elapsed),
            last_checked_utc: Utc::now(),
            error_message: Some(message.into()),
        }
    }

    pub fn unhealthy(
        application_name: impl Into<String>,
        message: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            application_name: application_name.into(),
            status: HealthStatus::Unhealthy,
            response_time_ms: duration_to_ms(elapsed),
            last_checked_utc: Utc::now(),
            error_message: Some(message.into()),
        }
    }

    /// Healthy, unless the observed latency is above the optional threshold.
    pub fn success(
        application_name: impl Into<String>,
        elapsed: Duration,
        degraded_threshold_ms: Option<u64>,
    ) -> Self {
        let elapsed_ms = duration_to_ms(elapsed);
        match degraded_threshold_ms {
            Some(threshold) if elapsed_ms > threshold => Self::degraded(
                application_name,
                format!(
                    "Response time {}ms exceeded degraded threshold of {}ms.",
                    elapsed_ms, threshold
                ),
                elapsed,
            ),
            _ => Self::healthy(application_name, elapsed),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

fn duration_to_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
