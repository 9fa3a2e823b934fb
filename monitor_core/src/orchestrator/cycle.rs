//! One pass over every configured target

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinError;
use tracing::{error, info, warn};

use crate::models::{ApplicationTarget, HealthCheckResult, HealthStatus};
use crate::probes::StrategyRegistry;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleSummary {
    pub checked: usize,
    pub healthy: usize,
    pub degraded: usize,
    pub unhealthy: usize,
    /// Targets not started because the orchestrator was stopping, plus
    /// results dropped because a restart happened before they arrived.
    pub skipped: usize,
    pub duration_ms: u64,
}

impl CycleSummary {
    pub(crate) fn record(&mut self, result: &HealthCheckResult) {
        self.checked += 1;
        match result.status {
            HealthStatus::Healthy => self.healthy += 1,
            HealthStatus::Degraded => self.degraded += 1,
            HealthStatus::Unhealthy | HealthStatus::Unknown => self.unhealthy += 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CycleStats {
    pub cycles_started: u64,
    pub cycles_completed: u64,
    pub last_cycle_started_at: Option<DateTime<Utc>>,
    pub last_cycle_finished_at: Option<DateTime<Utc>>,
    pub last_summary: Option<CycleSummary>,
    pub configured_targets: usize,
}

#[derive(Clone, Default)]
pub(crate) struct CycleStatsRecorder {
    cycles_started: Arc<AtomicU64>,
    cycles_completed: Arc<AtomicU64>,
    last_cycle_started_at: Arc<RwLock<Option<DateTime<Utc>>>>,
    last_cycle_finished_at: Arc<RwLock<Option<DateTime<Utc>>>>,
    last_summary: Arc<RwLock<Option<CycleSummary>>>,
}

impl CycleStatsRecorder {
    pub(crate) fn cycle_started(&self) {
        self.cycles_started.fetch_add(1, Ordering::Relaxed);
        *self.last_cycle_started_at.write() = Some(Utc::now());
    }

    pub(crate) fn cycle_completed(&self, summary: &CycleSummary) {
        self.cycles_completed.fetch_add(1, Ordering::Relaxed);
        *self.last_cycle_finished_at.write() = Some(Utc::now());
        *self.last_summary.write() = Some(summary.clone());
    }

    pub(crate) fn snapshot(&self, configured_targets: usize) -> CycleStats {
        CycleStats {
            cycles_started: self.cycles_started.load(Ordering::Relaxed),
            cycles_completed: self.cycles_completed.load(Ordering::Relaxed),
            last_cycle_started_at: *self.last_cycle_started_at.read(),
            last_cycle_finished_at: *self.last_cycle_finished_at.read(),
            last_summary: self.last_summary.read().clone(),
            configured_targets,
        }
    }
}

/// Resolves the probe for `target` and runs it.
///
/// A target whose type has no registered probe gets an `Unhealthy` result
/// without any probe being invoked.
pub async fn check_target(registry: &StrategyRegistry, target: &ApplicationTarget) -> HealthCheckResult {
    match registry.resolve(&target.application_type) {
        Some(strategy) => {
            info!(
                "Checking health for {} ({})",
                target.name, target.application_type
            );
            strategy.probe(target).await
        }
        None => {
            warn!(
                "No probe registered for type {} (application: {})",
                target.application_type, target.name
            );
            HealthCheckResult::unhealthy(
                &target.name,
                format!(
                    "Configuration error: No health check service registered for type '{}' (application '{}').",
                    target.application_type, target.name
                ),
                Duration::ZERO,
            )
        }
    }
}

pub(crate) fn failed_check(name: &str, err: JoinError, elapsed: Duration) -> HealthCheckResult {
    let reason = if err.is_panic() {
        let payload = err.into_panic();
        if let Some(message) = payload.downcast_ref::<&str>() {
            message.to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "health check panicked".to_string()
        }
    } else {
        "health check was cancelled".to_string()
    };

    error!("Error during health check for {}: {}", name, reason);
    HealthCheckResult::unhealthy(name, format!("Orchestrator error: {}", reason), elapsed)
}

pub(crate) fn log_outcome(result: &HealthCheckResult) {
    let message = result.error_message.as_deref().unwrap_or_default();
    match result.status {
        HealthStatus::Healthy => info!(
            "Health check for {} completed: {} in {}ms",
            result.application_name, result.status, result.response_time_ms
        ),
        HealthStatus::Degraded | HealthStatus::Unknown => warn!(
            "Health check for {} completed: {} in {}ms: {}",
            result.application_name, result.status, result.response_time_ms, message
        ),
        HealthStatus::Unhealthy => error!(
            "Health check for {} completed: {} in {}ms: {}",
            result.application_name, result.status, result.response_time_ms, message
        ),
    }
}
