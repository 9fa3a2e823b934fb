//! Probe for applications backed by a SQL database

use sqlx::{Connection, SqliteConnection};
use std::time::{Duration, Instant};
use tokio::time::timeout_at;
use tracing::debug;

use crate::models::{ApplicationTarget, ApplicationType, HealthCheckResult};
use super::strategy::ProbeStrategy;

#[derive(Debug, Clone, Copy)]
enum Phase {
    Connecting,
    ExecutingQuery,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Connecting => write!(f, "connecting"),
            Phase::ExecutingQuery => write!(f, "executing query"),
        }
    }
}

/// Opens a connection from the target's connection string and runs the
/// configured query. The connection and the query share one deadline.
#[derive(Debug, Clone, Default)]
pub struct DatabaseProbe;

impl DatabaseProbe {
    pub fn new() -> Self {
        Self
    }

    fn timed_out(target: &ApplicationTarget, phase: Phase, elapsed: Duration) -> HealthCheckResult {
        HealthCheckResult::unhealthy(
            &target.name,
            format!(
                "Database check timed out after {} seconds while {}.",
                target.timeout_seconds, phase
            ),
            elapsed,
        )
    }
}

#[async_trait::async_trait]
impl ProbeStrategy for DatabaseProbe {
    fn application_type(&self) -> ApplicationType {
        ApplicationType::Database
    }

    async fn probe(&self, target: &ApplicationTarget) -> HealthCheckResult {
        let start = Instant::now();

        if target.target.trim().is_empty() {
            return HealthCheckResult::unhealthy(
                &target.name,
                "Database connection string (Target) is missing.",
                start.elapsed(),
            );
        }

        let query = match target.query.as_deref().map(str::trim) {
            Some(query) if !query.is_empty() => query,
            _ => {
                return HealthCheckResult::unhealthy(
                    &target.name,
                    "Database query is missing.",
                    start.elapsed(),
                );
            }
        };

        let deadline = tokio::time::Instant::now() + target.timeout();

        debug!("Connecting to database for application {}", target.name);
        let mut conn = match timeout_at(deadline, SqliteConnection::connect(&target.target)).await {
            Ok(Ok(conn)) => conn,
            Ok(Err(e)) => {
                return HealthCheckResult::unhealthy(
                    &target.name,
                    format!("Database connection failed: {}", e),
                    start.elapsed(),
                );
            }
            Err(_) => return Self::timed_out(target, Phase::Connecting, start.elapsed()),
        };

        let outcome = timeout_at(deadline, sqlx::query(query).execute(&mut conn)).await;
        let elapsed = start.elapsed();

        let executed = match outcome {
            Ok(executed) => executed,
            Err(_) => {
                // close() would wait for the running statement.
                drop(conn);
                return Self::timed_out(target, Phase::ExecutingQuery, elapsed);
            }
        };

        if let Err(e) = conn.close().await {
            debug!("Failed to close database connection for {}: {}", target.name, e);
        }

        match executed {
            Ok(_) => HealthCheckResult::success(&target.name, elapsed, target.degraded_threshold_ms),
            Err(e) => HealthCheckResult::unhealthy(
                &target.name,
                format!("Database query failed: {}", e),
                elapsed,
            ),
        }
    }

    fn name(&self) -> &str {
        "database"
    }
}
