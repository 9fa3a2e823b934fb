//! Fan-out of health check results to observers

use crate::models::HealthCheckResult;

/// Delivers a result to every current subscriber.
///
/// Implementations must return promptly: a subscriber that cannot accept
/// the result right now is skipped, and a subscriber that has gone away is
/// dropped. Nothing is replayed to subscribers that join later.
#[async_trait::async_trait]
pub trait Broadcaster: Send + Sync {
    async fn publish(&self, result: &HealthCheckResult);
}
