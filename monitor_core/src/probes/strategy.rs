use crate::models::{ApplicationTarget, ApplicationType, HealthCheckResult};

/// One type-specific procedure for checking an application.
///
/// Implementations must not panic or return early without a result: every
/// failure is reported as an `Unhealthy` result carrying the reason, with
/// the latency and timestamp still filled in.
#[async_trait::async_trait]
pub trait ProbeStrategy: Send + Sync {
    fn application_type(&self) -> ApplicationType;

    async fn probe(&self, target: &ApplicationTarget) -> HealthCheckResult;

    fn name(&self) -> &str;
}
