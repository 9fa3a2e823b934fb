//! Data models shared across the monitor

pub mod request;
pub mod result;
pub mod target;

pub use request::ApiResponse;
pub use result::{HealthCheckResult, HealthStatus};
pub use target::{ApplicationTarget, ApplicationType, TargetsFile};
