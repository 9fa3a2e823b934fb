use parking_lot::RwLock;
use std::sync::Arc;
use tracing::info;

use crate::error::Result;
use crate::models::ApplicationType;
use super::{database::DatabaseProbe, http::HttpProbe, strategy::ProbeStrategy};

/// Maps application type tags to the probe that handles them.
///
/// Lookups scan in registration order and the first match wins. Registering
/// a second strategy for a type that is already covered is allowed; it will
/// simply never be selected.
#[derive(Clone, Default)]
pub struct StrategyRegistry {
    strategies: Arc<RwLock<Vec<Arc<dyn ProbeStrategy>>>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Result<Self> {
        let registry = Self::new();
        registry.register(HttpProbe::new()?);
        registry.register(DatabaseProbe::new());
        Ok(registry)
    }

    pub fn register<S: ProbeStrategy + 'static>(&self, strategy: S) {
        self.register_arc(Arc::new(strategy));
    }

    pub fn register_arc(&self, strategy: Arc<dyn ProbeStrategy>) {
        info!(
            "Registered '{}' probe for application type {}",
            strategy.name(),
            strategy.application_type()
        );
        self.strategies.write().push(strategy);
    }

    pub fn resolve(&self, application_type: &ApplicationType) -> Option<Arc<dyn ProbeStrategy>> {
        self.strategies
            .read()
            .iter()
            .find(|strategy| strategy.application_type() == *application_type)
            .cloned()
    }

    pub fn registered_types(&self) -> Vec<ApplicationType> {
        self.strategies
            .read()
            .iter()
            .map(|strategy| strategy.application_type())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.strategies.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.read().is_empty()
    }
}
