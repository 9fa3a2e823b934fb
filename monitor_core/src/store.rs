//! Latest health check result per application

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::models::{ApplicationTarget, HealthCheckResult};

/// Cloneable handle to the shared status map.
///
/// Every write replaces the whole entry for a name, so readers see either
/// the previous result or the new one, never a mix.
#[derive(Clone, Default)]
pub struct StatusStore {
    results: Arc<RwLock<HashMap<String, HealthCheckResult>>>,
}

impl StatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, name: impl Into<String>, result: HealthCheckResult) {
        self.results.write().insert(name.into(), result);
    }

    pub fn get(&self, name: &str) -> Option<HealthCheckResult> {
        self.results.read().get(name).cloned()
    }

    /// Snapshot of every entry, ordered by application name.
    pub fn get_all(&self) -> Vec<HealthCheckResult> {
        let mut all: Vec<HealthCheckResult> = self.results.read().values().cloned().collect();
        all.sort_by(|a, b| a.application_name.cmp(&b.application_name));
        all
    }

    /// Resets every target to `Unknown` ahead of its first check.
    pub fn seed_unknown(&self, targets: &[ApplicationTarget]) {
        let mut results = self.results.write();
        for target in targets {
            results.insert(target.name.clone(), HealthCheckResult::unknown(&target.name));
        }
    }

    pub fn clear(&self) {
        self.results.write().clear();
    }

    pub fn len(&self) -> usize {
        self.results.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HealthStatus;
    use std::time::Duration;

    #[test]
    fn test_seed_unknown_creates_one_entry_per_target() {
        let store = StatusStore::new();
        let targets = vec![
            ApplicationTarget::http("api", "http://x/health"),
            ApplicationTarget::database("db1", "sqlite::memory:", "SELECT 1"),
        ];

        store.seed_unknown(&targets);

        let all = store.get_all();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|r| r.status == HealthStatus::Unknown));
        assert_eq!(all[0].application_name, "api");
        assert_eq!(all[1].application_name, "db1");
    }

    #[test]
    fn test_duplicate_names_collapse_to_one_entry() {
        let store = StatusStore::new();
        let targets = vec![
            ApplicationTarget::http("api", "http://a"),
            ApplicationTarget::http("api", "http://b"),
        ];

        store.seed_unknown(&targets);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_set_replaces_previous_result() {
        let store = StatusStore::new();
        store.set("api", HealthCheckResult::unknown("api"));
        store.set("api", HealthCheckResult::unhealthy("api", "down", Duration::from_millis(3)));

        let current = store.get("api").unwrap();
        assert_eq!(current.status, HealthStatus::Unhealthy);
        assert_eq!(current.error_message.as_deref(), Some("down"));
        assert_eq!(store.len(), 1);
        assert!(store.get("missing").is_none());
    }

    #[test]
    fn test_concurrent_writers_and_readers() {
        let store = StatusStore::new();
        let mut handles = Vec::new();

        for worker in 0..8 {
            let store = store.clone();
            handles.push(std::thread::spawn(move || {
                for round in 0..100 {
                    let name = format!("app-{}", worker);
                    store.set(&name, HealthCheckResult::healthy(&name, Duration::from_millis(round)));
                    store.set("shared", HealthCheckResult::healthy("shared", Duration::from_millis(round)));
                    let snapshot = store.get_all();
                    assert!(snapshot.iter().all(|r| r.error_message.is_none()));
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 9);
        assert!(store.get("shared").is_some());
    }
}
