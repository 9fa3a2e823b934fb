use futures_util::stream::{FuturesUnordered, StreamExt};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::broadcaster::Broadcaster;
use crate::config::MonitorConfig;
use crate::error::{AppError, Result};
use crate::models::{ApplicationTarget, HealthCheckResult};
use crate::probes::StrategyRegistry;
use crate::store::StatusStore;
use super::cycle::{check_target, failed_check, log_outcome, CycleStats, CycleStatsRecorder, CycleSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OrchestratorState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

impl std::fmt::Display for OrchestratorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrchestratorState::Stopped => write!(f, "stopped"),
            OrchestratorState::Starting => write!(f, "starting"),
            OrchestratorState::Running => write!(f, "running"),
            OrchestratorState::Stopping => write!(f, "stopping"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Start-to-start distance between cycles.
    pub check_interval: Duration,
    /// Delay before the first cycle after `start`.
    pub initial_delay: Duration,
    /// Upper bound on probes running at once within one cycle.
    pub max_concurrent_checks: usize,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self::from(&MonitorConfig::default())
    }
}

impl From<&MonitorConfig> for OrchestratorSettings {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            check_interval: config.check_interval(),
            initial_delay: config.initial_delay(),
            max_concurrent_checks: config.max_concurrent_checks,
        }
    }
}

/// One `start`..`stop` span. Cycles belong to the run they began in and
/// never write into a later one.
struct Run {
    generation: u64,
    shutdown: watch::Sender<bool>,
}

impl Run {
    fn new(generation: u64) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self { generation, shutdown }
    }
}

/// Drives periodic health checks over the configured targets.
///
/// Each tick spawns its cycle as a separate task, so a cycle that outlasts
/// the interval does not hold back the next one. Overlapping cycles may
/// write the same entry; whichever write lands last is kept.
pub struct Orchestrator {
    settings: OrchestratorSettings,
    registry: StrategyRegistry,
    store: StatusStore,
    broadcaster: Arc<dyn Broadcaster>,
    targets: RwLock<Arc<Vec<ApplicationTarget>>>,
    state: RwLock<OrchestratorState>,
    run: RwLock<Run>,
    scheduler: Mutex<Option<JoinHandle<()>>>,
    stats: CycleStatsRecorder,
}

impl Orchestrator {
    pub fn new(
        settings: OrchestratorSettings,
        registry: StrategyRegistry,
        store: StatusStore,
        broadcaster: Arc<dyn Broadcaster>,
    ) -> Self {
        Self {
            settings,
            registry,
            store,
            broadcaster,
            targets: RwLock::new(Arc::new(Vec::new())),
            state: RwLock::new(OrchestratorState::Stopped),
            run: RwLock::new(Run::new(0)),
            scheduler: Mutex::new(None),
            stats: CycleStatsRecorder::default(),
        }
    }

    pub fn state(&self) -> OrchestratorState {
        *self.state.read()
    }

    pub fn is_running(&self) -> bool {
        self.state() == OrchestratorState::Running
    }

    pub fn targets(&self) -> Arc<Vec<ApplicationTarget>> {
        self.targets.read().clone()
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    pub fn store(&self) -> &StatusStore {
        &self.store
    }

    pub fn current_statuses(&self) -> Vec<HealthCheckResult> {
        self.store.get_all()
    }

    pub fn stats(&self) -> CycleStats {
        self.stats.snapshot(self.targets.read().len())
    }

    /// Seeds every target as `Unknown` and begins scheduling cycles.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(self: &Arc<Self>, targets: Vec<ApplicationTarget>) -> Result<()> {
        {
            let mut state = self.state.write();
            if *state != OrchestratorState::Stopped {
                return Err(AppError::Orchestrator(format!(
                    "Cannot start orchestrator while it is {}",
                    *state
                )));
            }
            *state = OrchestratorState::Starting;
        }

        info!("Health check orchestrator starting with {} targets", targets.len());

        let shutdown = {
            let mut run = self.run.write();
            let generation = run.generation + 1;
            *run = Run::new(generation);
            self.store.clear();
            self.store.seed_unknown(&targets);
            *self.targets.write() = Arc::new(targets);
            run.shutdown.subscribe()
        };

        let handle = tokio::spawn(Arc::clone(self).run_scheduler(shutdown));
        *self.scheduler.lock() = Some(handle);

        *self.state.write() = OrchestratorState::Running;
        info!(
            "Health check orchestrator running: first cycle in {:?}, then every {:?}",
            self.settings.initial_delay, self.settings.check_interval
        );
        Ok(())
    }

    /// Stops scheduling new cycles. Cycles already in flight finish on their
    /// own but start no further targets.
    pub async fn stop(&self) {
        {
            let mut state = self.state.write();
            if *state != OrchestratorState::Running {
                debug!("Ignoring stop request while orchestrator is {}", *state);
                return;
            }
            *state = OrchestratorState::Stopping;
        }

        info!("Health check orchestrator stopping");
        self.run.read().shutdown.send_replace(true);

        let handle = self.scheduler.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("Scheduler task ended abnormally: {}", e);
            }
        }

        *self.state.write() = OrchestratorState::Stopped;
        info!("Health check orchestrator stopped");
    }

    async fn run_scheduler(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let period = self.settings.check_interval.max(Duration::from_millis(1));
        let first_tick = tokio::time::Instant::now() + self.settings.initial_delay;
        let mut interval = tokio::time::interval_at(first_tick, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if *shutdown.borrow() {
                        break;
                    }
                    info!("Executing health check cycle at {}", chrono::Utc::now());
                    let orchestrator = Arc::clone(&self);
                    tokio::spawn(async move {
                        orchestrator.run_cycle().await;
                    });
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        debug!("Scheduler loop exited");
    }

    /// Checks every configured target once, writing each result to the
    /// status store and publishing it as soon as it is available.
    pub async fn run_cycle(&self) -> CycleSummary {
        let (generation, shutdown, targets) = {
            let run = self.run.read();
            (run.generation, run.shutdown.subscribe(), self.targets())
        };
        self.stats.cycle_started();

        if targets.is_empty() {
            info!("No applications configured for health checks");
            let summary = CycleSummary::default();
            self.stats.cycle_completed(&summary);
            return summary;
        }

        info!("Running health checks for {} applications", targets.len());
        let cycle_start = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.settings.max_concurrent_checks.max(1)));
        let mut checks = FuturesUnordered::new();

        for target in targets.iter() {
            let target = target.clone();
            let name = target.name.clone();
            let registry = self.registry.clone();
            let semaphore = Arc::clone(&semaphore);
            let shutdown = shutdown.clone();

            let handle = tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                if *shutdown.borrow() {
                    return None;
                }
                Some(check_target(&registry, &target).await)
            });

            checks.push(async move {
                let started = Instant::now();
                let joined = handle.await;
                (name, joined, started.elapsed())
            });
        }

        let mut summary = CycleSummary::default();

        while let Some((name, joined, elapsed)) = checks.next().await {
            let result = match joined {
                Ok(Some(result)) => result,
                Ok(None) => {
                    debug!("Skipped health check for {}: orchestrator stopping", name);
                    summary.skipped += 1;
                    continue;
                }
                Err(e) => failed_check(&name, e, elapsed),
            };

            // Held across the write so a concurrent restart cannot reseed in between.
            let current = {
                let run = self.run.read();
                if run.generation == generation {
                    self.store.set(name.as_str(), result.clone());
                    true
                } else {
                    false
                }
            };
            if !current {
                debug!("Discarding result for {} from a previous run", name);
                summary.skipped += 1;
                continue;
            }

            log_outcome(&result);
            summary.record(&result);
            self.broadcaster.publish(&result).await;
        }

        summary.duration_ms = u64::try_from(cycle_start.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(
            "Health check cycle finished in {}ms: {} healthy, {} degraded, {} unhealthy, {} skipped",
            summary.duration_ms, summary.healthy, summary.degraded, summary.unhealthy, summary.skipped
        );
        self.stats.cycle_completed(&summary);
        summary
    }
}
