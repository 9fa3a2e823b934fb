pub mod cycle;
pub mod scheduler;


pub use cycle::{check_target, CycleStats, CycleSummary};
pub use scheduler::{Orchestrator, OrchestratorSettings, OrchestratorState};
