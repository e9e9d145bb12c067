// src/adapter/mod.rs
// Drives the use cases: the cycle loop and its clock

pub mod coordinator;
pub mod scheduler;

pub use coordinator::{CycleOrchestrator, CyclePhase, CycleReport, CycleTimings, OrchestratorState};
pub use scheduler::{ManualScheduler, TokioScheduler};
