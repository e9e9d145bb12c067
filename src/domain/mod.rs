// src/domain/mod.rs
pub mod errors;
pub mod model;
pub mod repository;
pub mod service;

// Re-export common types for convenience
pub use errors::{
    AppError, AppResult, AuditError, CycleError, DecisionError, ExchangeError, ExchangeResult,
    SnapshotError,
};
pub use model::{
    Action, AutonomousDecision, CycleRecord, ExecutionOutcome, MarketUniverse, OutcomeStatus,
    RawAutonomousDecision, TradingDecision,
};
