pub mod decision_usecase;
pub mod execution_usecase;
pub mod snapshot_usecase;
pub mod validation_usecase;

// Re-export public API
pub use decision_usecase::{Consultation, DecisionConsultant, DecisionConsultationUseCase};
pub use execution_usecase::{ExecutionEngine, ExecutionUseCase, Sizing};
pub use snapshot_usecase::{MarketSnapshotBuilder, MarketSnapshotUseCase, SnapshotSettings};
pub use validation_usecase::DecisionValidator;
