// src/domain/model/mod.rs
// Core domain models

pub mod audit;
pub mod decision;
pub mod execution;
pub mod market;

pub use audit::{CycleRecord, MarketConditions, PortfolioImpact};
pub use decision::{
    Action, AutonomousDecision, DecisionSource, InstrumentDecision, PortfolioDecision,
    RawAutonomousDecision, RawPortfolioStrategy, RawTradingDecision, Rejection, RejectionReason,
    StrategyAllocation, TradingDecision,
};
pub use execution::{
    ExecutionOutcome, FailureReason, OrderAck, OrderRequest, OrderSide, OrderType, OutcomeStatus,
    PositionSide, ProtectionStatus, SkipReason,
};
pub use market::{
    AccountHealth, AccountStatus, BookLevel, Candle, FundingRate, InstrumentSnapshot, MarginMode,
    MarketRegime, MarketStructure, MarketUniverse, OrderBook, OrderRecord, PortfolioSnapshot,
    Position, TemporalPatterns, Timeframe, TradePrint, TradeSide, VolatilityMetrics,
};
