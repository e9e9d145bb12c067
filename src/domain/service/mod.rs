// src/domain/service/mod.rs
// Domain service interfaces. Each one is a seam where a real
// implementation can replace the default without touching the pipeline.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::domain::errors::{DecisionResult, ExchangeResult};
use crate::domain::model::{
    Action, Candle, InstrumentSnapshot, MarketRegime, MarketStructure, OrderBook, Position,
    ProtectionStatus, TemporalPatterns, Timeframe, TradingDecision, VolatilityMetrics,
};

pub type CandleSeries = BTreeMap<Timeframe, Vec<Candle>>;

/// Per-instrument derived metrics
pub trait InstrumentAnalysisService: Send + Sync {
    fn volatility(&self, candles: &CandleSeries) -> VolatilityMetrics;

    fn market_structure(&self, candles: &CandleSeries, book: &OrderBook) -> MarketStructure;

    fn temporal_patterns(&self, candles: &CandleSeries) -> TemporalPatterns;
}

/// Cross-instrument aggregates, computed after every instrument is fetched
pub trait MarketAnalysisService: Send + Sync {
    fn market_regime(&self, instruments: &BTreeMap<String, InstrumentSnapshot>) -> MarketRegime;

    fn correlations(&self, instruments: &BTreeMap<String, InstrumentSnapshot>) -> serde_json::Value;

    /// 0..100
    fn risk_appetite(&self, instruments: &BTreeMap<String, InstrumentSnapshot>) -> f64;

    fn liquidity_conditions(&self, instruments: &BTreeMap<String, InstrumentSnapshot>) -> String;

    fn volatility_regime(&self, instruments: &BTreeMap<String, InstrumentSnapshot>) -> String;
}

/// Account risk indices
pub trait AccountAnalysisService: Send + Sync {
    fn leverage_usage(&self, total_equity: Decimal, positions: &[Position]) -> f64;

    fn margin_health(&self, positions: &[Position]) -> String;

    fn concentration_risk(&self, positions: &[Position]) -> String;
}

#[derive(Debug, Clone)]
pub struct ProtectionRequest<'a> {
    pub order_id: &'a str,
    pub inst_id: &'a str,
    pub action: Action,
    pub risk_parameters: &'a str,
}

/// Stop-loss / take-profit attachment after a directional fill
#[async_trait]
pub trait ProtectiveOrderService: Send + Sync {
    async fn protect(&self, request: ProtectionRequest<'_>) -> ExchangeResult<ProtectionStatus>;
}

#[derive(Debug, Clone)]
pub struct StrategyRequest<'a> {
    pub coin: &'a str,
    pub inst_id: &'a str,
    pub position_value: Decimal,
    pub decision: &'a TradingDecision,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StrategyResult {
    NotImplemented,
    Executed { reference: String },
}

/// Executor for HEDGE, ARBITRAGE and MARKET_MAKE decisions
#[async_trait]
pub trait StrategyExecutionService: Send + Sync {
    async fn execute(&self, request: StrategyRequest<'_>) -> ExchangeResult<StrategyResult>;
}

/// Rendered request for the decision service
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionPrompt {
    pub system: String,
    pub user: String,
    /// Schema description the response must follow
    pub schema: String,
}

/// Transport to the external reasoning service. Returns the raw message
/// content, which is expected to be the decision JSON document.
#[async_trait]
pub trait DecisionService: Send + Sync {
    async fn request_decision(&self, prompt: &DecisionPrompt) -> DecisionResult<String>;
}

/// Clock and sleep, injectable so cycle timing is testable without waiting
#[async_trait]
pub trait Scheduler: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    async fn sleep(&self, duration: Duration);
}
