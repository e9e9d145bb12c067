// src/domain/model/audit.rs
// Append-only cycle audit records

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::decision::AutonomousDecision;
use super::execution::ExecutionOutcome;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioImpact {
    /// Sum of position_size over successful trades
    pub total_investment_ratio: Decimal,
    pub diversification_score: f64,
    /// Mean leverage of successful trades, 0 when there were none
    pub leverage_impact: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketConditions {
    pub timestamp: DateTime<Utc>,
    pub total_equity: Decimal,
    pub active_positions: Option<usize>,
    pub market_volatility: String,
}

/// One entry per completed cycle, success or failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleRecord {
    pub cycle: u64,
    pub timestamp: DateTime<Utc>,
    pub decision: AutonomousDecision,
    pub outcomes: Vec<ExecutionOutcome>,
    pub impact: PortfolioImpact,
    pub conditions: MarketConditions,
}

impl CycleRecord {
    pub fn executed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failure()).count()
    }
}
