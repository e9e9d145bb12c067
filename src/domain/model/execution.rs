// src/domain/model/execution.rs
// Exchange order models and per-instrument execution outcomes

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::decision::{Action, TradingDecision};
use super::market::MarginMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSide::Buy => "buy",
            OrderSide::Sell => "sell",
        }
    }

    pub fn for_action(action: Action) -> Option<Self> {
        match action {
            Action::Long => Some(OrderSide::Buy),
            Action::Short => Some(OrderSide::Sell),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    Net,
    Long,
    Short,
}

impl PositionSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionSide::Net => "net",
            PositionSide::Long => "long",
            PositionSide::Short => "short",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OrderType {
    Market,
    Limit(Decimal),
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OrderType::Market => write!(f, "market"),
            OrderType::Limit(_) => write!(f, "limit"),
        }
    }
}

/// Order handed to the trading capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub inst_id: String,
    pub side: OrderSide,
    pub margin_mode: MarginMode,
    pub position_side: PositionSide,
    pub order_type: OrderType,
    pub size: Decimal,
    pub leverage: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAck {
    pub order_id: String,
    pub client_order_id: Option<String>,
}

/// Result of attaching stop-loss/take-profit protection to a fresh order.
/// A failure here is a warning; the order itself stands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ProtectionStatus {
    Placed(String),
    Deferred,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    ByDecision,
    BelowThreshold,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureReason {
    LeverageRejected(String),
    OrderRejected(String),
    StrategyFailed(String),
    InvalidSizing(String),
    /// A collaborator panicked while this instrument was being processed
    Panicked(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FailureReason::LeverageRejected(msg) => write!(f, "leverage rejected: {}", msg),
            FailureReason::OrderRejected(msg) => write!(f, "order rejected: {}", msg),
            FailureReason::StrategyFailed(msg) => write!(f, "strategy failed: {}", msg),
            FailureReason::InvalidSizing(msg) => write!(f, "invalid sizing: {}", msg),
            FailureReason::Panicked(msg) => write!(f, "panicked: {}", msg),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    Executed {
        order_id: String,
        /// Notional exposure: equity * position_size * leverage
        position_value: Decimal,
        /// Size placed on the order: position_value / leverage
        margin: Decimal,
        protection: ProtectionStatus,
    },
    /// A non-directional strategy that has no implementation yet
    NotImplemented { strategy: Action },
    /// A non-directional strategy executor acted and returned a reference
    StrategyExecuted { reference: String, position_value: Decimal },
    Skipped { reason: SkipReason },
    Failed { reason: FailureReason },
}

/// What happened to one instrument in one cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub coin: String,
    pub inst_id: String,
    pub decision: TradingDecision,
    pub status: OutcomeStatus,
    pub timestamp: DateTime<Utc>,
}

impl ExecutionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self.status,
            OutcomeStatus::Executed { .. } | OutcomeStatus::StrategyExecuted { .. }
        )
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.status, OutcomeStatus::Failed { .. })
    }

    /// True when the engine got as far as talking to the exchange
    pub fn was_attempted(&self) -> bool {
        !matches!(self.status, OutcomeStatus::Skipped { .. })
    }

    pub fn order_id(&self) -> Option<&str> {
        match &self.status {
            OutcomeStatus::Executed { order_id, .. } => Some(order_id),
            _ => None,
        }
    }
}
