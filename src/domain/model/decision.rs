// src/domain/model/decision.rs
// Decision models: the loose document returned by the decision service and
// the typed decision that survives validation

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;

/// What the decision service wants done with one instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Long,
    Short,
    Hedge,
    Arbitrage,
    MarketMake,
    Avoid,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Long => "LONG",
            Action::Short => "SHORT",
            Action::Hedge => "HEDGE",
            Action::Arbitrage => "ARBITRAGE",
            Action::MarketMake => "MARKET_MAKE",
            Action::Avoid => "AVOID",
        }
    }

    pub fn is_directional(&self) -> bool {
        matches!(self, Action::Long | Action::Short)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace(['-', ' '], "_").as_str() {
            "LONG" => Ok(Action::Long),
            "SHORT" => Ok(Action::Short),
            "HEDGE" => Ok(Action::Hedge),
            "ARBITRAGE" => Ok(Action::Arbitrage),
            "MARKET_MAKE" => Ok(Action::MarketMake),
            "AVOID" => Ok(Action::Avoid),
            other => Err(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Raw document, exactly as the decision service returned it
// ---------------------------------------------------------------------------

/// One instrument entry before validation. Every field is optional and
/// untyped so a single bad entry never fails the whole document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTradingDecision {
    #[serde(default)]
    pub decision: Option<Value>,
    #[serde(default)]
    pub leverage: Option<Value>,
    #[serde(default)]
    pub position_size: Option<Value>,
    #[serde(default)]
    pub entry_strategy: Option<Value>,
    #[serde(default)]
    pub exit_strategy: Option<Value>,
    #[serde(default)]
    pub risk_parameters: Option<Value>,
    #[serde(default)]
    pub confidence: Option<Value>,
    #[serde(default)]
    pub rationale: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPortfolioStrategy {
    #[serde(default)]
    pub overall_exposure: Option<Value>,
    #[serde(default)]
    pub strategy_allocation: Option<Value>,
    #[serde(default)]
    pub rebalancing_schedule: Option<Value>,
}

/// The decision document. `trading_decisions` is required; a document
/// without it does not parse and the consultant falls back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawAutonomousDecision {
    #[serde(default)]
    pub market_analysis: Value,
    #[serde(default)]
    pub portfolio_strategy: Option<RawPortfolioStrategy>,
    pub trading_decisions: Map<String, Value>,
    #[serde(default)]
    pub risk_management: Value,
    #[serde(default)]
    pub execution_parameters: Value,
    #[serde(default)]
    pub learning_adaptation: Value,
}

impl RawAutonomousDecision {
    /// Hardcoded conservative decision used whenever the decision service
    /// cannot be consulted or answers with something unparseable.
    pub fn emergency() -> Self {
        let mut trading_decisions = Map::new();
        trading_decisions.insert(
            "BTC".to_string(),
            json!({
                "decision": "HEDGE",
                "leverage": 3,
                "position_size": 0.1,
                "entry_strategy": "cautious_scaling",
                "exit_strategy": "quick_exit",
                "risk_parameters": "tight_risk_control",
                "confidence": 40,
                "rationale": "conservative decision while the decision service is unavailable"
            }),
        );

        Self {
            market_analysis: json!({
                "regime_identification": "emergency_mode",
                "opportunity_assessment": "reduced_opportunity",
                "risk_landscape": "elevated_risk",
                "time_horizon": "short_term"
            }),
            portfolio_strategy: Some(RawPortfolioStrategy {
                overall_exposure: Some(json!(0.3)),
                strategy_allocation: Some(json!({
                    "directional_betting": 0.2,
                    "arbitrage_opportunities": 0.1,
                    "hedging_strategies": 0.7,
                    "market_making": 0.0
                })),
                rebalancing_schedule: Some(json!("1h")),
            }),
            trading_decisions,
            risk_management: json!({
                "max_portfolio_drawdown": "-5%",
                "volatility_targeting": true,
                "correlation_limits": "strict",
                "liquidity_constraints": "high_liquidity_only",
                "tail_risk_hedging": "active"
            }),
            execution_parameters: Value::Null,
            learning_adaptation: Value::Null,
        }
    }
}

// ---------------------------------------------------------------------------
// Validated decision
// ---------------------------------------------------------------------------

/// Per-instrument decision after clamping. `leverage` is in [1, 100] and
/// `position_size` (fraction of total equity) in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingDecision {
    pub action: Action,
    pub leverage: u32,
    pub position_size: Decimal,
    pub entry_strategy: String,
    pub exit_strategy: String,
    pub risk_parameters: String,
    pub confidence: u8,
    pub rationale: String,
}

impl TradingDecision {
    pub fn avoid() -> Self {
        Self {
            action: Action::Avoid,
            leverage: 1,
            position_size: Decimal::ZERO,
            entry_strategy: String::new(),
            exit_strategy: String::new(),
            risk_parameters: String::new(),
            confidence: 0,
            rationale: String::new(),
        }
    }

    pub fn is_material(&self, threshold: Decimal) -> bool {
        self.position_size > threshold
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentDecision {
    pub coin: String,
    pub decision: TradingDecision,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyAllocation {
    pub directional_betting: f64,
    pub arbitrage_opportunities: f64,
    pub hedging_strategies: f64,
    pub market_making: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioDecision {
    /// Bounded to [0, 2]; above 1 signals intended portfolio leverage
    pub overall_exposure: Decimal,
    pub allocation: StrategyAllocation,
    pub rebalancing_schedule: String,
}

impl Default for PortfolioDecision {
    fn default() -> Self {
        Self {
            overall_exposure: Decimal::ZERO,
            allocation: StrategyAllocation::default(),
            rebalancing_schedule: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum RejectionReason {
    /// Entry dropped: the action is not one of the known variants
    UnknownAction(String),
    /// Entry kept as AVOID: a required field was absent or not numeric
    MissingField(String),
    /// Entry kept as AVOID: the entry was not an object
    MalformedEntry(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    pub coin: String,
    pub reason: RejectionReason,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum DecisionSource {
    Service,
    Fallback(String),
}

/// The one decision acted on per cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutonomousDecision {
    pub source: DecisionSource,
    pub market_analysis: Value,
    pub portfolio: PortfolioDecision,
    /// In the order the decision service listed them
    pub decisions: Vec<InstrumentDecision>,
    pub rejections: Vec<Rejection>,
    pub risk_management: Value,
    pub execution_parameters: Value,
    pub learning_adaptation: Value,
}

impl AutonomousDecision {
    pub fn decision_for(&self, coin: &str) -> Option<&TradingDecision> {
        self.decisions
            .iter()
            .find(|d| d.coin == coin)
            .map(|d| &d.decision)
    }

    /// Entries with a non-trivial position size
    pub fn material(&self, threshold: Decimal) -> impl Iterator<Item = &InstrumentDecision> {
        self.decisions
            .iter()
            .filter(move |d| d.decision.is_material(threshold))
    }

    pub fn regime_label(&self) -> &str {
        self.market_analysis
            .get("regime_identification")
            .and_then(Value::as_str)
            .unwrap_or("N/A")
    }
}
