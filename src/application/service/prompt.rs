// src/application/service/prompt.rs
// Renders a market universe into the decision request

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use crate::domain::model::{InstrumentSnapshot, MarketUniverse, Timeframe, TradeSide};
use crate::domain::service::DecisionPrompt;

const SYSTEM_PROMPT: &str = "You are an autonomous quantitative trading system managing a \
perpetual-swap portfolio. You receive a complete market snapshot and must answer with a single \
JSON object that follows the schema in the request exactly. Maximise risk-adjusted return. \
Do not include any text outside the JSON object.";

/// Output contract sent with every request
pub const DECISION_SCHEMA: &str = r#"{
  "market_analysis": {
    "regime_identification": "string",
    "opportunity_assessment": "string",
    "risk_landscape": "string",
    "time_horizon": "string"
  },
  "portfolio_strategy": {
    "overall_exposure": "number in [0.0, 2.0]; above 1.0 means portfolio leverage",
    "strategy_allocation": {
      "directional_betting": "number in [0.0, 1.0]",
      "arbitrage_opportunities": "number in [0.0, 1.0]",
      "hedging_strategies": "number in [0.0, 1.0]",
      "market_making": "number in [0.0, 1.0]"
    },
    "rebalancing_schedule": "string"
  },
  "trading_decisions": {
    "<COIN>": {
      "decision": "one of LONG | SHORT | HEDGE | ARBITRAGE | MARKET_MAKE | AVOID",
      "leverage": "integer in [1, 100]",
      "position_size": "number in [0.0, 1.0], fraction of total equity used as margin",
      "entry_strategy": "string",
      "exit_strategy": "string",
      "risk_parameters": "string",
      "confidence": "integer in [0, 100]",
      "rationale": "string"
    }
  },
  "risk_management": {
    "max_portfolio_drawdown": "string such as -10%",
    "volatility_targeting": "boolean",
    "correlation_limits": "string",
    "liquidity_constraints": "string",
    "tail_risk_hedging": "string"
  },
  "execution_parameters": {
    "slippage_tolerance": "string",
    "execution_timing": "string",
    "order_types": "string",
    "algorithmic_execution": "string"
  },
  "learning_adaptation": {
    "strategy_evolution": "string",
    "parameter_optimization": "string",
    "market_regime_adaptation": "string"
  }
}"#;

/// Builds `DecisionPrompt`s. The full candle history is summarised; the
/// request carries a per-instrument digest rather than raw bars.
#[derive(Debug, Default, Clone)]
pub struct DecisionPromptBuilder;

impl DecisionPromptBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build(&self, universe: &MarketUniverse) -> DecisionPrompt {
        let portfolio = &universe.portfolio;
        let coins: Vec<&str> = universe.instruments.keys().map(String::as_str).collect();

        let digest: Vec<Value> = universe
            .instruments
            .values()
            .map(instrument_digest)
            .collect();
        let digest = serde_json::to_string_pretty(&digest).unwrap_or_else(|_| "[]".to_string());

        let user = format!(
            "# Autonomous crypto trading decision\n\
             \n\
             ## Capital overview\n\
             - Total equity under management: {equity} USD\n\
             - Account health: {health}\n\
             - Leverage usage: {leverage_usage:.2}\n\
             - Market regime: {regime}\n\
             - Volatility regime: {vol_regime}\n\
             - Liquidity conditions: {liquidity}\n\
             - Risk appetite index: {appetite}/100\n\
             - Snapshot time: {captured_at}\n\
             \n\
             ## Instrument digest\n\
             Multi-timeframe candles (1m to 1W), order book depth, funding, open interest and \
             recent trades were collected for every instrument below.\n\
             {digest}\n\
             \n\
             ## Decision authority\n\
             - Choose which of these instruments to trade: {coins}\n\
             - Leverage per instrument: integer 1 to 100\n\
             - Position size per instrument: fraction 0.0 to 1.0 of total equity\n\
             - Direction, hedging, arbitrage and market making are all permitted\n\
             - Use AVOID for instruments you do not want to trade\n\
             \n\
             ## Output format\n\
             Answer with one JSON object matching this schema:\n\
             {schema}\n",
            equity = portfolio.total_equity,
            health = portfolio.account.health,
            leverage_usage = portfolio.account.leverage_usage,
            regime = portfolio.market_regime,
            vol_regime = portfolio.volatility_regime,
            liquidity = portfolio.liquidity_conditions,
            appetite = portfolio.risk_appetite_index,
            captured_at = universe.captured_at.to_rfc3339(),
            digest = digest,
            coins = coins.join(", "),
            schema = DECISION_SCHEMA,
        );

        DecisionPrompt {
            system: SYSTEM_PROMPT.to_string(),
            user,
            schema: DECISION_SCHEMA.to_string(),
        }
    }
}

fn instrument_digest(snapshot: &InstrumentSnapshot) -> Value {
    let book = &snapshot.order_book;
    let spread = match (book.best_bid(), book.best_ask()) {
        (Some(bid), Some(ask)) => Some(ask.price - bid.price),
        _ => None,
    };

    let buys = snapshot
        .recent_trades
        .iter()
        .filter(|t| t.side == TradeSide::Buy)
        .count();

    json!({
        "coin": snapshot.coin,
        "instrument": snapshot.inst_id,
        "last_price": snapshot.last_price().map(|p| p.to_string()),
        "change_24h_pct": change_pct(&snapshot.closes(Timeframe::H1), 24),
        "change_7d_pct": change_pct(&snapshot.closes(Timeframe::D1), 7),
        "best_bid": book.best_bid().map(|l| l.price.to_string()),
        "best_ask": book.best_ask().map(|l| l.price.to_string()),
        "spread": spread.map(|s| s.to_string()),
        "funding_rate": snapshot.funding_rate.as_ref().map(|f| f.rate.to_string()),
        "open_interest": snapshot.open_interest.map(|oi| oi.to_string()),
        "recent_trades": snapshot.recent_trades.len(),
        "recent_buy_ratio": (!snapshot.recent_trades.is_empty())
            .then(|| buys as f64 / snapshot.recent_trades.len() as f64),
        "volatility": snapshot.volatility,
        "market_structure": snapshot.structure,
        "temporal_patterns": snapshot.temporal,
    })
}

/// Percent change between the close `lookback` bars ago and the last close
fn change_pct(closes: &[Decimal], lookback: usize) -> Option<f64> {
    if closes.len() <= lookback {
        return None;
    }
    let last = *closes.last()?;
    let base = closes[closes.len() - 1 - lookback];
    if base.is_zero() {
        return None;
    }
    ((last - base) / base * Decimal::ONE_HUNDRED)
        .round_dp(4)
        .to_f64()
}
