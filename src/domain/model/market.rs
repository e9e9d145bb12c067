// src/domain/model/market.rs
// Market and account snapshot models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Candle timeframes pulled for every instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "1H")]
    H1,
    #[serde(rename = "4H")]
    H4,
    #[serde(rename = "1D")]
    D1,
    #[serde(rename = "1W")]
    W1,
}

impl Timeframe {
    pub const ALL: [Timeframe; 7] = [
        Timeframe::M1,
        Timeframe::M5,
        Timeframe::M15,
        Timeframe::H1,
        Timeframe::H4,
        Timeframe::D1,
        Timeframe::W1,
    ];

    /// Bar label used on the wire (`bar=` query parameter)
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::H1 => "1H",
            Timeframe::H4 => "4H",
            Timeframe::D1 => "1D",
            Timeframe::W1 => "1W",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One OHLCV bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: Decimal,
    pub size: Decimal,
}

/// Order book depth, best level first on both sides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderBook {
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
    pub timestamp: Option<i64>,
}

impl OrderBook {
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    pub fn best_bid(&self) -> Option<&BookLevel> {
        self.bids.first()
    }

    pub fn best_ask(&self) -> Option<&BookLevel> {
        self.asks.first()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingRate {
    pub rate: Decimal,
    pub next_funding_time: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

/// A public trade print
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradePrint {
    pub trade_id: String,
    pub price: Decimal,
    pub size: Decimal,
    pub side: TradeSide,
    pub timestamp: i64,
}

/// Volatility block attached to each instrument snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolatilityMetrics {
    /// Annualised volatility of daily log returns, in percent
    pub historical_volatility: Option<f64>,
    pub volatility_regime: Option<String>,
    pub volatility_clustering: Option<String>,
    pub jump_risk: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketStructure {
    pub liquidity_depth: Option<String>,
    pub market_efficiency: Option<String>,
    pub institutional_presence: Option<String>,
    pub manipulation_risk: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemporalPatterns {
    pub intraday_patterns: Option<String>,
    pub weekend_effects: Option<String>,
    pub seasonality: Option<String>,
}

/// Everything gathered for one instrument during a snapshot pass.
///
/// Built once by the snapshot builder and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentSnapshot {
    /// Short asset name, e.g. `BTC`
    pub coin: String,
    /// Exchange instrument id, e.g. `BTC-USD-SWAP`
    pub inst_id: String,
    /// Candles per timeframe, oldest first
    pub candles: BTreeMap<Timeframe, Vec<Candle>>,
    pub order_book: OrderBook,
    pub funding_rate: Option<FundingRate>,
    pub open_interest: Option<Decimal>,
    pub recent_trades: Vec<TradePrint>,
    pub volatility: VolatilityMetrics,
    pub structure: MarketStructure,
    pub temporal: TemporalPatterns,
}

impl InstrumentSnapshot {
    pub fn closes(&self, timeframe: Timeframe) -> Vec<Decimal> {
        self.candles
            .get(&timeframe)
            .map(|candles| candles.iter().map(|c| c.close).collect())
            .unwrap_or_default()
    }

    pub fn last_price(&self) -> Option<Decimal> {
        Timeframe::ALL
            .iter()
            .find_map(|tf| self.candles.get(tf).and_then(|c| c.last()))
            .map(|c| c.close)
    }

    /// An instrument is usable when at least one candle series or the book came back
    pub fn is_usable(&self) -> bool {
        self.candles.values().any(|c| !c.is_empty()) || !self.order_book.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountHealth {
    Excellent,
    Unknown,
}

impl fmt::Display for AccountHealth {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AccountHealth::Excellent => write!(f, "excellent"),
            AccountHealth::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketRegime {
    HighVolatilityCrisis,
    ElevatedVolatility,
    NormalVolatility,
    LowVolatilityCalm,
}

impl MarketRegime {
    /// Classify from the mean annualised volatility across the universe
    pub fn from_average_volatility(avg: f64) -> Self {
        if avg > 80.0 {
            MarketRegime::HighVolatilityCrisis
        } else if avg > 50.0 {
            MarketRegime::ElevatedVolatility
        } else if avg > 30.0 {
            MarketRegime::NormalVolatility
        } else {
            MarketRegime::LowVolatilityCalm
        }
    }
}

impl fmt::Display for MarketRegime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = match self {
            MarketRegime::HighVolatilityCrisis => "high_volatility_crisis",
            MarketRegime::ElevatedVolatility => "elevated_volatility",
            MarketRegime::NormalVolatility => "normal_volatility",
            MarketRegime::LowVolatilityCalm => "low_volatility_calm",
        };
        write!(f, "{}", label)
    }
}

/// Account-level view produced from balance, positions and order history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountStatus {
    pub health: AccountHealth,
    pub leverage_usage: f64,
    pub margin_health: String,
    pub concentration_risk: String,
}

impl AccountStatus {
    pub fn unknown() -> Self {
        Self {
            health: AccountHealth::Unknown,
            leverage_usage: 0.0,
            margin_health: "unknown".to_string(),
            concentration_risk: "unknown".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    /// Capital base used for position sizing
    pub total_equity: Decimal,
    pub account: AccountStatus,
    pub market_regime: MarketRegime,
    pub correlations: serde_json::Value,
    pub risk_appetite_index: f64,
    pub liquidity_conditions: String,
    pub volatility_regime: String,
}

/// The unit handed to the decision service. Rebuilt from scratch every cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketUniverse {
    pub captured_at: DateTime<Utc>,
    pub instruments: BTreeMap<String, InstrumentSnapshot>,
    pub portfolio: PortfolioSnapshot,
}

impl MarketUniverse {
    pub fn usable_instruments(&self) -> usize {
        self.instruments.values().filter(|i| i.is_usable()).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarginMode {
    Cross,
    Isolated,
}

impl MarginMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarginMode::Cross => "cross",
            MarginMode::Isolated => "isolated",
        }
    }
}

/// Open position as reported by the account API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub inst_id: String,
    pub size: Decimal,
    pub notional_usd: Decimal,
    pub leverage: Option<Decimal>,
    pub unrealized_pnl: Decimal,
    pub average_price: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_id: String,
    pub inst_id: String,
    pub side: String,
    pub size: Decimal,
    pub state: String,
}
