// src/infrastructure/analysis/mod.rs
// Default instrument and market analyzers

use rust_decimal::prelude::ToPrimitive;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use ta::indicators::StandardDeviation;
use ta::Next;

use crate::domain::model::{
    InstrumentSnapshot, MarketRegime, MarketStructure, OrderBook, TemporalPatterns, Timeframe,
    VolatilityMetrics,
};
use crate::domain::service::{CandleSeries, InstrumentAnalysisService, MarketAnalysisService};

/// Daily closes needed before volatility is reported
pub const MIN_DAILY_CLOSES: usize = 10;
/// Daily return std above which the instrument is in a `high` regime
pub const HIGH_VOLATILITY_DAILY_STD: f64 = 0.05;

const NOT_ASSESSED: &str = "not_assessed";

/// Daily log returns, oldest first
pub fn log_returns(closes: &[f64]) -> Vec<f64> {
    closes
        .windows(2)
        .filter(|w| w[0] > 0.0 && w[1] > 0.0)
        .map(|w| (w[1] / w[0]).ln())
        .collect()
}

/// Population standard deviation over the whole series
pub fn population_std(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut indicator = StandardDeviation::new(values.len()).ok()?;
    let mut last = 0.0;
    for value in values {
        last = indicator.next(*value);
    }
    Some(last)
}

pub struct DefaultInstrumentAnalyzer;

impl DefaultInstrumentAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DefaultInstrumentAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl InstrumentAnalysisService for DefaultInstrumentAnalyzer {
    fn volatility(&self, candles: &CandleSeries) -> VolatilityMetrics {
        let closes: Vec<f64> = candles
            .get(&Timeframe::D1)
            .map(|series| series.iter().filter_map(|c| c.close.to_f64()).collect())
            .unwrap_or_default();

        if closes.len() < MIN_DAILY_CLOSES {
            return VolatilityMetrics::default();
        }

        let returns = log_returns(&closes);
        let std = match population_std(&returns) {
            Some(std) if std.is_finite() => std,
            _ => return VolatilityMetrics::default(),
        };

        VolatilityMetrics {
            historical_volatility: Some(std * 365f64.sqrt() * 100.0),
            volatility_regime: Some(
                if std > HIGH_VOLATILITY_DAILY_STD { "high" } else { "low" }.to_string(),
            ),
            volatility_clustering: Some(NOT_ASSESSED.to_string()),
            jump_risk: Some(NOT_ASSESSED.to_string()),
        }
    }

    fn market_structure(&self, _candles: &CandleSeries, book: &OrderBook) -> MarketStructure {
        let liquidity_depth = if book.is_empty() {
            "unavailable"
        } else {
            NOT_ASSESSED
        };
        MarketStructure {
            liquidity_depth: Some(liquidity_depth.to_string()),
            market_efficiency: Some(NOT_ASSESSED.to_string()),
            institutional_presence: Some(NOT_ASSESSED.to_string()),
            manipulation_risk: Some(NOT_ASSESSED.to_string()),
        }
    }

    fn temporal_patterns(&self, _candles: &CandleSeries) -> TemporalPatterns {
        TemporalPatterns {
            intraday_patterns: Some(NOT_ASSESSED.to_string()),
            weekend_effects: Some(NOT_ASSESSED.to_string()),
            seasonality: Some(NOT_ASSESSED.to_string()),
        }
    }
}

/// Regime from mean volatility. The other aggregates are fixed values
/// until real models are plugged in.
pub struct DefaultMarketAnalyzer {
    risk_appetite: f64,
}

impl DefaultMarketAnalyzer {
    pub fn new() -> Self {
        Self {
            risk_appetite: 75.0,
        }
    }
}

impl Default for DefaultMarketAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarketAnalysisService for DefaultMarketAnalyzer {
    /// Instruments without a volatility reading count as zero
    fn market_regime(&self, instruments: &BTreeMap<String, InstrumentSnapshot>) -> MarketRegime {
        if instruments.is_empty() {
            return MarketRegime::from_average_volatility(0.0);
        }
        let total: f64 = instruments
            .values()
            .map(|s| s.volatility.historical_volatility.unwrap_or(0.0))
            .sum();
        MarketRegime::from_average_volatility(total / instruments.len() as f64)
    }

    fn correlations(&self, _instruments: &BTreeMap<String, InstrumentSnapshot>) -> Value {
        json!({ "correlation_matrix": "not yet implemented" })
    }

    fn risk_appetite(&self, _instruments: &BTreeMap<String, InstrumentSnapshot>) -> f64 {
        self.risk_appetite
    }

    fn liquidity_conditions(&self, _instruments: &BTreeMap<String, InstrumentSnapshot>) -> String {
        "ample_liquidity".to_string()
    }

    fn volatility_regime(&self, _instruments: &BTreeMap<String, InstrumentSnapshot>) -> String {
        "moderate_volatility".to_string()
    }
}
