// src/infrastructure/risk/mod.rs
// Basic account risk assessment

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::domain::model::Position;
use crate::domain::service::AccountAnalysisService;

/// Leverage usage is measured from open notional. Margin health and
/// concentration return fixed labels (`healthy`, `low`) until real models
/// are plugged in.
pub struct BasicRiskAssessor {
    margin_health: String,
    concentration_risk: String,
}

impl BasicRiskAssessor {
    pub fn new() -> Self {
        Self {
            margin_health: "healthy".to_string(),
            concentration_risk: "low".to_string(),
        }
    }
}

impl Default for BasicRiskAssessor {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountAnalysisService for BasicRiskAssessor {
    fn leverage_usage(&self, total_equity: Decimal, positions: &[Position]) -> f64 {
        if total_equity <= Decimal::ZERO {
            return 0.0;
        }
        let exposure: Decimal = positions.iter().map(|p| p.notional_usd.abs()).sum();
        let usage = (exposure / total_equity).to_f64().unwrap_or(0.0);

        log::debug!(
            "Risk: {} open positions, exposure {} on equity {} ({:.2}x)",
            positions.len(),
            exposure,
            total_equity,
            usage
        );
        usage
    }

    fn margin_health(&self, _positions: &[Position]) -> String {
        self.margin_health.clone()
    }

    fn concentration_risk(&self, _positions: &[Position]) -> String {
        self.concentration_risk.clone()
    }
}
