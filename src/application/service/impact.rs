// src/application/service/impact.rs
// Portfolio impact summary over a cycle's outcomes

use rust_decimal::Decimal;

use crate::domain::model::{ExecutionOutcome, PortfolioImpact};

/// Instrument count the diversification score is measured against
pub const DIVERSIFICATION_BASE: f64 = 10.0;

pub fn portfolio_impact(outcomes: &[ExecutionOutcome]) -> PortfolioImpact {
    let executed: Vec<&ExecutionOutcome> = outcomes.iter().filter(|o| o.is_success()).collect();

    if executed.is_empty() {
        return PortfolioImpact::default();
    }

    let total_investment_ratio: Decimal = executed
        .iter()
        .map(|o| o.decision.position_size)
        .sum();

    let leverage_sum: u32 = executed.iter().map(|o| o.decision.leverage).sum();

    PortfolioImpact {
        total_investment_ratio,
        diversification_score: executed.len() as f64 / DIVERSIFICATION_BASE,
        leverage_impact: leverage_sum as f64 / executed.len() as f64,
    }
}
