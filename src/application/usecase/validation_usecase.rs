// src/application/usecase/validation_usecase.rs
// Schema validation and clamping of the decision document

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

use crate::domain::model::{
    Action, AutonomousDecision, DecisionSource, InstrumentDecision, PortfolioDecision,
    RawAutonomousDecision, RawPortfolioStrategy, RawTradingDecision, Rejection, RejectionReason,
    StrategyAllocation, TradingDecision,
};

pub const MIN_LEVERAGE: u32 = 1;
pub const MAX_LEVERAGE: u32 = 100;
const MAX_EXPOSURE: Decimal = Decimal::TWO;

/// Turns the loose document into an `AutonomousDecision`.
///
/// Numbers are clamped into range. An entry with an unknown action is
/// dropped. An entry missing a required field (action, leverage,
/// position_size) stays in the decision but is degraded to AVOID with
/// conservative defaults. Nothing here ever fails the whole document.
#[derive(Debug, Default, Clone)]
pub struct DecisionValidator;

enum EntryVerdict {
    Accepted(TradingDecision, Option<Rejection>),
    Dropped(Rejection),
}

impl DecisionValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, raw: &RawAutonomousDecision) -> AutonomousDecision {
        let mut decisions = Vec::with_capacity(raw.trading_decisions.len());
        let mut rejections = Vec::new();

        for (coin, entry) in &raw.trading_decisions {
            match self.validate_entry(coin, entry) {
                EntryVerdict::Accepted(decision, note) => {
                    if let Some(rejection) = note {
                        log::warn!(
                            "Validation: {} degraded to AVOID ({:?})",
                            coin,
                            rejection.reason
                        );
                        rejections.push(rejection);
                    }
                    decisions.push(InstrumentDecision {
                        coin: coin.clone(),
                        decision,
                    });
                }
                EntryVerdict::Dropped(rejection) => {
                    log::warn!(
                        "Validation: {} dropped from execution set ({:?})",
                        coin,
                        rejection.reason
                    );
                    rejections.push(rejection);
                }
            }
        }

        AutonomousDecision {
            source: DecisionSource::Service,
            market_analysis: raw.market_analysis.clone(),
            portfolio: self.validate_portfolio(raw.portfolio_strategy.as_ref()),
            decisions,
            rejections,
            risk_management: raw.risk_management.clone(),
            execution_parameters: raw.execution_parameters.clone(),
            learning_adaptation: raw.learning_adaptation.clone(),
        }
    }

    fn validate_entry(&self, coin: &str, entry: &Value) -> EntryVerdict {
        if !entry.is_object() {
            return EntryVerdict::Accepted(
                TradingDecision::avoid(),
                Some(Rejection {
                    coin: coin.to_string(),
                    reason: RejectionReason::MalformedEntry(entry.to_string()),
                }),
            );
        }

        let raw: RawTradingDecision = match serde_json::from_value(entry.clone()) {
            Ok(raw) => raw,
            Err(e) => {
                return EntryVerdict::Accepted(
                    TradingDecision::avoid(),
                    Some(Rejection {
                        coin: coin.to_string(),
                        reason: RejectionReason::MalformedEntry(e.to_string()),
                    }),
                )
            }
        };

        let mut missing = Vec::new();

        let action = match present(raw.decision.as_ref()) {
            None => {
                missing.push("decision");
                Action::Avoid
            }
            Some(Value::String(label)) => match Action::from_str(label) {
                Ok(action) => action,
                Err(unknown) => {
                    return EntryVerdict::Dropped(Rejection {
                        coin: coin.to_string(),
                        reason: RejectionReason::UnknownAction(unknown),
                    })
                }
            },
            Some(other) => {
                return EntryVerdict::Dropped(Rejection {
                    coin: coin.to_string(),
                    reason: RejectionReason::UnknownAction(other.to_string()),
                })
            }
        };

        let leverage = match present(raw.leverage.as_ref()).and_then(decimal_value) {
            Some(value) => clamp_leverage(value),
            None => {
                missing.push("leverage");
                MIN_LEVERAGE
            }
        };

        let position_size = match present(raw.position_size.as_ref()).and_then(decimal_value) {
            Some(value) => value.clamp(Decimal::ZERO, Decimal::ONE),
            None => {
                missing.push("position_size");
                Decimal::ZERO
            }
        };

        let confidence = present(raw.confidence.as_ref())
            .and_then(decimal_value)
            .map(|c| c.round().clamp(Decimal::ZERO, Decimal::ONE_HUNDRED))
            .and_then(|c| c.to_u8())
            .unwrap_or(0);

        let mut decision = TradingDecision {
            action,
            leverage,
            position_size,
            entry_strategy: opaque_text(raw.entry_strategy.as_ref()),
            exit_strategy: opaque_text(raw.exit_strategy.as_ref()),
            risk_parameters: opaque_text(raw.risk_parameters.as_ref()),
            confidence,
            rationale: opaque_text(raw.rationale.as_ref()),
        };

        if missing.is_empty() {
            return EntryVerdict::Accepted(decision, None);
        }

        decision.action = Action::Avoid;
        EntryVerdict::Accepted(
            decision,
            Some(Rejection {
                coin: coin.to_string(),
                reason: RejectionReason::MissingField(missing.join(",")),
            }),
        )
    }

    fn validate_portfolio(&self, raw: Option<&RawPortfolioStrategy>) -> PortfolioDecision {
        let raw = match raw {
            Some(raw) => raw,
            None => return PortfolioDecision::default(),
        };

        let overall_exposure = present(raw.overall_exposure.as_ref())
            .and_then(decimal_value)
            .map(|e| e.clamp(Decimal::ZERO, MAX_EXPOSURE))
            .unwrap_or(Decimal::ZERO);

        let bucket = |name: &str| -> f64 {
            raw.strategy_allocation
                .as_ref()
                .and_then(|a| a.get(name))
                .and_then(decimal_value)
                .and_then(|v| v.to_f64())
                .map(|v| v.clamp(0.0, 1.0))
                .unwrap_or(0.0)
        };

        PortfolioDecision {
            overall_exposure,
            allocation: StrategyAllocation {
                directional_betting: bucket("directional_betting"),
                arbitrage_opportunities: bucket("arbitrage_opportunities"),
                hedging_strategies: bucket("hedging_strategies"),
                market_making: bucket("market_making"),
            },
            rebalancing_schedule: opaque_text(raw.rebalancing_schedule.as_ref()),
        }
    }
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

/// Accepts JSON numbers and numeric strings ("5", "5x", "1e-3")
fn decimal_value(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().trim_end_matches(['x', 'X']).trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
        .or_else(|| text.parse::<f64>().ok().and_then(saturating_decimal))
}

/// Magnitudes beyond Decimal's range saturate so they can still be clamped
fn saturating_decimal(value: f64) -> Option<Decimal> {
    if value.is_nan() {
        return None;
    }
    Decimal::from_f64(value).or(Some(if value.abs() < 1.0 {
        Decimal::ZERO
    } else if value.is_sign_negative() {
        Decimal::MIN
    } else {
        Decimal::MAX
    }))
}

fn clamp_leverage(value: Decimal) -> u32 {
    value
        .round()
        .clamp(Decimal::from(MIN_LEVERAGE), Decimal::from(MAX_LEVERAGE))
        .to_u32()
        .unwrap_or(MIN_LEVERAGE)
}

fn opaque_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn raw(doc: Value) -> RawAutonomousDecision {
        serde_json::from_value(doc).unwrap()
    }

    fn single(entry: Value) -> AutonomousDecision {
        DecisionValidator::new().validate(&raw(json!({ "trading_decisions": { "BTC": entry } })))
    }

    #[test]
    fn test_valid_entry_passes_through() {
        let decision = single(json!({
            "decision": "LONG", "leverage": 5, "position_size": 0.2, "confidence": 80,
            "risk_parameters": "stop 2%"
        }));
        let btc = decision.decision_for("BTC").unwrap();
        assert_eq!(btc.action, Action::Long);
        assert_eq!(btc.leverage, 5);
        assert_eq!(btc.position_size, dec!(0.2));
        assert_eq!(btc.confidence, 80);
        assert_eq!(btc.risk_parameters, "stop 2%");
        assert!(decision.rejections.is_empty());
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let cases = [
            (json!(250), json!(1.7), 100u32, dec!(1)),
            (json!(0), json!(-0.4), 1, dec!(0)),
            (json!(-3), json!(0.5), 1, dec!(0.5)),
            (json!("20x"), json!("0.25"), 20, dec!(0.25)),
            (json!(2.6), json!(1e-4), 3, dec!(0.0001)),
        ];

        for (leverage, size, want_leverage, want_size) in cases {
            let decision = single(json!({
                "decision": "SHORT", "leverage": leverage, "position_size": size
            }));
            let btc = decision.decision_for("BTC").unwrap();
            assert_eq!(btc.action, Action::Short);
            assert_eq!(btc.leverage, want_leverage);
            assert_eq!(btc.position_size, want_size);
            assert!((1..=100).contains(&btc.leverage));
            assert!(btc.position_size >= Decimal::ZERO && btc.position_size <= Decimal::ONE);
        }
    }

    #[test]
    fn test_numbers_beyond_decimal_range_are_clamped() {
        let decision = single(json!({
            "decision": "LONG", "leverage": 1e30, "position_size": 5e40
        }));
        let btc = decision.decision_for("BTC").unwrap();
        assert_eq!(btc.action, Action::Long);
        assert_eq!(btc.leverage, 100);
        assert_eq!(btc.position_size, Decimal::ONE);
        assert!(decision.rejections.is_empty());

        let decision = single(json!({
            "decision": "SHORT", "leverage": "-1e35", "position_size": -2e30
        }));
        let btc = decision.decision_for("BTC").unwrap();
        assert_eq!(btc.action, Action::Short);
        assert_eq!(btc.leverage, 1);
        assert_eq!(btc.position_size, Decimal::ZERO);
    }

    #[test]
    fn test_missing_required_field_degrades_to_avoid() {
        let decision = single(json!({ "decision": "LONG", "position_size": 0.3 }));
        let btc = decision.decision_for("BTC").unwrap();
        assert_eq!(btc.action, Action::Avoid);
        assert_eq!(btc.leverage, 1);
        assert_eq!(btc.position_size, dec!(0.3));
        assert_eq!(
            decision.rejections[0].reason,
            RejectionReason::MissingField("leverage".to_string())
        );
    }

    #[test]
    fn test_non_numeric_size_counts_as_missing() {
        let decision = single(json!({ "decision": "LONG", "leverage": 3, "position_size": "lots" }));
        let btc = decision.decision_for("BTC").unwrap();
        assert_eq!(btc.action, Action::Avoid);
        assert_eq!(btc.position_size, Decimal::ZERO);
    }

    #[test]
    fn test_unknown_action_is_dropped() {
        let decision = single(json!({ "decision": "YOLO", "leverage": 3, "position_size": 0.5 }));
        assert!(decision.decisions.is_empty());
        assert_eq!(
            decision.rejections[0].reason,
            RejectionReason::UnknownAction("YOLO".to_string())
        );
    }

    #[test]
    fn test_non_object_entry_becomes_avoid() {
        let decision = single(json!("go long"));
        let btc = decision.decision_for("BTC").unwrap();
        assert_eq!(btc.action, Action::Avoid);
        assert!(matches!(
            decision.rejections[0].reason,
            RejectionReason::MalformedEntry(_)
        ));
    }

    #[test]
    fn test_bare_avoid_needs_no_sizes() {
        let decision = single(json!({ "decision": "AVOID" }));
        let btc = decision.decision_for("BTC").unwrap();
        assert_eq!(btc.action, Action::Avoid);
        assert_eq!(btc.position_size, Decimal::ZERO);
        assert_eq!(btc.leverage, 1);
    }

    #[test]
    fn test_one_bad_entry_does_not_affect_siblings() {
        let decision = DecisionValidator::new().validate(&raw(json!({
            "trading_decisions": {
                "BTC": { "decision": "NOPE" },
                "ETH": { "decision": "HEDGE", "leverage": 2, "position_size": 0.1 },
                "SOL": { "decision": "LONG", "leverage": 4, "position_size": 0.05 }
            }
        })));
        let coins: Vec<&str> = decision.decisions.iter().map(|d| d.coin.as_str()).collect();
        assert_eq!(coins, vec!["ETH", "SOL"]);
        assert_eq!(decision.rejections.len(), 1);
    }

    #[test]
    fn test_portfolio_exposure_and_allocation_clamped() {
        let decision = DecisionValidator::new().validate(&raw(json!({
            "portfolio_strategy": {
                "overall_exposure": 3.5,
                "strategy_allocation": {
                    "directional_betting": 1.4,
                    "hedging_strategies": -0.2,
                    "market_making": "0.3"
                },
                "rebalancing_schedule": "daily"
            },
            "trading_decisions": {}
        })));
        assert_eq!(decision.portfolio.overall_exposure, dec!(2));
        assert_eq!(decision.portfolio.allocation.directional_betting, 1.0);
        assert_eq!(decision.portfolio.allocation.hedging_strategies, 0.0);
        assert_eq!(decision.portfolio.allocation.arbitrage_opportunities, 0.0);
        assert_eq!(decision.portfolio.allocation.market_making, 0.3);
        assert_eq!(decision.portfolio.rebalancing_schedule, "daily");
    }

    #[test]
    fn test_missing_portfolio_defaults_to_zero_exposure() {
        let decision = DecisionValidator::new().validate(&raw(json!({ "trading_decisions": {} })));
        assert_eq!(decision.portfolio.overall_exposure, Decimal::ZERO);
    }

    #[test]
    fn test_emergency_decision_validates_to_fixed_exposure() {
        let decision = DecisionValidator::new().validate(&RawAutonomousDecision::emergency());
        assert_eq!(decision.portfolio.overall_exposure, dec!(0.3));
        let btc = decision.decision_for("BTC").unwrap();
        assert_eq!(btc.action, Action::Hedge);
        assert_eq!(btc.leverage, 3);
        assert_eq!(btc.position_size, dec!(0.1));
    }

    #[test]
    fn test_decision_order_is_preserved() {
        let decision = DecisionValidator::new().validate(&raw(json!({
            "trading_decisions": {
                "SOL": { "decision": "AVOID" },
                "BTC": { "decision": "AVOID" },
                "ETH": { "decision": "AVOID" }
            }
        })));
        let coins: Vec<&str> = decision.decisions.iter().map(|d| d.coin.as_str()).collect();
        assert_eq!(coins, vec!["SOL", "BTC", "ETH"]);
    }
}
