// src/application/usecase/execution_usecase.rs
// Turns validated decisions into exchange operations

use async_trait::async_trait;
use futures_util::FutureExt;
use rust_decimal::Decimal;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use crate::domain::errors::panic_message;

use crate::domain::model::{
    Action, AutonomousDecision, ExecutionOutcome, FailureReason, MarginMode, OrderRequest,
    OrderSide, OrderType, OutcomeStatus, PositionSide, ProtectionStatus, SkipReason,
    TradingDecision,
};
use crate::domain::repository::TradingRepository;
use crate::domain::service::{
    ProtectionRequest, ProtectiveOrderService, Scheduler, StrategyExecutionService,
    StrategyRequest, StrategyResult,
};

/// Execution use case
#[async_trait]
pub trait ExecutionUseCase: Send + Sync {
    /// One outcome per decision entry, in decision order
    async fn execute(
        &self,
        decision: &AutonomousDecision,
        total_equity: Decimal,
    ) -> Vec<ExecutionOutcome>;
}

/// Notional and margin for one directional order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sizing {
    /// equity * position_size * leverage
    pub notional: Decimal,
    /// notional / leverage
    pub margin: Decimal,
}

impl Sizing {
    pub fn compute(total_equity: Decimal, decision: &TradingDecision) -> Result<Self, FailureReason> {
        if total_equity <= Decimal::ZERO {
            return Err(FailureReason::InvalidSizing(format!(
                "total equity {} is not positive",
                total_equity
            )));
        }
        if decision.leverage == 0 {
            return Err(FailureReason::InvalidSizing("leverage is zero".to_string()));
        }

        let leverage = Decimal::from(decision.leverage);
        let notional = total_equity * decision.position_size * leverage;
        Ok(Self {
            notional,
            margin: notional / leverage,
        })
    }
}

pub struct ExecutionEngine {
    trading: Arc<dyn TradingRepository + Send + Sync>,
    strategies: Arc<dyn StrategyExecutionService + Send + Sync>,
    protection: Arc<dyn ProtectiveOrderService + Send + Sync>,
    clock: Arc<dyn Scheduler + Send + Sync>,
    instrument_suffix: String,
    min_position_size: Decimal,
    margin_mode: MarginMode,
}

impl ExecutionEngine {
    pub fn new(
        trading: Arc<dyn TradingRepository + Send + Sync>,
        strategies: Arc<dyn StrategyExecutionService + Send + Sync>,
        protection: Arc<dyn ProtectiveOrderService + Send + Sync>,
        clock: Arc<dyn Scheduler + Send + Sync>,
        instrument_suffix: impl Into<String>,
        min_position_size: Decimal,
    ) -> Self {
        Self {
            trading,
            strategies,
            protection,
            clock,
            instrument_suffix: instrument_suffix.into(),
            min_position_size,
            margin_mode: MarginMode::Cross,
        }
    }

    fn instrument_id(&self, coin: &str) -> String {
        format!("{}{}", coin, self.instrument_suffix)
    }

    async fn execute_one(
        &self,
        coin: &str,
        inst_id: &str,
        decision: &TradingDecision,
        total_equity: Decimal,
    ) -> OutcomeStatus {
        if decision.action == Action::Avoid {
            return OutcomeStatus::Skipped {
                reason: SkipReason::ByDecision,
            };
        }
        if !decision.is_material(self.min_position_size) {
            log::debug!(
                "Execution: {} size {} not above threshold {}",
                coin,
                decision.position_size,
                self.min_position_size
            );
            return OutcomeStatus::Skipped {
                reason: SkipReason::BelowThreshold,
            };
        }

        let sizing = match Sizing::compute(total_equity, decision) {
            Ok(sizing) => sizing,
            Err(reason) => {
                log::error!("Execution: {} {}", coin, reason);
                return OutcomeStatus::Failed { reason };
            }
        };

        log::info!(
            "Execution: {} {} notional {} (margin {}, {}x)",
            coin,
            decision.action,
            sizing.notional,
            sizing.margin,
            decision.leverage
        );

        if let Err(e) = self
            .trading
            .set_leverage(inst_id, decision.leverage, self.margin_mode)
            .await
        {
            log::error!("Execution: {} set leverage {}x failed: {}", inst_id, decision.leverage, e);
            return OutcomeStatus::Failed {
                reason: FailureReason::LeverageRejected(e.to_string()),
            };
        }

        match OrderSide::for_action(decision.action) {
            Some(side) => self.place_directional(inst_id, side, decision, sizing).await,
            None => self.delegate_strategy(coin, inst_id, decision, sizing).await,
        }
    }

    async fn place_directional(
        &self,
        inst_id: &str,
        side: OrderSide,
        decision: &TradingDecision,
        sizing: Sizing,
    ) -> OutcomeStatus {
        let order = OrderRequest {
            inst_id: inst_id.to_string(),
            side,
            margin_mode: self.margin_mode,
            position_side: PositionSide::Net,
            order_type: OrderType::Market,
            size: sizing.margin,
            leverage: decision.leverage,
        };

        let ack = match self.trading.place_order(&order).await {
            Ok(ack) => ack,
            Err(e) => {
                log::error!("Execution: {} {} order failed: {}", inst_id, side.as_str(), e);
                return OutcomeStatus::Failed {
                    reason: FailureReason::OrderRejected(e.to_string()),
                };
            }
        };

        log::info!("Execution: {} {} order placed, id {}", inst_id, side.as_str(), ack.order_id);

        // The order stands whatever happens to its protection
        let protect = self.protection.protect(ProtectionRequest {
            order_id: &ack.order_id,
            inst_id,
            action: decision.action,
            risk_parameters: &decision.risk_parameters,
        });
        let protection = match AssertUnwindSafe(protect).catch_unwind().await {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                log::warn!("Execution: {} protective orders failed: {}", inst_id, e);
                ProtectionStatus::Failed(e.to_string())
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                log::error!("Execution: {} protective orders panicked: {}", inst_id, message);
                ProtectionStatus::Failed(message)
            }
        };

        OutcomeStatus::Executed {
            order_id: ack.order_id,
            position_value: sizing.notional,
            margin: sizing.margin,
            protection,
        }
    }

    async fn delegate_strategy(
        &self,
        coin: &str,
        inst_id: &str,
        decision: &TradingDecision,
        sizing: Sizing,
    ) -> OutcomeStatus {
        let request = StrategyRequest {
            coin,
            inst_id,
            position_value: sizing.notional,
            decision,
        };

        match self.strategies.execute(request).await {
            Ok(StrategyResult::NotImplemented) => {
                log::info!("Execution: {} {} strategy not implemented yet", coin, decision.action);
                OutcomeStatus::NotImplemented {
                    strategy: decision.action,
                }
            }
            Ok(StrategyResult::Executed { reference }) => OutcomeStatus::StrategyExecuted {
                reference,
                position_value: sizing.notional,
            },
            Err(e) => {
                log::error!("Execution: {} {} strategy failed: {}", coin, decision.action, e);
                OutcomeStatus::Failed {
                    reason: FailureReason::StrategyFailed(e.to_string()),
                }
            }
        }
    }
}

#[async_trait]
impl ExecutionUseCase for ExecutionEngine {
    async fn execute(
        &self,
        decision: &AutonomousDecision,
        total_equity: Decimal,
    ) -> Vec<ExecutionOutcome> {
        let mut outcomes = Vec::with_capacity(decision.decisions.len());

        for entry in &decision.decisions {
            let inst_id = self.instrument_id(&entry.coin);
            let attempt = self.execute_one(&entry.coin, &inst_id, &entry.decision, total_equity);
            // A panicking collaborator fails this instrument only
            let status = match AssertUnwindSafe(attempt).catch_unwind().await {
                Ok(status) => status,
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    log::error!("Execution: {} panicked: {}", inst_id, message);
                    OutcomeStatus::Failed {
                        reason: FailureReason::Panicked(message),
                    }
                }
            };

            outcomes.push(ExecutionOutcome {
                coin: entry.coin.clone(),
                inst_id,
                decision: entry.decision.clone(),
                status,
                timestamp: self.clock.now(),
            });
        }

        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn decision(size: Decimal, leverage: u32) -> TradingDecision {
        TradingDecision {
            action: Action::Long,
            leverage,
            position_size: size,
            ..TradingDecision::avoid()
        }
    }

    #[test]
    fn test_sizing_arithmetic() {
        let sizing = Sizing::compute(dec!(1000), &decision(dec!(0.2), 5)).unwrap();
        assert_eq!(sizing.notional, dec!(1000));
        assert_eq!(sizing.margin, dec!(200));
    }

    #[test]
    fn test_margin_never_exceeds_equity_share() {
        for leverage in [1, 3, 7, 50, 100] {
            let sizing = Sizing::compute(dec!(1234.56), &decision(dec!(0.37), leverage)).unwrap();
            assert!(sizing.margin <= dec!(1234.56) * dec!(0.37));
            assert!(sizing.notional >= Decimal::ZERO);
        }
    }

    #[test]
    fn test_zero_equity_is_invalid_sizing() {
        assert!(matches!(
            Sizing::compute(Decimal::ZERO, &decision(dec!(0.2), 5)),
            Err(FailureReason::InvalidSizing(_))
        ));
    }
}
