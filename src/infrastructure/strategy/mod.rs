// src/infrastructure/strategy/mod.rs
// Default executors for non-directional strategies and protective orders

use async_trait::async_trait;

use crate::domain::errors::ExchangeResult;
use crate::domain::model::ProtectionStatus;
use crate::domain::service::{
    ProtectionRequest, ProtectiveOrderService, StrategyExecutionService, StrategyRequest,
    StrategyResult,
};

/// HEDGE, ARBITRAGE and MARKET_MAKE have no executor yet. Every request
/// is acknowledged as not implemented; leverage has already been set.
pub struct UnimplementedStrategies;

impl UnimplementedStrategies {
    pub fn new() -> Self {
        Self
    }
}

impl Default for UnimplementedStrategies {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StrategyExecutionService for UnimplementedStrategies {
    async fn execute(&self, request: StrategyRequest<'_>) -> ExchangeResult<StrategyResult> {
        log::info!(
            "Strategy: {} {} for {} (value {}) is not implemented",
            request.decision.action,
            request.inst_id,
            request.coin,
            request.position_value
        );
        Ok(StrategyResult::NotImplemented)
    }
}

/// Records the protection request and places nothing
pub struct DeferredProtection;

impl DeferredProtection {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DeferredProtection {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProtectiveOrderService for DeferredProtection {
    async fn protect(&self, request: ProtectionRequest<'_>) -> ExchangeResult<ProtectionStatus> {
        log::info!(
            "Protection: {} {} order {} deferred (risk parameters: {})",
            request.inst_id,
            request.action,
            request.order_id,
            if request.risk_parameters.is_empty() {
                "none"
            } else {
                request.risk_parameters
            }
        );
        Ok(ProtectionStatus::Deferred)
    }
}
