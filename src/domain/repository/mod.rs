// src/domain/repository/mod.rs
// Repository interfaces for the exchange and the audit trail

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::errors::{AuditResult, ExchangeResult};
use crate::domain::model::{
    Candle, CycleRecord, FundingRate, MarginMode, OrderAck, OrderBook, OrderRecord, OrderRequest,
    Position, Timeframe, TradePrint,
};

/// Read-only market data capability
#[async_trait]
pub trait MarketDataRepository: Send + Sync {
    /// Candles for one timeframe, oldest first
    async fn get_candles(
        &self,
        inst_id: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> ExchangeResult<Vec<Candle>>;

    async fn get_order_book(&self, inst_id: &str, depth: usize) -> ExchangeResult<OrderBook>;

    async fn get_funding_rate(&self, inst_id: &str) -> ExchangeResult<FundingRate>;

    async fn get_open_interest(&self, inst_id: &str) -> ExchangeResult<Decimal>;

    async fn get_recent_trades(&self, inst_id: &str, limit: usize) -> ExchangeResult<Vec<TradePrint>>;
}

/// Account queries
#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn get_total_equity(&self) -> ExchangeResult<Decimal>;

    async fn get_positions(&self) -> ExchangeResult<Vec<Position>>;

    async fn get_order_history(&self) -> ExchangeResult<Vec<OrderRecord>>;
}

/// Order-mutating capability. The only trait that can change account state.
#[async_trait]
pub trait TradingRepository: Send + Sync {
    async fn set_leverage(&self, inst_id: &str, leverage: u32, mode: MarginMode) -> ExchangeResult<()>;

    async fn place_order(&self, order: &OrderRequest) -> ExchangeResult<OrderAck>;
}

/// Append-only sink for cycle records
#[async_trait]
pub trait CycleLog: Send + Sync {
    async fn append(&self, record: CycleRecord) -> AuditResult<()>;
}
