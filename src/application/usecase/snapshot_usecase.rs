// src/application/usecase/snapshot_usecase.rs
// Market snapshot use case

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::errors::SnapshotError;
use crate::domain::model::{
    AccountHealth, AccountStatus, InstrumentSnapshot, MarketUniverse, OrderBook,
    PortfolioSnapshot, Timeframe,
};
use crate::domain::repository::{AccountRepository, MarketDataRepository};
use crate::domain::service::{
    AccountAnalysisService, InstrumentAnalysisService, MarketAnalysisService, Scheduler,
};

/// Market snapshot use case
#[async_trait]
pub trait MarketSnapshotUseCase: Send + Sync {
    /// Build a fresh universe sized against `total_equity`
    async fn build_universe(&self, total_equity: Decimal) -> Result<MarketUniverse, SnapshotError>;
}

#[derive(Debug, Clone)]
pub struct SnapshotSettings {
    /// (coin, instrument id) pairs, fetched in this order
    pub instruments: Vec<(String, String)>,
    pub candle_limit: usize,
    pub order_book_depth: usize,
    pub trade_limit: usize,
    pub fetch_pause: Duration,
}

pub struct MarketSnapshotBuilder {
    market: Arc<dyn MarketDataRepository + Send + Sync>,
    account: Arc<dyn AccountRepository + Send + Sync>,
    instrument_analysis: Arc<dyn InstrumentAnalysisService + Send + Sync>,
    market_analysis: Arc<dyn MarketAnalysisService + Send + Sync>,
    account_analysis: Arc<dyn AccountAnalysisService + Send + Sync>,
    scheduler: Arc<dyn Scheduler + Send + Sync>,
    settings: SnapshotSettings,
}

impl MarketSnapshotBuilder {
    pub fn new(
        market: Arc<dyn MarketDataRepository + Send + Sync>,
        account: Arc<dyn AccountRepository + Send + Sync>,
        instrument_analysis: Arc<dyn InstrumentAnalysisService + Send + Sync>,
        market_analysis: Arc<dyn MarketAnalysisService + Send + Sync>,
        account_analysis: Arc<dyn AccountAnalysisService + Send + Sync>,
        scheduler: Arc<dyn Scheduler + Send + Sync>,
        settings: SnapshotSettings,
    ) -> Self {
        Self {
            market,
            account,
            instrument_analysis,
            market_analysis,
            account_analysis,
            scheduler,
            settings,
        }
    }

    /// Every field is fetched independently. A failed fetch leaves that
    /// field empty and the rest of the instrument is still collected.
    async fn snapshot_instrument(&self, coin: &str, inst_id: &str) -> InstrumentSnapshot {
        let mut candles = BTreeMap::new();
        for timeframe in Timeframe::ALL {
            let series = match self
                .market
                .get_candles(inst_id, timeframe, self.settings.candle_limit)
                .await
            {
                Ok(series) => series,
                Err(e) => {
                    log::warn!("Snapshot: {} candles {} unavailable: {}", inst_id, timeframe, e);
                    Vec::new()
                }
            };
            candles.insert(timeframe, series);
        }

        let order_book = match self
            .market
            .get_order_book(inst_id, self.settings.order_book_depth)
            .await
        {
            Ok(book) => book,
            Err(e) => {
                log::warn!("Snapshot: {} order book unavailable: {}", inst_id, e);
                OrderBook::default()
            }
        };

        let funding_rate = self
            .market
            .get_funding_rate(inst_id)
            .await
            .map_err(|e| log::warn!("Snapshot: {} funding rate unavailable: {}", inst_id, e))
            .ok();

        let open_interest = self
            .market
            .get_open_interest(inst_id)
            .await
            .map_err(|e| log::warn!("Snapshot: {} open interest unavailable: {}", inst_id, e))
            .ok();

        let recent_trades = self
            .market
            .get_recent_trades(inst_id, self.settings.trade_limit)
            .await
            .unwrap_or_else(|e| {
                log::warn!("Snapshot: {} recent trades unavailable: {}", inst_id, e);
                Vec::new()
            });

        let volatility = self.instrument_analysis.volatility(&candles);
        let structure = self.instrument_analysis.market_structure(&candles, &order_book);
        let temporal = self.instrument_analysis.temporal_patterns(&candles);

        InstrumentSnapshot {
            coin: coin.to_string(),
            inst_id: inst_id.to_string(),
            candles,
            order_book,
            funding_rate,
            open_interest,
            recent_trades,
            volatility,
            structure,
            temporal,
        }
    }

    /// Health is `excellent` only when all three account queries answer
    async fn account_status(&self, total_equity: Decimal) -> AccountStatus {
        let balance = self.account.get_total_equity().await;
        let positions = self.account.get_positions().await;
        let history = self.account.get_order_history().await;

        let health = if balance.is_ok() && positions.is_ok() && history.is_ok() {
            AccountHealth::Excellent
        } else {
            if let Err(e) = &balance {
                log::warn!("Snapshot: account balance unavailable: {}", e);
            }
            if let Err(e) = &history {
                log::warn!("Snapshot: order history unavailable: {}", e);
            }
            AccountHealth::Unknown
        };

        match positions {
            Ok(positions) => AccountStatus {
                health,
                leverage_usage: self.account_analysis.leverage_usage(total_equity, &positions),
                margin_health: self.account_analysis.margin_health(&positions),
                concentration_risk: self.account_analysis.concentration_risk(&positions),
            },
            Err(e) => {
                log::warn!("Snapshot: positions unavailable: {}", e);
                AccountStatus {
                    health,
                    ..AccountStatus::unknown()
                }
            }
        }
    }
}

#[async_trait]
impl MarketSnapshotUseCase for MarketSnapshotBuilder {
    async fn build_universe(&self, total_equity: Decimal) -> Result<MarketUniverse, SnapshotError> {
        let captured_at = self.scheduler.now();
        let mut instruments = BTreeMap::new();

        for (index, (coin, inst_id)) in self.settings.instruments.iter().enumerate() {
            if index > 0 && !self.settings.fetch_pause.is_zero() {
                self.scheduler.sleep(self.settings.fetch_pause).await;
            }
            let snapshot = self.snapshot_instrument(coin, inst_id).await;
            log::debug!(
                "Snapshot: {} collected (usable: {}, last price: {:?})",
                inst_id,
                snapshot.is_usable(),
                snapshot.last_price()
            );
            instruments.insert(coin.clone(), snapshot);
        }

        let usable = instruments.values().filter(|s| s.is_usable()).count();
        if usable == 0 {
            return Err(SnapshotError::Incomplete {
                requested: self.settings.instruments.len(),
            });
        }

        let account = self.account_status(total_equity).await;

        let portfolio = PortfolioSnapshot {
            total_equity,
            account,
            market_regime: self.market_analysis.market_regime(&instruments),
            correlations: self.market_analysis.correlations(&instruments),
            risk_appetite_index: self.market_analysis.risk_appetite(&instruments),
            liquidity_conditions: self.market_analysis.liquidity_conditions(&instruments),
            volatility_regime: self.market_analysis.volatility_regime(&instruments),
        };

        log::info!(
            "Snapshot: {}/{} instruments usable, regime {}, equity {}",
            usable,
            self.settings.instruments.len(),
            portfolio.market_regime,
            total_equity
        );

        Ok(MarketUniverse {
            captured_at,
            instruments,
            portfolio,
        })
    }
}
