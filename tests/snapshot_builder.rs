//! Market snapshot assembly: partial data is tolerated per field and per
//! instrument, a universe with nothing usable is refused.

mod common;

use common::{snapshot_builder, start_time, ExchangeCall, MockExchange};
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;

use autonomous_trader::adapter::ManualScheduler;
use autonomous_trader::application::usecase::MarketSnapshotUseCase;
use autonomous_trader::domain::errors::SnapshotError;
use autonomous_trader::domain::model::{AccountHealth, Timeframe};

#[tokio::test]
async fn test_full_universe_is_collected() {
    let exchange = Arc::new(MockExchange::new(dec!(1000)));
    let scheduler = Arc::new(ManualScheduler::new(start_time()));
    let builder = snapshot_builder(exchange.clone(), scheduler.clone(), &["BTC", "ETH", "SOL"]);

    let universe = builder.build_universe(dec!(2500)).await.unwrap();

    assert_eq!(universe.instruments.len(), 3);
    assert_eq!(universe.usable_instruments(), 3);
    assert_eq!(universe.captured_at, start_time());
    assert_eq!(universe.portfolio.total_equity, dec!(2500));
    assert_eq!(universe.portfolio.account.health, AccountHealth::Excellent);

    let btc = &universe.instruments["BTC"];
    assert_eq!(btc.inst_id, "BTC-USD-SWAP");
    assert_eq!(btc.candles.len(), Timeframe::ALL.len());
    assert!(btc.funding_rate.is_some());
    assert_eq!(btc.open_interest, Some(dec!(50000)));
    assert!(btc.volatility.historical_volatility.is_some());

    // A pause between instruments, none before the first
    assert_eq!(scheduler.sleeps(), vec![Duration::from_millis(100); 2]);

    // Snapshotting never touches the trading capability
    assert!(exchange.trading_calls().is_empty());
}

#[tokio::test]
async fn test_one_broken_instrument_does_not_sink_the_snapshot() {
    let exchange = Arc::new(MockExchange::new(dec!(1000)));
    exchange.break_instrument("ETH-USD-SWAP");
    let scheduler = Arc::new(ManualScheduler::new(start_time()));
    let builder = snapshot_builder(exchange.clone(), scheduler, &["BTC", "ETH", "SOL"]);

    let universe = builder.build_universe(dec!(1000)).await.unwrap();

    assert_eq!(universe.instruments.len(), 3);
    assert_eq!(universe.usable_instruments(), 2);

    let eth = &universe.instruments["ETH"];
    assert!(!eth.is_usable());
    assert!(eth.funding_rate.is_none());
    assert!(eth.recent_trades.is_empty());
    assert!(eth.volatility.historical_volatility.is_none());

    // Every field of the broken instrument was still attempted
    let eth_calls = exchange
        .calls()
        .into_iter()
        .filter(|c| match c {
            ExchangeCall::Candles(inst, _)
            | ExchangeCall::OrderBook(inst)
            | ExchangeCall::FundingRate(inst)
            | ExchangeCall::OpenInterest(inst)
            | ExchangeCall::RecentTrades(inst) => inst == "ETH-USD-SWAP",
            _ => false,
        })
        .count();
    assert_eq!(eth_calls, Timeframe::ALL.len() + 4);
}

#[tokio::test]
async fn test_no_usable_instrument_is_incomplete() {
    let exchange = Arc::new(MockExchange::new(dec!(1000)));
    exchange.set_market_down(true);
    let scheduler = Arc::new(ManualScheduler::new(start_time()));
    let builder = snapshot_builder(exchange, scheduler, &["BTC", "ETH"]);

    let result = builder.build_universe(dec!(1000)).await;

    assert_eq!(result, Err(SnapshotError::Incomplete { requested: 2 }));
}

#[tokio::test]
async fn test_account_failure_degrades_health_only() {
    let exchange = Arc::new(MockExchange::new(dec!(1000)));
    exchange.set_equity(None);
    let scheduler = Arc::new(ManualScheduler::new(start_time()));
    let builder = snapshot_builder(exchange, scheduler, &["BTC"]);

    let universe = builder.build_universe(dec!(1000)).await.unwrap();

    assert_eq!(universe.portfolio.account.health, AccountHealth::Unknown);
    assert_eq!(universe.portfolio.total_equity, dec!(1000));
}
