// src/main.rs
use autonomous_trader::adapter::{CycleOrchestrator, CycleTimings, TokioScheduler};
use autonomous_trader::application::usecase::{
    DecisionConsultant, ExecutionEngine, MarketSnapshotBuilder, SnapshotSettings,
};
use autonomous_trader::config::Config;
use autonomous_trader::domain::errors::AppResult;
use autonomous_trader::domain::repository::CycleLog;
use autonomous_trader::domain::service::Scheduler;
use autonomous_trader::infrastructure::analysis::{DefaultInstrumentAnalyzer, DefaultMarketAnalyzer};
use autonomous_trader::infrastructure::audit::{FanOutCycleLog, InMemoryCycleLog, JsonlCycleLog};
use autonomous_trader::infrastructure::exchange::OkxClient;
use autonomous_trader::infrastructure::llm::DeepSeekClient;
use autonomous_trader::infrastructure::risk::BasicRiskAssessor;
use autonomous_trader::infrastructure::strategy::{DeferredProtection, UnimplementedStrategies};

use std::env;
use std::sync::Arc;
use tokio::signal::ctrl_c;
use tokio::sync::watch;

fn load_config() -> AppResult<Config> {
    dotenv::dotenv().ok();
    match env::var("CONFIG_FILE") {
        Ok(path) => Config::from_file(path),
        Err(_) => Config::from_env(),
    }
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Load configuration
    let config = load_config()?;

    // Initialize logging
    config.init_logging()?;

    log::info!("Starting autonomous_trader v{}", env!("CARGO_PKG_VERSION"));
    log::info!(
        "{} instruments, decision every {}s, {} trading",
        config.trading.instruments.len(),
        config.trading.interval_secs,
        if config.exchange.simulated { "demo" } else { "live" }
    );

    let scheduler: Arc<dyn Scheduler + Send + Sync> = Arc::new(TokioScheduler::new());
    let okx = Arc::new(OkxClient::new(&config.exchange));

    let settings = SnapshotSettings {
        instruments: config
            .trading
            .instruments
            .iter()
            .map(|coin| (coin.clone(), config.exchange.instrument_id(coin)))
            .collect(),
        candle_limit: config.trading.candle_limit,
        order_book_depth: config.trading.order_book_depth,
        trade_limit: config.trading.trade_limit,
        fetch_pause: config.trading.fetch_pause(),
    };

    let snapshot = Arc::new(MarketSnapshotBuilder::new(
        okx.clone(),
        okx.clone(),
        Arc::new(DefaultInstrumentAnalyzer::new()),
        Arc::new(DefaultMarketAnalyzer::new()),
        Arc::new(BasicRiskAssessor::new()),
        scheduler.clone(),
        settings,
    ));

    let consultant = Arc::new(DecisionConsultant::new(
        Arc::new(DeepSeekClient::new(&config.decision)),
        config.decision.timeout(),
    ));

    let execution = Arc::new(ExecutionEngine::new(
        okx.clone(),
        Arc::new(UnimplementedStrategies::new()),
        Arc::new(DeferredProtection::new()),
        scheduler.clone(),
        config.exchange.instrument_suffix.clone(),
        config.trading.min_position_size,
    ));

    let history = Arc::new(InMemoryCycleLog::new());
    let cycle_log: Arc<dyn CycleLog + Send + Sync> = match &config.audit.file_path {
        Some(path) => {
            log::info!("Appending cycle records to {}", path);
            let sinks: Vec<Arc<dyn CycleLog + Send + Sync>> =
                vec![history.clone(), Arc::new(JsonlCycleLog::new(path))];
            Arc::new(FanOutCycleLog::new(sinks))
        }
        None => history.clone(),
    };

    let mut orchestrator = CycleOrchestrator::new(
        snapshot,
        consultant,
        execution,
        okx.clone(),
        cycle_log,
        scheduler,
        CycleTimings::from_config(&config.trading),
        config.trading.fallback_equity,
        config.trading.refresh_equity,
    );

    // Wait for shutdown signal
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match ctrl_c().await {
            Ok(()) => {
                log::info!("Interrupt received, stopping...");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                log::error!("Failed to listen for control-c event: {}", e);
                // Keep the sender alive so the loop is not stopped
                std::future::pending::<()>().await;
                drop(shutdown_tx);
            }
        }
    });

    log::info!("Trader is running. Press Ctrl+C to stop.");
    orchestrator.run(shutdown_rx).await;

    log::info!(
        "Shutdown complete. {} cycle records this run. Goodbye!",
        history.len()
    );
    Ok(())
}
