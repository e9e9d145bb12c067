// Shared mock collaborators for the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use autonomous_trader::adapter::{CycleOrchestrator, CycleTimings, ManualScheduler};
use autonomous_trader::application::usecase::decision_usecase::parse_decision;
use autonomous_trader::application::usecase::{
    DecisionConsultant, DecisionValidator, ExecutionEngine, MarketSnapshotBuilder,
    MarketSnapshotUseCase, SnapshotSettings,
};
use autonomous_trader::domain::errors::{DecisionError, DecisionResult, ExchangeError, ExchangeResult};
use autonomous_trader::domain::model::{
    AutonomousDecision, BookLevel, MarketUniverse, Candle, FundingRate, MarginMode, OrderAck, OrderBook, OrderRecord, OrderRequest,
    Position, Timeframe, TradePrint, TradeSide,
};
use autonomous_trader::domain::repository::{
    AccountRepository, MarketDataRepository, TradingRepository,
};
use autonomous_trader::domain::model::{Action, ProtectionStatus};
use autonomous_trader::domain::service::{
    DecisionPrompt, DecisionService, ProtectionRequest, ProtectiveOrderService,
    StrategyExecutionService, StrategyRequest, StrategyResult,
};
use autonomous_trader::infrastructure::analysis::{DefaultInstrumentAnalyzer, DefaultMarketAnalyzer};
use autonomous_trader::infrastructure::audit::InMemoryCycleLog;
use autonomous_trader::infrastructure::risk::BasicRiskAssessor;
use autonomous_trader::infrastructure::strategy::{DeferredProtection, UnimplementedStrategies};

pub const SUFFIX: &str = "-USD-SWAP";

#[derive(Debug, Clone, PartialEq)]
pub enum ExchangeCall {
    Candles(String, Timeframe),
    OrderBook(String),
    FundingRate(String),
    OpenInterest(String),
    RecentTrades(String),
    TotalEquity,
    Positions,
    OrderHistory,
    SetLeverage { inst_id: String, leverage: u32 },
    PlaceOrder(OrderRequest),
}

impl ExchangeCall {
    pub fn is_trading(&self) -> bool {
        matches!(self, ExchangeCall::SetLeverage { .. } | ExchangeCall::PlaceOrder(_))
    }
}

/// Exchange double recording every call. Failures are opt-in per
/// instrument or per capability.
pub struct MockExchange {
    calls: Mutex<Vec<ExchangeCall>>,
    equity: Mutex<Option<Decimal>>,
    market_down: AtomicBool,
    broken_instruments: Mutex<HashSet<String>>,
    failing_leverage: Mutex<HashSet<String>>,
    failing_orders: Mutex<HashSet<String>>,
    next_order_id: AtomicU64,
}

impl MockExchange {
    pub fn new(equity: Decimal) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            equity: Mutex::new(Some(equity)),
            market_down: AtomicBool::new(false),
            broken_instruments: Mutex::new(HashSet::new()),
            failing_leverage: Mutex::new(HashSet::new()),
            failing_orders: Mutex::new(HashSet::new()),
            next_order_id: AtomicU64::new(1000),
        }
    }

    pub fn set_equity(&self, equity: Option<Decimal>) {
        *self.equity.lock().unwrap() = equity;
    }

    /// Every market data call fails
    pub fn set_market_down(&self, down: bool) {
        self.market_down.store(down, Ordering::SeqCst);
    }

    /// Market data calls fail for one instrument only
    pub fn break_instrument(&self, inst_id: &str) {
        self.broken_instruments.lock().unwrap().insert(inst_id.to_string());
    }

    pub fn fail_leverage(&self, inst_id: &str) {
        self.failing_leverage.lock().unwrap().insert(inst_id.to_string());
    }

    pub fn fail_orders(&self, inst_id: &str) {
        self.failing_orders.lock().unwrap().insert(inst_id.to_string());
    }

    pub fn calls(&self) -> Vec<ExchangeCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn trading_calls(&self) -> Vec<ExchangeCall> {
        self.calls().into_iter().filter(|c| c.is_trading()).collect()
    }

    pub fn placed_orders(&self) -> Vec<OrderRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ExchangeCall::PlaceOrder(order) => Some(order),
                _ => None,
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: ExchangeCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn market_available(&self, inst_id: &str) -> ExchangeResult<()> {
        if self.market_down.load(Ordering::SeqCst)
            || self.broken_instruments.lock().unwrap().contains(inst_id)
        {
            return Err(ExchangeError::Connection("market data unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl MarketDataRepository for MockExchange {
    async fn get_candles(
        &self,
        inst_id: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> ExchangeResult<Vec<Candle>> {
        self.record(ExchangeCall::Candles(inst_id.to_string(), timeframe));
        self.market_available(inst_id)?;
        Ok((0..limit.min(30))
            .map(|i| {
                let close = dec!(100) + Decimal::from(i as u64 % 3);
                Candle {
                    open_time: i as i64 * 60_000,
                    open: close,
                    high: close + dec!(1),
                    low: close - dec!(1),
                    close,
                    volume: dec!(10),
                }
            })
            .collect())
    }

    async fn get_order_book(&self, inst_id: &str, _depth: usize) -> ExchangeResult<OrderBook> {
        self.record(ExchangeCall::OrderBook(inst_id.to_string()));
        self.market_available(inst_id)?;
        Ok(OrderBook {
            bids: vec![BookLevel {
                price: dec!(99.5),
                size: dec!(3),
            }],
            asks: vec![BookLevel {
                price: dec!(100.5),
                size: dec!(2),
            }],
            timestamp: Some(1_700_000_000_000),
        })
    }

    async fn get_funding_rate(&self, inst_id: &str) -> ExchangeResult<FundingRate> {
        self.record(ExchangeCall::FundingRate(inst_id.to_string()));
        self.market_available(inst_id)?;
        Ok(FundingRate {
            rate: dec!(0.0001),
            next_funding_time: None,
        })
    }

    async fn get_open_interest(&self, inst_id: &str) -> ExchangeResult<Decimal> {
        self.record(ExchangeCall::OpenInterest(inst_id.to_string()));
        self.market_available(inst_id)?;
        Ok(dec!(50000))
    }

    async fn get_recent_trades(&self, inst_id: &str, _limit: usize) -> ExchangeResult<Vec<TradePrint>> {
        self.record(ExchangeCall::RecentTrades(inst_id.to_string()));
        self.market_available(inst_id)?;
        Ok(vec![TradePrint {
            trade_id: "1".to_string(),
            price: dec!(100),
            size: dec!(1),
            side: TradeSide::Buy,
            timestamp: 1_700_000_000_000,
        }])
    }
}

#[async_trait]
impl AccountRepository for MockExchange {
    async fn get_total_equity(&self) -> ExchangeResult<Decimal> {
        self.record(ExchangeCall::TotalEquity);
        let equity = *self.equity.lock().unwrap();
        equity.ok_or_else(|| ExchangeError::Authentication("invalid key".to_string()))
    }

    async fn get_positions(&self) -> ExchangeResult<Vec<Position>> {
        self.record(ExchangeCall::Positions);
        let placed = self.placed_orders();
        Ok(placed
            .into_iter()
            .map(|order| Position {
                inst_id: order.inst_id,
                size: order.size,
                notional_usd: order.size * Decimal::from(order.leverage),
                leverage: Some(Decimal::from(order.leverage)),
                unrealized_pnl: Decimal::ZERO,
                average_price: None,
            })
            .collect())
    }

    async fn get_order_history(&self) -> ExchangeResult<Vec<OrderRecord>> {
        self.record(ExchangeCall::OrderHistory);
        Ok(Vec::new())
    }
}

#[async_trait]
impl TradingRepository for MockExchange {
    async fn set_leverage(&self, inst_id: &str, leverage: u32, _mode: MarginMode) -> ExchangeResult<()> {
        self.record(ExchangeCall::SetLeverage {
            inst_id: inst_id.to_string(),
            leverage,
        });
        if self.failing_leverage.lock().unwrap().contains(inst_id) {
            return Err(ExchangeError::Api {
                code: "59000".to_string(),
                message: "leverage rejected".to_string(),
            });
        }
        Ok(())
    }

    async fn place_order(&self, order: &OrderRequest) -> ExchangeResult<OrderAck> {
        self.record(ExchangeCall::PlaceOrder(order.clone()));
        if self.failing_orders.lock().unwrap().contains(&order.inst_id) {
            return Err(ExchangeError::Api {
                code: "51008".to_string(),
                message: "Insufficient balance".to_string(),
            });
        }
        let id = self.next_order_id.fetch_add(1, Ordering::SeqCst);
        Ok(OrderAck {
            order_id: id.to_string(),
            client_order_id: None,
        })
    }
}

pub enum Scripted {
    Content(String),
    TransportError(String),
    Status(u16),
    Hang(Duration),
    Panic,
}

/// Decision transport answering from a script. When the script runs out it
/// answers with an empty decision set.
pub struct ScriptedDecisionService {
    script: Mutex<VecDeque<Scripted>>,
    prompts: Mutex<Vec<DecisionPrompt>>,
}

impl ScriptedDecisionService {
    pub fn new(script: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn answering(content: &str) -> Self {
        Self::new(vec![Scripted::Content(content.to_string())])
    }

    pub fn prompts(&self) -> Vec<DecisionPrompt> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl DecisionService for ScriptedDecisionService {
    async fn request_decision(&self, prompt: &DecisionPrompt) -> DecisionResult<String> {
        self.prompts.lock().unwrap().push(prompt.clone());
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Content(content)) => Ok(content),
            Some(Scripted::TransportError(message)) => Err(DecisionError::Transport(message)),
            Some(Scripted::Status(status)) => Err(DecisionError::Status {
                status,
                body: "upstream error".to_string(),
            }),
            Some(Scripted::Hang(duration)) => {
                tokio::time::sleep(duration).await;
                Ok(r#"{"trading_decisions": {}}"#.to_string())
            }
            Some(Scripted::Panic) => panic!("decision transport exploded"),
            None => Ok(r#"{"trading_decisions": {}}"#.to_string()),
        }
    }
}

pub fn start_time() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
}

pub fn timings() -> CycleTimings {
    CycleTimings {
        interval: Duration::from_secs(1800),
        snapshot_cooldown: Duration::from_secs(60),
        error_cooldown: Duration::from_secs(300),
    }
}

pub fn snapshot_settings(coins: &[&str]) -> SnapshotSettings {
    SnapshotSettings {
        instruments: coins
            .iter()
            .map(|coin| (coin.to_string(), format!("{}{}", coin, SUFFIX)))
            .collect(),
        candle_limit: 100,
        order_book_depth: 25,
        trade_limit: 50,
        fetch_pause: Duration::from_millis(100),
    }
}

pub fn snapshot_builder(
    exchange: Arc<MockExchange>,
    scheduler: Arc<ManualScheduler>,
    coins: &[&str],
) -> MarketSnapshotBuilder {
    MarketSnapshotBuilder::new(
        exchange.clone(),
        exchange,
        Arc::new(DefaultInstrumentAnalyzer::new()),
        Arc::new(DefaultMarketAnalyzer::new()),
        Arc::new(BasicRiskAssessor::new()),
        scheduler,
        snapshot_settings(coins),
    )
}

pub fn execution_engine(exchange: Arc<MockExchange>, scheduler: Arc<ManualScheduler>) -> ExecutionEngine {
    ExecutionEngine::new(
        exchange,
        Arc::new(UnimplementedStrategies::new()),
        Arc::new(DeferredProtection::new()),
        scheduler,
        SUFFIX,
        dec!(0.001),
    )
}

/// Strategy executor that panics on one action and reports the rest as
/// not implemented
pub struct PanickingStrategies {
    pub on: Action,
}

#[async_trait]
impl StrategyExecutionService for PanickingStrategies {
    async fn execute(&self, request: StrategyRequest<'_>) -> ExchangeResult<StrategyResult> {
        if request.decision.action == self.on {
            panic!("strategy executor blew up on {}", request.coin);
        }
        Ok(StrategyResult::NotImplemented)
    }
}

pub enum ProtectionFault {
    Error,
    Panic,
}

/// Protective order service that never succeeds
pub struct BrokenProtection {
    pub fault: ProtectionFault,
}

#[async_trait]
impl ProtectiveOrderService for BrokenProtection {
    async fn protect(&self, request: ProtectionRequest<'_>) -> ExchangeResult<ProtectionStatus> {
        match self.fault {
            ProtectionFault::Error => Err(ExchangeError::Request("sl/tp rejected".to_string())),
            ProtectionFault::Panic => panic!("protection crashed for {}", request.order_id),
        }
    }
}

pub fn execution_engine_with(
    exchange: Arc<MockExchange>,
    scheduler: Arc<ManualScheduler>,
    strategies: Arc<dyn StrategyExecutionService + Send + Sync>,
    protection: Arc<dyn ProtectiveOrderService + Send + Sync>,
) -> ExecutionEngine {
    ExecutionEngine::new(exchange, strategies, protection, scheduler, SUFFIX, dec!(0.001))
}

pub struct Harness {
    pub orchestrator: CycleOrchestrator,
    pub exchange: Arc<MockExchange>,
    pub decisions: Arc<ScriptedDecisionService>,
    pub history: Arc<InMemoryCycleLog>,
    pub scheduler: Arc<ManualScheduler>,
}

pub fn harness(exchange: MockExchange, script: Vec<Scripted>, coins: &[&str]) -> Harness {
    let exchange = Arc::new(exchange);
    let decisions = Arc::new(ScriptedDecisionService::new(script));
    let history = Arc::new(InMemoryCycleLog::new());
    let scheduler = Arc::new(ManualScheduler::new(start_time()));

    let orchestrator = CycleOrchestrator::new(
        Arc::new(snapshot_builder(exchange.clone(), scheduler.clone(), coins)),
        Arc::new(DecisionConsultant::new(
            decisions.clone(),
            Duration::from_secs(5),
        )),
        Arc::new(execution_engine(exchange.clone(), scheduler.clone())),
        exchange.clone(),
        history.clone(),
        scheduler.clone(),
        timings(),
        dec!(1000),
        true,
    );

    Harness {
        orchestrator,
        exchange,
        decisions,
        history,
        scheduler,
    }
}

/// Parse and validate a decision document the way the cycle does
pub fn validated(document: &str) -> AutonomousDecision {
    let raw = parse_decision(document).expect("test document parses");
    DecisionValidator::new().validate(&raw)
}

pub async fn universe(coins: &[&str]) -> MarketUniverse {
    let exchange = Arc::new(MockExchange::new(dec!(1000)));
    let scheduler = Arc::new(ManualScheduler::new(start_time()));
    snapshot_builder(exchange, scheduler, coins)
        .build_universe(dec!(1000))
        .await
        .expect("mock market data is usable")
}
