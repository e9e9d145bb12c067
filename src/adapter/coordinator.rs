// src/adapter/coordinator.rs
// Decision cycle coordinator

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::application::service::portfolio_impact;
use crate::application::usecase::{
    DecisionConsultationUseCase, DecisionValidator, ExecutionUseCase, MarketSnapshotUseCase,
};
use crate::config::TradingConfig;
use crate::domain::errors::{panic_message, CycleError, SnapshotError};
use crate::domain::model::{AutonomousDecision, CycleRecord, MarketConditions};
use crate::domain::repository::{AccountRepository, CycleLog};
use crate::domain::service::Scheduler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    Idle,
    Snapshotting,
    Consulting,
    Validating,
    Executing,
    Recording,
    Sleeping,
    Aborted,
}

impl fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = match self {
            CyclePhase::Idle => "idle",
            CyclePhase::Snapshotting => "snapshotting",
            CyclePhase::Consulting => "consulting",
            CyclePhase::Validating => "validating",
            CyclePhase::Executing => "executing",
            CyclePhase::Recording => "recording",
            CyclePhase::Sleeping => "sleeping",
            CyclePhase::Aborted => "aborted",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleTimings {
    pub interval: Duration,
    /// After a skipped cycle; shorter than `interval`
    pub snapshot_cooldown: Duration,
    /// After an aborted cycle; capped at `interval`
    pub error_cooldown: Duration,
}

impl CycleTimings {
    pub fn from_config(config: &TradingConfig) -> Self {
        Self {
            interval: config.interval(),
            snapshot_cooldown: config.snapshot_cooldown(),
            error_cooldown: config.error_cooldown(),
        }
    }
}

/// How one cycle ended
#[derive(Debug)]
pub enum CycleReport {
    Completed { cycle: u64, executed: usize, failed: usize },
    /// No usable market data; no record appended
    Skipped(SnapshotError),
    Aborted(CycleError),
}

/// Everything the loop carries between cycles
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorState {
    /// Attempted cycles so far
    pub cycle: u64,
    /// Capital base for sizing
    pub total_equity: Decimal,
    pub equity_loaded: bool,
    pub completed_cycles: u64,
    pub consecutive_failures: u32,
    pub last_cycle_at: Option<DateTime<Utc>>,
}

struct CycleOutput {
    record: CycleRecord,
    total_equity: Decimal,
}

/// The owned half of the orchestrator that runs inside the spawned cycle task
#[derive(Clone)]
struct CyclePipeline {
    snapshot: Arc<dyn MarketSnapshotUseCase + Send + Sync>,
    consultant: Arc<dyn DecisionConsultationUseCase + Send + Sync>,
    validator: DecisionValidator,
    execution: Arc<dyn ExecutionUseCase + Send + Sync>,
    account: Arc<dyn AccountRepository + Send + Sync>,
    cycle_log: Arc<dyn CycleLog + Send + Sync>,
    scheduler: Arc<dyn Scheduler + Send + Sync>,
    phase: Arc<watch::Sender<CyclePhase>>,
    refresh_equity: bool,
}

impl CyclePipeline {
    fn enter(&self, phase: CyclePhase) {
        self.phase.send_replace(phase);
    }

    async fn run(self, cycle: u64, cached_equity: Decimal) -> Result<CycleOutput, CycleError> {
        self.enter(CyclePhase::Snapshotting);
        let universe = self.snapshot.build_universe(cached_equity).await?;

        self.enter(CyclePhase::Consulting);
        let consultation = self.consultant.consult(&universe).await;

        self.enter(CyclePhase::Validating);
        let mut decision = self.validator.validate(&consultation.decision);
        decision.source = consultation.source;
        log_decision_summary(cycle, &decision);

        self.enter(CyclePhase::Executing);
        let total_equity = self.refreshed_equity(cached_equity).await;
        let outcomes = self.execution.execute(&decision, total_equity).await;

        self.enter(CyclePhase::Recording);
        let active_positions = match self.account.get_positions().await {
            Ok(positions) => Some(positions.iter().filter(|p| !p.size.is_zero()).count()),
            Err(e) => {
                log::warn!("Cycle {}: active positions unavailable: {}", cycle, e);
                None
            }
        };

        let now = self.scheduler.now();
        let record = CycleRecord {
            cycle,
            timestamp: now,
            impact: portfolio_impact(&outcomes),
            conditions: MarketConditions {
                timestamp: now,
                total_equity,
                active_positions,
                market_volatility: universe.portfolio.volatility_regime.clone(),
            },
            decision,
            outcomes,
        };

        self.cycle_log.append(record.clone()).await?;

        Ok(CycleOutput {
            record,
            total_equity,
        })
    }

    /// Falls back to the cached value when the balance query fails
    async fn refreshed_equity(&self, cached: Decimal) -> Decimal {
        if !self.refresh_equity {
            return cached;
        }
        match self.account.get_total_equity().await {
            Ok(equity) => {
                if equity != cached {
                    log::info!("Equity refreshed: {} -> {}", cached, equity);
                }
                equity
            }
            Err(e) => {
                log::warn!("Equity refresh failed, sizing with {}: {}", cached, e);
                cached
            }
        }
    }
}

fn log_decision_summary(cycle: u64, decision: &AutonomousDecision) {
    log::info!(
        "Cycle {}: decision from {:?}, exposure {}, regime {}",
        cycle,
        decision.source,
        decision.portfolio.overall_exposure,
        decision.regime_label()
    );
    for entry in &decision.decisions {
        let d = &entry.decision;
        log::info!(
            "  {}: {} {}x size {} confidence {}",
            entry.coin,
            d.action,
            d.leverage,
            d.position_size,
            d.confidence
        );
    }
    for rejection in &decision.rejections {
        log::warn!("  {} rejected: {:?}", rejection.coin, rejection.reason);
    }
}

pub struct CycleOrchestrator {
    pipeline: CyclePipeline,
    scheduler: Arc<dyn Scheduler + Send + Sync>,
    account: Arc<dyn AccountRepository + Send + Sync>,
    timings: CycleTimings,
    fallback_equity: Decimal,
    phase: Arc<watch::Sender<CyclePhase>>,
    state: OrchestratorState,
}

impl CycleOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        snapshot: Arc<dyn MarketSnapshotUseCase + Send + Sync>,
        consultant: Arc<dyn DecisionConsultationUseCase + Send + Sync>,
        execution: Arc<dyn ExecutionUseCase + Send + Sync>,
        account: Arc<dyn AccountRepository + Send + Sync>,
        cycle_log: Arc<dyn CycleLog + Send + Sync>,
        scheduler: Arc<dyn Scheduler + Send + Sync>,
        timings: CycleTimings,
        fallback_equity: Decimal,
        refresh_equity: bool,
    ) -> Self {
        let (phase, _) = watch::channel(CyclePhase::Idle);
        let phase = Arc::new(phase);

        Self {
            pipeline: CyclePipeline {
                snapshot,
                consultant,
                validator: DecisionValidator::new(),
                execution,
                account: account.clone(),
                cycle_log,
                scheduler: scheduler.clone(),
                phase: phase.clone(),
                refresh_equity,
            },
            scheduler,
            account,
            timings,
            fallback_equity,
            phase,
            state: OrchestratorState {
                cycle: 0,
                total_equity: fallback_equity,
                equity_loaded: false,
                completed_cycles: 0,
                consecutive_failures: 0,
                last_cycle_at: None,
            },
        }
    }

    pub fn state(&self) -> &OrchestratorState {
        &self.state
    }

    pub fn phase(&self) -> CyclePhase {
        *self.phase.borrow()
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<CyclePhase> {
        self.phase.subscribe()
    }

    /// Startup equity read. A failure keeps the configured fallback.
    pub async fn initialize(&mut self) {
        match self.account.get_total_equity().await {
            Ok(equity) => {
                log::info!("Total equity: {}", equity);
                self.state.total_equity = equity;
            }
            Err(e) => {
                log::warn!(
                    "Failed to read total equity, using fallback {}: {}",
                    self.fallback_equity,
                    e
                );
                self.state.total_equity = self.fallback_equity;
            }
        }
        self.state.equity_loaded = true;
    }

    /// Runs one cycle in its own task so a panic is contained
    pub async fn run_cycle(&mut self) -> CycleReport {
        if !self.state.equity_loaded {
            self.initialize().await;
        }

        self.state.cycle += 1;
        let cycle = self.state.cycle;
        self.state.last_cycle_at = Some(self.scheduler.now());
        log::info!("Cycle {} starting", cycle);

        let pipeline = self.pipeline.clone();
        let equity = self.state.total_equity;
        let handle = tokio::spawn(pipeline.run(cycle, equity));

        let report = match handle.await {
            Ok(Ok(output)) => {
                self.state.total_equity = output.total_equity;
                self.state.completed_cycles += 1;
                self.state.consecutive_failures = 0;
                CycleReport::Completed {
                    cycle,
                    executed: output.record.executed_count(),
                    failed: output.record.failed_count(),
                }
            }
            Ok(Err(CycleError::Snapshot(e))) => CycleReport::Skipped(e),
            Ok(Err(e)) => CycleReport::Aborted(e),
            Err(join_error) if join_error.is_panic() => {
                let payload = join_error.into_panic();
                CycleReport::Aborted(CycleError::Panicked(panic_message(payload.as_ref())))
            }
            Err(_) => CycleReport::Aborted(CycleError::Cancelled),
        };

        match &report {
            CycleReport::Completed { executed, failed, .. } => {
                log::info!(
                    "Cycle {} recorded: {} executed, {} failed",
                    cycle,
                    executed,
                    failed
                );
            }
            CycleReport::Skipped(e) => {
                log::warn!("Cycle {} skipped in {}: {}", cycle, CyclePhase::Snapshotting, e);
            }
            CycleReport::Aborted(e) => {
                self.state.consecutive_failures += 1;
                log::error!(
                    "Cycle {} aborted in {}: {} ({} consecutive)",
                    cycle,
                    self.phase(),
                    e,
                    self.state.consecutive_failures
                );
                self.phase.send_replace(CyclePhase::Aborted);
            }
        }

        report
    }

    pub fn next_sleep(&self, report: &CycleReport) -> Duration {
        match report {
            CycleReport::Completed { .. } => self.timings.interval,
            CycleReport::Skipped(_) => self.timings.snapshot_cooldown,
            CycleReport::Aborted(_) => self.timings.error_cooldown.min(self.timings.interval),
        }
    }

    /// Loops until `shutdown` turns true. The flag is checked before each
    /// cycle and interrupts the sleep between cycles.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        log::info!(
            "Decision loop started, interval {}s",
            self.timings.interval.as_secs()
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            let report = self.run_cycle().await;
            let pause = self.next_sleep(&report);

            if *shutdown.borrow() {
                break;
            }

            self.phase.send_replace(CyclePhase::Sleeping);
            log::info!("Sleeping {}s before next cycle", pause.as_secs());

            tokio::select! {
                _ = self.scheduler.sleep(pause) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        log::warn!("Shutdown channel closed");
                        break;
                    }
                }
            }
        }

        self.phase.send_replace(CyclePhase::Idle);
        log::info!(
            "Decision loop stopped after {} cycles ({} recorded)",
            self.state.cycle,
            self.state.completed_cycles
        );
    }
}
