use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use metrics::{counter, gauge};
use rust_decimal::Decimal;
use thiserror::Error;
use tokio::time::sleep;

use crate::models::bot_state::{PAUSED_MESSAGE, SCANNING_MESSAGE};
use crate::models::{BotState, Mode, TradeDecision};
use crate::services::notifier::{self, AlertDispatcher};
use crate::store::StateStore;

use super::risk_manager::{self, RiskLimits, RiskViolation};
use super::strategy::{Strategy, StrategyError};

/// Timing and limits for the scan loop.
#[derive(Debug, Clone, Copy)]
pub struct ScanLoopConfig {
    /// Sleep after a cycle while running. Also bounds a single strategy call.
    pub scan_interval: Duration,
    /// Sleep after a cycle while paused.
    pub idle_interval: Duration,
    pub risk_limits: RiskLimits,
}

impl Default for ScanLoopConfig {
    fn default() -> Self {
        Self {
            scan_interval: Duration::from_secs(15),
            idle_interval: Duration::from_secs(5),
            risk_limits: RiskLimits::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("strategy failed: {0}")]
    Strategy(#[from] StrategyError),

    #[error("strategy did not answer within {0:?}")]
    TimedOut(Duration),

    #[error("strategy panicked: {0}")]
    Panicked(String),
}

/// What a batch of decisions did to the state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplyReport {
    pub opened: usize,
    pub closed: usize,
    pub losses: u32,
    pub realized_pnl: Decimal,
    /// Decisions not applied: rejected closes (unknown id, PnL overflow) or
    /// the tail of a batch cut short by the circuit breaker.
    pub skipped: usize,
    pub tripped: Option<RiskViolation>,
}

/// Result of one loop iteration.
#[derive(Debug)]
pub enum CycleOutcome {
    /// Bot was paused; nothing but the status message was touched.
    Idle,
    Scanned(ApplyReport),
    /// Bot was stopped while the strategy ran; its decisions were dropped.
    Discarded { decisions: usize },
    Failed(ScanError),
}

/// Apply a strategy batch to `state`. Must run inside `StateStore::apply`.
///
/// After every losing close the daily loss limit is checked; once it is
/// reached the bot is paused and the remaining decisions are skipped.
pub fn apply_decisions(
    state: &mut BotState,
    decisions: Vec<TradeDecision>,
    limits: &RiskLimits,
) -> ApplyReport {
    let mut report = ApplyReport::default();
    let total = decisions.len();

    for (idx, decision) in decisions.into_iter().enumerate() {
        match decision {
            TradeDecision::Open(trade) => {
                tracing::info!(
                    trade_id = %trade.id,
                    market = %trade.market,
                    side = %trade.side,
                    size = %trade.size,
                    entry_price = %trade.entry_price,
                    "Opening trade"
                );
                state.active_trades.push(trade);
                report.opened += 1;
            }
            TradeDecision::Close { trade_id, exit_price } => {
                let pnl = match state.close_trade(trade_id, exit_price) {
                    Ok(pnl) => pnl,
                    Err(e) => {
                        tracing::warn!(error = %e, exit_price = %exit_price, "Close rejected, skipping");
                        report.skipped += 1;
                        continue;
                    }
                };

                tracing::info!(trade_id = %trade_id, exit_price = %exit_price, pnl = %pnl, "Trade closed");
                report.closed += 1;
                report.realized_pnl = report.realized_pnl.saturating_add(pnl);

                if pnl < Decimal::ZERO {
                    report.losses += 1;
                    if let Err(violation) = risk_manager::check_daily_losses(state, limits) {
                        state.mode = Mode::Paused;
                        state.status_message = format!("Circuit breaker tripped: {violation}");
                        report.skipped += total - idx - 1;
                        report.tripped = Some(violation);
                        break;
                    }
                }
            }
        }
    }

    report
}

/// Background market scanner. Level-triggered: reads the mode at the start
/// of every cycle instead of waiting for start/stop events.
#[derive(Clone)]
pub struct ScanLoop {
    store: StateStore,
    strategy: Arc<dyn Strategy>,
    alerts: AlertDispatcher,
    config: ScanLoopConfig,
}

impl ScanLoop {
    pub fn new(
        store: StateStore,
        strategy: Arc<dyn Strategy>,
        alerts: AlertDispatcher,
        config: ScanLoopConfig,
    ) -> Self {
        Self {
            store,
            strategy,
            alerts,
            config,
        }
    }

    /// Run forever. Only process shutdown stops it.
    pub async fn run(self) {
        tracing::info!(
            strategy = self.strategy.name(),
            scan_interval = ?self.config.scan_interval,
            idle_interval = ?self.config.idle_interval,
            max_daily_losses = self.config.risk_limits.max_daily_losses,
            "Trading loop started"
        );

        loop {
            let outcome = self.run_cycle().await;
            sleep(self.interval_after(&outcome)).await;
        }
    }

    /// Run `cycles` iterations, sleeping between them as `run` would.
    pub async fn run_cycles(&self, cycles: usize) -> Vec<CycleOutcome> {
        let mut outcomes = Vec::with_capacity(cycles);
        for i in 0..cycles {
            let outcome = self.run_cycle().await;
            if i + 1 < cycles {
                sleep(self.interval_after(&outcome)).await;
            }
            outcomes.push(outcome);
        }
        outcomes
    }

    /// One iteration of the loop, without the trailing sleep.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let snapshot = self.store.apply(|state| {
            match state.mode {
                Mode::Running => state.status_message = SCANNING_MESSAGE.into(),
                Mode::Paused => state.status_message = PAUSED_MESSAGE.into(),
            }
            record_gauges(state);
            state.clone()
        });

        if !snapshot.is_running() {
            tracing::debug!(mode = %snapshot.mode, "Bot paused, skipping scan");
            return CycleOutcome::Idle;
        }

        tracing::info!(strategy = self.strategy.name(), "Scanning markets...");
        counter!("scan_cycles_total").increment(1);

        let decisions = match self.call_strategy(&snapshot).await {
            Ok(d) => d,
            Err(e) => {
                counter!("scan_failures_total").increment(1);
                tracing::error!(error = %e, "Scan cycle failed, continuing with next cycle");
                return CycleOutcome::Failed(e);
            }
        };

        let limits = self.config.risk_limits;
        let outcome = self.store.apply(|state| {
            let outcome = if state.is_running() {
                CycleOutcome::Scanned(apply_decisions(state, decisions, &limits))
            } else {
                CycleOutcome::Discarded {
                    decisions: decisions.len(),
                }
            };
            record_gauges(state);
            outcome
        });

        match &outcome {
            CycleOutcome::Discarded { decisions } => {
                tracing::info!(decisions = *decisions, "Bot stopped during scan, decisions discarded");
            }
            CycleOutcome::Scanned(report) => {
                if report.opened + report.closed > 0 {
                    tracing::info!(
                        opened = report.opened,
                        closed = report.closed,
                        losses = report.losses,
                        realized_pnl = %report.realized_pnl,
                        "Scan results applied"
                    );
                }
                if let Some(violation) = &report.tripped {
                    counter!("circuit_breaker_trips_total").increment(1);
                    tracing::warn!(violation = %violation, "Circuit breaker tripped, bot PAUSED");
                    self.alerts.notify(notifier::format_circuit_breaker(violation));
                }
            }
            _ => {}
        }

        outcome
    }

    async fn call_strategy(&self, snapshot: &BotState) -> Result<Vec<TradeDecision>, ScanError> {
        let budget = self.config.scan_interval;
        let scan = AssertUnwindSafe(self.strategy.scan(snapshot)).catch_unwind();

        match tokio::time::timeout(budget, scan).await {
            Err(_) => Err(ScanError::TimedOut(budget)),
            Ok(Err(panic)) => Err(ScanError::Panicked(panic_message(panic.as_ref()))),
            Ok(Ok(result)) => Ok(result?),
        }
    }

    fn interval_after(&self, outcome: &CycleOutcome) -> Duration {
        match outcome {
            CycleOutcome::Idle => self.config.idle_interval,
            _ => self.config.scan_interval,
        }
    }
}

/// Publish state gauges. Call with the store's write lock held so the
/// exported `bot_running` always matches the last committed mode.
pub(crate) fn record_gauges(state: &BotState) {
    gauge!("bot_running").set(if state.is_running() { 1.0 } else { 0.0 });
    gauge!("daily_losses").set(f64::from(state.daily_losses));
    gauge!("active_trades").set(state.active_trades.len() as f64);
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".into()
    }
}
