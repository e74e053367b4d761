use rust_decimal::Decimal;
use serde::Serialize;

use crate::execution::risk_manager::RiskLimits;
use crate::execution::scan_loop::record_gauges;
use crate::models::bot_state::{ACTIVATED_MESSAGE, PAUSED_MESSAGE};
use crate::models::{ActiveTrade, Mode};
use crate::services::notifier::{self, AlertDispatcher};
use crate::store::StateStore;

/// Body of `GET /api/status`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub is_running: bool,
    pub status_message: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub realized_pnl_today: Decimal,
    pub daily_losses: u32,
    pub max_daily_losses: u32,
    pub active_trades: Vec<ActiveTrade>,
}

/// Body of the start/stop acknowledgements.
#[derive(Debug, Clone, Serialize)]
pub struct ControlAck {
    pub message: String,
}

/// Remote-control operations. Every call succeeds; start and stop are
/// idempotent and only alert when the mode actually changes.
#[derive(Debug, Clone)]
pub struct BotController {
    store: StateStore,
    alerts: AlertDispatcher,
    limits: RiskLimits,
}

impl BotController {
    pub fn new(store: StateStore, alerts: AlertDispatcher, limits: RiskLimits) -> Self {
        Self {
            store,
            alerts,
            limits,
        }
    }

    pub fn status(&self) -> StatusReport {
        let state = self.store.read_snapshot();
        StatusReport {
            is_running: state.is_running(),
            status_message: state.status_message,
            realized_pnl_today: state.realized_pnl_today,
            daily_losses: state.daily_losses,
            max_daily_losses: self.limits.max_daily_losses,
            active_trades: state.active_trades,
        }
    }

    pub fn start(&self) -> ControlAck {
        let changed = self.store.apply(|state| {
            let changed = state.transition(Mode::Running, ACTIVATED_MESSAGE);
            record_gauges(state);
            changed
        });

        if changed {
            tracing::info!("Bot started via API call");
            self.alerts.notify(notifier::format_activated());
        } else {
            tracing::debug!("Start requested but bot already running");
        }

        ControlAck {
            message: "Bot started successfully.".into(),
        }
    }

    pub fn stop(&self) -> ControlAck {
        let changed = self.store.apply(|state| {
            let changed = state.transition(Mode::Paused, PAUSED_MESSAGE);
            record_gauges(state);
            changed
        });

        if changed {
            tracing::warn!("Bot stopped via API call");
            self.alerts.notify(notifier::format_deactivated());
        } else {
            tracing::debug!("Stop requested but bot already paused");
        }

        ControlAck {
            message: "Bot stopped successfully.".into(),
        }
    }
}
