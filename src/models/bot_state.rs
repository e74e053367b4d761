use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use super::{ActiveTrade, Mode};

pub const IDLE_MESSAGE: &str = "Bot is currently idle.";
pub const PAUSED_MESSAGE: &str = "Bot is paused. No new trades will be initiated.";
pub const SCANNING_MESSAGE: &str = "Scanning markets for opportunities...";
pub const ACTIVATED_MESSAGE: &str = "Bot activated remotely. Waiting for next scan cycle.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CloseError {
    #[error("no open trade with id {0}")]
    UnknownTrade(Uuid),

    #[error("pnl for trade {0} overflows")]
    Overflow(Uuid),
}

/// The bot's live memory. Only ever mutated through `StateStore::apply`.
#[derive(Debug, Clone, PartialEq)]
pub struct BotState {
    pub mode: Mode,
    pub status_message: String,
    pub daily_losses: u32,
    pub realized_pnl_today: Decimal,
    pub active_trades: Vec<ActiveTrade>,
}

impl Default for BotState {
    fn default() -> Self {
        Self {
            mode: Mode::Paused,
            status_message: IDLE_MESSAGE.into(),
            daily_losses: 0,
            realized_pnl_today: Decimal::ZERO,
            active_trades: Vec::new(),
        }
    }
}

impl BotState {
    pub fn is_running(&self) -> bool {
        self.mode.is_running()
    }

    /// Switch to `mode`. Returns false when already there.
    pub fn transition(&mut self, mode: Mode, status_message: &str) -> bool {
        if self.mode == mode {
            return false;
        }
        self.mode = mode;
        self.status_message = status_message.into();
        true
    }

    /// Remove the trade and book its PnL. On error nothing is changed.
    pub fn close_trade(&mut self, trade_id: Uuid, exit_price: Decimal) -> Result<Decimal, CloseError> {
        let idx = self
            .active_trades
            .iter()
            .position(|t| t.id == trade_id)
            .ok_or(CloseError::UnknownTrade(trade_id))?;

        let pnl = self.active_trades[idx]
            .pnl_at(exit_price)
            .ok_or(CloseError::Overflow(trade_id))?;
        let realized = self
            .realized_pnl_today
            .checked_add(pnl)
            .ok_or(CloseError::Overflow(trade_id))?;

        self.active_trades.remove(idx);
        self.realized_pnl_today = realized;
        if pnl < Decimal::ZERO {
            self.daily_losses = self.daily_losses.saturating_add(1);
        }
        Ok(pnl)
    }
}
