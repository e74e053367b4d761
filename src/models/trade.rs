use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::Side;

/// An open position held by the bot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveTrade {
    pub id: Uuid,
    pub market: String,
    pub side: Side,
    #[serde(with = "rust_decimal::serde::float")]
    pub size: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub entry_price: Decimal,
    pub opened_at: DateTime<Utc>,
}

impl ActiveTrade {
    pub fn new(market: impl Into<String>, side: Side, size: Decimal, entry_price: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            market: market.into(),
            side,
            size,
            entry_price,
            opened_at: Utc::now(),
        }
    }

    /// Realized PnL if the trade were closed at `exit_price`. `None` when
    /// the result does not fit in a `Decimal`.
    pub fn pnl_at(&self, exit_price: Decimal) -> Option<Decimal> {
        let move_per_unit = match self.side {
            Side::Buy => exit_price.checked_sub(self.entry_price)?,
            Side::Sell => self.entry_price.checked_sub(exit_price)?,
        };
        move_per_unit.checked_mul(self.size)
    }
}

/// A single decision returned by the strategy hook for one scan cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum TradeDecision {
    Open(ActiveTrade),
    Close { trade_id: Uuid, exit_price: Decimal },
}
