use async_trait::async_trait;
use thiserror::Error;

use crate::models::{BotState, TradeDecision};

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("market data unavailable: {0}")]
    MarketData(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Trade-signal hook invoked once per scan cycle while the bot is running.
///
/// Receives a snapshot taken at the start of the cycle; the snapshot is a
/// copy, so the live state may already have moved on (e.g. a remote stop).
/// Returned decisions are applied atomically, or not at all.
#[async_trait]
pub trait Strategy: Send + Sync {
    fn name(&self) -> &str;

    async fn scan(&self, snapshot: &BotState) -> Result<Vec<TradeDecision>, StrategyError>;
}

/// Placeholder strategy: scans, never trades.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdleStrategy;

#[async_trait]
impl Strategy for IdleStrategy {
    fn name(&self) -> &str {
        "idle"
    }

    async fn scan(&self, _snapshot: &BotState) -> Result<Vec<TradeDecision>, StrategyError> {
        tracing::debug!("Idle strategy: no signals");
        Ok(Vec::new())
    }
}
