use thiserror::Error;

use crate::models::BotState;

/// Configurable risk limits.
#[derive(Debug, Clone, Copy)]
pub struct RiskLimits {
    /// Losing closes allowed per day before the circuit breaker trips (default 3).
    pub max_daily_losses: u32,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self { max_daily_losses: 3 }
    }
}

/// Risk check violation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RiskViolation {
    #[error("daily loss limit reached: {losses}/{max} losing trades")]
    DailyLossLimitReached { losses: u32, max: u32 },
}

/// Daily loss check. Fails once the loss counter has reached the limit.
pub fn check_daily_losses(state: &BotState, limits: &RiskLimits) -> Result<(), RiskViolation> {
    if state.daily_losses >= limits.max_daily_losses {
        return Err(RiskViolation::DailyLossLimitReached {
            losses: state.daily_losses,
            max: limits.max_daily_losses,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
