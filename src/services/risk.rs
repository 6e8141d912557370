//! Position sizing and the daily loss circuit breaker.

use chrono::NaiveDate;

use crate::types::PnlSnapshot;

/// Fixed-fractional position size.
///
/// Risks `equity * risk_fraction` over the distance between entry and stop.
/// A zero distance yields zero; the result is never negative.
pub fn compute_position_size(equity: f64, entry: f64, stop_loss: f64, risk_fraction: f64) -> f64 {
    let risk_amount = equity * risk_fraction;
    let distance = (entry - stop_loss).abs();
    if distance <= 0.0 {
        return 0.0;
    }
    (risk_amount / distance).max(0.0)
}

/// Clamp a quantity so its notional stays within `equity * max_leverage`.
pub fn respect_leverage(equity: f64, entry: f64, quantity: f64, max_leverage: f64) -> f64 {
    let notional = quantity * entry;
    let max_notional = equity * max_leverage;
    if notional <= max_notional {
        return quantity;
    }
    if entry <= 0.0 {
        return 0.0;
    }
    max_notional / entry
}

/// Suppresses trading once the day's realized loss reaches a fraction of
/// equity.
///
/// The day is the UTC calendar date. Moving to a new date resets the PnL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyLossBreaker {
    daily_pnl: f64,
    daily_date: Option<NaiveDate>,
}

impl DailyLossBreaker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh day if `today` differs from the tracked date.
    ///
    /// Returns `true` when a rollover happened.
    pub fn roll(&mut self, today: NaiveDate) -> bool {
        if self.daily_date == Some(today) {
            return false;
        }
        self.daily_date = Some(today);
        self.daily_pnl = 0.0;
        true
    }

    /// Replace the day's PnL with an authoritative external figure.
    pub fn override_pnl(&mut self, daily_pnl: f64) {
        self.daily_pnl = daily_pnl;
    }

    /// Add a realized PnL increment reported by the execution side.
    pub fn record_realized_pnl(&mut self, today: NaiveDate, pnl: f64) {
        self.roll(today);
        self.daily_pnl += pnl;
    }

    /// Whether the loss limit is reached for the given equity.
    pub fn is_tripped(&self, equity: f64, max_daily_loss: f64) -> bool {
        self.daily_pnl <= -max_daily_loss * equity
    }

    pub fn daily_pnl(&self) -> f64 {
        self.daily_pnl
    }

    pub fn daily_date(&self) -> Option<NaiveDate> {
        self.daily_date
    }

    pub fn snapshot(&self) -> PnlSnapshot {
        PnlSnapshot {
            daily_pnl: self.daily_pnl,
            daily_date: self.daily_date,
        }
    }
}
