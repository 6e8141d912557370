//! Decision engine: daily loss gate, indicators, signal, sizing, recording.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info, warn};

use super::recorder::BoundedHistory;
use super::risk::{compute_position_size, respect_leverage, DailyLossBreaker};
use super::signals::{compute_indicators, generate_signal};
use crate::config::EngineConfig;
use crate::types::{
    DecisionMode, EvaluateRequest, Evaluation, OrderIntent, PnlSnapshot, Signal,
};

/// Reason appended when sizing leaves nothing to trade.
const ZERO_SIZE_REASON: &str = "computed size is zero (qty <= 0)";

/// Mutable engine state, guarded as one unit.
struct EngineState {
    breaker: DailyLossBreaker,
    decisions: BoundedHistory<Signal>,
    orders: BoundedHistory<OrderIntent>,
}

/// Turns candle series into trade decisions and order intents.
///
/// Every evaluation runs under a single lock, so the daily loss state and the
/// histories always move together.
pub struct DecisionEngine {
    config: EngineConfig,
    state: Mutex<EngineState>,
}

impl DecisionEngine {
    pub fn new(config: EngineConfig) -> Self {
        let state = EngineState {
            breaker: DailyLossBreaker::new(),
            decisions: BoundedHistory::new(config.decision_history),
            orders: BoundedHistory::new(config.order_history),
        };
        Self {
            config,
            state: Mutex::new(state),
        }
    }

    fn state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Evaluate against the current wall clock.
    pub fn evaluate(&self, request: &EvaluateRequest) -> Evaluation {
        self.evaluate_at(Utc::now(), request)
    }

    /// Evaluate one candle series.
    ///
    /// `now` decides the trading day and stamps decisions that are made
    /// before any candle is read. Business outcomes, including bad input,
    /// come back as a NONE decision rather than an error.
    pub fn evaluate_at(&self, now: DateTime<Utc>, request: &EvaluateRequest) -> Evaluation {
        let mut state = self.state();
        let symbol = request.symbol.as_str();
        let timeframe = request.timeframe.as_str();

        state.breaker.roll(now.date_naive());
        if let Some(pnl) = request.daily_pnl {
            state.breaker.override_pnl(pnl);
        }

        if state
            .breaker
            .is_tripped(request.equity, self.config.max_daily_loss)
        {
            let reason = format!(
                "daily loss limit reached (pnl {:.2} <= -{:.2}% of equity {:.2})",
                state.breaker.daily_pnl(),
                self.config.max_daily_loss * 100.0,
                request.equity
            );
            warn!("{} {}: {}", symbol, timeframe, reason);
            let decision = Signal::none(
                symbol,
                timeframe,
                DecisionMode::RiskStop,
                reason,
                now.timestamp_millis(),
            );
            return Self::finish(&mut state, decision, None);
        }

        let rows = match compute_indicators(&request.candles) {
            Ok(rows) => rows,
            Err(e) => {
                debug!("{} {}: indicator computation failed: {}", symbol, timeframe, e);
                let decision = Signal::none(
                    symbol,
                    timeframe,
                    DecisionMode::Error,
                    format!("indicator computation failed: {}", e),
                    now.timestamp_millis(),
                );
                return Self::finish(&mut state, decision, None);
            }
        };

        let mut decision =
            generate_signal(symbol, timeframe, &rows, self.config.min_candles_required);
        let Some(levels) = decision.levels() else {
            debug!("{} {}: NONE ({})", symbol, timeframe, decision.reason);
            return Self::finish(&mut state, decision, None);
        };

        let quantity = compute_position_size(
            request.equity,
            levels.entry,
            levels.stop_loss,
            self.config.risk_per_trade,
        );
        let quantity = respect_leverage(
            request.equity,
            levels.entry,
            quantity,
            self.config.max_leverage,
        );

        match OrderIntent::from_signal(
            &decision,
            quantity,
            self.config.risk_per_trade,
            self.config.max_leverage,
        ) {
            Some(order) => {
                info!(
                    "{} {}: {} {} {:.6} @ {:.4} (sl {:.4}, tp {:.4}/{:.4}/{:.4})",
                    symbol,
                    timeframe,
                    decision.action,
                    order.side,
                    order.quantity,
                    order.entry,
                    order.stop_loss,
                    order.take_profit_1,
                    order.take_profit_2,
                    order.take_profit_3
                );
                Self::finish(&mut state, decision, Some(order))
            }
            None => {
                decision.demote(ZERO_SIZE_REASON);
                debug!("{} {}: NONE ({})", symbol, timeframe, decision.reason);
                Self::finish(&mut state, decision, None)
            }
        }
    }

    fn finish(
        state: &mut EngineState,
        decision: Signal,
        order: Option<OrderIntent>,
    ) -> Evaluation {
        state.decisions.push(decision.clone());
        if let Some(order) = &order {
            state.orders.push(order.clone());
        }
        Evaluation { decision, order }
    }

    /// Add realized PnL reported by the execution side.
    pub fn record_realized_pnl(&self, pnl: f64) {
        self.record_realized_pnl_at(Utc::now(), pnl);
    }

    pub fn record_realized_pnl_at(&self, now: DateTime<Utc>, pnl: f64) {
        self.state()
            .breaker
            .record_realized_pnl(now.date_naive(), pnl);
    }

    pub fn last_decision(&self) -> Option<Signal> {
        self.state().decisions.last().cloned()
    }

    /// The last `limit` decisions, oldest first.
    pub fn recent_decisions(&self, limit: usize) -> Vec<Signal> {
        self.state().decisions.recent(limit)
    }

    /// The last `limit` order intents, oldest first.
    pub fn recent_orders(&self, limit: usize) -> Vec<OrderIntent> {
        self.state().orders.recent(limit)
    }

    /// Orders whose creation date (UTC) lies in `from..=to`.
    pub fn orders_between(&self, from: NaiveDate, to: NaiveDate) -> Vec<OrderIntent> {
        self.state().orders.filtered(|order| {
            DateTime::from_timestamp_millis(order.created_at)
                .map(|t| t.date_naive())
                .is_some_and(|d| d >= from && d <= to)
        })
    }

    pub fn pnl_snapshot(&self) -> PnlSnapshot {
        self.state().breaker.snapshot()
    }
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
