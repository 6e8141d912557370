use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::candle::RawCandle;
use super::signals::{DecisionMode, Signal, SignalAction, TradeLevels};

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Entry side for a directional signal.
    pub fn for_action(action: SignalAction) -> Option<Self> {
        match action {
            SignalAction::Long => Some(OrderSide::Buy),
            SignalAction::Short => Some(OrderSide::Sell),
            SignalAction::None => None,
        }
    }
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

/// Context copied from the originating decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderMetadata {
    pub mode: DecisionMode,
    pub confidence: f64,
    pub reason: String,
}

/// A bracketed order the execution collaborator is asked to place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderIntent {
    pub id: String,
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: f64,
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit_1: f64,
    pub take_profit_2: f64,
    pub take_profit_3: f64,
    /// Fraction of equity put at risk between entry and stop.
    pub risk_fraction: f64,
    pub leverage: f64,
    /// Epoch milliseconds of the candle that triggered the order.
    pub created_at: i64,
    pub metadata: OrderMetadata,
}

impl OrderIntent {
    /// Build an order from an actionable signal.
    ///
    /// Returns `None` for a no-trade signal or a non-positive quantity.
    pub fn from_signal(
        signal: &Signal,
        quantity: f64,
        risk_fraction: f64,
        leverage: f64,
    ) -> Option<Self> {
        if quantity.is_nan() || quantity <= 0.0 {
            return None;
        }
        let side = OrderSide::for_action(signal.action)?;
        let TradeLevels {
            entry,
            stop_loss,
            take_profit_1,
            take_profit_2,
            take_profit_3,
        } = signal.levels()?;

        Some(Self {
            id: Uuid::new_v4().to_string(),
            symbol: signal.symbol.clone(),
            side,
            quantity,
            entry,
            stop_loss,
            take_profit_1,
            take_profit_2,
            take_profit_3,
            risk_fraction,
            leverage,
            created_at: signal.timestamp,
            metadata: OrderMetadata {
                mode: signal.mode,
                confidence: signal.confidence,
                reason: signal.reason.clone(),
            },
        })
    }

    pub fn notional(&self) -> f64 {
        self.quantity * self.entry
    }
}

/// Input of one engine evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateRequest {
    pub symbol: String,
    pub timeframe: String,
    pub candles: Vec<RawCandle>,
    pub equity: f64,
    /// Authoritative daily PnL from the execution side, if known.
    #[serde(default)]
    pub daily_pnl: Option<f64>,
}

/// Outcome of one engine evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub decision: Signal,
    pub order: Option<OrderIntent>,
}

/// Current daily PnL bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PnlSnapshot {
    pub daily_pnl: f64,
    pub daily_date: Option<NaiveDate>,
}
