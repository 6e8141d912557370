use serde::{Deserialize, Serialize};

/// Confidence attached to every confirmed breakout.
pub const CONFIRMED_CONFIDENCE: f64 = 0.8;

/// Trade direction emitted by the signal generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalAction {
    Long,
    Short,
    /// No trade. Always accompanied by a reason.
    None,
}

impl SignalAction {
    pub fn is_actionable(&self) -> bool {
        !matches!(self, SignalAction::None)
    }
}

impl std::fmt::Display for SignalAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalAction::Long => write!(f, "LONG"),
            SignalAction::Short => write!(f, "SHORT"),
            SignalAction::None => write!(f, "NONE"),
        }
    }
}

/// Pipeline stage that produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionMode {
    /// Indicators were computed and the breakout logic ran.
    MomentumBreakout,
    /// Daily loss limit reached; nothing else ran.
    RiskStop,
    /// Candle data could not be turned into indicators.
    Error,
}

/// Entry, stop and the three targets of a bracketed trade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeLevels {
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit_1: f64,
    pub take_profit_2: f64,
    pub take_profit_3: f64,
}

impl TradeLevels {
    /// Targets one, two and three ATR above entry.
    pub fn long(entry: f64, stop_loss: f64, atr: f64) -> Self {
        Self {
            entry,
            stop_loss,
            take_profit_1: entry + atr,
            take_profit_2: entry + 2.0 * atr,
            take_profit_3: entry + 3.0 * atr,
        }
    }

    /// Targets one, two and three ATR below entry.
    pub fn short(entry: f64, stop_loss: f64, atr: f64) -> Self {
        Self {
            entry,
            stop_loss,
            take_profit_1: entry - atr,
            take_profit_2: entry - 2.0 * atr,
            take_profit_3: entry - 3.0 * atr,
        }
    }

    /// Whether the levels are strictly ordered for the given direction.
    pub fn is_ordered_for(&self, action: SignalAction) -> bool {
        match action {
            SignalAction::Long => {
                self.stop_loss < self.entry
                    && self.entry < self.take_profit_1
                    && self.take_profit_1 < self.take_profit_2
                    && self.take_profit_2 < self.take_profit_3
            }
            SignalAction::Short => {
                self.stop_loss > self.entry
                    && self.entry > self.take_profit_1
                    && self.take_profit_1 > self.take_profit_2
                    && self.take_profit_2 > self.take_profit_3
            }
            SignalAction::None => false,
        }
    }
}

/// A trade decision for one symbol/timeframe evaluation.
///
/// Levels are populated exactly when `action` is LONG or SHORT.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub symbol: String,
    pub timeframe: String,
    pub action: SignalAction,
    pub reason: String,
    pub mode: DecisionMode,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub take_profit_1: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub take_profit_2: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub take_profit_3: Option<f64>,
    /// Epoch milliseconds: last candle time, or wall-clock when no
    /// indicators were computed.
    pub timestamp: i64,
}

impl Signal {
    /// A no-trade decision.
    pub fn none(
        symbol: &str,
        timeframe: &str,
        mode: DecisionMode,
        reason: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Self {
            symbol: symbol.to_string(),
            timeframe: timeframe.to_string(),
            action: SignalAction::None,
            reason: reason.into(),
            mode,
            confidence: 0.0,
            entry: None,
            stop_loss: None,
            take_profit_1: None,
            take_profit_2: None,
            take_profit_3: None,
            timestamp,
        }
    }

    /// A confirmed LONG or SHORT breakout.
    pub fn confirmed(
        symbol: &str,
        timeframe: &str,
        action: SignalAction,
        reason: impl Into<String>,
        levels: TradeLevels,
        timestamp: i64,
    ) -> Self {
        debug_assert!(levels.is_ordered_for(action));
        Self {
            symbol: symbol.to_string(),
            timeframe: timeframe.to_string(),
            action,
            reason: reason.into(),
            mode: DecisionMode::MomentumBreakout,
            confidence: CONFIRMED_CONFIDENCE,
            entry: Some(levels.entry),
            stop_loss: Some(levels.stop_loss),
            take_profit_1: Some(levels.take_profit_1),
            take_profit_2: Some(levels.take_profit_2),
            take_profit_3: Some(levels.take_profit_3),
            timestamp,
        }
    }

    /// The trade levels, if this is an actionable decision.
    pub fn levels(&self) -> Option<TradeLevels> {
        if !self.action.is_actionable() {
            return None;
        }
        Some(TradeLevels {
            entry: self.entry?,
            stop_loss: self.stop_loss?,
            take_profit_1: self.take_profit_1?,
            take_profit_2: self.take_profit_2?,
            take_profit_3: self.take_profit_3?,
        })
    }

    pub fn is_actionable(&self) -> bool {
        self.levels().is_some()
    }

    /// Turn a confirmed signal into a no-trade decision, keeping its reason
    /// and appending `extra`.
    pub fn demote(&mut self, extra: &str) {
        self.action = SignalAction::None;
        self.confidence = 0.0;
        self.reason = format!("{} | {}", self.reason, extra);
        self.entry = None;
        self.stop_loss = None;
        self.take_profit_1 = None;
        self.take_profit_2 = None;
        self.take_profit_3 = None;
    }
}
