use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Time values above this are read as epoch milliseconds, below as seconds.
pub const MILLIS_THRESHOLD: f64 = 10_000_000_000.0;

/// Candle as supplied by a market-data collaborator.
///
/// Every field is optional on the wire; `normalize_candles` decides whether
/// the record is usable. The time may arrive as `timestamp` or `ts`, in
/// seconds or milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCandle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<f64>,
}

impl RawCandle {
    /// Build a fully populated raw candle with a `ts` time field.
    pub fn new(ts: f64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            open: Some(open),
            high: Some(high),
            low: Some(low),
            close: Some(close),
            volume: Some(volume),
            timestamp: None,
            ts: Some(ts),
        }
    }

    /// `ts` wins over `timestamp` when both are present.
    fn time(&self) -> Option<f64> {
        self.ts.or(self.timestamp)
    }
}

/// Validated OHLCV candle. `timestamp` is epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl From<Candle> for RawCandle {
    fn from(c: Candle) -> Self {
        RawCandle::new(c.timestamp as f64, c.open, c.high, c.low, c.close, c.volume)
    }
}

/// Validate a raw candle series and normalize it.
///
/// Fails on an empty series, on a candle missing a price/volume field or any
/// time field, and on non-finite values. Times are converted to milliseconds
/// using the magnitude of the series maximum, then the series is stably
/// sorted ascending. Duplicated timestamps are kept.
pub fn normalize_candles(raw: &[RawCandle]) -> Result<Vec<Candle>, EngineError> {
    if raw.is_empty() {
        return Err(EngineError::Validation("empty candle list".to_string()));
    }

    let mut times = Vec::with_capacity(raw.len());
    for (i, c) in raw.iter().enumerate() {
        let t = c.time().ok_or_else(|| {
            EngineError::Validation(format!("candle {}: missing 'timestamp' or 'ts' field", i))
        })?;
        if !t.is_finite() {
            return Err(EngineError::Validation(format!(
                "candle {}: non-finite time value",
                i
            )));
        }
        times.push(t);
    }

    let max_time = times.iter().cloned().fold(f64::MIN, f64::max);
    let scale = if max_time > MILLIS_THRESHOLD { 1.0 } else { 1000.0 };

    let mut candles = Vec::with_capacity(raw.len());
    for (i, (c, t)) in raw.iter().zip(times).enumerate() {
        let field = |value: Option<f64>, name: &str| -> Result<f64, EngineError> {
            match value {
                Some(v) if v.is_finite() => Ok(v),
                Some(_) => Err(EngineError::Validation(format!(
                    "candle {}: non-finite '{}'",
                    i, name
                ))),
                None => Err(EngineError::Validation(format!(
                    "candle {}: missing '{}' field",
                    i, name
                ))),
            }
        };

        candles.push(Candle {
            timestamp: (t * scale).round() as i64,
            open: field(c.open, "open")?,
            high: field(c.high, "high")?,
            low: field(c.low, "low")?,
            close: field(c.close, "close")?,
            volume: field(c.volume, "volume")?,
        });
    }

    candles.sort_by_key(|c| c.timestamp);
    Ok(candles)
}
