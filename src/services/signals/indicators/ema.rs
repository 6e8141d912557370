//! Exponential Moving Average (EMA) indicator.

use super::{closes, Indicator};
use crate::types::Candle;

/// EMA (Exponential Moving Average) of closing prices.
///
/// Recursive smoothing with `alpha = 2 / (period + 1)`, seeded with the first
/// value rather than an SMA, so every position is defined.
pub struct Ema {
    id: String,
    period: usize,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Self {
            id: format!("ema{}", period),
            period,
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Calculate the EMA over an arbitrary value series.
    pub fn series(&self, values: &[f64]) -> Vec<f64> {
        let alpha = 2.0 / (self.period as f64 + 1.0);
        smooth(values, alpha)
    }
}

/// Exponential smoothing `y[t] = alpha * x[t] + (1 - alpha) * y[t-1]`,
/// with `y[0] = x[0]`.
pub(crate) fn smooth(values: &[f64], alpha: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    let mut prev: Option<f64> = None;
    for &v in values {
        let next = match prev {
            Some(p) => alpha * v + (1.0 - alpha) * p,
            None => v,
        };
        out.push(next);
        prev = Some(next);
    }
    out
}

impl Indicator for Ema {
    type Output = Vec<f64>;

    fn id(&self) -> &str {
        &self.id
    }

    fn min_periods(&self) -> usize {
        1
    }

    fn calculate(&self, candles: &[Candle]) -> Vec<f64> {
        self.series(&closes(candles))
    }
}
