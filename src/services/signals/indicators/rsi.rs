//! Relative Strength Index (RSI) indicator.

use super::ema::smooth;
use super::{closes, Indicator};
use crate::types::Candle;

/// Guards the RS ratio against a zero average loss.
const EPSILON: f64 = 1e-10;

/// RSI (Relative Strength Index) indicator.
///
/// Measures momentum by comparing the magnitude of recent gains to recent
/// losses, with Wilder-style exponential smoothing (`alpha = 1 / period`).
/// Values range from 0-100. The first close has no predecessor and counts as
/// neither gain nor loss.
pub struct Rsi {
    period: usize,
}

impl Default for Rsi {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    /// Calculate RSI over a series of closing prices.
    pub fn series(&self, closes: &[f64]) -> Vec<Option<f64>> {
        if self.period == 0 {
            return vec![None; closes.len()];
        }

        let mut gains = Vec::with_capacity(closes.len());
        let mut losses = Vec::with_capacity(closes.len());
        for i in 0..closes.len() {
            let change = if i == 0 { 0.0 } else { closes[i] - closes[i - 1] };
            gains.push(change.max(0.0));
            losses.push((-change).max(0.0));
        }

        let alpha = 1.0 / self.period as f64;
        let avg_gain = smooth(&gains, alpha);
        let avg_loss = smooth(&losses, alpha);

        avg_gain
            .iter()
            .zip(avg_loss.iter())
            .enumerate()
            .map(|(i, (g, l))| {
                if i + 1 < self.period {
                    return None;
                }
                let rs = g / (l + EPSILON);
                Some(100.0 - 100.0 / (1.0 + rs))
            })
            .collect()
    }
}

impl Indicator for Rsi {
    type Output = Vec<Option<f64>>;

    fn id(&self) -> &str {
        "rsi"
    }

    fn min_periods(&self) -> usize {
        self.period
    }

    fn calculate(&self, candles: &[Candle]) -> Vec<Option<f64>> {
        self.series(&closes(candles))
    }
}
