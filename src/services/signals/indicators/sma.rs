//! Simple Moving Average (SMA) indicator.

use super::{closes, Indicator};
use crate::types::Candle;

/// SMA (Simple Moving Average) over a fixed window.
///
/// Used directly on closes, and as the rolling mean behind ATR and the
/// volume average.
pub struct Sma {
    id: String,
    period: usize,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        Self {
            id: format!("sma{}", period),
            period,
        }
    }

    /// Rolling mean of `values`; `None` until the window is full.
    pub fn series(&self, values: &[f64]) -> Vec<Option<f64>> {
        rolling(values, self.period, |window| {
            window.iter().sum::<f64>() / window.len() as f64
        })
    }
}

/// Apply `f` to every full trailing window of `period` values ending at each
/// index.
pub(crate) fn rolling<F>(values: &[f64], period: usize, f: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> f64,
{
    if period == 0 {
        return vec![None; values.len()];
    }
    (0..values.len())
        .map(|i| {
            if i + 1 < period {
                None
            } else {
                Some(f(&values[i + 1 - period..=i]))
            }
        })
        .collect()
}

impl Indicator for Sma {
    type Output = Vec<Option<f64>>;

    fn id(&self) -> &str {
        &self.id
    }

    fn min_periods(&self) -> usize {
        self.period
    }

    fn calculate(&self, candles: &[Candle]) -> Vec<Option<f64>> {
        self.series(&closes(candles))
    }
}
