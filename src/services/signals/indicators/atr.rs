//! Average True Range (ATR) indicator.

use super::sma::Sma;
use super::Indicator;
use crate::types::Candle;

/// ATR (Average True Range) indicator.
///
/// Measures market volatility as the simple rolling mean of true ranges:
/// TR = max(High-Low, |High-PrevClose|, |Low-PrevClose|)
///
/// The first candle has no previous close, so its TR is High-Low.
pub struct Atr {
    period: usize,
}

impl Default for Atr {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl Atr {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    /// Calculate True Range.
    fn true_range(current: &Candle, previous: Option<&Candle>) -> f64 {
        let hl = current.high - current.low;
        match previous {
            Some(prev) => {
                let hc = (current.high - prev.close).abs();
                let lc = (current.low - prev.close).abs();
                hl.max(hc).max(lc)
            }
            None => hl,
        }
    }

    /// True range of every candle in the series.
    pub fn true_ranges(candles: &[Candle]) -> Vec<f64> {
        candles
            .iter()
            .enumerate()
            .map(|(i, c)| Self::true_range(c, i.checked_sub(1).map(|p| &candles[p])))
            .collect()
    }
}

impl Indicator for Atr {
    type Output = Vec<Option<f64>>;

    fn id(&self) -> &str {
        "atr"
    }

    fn min_periods(&self) -> usize {
        self.period
    }

    fn calculate(&self, candles: &[Candle]) -> Vec<Option<f64>> {
        Sma::new(self.period).series(&Self::true_ranges(candles))
    }
}
