//! Bollinger Bands indicator.

use super::sma::rolling;
use super::{closes, Indicator};
use crate::types::Candle;

/// Bollinger Bands indicator.
///
/// Consists of:
/// - Middle band: SMA(20)
/// - Upper band: SMA + 2 * StdDev
/// - Lower band: SMA - 2 * StdDev
///
/// The standard deviation is the sample one (n - 1 denominator).
pub struct BollingerBands {
    period: usize,
    std_dev_multiplier: f64,
}

impl Default for BollingerBands {
    fn default() -> Self {
        Self {
            period: 20,
            std_dev_multiplier: 2.0,
        }
    }
}

/// Middle, upper and lower bands, aligned with the input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BollingerSeries {
    pub middle: Vec<Option<f64>>,
    pub upper: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

impl BollingerBands {
    pub fn new(period: usize, std_dev_multiplier: f64) -> Self {
        Self {
            period,
            std_dev_multiplier,
        }
    }

    /// Calculate sample standard deviation.
    fn std_dev(values: &[f64], mean: f64) -> f64 {
        if values.len() < 2 {
            return 0.0;
        }
        let variance: f64 =
            values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
        variance.sqrt()
    }

    pub fn series(&self, closes: &[f64]) -> BollingerSeries {
        let middle = rolling(closes, self.period, |w| w.iter().sum::<f64>() / w.len() as f64);
        let deviation = rolling(closes, self.period, |w| {
            let mean = w.iter().sum::<f64>() / w.len() as f64;
            Self::std_dev(w, mean)
        });

        let band = |sign: f64| -> Vec<Option<f64>> {
            middle
                .iter()
                .zip(deviation.iter())
                .map(|(m, d)| Some(m.as_ref()? + sign * self.std_dev_multiplier * d.as_ref()?))
                .collect()
        };
        let upper = band(1.0);
        let lower = band(-1.0);

        BollingerSeries {
            middle,
            upper,
            lower,
        }
    }
}

impl Indicator for BollingerBands {
    type Output = BollingerSeries;

    fn id(&self) -> &str {
        "bollinger"
    }

    fn min_periods(&self) -> usize {
        self.period
    }

    fn calculate(&self, candles: &[Candle]) -> BollingerSeries {
        self.series(&closes(candles))
    }
}
