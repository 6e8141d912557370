//! Price channel (rolling highest high / lowest low).

use super::Indicator;
use crate::types::Candle;

/// Donchian-style price channel.
///
/// The channel at index `i` covers the `period` candles *before* `i`, so a
/// close can break out of it. Undefined until `period` prior candles exist.
pub struct PriceChannel {
    period: usize,
}

impl Default for PriceChannel {
    fn default() -> Self {
        Self { period: 20 }
    }
}

/// Upper and lower channel bounds, aligned with the input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelSeries {
    pub highest: Vec<Option<f64>>,
    pub lowest: Vec<Option<f64>>,
}

impl PriceChannel {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl Indicator for PriceChannel {
    type Output = ChannelSeries;

    fn id(&self) -> &str {
        "channel"
    }

    fn min_periods(&self) -> usize {
        self.period + 1
    }

    fn calculate(&self, candles: &[Candle]) -> ChannelSeries {
        let mut highest = Vec::with_capacity(candles.len());
        let mut lowest = Vec::with_capacity(candles.len());

        for i in 0..candles.len() {
            if self.period == 0 || i < self.period {
                highest.push(None);
                lowest.push(None);
                continue;
            }
            let window = &candles[i - self.period..i];
            highest.push(Some(
                window.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max),
            ));
            lowest.push(Some(
                window.iter().map(|c| c.low).fold(f64::INFINITY, f64::min),
            ));
        }

        ChannelSeries { highest, lowest }
    }
}
