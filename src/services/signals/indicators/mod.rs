//! Technical indicator implementations.
//!
//! Every indicator returns one output per input candle so the results can be
//! zipped into an indicator table. Positions before an indicator has enough
//! history are `None`.

pub mod atr;
pub mod bollinger;
pub mod channel;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use atr::Atr;
pub use bollinger::{BollingerBands, BollingerSeries};
pub use channel::{ChannelSeries, PriceChannel};
pub use ema::Ema;
pub use macd::{Macd, MacdSeries};
pub use rsi::Rsi;
pub use sma::Sma;

use crate::types::Candle;

/// Trait for indicators computed over a whole candle series.
pub trait Indicator {
    /// Series produced by the indicator, aligned with the input candles.
    type Output;

    /// Unique identifier for this indicator.
    fn id(&self) -> &str;

    /// Number of candles needed before the first defined value.
    fn min_periods(&self) -> usize;

    /// Calculate the indicator over the full candle series.
    fn calculate(&self, candles: &[Candle]) -> Self::Output;
}

/// Closing prices of a candle series.
pub fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}
