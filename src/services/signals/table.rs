//! Indicator table: one row of derived features per candle.

use serde::{Deserialize, Serialize};

use super::indicators::{
    closes, Atr, BollingerBands, Ema, Indicator, Macd, PriceChannel, Rsi, Sma,
};
use crate::error::EngineError;
use crate::types::{normalize_candles, Candle, RawCandle};

/// Fast trend EMA span.
pub const EMA_FAST: usize = 20;
/// Slow trend EMA span.
pub const EMA_SLOW: usize = 50;
/// Window of the volume moving average.
pub const VOLUME_MA_PERIOD: usize = 20;

/// A candle with every derived feature the breakout logic reads.
///
/// Derived fields are `None` until their window has enough history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub ema_fast: Option<f64>,
    pub ema_slow: Option<f64>,
    pub atr: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_hist: Option<f64>,
    pub bb_mid: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_lower: Option<f64>,
    pub highest_high: Option<f64>,
    pub lowest_low: Option<f64>,
    pub volume_ma: Option<f64>,
}

impl IndicatorRow {
    fn from_candle(c: &Candle) -> Self {
        Self {
            timestamp: c.timestamp,
            open: c.open,
            high: c.high,
            low: c.low,
            close: c.close,
            volume: c.volume,
            ema_fast: None,
            ema_slow: None,
            atr: None,
            rsi: None,
            macd: None,
            macd_signal: None,
            macd_hist: None,
            bb_mid: None,
            bb_upper: None,
            bb_lower: None,
            highest_high: None,
            lowest_low: None,
            volume_ma: None,
        }
    }
}

/// Validate raw candles and compute the full indicator table.
///
/// The result has one row per candle, sorted by timestamp.
pub fn compute_indicators(raw: &[RawCandle]) -> Result<Vec<IndicatorRow>, EngineError> {
    let candles = normalize_candles(raw)?;
    Ok(build_table(&candles))
}

/// Compute the indicator table over already validated candles.
pub fn build_table(candles: &[Candle]) -> Vec<IndicatorRow> {
    let close = closes(candles);
    let volumes: Vec<f64> = candles.iter().map(|c| c.volume).collect();

    let ema_fast = Ema::new(EMA_FAST).series(&close);
    let ema_slow = Ema::new(EMA_SLOW).series(&close);
    let atr = Atr::default().calculate(candles);
    let rsi = Rsi::default().series(&close);
    let macd = Macd::default().series(&close);
    let bands = BollingerBands::default().series(&close);
    let channel = PriceChannel::default().calculate(candles);
    let volume_ma = Sma::new(VOLUME_MA_PERIOD).series(&volumes);

    candles
        .iter()
        .enumerate()
        .map(|(i, c)| IndicatorRow {
            ema_fast: Some(ema_fast[i]),
            ema_slow: Some(ema_slow[i]),
            atr: atr[i],
            rsi: rsi[i],
            macd: Some(macd.macd[i]),
            macd_signal: Some(macd.signal[i]),
            macd_hist: Some(macd.histogram[i]),
            bb_mid: bands.middle[i],
            bb_upper: bands.upper[i],
            bb_lower: bands.lower[i],
            highest_high: channel.highest[i],
            lowest_low: channel.lowest[i],
            volume_ma: volume_ma[i],
            ..IndicatorRow::from_candle(c)
        })
        .collect()
}
