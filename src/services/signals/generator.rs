//! Momentum-breakout signal generation.
//!
//! A LONG needs an up-trend, a close above both the prior 20-candle high and
//! the upper Bollinger band on surging volume, a strong RSI, and a positive,
//! non-falling MACD histogram. SHORT mirrors every condition.

use super::filter::check_filters;
use super::table::IndicatorRow;
use crate::error::EngineError;
use crate::types::{DecisionMode, Signal, SignalAction, TradeLevels};

/// Default number of rows required before any decision is attempted.
pub const MIN_CANDLES_REQUIRED: usize = 60;
/// Breakout volume must exceed this multiple of its moving average.
pub const VOLUME_SURGE: f64 = 1.2;
/// RSI a LONG must exceed.
pub const RSI_LONG: f64 = 55.0;
/// RSI a SHORT must stay under.
pub const RSI_SHORT: f64 = 45.0;
/// Stop distance beyond the broken channel, in ATRs.
pub const STOP_ATR_BUFFER: f64 = 0.5;

const LONG_CONFIRMED: &str = "bullish breakout confirmed (trend, volume, RSI, MACD, ATR)";
const SHORT_CONFIRMED: &str = "bearish breakout confirmed (trend, volume, RSI, MACD, ATR)";

/// Decide LONG, SHORT or NONE from the last row of an indicator table.
///
/// The dominant trend is tried first: SHORT when EMA20 < EMA50, LONG
/// otherwise. If it fails the opposite direction is tried, and its result is
/// returned whatever it is.
pub fn generate_signal(
    symbol: &str,
    timeframe: &str,
    rows: &[IndicatorRow],
    min_candles: usize,
) -> Signal {
    let required = min_candles.max(2);
    let (prev, row) = match rows {
        [.., prev, row] if rows.len() >= required => (prev, row),
        _ => {
            let err = EngineError::InsufficientHistory {
                rows: rows.len(),
                required,
            };
            let timestamp = rows.last().map(|r| r.timestamp).unwrap_or_default();
            return Signal::none(
                symbol,
                timeframe,
                DecisionMode::MomentumBreakout,
                err.to_string(),
                timestamp,
            );
        }
    };

    let bearish = matches!((row.ema_fast, row.ema_slow), (Some(fast), Some(slow)) if fast < slow);
    let order = if bearish {
        [SignalAction::Short, SignalAction::Long]
    } else {
        [SignalAction::Long, SignalAction::Short]
    };

    let first = build_signal(symbol, timeframe, order[0], row, prev);
    if first.action == order[0] {
        return first;
    }
    build_signal(symbol, timeframe, order[1], row, prev)
}

fn build_signal(
    symbol: &str,
    timeframe: &str,
    action: SignalAction,
    row: &IndicatorRow,
    prev: &IndicatorRow,
) -> Signal {
    let (setup, confirmed) = match action {
        SignalAction::Long => (long_setup(row, prev), LONG_CONFIRMED),
        SignalAction::Short => (short_setup(row, prev), SHORT_CONFIRMED),
        SignalAction::None => (Err("no direction requested".to_string()), ""),
    };

    match setup {
        Ok(levels) => Signal::confirmed(symbol, timeframe, action, confirmed, levels, row.timestamp),
        Err(reason) => Signal::none(
            symbol,
            timeframe,
            DecisionMode::MomentumBreakout,
            reason,
            row.timestamp,
        ),
    }
}

fn gt(value: Option<f64>, threshold: f64) -> bool {
    value.is_some_and(|v| v > threshold)
}

fn lt(value: Option<f64>, threshold: f64) -> bool {
    value.is_some_and(|v| v < threshold)
}

fn volume_surge(row: &IndicatorRow) -> bool {
    row.volume_ma
        .is_some_and(|ma| row.volume > VOLUME_SURGE * ma)
}

fn long_setup(row: &IndicatorRow, prev: &IndicatorRow) -> Result<TradeLevels, String> {
    check_filters(row, prev).map_err(|r| r.to_string())?;

    let close = row.close;
    let trend_up = matches!((row.ema_fast, row.ema_slow), (Some(fast), Some(slow)) if fast > slow);
    if !trend_up {
        return Err("no clear bullish trend (EMA20 <= EMA50)".to_string());
    }

    let breakout = row.highest_high.is_some_and(|hh| close > hh)
        && volume_surge(row)
        && row.bb_upper.is_some_and(|upper| close > upper);
    if !breakout {
        return Err("no valid bullish breakout".to_string());
    }

    if !gt(row.rsi, RSI_LONG) {
        return Err(format!("RSI not strong enough for a long (> {})", RSI_LONG));
    }

    let macd_ok = match (row.macd_hist, prev.macd_hist) {
        (Some(hist), Some(prev_hist)) => hist > 0.0 && hist >= prev_hist,
        _ => false,
    };
    if !macd_ok {
        return Err("MACD histogram not bullish or not rising".to_string());
    }

    // the filter gate guarantees ATR and the breakout guarantees the channel
    let (Some(atr), Some(hh)) = (row.atr, row.highest_high) else {
        return Err("no valid bullish breakout".to_string());
    };
    let stop = hh - STOP_ATR_BUFFER * atr;
    if stop >= close {
        return Err("computed stop invalid (>= entry)".to_string());
    }

    Ok(TradeLevels::long(close, stop, atr))
}

fn short_setup(row: &IndicatorRow, prev: &IndicatorRow) -> Result<TradeLevels, String> {
    check_filters(row, prev).map_err(|r| r.to_string())?;

    let close = row.close;
    let trend_down = matches!((row.ema_fast, row.ema_slow), (Some(fast), Some(slow)) if fast < slow);
    if !trend_down {
        return Err("no clear bearish trend (EMA20 >= EMA50)".to_string());
    }

    let breakout = row.lowest_low.is_some_and(|ll| close < ll)
        && volume_surge(row)
        && row.bb_lower.is_some_and(|lower| close < lower);
    if !breakout {
        return Err("no valid bearish breakout".to_string());
    }

    if !lt(row.rsi, RSI_SHORT) {
        return Err(format!("RSI not weak enough for a short (< {})", RSI_SHORT));
    }

    let macd_ok = match (row.macd_hist, prev.macd_hist) {
        (Some(hist), Some(prev_hist)) => hist < 0.0 && hist <= prev_hist,
        _ => false,
    };
    if !macd_ok {
        return Err("MACD histogram not bearish or not falling".to_string());
    }

    let (Some(atr), Some(ll)) = (row.atr, row.lowest_low) else {
        return Err("no valid bearish breakout".to_string());
    };
    let stop = ll + STOP_ATR_BUFFER * atr;
    if stop <= close {
        return Err("computed stop invalid (<= entry)".to_string());
    }

    Ok(TradeLevels::short(close, stop, atr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::signals::filter::FilterRejection;

    /// A row satisfying every LONG condition.
    fn long_row() -> IndicatorRow {
        IndicatorRow {
            timestamp: 1_700_000_000_000,
            open: 99.0,
            high: 101.0,
            low: 98.5,
            close: 100.0,
            volume: 150.0,
            ema_fast: Some(98.0),
            ema_slow: Some(96.0),
            atr: Some(1.0),
            rsi: Some(70.0),
            macd: Some(0.5),
            macd_signal: Some(0.3),
            macd_hist: Some(0.2),
            bb_mid: Some(97.0),
            bb_upper: Some(99.5),
            bb_lower: Some(94.5),
            highest_high: Some(99.0),
            lowest_low: Some(94.0),
            volume_ma: Some(100.0),
        }
    }

    /// A row satisfying every SHORT condition.
    fn short_row() -> IndicatorRow {
        IndicatorRow {
            close: 100.0,
            ema_fast: Some(102.0),
            ema_slow: Some(104.0),
            rsi: Some(30.0),
            macd_hist: Some(-0.2),
            bb_upper: Some(105.5),
            bb_lower: Some(100.5),
            highest_high: Some(106.0),
            lowest_low: Some(101.0),
            ..long_row()
        }
    }

    fn history(last: IndicatorRow, prev: IndicatorRow) -> Vec<IndicatorRow> {
        let mut rows = vec![prev; MIN_CANDLES_REQUIRED - 1];
        rows.push(last);
        rows
    }

    fn long_prev() -> IndicatorRow {
        IndicatorRow {
            atr: Some(0.9),
            macd_hist: Some(0.1),
            ..long_row()
        }
    }

    fn short_prev() -> IndicatorRow {
        IndicatorRow {
            atr: Some(0.9),
            macd_hist: Some(-0.1),
            ..short_row()
        }
    }

    #[test]
    fn test_insufficient_history() {
        let rows = vec![long_row(); 59];
        let sig = generate_signal("BTCUSDT", "1m", &rows, MIN_CANDLES_REQUIRED);
        assert_eq!(sig.action, SignalAction::None);
        assert_eq!(sig.reason, "insufficient history (59 < 60)");
        assert_eq!(sig.confidence, 0.0);
    }

    #[test]
    fn test_long_signal_levels() {
        let sig = generate_signal("BTCUSDT", "1m", &history(long_row(), long_prev()), 60);
        assert_eq!(sig.action, SignalAction::Long);
        assert_eq!(sig.confidence, 0.8);
        assert_eq!(sig.entry, Some(100.0));
        assert_eq!(sig.stop_loss, Some(98.5));
        assert_eq!(sig.take_profit_1, Some(101.0));
        assert_eq!(sig.take_profit_3, Some(103.0));
        assert_eq!(sig.timestamp, 1_700_000_000_000);
        assert!(sig.levels().unwrap().is_ordered_for(SignalAction::Long));
    }

    #[test]
    fn test_short_signal_levels() {
        let sig = generate_signal("BTCUSDT", "1m", &history(short_row(), short_prev()), 60);
        assert_eq!(sig.action, SignalAction::Short);
        assert_eq!(sig.stop_loss, Some(101.5));
        assert_eq!(sig.take_profit_2, Some(98.0));
        assert!(sig.levels().unwrap().is_ordered_for(SignalAction::Short));
    }

    #[test]
    fn test_bullish_fallback_reports_short_reason() {
        // LONG fails on RSI, SHORT then fails on trend
        let row = IndicatorRow { rsi: Some(50.0), ..long_row() };
        let sig = generate_signal("BTCUSDT", "1m", &history(row, long_prev()), 60);
        assert_eq!(sig.action, SignalAction::None);
        assert_eq!(sig.reason, "no clear bearish trend (EMA20 >= EMA50)");
    }

    #[test]
    fn test_bearish_fallback_reports_long_reason() {
        let row = IndicatorRow { rsi: Some(50.0), ..short_row() };
        let sig = generate_signal("BTCUSDT", "1m", &history(row, short_prev()), 60);
        assert_eq!(sig.action, SignalAction::None);
        assert_eq!(sig.reason, "no clear bullish trend (EMA20 <= EMA50)");
    }

    #[test]
    fn test_filter_reason_is_surfaced() {
        let row = IndicatorRow { volume: 10.0, ..long_row() };
        let sig = generate_signal("BTCUSDT", "1m", &history(row, long_prev()), 60);
        assert_eq!(sig.reason, FilterRejection::ThinVolume.to_string());
    }

    #[test]
    fn test_each_long_condition_has_own_reason() {
        let cases = [
            IndicatorRow { highest_high: Some(100.5), ..long_row() },
            IndicatorRow { rsi: Some(55.0), ..long_row() },
            IndicatorRow { macd_hist: Some(0.05), ..long_row() },
        ];
        let mut reasons = std::collections::HashSet::new();
        for row in cases {
            let sig = build_signal("BTCUSDT", "1m", SignalAction::Long, &row, &long_prev());
            assert_eq!(sig.action, SignalAction::None);
            reasons.insert(sig.reason);
        }
        assert_eq!(reasons.len(), 3);
    }
}
