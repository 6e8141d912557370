//! Market-quality gate run before any breakout logic.

use std::fmt;

use super::table::IndicatorRow;

/// Minimum ATR as a fraction of price (0.3%).
pub const MIN_VOLATILITY: f64 = 0.003;
/// Minimum EMA20/EMA50 gap as a fraction of price (0.1%).
pub const MIN_TREND_GAP: f64 = 0.001;
/// Volume below this fraction of its moving average is too thin.
pub const MIN_RELATIVE_VOLUME: f64 = 0.5;

/// Why a candle was rejected by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterRejection {
    MissingAtr,
    LowVolatility,
    MissingTrend,
    FlatTrend,
    MissingVolumeAverage,
    ThinVolume,
    AtrNotExpanding,
}

impl fmt::Display for FilterRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            FilterRejection::MissingAtr => "insufficient indicators (ATR undefined or close <= 0)",
            FilterRejection::LowVolatility => "volatility too low (ATR/close < 0.3%)",
            FilterRejection::MissingTrend => "insufficient trend indicators (EMA undefined)",
            FilterRejection::FlatTrend => "no clear direction (EMA20 ~ EMA50)",
            FilterRejection::MissingVolumeAverage => "insufficient average volume",
            FilterRejection::ThinVolume => "volume too low (< 50% of average)",
            FilterRejection::AtrNotExpanding => "volatility not expanding (ATR not rising)",
        };
        write!(f, "{}", msg)
    }
}

impl std::error::Error for FilterRejection {}

/// Apply the quality checks in order; the first failure wins.
pub fn check_filters(row: &IndicatorRow, prev: &IndicatorRow) -> Result<(), FilterRejection> {
    let close = row.close;
    let atr = match row.atr {
        Some(atr) if close > 0.0 => atr,
        _ => return Err(FilterRejection::MissingAtr),
    };

    if atr / close < MIN_VOLATILITY {
        return Err(FilterRejection::LowVolatility);
    }

    let (ema_fast, ema_slow) = match (row.ema_fast, row.ema_slow) {
        (Some(fast), Some(slow)) => (fast, slow),
        _ => return Err(FilterRejection::MissingTrend),
    };

    if (ema_fast - ema_slow).abs() / close < MIN_TREND_GAP {
        return Err(FilterRejection::FlatTrend);
    }

    let volume_ma = match row.volume_ma {
        Some(ma) if ma != 0.0 => ma,
        _ => return Err(FilterRejection::MissingVolumeAverage),
    };

    if row.volume < MIN_RELATIVE_VOLUME * volume_ma {
        return Err(FilterRejection::ThinVolume);
    }

    if let Some(prev_atr) = prev.atr {
        if atr <= prev_atr {
            return Err(FilterRejection::AtrNotExpanding);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A row that passes every check.
    fn passing_row() -> IndicatorRow {
        IndicatorRow {
            timestamp: 0,
            open: 99.0,
            high: 101.0,
            low: 98.0,
            close: 100.0,
            volume: 150.0,
            ema_fast: Some(101.0),
            ema_slow: Some(99.0),
            atr: Some(1.0),
            rsi: Some(60.0),
            macd: Some(0.5),
            macd_signal: Some(0.3),
            macd_hist: Some(0.2),
            bb_mid: Some(98.0),
            bb_upper: Some(99.5),
            bb_lower: Some(96.5),
            highest_high: Some(99.0),
            lowest_low: Some(95.0),
            volume_ma: Some(100.0),
        }
    }

    fn prev_row() -> IndicatorRow {
        IndicatorRow {
            atr: Some(0.9),
            ..passing_row()
        }
    }

    #[test]
    fn test_passing_row() {
        assert_eq!(check_filters(&passing_row(), &prev_row()), Ok(()));
    }

    #[test]
    fn test_missing_atr() {
        let row = IndicatorRow { atr: None, ..passing_row() };
        assert_eq!(check_filters(&row, &prev_row()), Err(FilterRejection::MissingAtr));

        let row = IndicatorRow { close: 0.0, ..passing_row() };
        assert_eq!(check_filters(&row, &prev_row()), Err(FilterRejection::MissingAtr));
    }

    #[test]
    fn test_low_volatility() {
        let row = IndicatorRow { atr: Some(0.2), ..passing_row() };
        let prev = IndicatorRow { atr: Some(0.1), ..passing_row() };
        assert_eq!(check_filters(&row, &prev), Err(FilterRejection::LowVolatility));
    }

    #[test]
    fn test_trend_checks() {
        let row = IndicatorRow { ema_slow: None, ..passing_row() };
        assert_eq!(check_filters(&row, &prev_row()), Err(FilterRejection::MissingTrend));

        let row = IndicatorRow {
            ema_fast: Some(100.05),
            ema_slow: Some(100.0),
            ..passing_row()
        };
        assert_eq!(check_filters(&row, &prev_row()), Err(FilterRejection::FlatTrend));
    }

    #[test]
    fn test_volume_checks() {
        let row = IndicatorRow { volume_ma: Some(0.0), ..passing_row() };
        assert_eq!(
            check_filters(&row, &prev_row()),
            Err(FilterRejection::MissingVolumeAverage)
        );

        let row = IndicatorRow { volume: 49.0, ..passing_row() };
        assert_eq!(check_filters(&row, &prev_row()), Err(FilterRejection::ThinVolume));
    }

    #[test]
    fn test_atr_expansion() {
        let prev = IndicatorRow { atr: Some(1.0), ..passing_row() };
        assert_eq!(
            check_filters(&passing_row(), &prev),
            Err(FilterRejection::AtrNotExpanding)
        );

        let prev = IndicatorRow { atr: None, ..passing_row() };
        assert_eq!(check_filters(&passing_row(), &prev), Ok(()));
    }

    #[test]
    fn test_first_failure_wins() {
        // low volatility, flat trend and thin volume at once
        let row = IndicatorRow {
            atr: Some(0.1),
            ema_fast: Some(100.0),
            ema_slow: Some(100.0),
            volume: 1.0,
            ..passing_row()
        };
        let prev = IndicatorRow { atr: Some(0.05), ..passing_row() };
        assert_eq!(check_filters(&row, &prev), Err(FilterRejection::LowVolatility));
    }

    #[test]
    fn test_reasons_are_distinct() {
        let all = [
            FilterRejection::MissingAtr,
            FilterRejection::LowVolatility,
            FilterRejection::MissingTrend,
            FilterRejection::FlatTrend,
            FilterRejection::MissingVolumeAverage,
            FilterRejection::ThinVolume,
            FilterRejection::AtrNotExpanding,
        ];
        let reasons: std::collections::HashSet<String> =
            all.iter().map(|r| r.to_string()).collect();
        assert_eq!(reasons.len(), all.len());
    }
}
