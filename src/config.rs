use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Shortest live loop tick; a zero period would stall the timer.
pub const MIN_LOOP_INTERVAL_MS: u64 = 1;

/// Decision engine parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Fraction of equity risked per trade.
    pub risk_per_trade: f64,
    /// Daily loss, as a fraction of equity, that stops trading.
    pub max_daily_loss: f64,
    /// Maximum notional / equity.
    pub max_leverage: f64,
    /// Indicator rows required before a decision is attempted.
    pub min_candles_required: usize,
    /// Decisions kept in memory.
    pub decision_history: usize,
    /// Order intents kept in memory.
    pub order_history: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            risk_per_trade: 0.01,
            max_daily_loss: 0.10,
            max_leverage: 20.0,
            min_candles_required: 60,
            decision_history: 500,
            order_history: 1000,
        }
    }
}

impl EngineConfig {
    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            risk_per_trade: parse_or(&lookup, "RISK_PER_TRADE", defaults.risk_per_trade),
            max_daily_loss: parse_or(&lookup, "MAX_DAILY_LOSS", defaults.max_daily_loss),
            max_leverage: parse_or(&lookup, "MAX_LEVERAGE", defaults.max_leverage),
            min_candles_required: parse_or(
                &lookup,
                "MIN_CANDLES_REQUIRED",
                defaults.min_candles_required,
            ),
            decision_history: parse_or(&lookup, "DECISION_HISTORY", defaults.decision_history),
            order_history: parse_or(&lookup, "ORDER_HISTORY", defaults.order_history),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Symbols tracked by the live loop.
    pub symbols: Vec<String>,
    /// Kline interval requested from the exchange (e.g. "1m").
    pub kline_interval: String,
    /// Klines fetched per evaluation.
    pub kline_limit: u32,
    /// Equity used for sizing when the loop evaluates.
    pub balance_usdt: f64,
    /// Start the live loop immediately.
    pub auto_mode: bool,
    /// Live loop tick period.
    pub loop_interval: Duration,
    /// Directory for the JSON-lines journal; disabled when unset.
    pub journal_dir: Option<PathBuf>,
    /// Binance USDⓈ-M futures REST base URL.
    pub binance_futures_url: String,
    pub engine: EngineConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        // Format: "BTCUSDT,ETHUSDT"
        let symbols: Vec<String> = lookup("SYMBOLS")
            .map(|s| {
                s.split(',')
                    .map(|sym| sym.trim().to_uppercase())
                    .filter(|sym| !sym.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        let symbols = if symbols.is_empty() {
            vec!["BTCUSDT".to_string()]
        } else {
            symbols
        };

        let auto_mode = lookup("AUTO_MODE")
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false);

        Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", 8000),
            symbols,
            kline_interval: lookup("KLINE_INTERVAL").unwrap_or_else(|| "1m".to_string()),
            kline_limit: parse_or(&lookup, "KLINE_LIMIT", 200),
            balance_usdt: parse_or(&lookup, "BALANCE_USDT", 1000.0),
            auto_mode,
            loop_interval: Duration::from_millis(
                parse_or(&lookup, "LOOP_INTERVAL_MS", 1500).max(MIN_LOOP_INTERVAL_MS),
            ),
            journal_dir: lookup("JOURNAL_DIR")
                .filter(|d| !d.trim().is_empty())
                .map(PathBuf::from),
            binance_futures_url: lookup("BINANCE_FUTURES_URL")
                .unwrap_or_else(|| "https://fapi.binance.com".to_string()),
            engine: EngineConfig::from_lookup(&lookup),
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
