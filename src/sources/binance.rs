use std::future::Future;
use std::pin::Pin;

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::services::CandleSource;
use crate::types::RawCandle;

/// Binance USDⓈ-M futures kline client.
#[derive(Clone)]
pub struct BinanceKlineSource {
    client: Client,
    base_url: String,
}

impl BinanceKlineSource {
    /// Create a new client against `base_url` (e.g. `https://fapi.binance.com`).
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .user_agent("momentum-breakout/0.1")
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Fetch the most recent klines for a symbol.
    pub async fn fetch_klines(
        &self,
        symbol: &str,
        interval: &str,
        limit: u32,
    ) -> anyhow::Result<Vec<RawCandle>> {
        let url = format!("{}/fapi/v1/klines", self.base_url);
        let limit = limit.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[("symbol", symbol), ("interval", interval), ("limit", limit.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            warn!("Binance klines returned {}: {}", status, snippet(&text, 200));
            return Err(anyhow::anyhow!("Binance API error: {}", status));
        }

        let rows: Vec<Vec<Value>> = response.json().await?;
        let candles = parse_klines(&rows)?;
        debug!("Binance klines {} {}: {} candles", symbol, interval, candles.len());
        Ok(candles)
    }
}

impl CandleSource for BinanceKlineSource {
    fn fetch_candles<'a>(
        &'a self,
        symbol: &'a str,
        interval: &'a str,
        limit: u32,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<RawCandle>>> + Send + 'a>> {
        Box::pin(self.fetch_klines(symbol, interval, limit))
    }
}

/// First `max` characters of an error body, cut on a char boundary.
fn snippet(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Numbers arrive either as JSON numbers or as decimal strings.
fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Map kline arrays `[openTime, open, high, low, close, volume, ...]` to raw
/// candles timed by their open time in milliseconds.
pub fn parse_klines(rows: &[Vec<Value>]) -> anyhow::Result<Vec<RawCandle>> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let field = |idx: usize| -> anyhow::Result<f64> {
                row.get(idx)
                    .and_then(number)
                    .ok_or_else(|| anyhow::anyhow!("kline {}: bad field {}", i, idx))
            };
            Ok(RawCandle::new(
                field(0)?,
                field(1)?,
                field(2)?,
                field(3)?,
                field(4)?,
                field(5)?,
            ))
        })
        .collect()
}
