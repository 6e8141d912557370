//! Live decision loop.
//!
//! Polls market data for every tracked symbol on a fixed cadence, feeds it to
//! the decision engine, journals the outcome and broadcasts order intents to
//! whoever executes them.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::time::interval;
use tracing::{debug, error, info, warn};

use super::engine::DecisionEngine;
use super::journal::DecisionJournal;
use crate::config::{Config, MIN_LOOP_INTERVAL_MS};
use crate::types::{EvaluateRequest, Evaluation, OrderIntent, RawCandle};

/// Ticks skipped after the first failure.
pub const BACKOFF_MIN_TICKS: u32 = 5;
/// Upper bound on skipped ticks.
pub const BACKOFF_MAX_TICKS: u32 = 60;

/// Provider of recent candles for a symbol.
pub trait CandleSource: Send + Sync {
    fn fetch_candles<'a>(
        &'a self,
        symbol: &'a str,
        interval: &'a str,
        limit: u32,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<RawCandle>>> + Send + 'a>>;
}

/// What the live loop is doing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveState {
    pub running: bool,
    pub symbols: Vec<String>,
    pub timeframe: String,
    pub since: Option<DateTime<Utc>>,
}

/// Per-symbol failure backoff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Backoff {
    /// Ticks still to skip.
    pub remaining: u32,
    /// Length of the last penalty; doubles on each consecutive failure.
    pub level: u32,
}

impl Backoff {
    fn fail(&mut self) {
        self.level = (self.level * 2).clamp(BACKOFF_MIN_TICKS, BACKOFF_MAX_TICKS);
        self.remaining = self.level;
    }
}

/// Drives the decision engine from live market data.
pub struct DecisionLoop {
    engine: Arc<DecisionEngine>,
    source: Arc<dyn CandleSource>,
    journal: Option<Arc<DecisionJournal>>,
    live: RwLock<LiveState>,
    backoff: DashMap<String, Backoff>,
    balance: f64,
    kline_limit: u32,
    tick_interval: Duration,
    order_tx: broadcast::Sender<OrderIntent>,
    shutdown_tx: broadcast::Sender<()>,
}

impl DecisionLoop {
    pub fn new(
        config: &Config,
        engine: Arc<DecisionEngine>,
        source: Arc<dyn CandleSource>,
        journal: Option<Arc<DecisionJournal>>,
    ) -> Self {
        let (order_tx, _) = broadcast::channel(256);
        let (shutdown_tx, _) = broadcast::channel(1);

        let live = LiveState {
            running: config.auto_mode,
            symbols: config.symbols.clone(),
            timeframe: config.kline_interval.clone(),
            since: config.auto_mode.then(Utc::now),
        };

        Self {
            engine,
            source,
            journal,
            live: RwLock::new(live),
            backoff: DashMap::new(),
            balance: config.balance_usdt,
            kline_limit: config.kline_limit,
            tick_interval: config
                .loop_interval
                .max(Duration::from_millis(MIN_LOOP_INTERVAL_MS)),
            order_tx,
            shutdown_tx,
        }
    }

    pub fn live_state(&self) -> LiveState {
        self.live
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Turn live mode on, optionally narrowing to one symbol and timeframe.
    pub fn start_live(&self, symbol: Option<String>, timeframe: Option<String>) -> LiveState {
        let mut live = self.live.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(symbol) = symbol.filter(|s| !s.trim().is_empty()) {
            live.symbols = vec![symbol.trim().to_uppercase()];
        }
        if let Some(tf) = timeframe.filter(|t| !t.trim().is_empty()) {
            live.timeframe = tf.trim().to_string();
        }
        live.running = true;
        live.since = Some(Utc::now());
        info!("Live mode started: {:?} {}", live.symbols, live.timeframe);
        live.clone()
    }

    pub fn stop_live(&self) -> LiveState {
        let mut live = self.live.write().unwrap_or_else(PoisonError::into_inner);
        live.running = false;
        live.since = None;
        info!("Live mode stopped");
        live.clone()
    }

    /// Receive every order intent the loop produces.
    pub fn subscribe_orders(&self) -> broadcast::Receiver<OrderIntent> {
        self.order_tx.subscribe()
    }

    pub fn backoff(&self, symbol: &str) -> Backoff {
        self.backoff
            .get(symbol)
            .map(|b| *b)
            .unwrap_or_default()
    }

    /// Run until `shutdown` is called.
    pub async fn run(&self) {
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let mut ticker = interval(self.tick_interval);
        info!("Decision loop tick interval: {:?}", self.tick_interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick().await;
                }
                _ = shutdown_rx.recv() => {
                    info!("Decision loop received shutdown signal");
                    break;
                }
            }
        }
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// One pass over every tracked symbol. Does nothing unless live.
    pub async fn tick(&self) {
        let live = self.live_state();
        if !live.running {
            return;
        }

        for symbol in &live.symbols {
            {
                let mut backoff = self.backoff.entry(symbol.clone()).or_default();
                if backoff.remaining > 0 {
                    backoff.remaining -= 1;
                    continue;
                }
            }

            match self.evaluate_symbol(symbol, &live.timeframe).await {
                Ok(_) => {
                    self.backoff.insert(symbol.clone(), Backoff::default());
                }
                Err(e) => {
                    let mut backoff = self.backoff.entry(symbol.clone()).or_default();
                    backoff.fail();
                    error!(
                        "Decision for {} failed, skipping {} ticks: {}",
                        symbol, backoff.remaining, e
                    );
                }
            }
        }
    }

    /// Fetch, evaluate, journal and publish one symbol.
    pub async fn evaluate_symbol(&self, symbol: &str, timeframe: &str) -> anyhow::Result<Evaluation> {
        let candles = self
            .source
            .fetch_candles(symbol, timeframe, self.kline_limit)
            .await?;
        debug!("Fetched {} candles for {} {}", candles.len(), symbol, timeframe);

        let request = EvaluateRequest {
            symbol: symbol.to_string(),
            timeframe: timeframe.to_string(),
            candles,
            equity: self.balance,
            daily_pnl: None,
        };
        let evaluation = self.engine.evaluate(&request);

        if let Some(journal) = &self.journal {
            if let Err(e) = journal.record(&evaluation) {
                warn!("Failed to journal decision for {}: {}", symbol, e);
            }
        }

        if let Some(order) = &evaluation.order {
            // no subscriber is fine; nobody executes in dry runs
            let _ = self.order_tx.send(order.clone());
        }

        Ok(evaluation)
    }
}
