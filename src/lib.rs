//! Momentum-breakout decision engine for crypto futures.
//!
//! Turns OHLCV candles into LONG/SHORT/NONE decisions with bracket levels,
//! sizes them under a fixed-fractional risk budget and a leverage cap, and
//! stops trading for the day once the daily loss limit is hit.

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod sources;
pub mod types;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use services::{CandleSource, DecisionEngine, DecisionJournal, DecisionLoop};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub engine: Arc<DecisionEngine>,
    pub runner: Arc<DecisionLoop>,
    pub source: Arc<dyn CandleSource>,
    pub journal: Option<Arc<DecisionJournal>>,
}

impl AppState {
    /// Wire the engine and the live loop around a market-data source.
    pub fn new(
        config: Config,
        source: Arc<dyn CandleSource>,
        journal: Option<Arc<DecisionJournal>>,
    ) -> Self {
        let engine = Arc::new(DecisionEngine::new(config.engine.clone()));
        let runner = Arc::new(DecisionLoop::new(
            &config,
            engine.clone(),
            source.clone(),
            journal.clone(),
        ));
        Self {
            config: Arc::new(config),
            engine,
            runner,
            source,
            journal,
        }
    }
}

/// Build the HTTP application.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
