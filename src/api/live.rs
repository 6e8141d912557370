//! Live market data and live mode control endpoints.

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{AppError, Result};
use crate::services::signals::{compute_indicators, IndicatorRow};
use crate::services::LiveState;
use crate::types::Signal;
use crate::AppState;

const MIN_LIMIT: u32 = 10;
const MAX_LIMIT: u32 = 2000;

#[derive(Debug, Deserialize)]
pub struct LiveMarketQuery {
    pub symbol: Option<String>,
    pub tf: Option<String>,
    pub limit: Option<u32>,
}

/// Candles with their indicators, for the dashboard chart.
#[derive(Serialize)]
pub struct LiveMarketResponse {
    pub symbol: String,
    pub timeframe: String,
    pub count: usize,
    pub candles: Vec<IndicatorRow>,
}

/// Body of a live start request. Missing fields keep the current values.
#[derive(Debug, Default, Deserialize)]
pub struct LiveStartRequest {
    pub symbol: Option<String>,
    pub tf: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveStartResponse {
    pub ok: bool,
    pub live_state: LiveState,
    /// Decision for the first tracked symbol, made as live mode starts.
    pub first_decision: Option<Signal>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveToggleResponse {
    pub ok: bool,
    pub live_state: LiveState,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveStatusResponse {
    /// "running" or "stopped".
    pub status: &'static str,
    pub live_state: LiveState,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/live", get(market))
        .route("/api/live/start", post(start))
        .route("/api/live/stop", post(stop))
        .route("/api/live/status", get(status))
}

/// GET /api/live
async fn market(
    State(state): State<AppState>,
    Query(query): Query<LiveMarketQuery>,
) -> Result<Json<LiveMarketResponse>> {
    let symbol = query
        .symbol
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .or_else(|| state.config.symbols.first().cloned())
        .unwrap_or_else(|| "BTCUSDT".to_string());
    let timeframe = query
        .tf
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| state.config.kline_interval.clone());
    let limit = query
        .limit
        .unwrap_or(state.config.kline_limit)
        .clamp(MIN_LIMIT, MAX_LIMIT);

    let raw = state
        .source
        .fetch_candles(&symbol, &timeframe, limit)
        .await
        .map_err(|e| AppError::ExternalApi(e.to_string()))?;
    let candles = compute_indicators(&raw)?;

    Ok(Json(LiveMarketResponse {
        symbol,
        timeframe,
        count: candles.len(),
        candles,
    }))
}

/// POST /api/live/start
async fn start(
    State(state): State<AppState>,
    body: Option<Json<LiveStartRequest>>,
) -> Json<LiveStartResponse> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let live_state = state.runner.start_live(request.symbol, request.tf);

    let first_decision = match live_state.symbols.first() {
        Some(symbol) => match state
            .runner
            .evaluate_symbol(symbol, &live_state.timeframe)
            .await
        {
            Ok(evaluation) => {
                info!("First live decision for {}: {}", symbol, evaluation.decision.action);
                Some(evaluation.decision)
            }
            Err(e) => {
                warn!("First live decision for {} failed: {}", symbol, e);
                None
            }
        },
        None => None,
    };

    Json(LiveStartResponse {
        ok: true,
        live_state,
        first_decision,
    })
}

/// POST /api/live/stop
async fn stop(State(state): State<AppState>) -> Json<LiveToggleResponse> {
    Json(LiveToggleResponse {
        ok: true,
        live_state: state.runner.stop_live(),
    })
}

/// GET /api/live/status
async fn status(State(state): State<AppState>) -> Json<LiveStatusResponse> {
    let live_state = state.runner.live_state();
    Json(LiveStatusResponse {
        status: if live_state.running { "running" } else { "stopped" },
        live_state,
    })
}
