//! Integration tests for API endpoints

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use momentum_breakout::config::Config;
use momentum_breakout::services::{CandleSource, DecisionJournal};
use momentum_breakout::types::RawCandle;
use momentum_breakout::{app, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

struct NoData;

impl CandleSource for NoData {
    fn fetch_candles<'a>(
        &'a self,
        _symbol: &'a str,
        _interval: &'a str,
        _limit: u32,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<RawCandle>>> + Send + 'a>> {
        Box::pin(async { Ok(Vec::new()) })
    }
}

/// Serves the breakout series and remembers the requested limit.
#[derive(Default)]
struct BreakoutSource {
    last_limit: AtomicU32,
}

impl CandleSource for BreakoutSource {
    fn fetch_candles<'a>(
        &'a self,
        _symbol: &'a str,
        _interval: &'a str,
        limit: u32,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<RawCandle>>> + Send + 'a>> {
        Box::pin(async move {
            self.last_limit.store(limit, Ordering::SeqCst);
            let candles = serde_json::from_value(Value::Array(breakout_candles()))?;
            Ok(candles)
        })
    }
}

struct Unreachable;

impl CandleSource for Unreachable {
    fn fetch_candles<'a>(
        &'a self,
        _symbol: &'a str,
        _interval: &'a str,
        _limit: u32,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<RawCandle>>> + Send + 'a>> {
        Box::pin(async { Err(anyhow::anyhow!("connection refused")) })
    }
}

fn state() -> AppState {
    AppState::new(Config::default(), Arc::new(NoData), None)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        // extractor rejections answer in plain text
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Rising series ending in a volume breakout, as JSON candles with `ts` in ms.
fn breakout_candles() -> Vec<Value> {
    let start = 1_709_290_000_000_i64;
    let mut candles: Vec<Value> = (0..79)
        .map(|i| {
            let close = 100.0 + 0.5 * i as f64;
            json!({
                "ts": start + i * 60_000,
                "open": close,
                "high": close + 0.5,
                "low": close - 0.5,
                "close": close,
                "volume": 100.0
            })
        })
        .collect();
    candles.push(json!({
        "ts": start + 79 * 60_000,
        "open": 139.0,
        "high": 144.5,
        "low": 138.5,
        "close": 144.0,
        "volume": 500.0
    }));
    candles
}

// =============================================================================
// Health & Status
// =============================================================================

#[tokio::test]
async fn test_health() {
    let (status, body) = send(app(state()), get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_status_before_any_decision() {
    let (status, body) = send(app(state()), get("/api/status")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert!(body["ts"].is_i64());
    assert_eq!(body["liveState"]["running"], false);
    assert!(body["lastDecision"].is_null());
}

// =============================================================================
// Live Mode
// =============================================================================

#[tokio::test]
async fn test_live_start_and_stop() {
    let state = state();

    let (status, body) = send(
        app(state.clone()),
        post_json("/api/live/start", json!({"symbol": "ethusdt", "tf": "5m"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["liveState"]["running"], true);
    assert_eq!(body["liveState"]["symbols"][0], "ETHUSDT");
    assert_eq!(body["liveState"]["timeframe"], "5m");

    let (_, body) = send(app(state.clone()), get("/api/live/status")).await;
    assert_eq!(body["status"], "running");

    let (_, body) = send(
        app(state.clone()),
        Request::builder()
            .method("POST")
            .uri("/api/live/stop")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(body["liveState"]["running"], false);

    let (_, body) = send(app(state), get("/api/live/status")).await;
    assert_eq!(body["status"], "stopped");
}

#[tokio::test]
async fn test_live_start_without_body() {
    let (status, body) = send(
        app(state()),
        Request::builder()
            .method("POST")
            .uri("/api/live/start")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["liveState"]["symbols"][0], "BTCUSDT");
}

#[tokio::test]
async fn test_live_start_returns_first_decision() {
    let state = AppState::new(Config::default(), Arc::new(BreakoutSource::default()), None);
    let (status, body) = send(
        app(state.clone()),
        post_json("/api/live/start", json!({"symbol": "btcusdt", "tf": "1m"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["firstDecision"]["action"], "LONG");
    assert_eq!(body["firstDecision"]["symbol"], "BTCUSDT");
    assert_eq!(state.engine.recent_orders(10).len(), 1);
}

#[tokio::test]
async fn test_live_start_survives_source_failure() {
    let state = AppState::new(Config::default(), Arc::new(Unreachable), None);
    let (status, body) = send(app(state), post_json("/api/live/start", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["liveState"]["running"], true);
    assert!(body["firstDecision"].is_null());
}

// =============================================================================
// Live Market Data
// =============================================================================

#[tokio::test]
async fn test_live_market_returns_indicator_rows() {
    let source = Arc::new(BreakoutSource::default());
    let state = AppState::new(Config::default(), source.clone(), None);

    let (status, body) = send(app(state), get("/api/live?symbol=ethusdt&tf=5m&limit=300")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["symbol"], "ETHUSDT");
    assert_eq!(body["timeframe"], "5m");
    assert_eq!(body["count"], 80);
    assert_eq!(source.last_limit.load(Ordering::SeqCst), 300);

    let rows = body["candles"].as_array().unwrap();
    assert_eq!(rows.len(), 80);
    assert!(rows[0]["atr"].is_null());
    assert_eq!(rows[79]["close"], 144.0);
    assert!(rows[79]["ema_fast"].is_f64());
    assert!(rows[79]["highest_high"].is_f64());
}

#[tokio::test]
async fn test_live_market_limit_is_bounded() {
    let source = Arc::new(BreakoutSource::default());
    let state = AppState::new(Config::default(), source.clone(), None);

    send(app(state.clone()), get("/api/live?limit=1")).await;
    assert_eq!(source.last_limit.load(Ordering::SeqCst), 10);

    send(app(state.clone()), get("/api/live?limit=50000")).await;
    assert_eq!(source.last_limit.load(Ordering::SeqCst), 2000);

    let (_, body) = send(app(state), get("/api/live")).await;
    assert_eq!(source.last_limit.load(Ordering::SeqCst), 200);
    assert_eq!(body["symbol"], "BTCUSDT");
    assert_eq!(body["timeframe"], "1m");
}

#[tokio::test]
async fn test_live_market_source_failure_is_bad_gateway() {
    let state = AppState::new(Config::default(), Arc::new(Unreachable), None);
    let (status, body) = send(app(state), get("/api/live")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("connection refused"));
}

#[tokio::test]
async fn test_live_market_without_candles_is_unprocessable() {
    let (status, body) = send(app(state()), get("/api/live")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["status"], 422);
}

// =============================================================================
// Evaluate, Decisions, Orders
// =============================================================================

#[tokio::test]
async fn test_evaluate_then_query_history() {
    let state = state();
    let request = json!({
        "symbol": "BTCUSDT",
        "timeframe": "1m",
        "candles": breakout_candles(),
        "equity": 100000.0
    });

    let (status, body) = send(app(state.clone()), post_json("/api/evaluate", request)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["decision"]["action"], "LONG");
    assert_eq!(body["order"]["side"], "BUY");

    let (_, body) = send(app(state.clone()), get("/api/decisions?limit=0")).await;
    assert_eq!(body["count"], 1);

    let (status, body) = send(app(state.clone()), get("/api/decisions/last")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode"], "MOMENTUM_BREAKOUT");

    let (_, body) = send(app(state.clone()), get("/api/orders")).await;
    assert_eq!(body["count"], 1);

    let (_, body) = send(
        app(state.clone()),
        get("/api/orders/range?from=2024-03-01&to=2024-03-01"),
    )
    .await;
    assert_eq!(body["count"], 1);

    let (_, body) = send(
        app(state),
        get("/api/orders/range?from=2024-03-02&to=2024-03-05"),
    )
    .await;
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_evaluate_bad_candles_is_error_decision() {
    let request = json!({
        "symbol": "BTCUSDT",
        "timeframe": "1m",
        "candles": [{"open": 1.0, "high": 1.0, "low": 1.0, "close": 1.0, "volume": 1.0}],
        "equity": 1000.0
    });
    let (status, body) = send(app(state()), post_json("/api/evaluate", request)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["decision"]["mode"], "ERROR");
    assert!(body["order"].is_null());
}

#[tokio::test]
async fn test_last_decision_not_found() {
    let (status, body) = send(app(state()), get("/api/decisions/last")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);
}

#[tokio::test]
async fn test_orders_range_rejects_bad_dates() {
    let (status, body) = send(app(state()), get("/api/orders/range?from=yesterday&to=2024-03-01")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("from"));

    let (status, _) = send(app(state()), get("/api/orders/range?from=2024-03-05&to=2024-03-01")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_pnl_snapshot() {
    let state = state();
    state.engine.record_realized_pnl(-42.0);

    let (status, body) = send(app(state), get("/api/pnl?period=day")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["period"], "day");
    assert_eq!(body["dailyPnl"], -42.0);
    assert!(body["dailyDate"].is_string());
}

#[tokio::test]
async fn test_evaluate_is_journaled() {
    let dir = tempfile::tempdir().unwrap();
    let journal = Arc::new(DecisionJournal::open(dir.path()).unwrap());
    let state = AppState::new(Config::default(), Arc::new(NoData), Some(journal.clone()));

    let request = json!({
        "symbol": "BTCUSDT",
        "timeframe": "1m",
        "candles": breakout_candles(),
        "equity": 100000.0
    });
    send(app(state), post_json("/api/evaluate", request)).await;

    assert_eq!(journal.read_decisions(10).unwrap().len(), 1);
    assert_eq!(journal.read_orders(10).unwrap().len(), 1);
}

#[tokio::test]
async fn test_history_from_journal() {
    let dir = tempfile::tempdir().unwrap();
    let journal = Arc::new(DecisionJournal::open(dir.path()).unwrap());
    let request = json!({
        "symbol": "BTCUSDT",
        "timeframe": "1m",
        "candles": breakout_candles(),
        "equity": 100000.0
    });

    // a first process journals, a restarted one reads it back
    let first = AppState::new(Config::default(), Arc::new(NoData), Some(journal.clone()));
    send(app(first), post_json("/api/evaluate", request)).await;

    let restarted = AppState::new(Config::default(), Arc::new(NoData), Some(journal));
    let (_, body) = send(app(restarted.clone()), get("/api/decisions")).await;
    assert_eq!(body["count"], 0);

    let (status, body) = send(app(restarted.clone()), get("/api/decisions?source=journal")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["decisions"][0]["action"], "LONG");

    let (status, body) = send(app(restarted), get("/api/orders?source=journal&limit=5")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["orders"][0]["side"], "BUY");
}

#[tokio::test]
async fn test_journal_source_requires_journal() {
    let (status, body) = send(app(state()), get("/api/decisions?source=journal")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("journal"));

    let (status, _) = send(app(state()), get("/api/orders?source=journal")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(app(state()), get("/api/orders?source=redis")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
