//! Health and dashboard status endpoints.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::services::LiveState;
use crate::types::Signal;
use crate::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Snapshot polled by the dashboard.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub ok: bool,
    /// Epoch milliseconds.
    pub ts: i64,
    pub live_state: LiveState,
    pub last_decision: Option<Signal>,
}

/// GET /api/health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /api/status
async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        ok: true,
        ts: chrono::Utc::now().timestamp_millis(),
        live_state: state.runner.live_state(),
        last_decision: state.engine.last_decision(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/status", get(status))
}
