//! Decision history and on-demand evaluation endpoints.

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::HistorySource;
use crate::error::{AppError, Result};
use crate::types::{EvaluateRequest, Evaluation, Signal};
use crate::AppState;

const DEFAULT_LIMIT: usize = 100;
const MAX_LIMIT: usize = 500;

#[derive(Debug, Deserialize)]
pub struct DecisionsQuery {
    pub limit: Option<usize>,
    #[serde(default)]
    pub source: HistorySource,
}

#[derive(Serialize)]
pub struct DecisionsResponse {
    pub decisions: Vec<Signal>,
    pub count: usize,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/decisions", get(decisions))
        .route("/api/decisions/last", get(last_decision))
        .route("/api/evaluate", post(evaluate))
}

/// GET /api/decisions?limit=&source=memory|journal
async fn decisions(
    State(state): State<AppState>,
    Query(query): Query<DecisionsQuery>,
) -> Result<Json<DecisionsResponse>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let decisions = match query.source {
        HistorySource::Memory => state.engine.recent_decisions(limit),
        HistorySource::Journal => super::journal(&state)?
            .read_decisions(limit)?
            .into_iter()
            .map(|entry| entry.record)
            .collect(),
    };
    Ok(Json(DecisionsResponse {
        count: decisions.len(),
        decisions,
    }))
}

/// GET /api/decisions/last
async fn last_decision(State(state): State<AppState>) -> Result<Json<Signal>> {
    state
        .engine
        .last_decision()
        .map(Json)
        .ok_or_else(|| AppError::NotFound("no decision recorded yet".to_string()))
}

/// POST /api/evaluate
async fn evaluate(
    State(state): State<AppState>,
    Json(request): Json<EvaluateRequest>,
) -> Result<Json<Evaluation>> {
    if !request.equity.is_finite() {
        return Err(AppError::BadRequest("equity must be a finite number".to_string()));
    }

    let evaluation = state.engine.evaluate(&request);
    if let Some(journal) = &state.journal {
        if let Err(e) = journal.record(&evaluation) {
            warn!("Failed to journal evaluation for {}: {}", request.symbol, e);
        }
    }
    Ok(Json(evaluation))
}
