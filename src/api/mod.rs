pub mod decisions;
pub mod health;
pub mod live;
pub mod orders;

use std::sync::Arc;

use axum::Router;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::services::DecisionJournal;
use crate::AppState;

/// Where a history endpoint reads from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistorySource {
    /// The engine's bounded in-memory history.
    #[default]
    Memory,
    /// The on-disk journal, which outlives restarts.
    Journal,
}

fn journal(state: &AppState) -> Result<&Arc<DecisionJournal>> {
    state
        .journal
        .as_ref()
        .ok_or_else(|| AppError::NotFound("journal is not enabled (set JOURNAL_DIR)".to_string()))
}

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(decisions::router())
        .merge(orders::router())
        .merge(live::router())
}
