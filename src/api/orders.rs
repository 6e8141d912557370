//! Order intent history and daily PnL endpoints.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::HistorySource;
use crate::error::{AppError, Result};
use crate::types::{OrderIntent, PnlSnapshot};
use crate::AppState;

const DEFAULT_LIMIT: usize = 200;
const MAX_LIMIT: usize = 1000;

#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
    pub limit: Option<usize>,
    #[serde(default)]
    pub source: HistorySource,
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Deserialize)]
pub struct PnlQuery {
    pub period: Option<String>,
}

#[derive(Serialize)]
pub struct OrdersResponse {
    pub orders: Vec<OrderIntent>,
    pub count: usize,
}

#[derive(Serialize)]
pub struct OrdersRangeResponse {
    pub orders: Vec<OrderIntent>,
    pub count: usize,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PnlResponse {
    pub period: String,
    #[serde(flatten)]
    pub snapshot: PnlSnapshot,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/orders", get(orders))
        .route("/api/orders/range", get(orders_range))
        .route("/api/pnl", get(pnl))
}

/// GET /api/orders?limit=&source=memory|journal
async fn orders(
    State(state): State<AppState>,
    Query(query): Query<OrdersQuery>,
) -> Result<Json<OrdersResponse>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let orders = match query.source {
        HistorySource::Memory => state.engine.recent_orders(limit),
        HistorySource::Journal => super::journal(&state)?
            .read_orders(limit)?
            .into_iter()
            .map(|entry| entry.record)
            .collect(),
    };
    Ok(Json(OrdersResponse {
        count: orders.len(),
        orders,
    }))
}

fn parse_date(name: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        AppError::BadRequest(format!("'{}' must be a YYYY-MM-DD date, got '{}'", name, value))
    })
}

/// GET /api/orders/range?from=YYYY-MM-DD&to=YYYY-MM-DD
async fn orders_range(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<OrdersRangeResponse>> {
    let from = parse_date("from", &query.from)?;
    let to = parse_date("to", &query.to)?;
    if from > to {
        return Err(AppError::BadRequest(format!(
            "'from' ({}) is after 'to' ({})",
            from, to
        )));
    }

    let orders = state.engine.orders_between(from, to);
    Ok(Json(OrdersRangeResponse {
        count: orders.len(),
        orders,
        from,
        to,
    }))
}

/// GET /api/pnl
async fn pnl(State(state): State<AppState>, Query(query): Query<PnlQuery>) -> Json<PnlResponse> {
    Json(PnlResponse {
        period: query.period.unwrap_or_else(|| "day".to_string()),
        snapshot: state.engine.pnl_snapshot(),
    })
}
