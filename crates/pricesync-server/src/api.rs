//! HTTP routes.

use std::sync::Arc;

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderValue, StatusCode},
    routing::{get, post},
};
use chrono::{NaiveDate, Utc};
use pricesync::{DateRange, PriceBar, Symbol, normalize::DATE_FORMAT};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

/// Window served by the history route when no dates are given.
const DEFAULT_HISTORY_DAYS: u32 = 30;

#[derive(Deserialize)]
struct FetchParams {
    symbol: Option<String>,
}

#[derive(Serialize)]
struct FetchResponse {
    success: bool,
    records_processed: usize,
    message: &'static str,
}

#[derive(Deserialize)]
struct HistoryParams {
    symbol: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    provider: String,
}

fn required_symbol(symbol: Option<String>) -> ApiResult<String> {
    symbol
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Symbol parameter is required".to_string()))
}

fn parse_date_param(value: Option<&str>, name: &str) -> ApiResult<Option<NaiveDate>> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| {
            NaiveDate::parse_from_str(v.trim(), DATE_FORMAT).map_err(|_| {
                ApiError::BadRequest(format!(
                    "Invalid {name} format. Please format like 'YYYY-MM-DD'"
                ))
            })
        })
        .transpose()
}

/// Fetch the full history of a symbol from the provider and store it.
async fn fetch_stock(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FetchParams>,
) -> ApiResult<Json<FetchResponse>> {
    let symbol = required_symbol(params.symbol)?;
    let records_processed = state.coordinator.synchronize(&symbol).await?;
    Ok(Json(FetchResponse {
        success: true,
        records_processed,
        message: "Successfully fetched and stored stock data",
    }))
}

/// Stored bars of a symbol, newest first.
async fn stock_history(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HistoryParams>,
) -> ApiResult<Json<Vec<PriceBar>>> {
    let symbol = required_symbol(params.symbol)?;
    let start = parse_date_param(params.start_date.as_deref(), "start date")?;
    let end = parse_date_param(params.end_date.as_deref(), "end date")?;

    let end = end.unwrap_or_else(|| Utc::now().date_naive());
    let start =
        start.unwrap_or_else(|| DateRange::trailing_days(end, DEFAULT_HISTORY_DAYS).start());

    let bars = state.queries.history(&symbol, start, end).await?;
    Ok(Json(bars))
}

async fn stock_symbols(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Symbol>>> {
    Ok(Json(state.queries.symbols().await?))
}

async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let (status, label) = match state.store.ping().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(e) => {
            tracing::warn!(error = %e, "store health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    };
    (
        status,
        Json(HealthResponse {
            status: label,
            provider: state.provider_name().to_string(),
        }),
    )
}

fn cors_layer(cors_allow: &[String]) -> anyhow::Result<CorsLayer> {
    if cors_allow.is_empty() || cors_allow.iter().any(|o| o == "*") {
        return Ok(CorsLayer::new().allow_origin(Any));
    }
    let origins = cors_allow
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>()
                .with_context(|| format!("invalid CORS origin '{o}'"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(CorsLayer::new().allow_origin(origins))
}

/// Build the application router.
///
/// # Errors
/// Returns an error if a CORS origin is not a valid header value.
pub fn app_router(state: Arc<AppState>, cors_allow: &[String]) -> anyhow::Result<Router> {
    let router = Router::new()
        .route("/stocks/fetch", post(fetch_stock))
        .route("/stocks/history", get(stock_history))
        .route("/stocks/symbols", get(stock_symbols))
        .route("/health", get(health))
        .with_state(state)
        .layer(cors_layer(cors_allow)?)
        .layer(TraceLayer::new_for_http());
    Ok(router)
}
