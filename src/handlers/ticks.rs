//! Tick history handlers
//!
//! GET /api/ko returns the full history for the configured symbol.
//! GET /api/ticks/{symbol} returns the same shape for any stored symbol.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::{error, info};

use crate::config::normalize_symbol;
use crate::models::tick::{ErrorResponse, TickEntry};
use crate::services::tick_store::fetch_tick_entries;
use crate::AppState;

type TickResult = Result<Json<Vec<TickEntry>>, (StatusCode, Json<ErrorResponse>)>;

/// GET /api/ko
///
/// # Response
/// - 200: every stored day, oldest first (`[]` when nothing is stored)
/// - 500: store unavailable or a stored row could not be decoded
pub async fn get_default_ticks(State(state): State<AppState>) -> TickResult {
    let symbol = state.ticks.symbol.clone();
    load_ticks(&state, &symbol).await
}

/// GET /api/ticks/{symbol}
///
/// Symbols are matched upper-case. 400 for an empty or over-long symbol.
pub async fn get_symbol_ticks(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> TickResult {
    let symbol = normalize_symbol(&symbol).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("Invalid symbol '{}'", symbol),
            }),
        )
    })?;

    load_ticks(&state, &symbol).await
}

async fn load_ticks(state: &AppState, symbol: &str) -> TickResult {
    let entries = fetch_tick_entries(state.db.as_ref(), &state.ticks.table, symbol)
        .await
        .map_err(|e| {
            error!(symbol = %symbol, error = %e, "Failed to load tick history");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
        })?;

    info!(symbol = %symbol, count = entries.len(), "Served tick history");
    Ok(Json(entries))
}
