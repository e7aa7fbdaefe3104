//! Wallet holdings handlers

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::info;

use crate::AppState;
use crate::handlers::error::{ApiError, bad_request, chain_error};
use crate::models::address::NormalizedAddress;
use crate::models::holding::HoldingsResponse;
use crate::services::holdings::HoldingsSnapshot;

fn to_response(snapshot: HoldingsSnapshot) -> HoldingsResponse {
    HoldingsResponse {
        total_estimated_value: snapshot.total_estimated_value(),
        wallet: snapshot.wallet,
        holdings: snapshot.holdings.as_ref().clone(),
        cached: snapshot.cached,
        partial: snapshot.partial,
    }
}

/// GET /api/holdings/{wallet}
pub async fn get_holdings(
    State(state): State<AppState>,
    Path(wallet): Path<String>,
) -> Result<Json<HoldingsResponse>, ApiError> {
    let wallet = NormalizedAddress::parse(&wallet).map_err(|e| bad_request(e.to_string()))?;

    let snapshot = state
        .holdings
        .holdings_for(&wallet)
        .await
        .map_err(|e| chain_error(&e))?;

    info!(wallet = %wallet, count = snapshot.holdings.len(), cached = snapshot.cached, "Holdings returned");
    Ok(Json(to_response(snapshot)))
}

/// POST /api/holdings/{wallet}/refresh
pub async fn refresh_holdings(
    State(state): State<AppState>,
    Path(wallet): Path<String>,
) -> Result<Json<HoldingsResponse>, ApiError> {
    let wallet = NormalizedAddress::parse(&wallet).map_err(|e| bad_request(e.to_string()))?;

    let snapshot = state
        .holdings
        .refresh_holdings(&wallet)
        .await
        .map_err(|e| chain_error(&e))?;

    info!(wallet = %wallet, count = snapshot.holdings.len(), "Holdings refreshed");
    Ok(Json(to_response(snapshot)))
}
