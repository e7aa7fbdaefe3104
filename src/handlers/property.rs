//! Property listing handlers
//!
//! GET /api/properties and GET /api/properties/{address}

use axum::{
    Json,
    extract::{Path, Query, State},
};
use tracing::{info, warn};

use crate::AppState;
use crate::handlers::error::{ApiError, bad_request, reconcile_error};
use crate::models::address::NormalizedAddress;
use crate::models::property::{PropertyDetailResponse, PropertyListQuery, PropertyListResponse};

/// Get enriched properties
///
/// GET /api/properties
///
/// # Query Parameters
///
/// - `limit` - Maximum number of results (default: 50, max: 100)
/// - `offset` - Offset for pagination (default: 0)
/// - `active` - Only properties active on chain
/// - `chain_only` - Exclude metadata rows with no registry record
/// - `property_type` - e.g. `residential`, `commercial`
///
/// When the metadata store is unreachable the listing still succeeds with
/// chain data and `metadata_error` set.
pub async fn get_property_list(
    State(state): State<AppState>,
    Query(query): Query<PropertyListQuery>,
) -> Result<Json<PropertyListResponse>, ApiError> {
    info!(
        limit = query.limit,
        offset = query.offset,
        active = query.active,
        chain_only = query.chain_only,
        "Property list request received"
    );

    if let Err(e) = query.validate() {
        warn!(error = %e, "Invalid query parameters");
        return Err(bad_request(e));
    }

    let listing = state.reconciler.list_enriched().await.map_err(reconcile_error)?;

    let limit = query.limit.unwrap_or(PropertyListQuery::DEFAULT_LIMIT);
    let offset = query.offset.unwrap_or(0);

    let matching: Vec<_> = listing
        .properties
        .into_iter()
        .filter(|p| query.matches(p))
        .collect();

    let total = matching.len() as i64;
    let total_market_value: f64 = matching.iter().map(|p| p.market_value).sum();

    let properties: Vec<_> = matching
        .into_iter()
        .skip(offset as usize)
        .take(limit as usize)
        .collect();

    info!(
        count = properties.len(),
        total = total,
        metadata_error = listing.metadata_error.is_some(),
        "Property list returned"
    );

    Ok(Json(PropertyListResponse {
        properties,
        total,
        limit,
        offset,
        total_market_value,
        metadata_error: listing.metadata_error,
    }))
}

/// Get one enriched property
///
/// GET /api/properties/{address}
///
/// Metadata without a registry record is returned with
/// `has_chain_data: false` and zeroed financial fields.
pub async fn get_property(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<PropertyDetailResponse>, ApiError> {
    let address = NormalizedAddress::parse(&address).map_err(|e| bad_request(e.to_string()))?;

    let lookup = state
        .reconciler
        .get_enriched_by_address(&address)
        .await
        .map_err(reconcile_error)?;

    info!(
        address = %address,
        has_chain_data = lookup.property.has_chain_data,
        has_metadata = lookup.property.has_metadata,
        "Property detail returned"
    );

    Ok(Json(PropertyDetailResponse {
        property: lookup.property,
        metadata_error: lookup.metadata_error,
    }))
}
