//! Admin metadata handlers
//!
//! Create, update and delete rows of the off-chain `properties` table and
//! upload property images. All endpoints require the admin API key in the
//! `X-API-Key` header.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::{StatusCode, header::{CONTENT_TYPE, HeaderMap}},
};
use tracing::{error, info, warn};

use crate::AppState;
use crate::handlers::error::{ApiError, api_error, bad_request, check_admin_auth, metadata_error};
use crate::models::address::NormalizedAddress;
use crate::models::metadata::{
    CreateMetadataRequest, ImageUploadQuery, MAX_IMAGES, MetadataFields, MetadataResponse,
};
use crate::services::image_storage::StorageError;

fn parse_address(raw: &str) -> Result<NormalizedAddress, ApiError> {
    NormalizedAddress::parse(raw).map_err(|e| bad_request(e.to_string()))
}

fn validate_fields(fields: &MetadataFields) -> Result<(), ApiError> {
    fields.validate().map_err(|e| {
        warn!(error = %e, "Invalid metadata fields");
        bad_request(e)
    })
}

/// POST /api/admin/metadata
pub async fn create_metadata(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateMetadataRequest>,
) -> Result<(StatusCode, Json<MetadataResponse>), ApiError> {
    let correlation_id = uuid::Uuid::new_v4().to_string();
    check_admin_auth(&state, &headers)?;

    let address = parse_address(&payload.contract_address)?;
    validate_fields(&payload.fields)?;

    info!(correlation_id = %correlation_id, address = %address, "Metadata create request received");

    let created = state
        .metadata
        .create(&address, payload.fields)
        .await
        .map_err(metadata_error)?;

    Ok((StatusCode::CREATED, Json(created.into())))
}

/// PUT /api/admin/metadata/{address}
pub async fn update_metadata(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(address): Path<String>,
    Json(fields): Json<MetadataFields>,
) -> Result<Json<MetadataResponse>, ApiError> {
    let correlation_id = uuid::Uuid::new_v4().to_string();
    check_admin_auth(&state, &headers)?;

    let address = parse_address(&address)?;
    validate_fields(&fields)?;

    info!(correlation_id = %correlation_id, address = %address, "Metadata update request received");

    let updated = state
        .metadata
        .update(&address, fields)
        .await
        .map_err(metadata_error)?;

    Ok(Json(updated.into()))
}

/// DELETE /api/admin/metadata/{address}
pub async fn delete_metadata(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(address): Path<String>,
) -> Result<StatusCode, ApiError> {
    check_admin_auth(&state, &headers)?;
    let address = parse_address(&address)?;

    state.metadata.delete(&address).await.map_err(metadata_error)?;

    info!(address = %address, "Metadata deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/admin/metadata/{address}/images?filename=front.jpg
///
/// Body is the raw image; `Content-Type` must be an `image/*` type. The
/// public URL is appended to the row's images.
pub async fn upload_image(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(address): Path<String>,
    Query(query): Query<ImageUploadQuery>,
    body: Bytes,
) -> Result<Json<MetadataResponse>, ApiError> {
    check_admin_auth(&state, &headers)?;
    let address = parse_address(&address)?;

    let Some(storage) = state.image_storage.as_ref() else {
        warn!("Image upload requested but object storage is not configured");
        return Err(api_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "Image storage is not configured",
            "STORAGE_DISABLED",
        ));
    };

    if body.is_empty() {
        return Err(bad_request("image body is empty"));
    }

    // Row must exist and have room before anything is uploaded
    let Some(existing) = state
        .metadata
        .find_by_address(&address)
        .await
        .map_err(metadata_error)?
    else {
        return Err(api_error(
            StatusCode::NOT_FOUND,
            format!("Metadata for {} not found", address),
            "NOT_FOUND",
        ));
    };
    if existing.details.images.len() >= MAX_IMAGES {
        warn!(address = %address, "Image limit reached, upload rejected");
        return Err(bad_request(format!("at most {} images are allowed", MAX_IMAGES)));
    }

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let url = storage
        .upload(&address, &query.filename, content_type, body)
        .await
        .map_err(|e| match e {
            StorageError::InvalidFilename(_) | StorageError::UnsupportedContentType(_) => {
                bad_request(e.to_string())
            }
            StorageError::Request(_) | StorageError::Api { .. } => {
                error!(error = %e, "Image upload failed");
                api_error(StatusCode::BAD_GATEWAY, e.to_string(), "STORAGE_ERROR")
            }
        })?;

    let updated = state
        .metadata
        .append_image(&address, url)
        .await
        .map_err(metadata_error)?;

    info!(address = %address, images = updated.details.images.len(), "Image attached to property");
    Ok(Json(updated.into()))
}
