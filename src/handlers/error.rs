//! Error responses and admin authentication shared by the handlers

use axum::{
    Json,
    http::{StatusCode, header::HeaderMap},
};
use tracing::{error, warn};

use crate::AppState;
use crate::models::error::ErrorResponse;
use crate::services::metadata_store::MetadataError;
use crate::services::property_chain::ChainError;
use crate::services::reconciler::ReconcileError;

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn api_error(status: StatusCode, error: impl Into<String>, code: &str) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: Some(code.to_string()),
            retryable: false,
        }),
    )
}

pub fn bad_request(error: impl Into<String>) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, error, "VALIDATION_ERROR")
}

/// RPC failures surface as a retryable upstream error
pub fn chain_error(e: &ChainError) -> ApiError {
    error!(error = %e, "Chain read failed");
    (
        StatusCode::BAD_GATEWAY,
        Json(ErrorResponse {
            error: format!("Blockchain RPC error: {}", e),
            code: Some("RPC_ERROR".to_string()),
            retryable: true,
        }),
    )
}

pub fn reconcile_error(e: ReconcileError) -> ApiError {
    match e {
        ReconcileError::Chain(e) => chain_error(&e),
        ReconcileError::NotFound(address) => api_error(
            StatusCode::NOT_FOUND,
            format!("Property {} not found", address),
            "NOT_FOUND",
        ),
    }
}

pub fn metadata_error(e: MetadataError) -> ApiError {
    match e {
        MetadataError::AlreadyExists(_) => api_error(StatusCode::CONFLICT, e.to_string(), "ALREADY_EXISTS"),
        MetadataError::NotFound(_) => api_error(StatusCode::NOT_FOUND, e.to_string(), "NOT_FOUND"),
        MetadataError::ImageLimit(_) => bad_request(e.to_string()),
        MetadataError::Database(ref db) => {
            error!(error = %db, "Metadata store error");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string(), "DATABASE_ERROR")
        }
    }
}

/// Check the `x-api-key` header against the configured admin key
pub fn check_admin_auth(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let provided_key = headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if provided_key.is_empty() || provided_key != state.admin_api_key.as_ref() {
        warn!("Invalid or missing API key");
        return Err(api_error(
            StatusCode::UNAUTHORIZED,
            "Invalid or missing API key",
            "UNAUTHORIZED",
        ));
    }

    Ok(())
}
