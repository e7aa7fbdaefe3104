use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::AppState;
use crate::handlers::{holdings, metadata, property};

async fn health() -> &'static str {
    "Hello from Property Reconciler!"
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/api/properties", get(property::get_property_list))
        .route("/api/properties/{address}", get(property::get_property))
        .route("/api/holdings/{wallet}", get(holdings::get_holdings))
        .route("/api/holdings/{wallet}/refresh", post(holdings::refresh_holdings))
        .route("/api/admin/metadata", post(metadata::create_metadata))
        .route(
            "/api/admin/metadata/{address}",
            put(metadata::update_metadata).delete(metadata::delete_metadata),
        )
        .route("/api/admin/metadata/{address}/images", post(metadata::upload_image))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
