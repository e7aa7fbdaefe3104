// src/lib.rs

use std::sync::Arc;

use services::{
    holdings::HoldingsService, image_storage::ImageStorage, metadata_store::MetadataStore,
    reconciler::PropertyReconciler,
};

#[derive(Clone)]
pub struct AppState {
    pub reconciler: Arc<PropertyReconciler>,
    pub metadata: Arc<dyn MetadataStore>,
    pub holdings: HoldingsService,
    /// None when object storage is not configured
    pub image_storage: Option<ImageStorage>,
    pub admin_api_key: Arc<str>,
}

pub mod config;
pub mod routes;

pub mod entities {
    pub mod prelude;
    pub mod properties;
}

pub mod models {
    pub mod address;
    pub mod error;
    pub mod holding;
    pub mod metadata;
    pub mod property;
}

pub mod services {
    pub mod holdings;
    pub mod image_storage;
    pub mod metadata_store;
    pub mod property_chain;
    pub mod reconciler;
    pub mod units;
}

pub mod handlers {
    pub mod error;
    pub mod holdings;
    pub mod metadata;
    pub mod property;
}
