use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use property_reconciler::{
    AppState,
    config::AppConfig,
    routes::build_router,
    services::{
        holdings::HoldingsService,
        image_storage::ImageStorage,
        metadata_store::{MetadataStore, SeaOrmMetadataStore},
        property_chain::{AlloyPropertyChain, PropertyChain},
        reconciler::PropertyReconciler,
    },
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,property_reconciler=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    // Connect to database
    tracing::info!("Connecting to database...");
    let db = Database::connect(&config.database_url).await?;

    // Run migrations
    tracing::info!("Running migrations...");
    migration::Migrator::up(&db, None).await?;

    tracing::info!(rpc_url = %config.rpc_url, "Connecting to RPC provider...");
    let chain: Arc<dyn PropertyChain> =
        Arc::new(AlloyPropertyChain::connect(&config.rpc_url, &config.registry_address).await?);
    let metadata: Arc<dyn MetadataStore> = Arc::new(SeaOrmMetadataStore::new(db));

    let image_storage = config
        .storage
        .as_ref()
        .map(|s| ImageStorage::new(s.url.clone(), s.service_key.clone(), s.bucket.clone()));
    if image_storage.is_none() {
        tracing::warn!("STORAGE_URL / STORAGE_SERVICE_KEY not set - image uploads disabled");
    }

    let state = AppState {
        reconciler: Arc::new(PropertyReconciler::new(
            chain.clone(),
            metadata.clone(),
            config.chain_batch_size,
        )),
        metadata,
        holdings: HoldingsService::new(chain, config.chain_batch_size, config.holdings_ttl),
        image_storage,
        admin_api_key: Arc::from(config.admin_api_key.as_str()),
    };

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutdown signal received, stopping server");
        })
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
