//! Off-chain metadata store
//!
//! [`MetadataStore`] is the seam the reconciler and admin handlers depend on;
//! [`SeaOrmMetadataStore`] backs it with the Postgres `properties` table.
//! Addresses are normalized on the way in and on the way out, so rows
//! written with mixed-case addresses before normalization still join.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, Set,
    SqlErr,
    sea_query::{Expr, Func},
};
use tracing::{debug, info, warn};

use crate::entities::{prelude::Properties, properties};
use crate::models::address::NormalizedAddress;
use crate::models::metadata::{MAX_IMAGES, MetadataFields, OffChainMetadata, PropertyLocation};
use crate::models::property::PropertyType;

#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    #[error("Metadata for {0} already exists")]
    AlreadyExists(NormalizedAddress),
    #[error("Metadata for {0} not found")]
    NotFound(NormalizedAddress),
    #[error("Property {0} already has the maximum number of images")]
    ImageLimit(NormalizedAddress),
}

#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Every row with a parseable address
    async fn list_all(&self) -> Result<Vec<OffChainMetadata>, MetadataError>;

    /// Most recently updated row for an address
    async fn find_by_address(
        &self,
        address: &NormalizedAddress,
    ) -> Result<Option<OffChainMetadata>, MetadataError>;

    async fn create(
        &self,
        address: &NormalizedAddress,
        fields: MetadataFields,
    ) -> Result<OffChainMetadata, MetadataError>;

    /// Replace the descriptive fields of an existing row
    async fn update(
        &self,
        address: &NormalizedAddress,
        fields: MetadataFields,
    ) -> Result<OffChainMetadata, MetadataError>;

    async fn delete(&self, address: &NormalizedAddress) -> Result<(), MetadataError>;

    /// Append an image URL to the row's ordered image list
    async fn append_image(
        &self,
        address: &NormalizedAddress,
        url: String,
    ) -> Result<OffChainMetadata, MetadataError>;
}

/// Convert a stored row, normalizing its address. Rows with unparseable
/// addresses yield None.
pub fn metadata_from_model(model: properties::Model) -> Option<OffChainMetadata> {
    let address = match NormalizedAddress::parse(&model.contract_address) {
        Ok(address) => address,
        Err(e) => {
            warn!(id = model.id, error = %e, "Skipping metadata row with malformed address");
            return None;
        }
    };

    Some(OffChainMetadata {
        id: model.id,
        address,
        name: model.name,
        description: model.description,
        location: PropertyLocation {
            city: model.city,
            country: model.country,
            address: model.street_address,
        },
        property_type: model
            .property_type
            .map(|value| PropertyType::from_discriminant(value as i64)),
        details: model.details.upgrade(),
        created_at: model.created_at.map(|dt| dt.with_timezone(&Utc)),
        updated_at: model.updated_at.map(|dt| dt.with_timezone(&Utc)),
    })
}

/// Postgres-backed metadata store
pub struct SeaOrmMetadataStore {
    db: DatabaseConnection,
}

impl SeaOrmMetadataStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn address_matches(address: &NormalizedAddress) -> sea_orm::sea_query::SimpleExpr {
        Expr::expr(Func::lower(Expr::col(properties::Column::ContractAddress)))
            .eq(address.as_str())
    }

    async fn find_model(
        &self,
        address: &NormalizedAddress,
    ) -> Result<Option<properties::Model>, DbErr> {
        Properties::find()
            .filter(Self::address_matches(address))
            .order_by_desc(properties::Column::UpdatedAt)
            .order_by_desc(properties::Column::Id)
            .one(&self.db)
            .await
    }
}

fn apply_fields(active: &mut properties::ActiveModel, fields: MetadataFields) {
    active.name = Set(fields.name);
    active.description = Set(fields.description);
    active.city = Set(fields.location.city);
    active.country = Set(fields.location.country);
    active.street_address = Set(fields.location.address);
    active.property_type = Set(fields.property_type.map(PropertyType::discriminant));
    active.details = Set(fields.details.upgrade());
}

/// Unique violations from a concurrent create surface as a conflict
fn insert_error(address: &NormalizedAddress, e: DbErr) -> MetadataError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => MetadataError::AlreadyExists(address.clone()),
        _ => MetadataError::Database(e),
    }
}

fn into_metadata(model: properties::Model) -> Result<OffChainMetadata, MetadataError> {
    let address = model.contract_address.clone();
    metadata_from_model(model).ok_or_else(|| {
        MetadataError::Database(DbErr::Custom(format!("stored address is malformed: {}", address)))
    })
}

#[async_trait]
impl MetadataStore for SeaOrmMetadataStore {
    async fn list_all(&self) -> Result<Vec<OffChainMetadata>, MetadataError> {
        let rows = Properties::find()
            .order_by_asc(properties::Column::Id)
            .all(&self.db)
            .await?;

        let total = rows.len();
        let metadata: Vec<OffChainMetadata> =
            rows.into_iter().filter_map(metadata_from_model).collect();

        debug!(rows = total, usable = metadata.len(), "Loaded property metadata");
        Ok(metadata)
    }

    async fn find_by_address(
        &self,
        address: &NormalizedAddress,
    ) -> Result<Option<OffChainMetadata>, MetadataError> {
        Ok(self.find_model(address).await?.and_then(metadata_from_model))
    }

    async fn create(
        &self,
        address: &NormalizedAddress,
        fields: MetadataFields,
    ) -> Result<OffChainMetadata, MetadataError> {
        if self.find_model(address).await?.is_some() {
            return Err(MetadataError::AlreadyExists(address.clone()));
        }

        let now = Utc::now();
        let mut active = properties::ActiveModel {
            contract_address: Set(address.to_string()),
            created_at: Set(Some(now.into())),
            updated_at: Set(Some(now.into())),
            ..Default::default()
        };
        apply_fields(&mut active, fields);

        let model = active
            .insert(&self.db)
            .await
            .map_err(|e| insert_error(address, e))?;
        info!(address = %address, id = model.id, "Created property metadata");
        into_metadata(model)
    }

    async fn update(
        &self,
        address: &NormalizedAddress,
        fields: MetadataFields,
    ) -> Result<OffChainMetadata, MetadataError> {
        let model = self
            .find_model(address)
            .await?
            .ok_or_else(|| MetadataError::NotFound(address.clone()))?;

        let mut active: properties::ActiveModel = model.into();
        // Rewrite legacy mixed-case keys on touch
        active.contract_address = Set(address.to_string());
        apply_fields(&mut active, fields);
        active.updated_at = Set(Some(Utc::now().into()));

        let model = active.update(&self.db).await?;
        info!(address = %address, id = model.id, "Updated property metadata");
        into_metadata(model)
    }

    async fn delete(&self, address: &NormalizedAddress) -> Result<(), MetadataError> {
        let result = Properties::delete_many()
            .filter(Self::address_matches(address))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(MetadataError::NotFound(address.clone()));
        }

        info!(address = %address, rows = result.rows_affected, "Deleted property metadata");
        Ok(())
    }

    async fn append_image(
        &self,
        address: &NormalizedAddress,
        url: String,
    ) -> Result<OffChainMetadata, MetadataError> {
        let model = self
            .find_model(address)
            .await?
            .ok_or_else(|| MetadataError::NotFound(address.clone()))?;

        let mut details = model.details.clone().upgrade();
        if details.images.len() >= MAX_IMAGES {
            return Err(MetadataError::ImageLimit(address.clone()));
        }
        details.images.push(url);

        let mut active: properties::ActiveModel = model.into();
        active.details = Set(details.upgrade());
        active.updated_at = Set(Some(Utc::now().into()));

        let model = active.update(&self.db).await?;
        into_metadata(model)
    }
}
