//! Off-chain property metadata
//!
//! Descriptive data kept in the `properties` table. The `details` column is
//! a typed, versioned document instead of a free-form JSON bag.

use chrono::{DateTime, Utc};
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

use crate::models::address::NormalizedAddress;
use crate::models::property::PropertyType;

pub const MAX_NAME_LENGTH: usize = 255;
pub const MAX_DESCRIPTION_LENGTH: usize = 5000;
pub const MAX_IMAGES: usize = 50;
pub const MAX_DOCUMENTS: usize = 50;
pub const MAX_ROOMS: u16 = 1000;

/// Structured location
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyLocation {
    pub city: Option<String>,
    pub country: Option<String>,
    /// Street address
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDocument {
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// Contents of the `details` JSONB column
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct PropertyDetails {
    /// 0 for rows written before versioning
    #[serde(default)]
    pub schema_version: u16,
    /// Ordered image URLs, first one is the cover image
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub documents: Vec<PropertyDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub square_feet: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_built: Option<u16>,
}

impl PropertyDetails {
    pub const CURRENT_VERSION: u16 = 1;

    /// Bring a stored document to the current schema: blank and repeated
    /// image URLs are dropped (first occurrence keeps its position), blank
    /// documents are dropped.
    pub fn upgrade(mut self) -> Self {
        let mut seen = std::collections::HashSet::new();
        self.images = self
            .images
            .into_iter()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty() && seen.insert(url.clone()))
            .collect();
        self.documents.retain(|doc| !doc.url.trim().is_empty());
        self.schema_version = Self::CURRENT_VERSION;
        self
    }
}

/// A metadata row with its address normalized
#[derive(Debug, Clone, PartialEq)]
pub struct OffChainMetadata {
    pub id: i32,
    pub address: NormalizedAddress,
    pub name: Option<String>,
    pub description: Option<String>,
    pub location: PropertyLocation,
    pub property_type: Option<PropertyType>,
    pub details: PropertyDetails,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Editable descriptive fields, shared by create and update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataFields {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub location: PropertyLocation,
    pub property_type: Option<PropertyType>,
    #[serde(default)]
    pub details: PropertyDetails,
}

impl MetadataFields {
    /// Validate admin input
    pub fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.name {
            if name.chars().count() > MAX_NAME_LENGTH {
                return Err(format!("name cannot exceed {} characters", MAX_NAME_LENGTH));
            }
        }
        if let Some(description) = &self.description {
            if description.chars().count() > MAX_DESCRIPTION_LENGTH {
                return Err(format!(
                    "description cannot exceed {} characters",
                    MAX_DESCRIPTION_LENGTH
                ));
            }
        }

        let details = &self.details;
        if details.images.len() > MAX_IMAGES {
            return Err(format!("at most {} images are allowed", MAX_IMAGES));
        }
        if details.documents.len() > MAX_DOCUMENTS {
            return Err(format!("at most {} documents are allowed", MAX_DOCUMENTS));
        }
        if let Some(url) = details.images.iter().find(|url| !is_http_url(url)) {
            return Err(format!("image URL must be http(s): {}", url));
        }
        if let Some(doc) = details.documents.iter().find(|doc| !is_http_url(&doc.url)) {
            return Err(format!("document URL must be http(s): {}", doc.url));
        }
        if details.bedrooms.is_some_and(|n| n > MAX_ROOMS)
            || details.bathrooms.is_some_and(|n| n > MAX_ROOMS)
        {
            return Err(format!("room counts cannot exceed {}", MAX_ROOMS));
        }
        Ok(())
    }
}

fn is_http_url(url: &str) -> bool {
    let url = url.trim();
    url.starts_with("https://") || url.starts_with("http://")
}

/// Body of POST /api/admin/metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMetadataRequest {
    pub contract_address: String,
    #[serde(flatten)]
    pub fields: MetadataFields,
}

/// Metadata row as returned by the admin endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataResponse {
    pub id: i32,
    pub contract_address: NormalizedAddress,
    pub name: Option<String>,
    pub description: Option<String>,
    pub location: PropertyLocation,
    pub property_type: Option<PropertyType>,
    pub details: PropertyDetails,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<OffChainMetadata> for MetadataResponse {
    fn from(meta: OffChainMetadata) -> Self {
        Self {
            id: meta.id,
            contract_address: meta.address,
            name: meta.name,
            description: meta.description,
            location: meta.location,
            property_type: meta.property_type,
            details: meta.details,
            created_at: meta.created_at,
            updated_at: meta.updated_at,
        }
    }
}

/// Query parameters for the image upload endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ImageUploadQuery {
    pub filename: String,
}
