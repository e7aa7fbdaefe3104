//! Property view models
//!
//! `OnChainProperty` mirrors a registry record, `EnrichedProperty` is the
//! merged view served by `GET /api/properties`.

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};

use crate::models::address::NormalizedAddress;
use crate::models::metadata::{PropertyDetails, PropertyDocument, PropertyLocation};

/// Property category, stored on chain as a `uint8`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    Residential,
    Commercial,
    Industrial,
    Land,
    MixedUse,
    #[default]
    Other,
}

impl PropertyType {
    pub fn from_discriminant(value: i64) -> Self {
        match value {
            0 => PropertyType::Residential,
            1 => PropertyType::Commercial,
            2 => PropertyType::Industrial,
            3 => PropertyType::Land,
            4 => PropertyType::MixedUse,
            _ => PropertyType::Other,
        }
    }

    pub fn discriminant(self) -> i16 {
        match self {
            PropertyType::Residential => 0,
            PropertyType::Commercial => 1,
            PropertyType::Industrial => 2,
            PropertyType::Land => 3,
            PropertyType::MixedUse => 4,
            PropertyType::Other => 255,
        }
    }
}

/// Property record as read from the registry contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnChainProperty {
    pub id: u64,
    /// Property token contract address
    pub address: NormalizedAddress,
    pub name: String,
    pub symbol: String,
    /// Total property value, 18 decimals
    pub total_value: U256,
    /// Maximum mintable token supply, 18 decimals
    pub max_tokens: U256,
    /// Currently minted supply, 18 decimals
    pub total_supply: U256,
    pub creator: NormalizedAddress,
    /// Unix seconds
    pub created_at: i64,
    pub is_active: bool,
    pub property_type: PropertyType,
    /// Free-text location as written on chain
    pub location: String,
}

/// Merged on-chain + off-chain view of a property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedProperty {
    pub address: NormalizedAddress,
    /// Registry id, None for orphan metadata
    pub property_id: Option<u64>,
    pub name: String,
    pub symbol: String,
    pub description: Option<String>,
    pub location: PropertyLocation,
    /// Location string from the registry (empty for orphans)
    pub chain_location: String,
    pub images: Vec<String>,
    pub documents: Vec<PropertyDocument>,
    pub details: PropertyDetails,
    pub property_type: PropertyType,
    /// Display decimal strings
    pub total_value: String,
    pub max_tokens: String,
    pub total_supply: String,
    pub price_per_token: String,
    /// total_supply * price_per_token, advisory only
    pub market_value: f64,
    pub creator: NormalizedAddress,
    pub created_at: i64,
    pub is_active: bool,
    pub has_chain_data: bool,
    pub has_metadata: bool,
}

/// Query parameters for GET /api/properties
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PropertyListQuery {
    /// Maximum number of results (default: 50, max: 100)
    pub limit: Option<i32>,
    /// Offset for pagination (default: 0)
    pub offset: Option<i32>,
    /// Only properties whose on-chain active flag is set
    pub active: Option<bool>,
    /// Drop orphan metadata rows from the listing
    pub chain_only: Option<bool>,
    pub property_type: Option<PropertyType>,
}

impl PropertyListQuery {
    pub const DEFAULT_LIMIT: i32 = 50;
    pub const MAX_LIMIT: i32 = 100;

    /// Validate query parameters
    pub fn validate(&self) -> Result<(), String> {
        if let Some(limit) = self.limit {
            if limit < 1 {
                return Err("limit must be at least 1".to_string());
            }
            if limit > Self::MAX_LIMIT {
                return Err(format!("limit cannot exceed {}", Self::MAX_LIMIT));
            }
        }
        if let Some(offset) = self.offset {
            if offset < 0 {
                return Err("offset cannot be negative".to_string());
            }
        }
        Ok(())
    }

    pub fn matches(&self, property: &EnrichedProperty) -> bool {
        if self.active == Some(true) && !property.is_active {
            return false;
        }
        if self.chain_only == Some(true) && !property.has_chain_data {
            return false;
        }
        if let Some(kind) = self.property_type {
            if property.property_type != kind {
                return false;
            }
        }
        true
    }
}

/// Response for GET /api/properties
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyListResponse {
    pub properties: Vec<EnrichedProperty>,
    /// Count of properties matching filters (for pagination)
    pub total: i64,
    pub limit: i32,
    pub offset: i32,
    /// Sum of market_value across matching properties
    pub total_market_value: f64,
    /// Set when the metadata store could not be read; listing is chain-only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_error: Option<String>,
}

/// Response for GET /api/properties/{address}
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyDetailResponse {
    pub property: EnrichedProperty,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_error: Option<String>,
}
