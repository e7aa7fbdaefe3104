//! SeaORM Entity for off-chain property metadata
//!
//! One row per property token contract, joined to the registry by
//! lowercased `contract_address`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::metadata::PropertyDetails;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "properties")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Token contract address (0x format, 42 chars, lowercased on write)
    pub contract_address: String,
    pub name: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub street_address: Option<String>,
    /// Same discriminants as the registry's property type
    pub property_type: Option<i16>,
    /// Images, documents and typed details
    #[sea_orm(column_type = "JsonBinary")]
    pub details: PropertyDetails,
    pub created_at: Option<DateTimeWithTimeZone>,
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
