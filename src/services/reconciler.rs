//! Property Reconciler
//!
//! Left-joins registry records with off-chain metadata on normalized
//! contract address. The chain is authoritative for financial fields
//! (value, supply, active flag); metadata is authoritative for descriptive
//! fields (name fallback, images, description, location). Metadata rows
//! with no registry record are returned as orphans with zeroed financials.
//!
//! [`merge_properties`] is a pure function of the two snapshots, so the
//! order in which they were fetched never changes the result.

use alloy::primitives::U256;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::models::address::NormalizedAddress;
use crate::models::metadata::OffChainMetadata;
use crate::models::property::{EnrichedProperty, OnChainProperty, PropertyType};
use crate::services::metadata_store::MetadataStore;
use crate::services::property_chain::{ChainError, PropertyChain, fetch_all_properties};
use crate::services::units::{display_product, format_token_amount, price_per_token};

/// Name used when neither source has one
pub const UNNAMED_PROPERTY: &str = "Unnamed property";

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error("Property {0} not found")]
    NotFound(NormalizedAddress),
}

/// Result of `list_enriched`
#[derive(Debug, Clone)]
pub struct EnrichedListing {
    pub properties: Vec<EnrichedProperty>,
    /// Set when the metadata store failed and the listing is chain-only
    pub metadata_error: Option<String>,
}

/// Result of `get_enriched_by_address`
#[derive(Debug, Clone)]
pub struct EnrichedLookup {
    pub property: EnrichedProperty,
    pub metadata_error: Option<String>,
}

/// Index metadata by address. When several rows share an address the most
/// recently updated one wins, ties broken by the larger id.
fn index_metadata(metadata: &[OffChainMetadata]) -> HashMap<&NormalizedAddress, &OffChainMetadata> {
    let mut lookup: HashMap<&NormalizedAddress, &OffChainMetadata> = HashMap::new();

    for meta in metadata {
        match lookup.get(&meta.address).copied() {
            Some(existing) if (existing.updated_at, existing.id) >= (meta.updated_at, meta.id) => {
                warn!(address = %meta.address, id = meta.id, kept = existing.id, "Duplicate metadata row ignored");
            }
            Some(existing) => {
                warn!(address = %meta.address, id = existing.id, kept = meta.id, "Duplicate metadata row ignored");
                lookup.insert(&meta.address, meta);
            }
            None => {
                lookup.insert(&meta.address, meta);
            }
        }
    }

    lookup
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Merge one registry record with its metadata (if any)
pub fn enrich_chain_property(
    property: &OnChainProperty,
    metadata: Option<&OffChainMetadata>,
) -> EnrichedProperty {
    let name = non_empty(&property.name)
        .or_else(|| metadata.and_then(|m| m.name.as_deref()).and_then(non_empty))
        .unwrap_or(UNNAMED_PROPERTY)
        .to_string();

    let details = metadata.map(|m| m.details.clone()).unwrap_or_default();
    let price = price_per_token(property.total_value, property.max_tokens);
    let total_supply = format_token_amount(property.total_supply);
    let price_per_token = format_token_amount(price);
    let market_value = display_product(&total_supply, &price_per_token);

    EnrichedProperty {
        address: property.address.clone(),
        property_id: Some(property.id),
        name,
        symbol: property.symbol.clone(),
        description: metadata.and_then(|m| m.description.clone()),
        location: metadata.map(|m| m.location.clone()).unwrap_or_default(),
        chain_location: property.location.clone(),
        images: details.images.clone(),
        documents: details.documents.clone(),
        details,
        property_type: effective_property_type(Some(property), metadata),
        total_value: format_token_amount(property.total_value),
        max_tokens: format_token_amount(property.max_tokens),
        total_supply,
        price_per_token,
        market_value,
        creator: property.creator.clone(),
        created_at: property.created_at,
        is_active: property.is_active,
        has_chain_data: true,
        has_metadata: metadata.is_some(),
    }
}

/// Build a record for metadata with no registry entry
pub fn enrich_orphan(metadata: &OffChainMetadata) -> EnrichedProperty {
    let zero = format_token_amount(U256::ZERO);

    EnrichedProperty {
        address: metadata.address.clone(),
        property_id: None,
        name: metadata
            .name
            .as_deref()
            .and_then(non_empty)
            .unwrap_or(UNNAMED_PROPERTY)
            .to_string(),
        symbol: String::new(),
        description: metadata.description.clone(),
        location: metadata.location.clone(),
        chain_location: String::new(),
        images: metadata.details.images.clone(),
        documents: metadata.details.documents.clone(),
        details: metadata.details.clone(),
        property_type: effective_property_type(None, Some(metadata)),
        total_value: zero.clone(),
        max_tokens: zero.clone(),
        total_supply: zero.clone(),
        price_per_token: zero,
        market_value: 0.0,
        creator: NormalizedAddress::zero(),
        created_at: metadata.created_at.map(|dt| dt.timestamp()).unwrap_or(0),
        is_active: false,
        has_chain_data: false,
        has_metadata: true,
    }
}

/// Left-join the registry snapshot with the metadata snapshot.
///
/// Every registry address appears exactly once, in registry order (first
/// occurrence wins for duplicated addresses). Orphan metadata follows,
/// sorted by address.
pub fn merge_properties(
    on_chain: &[OnChainProperty],
    metadata: &[OffChainMetadata],
) -> Vec<EnrichedProperty> {
    let lookup = index_metadata(metadata);
    let mut seen: HashSet<&NormalizedAddress> = HashSet::with_capacity(on_chain.len());
    let mut merged = Vec::with_capacity(on_chain.len() + lookup.len());

    for property in on_chain {
        if !seen.insert(&property.address) {
            warn!(address = %property.address, id = property.id, "Duplicate registry address skipped");
            continue;
        }
        let meta = lookup.get(&property.address).copied();
        debug!(
            address = %property.address,
            id = property.id,
            has_metadata = meta.is_some(),
            "Merging registry record"
        );
        merged.push(enrich_chain_property(property, meta));
    }

    let mut orphans: Vec<&OffChainMetadata> = lookup
        .iter()
        .filter(|(address, _)| !seen.contains(*address))
        .map(|(_, meta)| *meta)
        .collect();
    orphans.sort_by(|a, b| a.address.cmp(&b.address));

    if !orphans.is_empty() {
        debug!(count = orphans.len(), "Metadata rows without registry record");
    }
    merged.extend(orphans.into_iter().map(enrich_orphan));

    merged
}

/// Reconciles registry and metadata store into enriched properties
pub struct PropertyReconciler {
    chain: Arc<dyn PropertyChain>,
    metadata: Arc<dyn MetadataStore>,
    batch_size: u64,
}

impl PropertyReconciler {
    pub fn new(
        chain: Arc<dyn PropertyChain>,
        metadata: Arc<dyn MetadataStore>,
        batch_size: u64,
    ) -> Self {
        Self {
            chain,
            metadata,
            batch_size,
        }
    }

    /// Full registry snapshot
    pub async fn on_chain_properties(&self) -> Result<Vec<OnChainProperty>, ChainError> {
        fetch_all_properties(self.chain.as_ref(), self.batch_size).await
    }

    /// Every registry property merged with its metadata, followed by orphans
    pub async fn list_enriched(&self) -> Result<EnrichedListing, ReconcileError> {
        let (chain_result, metadata_result) =
            tokio::join!(self.on_chain_properties(), self.metadata.list_all());

        let on_chain = chain_result?;
        let (metadata, metadata_error) = match metadata_result {
            Ok(rows) => (rows, None),
            Err(e) => {
                warn!(error = %e, "Metadata store unavailable, listing chain data only");
                (Vec::new(), Some(e.to_string()))
            }
        };

        let properties = merge_properties(&on_chain, &metadata);

        info!(
            on_chain = on_chain.len(),
            metadata = metadata.len(),
            merged = properties.len(),
            metadata_error = metadata_error.is_some(),
            "Reconciled property listing"
        );

        Ok(EnrichedListing {
            properties,
            metadata_error,
        })
    }

    /// One property by address. Metadata without a registry record is
    /// returned as an orphan; neither source present is `NotFound`.
    pub async fn get_enriched_by_address(
        &self,
        address: &NormalizedAddress,
    ) -> Result<EnrichedLookup, ReconcileError> {
        let (chain_result, metadata_result) = tokio::join!(
            self.on_chain_properties(),
            self.metadata.find_by_address(address)
        );

        let on_chain = chain_result?;
        let (metadata, metadata_error) = match metadata_result {
            Ok(row) => (row, None),
            Err(e) => {
                warn!(address = %address, error = %e, "Metadata lookup failed, using chain data only");
                (None, Some(e.to_string()))
            }
        };

        let chain_record = on_chain.iter().find(|p| &p.address == address);

        let property = match (chain_record, metadata.as_ref()) {
            (Some(record), meta) => enrich_chain_property(record, meta),
            (None, Some(meta)) => {
                debug!(address = %address, "Metadata has no registry record, returning orphan");
                enrich_orphan(meta)
            }
            (None, None) => return Err(ReconcileError::NotFound(address.clone())),
        };

        Ok(EnrichedLookup {
            property,
            metadata_error,
        })
    }
}

/// Effective property type: registry value when chain-backed, otherwise
/// the metadata value, otherwise `Other`.
pub fn effective_property_type(
    chain: Option<&OnChainProperty>,
    metadata: Option<&OffChainMetadata>,
) -> PropertyType {
    chain
        .map(|p| p.property_type)
        .or_else(|| metadata.and_then(|m| m.property_type))
        .unwrap_or_default()
}
