#![allow(dead_code)]

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use axum::Router;
use chrono::Utc;
use sea_orm::DbErr;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use property_reconciler::{
    AppState,
    models::{
        address::NormalizedAddress,
        metadata::{MAX_IMAGES, MetadataFields, OffChainMetadata},
        property::{OnChainProperty, PropertyType},
    },
    routes::build_router,
    services::{
        holdings::HoldingsService,
        image_storage::ImageStorage,
        metadata_store::{MetadataError, MetadataStore},
        property_chain::{ChainError, PropertyChain},
        reconciler::PropertyReconciler,
        units::one_token,
    },
};

pub const ADMIN_KEY: &str = "test-admin-key";

pub fn addr(byte: u8) -> NormalizedAddress {
    NormalizedAddress::from(Address::repeat_byte(byte))
}

pub fn tokens(n: u64) -> U256 {
    U256::from(n) * one_token()
}

pub fn chain_property(id: u64, address: NormalizedAddress) -> OnChainProperty {
    OnChainProperty {
        id,
        address,
        name: format!("Property {}", id),
        symbol: format!("PROP{}", id),
        total_value: tokens(850_000),
        max_tokens: tokens(10_000),
        total_supply: tokens(10_000),
        creator: addr(0x01),
        created_at: 1_700_000_000,
        is_active: true,
        property_type: PropertyType::Residential,
        location: "Lisbon".to_string(),
    }
}

/// In-memory registry
#[derive(Default)]
pub struct FakeChain {
    pub properties: Mutex<Vec<OnChainProperty>>,
    /// (token, holder) -> balance
    pub balances: Mutex<HashMap<(NormalizedAddress, NormalizedAddress), U256>>,
    pub fail: AtomicBool,
    /// Tokens whose `balanceOf` read errors
    pub failing_tokens: Mutex<HashSet<NormalizedAddress>>,
    pub range_calls: AtomicUsize,
}

impl FakeChain {
    pub fn with_properties(properties: Vec<OnChainProperty>) -> Self {
        Self {
            properties: Mutex::new(properties),
            ..Default::default()
        }
    }

    pub fn set_balance(&self, token: &NormalizedAddress, holder: &NormalizedAddress, amount: U256) {
        self.balances
            .lock()
            .unwrap()
            .insert((token.clone(), holder.clone()), amount);
    }

    pub fn set_balance_failing(&self, token: &NormalizedAddress, failing: bool) {
        let mut tokens = self.failing_tokens.lock().unwrap();
        if failing {
            tokens.insert(token.clone());
        } else {
            tokens.remove(token);
        }
    }

    fn check(&self) -> Result<(), ChainError> {
        if self.fail.load(Ordering::SeqCst) {
            Err(ChainError::Provider("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PropertyChain for FakeChain {
    async fn property_count(&self) -> Result<u64, ChainError> {
        self.check()?;
        Ok(self.properties.lock().unwrap().len() as u64)
    }

    async fn properties_in_range(&self, start: u64, end: u64) -> Result<Vec<OnChainProperty>, ChainError> {
        self.check()?;
        self.range_calls.fetch_add(1, Ordering::SeqCst);
        let properties = self.properties.lock().unwrap();
        Ok(properties[start as usize..end as usize].to_vec())
    }

    async fn balance_of(
        &self,
        token: &NormalizedAddress,
        holder: &NormalizedAddress,
    ) -> Result<U256, ChainError> {
        self.check()?;
        if self.failing_tokens.lock().unwrap().contains(token) {
            return Err(ChainError::ContractCall(format!("balanceOf on {} reverted", token)));
        }
        Ok(self
            .balances
            .lock()
            .unwrap()
            .get(&(token.clone(), holder.clone()))
            .copied()
            .unwrap_or(U256::ZERO))
    }
}

/// In-memory metadata table
#[derive(Default)]
pub struct FakeMetadataStore {
    pub rows: Mutex<Vec<OffChainMetadata>>,
    pub fail: AtomicBool,
    next_id: AtomicUsize,
}

impl FakeMetadataStore {
    pub fn with_rows(rows: Vec<OffChainMetadata>) -> Self {
        let next_id = rows.iter().map(|r| r.id as usize).max().unwrap_or(0);
        Self {
            rows: Mutex::new(rows),
            fail: AtomicBool::new(false),
            next_id: AtomicUsize::new(next_id),
        }
    }

    fn check(&self) -> Result<(), MetadataError> {
        if self.fail.load(Ordering::SeqCst) {
            Err(MetadataError::Database(DbErr::Custom(
                "metadata store unreachable".to_string(),
            )))
        } else {
            Ok(())
        }
    }
}

pub fn metadata_row(id: i32, address: NormalizedAddress, images: &[&str]) -> OffChainMetadata {
    let mut fields = MetadataFields {
        name: Some(format!("Metadata {}", id)),
        description: Some("Renovated loft".to_string()),
        ..Default::default()
    };
    fields.details.images = images.iter().map(|s| s.to_string()).collect();
    row_from_fields(id, address, fields)
}

fn row_from_fields(id: i32, address: NormalizedAddress, fields: MetadataFields) -> OffChainMetadata {
    OffChainMetadata {
        id,
        address,
        name: fields.name,
        description: fields.description,
        location: fields.location,
        property_type: fields.property_type,
        details: fields.details.upgrade(),
        created_at: Some(Utc::now()),
        updated_at: Some(Utc::now()),
    }
}

#[async_trait]
impl MetadataStore for FakeMetadataStore {
    async fn list_all(&self) -> Result<Vec<OffChainMetadata>, MetadataError> {
        self.check()?;
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn find_by_address(
        &self,
        address: &NormalizedAddress,
    ) -> Result<Option<OffChainMetadata>, MetadataError> {
        self.check()?;
        Ok(self.rows.lock().unwrap().iter().find(|r| &r.address == address).cloned())
    }

    async fn create(
        &self,
        address: &NormalizedAddress,
        fields: MetadataFields,
    ) -> Result<OffChainMetadata, MetadataError> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|r| &r.address == address) {
            return Err(MetadataError::AlreadyExists(address.clone()));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) as i32 + 1;
        let row = row_from_fields(id, address.clone(), fields);
        rows.push(row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        address: &NormalizedAddress,
        fields: MetadataFields,
    ) -> Result<OffChainMetadata, MetadataError> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|r| &r.address == address)
            .ok_or_else(|| MetadataError::NotFound(address.clone()))?;
        *row = row_from_fields(row.id, address.clone(), fields);
        Ok(row.clone())
    }

    async fn delete(&self, address: &NormalizedAddress) -> Result<(), MetadataError> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| &r.address != address);
        if rows.len() == before {
            return Err(MetadataError::NotFound(address.clone()));
        }
        Ok(())
    }

    async fn append_image(
        &self,
        address: &NormalizedAddress,
        url: String,
    ) -> Result<OffChainMetadata, MetadataError> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|r| &r.address == address)
            .ok_or_else(|| MetadataError::NotFound(address.clone()))?;
        if row.details.images.len() >= MAX_IMAGES {
            return Err(MetadataError::ImageLimit(address.clone()));
        }
        row.details.images.push(url);
        Ok(row.clone())
    }
}

pub struct TestApp {
    pub chain: Arc<FakeChain>,
    pub metadata: Arc<FakeMetadataStore>,
    pub state: AppState,
}

impl TestApp {
    pub fn new(chain: FakeChain, metadata: FakeMetadataStore) -> Self {
        let chain = Arc::new(chain);
        let metadata = Arc::new(metadata);

        let state = AppState {
            reconciler: Arc::new(PropertyReconciler::new(chain.clone(), metadata.clone(), 2)),
            metadata: metadata.clone(),
            holdings: HoldingsService::new(chain.clone(), 2, Duration::from_secs(60)),
            image_storage: None,
            admin_api_key: Arc::from(ADMIN_KEY),
        };

        Self { chain, metadata, state }
    }

    /// Storage pointed at an address nothing listens on; only requests
    /// rejected before the upload succeed against it
    pub fn with_unreachable_storage(mut self) -> Self {
        self.state.image_storage = Some(ImageStorage::new(
            "http://127.0.0.1:9/storage/v1".to_string(),
            "service-key".to_string(),
            "property-images".to_string(),
        ));
        self
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }
}
