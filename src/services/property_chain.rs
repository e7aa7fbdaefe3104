//! Property registry reads
//!
//! Reads property records from the registry contract in index-range batches
//! and token balances from each property's ERC-20 contract. Read-only: this
//! module never signs or sends a transaction.

use alloy::{
    primitives::{Address, U256},
    providers::{Provider, ProviderBuilder, RootProvider},
    sol,
    transports::http::{Client, Http},
};
use async_trait::async_trait;
use futures_util::future::join_all;
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::models::address::NormalizedAddress;
use crate::models::property::{OnChainProperty, PropertyType};

// Registry contract (read surface only)
sol! {
    #[sol(rpc)]
    interface IPropertyRegistry {
        struct PropertyInfo {
            uint256 id;
            address tokenAddress;
            string name;
            string symbol;
            uint256 totalValue;
            uint256 maxTokens;
            address creator;
            uint256 createdAt;
            bool isActive;
            uint8 propertyType;
            string location;
        }

        function getPropertyCount() external view returns (uint256);
        function getPropertiesInRange(uint256 start, uint256 end) external view returns (PropertyInfo[] memory);
    }
}

// Property token contract
sol! {
    #[sol(rpc)]
    interface IPropertyToken {
        function totalSupply() external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
    }
}

/// Default number of registry records fetched per call
pub const DEFAULT_BATCH_SIZE: u64 = 50;

#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("Provider error: {0}")]
    Provider(String),
    #[error("Contract call error: {0}")]
    ContractCall(String),
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

#[async_trait]
pub trait PropertyChain: Send + Sync {
    /// Number of properties in the registry
    async fn property_count(&self) -> Result<u64, ChainError>;

    /// Registry records with index in `[start, end)`
    async fn properties_in_range(
        &self,
        start: u64,
        end: u64,
    ) -> Result<Vec<OnChainProperty>, ChainError>;

    /// Token balance of `holder` on the property token at `token`
    async fn balance_of(
        &self,
        token: &NormalizedAddress,
        holder: &NormalizedAddress,
    ) -> Result<U256, ChainError>;
}

/// Fetch the whole registry in batches of `batch_size`
pub async fn fetch_all_properties(
    chain: &dyn PropertyChain,
    batch_size: u64,
) -> Result<Vec<OnChainProperty>, ChainError> {
    let batch_size = batch_size.max(1);
    let count = chain.property_count().await?;
    let mut properties = Vec::new();

    let mut start = 0;
    while start < count {
        let end = start.saturating_add(batch_size).min(count);
        let batch = chain.properties_in_range(start, end).await?;
        debug!(start = start, end = end, fetched = batch.len(), "Fetched registry batch");
        properties.extend(batch);
        start = end;
    }

    Ok(properties)
}

fn u256_to_u64(value: U256) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

fn into_on_chain(info: IPropertyRegistry::PropertyInfo, total_supply: U256) -> OnChainProperty {
    OnChainProperty {
        id: u256_to_u64(info.id),
        address: NormalizedAddress::from(info.tokenAddress),
        name: info.name,
        symbol: info.symbol,
        total_value: info.totalValue,
        max_tokens: info.maxTokens,
        total_supply,
        creator: NormalizedAddress::from(info.creator),
        created_at: i64::try_from(u256_to_u64(info.createdAt)).unwrap_or(i64::MAX),
        is_active: info.isActive,
        property_type: PropertyType::from_discriminant(info.propertyType as i64),
        location: info.location,
    }
}

/// Registry reader over an HTTP JSON-RPC provider
pub struct AlloyPropertyChain {
    provider: RootProvider<Http<Client>>,
    registry_address: Address,
}

impl AlloyPropertyChain {
    /// Connect to the RPC endpoint and verify it answers
    pub async fn connect(rpc_url: &str, registry_address: &str) -> Result<Self, ChainError> {
        let provider = ProviderBuilder::new().on_http(
            rpc_url
                .parse()
                .map_err(|e| ChainError::InvalidConfig(format!("Invalid RPC URL: {}", e)))?,
        );

        let registry_address = Address::from_str(registry_address).map_err(|e| {
            ChainError::InvalidConfig(format!("Invalid registry address: {}", e))
        })?;

        let chain_id = provider
            .get_chain_id()
            .await
            .map_err(|e| ChainError::Provider(format!("RPC connection failed: {}", e)))?;

        info!(chain_id = chain_id, registry = %registry_address, "Connected to property registry");

        Ok(Self {
            provider,
            registry_address,
        })
    }

    /// Minted supply of a property token. Falls back to the registry's
    /// max token count when the token cannot be read.
    async fn read_total_supply(&self, info: &IPropertyRegistry::PropertyInfo) -> U256 {
        let token = IPropertyToken::new(info.tokenAddress, &self.provider);
        match token.totalSupply().call().await {
            Ok(r) => r._0,
            Err(e) => {
                warn!(
                    token = %info.tokenAddress,
                    error = %e,
                    "Failed to read token totalSupply, using maxTokens"
                );
                info.maxTokens
            }
        }
    }
}

#[async_trait]
impl PropertyChain for AlloyPropertyChain {
    async fn property_count(&self) -> Result<u64, ChainError> {
        let registry = IPropertyRegistry::new(self.registry_address, &self.provider);
        let count = registry
            .getPropertyCount()
            .call()
            .await
            .map_err(|e| ChainError::ContractCall(format!("getPropertyCount failed: {}", e)))?
            ._0;

        Ok(u256_to_u64(count))
    }

    async fn properties_in_range(
        &self,
        start: u64,
        end: u64,
    ) -> Result<Vec<OnChainProperty>, ChainError> {
        let registry = IPropertyRegistry::new(self.registry_address, &self.provider);
        let infos = registry
            .getPropertiesInRange(U256::from(start), U256::from(end))
            .call()
            .await
            .map_err(|e| {
                ChainError::ContractCall(format!(
                    "getPropertiesInRange({}, {}) failed: {}",
                    start, end, e
                ))
            })?
            ._0;

        let supplies = join_all(infos.iter().map(|info| self.read_total_supply(info))).await;

        Ok(infos
            .into_iter()
            .zip(supplies)
            .map(|(info, supply)| into_on_chain(info, supply))
            .collect())
    }

    async fn balance_of(
        &self,
        token: &NormalizedAddress,
        holder: &NormalizedAddress,
    ) -> Result<U256, ChainError> {
        let contract = IPropertyToken::new(token.to_address(), &self.provider);
        contract
            .balanceOf(holder.to_address())
            .call()
            .await
            .map(|r| r._0)
            .map_err(|e| ChainError::ContractCall(format!("balanceOf on {} failed: {}", token, e)))
    }
}
