//! Service configuration from environment variables

use std::time::Duration;

use crate::services::holdings::DEFAULT_HOLDINGS_TTL_SECS;
use crate::services::image_storage::DEFAULT_BUCKET;
use crate::services::property_chain::DEFAULT_BATCH_SIZE;

/// Environment variable names
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_RPC_URL: &str = "RPC_URL";
pub const ENV_REGISTRY_ADDRESS: &str = "PROPERTY_REGISTRY_ADDRESS";
pub const ENV_ADMIN_API_KEY: &str = "ADMIN_API_KEY";
pub const ENV_BIND_ADDR: &str = "BIND_ADDR";
pub const ENV_CHAIN_BATCH_SIZE: &str = "CHAIN_BATCH_SIZE";
pub const ENV_HOLDINGS_TTL: &str = "HOLDINGS_CACHE_TTL_SECS";
pub const ENV_STORAGE_URL: &str = "STORAGE_URL";
pub const ENV_STORAGE_SERVICE_KEY: &str = "STORAGE_SERVICE_KEY";
pub const ENV_STORAGE_BUCKET: &str = "STORAGE_BUCKET";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Object storage settings, present only when both URL and key are set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub url: String,
    pub service_key: String,
    pub bucket: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_url: String,
    pub rpc_url: String,
    pub registry_address: String,
    pub admin_api_key: String,
    pub bind_addr: String,
    pub chain_batch_size: u64,
    pub holdings_ttl: Duration,
    pub storage: Option<StorageConfig>,
}

impl AppConfig {
    /// Load from the process environment (after `.env` via dotenvy)
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let chain_batch_size = match get(ENV_CHAIN_BATCH_SIZE) {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(0) => {
                    return Err(ConfigError::Invalid {
                        name: ENV_CHAIN_BATCH_SIZE,
                        reason: "must be at least 1".to_string(),
                    });
                }
                Ok(n) => n,
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        name: ENV_CHAIN_BATCH_SIZE,
                        reason: e.to_string(),
                    });
                }
            },
            None => DEFAULT_BATCH_SIZE,
        };

        let holdings_ttl_secs = match get(ENV_HOLDINGS_TTL) {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
                name: ENV_HOLDINGS_TTL,
                reason: e.to_string(),
            })?,
            None => DEFAULT_HOLDINGS_TTL_SECS,
        };

        let storage = match (get(ENV_STORAGE_URL), get(ENV_STORAGE_SERVICE_KEY)) {
            (Some(url), Some(service_key)) => Some(StorageConfig {
                url,
                service_key,
                bucket: get(ENV_STORAGE_BUCKET).unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
            }),
            _ => None,
        };

        Ok(Self {
            database_url: required(ENV_DATABASE_URL)?,
            rpc_url: required(ENV_RPC_URL)?,
            registry_address: required(ENV_REGISTRY_ADDRESS)?,
            admin_api_key: required(ENV_ADMIN_API_KEY)?,
            bind_addr: get(ENV_BIND_ADDR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            chain_batch_size,
            holdings_ttl: Duration::from_secs(holdings_ttl_secs),
            storage,
        })
    }
}
