//! Wallet holdings
//!
//! Reads `balanceOf(wallet)` on every registry property token and keeps the
//! non-zero ones. Results are cached per wallet with a short TTL; the cache
//! is a convenience only and is overwritten on refresh. A result with any
//! failed balance read is returned as partial and never cached.

use futures_util::future::join_all;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::models::address::NormalizedAddress;
use crate::models::holding::UserHolding;
use crate::models::property::OnChainProperty;
use crate::services::property_chain::{ChainError, PropertyChain, fetch_all_properties};
use crate::services::units::{display_product, format_token_amount, price_per_token};

/// Default holdings cache TTL in seconds
pub const DEFAULT_HOLDINGS_TTL_SECS: u64 = 30;

/// Holdings for one wallet plus whether they came from cache
#[derive(Debug, Clone)]
pub struct HoldingsSnapshot {
    pub wallet: NormalizedAddress,
    pub holdings: Arc<Vec<UserHolding>>,
    pub cached: bool,
    /// Some balance reads failed and their properties are missing
    pub partial: bool,
}

impl HoldingsSnapshot {
    pub fn total_estimated_value(&self) -> f64 {
        self.holdings.iter().map(|h| h.estimated_value).sum()
    }
}

#[derive(Clone)]
pub struct HoldingsService {
    chain: Arc<dyn PropertyChain>,
    batch_size: u64,
    cache: Cache<NormalizedAddress, Arc<Vec<UserHolding>>>,
}

impl HoldingsService {
    pub fn new(chain: Arc<dyn PropertyChain>, batch_size: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(ttl)
            .build();

        Self {
            chain,
            batch_size,
            cache,
        }
    }

    /// Holdings for a wallet, served from cache when fresh
    pub async fn holdings_for(
        &self,
        wallet: &NormalizedAddress,
    ) -> Result<HoldingsSnapshot, ChainError> {
        if let Some(cached) = self.cache.get(wallet).await {
            debug!(wallet = %wallet, "Holdings cache hit");
            return Ok(HoldingsSnapshot {
                wallet: wallet.clone(),
                holdings: cached,
                cached: true,
                partial: false,
            });
        }

        let (holdings, failed) = self.load(wallet).await?;
        let holdings = Arc::new(holdings);
        if failed == 0 {
            self.cache.insert(wallet.clone(), holdings.clone()).await;
        } else {
            warn!(wallet = %wallet, failed, "Partial holdings not cached");
        }

        Ok(HoldingsSnapshot {
            wallet: wallet.clone(),
            holdings,
            cached: false,
            partial: failed > 0,
        })
    }

    /// Drop the cached entry and read balances again
    pub async fn refresh_holdings(
        &self,
        wallet: &NormalizedAddress,
    ) -> Result<HoldingsSnapshot, ChainError> {
        self.cache.invalidate(wallet).await;
        self.holdings_for(wallet).await
    }

    /// Non-zero holdings plus the number of balance reads that failed
    async fn load(
        &self,
        wallet: &NormalizedAddress,
    ) -> Result<(Vec<UserHolding>, usize), ChainError> {
        let properties = fetch_all_properties(self.chain.as_ref(), self.batch_size).await?;

        let balances = join_all(
            properties
                .iter()
                .map(|property| self.chain.balance_of(&property.address, wallet)),
        )
        .await;

        let mut holdings = Vec::new();
        let mut failed = 0;
        for (property, balance) in properties.iter().zip(balances) {
            match balance {
                Ok(balance) if !balance.is_zero() => {
                    holdings.push(to_holding(property, balance));
                }
                Ok(_) => {}
                Err(e) => {
                    failed += 1;
                    warn!(
                        wallet = %wallet,
                        token = %property.address,
                        error = %e,
                        "Failed to read balance, skipping property"
                    );
                }
            }
        }

        info!(
            wallet = %wallet,
            properties = properties.len(),
            holdings = holdings.len(),
            failed,
            "Loaded wallet holdings"
        );

        Ok((holdings, failed))
    }
}

fn to_holding(property: &OnChainProperty, balance: alloy::primitives::U256) -> UserHolding {
    let display_balance = format_token_amount(balance);
    let price = format_token_amount(price_per_token(property.total_value, property.max_tokens));

    UserHolding {
        property_address: property.address.clone(),
        property_id: property.id,
        name: property.name.clone(),
        symbol: property.symbol.clone(),
        balance_raw: balance.to_string(),
        estimated_value: display_product(&display_balance, &price),
        balance: display_balance,
        price_per_token: price,
    }
}
