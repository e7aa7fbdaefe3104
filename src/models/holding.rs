//! Per-wallet holdings derived from token balance reads

use serde::{Deserialize, Serialize};

use crate::models::address::NormalizedAddress;

/// One property token held by a wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserHolding {
    pub property_address: NormalizedAddress,
    pub property_id: u64,
    pub name: String,
    pub symbol: String,
    /// Balance in base units (18 decimals) as a decimal string
    pub balance_raw: String,
    /// Balance as a display decimal string
    pub balance: String,
    pub price_per_token: String,
    /// balance * price_per_token, advisory only
    pub estimated_value: f64,
}

/// Response for GET /api/holdings/{wallet}
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldingsResponse {
    pub wallet: NormalizedAddress,
    pub holdings: Vec<UserHolding>,
    pub total_estimated_value: f64,
    /// Whether the result came from the holdings cache
    pub cached: bool,
    /// Some balance reads failed; retry for the full list
    pub partial: bool,
}
