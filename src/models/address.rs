//! Normalized EVM address
//!
//! Every address entering the service (registry records, metadata rows,
//! path parameters, wallet lookups) goes through [`NormalizedAddress::parse`]
//! or `From<Address>`, so joins and cache keys never see mixed case.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error produced when an address string is not a 20-byte hex address
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed address: {0:?}")]
pub struct AddressError(pub String);

/// A 20-byte address held in lowercase `0x` form
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NormalizedAddress(String);

impl NormalizedAddress {
    /// Validate and lowercase an address. Accepts any casing, rejects
    /// anything that is not `0x` followed by 40 hex digits.
    pub fn parse(input: &str) -> Result<Self, AddressError> {
        let trimmed = input.trim();
        let has_prefix = trimmed.starts_with("0x") || trimmed.starts_with("0X");
        if !has_prefix || trimmed.len() != 42 {
            return Err(AddressError(trimmed.to_string()));
        }

        let address = Address::from_str(&trimmed[2..])
            .map_err(|_| AddressError(trimmed.to_string()))?;

        Ok(Self::from(address))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The zero address, used as the creator placeholder for orphan rows
    pub fn zero() -> Self {
        Self::from(Address::ZERO)
    }

    pub fn to_address(&self) -> Address {
        // Validated at construction
        Address::from_str(&self.0).unwrap_or(Address::ZERO)
    }
}

impl From<Address> for NormalizedAddress {
    fn from(address: Address) -> Self {
        Self(format!("{:#x}", address))
    }
}

impl TryFrom<String> for NormalizedAddress {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<NormalizedAddress> for String {
    fn from(address: NormalizedAddress) -> Self {
        address.0
    }
}

impl fmt::Display for NormalizedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
