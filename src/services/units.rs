//! Base-unit conversions
//!
//! Registry values and token balances are 18-decimal integers. Display
//! strings are trimmed decimals ("850000", "85", "0.5").

use alloy::primitives::{
    U256,
    utils::{UnitsError, format_ether, parse_ether},
};

/// 10^18
pub fn one_token() -> U256 {
    U256::from(1_000_000_000_000_000_000u64)
}

/// Render a base-unit amount as a trimmed decimal string
pub fn format_token_amount(amount: U256) -> String {
    trim_decimal(&format_ether(amount))
}

/// Parse a display decimal string back to base units
pub fn parse_token_amount(display: &str) -> Result<U256, UnitsError> {
    parse_ether(display.trim())
}

/// Price of one whole token: total_value * 10^18 / max_tokens, zero when
/// the property has no token cap.
pub fn price_per_token(total_value: U256, max_tokens: U256) -> U256 {
    if max_tokens.is_zero() {
        return U256::ZERO;
    }
    match total_value.checked_mul(one_token()) {
        Some(scaled) => scaled / max_tokens,
        None => (total_value / max_tokens).saturating_mul(one_token()),
    }
}

/// Lossy f64 view of a display string
pub fn display_to_f64(display: &str) -> f64 {
    display.parse::<f64>().unwrap_or(0.0)
}

/// quantity * price computed on the display strings. Advisory only, never
/// used to build a transaction amount.
pub fn display_product(quantity: &str, price: &str) -> f64 {
    display_to_f64(quantity) * display_to_f64(price)
}

fn trim_decimal(formatted: &str) -> String {
    if !formatted.contains('.') {
        return formatted.to_string();
    }
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() || trimmed == "-" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(n: u64) -> U256 {
        U256::from(n) * one_token()
    }

    #[test]
    fn test_format_whole_amounts() {
        assert_eq!(format_token_amount(tokens(850_000)), "850000");
        assert_eq!(format_token_amount(tokens(10)), "10");
        assert_eq!(format_token_amount(U256::ZERO), "0");
    }

    #[test]
    fn test_format_fractional_amounts() {
        assert_eq!(format_token_amount(one_token() / U256::from(2)), "0.5");
        assert_eq!(format_token_amount(U256::from(1)), "0.000000000000000001");
        assert_eq!(
            format_token_amount(tokens(12) + U256::from(340_000_000_000_000_000u64)),
            "12.34"
        );
    }

    #[test]
    fn test_price_per_token() {
        let price = price_per_token(tokens(850_000), tokens(10_000));
        assert_eq!(format_token_amount(price), "85");

        let third = price_per_token(tokens(1), tokens(3));
        assert_eq!(format_token_amount(third), "0.333333333333333333");

        assert_eq!(price_per_token(tokens(850_000), U256::ZERO), U256::ZERO);
    }

    #[test]
    fn test_price_per_token_huge_value_does_not_overflow() {
        let price = price_per_token(U256::MAX, tokens(1));
        assert!(!price.is_zero());
    }

    #[test]
    fn test_round_trip_recovers_base_units() {
        for amount in [
            U256::ZERO,
            U256::from(1),
            tokens(850_000),
            tokens(85) + U256::from(123_456_789u64),
            U256::from(987_654_321_987_654_321_987u128),
        ] {
            let display = format_token_amount(amount);
            assert_eq!(parse_token_amount(&display).unwrap(), amount, "display {}", display);
        }
    }

    #[test]
    fn test_float_view_within_tolerance() {
        let amount = tokens(850_000) + U256::from(250_000_000_000_000_000u64);
        let display = format_token_amount(amount);
        let as_float = display_to_f64(&display);
        assert!((as_float - 850_000.25).abs() < 1e-9);
    }

    #[test]
    fn test_display_product() {
        assert_eq!(display_product("10000", "85"), 850_000.0);
        assert_eq!(display_product("not-a-number", "85"), 0.0);
    }
}
