//! Fixed-point conversions for the chain's native asset.
//!
//! Amounts are entered and displayed as decimals and travel on chain as base
//! units, one display unit being 10^18 base units.

use chrono::{DateTime, TimeZone};
use ethers::types::U256;
use ethers::utils::{format_ether, parse_ether};
use std::fmt::Display;

use crate::core::errors::BridgeError;

/// Decimal places of the native asset.
pub const DECIMALS: u32 = 18;

/// Parses a decimal amount string ("0.01") into base units.
/// Empty and negative amounts are rejected.
pub fn parse_amount(amount: &str) -> Result<U256, BridgeError> {
    let trimmed = amount.trim();
    if trimmed.is_empty() {
        return Err(BridgeError::InvalidInput("Amount is empty".to_string()));
    }
    if trimmed.starts_with('-') {
        return Err(BridgeError::InvalidInput(format!("Amount '{}' is negative", amount)));
    }
    parse_ether(trimmed)
        .map_err(|e| BridgeError::InvalidInput(format!("Invalid amount '{}': {}", amount, e)))
}

/// Converts base units back to a display decimal.
pub fn to_display_amount(base_units: U256) -> f64 {
    format_ether(base_units).parse::<f64>().unwrap_or(f64::NAN)
}

/// Renders a value as a JSON-RPC hex quantity.
pub fn to_hex_quantity(value: U256) -> String {
    format!("0x{:x}", value)
}

/// Narrows an on-chain counter to `u64`.
pub fn count_to_u64(count: U256) -> Result<u64, BridgeError> {
    if count > U256::from(u64::MAX) {
        return Err(BridgeError::InvalidInput(format!("Counter {} does not fit in u64", count)));
    }
    Ok(count.as_u64())
}

/// Formats an epoch-seconds timestamp as a short `M/D/YYYY` date in `tz`.
/// Out-of-range values render as "Invalid Date".
pub fn format_timestamp<Tz>(epoch_seconds: U256, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if epoch_seconds > U256::from(i64::MAX as u64) {
        return "Invalid Date".to_string();
    }
    match DateTime::from_timestamp(epoch_seconds.as_u64() as i64, 0) {
        Some(utc) => utc.with_timezone(tz).format("%-m/%-d/%Y").to_string(),
        None => "Invalid Date".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1").unwrap(), U256::exp10(18));
        assert_eq!(parse_amount("0.01").unwrap(), U256::exp10(16));
        assert_eq!(parse_amount(" 2.5 ").unwrap(), U256::from(25u64) * U256::exp10(17));
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        assert!(matches!(parse_amount(""), Err(BridgeError::InvalidInput(_))));
        assert!(matches!(parse_amount("   "), Err(BridgeError::InvalidInput(_))));
        assert!(matches!(parse_amount("abc"), Err(BridgeError::InvalidInput(_))));
    }

    #[test]
    fn test_parse_amount_rejects_negative() {
        assert!(matches!(parse_amount("-1"), Err(BridgeError::InvalidInput(_))));
        assert!(matches!(parse_amount(" -0.5"), Err(BridgeError::InvalidInput(_))));
    }

    #[test]
    fn test_display_amount() {
        assert_eq!(to_display_amount(U256::exp10(18)), 1.0);
        assert_eq!(to_display_amount(U256::exp10(15)), 0.001);
        assert_eq!(to_display_amount(U256::zero()), 0.0);
    }

    #[test]
    fn test_hex_quantity() {
        assert_eq!(to_hex_quantity(U256::from(21000u64)), "0x5208");
        assert_eq!(to_hex_quantity(U256::exp10(16)), "0x2386f26fc10000");
    }

    #[test]
    fn test_count_to_u64() {
        assert_eq!(count_to_u64(U256::from(5u64)).unwrap(), 5);
        assert!(count_to_u64(U256::MAX).is_err());
    }

    #[test]
    fn test_format_timestamp_utc() {
        // 2023-11-14T22:13:20Z
        assert_eq!(format_timestamp(U256::from(1_700_000_000u64), &Utc), "11/14/2023");
        assert_eq!(format_timestamp(U256::zero(), &Utc), "1/1/1970");
        assert_eq!(format_timestamp(U256::MAX, &Utc), "Invalid Date");
    }
}
