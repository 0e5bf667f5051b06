//! # Utility Functions
//!
//! Address derivation, fixed-point unit conversion and timestamp helpers.

use crate::{
    error::Result,
    types::{Address, Amount},
    DuelloError, DECIMALS, ONE_NATIVE,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Derive a child account address from its creator and a creation counter.
///
/// First 20 bytes of `sha256(creator || nonce_be)`.
pub fn derive_address(creator: &Address, nonce: u64) -> Address {
    let mut hasher = Sha256::new();
    hasher.update(creator.as_bytes());
    hasher.update(nonce.to_be_bytes());
    let hash = hasher.finalize();

    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&hash[..20]);
    Address::new(bytes)
}

/// Derive a well-known account address from a label, e.g. `"oracle"`.
pub fn labeled_address(label: &str) -> Address {
    let hash = Sha256::digest(label.as_bytes());
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&hash[..20]);
    Address::new(bytes)
}

/// Hash a message using SHA256
pub fn sha256_hash(message: &str) -> String {
    hex::encode(Sha256::digest(message.as_bytes()))
}

/// Parse a decimal string like `"1.5"` into 18-decimal base units.
pub fn parse_units(value: &str) -> Result<Amount> {
    let value = value.trim();
    let invalid = || DuelloError::InvalidAmount(value.to_string());

    let (whole, frac) = match value.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (value, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid());
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    if frac.len() > DECIMALS as usize {
        return Err(DuelloError::InvalidAmount(format!(
            "{value}: more than {DECIMALS} decimal places"
        )));
    }

    let whole: Amount = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid())?
    };
    let frac_units: Amount = if frac.is_empty() {
        0
    } else {
        let padded = format!("{frac:0<width$}", width = DECIMALS as usize);
        padded.parse().map_err(|_| invalid())?
    };

    whole
        .checked_mul(ONE_NATIVE)
        .and_then(|w| w.checked_add(frac_units))
        .ok_or(DuelloError::Overflow)
}

/// Format 18-decimal base units as a decimal string, trimming trailing zeros.
pub fn format_units(amount: Amount) -> String {
    let whole = amount / ONE_NATIVE;
    let frac = amount % ONE_NATIVE;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{frac:0>width$}", width = DECIMALS as usize);
    format!("{whole}.{}", frac.trim_end_matches('0'))
}

/// A price feed reading: USD per native unit with 18 decimals, and the time
/// it was last updated.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PriceReading {
    pub value: Amount,
    pub timestamp: u64,
}

impl PriceReading {
    pub fn new(value: Amount, timestamp: u64) -> Self {
        Self { value, timestamp }
    }

    /// Whether the reading is older than `max_age` seconds at `now`.
    pub fn is_stale(&self, now: u64, max_age: u64) -> bool {
        now.saturating_sub(self.timestamp) > max_age
    }
}

/// Convert a USD amount (18 decimals) into native units at `price`.
///
/// Floors the result. Used for display and input conversion only; settlement
/// never depends on a price.
pub fn usd_to_native(usd: Amount, price: &PriceReading) -> Result<Amount> {
    if price.value == 0 {
        return Err(DuelloError::InvalidAmount("price is zero".to_string()));
    }
    usd.checked_mul(ONE_NATIVE)
        .map(|scaled| scaled / price.value)
        .ok_or(DuelloError::Overflow)
}

/// Format timestamp as human-readable string
pub fn format_timestamp(timestamp: u64) -> String {
    use chrono::DateTime;
    let dt = DateTime::from_timestamp(timestamp as i64, 0).unwrap_or_default();
    dt.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Parse timestamp from string
pub fn parse_timestamp(timestamp_str: &str) -> Result<u64> {
    timestamp_str
        .trim()
        .parse::<u64>()
        .map_err(|_| DuelloError::InvalidAmount(format!("Invalid timestamp: {timestamp_str}")))
}

/// Current unix time in seconds.
pub fn unix_now() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}
