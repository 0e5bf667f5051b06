//! # Shared Types
//!
//! Addresses, assets, sides and the per-call context every mutator receives.

use crate::{error::Result, DuelloError};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Token amounts, in the asset's smallest unit (wei for the native asset).
pub type Amount = u128;

/// A 20-byte account or contract address.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The all-zero address.
    pub const ZERO: Address = Address([0u8; 20]);

    /// Build an address from raw bytes.
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Whether this is the all-zero address.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = DuelloError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        if digits.len() != 40 {
            return Err(DuelloError::InvalidAddress(format!(
                "expected 40 hex characters, got {}",
                digits.len()
            )));
        }
        let bytes = hex::decode(digits)?;
        let mut out = [0u8; 20];
        out.copy_from_slice(&bytes);
        Ok(Self(out))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::from_str(&s).map_err(de::Error::custom)
    }
}

/// The asset a market is denominated in.
///
/// On the wire the native asset is the zero address; [`Token::from_str`] maps it
/// back to [`Token::Native`] so the sentinel never leaks into an `Erc20` value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Token {
    #[default]
    Native,
    Erc20(Address),
}

impl Token {
    pub fn is_native(&self) -> bool {
        matches!(self, Token::Native)
    }

    /// Wire representation: the zero address for the native asset.
    pub fn address(&self) -> Address {
        match self {
            Token::Native => Address::ZERO,
            Token::Erc20(addr) => *addr,
        }
    }
}

impl From<Address> for Token {
    fn from(addr: Address) -> Self {
        if addr.is_zero() {
            Token::Native
        } else {
            Token::Erc20(addr)
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Native => write!(f, "native"),
            Token::Erc20(addr) => write!(f, "{addr}"),
        }
    }
}

impl FromStr for Token {
    type Err = DuelloError;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("native") {
            return Ok(Token::Native);
        }
        Address::from_str(s)
            .map(Token::from)
            .map_err(|e| DuelloError::InvalidToken(format!("{s}: {e}")))
    }
}

impl Serialize for Token {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Token {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Token::from_str(&s).map_err(de::Error::custom)
    }
}

/// One of the two outcomes of a moneyline market.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::A, Side::B];

    /// Wire code: 0 for A, 1 for B.
    pub const fn code(self) -> u8 {
        match self {
            Side::A => 0,
            Side::B => 1,
        }
    }

    pub const fn other(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

impl TryFrom<u8> for Side {
    type Error = DuelloError;

    fn try_from(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Side::A),
            1 => Ok(Side::B),
            other => Err(DuelloError::InvalidSide(other.to_string())),
        }
    }
}

impl FromStr for Side {
    type Err = DuelloError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" | "0" => Ok(Side::A),
            "B" | "1" => Ok(Side::B),
            _ => Err(DuelloError::InvalidSide(s.to_string())),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::A => write!(f, "A"),
            Side::B => write!(f, "B"),
        }
    }
}

/// Lifecycle state of a market.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketState {
    #[default]
    Open,
    Locked,
    Resolved,
    Voided,
}

impl MarketState {
    /// Wire code, matching the order of the variants.
    pub const fn code(self) -> u8 {
        match self {
            MarketState::Open => 0,
            MarketState::Locked => 1,
            MarketState::Resolved => 2,
            MarketState::Voided => 3,
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, MarketState::Resolved | MarketState::Voided)
    }
}

impl fmt::Display for MarketState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MarketState::Open => "Open",
            MarketState::Locked => "Locked",
            MarketState::Resolved => "Resolved",
            MarketState::Voided => "Voided",
        };
        f.write_str(label)
    }
}

/// Context of a single state-changing call: who sent it and when it executes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Call {
    pub caller: Address,
    /// Unix timestamp (seconds) the call executes at
    pub now: u64,
}

impl Call {
    pub const fn new(caller: Address, now: u64) -> Self {
        Self { caller, now }
    }
}
