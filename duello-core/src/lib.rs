//! # Duello Core
//!
//! Core Rust library for trust-minimised moneyline betting.
//!
//! This library provides the building blocks for two-sided wagers on a
//! real-world event where:
//! - Stakes are escrowed per market while the market is open
//! - The market locks when the event starts
//! - The outcome comes from an optimistic, bonded propose/dispute oracle
//!   (or, as a fallback, from the market owner)
//! - Winners split the whole pool pari-mutuel style; voided markets refund
//!
//! ## Features
//!
//! - **Stake Ledger**: per-staker, per-side bookkeeping with checked arithmetic
//! - **Market**: Open → Locked → Resolved/Voided lifecycle with atomic claims
//! - **Result Oracle**: propose, dispute, finalize and arbitrate event results
//! - **Registry**: creates markets and lists them in creation order
//! - **Vault**: pluggable custody of escrowed stakes and oracle bonds
//!
//! ## Examples
//!
//! ```rust
//! use duello_core::{Address, Call, Market, MemoryVault, Side, Token, Vault};
//!
//! let alice = Address::new([1u8; 20]);
//! let owner = Address::new([9u8; 20]);
//! let mut vault = MemoryVault::new();
//! vault.mint(Token::Native, alice, 100)?;
//!
//! let mut market = Market::new(
//!     Address::new([0xaa; 20]),
//!     "nba-lal-bos".to_string(),
//!     Token::Native,
//!     owner,
//!     1_735_689_600, // Kick-off
//!     Some(1_735_711_200),
//! )?;
//!
//! market.deposit(&Call::new(alice, 1_735_600_000), Side::A, 40, &mut vault)?;
//! market.lock(&Call::new(alice, 1_735_689_600))?;
//! market.resolve(&Call::new(owner, 1_735_700_000), Side::A)?;
//!
//! let paid = market.claim(&Call::new(alice, 1_735_700_001), &mut vault)?;
//! assert_eq!(paid, 40);
//! Ok::<(), duello_core::DuelloError>(())
//! ```

pub mod error;
pub mod events;
pub mod ledger;
pub mod market;
pub mod oracle;
pub mod registry;
pub mod types;
pub mod utils;
pub mod vault;

#[cfg(test)]
pub(crate) mod test_utils;

pub use error::{DuelloError, ErrorKind, Result};
pub use events::{Journal, MarketEvent, OracleEvent, RegistryEvent};
pub use ledger::{Stake, StakeLedger};
pub use market::Market;
pub use oracle::{FinalOutcome, OracleParams, OracleStatus, Resolution, ResultOracle, ResultSource};
pub use registry::Registry;
pub use types::{Address, Amount, Call, MarketState, Side, Token};
pub use vault::{MemoryVault, Vault};

/// Decimal places of the native asset
pub const DECIMALS: u32 = 18;

/// One whole native unit in base units (10^18)
pub const ONE_NATIVE: Amount = 1_000_000_000_000_000_000;
