//! Common test utilities for duello-core tests.
//!
//! This module provides shared functionality for testing across all modules,
//! including deterministic addresses, funded vaults and standard fixtures.

use crate::error::Result;
use crate::market::Market;
use crate::oracle::{OracleParams, ResultOracle};
use crate::types::{Address, Amount, Token};
use crate::vault::{MemoryVault, Vault};
use crate::DuelloError;
use std::collections::BTreeSet;

/// Deterministic test address whose last byte is `index`.
pub fn addr(index: u8) -> Address {
    let mut bytes = [0u8; 20];
    bytes[0] = 0xd0;
    bytes[19] = index;
    Address::new(bytes)
}

/// A vault holding the given native balances.
pub fn funded_vault(balances: &[(Address, Amount)]) -> MemoryVault {
    let mut vault = MemoryVault::new();
    for (who, amount) in balances {
        vault.mint(Token::Native, *who, *amount).unwrap();
    }
    vault
}

/// Create a standard open market on the native token.
pub fn create_test_market() -> Market {
    Market::new(
        constants::TEST_MARKET,
        constants::TEST_EVENT_ID.to_string(),
        Token::Native,
        constants::TEST_OWNER,
        constants::TEST_START,
        Some(constants::TEST_END),
    )
    .unwrap()
}

/// Create an oracle with the test bond and window parameters.
pub fn create_test_oracle() -> ResultOracle {
    ResultOracle::new(
        constants::TEST_ORACLE,
        constants::TEST_ARBITER,
        OracleParams {
            min_bond: constants::TEST_MIN_BOND,
            dispute_window: constants::TEST_DISPUTE_WINDOW,
        },
    )
}

/// Vault wrapper that refuses payments to selected accounts, for exercising
/// rollback paths.
pub struct RejectingVault {
    inner: MemoryVault,
    rejected: BTreeSet<Address>,
}

impl RejectingVault {
    pub fn new(inner: MemoryVault) -> Self {
        Self {
            inner,
            rejected: BTreeSet::new(),
        }
    }

    pub fn reject_payments_to(&mut self, who: Address) {
        self.rejected.insert(who);
    }

    pub fn accept_all(&mut self) {
        self.rejected.clear();
    }
}

impl Vault for RejectingVault {
    fn transfer(
        &mut self,
        token: Token,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<()> {
        if self.rejected.contains(&to) {
            return Err(DuelloError::InvalidAddress(format!("{to} refuses payments")));
        }
        self.inner.transfer(token, from, to, amount)
    }

    fn balance_of(&self, token: Token, who: Address) -> Amount {
        self.inner.balance_of(token, who)
    }
}

/// Common test constants
pub mod constants {
    use crate::types::{Address, Amount};

    /// Kick-off of the standard test event (Jan 1, 2025)
    pub const TEST_START: u64 = 1735689600;

    /// Deadline after which the standard market may be voided by anyone
    pub const TEST_END: u64 = TEST_START + 6 * 60 * 60;

    /// Standard oracle event id
    pub const TEST_EVENT_ID: &str = "nba-2025-01-01-lal-bos";

    pub const TEST_MARKET: Address = Address::new([0xaa; 20]);

    pub const TEST_OWNER: Address = Address::new([0x0e; 20]);

    pub const TEST_ORACLE: Address = Address::new([0x0c; 20]);

    pub const TEST_ARBITER: Address = Address::new([0xab; 20]);

    pub const TEST_MIN_BOND: Amount = 10;

    /// One hour
    pub const TEST_DISPUTE_WINDOW: u64 = 3600;

    /// Reference "now" for oracle tests
    pub const T0: u64 = TEST_START + 60;
}
