//! Asset custody for markets and the oracle.
//!
//! Markets and the oracle never hold balances themselves; they move funds
//! between accounts through a [`Vault`]. Escrowed stakes sit in the market's
//! own account and oracle bonds in the oracle's account until paid out.

use crate::{
    error::Result,
    types::{Address, Amount, Token},
    DuelloError,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Moves value between accounts.
///
/// Implementations must be all-or-nothing: a transfer that returns an error
/// leaves every balance exactly as it was.
pub trait Vault {
    /// Move `amount` of `token` from `from` to `to`.
    fn transfer(&mut self, token: Token, from: Address, to: Address, amount: Amount)
        -> Result<()>;

    /// Current balance of `who` in `token`.
    fn balance_of(&self, token: Token, who: Address) -> Amount;
}

/// In-memory balance sheet keyed by token, then account.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryVault {
    balances: BTreeMap<Token, BTreeMap<Address, Amount>>,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `to` with freshly issued funds.
    pub fn mint(&mut self, token: Token, to: Address, amount: Amount) -> Result<()> {
        let slot = self.balances.entry(token).or_default().entry(to).or_insert(0);
        *slot = slot.checked_add(amount).ok_or(DuelloError::Overflow)?;
        debug!(%token, account = %to, amount, "minted funds");
        Ok(())
    }

    /// Sum of every balance held in `token`.
    pub fn supply(&self, token: Token) -> Result<Amount> {
        self.balances
            .get(&token)
            .into_iter()
            .flat_map(|accounts| accounts.values())
            .try_fold(0, |total: Amount, balance| {
                total.checked_add(*balance).ok_or(DuelloError::Overflow)
            })
    }
}

impl Vault for MemoryVault {
    fn transfer(
        &mut self,
        token: Token,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<()> {
        let available = self.balance_of(token, from);
        if available < amount {
            return Err(DuelloError::InsufficientFunds {
                account: from.to_string(),
                available,
                required: amount,
            });
        }
        if from == to || amount == 0 {
            return Ok(());
        }
        let receiver = self.balance_of(token, to);
        let new_receiver = receiver.checked_add(amount).ok_or(DuelloError::Overflow)?;

        let accounts = self.balances.entry(token).or_default();
        accounts.insert(from, available - amount);
        accounts.insert(to, new_receiver);

        debug!(%token, %from, %to, amount, "transferred funds");
        Ok(())
    }

    fn balance_of(&self, token: Token, who: Address) -> Amount {
        self.balances
            .get(&token)
            .and_then(|accounts| accounts.get(&who))
            .copied()
            .unwrap_or(0)
    }
}
