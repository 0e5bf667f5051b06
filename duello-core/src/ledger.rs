//! # Stake Ledger
//!
//! Per-market bookkeeping of who staked how much on which side. The ledger
//! moves no funds; the market pairs every credit with a vault transfer.

use crate::{
    error::Result,
    types::{Address, Amount, Side},
    DuelloError,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single staker's position on both sides.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stake {
    pub a: Amount,
    pub b: Amount,
}

impl Stake {
    pub fn on(&self, side: Side) -> Amount {
        match side {
            Side::A => self.a,
            Side::B => self.b,
        }
    }

    fn slot_mut(&mut self, side: Side) -> &mut Amount {
        match side {
            Side::A => &mut self.a,
            Side::B => &mut self.b,
        }
    }

    /// Sum of both sides.
    pub fn total(&self) -> Result<Amount> {
        self.a.checked_add(self.b).ok_or(DuelloError::Overflow)
    }

    pub fn is_empty(&self) -> bool {
        self.a == 0 && self.b == 0
    }
}

/// Staker → side → amount, plus the per-side totals.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct StakeLedger {
    stakes: BTreeMap<Address, Stake>,
    total_a: Amount,
    total_b: Amount,
}

impl StakeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `amount` to `staker`'s position on `side` and to that side's total.
    ///
    /// Both sums are checked before either is written, so an overflow leaves
    /// the ledger untouched.
    pub fn credit(&mut self, staker: Address, side: Side, amount: Amount) -> Result<()> {
        let (new_stake, new_total) = self.credited(&staker, side, amount)?;

        *self.stakes.entry(staker).or_default().slot_mut(side) = new_stake;
        match side {
            Side::A => self.total_a = new_total,
            Side::B => self.total_b = new_total,
        }
        Ok(())
    }

    /// Fail exactly when [`StakeLedger::credit`] would, without writing anything.
    pub fn check_credit(&self, staker: &Address, side: Side, amount: Amount) -> Result<()> {
        self.credited(staker, side, amount).map(|_| ())
    }

    fn credited(&self, staker: &Address, side: Side, amount: Amount) -> Result<(Amount, Amount)> {
        let new_stake = self
            .read(staker, side)
            .checked_add(amount)
            .ok_or(DuelloError::Overflow)?;
        let new_total = self
            .total(side)
            .checked_add(amount)
            .ok_or(DuelloError::Overflow)?;
        Ok((new_stake, new_total))
    }

    /// Amount `staker` holds on `side`; zero if they never staked.
    pub fn read(&self, staker: &Address, side: Side) -> Amount {
        self.stakes
            .get(staker)
            .map(|stake| stake.on(side))
            .unwrap_or(0)
    }

    /// Both sides of `staker`'s position.
    pub fn stake(&self, staker: &Address) -> Stake {
        self.stakes.get(staker).copied().unwrap_or_default()
    }

    /// Zero `staker`'s position and return what it held.
    ///
    /// Side totals are left alone: payouts for later claimants are computed
    /// against the pool as it stood at lock time.
    pub fn take(&mut self, staker: &Address) -> Stake {
        self.stakes
            .get_mut(staker)
            .map(std::mem::take)
            .unwrap_or_default()
    }

    /// Put back a position removed by [`StakeLedger::take`].
    pub(crate) fn restore(&mut self, staker: Address, stake: Stake) {
        self.stakes.insert(staker, stake);
    }

    pub fn total(&self, side: Side) -> Amount {
        match side {
            Side::A => self.total_a,
            Side::B => self.total_b,
        }
    }

    /// Sum of both side totals.
    pub fn pool(&self) -> Result<Amount> {
        self.total_a
            .checked_add(self.total_b)
            .ok_or(DuelloError::Overflow)
    }

    /// Stakers with a recorded position, in address order.
    pub fn stakers(&self) -> impl Iterator<Item = &Address> {
        self.stakes.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::addr;

    #[test]
    fn test_credit_accumulates_per_side() {
        let mut ledger = StakeLedger::new();
        let alice = addr(1);

        ledger.credit(alice, Side::A, 100).unwrap();
        ledger.credit(alice, Side::A, 50).unwrap();
        ledger.credit(alice, Side::B, 7).unwrap();

        assert_eq!(ledger.read(&alice, Side::A), 150);
        assert_eq!(ledger.read(&alice, Side::B), 7);
        assert_eq!(ledger.total(Side::A), 150);
        assert_eq!(ledger.total(Side::B), 7);
        assert_eq!(ledger.pool().unwrap(), 157);
    }

    #[test]
    fn test_read_unknown_staker_is_zero() {
        let ledger = StakeLedger::new();
        assert_eq!(ledger.read(&addr(9), Side::A), 0);
        assert!(ledger.stake(&addr(9)).is_empty());
    }

    #[test]
    fn test_credit_overflow_leaves_ledger_unchanged() {
        let mut ledger = StakeLedger::new();
        let alice = addr(1);
        let bob = addr(2);

        ledger.credit(alice, Side::A, Amount::MAX - 1).unwrap();
        let before = ledger.clone();

        // Bob's own stake fits, but the side total would wrap.
        let result = ledger.credit(bob, Side::A, 2);
        assert!(matches!(result, Err(DuelloError::Overflow)));
        assert_eq!(ledger, before, "Failed credit must not mutate the ledger");
        assert_eq!(ledger.read(&bob, Side::A), 0);
    }

    #[test]
    fn test_credit_is_commutative() {
        let deposits = [
            (addr(1), Side::A, 10u128),
            (addr(2), Side::B, 25),
            (addr(1), Side::B, 3),
            (addr(3), Side::A, 40),
        ];

        let mut forward = StakeLedger::new();
        for (who, side, amount) in deposits {
            forward.credit(who, side, amount).unwrap();
        }
        let mut backward = StakeLedger::new();
        for (who, side, amount) in deposits.iter().rev() {
            backward.credit(*who, *side, *amount).unwrap();
        }

        assert_eq!(forward, backward);
        assert_eq!(forward.total(Side::A), 50);
        assert_eq!(forward.total(Side::B), 28);
    }

    #[test]
    fn test_take_zeroes_position_but_keeps_totals() {
        let mut ledger = StakeLedger::new();
        let alice = addr(1);
        ledger.credit(alice, Side::A, 30).unwrap();
        ledger.credit(alice, Side::B, 5).unwrap();

        let taken = ledger.take(&alice);
        assert_eq!(taken, Stake { a: 30, b: 5 });
        assert!(ledger.stake(&alice).is_empty());
        assert_eq!(ledger.total(Side::A), 30);
        assert_eq!(ledger.total(Side::B), 5);

        assert!(ledger.take(&alice).is_empty(), "Second take yields nothing");
    }
}
