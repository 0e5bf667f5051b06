//! # Moneyline Market
//!
//! This module implements the escrow and settlement state machine for a single
//! binary event. Stakes are pooled in the market's escrow account while the
//! market is open, the market locks at the event start, and after resolution
//! winners split the entire pool in proportion to their stake.
//!
//! ```text
//!   Open ──lock()──▶ Locked ──resolve()──────────▶ Resolved
//!    │                 │ └───void_by_owner()────▶ Voided
//!    └──void_after_end()──────────────────────────▶ Voided
//! ```

use crate::{
    error::Result,
    events::{Journal, MarketEvent},
    ledger::{Stake, StakeLedger},
    oracle::{FinalOutcome, ResultSource},
    types::{Address, Amount, Call, MarketState, Side, Token},
    vault::Vault,
    DuelloError,
};
use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// A two-sided pari-mutuel market on one event.
///
/// Payouts use floor division. Whatever remainder that leaves behind stays in
/// escrow for good; it is never redistributed.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Market {
    /// Escrow account of this market
    address: Address,

    /// Oracle event this market settles against
    event_id: String,

    /// Asset stakes are denominated in
    token: Token,

    /// Deposits close and locking opens at this timestamp
    start_time: u64,

    /// Anyone may void the market from this timestamp on
    end_time: Option<u64>,

    /// Account allowed to resolve or void on the administrative path
    owner: Address,

    state: MarketState,

    ledger: StakeLedger,

    winning_side: Option<Side>,

    score_a: Option<u32>,

    score_b: Option<u32>,

    /// Stakers who have withdrawn
    claimed: BTreeSet<Address>,

    /// Funds currently held for this market
    escrowed: Amount,

    #[serde(default)]
    events: Journal<MarketEvent>,
}

impl Market {
    /// Creates a new open market.
    ///
    /// # Arguments
    /// * `address` - The market's escrow account
    /// * `event_id` - Oracle event the market settles against
    /// * `token` - Stake asset ([`Token::Native`] for the chain's native coin)
    /// * `owner` - Account allowed to resolve or void the market
    /// * `start_time` - Event start; deposits close here
    /// * `end_time` - Optional deadline after which anyone may void the market
    pub fn new(
        address: Address,
        event_id: String,
        token: Token,
        owner: Address,
        start_time: u64,
        end_time: Option<u64>,
    ) -> Result<Self> {
        if let Some(end_time) = end_time {
            if start_time >= end_time {
                return Err(DuelloError::InvalidSchedule {
                    start_time,
                    end_time,
                });
            }
        }

        Ok(Self {
            address,
            event_id,
            token,
            start_time,
            end_time,
            owner,
            state: MarketState::Open,
            ledger: StakeLedger::new(),
            winning_side: None,
            score_a: None,
            score_b: None,
            claimed: BTreeSet::new(),
            escrowed: 0,
            events: Journal::default(),
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn token(&self) -> Token {
        self.token
    }

    pub fn start_time(&self) -> u64 {
        self.start_time
    }

    pub fn end_time(&self) -> Option<u64> {
        self.end_time
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn state(&self) -> MarketState {
        self.state
    }

    pub fn total_a(&self) -> Amount {
        self.ledger.total(Side::A)
    }

    pub fn total_b(&self) -> Amount {
        self.ledger.total(Side::B)
    }

    pub fn winning_side(&self) -> Option<Side> {
        self.winning_side
    }

    pub fn score_a(&self) -> Option<u32> {
        self.score_a
    }

    pub fn score_b(&self) -> Option<u32> {
        self.score_b
    }

    pub fn stake_of(&self, staker: &Address, side: Side) -> Amount {
        self.ledger.read(staker, side)
    }

    pub fn has_claimed(&self, staker: &Address) -> bool {
        self.claimed.contains(staker)
    }

    /// Funds the market still holds: deposits minus everything paid out.
    pub fn escrowed(&self) -> Amount {
        self.escrowed
    }

    pub fn ledger(&self) -> &StakeLedger {
        &self.ledger
    }

    pub fn events(&self) -> &Journal<MarketEvent> {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut Journal<MarketEvent> {
        &mut self.events
    }

    /// Stake `amount` on `side`, pulling the funds from the caller into escrow.
    pub fn deposit(
        &mut self,
        call: &Call,
        side: Side,
        amount: Amount,
        vault: &mut impl Vault,
    ) -> Result<()> {
        if self.state != MarketState::Open {
            return Err(DuelloError::MarketNotOpen(self.state));
        }
        if call.now >= self.start_time {
            debug!(market = %self.address, now = call.now, "deposit after start rejected");
            return Err(DuelloError::DepositWindowClosed {
                start_time: self.start_time,
            });
        }
        if amount == 0 {
            return Err(DuelloError::ZeroAmount);
        }

        // Every fallible step runs before the ledger is touched.
        self.ledger.check_credit(&call.caller, side, amount)?;
        let escrowed = self
            .escrowed
            .checked_add(amount)
            .ok_or(DuelloError::Overflow)?;
        vault.transfer(self.token, call.caller, self.address, amount)?;

        self.ledger.credit(call.caller, side, amount)?;
        self.escrowed = escrowed;

        self.events.push(MarketEvent::Deposited {
            staker: call.caller,
            side,
            amount,
        });
        info!(market = %self.address, staker = %call.caller, %side, amount, "deposit accepted");
        Ok(())
    }

    /// Close deposits. Anyone may call this once the event has started.
    pub fn lock(&mut self, call: &Call) -> Result<()> {
        if self.state != MarketState::Open {
            return Err(DuelloError::wrong_state(format!(
                "cannot lock a {} market",
                self.state
            )));
        }
        if call.now < self.start_time {
            return Err(DuelloError::TooEarly {
                allowed_at: self.start_time,
                now: call.now,
            });
        }

        self.state = MarketState::Locked;
        self.events.push(MarketEvent::Locked { at: call.now });
        info!(
            market = %self.address,
            total_a = self.total_a(),
            total_b = self.total_b(),
            "market locked"
        );
        Ok(())
    }

    /// Declare the winner. Owner only.
    pub fn resolve(&mut self, call: &Call, winning_side: Side) -> Result<()> {
        self.resolve_inner(call, winning_side, None, None)
    }

    /// Declare the winner and record the final score. Owner only.
    pub fn resolve_with_scores(
        &mut self,
        call: &Call,
        winning_side: Side,
        score_a: u32,
        score_b: u32,
    ) -> Result<()> {
        self.resolve_inner(call, winning_side, Some(score_a), Some(score_b))
    }

    fn resolve_inner(
        &mut self,
        call: &Call,
        winning_side: Side,
        score_a: Option<u32>,
        score_b: Option<u32>,
    ) -> Result<()> {
        self.require_owner(call)?;
        self.require_locked("resolve")?;
        self.settle(winning_side, score_a, score_b);
        Ok(())
    }

    /// Cancel a locked market so every staker is refunded. Owner only.
    pub fn void_by_owner(&mut self, call: &Call) -> Result<()> {
        self.require_owner(call)?;
        self.require_locked("void")?;
        self.void(call.caller);
        Ok(())
    }

    /// Cancel a market nobody settled in time. Anyone may call this at or
    /// after the end time.
    pub fn void_after_end(&mut self, call: &Call) -> Result<()> {
        if self.state.is_terminal() {
            return Err(DuelloError::wrong_state(format!(
                "market is already {}",
                self.state
            )));
        }
        let end_time = self.end_time.ok_or(DuelloError::NoEndTime)?;
        if call.now < end_time {
            return Err(DuelloError::TooEarly {
                allowed_at: end_time,
                now: call.now,
            });
        }

        warn!(market = %self.address, by = %call.caller, "market voided after end time");
        self.void(call.caller);
        Ok(())
    }

    /// Settle a locked market from a finalized oracle verdict. Anyone may call
    /// this.
    pub fn resolve_from_oracle(&mut self, call: &Call, source: &impl ResultSource) -> Result<()> {
        self.require_locked("resolve")?;
        match source.final_outcome(&self.event_id) {
            Some(FinalOutcome::Outcome(side)) => {
                self.settle(side, None, None);
                Ok(())
            }
            Some(FinalOutcome::Void) => {
                self.void(call.caller);
                Ok(())
            }
            None => Err(DuelloError::OracleNotFinal(self.event_id.clone())),
        }
    }

    /// What `staker` would receive from [`Market::claim`] right now.
    ///
    /// Zero for open or locked markets, losing stakers, and anyone who has
    /// already claimed.
    pub fn preview_claim(&self, staker: &Address) -> Result<Amount> {
        if !self.state.is_terminal() || self.claimed.contains(staker) {
            return Ok(0);
        }
        self.payout_for(&self.ledger.stake(staker))
    }

    /// Withdraw the caller's payout (Resolved) or refund (Voided).
    ///
    /// The claim is recorded before funds leave escrow and rolled back if the
    /// transfer fails, so each staker is paid at most once and a failed
    /// transfer changes nothing.
    pub fn claim(&mut self, call: &Call, vault: &mut impl Vault) -> Result<Amount> {
        if !self.state.is_terminal() {
            return Err(DuelloError::wrong_state(format!(
                "cannot claim from a {} market",
                self.state
            )));
        }
        let staker = call.caller;
        if self.claimed.contains(&staker) {
            return Err(DuelloError::AlreadyClaimed);
        }

        let payout = self.payout_for(&self.ledger.stake(&staker))?;
        if payout == 0 {
            return Err(DuelloError::NothingToClaim);
        }
        let remaining = self
            .escrowed
            .checked_sub(payout)
            .ok_or(DuelloError::Overflow)?;

        let stake = self.ledger.take(&staker);
        self.claimed.insert(staker);
        self.escrowed = remaining;

        if let Err(e) = vault.transfer(self.token, self.address, staker, payout) {
            self.ledger.restore(staker, stake);
            self.claimed.remove(&staker);
            self.escrowed = remaining + payout;
            debug!(market = %self.address, %staker, error = %e, "claim transfer failed, rolled back");
            return Err(e);
        }

        self.events.push(MarketEvent::Claimed {
            staker,
            amount: payout,
        });
        info!(market = %self.address, %staker, payout, "payout claimed");
        Ok(payout)
    }

    /// Decimal odds for `side`: pool divided by that side's total.
    ///
    /// `None` while nobody has staked on `side`. Display only.
    pub fn odds(&self, side: Side) -> Option<f64> {
        let side_total = self.ledger.total(side);
        if side_total == 0 {
            return None;
        }
        let pool = self.total_a() as f64 + self.total_b() as f64;
        Some(pool / side_total as f64)
    }

    /// Human readable status summary at `now`.
    pub fn status_line(&self, now: u64) -> String {
        match self.state {
            MarketState::Open if now < self.start_time => "Open - Accepting deposits".to_string(),
            MarketState::Open => "Open - Ready to lock".to_string(),
            MarketState::Locked => match self.end_time {
                Some(end) if now >= end => "Locked - Past end time, voidable".to_string(),
                _ => "Locked - Awaiting result".to_string(),
            },
            MarketState::Resolved => match self.winning_side {
                Some(side) => format!("Resolved - Side {} won", side),
                None => "Resolved - No winner set".to_string(),
            },
            MarketState::Voided => "Voided - Refunds available".to_string(),
        }
    }

    fn payout_for(&self, stake: &Stake) -> Result<Amount> {
        match (self.state, self.winning_side) {
            (MarketState::Voided, _) => stake.total(),
            (MarketState::Resolved, Some(winner)) => {
                let winning_total = self.ledger.total(winner);
                if winning_total == 0 {
                    // Nobody backed the winner: fall back to refunds.
                    return stake.total();
                }
                let pool = self.ledger.pool()?;
                // Both factors fit in 128 bits, so the product cannot overflow
                // 256. The quotient is at most `pool` since stake <= winning_total.
                let share = U256::from(stake.on(winner)) * U256::from(pool)
                    / U256::from(winning_total);
                share.try_into().map_err(|_| DuelloError::Overflow)
            }
            _ => Ok(0),
        }
    }

    fn settle(&mut self, winning_side: Side, score_a: Option<u32>, score_b: Option<u32>) {
        self.state = MarketState::Resolved;
        self.winning_side = Some(winning_side);
        self.score_a = score_a;
        self.score_b = score_b;
        self.events.push(MarketEvent::Resolved {
            winning_side,
            score_a,
            score_b,
        });
        info!(market = %self.address, %winning_side, ?score_a, ?score_b, "market resolved");
    }

    fn void(&mut self, by: Address) {
        self.state = MarketState::Voided;
        self.events.push(MarketEvent::Voided { by });
        info!(market = %self.address, %by, "market voided");
    }

    fn require_owner(&self, call: &Call) -> Result<()> {
        if call.caller != self.owner {
            debug!(market = %self.address, caller = %call.caller, "owner check failed");
            return Err(DuelloError::NotOwner);
        }
        Ok(())
    }

    fn require_locked(&self, action: &str) -> Result<()> {
        if self.state != MarketState::Locked {
            return Err(DuelloError::wrong_state(format!(
                "cannot {action} a {} market",
                self.state
            )));
        }
        Ok(())
    }
}
