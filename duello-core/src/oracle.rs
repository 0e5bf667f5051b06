//! # Optimistic Result Oracle
//!
//! Anyone may propose the outcome of an event by posting a bond. The proposal
//! stands unless someone disputes it with an equal or larger bond before the
//! dispute window closes. Undisputed proposals finalize once the window has
//! elapsed; disputed ones wait for the arbiter, whose verdict sends both bonds
//! to the side that reported correctly (or refunds both if the event has no
//! valid outcome).
//!
//! Markets consume finalized verdicts through the [`ResultSource`] trait.

use crate::{
    error::Result,
    events::{Journal, OracleEvent},
    types::{Address, Amount, Call, Side, Token},
    vault::Vault,
    DuelloError,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, error, info};

/// Default dispute window: two hours.
pub const DEFAULT_DISPUTE_WINDOW: u64 = 2 * 60 * 60;

/// Oracle-wide economic and timing parameters.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct OracleParams {
    /// Smallest bond accepted for a proposal or dispute
    pub min_bond: Amount,
    /// Seconds after a proposal during which it can be disputed
    pub dispute_window: u64,
}

impl Default for OracleParams {
    fn default() -> Self {
        Self {
            min_bond: crate::ONE_NATIVE,
            dispute_window: DEFAULT_DISPUTE_WINDOW,
        }
    }
}

/// Reporting state of one event.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    Proposed {
        outcome: Side,
        proposer: Address,
        bond: Amount,
        proposed_at: u64,
    },
    Disputed {
        outcome: Side,
        proposer: Address,
        bond: Amount,
        proposed_at: u64,
        disputer: Address,
        dispute_bond: Amount,
        disputed_at: u64,
    },
    Finalized {
        outcome: Side,
    },
    Voided,
}

impl Resolution {
    pub fn status(&self) -> OracleStatus {
        match self {
            Resolution::Proposed { .. } => OracleStatus::Proposed,
            Resolution::Disputed { .. } => OracleStatus::Disputed,
            Resolution::Finalized { .. } => OracleStatus::Finalized,
            Resolution::Voided => OracleStatus::Voided,
        }
    }
}

/// Flattened view of [`Resolution`], including the implicit unproposed state.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OracleStatus {
    Unproposed,
    Proposed,
    Disputed,
    Finalized,
    Voided,
}

impl fmt::Display for OracleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OracleStatus::Unproposed => "Unproposed",
            OracleStatus::Proposed => "Proposed",
            OracleStatus::Disputed => "Disputed",
            OracleStatus::Finalized => "Finalized",
            OracleStatus::Voided => "Voided",
        };
        f.write_str(label)
    }
}

/// A settled verdict a market can act on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FinalOutcome {
    /// The event resolved in favour of this side
    Outcome(Side),
    /// The event has no valid outcome; stakes should be refunded
    Void,
}

/// Anything that can report the settled outcome of an event.
pub trait ResultSource {
    /// Settled verdict for `event_id`, or `None` while it is still open.
    fn final_outcome(&self, event_id: &str) -> Option<FinalOutcome>;
}

/// Propose/dispute/finalize oracle keyed by event id.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ResultOracle {
    /// Account holding posted bonds
    address: Address,
    arbiter: Address,
    params: OracleParams,
    records: BTreeMap<String, Resolution>,
    #[serde(default)]
    events: Journal<OracleEvent>,
}

impl ResultOracle {
    /// Bonds are always posted in the native asset.
    pub const BOND_TOKEN: Token = Token::Native;

    pub fn new(address: Address, arbiter: Address, params: OracleParams) -> Self {
        Self {
            address,
            arbiter,
            params,
            records: BTreeMap::new(),
            events: Journal::default(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn arbiter(&self) -> Address {
        self.arbiter
    }

    pub fn params(&self) -> &OracleParams {
        &self.params
    }

    pub fn record(&self, event_id: &str) -> Option<&Resolution> {
        self.records.get(event_id)
    }

    /// Event ids with any reporting activity, in lexical order.
    pub fn event_ids(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn events(&self) -> &Journal<OracleEvent> {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut Journal<OracleEvent> {
        &mut self.events
    }

    /// Status and, once finalized, the outcome of `event_id`.
    pub fn result_of(&self, event_id: &str) -> (OracleStatus, Option<Side>) {
        match self.records.get(event_id) {
            None => (OracleStatus::Unproposed, None),
            Some(Resolution::Finalized { outcome }) => (OracleStatus::Finalized, Some(*outcome)),
            Some(other) => (other.status(), None),
        }
    }

    /// End of the dispute window for a pending or disputed proposal.
    pub fn deadline(&self, event_id: &str) -> Option<u64> {
        match self.records.get(event_id)? {
            Resolution::Proposed { proposed_at, .. } | Resolution::Disputed { proposed_at, .. } => {
                proposed_at.checked_add(self.params.dispute_window)
            }
            _ => None,
        }
    }

    /// Propose `outcome` for `event_id`, posting `bond` from the caller.
    pub fn propose(
        &mut self,
        call: &Call,
        event_id: &str,
        outcome: Side,
        bond: Amount,
        vault: &mut impl Vault,
    ) -> Result<()> {
        if self.records.contains_key(event_id) {
            debug!(event_id, "rejected proposal: already proposed");
            return Err(DuelloError::AlreadyProposed(event_id.to_string()));
        }
        if bond < self.params.min_bond {
            return Err(DuelloError::BondTooLow {
                required: self.params.min_bond,
                provided: bond,
            });
        }

        vault.transfer(Self::BOND_TOKEN, call.caller, self.address, bond)?;

        self.records.insert(
            event_id.to_string(),
            Resolution::Proposed {
                outcome,
                proposer: call.caller,
                bond,
                proposed_at: call.now,
            },
        );
        self.events.push(OracleEvent::Proposed {
            event_id: event_id.to_string(),
            outcome,
            proposer: call.caller,
            bond,
        });
        info!(event_id, %outcome, proposer = %call.caller, bond, "outcome proposed");
        Ok(())
    }

    /// Challenge the pending proposal for `event_id` with a counter-bond.
    pub fn dispute(
        &mut self,
        call: &Call,
        event_id: &str,
        bond: Amount,
        vault: &mut impl Vault,
    ) -> Result<()> {
        let (outcome, proposer, proposal_bond, proposed_at) = match self.records.get(event_id) {
            Some(Resolution::Proposed {
                outcome,
                proposer,
                bond,
                proposed_at,
            }) => (*outcome, *proposer, *bond, *proposed_at),
            Some(other) => {
                return Err(DuelloError::wrong_state(format!(
                    "event {event_id} is {}, expected Proposed",
                    other.status()
                )))
            }
            None => {
                return Err(DuelloError::wrong_state(format!(
                    "event {event_id} has no proposal"
                )))
            }
        };

        let closes_at = proposed_at
            .checked_add(self.params.dispute_window)
            .ok_or(DuelloError::Overflow)?;
        if call.now >= closes_at {
            return Err(DuelloError::WindowClosed { closed_at: closes_at });
        }

        let required = proposal_bond.max(self.params.min_bond);
        if bond < required {
            return Err(DuelloError::BondTooLow {
                required,
                provided: bond,
            });
        }

        vault.transfer(Self::BOND_TOKEN, call.caller, self.address, bond)?;

        self.records.insert(
            event_id.to_string(),
            Resolution::Disputed {
                outcome,
                proposer,
                bond: proposal_bond,
                proposed_at,
                disputer: call.caller,
                dispute_bond: bond,
                disputed_at: call.now,
            },
        );
        self.events.push(OracleEvent::Disputed {
            event_id: event_id.to_string(),
            disputer: call.caller,
            bond,
        });
        info!(event_id, disputer = %call.caller, bond, "proposal disputed");
        Ok(())
    }

    /// Accept an undisputed proposal once its window has elapsed.
    ///
    /// Callable by anyone; the proposer's bond is returned to them.
    pub fn finalize(&mut self, call: &Call, event_id: &str, vault: &mut impl Vault) -> Result<Side> {
        let (outcome, proposer, bond, proposed_at) = match self.records.get(event_id) {
            Some(Resolution::Proposed {
                outcome,
                proposer,
                bond,
                proposed_at,
            }) => (*outcome, *proposer, *bond, *proposed_at),
            Some(other) => {
                return Err(DuelloError::wrong_state(format!(
                    "event {event_id} is {}, expected Proposed",
                    other.status()
                )))
            }
            None => {
                return Err(DuelloError::wrong_state(format!(
                    "event {event_id} has no proposal"
                )))
            }
        };

        let allowed_at = proposed_at
            .checked_add(self.params.dispute_window)
            .ok_or(DuelloError::Overflow)?;
        if call.now < allowed_at {
            return Err(DuelloError::TooEarly {
                allowed_at,
                now: call.now,
            });
        }

        vault.transfer(Self::BOND_TOKEN, self.address, proposer, bond)?;

        self.records
            .insert(event_id.to_string(), Resolution::Finalized { outcome });
        self.events.push(OracleEvent::Finalized {
            event_id: event_id.to_string(),
            outcome,
        });
        info!(event_id, %outcome, "outcome finalized");
        Ok(outcome)
    }

    /// Settle a disputed event. Arbiter only.
    ///
    /// `Some(side)` finalizes to `side` and pays both bonds to whichever party
    /// reported it. `None` voids the event and refunds each bond to its owner.
    pub fn arbitrate(
        &mut self,
        call: &Call,
        event_id: &str,
        verdict: Option<Side>,
        vault: &mut impl Vault,
    ) -> Result<()> {
        if call.caller != self.arbiter {
            return Err(DuelloError::NotArbiter);
        }
        let (outcome, proposer, bond, disputer, dispute_bond) = match self.records.get(event_id) {
            Some(Resolution::Disputed {
                outcome,
                proposer,
                bond,
                disputer,
                dispute_bond,
                ..
            }) => (*outcome, *proposer, *bond, *disputer, *dispute_bond),
            Some(other) => {
                return Err(DuelloError::wrong_state(format!(
                    "event {event_id} is {}, expected Disputed",
                    other.status()
                )))
            }
            None => {
                return Err(DuelloError::wrong_state(format!(
                    "event {event_id} has no proposal"
                )))
            }
        };

        let resolution = match verdict {
            Some(side) => {
                let pot = bond.checked_add(dispute_bond).ok_or(DuelloError::Overflow)?;
                let winner = if side == outcome { proposer } else { disputer };
                vault.transfer(Self::BOND_TOKEN, self.address, winner, pot)?;
                info!(event_id, %side, %winner, pot, "dispute settled");
                Resolution::Finalized { outcome: side }
            }
            None => {
                let owed = bond.checked_add(dispute_bond).ok_or(DuelloError::Overflow)?;
                let held = vault.balance_of(Self::BOND_TOKEN, self.address);
                if held < owed {
                    return Err(DuelloError::InsufficientFunds {
                        account: self.address.to_string(),
                        available: held,
                        required: owed,
                    });
                }

                vault.transfer(Self::BOND_TOKEN, self.address, proposer, bond)?;
                if let Err(e) = vault.transfer(Self::BOND_TOKEN, self.address, disputer, dispute_bond)
                {
                    if let Err(undo) = vault.transfer(Self::BOND_TOKEN, proposer, self.address, bond) {
                        // The proposer keeps the refund; record it so a retry
                        // cannot pay it twice.
                        if let Some(Resolution::Disputed { bond, .. }) = self.records.get_mut(event_id) {
                            *bond = 0;
                        }
                        error!(
                            event_id,
                            %proposer,
                            error = %undo,
                            "could not reclaim proposer refund, bond marked as returned"
                        );
                    }
                    return Err(e);
                }
                info!(event_id, "event voided by arbitration, bonds refunded");
                Resolution::Voided
            }
        };

        self.records.insert(event_id.to_string(), resolution);
        self.events.push(OracleEvent::Arbitrated {
            event_id: event_id.to_string(),
            verdict,
        });
        Ok(())
    }

    /// Hand the arbiter role to someone else. Arbiter only.
    pub fn set_arbiter(&mut self, call: &Call, new_arbiter: Address) -> Result<()> {
        if call.caller != self.arbiter {
            return Err(DuelloError::NotArbiter);
        }
        info!(previous = %self.arbiter, new = %new_arbiter, "arbiter changed");
        self.arbiter = new_arbiter;
        Ok(())
    }
}

impl ResultSource for ResultOracle {
    fn final_outcome(&self, event_id: &str) -> Option<FinalOutcome> {
        match self.records.get(event_id)? {
            Resolution::Finalized { outcome } => Some(FinalOutcome::Outcome(*outcome)),
            Resolution::Voided => Some(FinalOutcome::Void),
            _ => None,
        }
    }
}
