//! Events emitted by markets, the registry and the oracle.
//!
//! Indexers and front-ends rebuild their views from these records plus the
//! read accessors; nothing they persist is ever read back by the core.

use crate::types::{Address, Amount, Side, Token};
use serde::{Deserialize, Serialize};

/// Market lifecycle events.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum MarketEvent {
    Deposited {
        staker: Address,
        side: Side,
        amount: Amount,
    },
    Locked {
        at: u64,
    },
    Resolved {
        winning_side: Side,
        score_a: Option<u32>,
        score_b: Option<u32>,
    },
    Voided {
        by: Address,
    },
    Claimed {
        staker: Address,
        amount: Amount,
    },
}

/// Factory events.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum RegistryEvent {
    MarketCreated {
        market: Address,
        token: Token,
        start_time: u64,
        end_time: Option<u64>,
    },
    OwnershipTransferred {
        previous_owner: Address,
        new_owner: Address,
    },
}

/// Oracle events.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum OracleEvent {
    Proposed {
        event_id: String,
        outcome: Side,
        proposer: Address,
        bond: Amount,
    },
    Disputed {
        event_id: String,
        disputer: Address,
        bond: Amount,
    },
    Finalized {
        event_id: String,
        outcome: Side,
    },
    Arbitrated {
        event_id: String,
        verdict: Option<Side>,
    },
}

/// Append-only event log with a drain cursor.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Journal<E> {
    entries: Vec<E>,
    #[serde(default)]
    drained: usize,
}

impl<E> Default for Journal<E> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            drained: 0,
        }
    }
}

impl<E: Clone> Journal<E> {
    pub fn push(&mut self, event: E) {
        self.entries.push(event);
    }

    /// Every event ever recorded, oldest first.
    pub fn all(&self) -> &[E] {
        &self.entries
    }

    /// Events recorded since the previous drain.
    pub fn drain_new(&mut self) -> Vec<E> {
        // A cursor past the end (e.g. from an edited state file) means nothing new.
        let fresh = self.entries.get(self.drained..).unwrap_or_default().to_vec();
        self.drained = self.entries.len();
        fresh
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_journal_drains_only_new_events() {
        let mut journal = Journal::default();
        journal.push(MarketEvent::Locked { at: 1 });
        assert_eq!(journal.drain_new().len(), 1);
        assert!(journal.drain_new().is_empty());

        journal.push(MarketEvent::Voided {
            by: Address::ZERO,
        });
        let fresh = journal.drain_new();
        assert_eq!(fresh, vec![MarketEvent::Voided { by: Address::ZERO }]);
        assert_eq!(journal.len(), 2, "Draining keeps history");
    }

    #[test]
    fn test_journal_cursor_past_end_drains_nothing() {
        let json = r#"{"entries":[{"Locked":{"at":7}}],"drained":5}"#;
        let mut journal: Journal<MarketEvent> = serde_json::from_str(json).unwrap();

        assert!(journal.drain_new().is_empty());
        journal.push(MarketEvent::Locked { at: 8 });
        assert_eq!(journal.drain_new(), vec![MarketEvent::Locked { at: 8 }]);
    }
}
