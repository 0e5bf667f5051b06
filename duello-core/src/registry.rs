//! # Market Registry
//!
//! The factory that creates markets and keeps them in creation order. Each
//! market is an independently owned state struct addressed by a derived
//! market address.

use crate::{
    error::Result,
    events::{Journal, RegistryEvent},
    market::Market,
    types::{Address, Call, Token},
    utils::derive_address,
    DuelloError,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// Creates and indexes markets.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Registry {
    address: Address,
    owner: Address,
    nonce: u64,
    /// Market addresses in creation order
    index: Vec<Address>,
    markets: BTreeMap<Address, Market>,
    #[serde(default)]
    events: Journal<RegistryEvent>,
}

impl Registry {
    pub fn new(address: Address, owner: Address) -> Self {
        Self {
            address,
            owner,
            nonce: 0,
            index: Vec::new(),
            markets: BTreeMap::new(),
            events: Journal::default(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Create a market. Owner only.
    ///
    /// The market's address is derived from the registry address and a
    /// creation counter, and its owner is the registry owner at creation time.
    /// Without an `event_id` the market gets a fresh random one.
    pub fn create_market(
        &mut self,
        call: &Call,
        token: Token,
        start_time: u64,
        end_time: Option<u64>,
        event_id: Option<String>,
    ) -> Result<Address> {
        if call.caller != self.owner {
            return Err(DuelloError::NotOwner);
        }
        let next_nonce = self.nonce.checked_add(1).ok_or(DuelloError::Overflow)?;
        let address = derive_address(&self.address, self.nonce);
        let event_id = event_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let market = Market::new(address, event_id, token, self.owner, start_time, end_time)?;

        self.nonce = next_nonce;
        self.index.push(address);
        self.markets.insert(address, market);
        self.events.push(RegistryEvent::MarketCreated {
            market: address,
            token,
            start_time,
            end_time,
        });
        info!(market = %address, %token, start_time, ?end_time, "market created");
        Ok(address)
    }

    /// Every market address, oldest first.
    pub fn all_markets(&self) -> &[Address] {
        &self.index
    }

    pub fn market(&self, address: &Address) -> Result<&Market> {
        self.markets
            .get(address)
            .ok_or_else(|| DuelloError::UnknownMarket(address.to_string()))
    }

    pub fn market_mut(&mut self, address: &Address) -> Result<&mut Market> {
        self.markets
            .get_mut(address)
            .ok_or_else(|| DuelloError::UnknownMarket(address.to_string()))
    }

    /// Markets in creation order.
    pub fn markets(&self) -> impl Iterator<Item = &Market> {
        self.index.iter().filter_map(|addr| self.markets.get(addr))
    }

    /// Hand the registry to a new owner. Owner only.
    ///
    /// Markets created earlier keep the owner they were created with.
    pub fn transfer_ownership(&mut self, call: &Call, new_owner: Address) -> Result<()> {
        if call.caller != self.owner {
            return Err(DuelloError::NotOwner);
        }
        if new_owner.is_zero() {
            return Err(DuelloError::InvalidAddress(
                "new owner is the zero address".to_string(),
            ));
        }

        let previous_owner = self.owner;
        self.owner = new_owner;
        self.events.push(RegistryEvent::OwnershipTransferred {
            previous_owner,
            new_owner,
        });
        info!(%previous_owner, %new_owner, "registry ownership transferred");
        Ok(())
    }

    pub fn events(&self) -> &Journal<RegistryEvent> {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut Journal<RegistryEvent> {
        &mut self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{addr, constants::*};
    use crate::types::MarketState;

    fn registry() -> Registry {
        Registry::new(addr(200), TEST_OWNER)
    }

    #[test]
    fn test_create_market_lists_in_order() {
        let mut registry = registry();
        let call = Call::new(TEST_OWNER, 0);

        let first = registry
            .create_market(&call, Token::Native, TEST_START, Some(TEST_END), None)
            .unwrap();
        let second = registry
            .create_market(
                &call,
                Token::Erc20(addr(150)),
                TEST_START + 10,
                None,
                Some("epl-ars-che".to_string()),
            )
            .unwrap();

        assert_ne!(first, second);
        assert_eq!(registry.all_markets(), &[first, second]);

        let market = registry.market(&second).unwrap();
        assert_eq!(market.event_id(), "epl-ars-che");
        assert_eq!(market.token(), Token::Erc20(addr(150)));
        assert_eq!(market.owner(), TEST_OWNER);
        assert_eq!(market.state(), MarketState::Open);
        assert_eq!(market.end_time(), None);

        let generated = registry.market(&first).unwrap().event_id();
        assert!(uuid::Uuid::parse_str(generated).is_ok());

        assert_eq!(
            registry.events().all()[0],
            RegistryEvent::MarketCreated {
                market: first,
                token: Token::Native,
                start_time: TEST_START,
                end_time: Some(TEST_END),
            }
        );
    }

    #[test]
    fn test_create_market_owner_only() {
        let mut registry = registry();
        let result = registry.create_market(
            &Call::new(addr(1), 0),
            Token::Native,
            TEST_START,
            Some(TEST_END),
            None,
        );
        assert!(matches!(result, Err(DuelloError::NotOwner)));
        assert!(registry.all_markets().is_empty());
    }

    #[test]
    fn test_create_market_rejects_bad_schedule() {
        let mut registry = registry();
        let result = registry.create_market(
            &Call::new(TEST_OWNER, 0),
            Token::Native,
            TEST_END,
            Some(TEST_START),
            None,
        );
        assert!(matches!(result, Err(DuelloError::InvalidSchedule { .. })));
        assert!(registry.all_markets().is_empty());

        // A rejected creation does not consume an address.
        let created = registry
            .create_market(&Call::new(TEST_OWNER, 0), Token::Native, TEST_START, Some(TEST_END), None)
            .unwrap();
        assert_eq!(created, derive_address(&registry.address(), 0));
    }

    #[test]
    fn test_unknown_market() {
        let registry = registry();
        assert!(matches!(
            registry.market(&addr(77)),
            Err(DuelloError::UnknownMarket(_))
        ));
    }

    #[test]
    fn test_transfer_ownership() {
        let mut registry = registry();
        let old = Call::new(TEST_OWNER, 0);
        let first = registry
            .create_market(&old, Token::Native, TEST_START, Some(TEST_END), None)
            .unwrap();

        assert!(matches!(
            registry.transfer_ownership(&Call::new(addr(1), 0), addr(1)),
            Err(DuelloError::NotOwner)
        ));
        assert!(registry.transfer_ownership(&old, Address::ZERO).is_err());

        registry.transfer_ownership(&old, addr(9)).unwrap();
        assert_eq!(registry.owner(), addr(9));
        assert!(matches!(
            registry.create_market(&old, Token::Native, TEST_START, Some(TEST_END), None),
            Err(DuelloError::NotOwner)
        ));

        let new = Call::new(addr(9), 0);
        let second = registry
            .create_market(&new, Token::Native, TEST_START, Some(TEST_END), None)
            .unwrap();
        assert_eq!(registry.market(&first).unwrap().owner(), TEST_OWNER);
        assert_eq!(registry.market(&second).unwrap().owner(), addr(9));
    }

    #[test]
    fn test_registry_serialization_roundtrip() {
        let mut registry = registry();
        let created = registry
            .create_market(&Call::new(TEST_OWNER, 0), Token::Native, TEST_START, Some(TEST_END), None)
            .unwrap();

        let json = serde_json::to_string_pretty(&registry).unwrap();
        let back: Registry = serde_json::from_str(&json).unwrap();
        assert_eq!(back.all_markets(), &[created]);
        assert_eq!(back.owner(), TEST_OWNER);
    }
}
