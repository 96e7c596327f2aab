//! Market registry: creation, id bookkeeping, and emergency forwarding.
//!
//! The registry owns its markets outright in an ordered arena keyed by
//! sequential id; each market carries only the registry's string identity
//! as a lookup key, so there is no reference cycle between the two.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{MarketError, Result};
use crate::events::MarketEvent;
use crate::ledger::EscrowLedger;
use crate::market::Market;
use crate::MAX_MARKETS;

/// Creates and tracks [`Market`] instances for one administrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketRegistry {
    /// The registry's own caller identity, copied into each market as the
    /// only identity allowed to trigger emergency recovery.
    identity: String,

    /// Identity allowed to create markets and request recovery. Copied
    /// into each market as administrator and treasury at creation time.
    administrator: String,

    /// Ordered, append-only arena of markets by id.
    markets: BTreeMap<u16, Market>,

    /// Next id to assign; bounded by [`MAX_MARKETS`].
    market_count: u16,

    events: Vec<MarketEvent>,
}

impl MarketRegistry {
    pub fn new(identity: impl Into<String>, administrator: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            administrator: administrator.into(),
            markets: BTreeMap::new(),
            market_count: 0,
            events: Vec::new(),
        }
    }

    /// Create a market bound to the given escrow ledger identity.
    ///
    /// Administrator-only. Assigns the next sequential id; fails with
    /// `CapacityExceeded` once the fixed maximum is reached.
    pub fn create_market(&mut self, caller: &str, escrow_ledger_id: &str) -> Result<u16> {
        if caller != self.administrator {
            return Err(MarketError::NotOwner);
        }
        if self.market_count >= MAX_MARKETS {
            return Err(MarketError::CapacityExceeded);
        }
        let id = self.market_count;
        let market = Market::new(id, escrow_ledger_id, &self.administrator, &self.identity);
        let account = market.account().to_string();
        self.markets.insert(id, market);
        self.market_count += 1;
        self.events.push(MarketEvent::MarketCreated {
            market_id: id,
            market_account: account.clone(),
        });
        info!(market = id, %account, escrow = escrow_ledger_id, "market created");
        Ok(id)
    }

    /// Forward an emergency recovery call to a market.
    ///
    /// Administrator-only; the market itself then authorizes the call
    /// against this registry's identity. No accounting happens here.
    pub fn emergency_withdraw(
        &mut self,
        ledger: &mut dyn EscrowLedger,
        caller: &str,
        market_id: u16,
    ) -> Result<u128> {
        if caller != self.administrator {
            return Err(MarketError::NotOwner);
        }
        let identity = self.identity.clone();
        let market = self
            .markets
            .get_mut(&market_id)
            .ok_or(MarketError::MarketNotFound(market_id))?;
        market.emergency_withdraw(ledger, &identity)
    }

    pub fn market(&self, market_id: u16) -> Result<&Market> {
        self.markets
            .get(&market_id)
            .ok_or(MarketError::MarketNotFound(market_id))
    }

    pub fn market_mut(&mut self, market_id: u16) -> Result<&mut Market> {
        self.markets
            .get_mut(&market_id)
            .ok_or(MarketError::MarketNotFound(market_id))
    }

    /// Markets in id order.
    pub fn markets(&self) -> impl Iterator<Item = &Market> {
        self.markets.values()
    }

    pub fn market_count(&self) -> u16 {
        self.market_count
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn administrator(&self) -> &str {
        &self.administrator
    }

    pub fn events(&self) -> &[MarketEvent] {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{constants::*, funded_ledger};

    fn registry() -> MarketRegistry {
        MarketRegistry::new(REGISTRY, ADMIN)
    }

    #[test]
    fn test_create_market_assigns_sequential_ids() {
        let mut registry = registry();
        assert_eq!(registry.create_market(ADMIN, LEDGER_ID).unwrap(), 0);
        assert_eq!(registry.create_market(ADMIN, LEDGER_ID).unwrap(), 1);
        assert_eq!(registry.market_count(), 2);
        assert_eq!(registry.market(0).unwrap().account(), "market/0");
        assert_eq!(
            registry.events(),
            &[
                MarketEvent::MarketCreated {
                    market_id: 0,
                    market_account: "market/0".to_string()
                },
                MarketEvent::MarketCreated {
                    market_id: 1,
                    market_account: "market/1".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_create_market_admin_only() {
        let mut registry = registry();
        let err = registry.create_market(ALICE, LEDGER_ID).unwrap_err();
        assert_eq!(err, MarketError::NotOwner);
        assert_eq!(registry.market_count(), 0);
    }

    #[test]
    fn test_created_market_copies_identities() {
        let mut registry = registry();
        let id = registry.create_market(ADMIN, LEDGER_ID).unwrap();
        let market = registry.market(id).unwrap();
        assert_eq!(market.administrator(), ADMIN);
        assert_eq!(market.treasury(), ADMIN);
        assert_eq!(market.escrow(), LEDGER_ID);
    }

    #[test]
    fn test_capacity_bound() {
        let mut registry = registry();
        registry.market_count = MAX_MARKETS - 1;
        // The last assignable id is 65,534; 65,535 is never handed out.
        assert_eq!(registry.create_market(ADMIN, LEDGER_ID).unwrap(), 65_534);
        let err = registry.create_market(ADMIN, LEDGER_ID).unwrap_err();
        assert_eq!(err, MarketError::CapacityExceeded);
    }

    #[test]
    fn test_lookup_unknown_market() {
        let registry = registry();
        assert_eq!(
            registry.market(9).unwrap_err(),
            MarketError::MarketNotFound(9)
        );
    }

    #[test]
    fn test_emergency_withdraw_forwards_to_market() {
        let mut ledger = funded_ledger();
        let mut registry = registry();
        let id = registry.create_market(ADMIN, LEDGER_ID).unwrap();

        let account = registry.market(id).unwrap().account().to_string();
        ledger.approve(ALICE, &account, 100 * UNIT);
        ledger.approve(BOB, &account, 100 * UNIT);
        let market = registry.market_mut(id).unwrap();
        market.place_bet(&mut ledger, ALICE, 1, 5 * UNIT).unwrap();
        market.place_bet(&mut ledger, BOB, 2, 5 * UNIT).unwrap();

        let swept = registry.emergency_withdraw(&mut ledger, ADMIN, id).unwrap();
        assert_eq!(swept, 10 * UNIT);
        assert_eq!(ledger.balance_of(ADMIN), 10 * UNIT);
        assert_eq!(ledger.balance_of(&account), 0);
    }

    #[test]
    fn test_emergency_withdraw_admin_only() {
        let mut ledger = funded_ledger();
        let mut registry = registry();
        let id = registry.create_market(ADMIN, LEDGER_ID).unwrap();

        let err = registry
            .emergency_withdraw(&mut ledger, ALICE, id)
            .unwrap_err();
        assert_eq!(err, MarketError::NotOwner);
    }

    #[test]
    fn test_emergency_withdraw_unknown_market() {
        let mut ledger = funded_ledger();
        let mut registry = registry();
        let err = registry
            .emergency_withdraw(&mut ledger, ADMIN, 42)
            .unwrap_err();
        assert_eq!(err, MarketError::MarketNotFound(42));
    }
}
