//! Common test utilities for paripool-core tests.
//!
//! Shared setup across the module test suites: a funded in-memory ledger,
//! an open market bound to it, and a market pre-loaded with the canonical
//! equal-pools scenario (5 units on each side).

use crate::ledger::InMemoryLedger;
use crate::market::Market;

/// Common test identities and amounts.
pub mod constants {
    /// One whole token in 6-decimal base units.
    pub const UNIT: u128 = 1_000_000;

    pub const LEDGER_ID: &str = "tokens";
    pub const REGISTRY: &str = "registry";
    pub const ADMIN: &str = "admin";
    pub const ALICE: &str = "alice";
    pub const BOB: &str = "bob";
    pub const CAROL: &str = "carol";
}

use constants::*;

/// Ledger with 100 units minted to each of alice, bob, and carol.
/// The administrator starts at zero so fee and sweep arrivals are visible.
pub fn funded_ledger() -> InMemoryLedger {
    let mut ledger = InMemoryLedger::new(LEDGER_ID);
    for who in [ALICE, BOB, CAROL] {
        ledger.mint(who, 100 * UNIT);
    }
    ledger
}

/// An open market (id 0) plus a funded ledger. Alice and bob have approved
/// the market's escrow account; carol deliberately has not.
pub fn open_market() -> (Market, InMemoryLedger) {
    let mut ledger = funded_ledger();
    let market = Market::new(0, LEDGER_ID, ADMIN, REGISTRY);
    for who in [ALICE, BOB] {
        ledger.approve(who, market.account(), 100 * UNIT);
    }
    (market, ledger)
}

/// The canonical scenario: alice holds 5 units on side A, bob 5 units on
/// side B, nothing resolved yet.
pub fn market_with_bets() -> (Market, InMemoryLedger) {
    let (mut market, mut ledger) = open_market();
    market
        .place_bet(&mut ledger, ALICE, 1, 5 * UNIT)
        .expect("alice bet");
    market
        .place_bet(&mut ledger, BOB, 2, 5 * UNIT)
        .expect("bob bet");
    (market, ledger)
}
