//! Observable settlement events.
//!
//! Every successful state change appends one event to the owning market's
//! (or registry's) log. The shapes are stable: external observers and
//! indexers match on them.

use serde::{Deserialize, Serialize};

use crate::market::Side;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketEvent {
    MarketCreated {
        market_id: u16,
        market_account: String,
    },
    BetPlaced {
        participant: String,
        side: Side,
        amount: u128,
    },
    ResultDeclared {
        winning_side: Side,
    },
    RewardClaimed {
        participant: String,
        payout: u128,
    },
    Paused {
        administrator: String,
    },
    Unpaused {
        administrator: String,
    },
}
