//! # Paripool Core
//!
//! Core Rust library for pooled-wager pari-mutuel settlement.
//!
//! This library provides the settlement engine for binary wager markets
//! where:
//! - Deposits are escrowed into one of two competing outcome pools
//! - A single administrator declaration settles the market
//! - A fixed 25% protocol fee is taken from the losing pool at resolution
//! - Winners claim their stake plus a proportional share of the losing pool
//!
//! ## Features
//!
//! - **Market Registry**: Sequential-id creation and tracking of markets
//! - **Escrow Seam**: Pluggable [`EscrowLedger`] for fund custody
//! - **Settlement Arithmetic**: 18-decimal fixed-point share computation
//! - **Emergency Recovery**: Registry-gated sweep of a market's escrow
//!
//! ## Examples
//!
//! ```rust
//! use paripool_core::{InMemoryLedger, MarketRegistry};
//!
//! let mut ledger = InMemoryLedger::new("tokens");
//! let mut registry = MarketRegistry::new("registry", "admin");
//! let id = registry.create_market("admin", "tokens")?;
//!
//! // Fund a participant and authorize the market's escrow account.
//! ledger.mint("alice", 10_000_000);
//! let account = registry.market(id)?.account().to_string();
//! ledger.approve("alice", &account, 10_000_000);
//!
//! // Bet 5 units on team 1.
//! registry
//!     .market_mut(id)?
//!     .place_bet(&mut ledger, "alice", 1, 5_000_000)?;
//! # Ok::<(), paripool_core::MarketError>(())
//! ```

pub mod error;
pub mod events;
pub mod ledger;
pub mod market;
pub mod math;
pub mod registry;
pub mod test_utils;

pub use error::{LedgerError, MarketError, Result};
pub use events::MarketEvent;
pub use ledger::{EscrowLedger, InMemoryLedger};
pub use market::{Bet, Market, Side};
pub use registry::MarketRegistry;

/// Protocol fee rate applied to the losing pool at resolution: 25%.
pub const FEE_RATE_NUMERATOR: u128 = 25;
pub const FEE_RATE_DENOMINATOR: u128 = 100;

/// 18-decimal fixed-point scale for stake-share ratios.
pub const RATIO_SCALE: u128 = 1_000_000_000_000_000_000;

/// Registry capacity. The id counter is a u16 whose natural range holds
/// 65,536 values; capacity is pinned at 65,535 markets, so id 65,535 is
/// never assigned.
pub const MAX_MARKETS: u16 = 65_535;
