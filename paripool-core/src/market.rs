//! # Market settlement state machine
//!
//! One [`Market`] per wager event. Deposits are escrowed into one of two
//! outcome pools; a single administrator declaration settles the market and
//! routes a 25% fee from the losing pool to the treasury; winners then claim
//! their stake plus a proportional share of the post-fee losing pool.
//!
//! Every operation follows the same transaction shape: validate all
//! preconditions, perform the external escrow transfer, and only then mutate
//! internal state. A rejected transfer therefore leaves every field exactly
//! as it was, and `&mut self` exclusivity keeps each market single-writer.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{MarketError, Result};
use crate::events::MarketEvent;
use crate::ledger::EscrowLedger;
use crate::math;

/// One of the two outcome sides of a binary market.
///
/// The wire numerals are 1 for side A and 2 for side B; anything else is
/// rejected as an invalid team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    /// Parse the wire numeral for a side.
    pub fn from_team(team: u8) -> Result<Self> {
        match team {
            1 => Ok(Side::A),
            2 => Ok(Side::B),
            _ => Err(MarketError::InvalidTeam),
        }
    }

    /// Wire numeral of this side.
    pub fn team(self) -> u8 {
        match self {
            Side::A => 1,
            Side::B => 2,
        }
    }

    pub fn other(self) -> Self {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::A => write!(f, "A"),
            Side::B => write!(f, "B"),
        }
    }
}

/// A participant's recorded stake. `amount == 0` means no live stake:
/// either never bet, or already claimed. Zeroed records are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bet {
    pub amount: u128,
    pub side: Side,
}

/// A binary pooled-wager market bound to one escrow ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    /// Registry-assigned id, stable for the market's lifetime.
    id: u16,

    /// This market's own account in the escrow ledger; deposits are pulled
    /// into it and payouts pushed out of it.
    account: String,

    /// Identity of the bound escrow ledger; immutable after creation.
    escrow: String,

    /// Identity permitted to pause, unpause, and declare the result.
    administrator: String,

    /// Recipient of the protocol fee; fixed at creation.
    treasury: String,

    /// Identity of the owning registry, authorized for emergency recovery.
    /// A lookup key only, never a handle.
    registry: String,

    /// Escrowed total per side. Each only grows during betting; the losing
    /// one shrinks exactly once, by the fee, at resolution.
    pool_a: u128,
    pool_b: u128,

    /// Winning side once declared. Monotonic: never unset, never changed.
    outcome: Option<Side>,

    /// Gates betting only; resolution and claims ignore it.
    paused: bool,

    bets: HashMap<String, Bet>,

    events: Vec<MarketEvent>,

    created_at: u64,
    resolved_at: Option<u64>,
}

impl Market {
    pub(crate) fn new(id: u16, escrow: &str, administrator: &str, registry: &str) -> Self {
        Self {
            id,
            account: format!("market/{id}"),
            escrow: escrow.to_string(),
            administrator: administrator.to_string(),
            treasury: administrator.to_string(),
            registry: registry.to_string(),
            pool_a: 0,
            pool_b: 0,
            outcome: None,
            paused: false,
            bets: HashMap::new(),
            events: Vec::new(),
            created_at: unix_now(),
            resolved_at: None,
        }
    }

    /// Escrow `amount` from `participant` on the given team.
    ///
    /// Only allowed while the market is open: undecided and not paused.
    /// Returns the new pool total for that side.
    pub fn place_bet(
        &mut self,
        ledger: &mut dyn EscrowLedger,
        participant: &str,
        team: u8,
        amount: u128,
    ) -> Result<u128> {
        self.check_ledger(ledger)?;
        if self.outcome.is_some() || self.paused {
            return Err(MarketError::BettingClosed);
        }
        let side = Side::from_team(team)?;
        if self.bets.get(participant).is_some_and(|bet| bet.amount > 0) {
            return Err(MarketError::AlreadyBet);
        }

        // Stage the pool update before the external call so an overflow
        // cannot surface after funds have moved.
        let pool = match side {
            Side::A => self.pool_a,
            Side::B => self.pool_b,
        };
        let new_pool = pool.checked_add(amount).ok_or(MarketError::Overflow)?;

        ledger.pull(participant, &self.account, amount)?;

        match side {
            Side::A => self.pool_a = new_pool,
            Side::B => self.pool_b = new_pool,
        }
        self.bets
            .insert(participant.to_string(), Bet { amount, side });
        self.events.push(MarketEvent::BetPlaced {
            participant: participant.to_string(),
            side,
            amount,
        });
        debug!(market = self.id, participant, %side, amount, "bet placed");
        Ok(new_pool)
    }

    /// Declare the winning team and route the fee to the treasury.
    ///
    /// Administrator-only; allowed while undecided regardless of `paused`.
    /// One-shot and terminal: no operation returns from the resolved state.
    pub fn declare_result(
        &mut self,
        ledger: &mut dyn EscrowLedger,
        caller: &str,
        team: u8,
    ) -> Result<()> {
        self.check_ledger(ledger)?;
        self.require_admin(caller)?;
        let winner = Side::from_team(team)?;
        if self.outcome.is_some() {
            return Err(MarketError::ResultAlreadyDeclared);
        }

        let loser = winner.other();
        let loser_pool = match loser {
            Side::A => self.pool_a,
            Side::B => self.pool_b,
        };
        let fee = math::protocol_fee(loser_pool)?;

        // If the treasury push fails the declaration fails whole: the
        // outcome stays undecided and both pools keep their totals.
        ledger.push(&self.account, &self.treasury, fee)?;

        match loser {
            Side::A => self.pool_a -= fee,
            Side::B => self.pool_b -= fee,
        }
        self.outcome = Some(winner);
        self.resolved_at = Some(unix_now());
        self.events
            .push(MarketEvent::ResultDeclared { winning_side: winner });
        info!(market = self.id, winner = %winner, fee, "result declared");
        Ok(())
    }

    /// Pay out a winner: their stake plus a proportional share of the
    /// post-fee losing pool.
    ///
    /// Pool accumulators are never decremented by claims, so the payout is
    /// independent of the order in which winners claim; integer truncation
    /// dust remains in the market account.
    pub fn claim_reward(
        &mut self,
        ledger: &mut dyn EscrowLedger,
        participant: &str,
    ) -> Result<u128> {
        self.check_ledger(ledger)?;
        let winner = self.outcome.ok_or(MarketError::MatchNotDecided)?;
        let Some(bet) = self.bets.get(participant) else {
            return Err(MarketError::NoStake);
        };
        if bet.side != winner {
            return Err(MarketError::IncorrectTeam);
        }
        if bet.amount == 0 {
            return Err(MarketError::NoStake);
        }

        let (winning_pool, loser_pool) = match winner {
            Side::A => (self.pool_a, self.pool_b),
            Side::B => (self.pool_b, self.pool_a),
        };
        let stake = bet.amount;
        let reward = math::reward_share(stake, winning_pool, loser_pool)?;
        let payout = stake.checked_add(reward).ok_or(MarketError::Overflow)?;

        // A failed push leaves the stake intact so the claim can be retried.
        ledger.push(&self.account, participant, payout)?;

        if let Some(bet) = self.bets.get_mut(participant) {
            bet.amount = 0;
        }
        self.events.push(MarketEvent::RewardClaimed {
            participant: participant.to_string(),
            payout,
        });
        info!(market = self.id, participant, payout, "reward claimed");
        Ok(payout)
    }

    /// Suspend betting. Resolution and claims are unaffected.
    pub fn pause(&mut self, caller: &str) -> Result<()> {
        self.require_admin(caller)?;
        self.paused = true;
        self.events.push(MarketEvent::Paused {
            administrator: caller.to_string(),
        });
        info!(market = self.id, "paused");
        Ok(())
    }

    /// Reopen betting after a pause.
    pub fn unpause(&mut self, caller: &str) -> Result<()> {
        self.require_admin(caller)?;
        self.paused = false;
        self.events.push(MarketEvent::Unpaused {
            administrator: caller.to_string(),
        });
        info!(market = self.id, "unpaused");
        Ok(())
    }

    /// Sweep the market's entire escrow balance to the administrator.
    ///
    /// Callable only by the bound registry identity. This bypasses all
    /// pool and bet accounting and leaves it stale relative to the actual
    /// escrowed funds; it is a crisis escape hatch, not an exit path.
    pub fn emergency_withdraw(
        &mut self,
        ledger: &mut dyn EscrowLedger,
        caller: &str,
    ) -> Result<u128> {
        self.check_ledger(ledger)?;
        if caller != self.registry {
            return Err(MarketError::NotRegistry);
        }
        let balance = ledger.balance_of(&self.account);
        ledger.push(&self.account, &self.administrator, balance)?;
        warn!(market = self.id, swept = balance, "emergency withdrawal");
        Ok(balance)
    }

    fn require_admin(&self, caller: &str) -> Result<()> {
        if caller != self.administrator {
            return Err(MarketError::NotOwner);
        }
        Ok(())
    }

    fn check_ledger(&self, ledger: &dyn EscrowLedger) -> Result<()> {
        if ledger.ledger_id() != self.escrow {
            return Err(MarketError::LedgerMismatch {
                expected: self.escrow.clone(),
                actual: ledger.ledger_id().to_string(),
            });
        }
        Ok(())
    }

    pub fn id(&self) -> u16 {
        self.id
    }

    /// The market's own escrow account identity.
    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn escrow(&self) -> &str {
        &self.escrow
    }

    pub fn administrator(&self) -> &str {
        &self.administrator
    }

    pub fn treasury(&self) -> &str {
        &self.treasury
    }

    pub fn pool_a(&self) -> u128 {
        self.pool_a
    }

    pub fn pool_b(&self) -> u128 {
        self.pool_b
    }

    pub fn total_pool(&self) -> u128 {
        self.pool_a.saturating_add(self.pool_b)
    }

    pub fn outcome(&self) -> Option<Side> {
        self.outcome
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn bet_of(&self, participant: &str) -> Option<&Bet> {
        self.bets.get(participant)
    }

    pub fn events(&self) -> &[MarketEvent] {
        &self.events
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    pub fn resolved_at(&self) -> Option<u64> {
        self.resolved_at
    }

    /// Human-readable status summary.
    pub fn status(&self) -> String {
        match self.outcome {
            Some(side) => format!("Resolved - Team {side} won"),
            None if self.paused => "Paused - Betting suspended".to_string(),
            None => "Open - Accepting bets".to_string(),
        }
    }
}

fn unix_now() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

/// Format a unix timestamp as a human-readable UTC string.
pub fn format_timestamp(timestamp: u64) -> String {
    let dt = DateTime::from_timestamp(timestamp as i64, 0).unwrap_or_default();
    dt.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}
