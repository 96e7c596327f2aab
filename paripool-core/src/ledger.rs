//! Escrow ledger seam and an in-memory token ledger.
//!
//! The settlement engine never moves funds itself; it drives an
//! [`EscrowLedger`], which either commits a transfer in full or rejects it
//! with a [`LedgerError`]. Markets are bound to a ledger by its string
//! identity at creation and receive the ledger object per operation.
//!
//! [`InMemoryLedger`] is the reference implementation used by the CLI and
//! the test suite: plain balances plus owner -> spender draw allowances,
//! all amounts in integer base units.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LedgerError;

/// Fungible-balance escrow held outside the settlement engine.
///
/// Both transfer operations are atomic: on error the ledger is unchanged.
/// Failures surface synchronously to the market operation that triggered
/// them; there is no asynchronous notification path.
pub trait EscrowLedger {
    /// Stable identity of this ledger instance, used to enforce the
    /// market's creation-time escrow binding.
    fn ledger_id(&self) -> &str;

    /// Draw `amount` from `from` into the escrow account `to`.
    ///
    /// Requires `from` to have authorized `to` for at least `amount`.
    fn pull(&mut self, from: &str, to: &str, amount: u128) -> std::result::Result<(), LedgerError>;

    /// Release `amount` from the escrow account `from` to `to`.
    fn push(&mut self, from: &str, to: &str, amount: u128) -> std::result::Result<(), LedgerError>;

    /// Current balance of `account`; unknown accounts hold zero.
    fn balance_of(&self, account: &str) -> u128;
}

/// In-memory token ledger with balances and draw allowances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InMemoryLedger {
    id: String,
    balances: HashMap<String, u128>,
    /// owner -> spender -> remaining authorized draw
    allowances: HashMap<String, HashMap<String, u128>>,
}

impl InMemoryLedger {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            balances: HashMap::new(),
            allowances: HashMap::new(),
        }
    }

    /// Credit `amount` to `account`, creating it if needed.
    pub fn mint(&mut self, account: &str, amount: u128) {
        let balance = self.balances.entry(account.to_string()).or_insert(0);
        *balance = balance.saturating_add(amount);
        debug!(ledger = %self.id, account, amount, "minted");
    }

    /// Authorize `spender` to pull up to `amount` from `owner`.
    /// Replaces any previous authorization for that pair.
    pub fn approve(&mut self, owner: &str, spender: &str, amount: u128) {
        self.allowances
            .entry(owner.to_string())
            .or_default()
            .insert(spender.to_string(), amount);
    }

    /// Remaining authorized draw for the (owner, spender) pair.
    pub fn allowance(&self, owner: &str, spender: &str) -> u128 {
        self.allowances
            .get(owner)
            .and_then(|spenders| spenders.get(spender))
            .copied()
            .unwrap_or(0)
    }

    fn transfer(
        &mut self,
        from: &str,
        to: &str,
        amount: u128,
    ) -> std::result::Result<(), LedgerError> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                available,
                required: amount,
            });
        }
        *self.balances.entry(from.to_string()).or_insert(0) -= amount;
        *self.balances.entry(to.to_string()).or_insert(0) += amount;
        Ok(())
    }
}

impl EscrowLedger for InMemoryLedger {
    fn ledger_id(&self) -> &str {
        &self.id
    }

    fn pull(&mut self, from: &str, to: &str, amount: u128) -> std::result::Result<(), LedgerError> {
        let allowance = self.allowance(from, to);
        if allowance < amount {
            return Err(LedgerError::InsufficientAllowance {
                allowance,
                required: amount,
            });
        }
        // Allowance check passed; the balance check inside transfer runs
        // before any mutation, so a failed pull leaves the ledger intact.
        self.transfer(from, to, amount)?;
        if let Some(spenders) = self.allowances.get_mut(from) {
            if let Some(remaining) = spenders.get_mut(to) {
                *remaining -= amount;
            }
        }
        debug!(ledger = %self.id, from, to, amount, "pulled into escrow");
        Ok(())
    }

    fn push(&mut self, from: &str, to: &str, amount: u128) -> std::result::Result<(), LedgerError> {
        self.transfer(from, to, amount)?;
        debug!(ledger = %self.id, from, to, amount, "released from escrow");
        Ok(())
    }

    fn balance_of(&self, account: &str) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mint_and_balance() {
        let mut ledger = InMemoryLedger::new("tokens");
        assert_eq!(ledger.balance_of("alice"), 0);
        ledger.mint("alice", 1_000);
        ledger.mint("alice", 500);
        assert_eq!(ledger.balance_of("alice"), 1_500);
    }

    #[test]
    fn test_pull_requires_allowance() {
        let mut ledger = InMemoryLedger::new("tokens");
        ledger.mint("alice", 1_000);

        let err = ledger.pull("alice", "market/0", 400).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientAllowance {
                allowance: 0,
                required: 400
            }
        );
        assert_eq!(ledger.balance_of("alice"), 1_000);

        ledger.approve("alice", "market/0", 400);
        ledger.pull("alice", "market/0", 400).unwrap();
        assert_eq!(ledger.balance_of("alice"), 600);
        assert_eq!(ledger.balance_of("market/0"), 400);
        assert_eq!(ledger.allowance("alice", "market/0"), 0);
    }

    #[test]
    fn test_pull_insufficient_balance_leaves_allowance() {
        let mut ledger = InMemoryLedger::new("tokens");
        ledger.mint("alice", 100);
        ledger.approve("alice", "market/0", 500);

        let err = ledger.pull("alice", "market/0", 500).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientBalance {
                available: 100,
                required: 500
            }
        );
        // Nothing moved and the authorization was not consumed.
        assert_eq!(ledger.balance_of("alice"), 100);
        assert_eq!(ledger.allowance("alice", "market/0"), 500);
    }

    #[test]
    fn test_push_checks_balance() {
        let mut ledger = InMemoryLedger::new("tokens");
        ledger.mint("market/0", 250);

        ledger.push("market/0", "bob", 200).unwrap();
        assert_eq!(ledger.balance_of("bob"), 200);

        let err = ledger.push("market/0", "bob", 100).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientBalance {
                available: 50,
                required: 100
            }
        );
        assert_eq!(ledger.balance_of("bob"), 200);
    }

    #[test]
    fn test_zero_push_always_succeeds() {
        let mut ledger = InMemoryLedger::new("tokens");
        ledger.push("market/0", "treasury", 0).unwrap();
        assert_eq!(ledger.balance_of("treasury"), 0);
    }
}
