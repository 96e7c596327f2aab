//! Error types for paripool-core

use thiserror::Error;

/// Result type alias for settlement operations
pub type Result<T> = std::result::Result<T, MarketError>;

/// Failures surfaced by an [`crate::ledger::EscrowLedger`] transfer.
///
/// These convert into [`MarketError::TransferFailed`]; that is the only
/// error class a caller can meaningfully retry, after fixing the underlying
/// balance or authorization.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Source account does not hold enough funds for the transfer.
    #[error("insufficient balance: {available} < {required}")]
    InsufficientBalance { available: u128, required: u128 },

    /// Owner has not authorized the escrow account to draw this much.
    #[error("insufficient allowance: {allowance} < {required}")]
    InsufficientAllowance { allowance: u128, required: u128 },
}

/// Error types for market and registry operations.
///
/// Display strings for the betting surface are part of the compatibility
/// contract with existing callers and must not be reworded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarketError {
    /// Administrator-gated operation invoked by another identity.
    #[error("caller is not the owner")]
    NotOwner,

    /// Emergency recovery invoked by anyone other than the bound registry.
    #[error("caller is not the registry")]
    NotRegistry,

    /// Side numeral outside the two valid teams.
    #[error("Invalid team")]
    InvalidTeam,

    /// A live stake already exists for this participant. One bet per
    /// participant per market, regardless of side or size.
    #[error("User already bet")]
    AlreadyBet,

    /// Betting rejected because the market is paused or already resolved.
    #[error("Betting is closed")]
    BettingClosed,

    /// Second result declaration on a resolved market.
    #[error("Result already declared")]
    ResultAlreadyDeclared,

    /// Claim attempted before a result was declared.
    #[error("Match not decided")]
    MatchNotDecided,

    /// Claim by a participant who bet on the losing side.
    #[error("Incorrect team")]
    IncorrectTeam,

    /// Recorded stake is zero. Covers both "never bet" and "already
    /// claimed"; the message deliberately does not distinguish the two.
    #[error("No bet placed or reward already claimed")]
    NoStake,

    /// The escrow ledger rejected a pull or push. No state was mutated;
    /// the operation is safe to retry once the cause is corrected.
    #[error("transfer failed: {0}")]
    TransferFailed(#[from] LedgerError),

    /// Registry lookup for an id that was never assigned.
    #[error("market {0} not found")]
    MarketNotFound(u16),

    /// The registry id counter reached its fixed maximum.
    #[error("market capacity exceeded")]
    CapacityExceeded,

    /// Checked settlement arithmetic exhausted the accumulator width.
    #[error("arithmetic overflow in settlement computation")]
    Overflow,

    /// Operation was handed a ledger other than the one this market was
    /// bound to at creation.
    #[error("ledger {actual} does not match escrow binding {expected}")]
    LedgerMismatch { expected: String, actual: String },
}
