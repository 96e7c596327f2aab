//! Fee and reward arithmetic for market settlement.
//!
//! All computation is integer fixed-point with truncation toward zero at
//! every division, and every multiplication is checked. An error here is a
//! direct loss of funds, so nothing saturates silently.

use crate::error::{MarketError, Result};
use crate::{FEE_RATE_DENOMINATOR, FEE_RATE_NUMERATOR, RATIO_SCALE};

/// Protocol fee taken from the losing pool at resolution: 25%, truncated.
pub fn protocol_fee(loser_pool: u128) -> Result<u128> {
    let scaled = loser_pool
        .checked_mul(FEE_RATE_NUMERATOR)
        .ok_or(MarketError::Overflow)?;
    Ok(scaled / FEE_RATE_DENOMINATOR)
}

/// A winner's share of the post-fee losing pool.
///
/// `ratio = stake * RATIO_SCALE / winning_pool` in 18-decimal fixed point,
/// `reward = loser_pool * ratio / RATIO_SCALE`. Truncation dust from the
/// two divisions stays in the market's escrow account.
pub fn reward_share(stake: u128, winning_pool: u128, loser_pool: u128) -> Result<u128> {
    if winning_pool == 0 {
        return Ok(0);
    }
    let ratio = stake
        .checked_mul(RATIO_SCALE)
        .ok_or(MarketError::Overflow)?
        / winning_pool;
    let reward = loser_pool.checked_mul(ratio).ok_or(MarketError::Overflow)? / RATIO_SCALE;
    Ok(reward)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fee_is_quarter_of_loser_pool() {
        assert_eq!(protocol_fee(5_000_000).unwrap(), 1_250_000);
        assert_eq!(protocol_fee(100).unwrap(), 25);
        assert_eq!(protocol_fee(0).unwrap(), 0);
    }

    #[test]
    fn test_fee_truncates_toward_zero() {
        // 25% of 3 is 0.75; integer arithmetic keeps the dust in the pool.
        assert_eq!(protocol_fee(3).unwrap(), 0);
        assert_eq!(protocol_fee(7).unwrap(), 1);
    }

    #[test]
    fn test_full_share_for_sole_winner() {
        // ratio 1.0: the sole winner takes the whole post-fee loser pool.
        assert_eq!(reward_share(5_000_000, 5_000_000, 3_750_000).unwrap(), 3_750_000);
    }

    #[test]
    fn test_proportional_split() {
        // Winners staked 2:1; loser pool of 900 splits 600/300.
        assert_eq!(reward_share(200, 300, 900).unwrap(), 600);
        assert_eq!(reward_share(100, 300, 900).unwrap(), 300);
    }

    #[test]
    fn test_truncation_dust_stays_behind() {
        // Three equal winners of a pool of 100: 33 each, 1 unit left over.
        let each = reward_share(1, 3, 100).unwrap();
        assert_eq!(each, 33);
        assert!(3 * each < 100);
    }

    #[test]
    fn test_zero_winning_pool_pays_nothing() {
        assert_eq!(reward_share(0, 0, 1_000).unwrap(), 0);
    }

    #[test]
    fn test_large_stakes_do_not_overflow() {
        // 10^20 base units on each side, well past u64 range.
        let stake = 100_000_000_000_000_000_000u128;
        let reward = reward_share(stake, stake, stake).unwrap();
        assert_eq!(reward, stake);
    }

    #[test]
    fn test_overflow_is_reported() {
        let err = reward_share(u128::MAX, 1, 1).unwrap_err();
        assert_eq!(err, MarketError::Overflow);
    }
}
