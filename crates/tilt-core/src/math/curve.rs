//! # Curve Math
//!
//! Replica of the contract's quadratic bonding curve. Minting the unit that
//! takes supply from `k - 1` to `k` costs `k²` wei, so a trade between two
//! supplies costs the difference of the sum-of-squares `S(n) = n(n+1)(2n+1)/6`.
//! A 1% fee, rounded up to the next wei, is added to mints and deducted from
//! burns.
//!
//! All arithmetic is checked 256-bit integer math. Nothing is converted to a
//! decimal string until [`CurveQuote::display_value`].

use crate::constants::{BPS_DENOMINATOR, FEE_BPS};
use crate::errors::{CoreResult, TiltCoreError};
use crate::math::units::format_ether;
use ethnum::U256;
use serde::{Deserialize, Serialize};

/// Direction of a trade against the curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeKind {
    Mint,
    Burn,
}

/// Fee-inclusive price of a trade, valid only against the supply it was
/// computed from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurveQuote {
    /// Direction of the trade
    pub kind: TradeKind,
    /// Units minted or burned
    pub amount: U256,
    /// Supply snapshot the quote was computed against
    pub valid_against_supply: U256,
    /// Curve value before fees, in wei
    pub gross: U256,
    /// Fee in wei (ceiling of 1% of gross)
    pub fee: U256,
    /// Amount payable (mint) or receivable (burn), in wei
    pub net: U256,
}

impl CurveQuote {
    /// Net value as an 18-decimal string
    pub fn display_value(&self) -> String {
        format_ether(self.net)
    }

    /// Whether the quote still describes the given supply
    pub fn is_valid_for(&self, supply: U256) -> bool {
        self.valid_against_supply == supply
    }
}

/// Closed-form sum of squares `1² + 2² + ... + n²`
pub fn sum_of_squares(n: U256) -> CoreResult<U256> {
    let next = n.checked_add(U256::ONE).ok_or(TiltCoreError::MathOverflow)?;
    let odd = n
        .checked_mul(U256::new(2))
        .and_then(|v| v.checked_add(U256::ONE))
        .ok_or(TiltCoreError::MathOverflow)?;

    // n(n+1)(2n+1) is always divisible by 6
    n.checked_mul(next)
        .and_then(|v| v.checked_mul(odd))
        .map(|v| v / U256::new(6))
        .ok_or(TiltCoreError::MathOverflow)
}

/// Fee on a gross curve value, rounded up to the next wei
pub fn fee_for(gross: U256) -> CoreResult<U256> {
    let scaled = gross
        .checked_mul(U256::from(FEE_BPS))
        .and_then(|v| v.checked_add(U256::from(BPS_DENOMINATOR - 1)))
        .ok_or(TiltCoreError::MathOverflow)?;
    Ok(scaled / U256::from(BPS_DENOMINATOR))
}

/// Cost of minting `amount` units at `current_supply`, fee included
pub fn estimate_mint_cost(amount: U256, current_supply: U256) -> CoreResult<CurveQuote> {
    if amount == U256::ZERO {
        return Err(TiltCoreError::InvalidAmount);
    }

    let new_supply = current_supply
        .checked_add(amount)
        .ok_or(TiltCoreError::MathOverflow)?;
    let gross = sum_of_squares(new_supply)? - sum_of_squares(current_supply)?;
    let fee = fee_for(gross)?;
    let net = gross.checked_add(fee).ok_or(TiltCoreError::MathOverflow)?;

    Ok(CurveQuote {
        kind: TradeKind::Mint,
        amount,
        valid_against_supply: current_supply,
        gross,
        fee,
        net,
    })
}

/// Refund for burning `amount` units at `current_supply`, fee deducted
pub fn estimate_burn_refund(amount: U256, current_supply: U256) -> CoreResult<CurveQuote> {
    if amount == U256::ZERO {
        return Err(TiltCoreError::InvalidAmount);
    }
    if amount > current_supply {
        return Err(TiltCoreError::InsufficientSupply {
            requested: amount,
            supply: current_supply,
        });
    }

    let gross = sum_of_squares(current_supply)? - sum_of_squares(current_supply - amount)?;
    let fee = fee_for(gross)?;
    // ceil(gross / 100) never exceeds gross
    let net = gross.saturating_sub(fee);

    Ok(CurveQuote {
        kind: TradeKind::Burn,
        amount,
        valid_against_supply: current_supply,
        gross,
        fee,
        net,
    })
}

/// Estimate either direction of trade
pub fn estimate(kind: TradeKind, amount: U256, current_supply: U256) -> CoreResult<CurveQuote> {
    match kind {
        TradeKind::Mint => estimate_mint_cost(amount, current_supply),
        TradeKind::Burn => estimate_burn_refund(amount, current_supply),
    }
}

/// Marginal price at a supply, in wei (`supply²`, or 1 wei for an empty curve)
pub fn current_price(supply: U256) -> CoreResult<U256> {
    if supply == U256::ZERO {
        return Ok(U256::ONE);
    }
    supply.checked_mul(supply).ok_or(TiltCoreError::MathOverflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_of_squares_small_values() {
        assert_eq!(sum_of_squares(U256::ZERO).unwrap(), U256::ZERO);
        assert_eq!(sum_of_squares(U256::ONE).unwrap(), U256::ONE);
        // 1 + 4 + 9 + ... + 100
        assert_eq!(sum_of_squares(U256::new(10)).unwrap(), U256::new(385));
    }

    #[test]
    fn test_sum_of_squares_overflow() {
        assert_eq!(sum_of_squares(U256::MAX), Err(TiltCoreError::MathOverflow));
    }

    #[test]
    fn test_fee_rounds_up() {
        assert_eq!(fee_for(U256::ZERO).unwrap(), U256::ZERO);
        assert_eq!(fee_for(U256::ONE).unwrap(), U256::ONE);
        assert_eq!(fee_for(U256::new(100)).unwrap(), U256::ONE);
        assert_eq!(fee_for(U256::new(101)).unwrap(), U256::new(2));
        assert_eq!(fee_for(U256::new(385)).unwrap(), U256::new(4));
    }

    #[test]
    fn test_mint_from_empty_curve() {
        let quote = estimate_mint_cost(U256::new(10), U256::ZERO).unwrap();
        assert_eq!(quote.gross, U256::new(385));
        assert_eq!(quote.fee, U256::new(4));
        assert_eq!(quote.net, U256::new(389));
        assert_eq!(quote.kind, TradeKind::Mint);
        assert!(quote.is_valid_for(U256::ZERO));
        assert!(!quote.is_valid_for(U256::new(10)));
    }

    #[test]
    fn test_zero_amount_rejected() {
        assert_eq!(
            estimate_mint_cost(U256::ZERO, U256::new(5)),
            Err(TiltCoreError::InvalidAmount)
        );
        assert_eq!(
            estimate_burn_refund(U256::ZERO, U256::new(5)),
            Err(TiltCoreError::InvalidAmount)
        );
    }

    #[test]
    fn test_burn_exceeding_supply_rejected() {
        let err = estimate_burn_refund(U256::new(6), U256::new(5)).unwrap_err();
        assert_eq!(
            err,
            TiltCoreError::InsufficientSupply {
                requested: U256::new(6),
                supply: U256::new(5),
            }
        );
    }

    #[test]
    fn test_burn_entire_supply() {
        let quote = estimate_burn_refund(U256::new(10), U256::new(10)).unwrap();
        assert_eq!(quote.gross, U256::new(385));
        assert_eq!(quote.net, U256::new(381));
    }

    #[test]
    fn test_current_price() {
        assert_eq!(current_price(U256::ZERO).unwrap(), U256::ONE);
        assert_eq!(current_price(U256::new(1_000)).unwrap(), U256::new(1_000_000));
    }

    #[test]
    fn test_display_value() {
        let quote = estimate_mint_cost(U256::new(10), U256::ZERO).unwrap();
        assert_eq!(quote.display_value(), "0.000000000000000389");
    }
}
