//! # Core Error Types
//!
//! Typed failures of the curve estimator and the wire-type validators.

use ethnum::U256;
use thiserror::Error;

/// Errors shared by the service and its clients
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TiltCoreError {
    // ========================================================================
    // Curve Errors
    // ========================================================================
    #[error("Invalid amount: trade size must be positive")]
    InvalidAmount,

    #[error("Insufficient supply: requested {requested}, supply is {supply}")]
    InsufficientSupply { requested: U256, supply: U256 },

    #[error("Math overflow")]
    MathOverflow,

    // ========================================================================
    // Validation Errors
    // ========================================================================
    #[error("Invalid number for '{field}': {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("Invalid side: {0}")]
    InvalidSide(u8),

    #[error("Invalid address: {0:?}")]
    InvalidAddress(String),
}

impl TiltCoreError {
    /// Create an invalid number error for a named field
    pub fn invalid_number(field: &'static str, value: &str) -> Self {
        Self::InvalidNumber {
            field,
            value: value.to_string(),
        }
    }
}

/// Result type for core operations
pub type CoreResult<T> = Result<T, TiltCoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TiltCoreError::InsufficientSupply {
            requested: U256::new(10),
            supply: U256::new(3),
        };
        assert_eq!(format!("{}", err), "Insufficient supply: requested 10, supply is 3");

        let err = TiltCoreError::invalid_number("totalSupply", "12a");
        assert_eq!(format!("{}", err), "Invalid number for 'totalSupply': \"12a\"");
    }
}
