//! # Unit Conversion
//!
//! Exact conversion between integer base units (wei) and fixed-point
//! decimal strings. Display values are produced by integer division so
//! large supplies never lose precision.

use crate::constants::BASE_CURRENCY_DECIMALS;
use crate::errors::{CoreResult, TiltCoreError};
use ethnum::U256;

/// Format `value` base units as a decimal string with exactly `decimals`
/// fractional digits.
///
/// When `10^decimals` exceeds the 256-bit range every value is below one
/// whole unit.
pub fn format_units(value: U256, decimals: u32) -> String {
    if decimals == 0 {
        return value.to_string();
    }

    let (whole, frac) = match U256::new(10).checked_pow(decimals) {
        Some(scale) => (value / scale, value % scale),
        None => (U256::ZERO, value),
    };
    let frac = frac.to_string();
    let padding = "0".repeat(decimals as usize - frac.len());
    format!("{}.{}{}", whole, padding, frac)
}

/// Format wei as ether with 18 fractional digits
pub fn format_ether(wei: U256) -> String {
    format_units(wei, BASE_CURRENCY_DECIMALS)
}

/// Parse a non-negative decimal-string integer such as a supply or balance
pub fn parse_uint(field: &'static str, value: &str) -> CoreResult<U256> {
    let trimmed = value.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TiltCoreError::invalid_number(field, value));
    }
    U256::from_str_radix(trimmed, 10).map_err(|_| TiltCoreError::invalid_number(field, value))
}

/// Parse a non-negative fixed-point decimal string into base units.
///
/// Fractional digits beyond `decimals` are rejected rather than rounded.
pub fn parse_units(field: &'static str, value: &str, decimals: u32) -> CoreResult<U256> {
    let trimmed = value.trim();
    let (whole, frac) = match trimmed.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (trimmed, ""),
    };

    if whole.is_empty() && frac.is_empty() {
        return Err(TiltCoreError::invalid_number(field, value));
    }
    if frac.len() > decimals as usize || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TiltCoreError::invalid_number(field, value));
    }

    let whole = if whole.is_empty() {
        U256::ZERO
    } else {
        parse_uint(field, whole).map_err(|_| TiltCoreError::invalid_number(field, value))?
    };
    let frac_padded = format!("{:0<width$}", frac, width = decimals as usize);
    let frac = if frac_padded.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(&frac_padded, 10)
            .map_err(|_| TiltCoreError::invalid_number(field, value))?
    };

    if whole == U256::ZERO {
        return Ok(frac);
    }
    U256::new(10)
        .checked_pow(decimals)
        .and_then(|scale| whole.checked_mul(scale))
        .and_then(|v| v.checked_add(frac))
        .ok_or(TiltCoreError::MathOverflow)
}

/// Parse an ether amount into wei
pub fn parse_ether(field: &'static str, value: &str) -> CoreResult<U256> {
    parse_units(field, value, BASE_CURRENCY_DECIMALS)
}
