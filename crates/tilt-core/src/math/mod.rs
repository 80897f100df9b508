//! # Mathematical Functions
//!
//! Pure bonding-curve math and fixed-point unit conversion.

pub mod curve;
pub mod units;

// Re-export commonly used functions
pub use curve::*;
pub use units::*;
