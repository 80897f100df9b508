//! # TILT Core - Shared Curve Logic
//!
//! This crate contains the types and math shared between the TILT sync
//! service and its clients. It provides:
//!
//! - The quadratic bonding-curve estimator (mint cost / burn refund, 1% fee)
//! - Fixed-point unit formatting for wei amounts
//! - Wire types for contract state, activity, leaderboards and the push channel
//!
//! Everything here is pure: no I/O and no shared state.

pub mod constants;
pub mod errors;
pub mod math;
pub mod types;

// Re-export commonly used items
pub use constants::*;
pub use errors::{CoreResult, TiltCoreError};
pub use ethnum::U256;
pub use math::*;
pub use types::*;
