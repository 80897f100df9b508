//! # Protocol Constants
//!
//! Values mirrored from the TILT contract plus the display and retention
//! limits shared by the service and its clients.

// ============================================================================
// Curve Constants
// ============================================================================

/// Fee charged on both mint and burn, in basis points (1%)
pub const FEE_BPS: u64 = 100;

/// Basis points denominator (10,000 = 100%)
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Decimals of the chain's base currency (wei -> ether)
pub const BASE_CURRENCY_DECIMALS: u32 = 18;

/// Zero address, used as the "no contract configured" marker
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

// ============================================================================
// Retention and Page Limits
// ============================================================================

/// Activities retained server-side, newest first
pub const MAX_STORED_ACTIVITIES: usize = 100;

/// Activities retained in a client's local feed
pub const MAX_CLIENT_ACTIVITIES: usize = 50;

/// Default page size for activity reads
pub const DEFAULT_ACTIVITY_LIMIT: usize = 20;

/// Default page size for leaderboard reads
pub const DEFAULT_LEADERBOARD_LIMIT: usize = 10;

/// Largest page either read will return
pub const MAX_PAGE_LIMIT: usize = 100;

// ============================================================================
// Push Channel
// ============================================================================

/// Informational payload of the `connected` acknowledgement
pub const CONNECTED_GREETING: &str = "Connected to TILT WebSocket server";
