//! # Core Type Definitions
//!
//! Wire types shared by the sync service, its REST surface and clients.

pub mod activity;
pub mod contract;
pub mod leaderboard;
pub mod messages;
pub mod side;

// Re-export all types
pub use activity::*;
pub use contract::*;
pub use leaderboard::*;
pub use messages::*;
pub use side::*;
