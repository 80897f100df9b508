//! TILT SDK
//!
//! Client-side half of the TILT companion service:
//! - Contract reads over Ethereum JSON-RPC
//! - Price quotes that prefer the contract and fall back to the curve estimator
//! - REST access to the activity feed and leaderboards
//! - A live sync client with reconnect backoff and fallback polling

pub mod api;
pub mod backoff;
pub mod chain;
pub mod config;
pub mod errors;
pub mod quote;
pub mod sync;

pub use api::ApiClient;
pub use backoff::Backoff;
pub use chain::{ChainReader, RpcChainReader};
pub use config::*;
pub use errors::*;
pub use quote::{PriceQuote, QuoteSource, QuoteTracker, Quoter};
pub use sync::{Lifecycle, SyncClient, SyncState};

// Re-export shared types and math from tilt-core
pub use tilt_core::constants::*;
pub use tilt_core::errors::*;
pub use tilt_core::math::*;
pub use tilt_core::types::*;
pub use tilt_core::U256;
