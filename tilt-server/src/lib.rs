//! TILT Sync Service
//!
//! Keeps every connected client on the same view of the TILT contract:
//! a periodic sampler reads the chain, a hub fans typed messages out over
//! WebSocket, and a small REST API accepts activity and leaderboard updates.

pub mod api;
pub mod config;
pub mod core;
pub mod farcaster;
pub mod hub;
pub mod sampler;
pub mod store;

pub use config::ServerConfig;
pub use core::{ServerError, ServerResult};
pub use hub::{ConnectionId, Hub, HubSettings};
pub use sampler::Sampler;
pub use store::{MemStore, TiltStore};
