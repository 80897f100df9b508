//! Live state synchronization
//!
//! `SyncState` is the pure reducer over server messages; `SyncClient` owns
//! the push channel, its reconnect loop and the REST fallback poll.

pub mod client;
pub mod state;

pub use client::SyncClient;
pub use state::{Lifecycle, SyncState};
