//! Persistence seam for contract state, activity and leaderboards

mod memory;

pub use memory::MemStore;

use crate::core::ServerResult;
use async_trait::async_trait;
use tilt_core::{ActivityEvent, ContractState, LeaderboardEntry, LeaderboardUpdate, Leaderboards, Side};

/// Storage port for the sync service
#[async_trait]
pub trait TiltStore: Send + Sync {
    /// Last known contract snapshot
    async fn contract_state(&self) -> ServerResult<ContractState>;

    /// Replace the contract snapshot
    async fn set_contract_state(&self, state: ContractState) -> ServerResult<()>;

    /// Newest-first activities, at most `limit`
    async fn activities(&self, limit: usize) -> ServerResult<Vec<ActivityEvent>>;

    /// Store an activity; false when its id is already present
    async fn add_activity(&self, activity: ActivityEvent) -> ServerResult<bool>;

    /// Ranked entries of one side, at most `limit`
    async fn leaderboard(&self, side: Side, limit: usize) -> ServerResult<Vec<LeaderboardEntry>>;

    /// Insert or replace the entry for an address (case-insensitive)
    async fn upsert_leaderboard(&self, update: LeaderboardUpdate) -> ServerResult<()>;

    /// Both sides
    async fn leaderboards(&self, limit: usize) -> ServerResult<Leaderboards> {
        Ok(Leaderboards {
            up: self.leaderboard(Side::Up, limit).await?,
            down: self.leaderboard(Side::Down, limit).await?,
        })
    }
}
