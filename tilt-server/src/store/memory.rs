//! In-memory store

use super::TiltStore;
use crate::core::ServerResult;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use tilt_core::constants::MAX_STORED_ACTIVITIES;
use tilt_core::{
    parse_uint, rank_entries, validate_address, ActivityEvent, ContractState, LeaderboardEntry,
    LeaderboardUpdate, Side, U256,
};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Default)]
struct Inner {
    contract_state: ContractState,
    /// Newest first
    activities: VecDeque<ActivityEvent>,
    /// Keyed by lowercase address
    holders: HashMap<String, LeaderboardEntry>,
}

/// Keeps everything in process memory; state is lost on restart
#[derive(Default)]
pub struct MemStore {
    inner: RwLock<Inner>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TiltStore for MemStore {
    async fn contract_state(&self) -> ServerResult<ContractState> {
        Ok(self.inner.read().await.contract_state.clone())
    }

    async fn set_contract_state(&self, state: ContractState) -> ServerResult<()> {
        state.validate()?;
        self.inner.write().await.contract_state = state;
        Ok(())
    }

    async fn activities(&self, limit: usize) -> ServerResult<Vec<ActivityEvent>> {
        let inner = self.inner.read().await;
        Ok(inner.activities.iter().take(limit).cloned().collect())
    }

    async fn add_activity(&self, activity: ActivityEvent) -> ServerResult<bool> {
        let mut inner = self.inner.write().await;
        if inner.activities.iter().any(|a| a.id == activity.id) {
            debug!("Activity {} already stored", activity.id);
            return Ok(false);
        }
        inner.activities.push_front(activity);
        inner.activities.truncate(MAX_STORED_ACTIVITIES);
        Ok(true)
    }

    async fn leaderboard(&self, side: Side, limit: usize) -> ServerResult<Vec<LeaderboardEntry>> {
        let inner = self.inner.read().await;
        let entries = inner
            .holders
            .values()
            .filter(|entry| entry.side == side)
            .cloned()
            .collect();
        let mut ranked = rank_entries(entries);
        ranked.truncate(limit);
        Ok(ranked)
    }

    async fn upsert_leaderboard(&self, update: LeaderboardUpdate) -> ServerResult<()> {
        validate_address(&update.address)?;
        let balance = parse_uint("balance", &update.balance)?;
        let key = update.address.to_lowercase();

        let mut inner = self.inner.write().await;
        if !update.side.is_ranked() || balance == U256::ZERO {
            if inner.holders.remove(&key).is_some() {
                debug!("Removed {} from leaderboard", key);
            }
            return Ok(());
        }

        inner.holders.insert(
            key,
            LeaderboardEntry {
                address: update.address,
                balance: balance.to_string(),
                side: update.side,
                rank: 0,
            },
        );
        Ok(())
    }
}
