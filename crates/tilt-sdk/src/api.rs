//! REST client for the sync service
//!
//! Request/response counterpart of the push channel. The fallback poll uses
//! it while the channel is down, and applications use it to report
//! confirmed transactions.

use crate::errors::SdkResult;
use serde::Deserialize;
use std::time::Duration;
use tilt_core::{
    ActivityEvent, ContractState, LeaderboardEntry, LeaderboardUpdate, Leaderboards, NewActivity,
    Side,
};
use tracing::debug;

/// Response of `POST /api/contract/activity`
#[derive(Debug, Deserialize)]
struct ActivityCreated {
    activity: ActivityEvent,
}

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> SdkResult<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T>(&self, path: &str) -> SdkResult<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        debug!("GET {}", path);
        let value = self
            .http
            .get(self.url(path))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(value)
    }

    /// Current contract snapshot
    pub async fn contract_state(&self) -> SdkResult<ContractState> {
        let state: ContractState = self.get("/api/contract/state").await?;
        state.validate()?;
        Ok(state)
    }

    /// Recent activities, newest first
    pub async fn activities(&self, limit: usize) -> SdkResult<Vec<ActivityEvent>> {
        self.get(&format!("/api/contract/activities?limit={}", limit))
            .await
    }

    /// One side's leaderboard
    pub async fn leaderboard(&self, side: Side, limit: usize) -> SdkResult<Vec<LeaderboardEntry>> {
        self.get(&format!("/api/contract/leaderboard/{}?limit={}", side.as_str(), limit))
            .await
    }

    /// Both leaderboards
    pub async fn leaderboards(&self, limit: usize) -> SdkResult<Leaderboards> {
        let (up, down) = tokio::try_join!(
            self.leaderboard(Side::Up, limit),
            self.leaderboard(Side::Down, limit),
        )?;
        Ok(Leaderboards { up, down })
    }

    /// Report a confirmed transaction; returns the stored feed entry
    pub async fn post_activity(&self, activity: &NewActivity) -> SdkResult<ActivityEvent> {
        let created: ActivityCreated = self
            .http
            .post(self.url("/api/contract/activity"))
            .json(activity)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(created.activity)
    }

    /// Report a holder's new balance and side
    pub async fn post_leaderboard(&self, update: &LeaderboardUpdate) -> SdkResult<()> {
        self.http
            .post(self.url("/api/contract/leaderboard"))
            .json(update)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
