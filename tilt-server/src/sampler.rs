//! Periodic state sampler
//!
//! On every tick, refreshes the stored contract state from the chain (when a
//! reader is configured) and broadcasts a full snapshot through the hub.

use crate::hub::Hub;
use std::sync::Arc;
use std::time::Duration;
use tilt_sdk::ChainReader;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub struct Sampler {
    hub: Arc<Hub>,
    chain: Option<Arc<dyn ChainReader>>,
    period: Duration,
}

impl Sampler {
    pub fn new(hub: Arc<Hub>, chain: Option<Arc<dyn ChainReader>>, period: Duration) -> Self {
        Self { hub, chain, period }
    }

    /// Run one sampling pass; returns how many connections got the snapshot
    pub async fn tick(&self) -> usize {
        self.refresh_contract_state().await;

        match self.hub.broadcast_snapshot().await {
            Ok(delivered) => delivered,
            Err(e) => {
                error!("Snapshot broadcast failed: {}", e);
                0
            }
        }
    }

    /// On a chain error the last stored state is kept
    async fn refresh_contract_state(&self) {
        let Some(chain) = &self.chain else {
            return;
        };

        match chain.contract_state().await {
            Ok(state) => {
                debug!("Sampled supply {}", state.total_supply);
                if let Err(e) = self.hub.store().set_contract_state(state).await {
                    warn!("Discarding sampled contract state: {}", e);
                }
            }
            Err(e) => warn!("Contract read failed, keeping last state: {}", e),
        }
    }

    pub async fn run(self, shutdown: CancellationToken) {
        info!("Sampler started, interval {:?}", self.period);
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }
        info!("Sampler stopped");
    }

    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
