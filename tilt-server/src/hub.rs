//! Broadcast hub
//!
//! Tracks open WebSocket connections and fans server messages out to them.
//! Each connection owns a bounded queue of pre-serialized frames drained by a
//! single writer task, so per-connection order is enqueue order. Broadcasts
//! never wait on a slow or dead peer: a full or closed queue is skipped.

use crate::core::ServerResult;
use crate::store::TiltStore;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tilt_core::constants::{CONNECTED_GREETING, DEFAULT_ACTIVITY_LIMIT, DEFAULT_LEADERBOARD_LIMIT};
use tilt_core::{ActivityEvent, ClientRequest, ServerMessage};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

pub type ConnectionId = u64;

/// A serialized server message, shared between all recipients
pub type Frame = Arc<str>;

#[derive(Debug, Clone, Copy)]
pub struct HubSettings {
    /// Frames buffered per connection
    pub queue_capacity: usize,
    /// Activities carried by each `activities` message
    pub activity_limit: usize,
    /// Entries per side carried by each `leaderboard` message
    pub leaderboard_limit: usize,
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
            activity_limit: DEFAULT_ACTIVITY_LIMIT,
            leaderboard_limit: DEFAULT_LEADERBOARD_LIMIT,
        }
    }
}

pub struct Hub {
    store: Arc<dyn TiltStore>,
    settings: HubSettings,
    connections: RwLock<HashMap<ConnectionId, mpsc::Sender<Frame>>>,
    next_id: AtomicU64,
}

impl Hub {
    pub fn new(store: Arc<dyn TiltStore>, settings: HubSettings) -> Self {
        Self {
            store,
            settings,
            connections: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn store(&self) -> &Arc<dyn TiltStore> {
        &self.store
    }

    /// Accept a new connection.
    ///
    /// The write guard is held while the snapshot is read and queued, so a
    /// broadcast either lands in the snapshot or is queued after it.
    pub async fn register(&self) -> ServerResult<(ConnectionId, mpsc::Receiver<Frame>)> {
        let (tx, rx) = mpsc::channel(self.settings.queue_capacity.max(4));
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let mut connections = self.connections.write().await;

        let mut baseline = vec![ServerMessage::Connected(CONNECTED_GREETING.to_string())];
        baseline.extend(self.snapshot().await?);
        for message in &baseline {
            let frame = encode(message)?;
            if tx.try_send(frame).is_err() {
                warn!("Connection {} could not take its baseline", id);
            }
        }

        connections.insert(id, tx);
        info!("Connection {} registered ({} open)", id, connections.len());
        Ok((id, rx))
    }

    /// Forget a connection; its writer stops once the queue drains
    pub async fn unregister(&self, id: ConnectionId) {
        let mut connections = self.connections.write().await;
        if connections.remove(&id).is_some() {
            info!("Connection {} unregistered ({} open)", id, connections.len());
        }
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Send `message` to every connection; returns how many accepted it
    pub async fn broadcast(&self, message: &ServerMessage) -> ServerResult<usize> {
        let frame = encode(message)?;
        let connections = self.connections.read().await;

        let mut delivered = 0;
        for (id, tx) in connections.iter() {
            match tx.try_send(frame.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!("Connection {} queue full, dropping {}", id, message.kind());
                }
                Err(TrySendError::Closed(_)) => {
                    debug!("Connection {} closed, skipping {}", id, message.kind());
                }
            }
        }

        debug!(
            "Broadcast {} to {}/{} connections",
            message.kind(),
            delivered,
            connections.len()
        );
        Ok(delivered)
    }

    /// Send `message` to one connection; false when it is gone or full
    pub async fn send_to(&self, id: ConnectionId, message: &ServerMessage) -> ServerResult<bool> {
        let frame = encode(message)?;
        let connections = self.connections.read().await;
        Ok(match connections.get(&id) {
            Some(tx) => tx.try_send(frame).is_ok(),
            None => false,
        })
    }

    /// Answer a client request on the connection that sent it.
    ///
    /// Payloads that do not parse are logged and ignored; the connection
    /// stays open.
    pub async fn handle_text(&self, id: ConnectionId, text: &str) -> ServerResult<()> {
        let request = match serde_json::from_str::<ClientRequest>(text) {
            Ok(request) => request,
            Err(e) => {
                warn!("Ignoring message from connection {}: {}", id, e);
                return Ok(());
            }
        };

        debug!("Connection {} requested {:?}", id, request);
        let reply = match request {
            ClientRequest::GetContractState => self.contract_state_message().await?,
            ClientRequest::GetActivities => self.activities_message().await?,
            ClientRequest::GetLeaderboard => self.leaderboard_message().await?,
        };

        if !self.send_to(id, &reply).await? {
            debug!("Connection {} gone before reply", id);
        }
        Ok(())
    }

    /// Store an activity and announce it. A repeated id is neither stored
    /// nor broadcast; returns whether it was new.
    pub async fn publish_activity(&self, activity: ActivityEvent) -> ServerResult<bool> {
        if !self.store.add_activity(activity.clone()).await? {
            return Ok(false);
        }
        self.broadcast(&ServerMessage::NewActivity(activity)).await?;
        Ok(true)
    }

    /// Broadcast contract state, activities and leaderboards
    pub async fn broadcast_snapshot(&self) -> ServerResult<usize> {
        let mut delivered = 0;
        for message in self.snapshot().await? {
            delivered = self.broadcast(&message).await?;
        }
        Ok(delivered)
    }

    pub async fn broadcast_contract_state(&self) -> ServerResult<usize> {
        let message = self.contract_state_message().await?;
        self.broadcast(&message).await
    }

    pub async fn broadcast_leaderboard(&self) -> ServerResult<usize> {
        let message = self.leaderboard_message().await?;
        self.broadcast(&message).await
    }

    async fn snapshot(&self) -> ServerResult<Vec<ServerMessage>> {
        Ok(vec![
            self.contract_state_message().await?,
            self.activities_message().await?,
            self.leaderboard_message().await?,
        ])
    }

    async fn contract_state_message(&self) -> ServerResult<ServerMessage> {
        Ok(ServerMessage::ContractState(self.store.contract_state().await?))
    }

    async fn activities_message(&self) -> ServerResult<ServerMessage> {
        let activities = self.store.activities(self.settings.activity_limit).await?;
        Ok(ServerMessage::Activities(activities))
    }

    async fn leaderboard_message(&self) -> ServerResult<ServerMessage> {
        let boards = self.store.leaderboards(self.settings.leaderboard_limit).await?;
        Ok(ServerMessage::Leaderboard(boards))
    }
}

fn encode(message: &ServerMessage) -> ServerResult<Frame> {
    Ok(Arc::from(serde_json::to_string(message)?))
}
