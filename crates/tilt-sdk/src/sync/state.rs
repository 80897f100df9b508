use serde::{Deserialize, Serialize};
use tilt_core::constants::MAX_CLIENT_ACTIVITIES;
use tilt_core::{ActivityEvent, ContractState, Leaderboards, ServerMessage, U256};
use tracing::{debug, warn};

/// Push channel lifecycle as seen by the client
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Last known view of the service
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncState {
    pub contract_state: Option<ContractState>,
    /// Newest first, at most `MAX_CLIENT_ACTIVITIES`
    pub activities: Vec<ActivityEvent>,
    pub leaderboards: Leaderboards,
    pub lifecycle: Lifecycle,
    /// Consecutive failed reconnects; zero while connected
    pub reconnect_attempt: u32,
}

impl SyncState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one server message. Returns false when the message was rejected.
    pub fn apply(&mut self, message: ServerMessage) -> bool {
        debug!("Applying {} message", message.kind());
        match message {
            ServerMessage::Connected(greeting) => {
                debug!("Server greeting: {}", greeting);
                true
            }
            ServerMessage::ContractState(state) => self.set_contract_state(state),
            ServerMessage::Activities(mut activities) => {
                activities.truncate(MAX_CLIENT_ACTIVITIES);
                self.activities = activities;
                true
            }
            ServerMessage::NewActivity(activity) => self.record_activity(activity),
            ServerMessage::Leaderboard(leaderboards) => {
                self.leaderboards = leaderboards;
                true
            }
        }
    }

    /// Parse and apply a raw text frame; malformed frames are logged and ignored
    pub fn apply_text(&mut self, text: &str) -> bool {
        match serde_json::from_str::<ServerMessage>(text) {
            Ok(message) => self.apply(message),
            Err(e) => {
                warn!("Ignoring unrecognized server frame: {}", e);
                false
            }
        }
    }

    /// Replace the contract snapshot if its numeric fields parse
    pub fn set_contract_state(&mut self, state: ContractState) -> bool {
        if let Err(e) = state.validate() {
            warn!("Rejecting contract state: {}", e);
            return false;
        }
        self.contract_state = Some(state);
        true
    }

    /// Prepend an activity unless its id is already present
    pub fn record_activity(&mut self, activity: ActivityEvent) -> bool {
        if self.activities.iter().any(|a| a.id == activity.id) {
            debug!("Skipping duplicate activity {}", activity.id);
            return false;
        }
        self.activities.insert(0, activity);
        self.activities.truncate(MAX_CLIENT_ACTIVITIES);
        true
    }

    /// Supply from the last accepted contract state
    pub fn supply_snapshot(&self) -> Option<U256> {
        self.contract_state.as_ref().and_then(|s| s.supply().ok())
    }

    pub fn is_connected(&self) -> bool {
        self.lifecycle == Lifecycle::Connected
    }
}
