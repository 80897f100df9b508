//! # Push Channel Messages
//!
//! Every frame is one JSON object. Server frames are `{"type", "data"}`;
//! client requests carry only a `type`. Each server message is a full
//! snapshot or an id-deduplicated event, never a delta, so a client that
//! reconnects recovers from the next baseline alone.

use crate::types::{ActivityEvent, ContractState, Leaderboards};
use serde::{Deserialize, Serialize};

/// Server to client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Acknowledgement sent first on every new connection
    Connected(String),
    ContractState(ContractState),
    /// Recent activity, newest first
    Activities(Vec<ActivityEvent>),
    NewActivity(ActivityEvent),
    Leaderboard(Leaderboards),
}

impl ServerMessage {
    /// Wire discriminant, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::Connected(_) => "connected",
            ServerMessage::ContractState(_) => "contract_state",
            ServerMessage::Activities(_) => "activities",
            ServerMessage::NewActivity(_) => "new_activity",
            ServerMessage::Leaderboard(_) => "leaderboard",
        }
    }
}

/// Client to server. Each asks for an immediate reply to the sender only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientRequest {
    GetContractState,
    GetActivities,
    GetLeaderboard,
}
