//! # Activity Types
//!
//! Entries of the public activity feed. Each entry carries a stable `id` so
//! that a client receiving the same event twice (its own optimistic insert
//! and the server's broadcast) keeps a single copy.

use crate::errors::{CoreResult, TiltCoreError};
use crate::math::parse_uint;
use crate::types::Side;
use serde::{Deserialize, Serialize};

/// Kind of on-chain action recorded in the feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Mint,
    Burn,
    Switch,
}

/// A single feed entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub address: String,
    pub amount: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_side: Option<Side>,
}

impl ActivityEvent {
    /// Check the fields a client-supplied activity must carry
    pub fn validate(&self) -> CoreResult<()> {
        validate_address(&self.address)?;
        parse_uint("amount", &self.amount)?;
        Ok(())
    }
}

/// Body of `POST /api/contract/activity`, sent after a transaction confirms
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewActivity {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub address: String,
    pub amount: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_side: Option<Side>,
}

impl NewActivity {
    /// Stamp the request into a feed entry. Activities tied to a transaction
    /// get an id derived from its hash so repeated submissions collapse.
    pub fn into_event(self, fallback_id: String, timestamp: i64) -> ActivityEvent {
        let id = match &self.tx_hash {
            Some(hash) if !hash.is_empty() => activity_id_for_tx(hash),
            _ => fallback_id,
        };
        ActivityEvent {
            id,
            kind: self.kind,
            address: self.address,
            amount: self.amount,
            timestamp,
            tx_hash: self.tx_hash,
            new_side: self.new_side,
        }
    }
}

/// Stable feed id for an activity derived from its transaction
pub fn activity_id_for_tx(tx_hash: &str) -> String {
    format!("tx-{}", tx_hash.to_lowercase())
}

/// Accept a `0x`-prefixed 20-byte hex address
pub fn validate_address(address: &str) -> CoreResult<()> {
    let hex = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .ok_or_else(|| TiltCoreError::InvalidAddress(address.to_string()))?;
    if hex.len() != 40 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(TiltCoreError::InvalidAddress(address.to_string()));
    }
    Ok(())
}
