//! API response types

use crate::farcaster::FarcasterUser;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tilt_core::ActivityEvent;

/// Error body for every failed request
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: i64,
}

/// Acknowledgement of a write
#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Response to `POST /api/contract/activity`
#[derive(Debug, Serialize, Deserialize)]
pub struct ActivityCreatedResponse {
    pub success: bool,
    pub activity: ActivityEvent,
}

/// Lowercase address to profile
pub type FarcasterUsersResponse = HashMap<String, FarcasterUser>;
