//! # Side Types

use crate::errors::TiltCoreError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A holder's declared direction. Serialized as its contract `uint8` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Side {
    #[default]
    None = 0,
    Up = 1,
    Down = 2,
}

impl Side {
    /// Lowercase name used in leaderboard paths and payload keys
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::None => "none",
            Side::Up => "up",
            Side::Down => "down",
        }
    }

    /// Parse a leaderboard path segment; only the two ranked sides are accepted
    pub fn from_board_name(name: &str) -> Option<Side> {
        match name {
            "up" => Some(Side::Up),
            "down" => Some(Side::Down),
            _ => None,
        }
    }

    /// Whether entries on this side appear on a leaderboard
    pub fn is_ranked(&self) -> bool {
        !matches!(self, Side::None)
    }
}

impl TryFrom<u8> for Side {
    type Error = TiltCoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Side::None),
            1 => Ok(Side::Up),
            2 => Ok(Side::Down),
            other => Err(TiltCoreError::InvalidSide(other)),
        }
    }
}

impl From<Side> for u8 {
    fn from(side: Side) -> Self {
        side as u8
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
