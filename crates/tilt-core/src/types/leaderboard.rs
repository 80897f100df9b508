//! # Leaderboard Types

use crate::math::parse_uint;
use crate::types::Side;
use ethnum::U256;
use serde::{Deserialize, Serialize};

/// A ranked holder. `rank` is always assigned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub address: String,
    pub balance: String,
    pub side: Side,
    pub rank: u32,
}

impl LeaderboardEntry {
    /// Balance as an integer; unparseable balances rank last
    pub fn balance_value(&self) -> U256 {
        parse_uint("balance", &self.balance).unwrap_or(U256::ZERO)
    }
}

/// Body of `POST /api/contract/leaderboard`. Any rank the caller sends is
/// ignored; ranks are recomputed server-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardUpdate {
    pub address: String,
    pub balance: String,
    pub side: Side,
}

/// Both ranked sides, as carried by the `leaderboard` message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaderboards {
    pub up: Vec<LeaderboardEntry>,
    pub down: Vec<LeaderboardEntry>,
}

impl Leaderboards {
    /// Entries for one side; `Side::None` has no board
    pub fn side(&self, side: Side) -> &[LeaderboardEntry] {
        match side {
            Side::Up => &self.up,
            Side::Down => &self.down,
            Side::None => &[],
        }
    }
}

/// Sort entries by balance descending and assign ranks starting at 1.
///
/// Ties are broken by address so the order is deterministic.
pub fn rank_entries(mut entries: Vec<LeaderboardEntry>) -> Vec<LeaderboardEntry> {
    entries.sort_by(|a, b| {
        b.balance_value()
            .cmp(&a.balance_value())
            .then_with(|| a.address.cmp(&b.address))
    });
    for (index, entry) in entries.iter_mut().enumerate() {
        entry.rank = index as u32 + 1;
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(address: &str, balance: &str) -> LeaderboardEntry {
        LeaderboardEntry {
            address: address.to_string(),
            balance: balance.to_string(),
            side: Side::Up,
            rank: 99,
        }
    }

    #[test]
    fn test_rank_by_integer_balance() {
        // "900" > "10000" lexically, but not numerically
        let ranked = rank_entries(vec![entry("a", "900"), entry("b", "10000"), entry("c", "5")]);
        let order: Vec<_> = ranked.iter().map(|e| (e.address.as_str(), e.rank)).collect();
        assert_eq!(order, vec![("b", 1), ("a", 2), ("c", 3)]);
    }

    #[test]
    fn test_rank_beyond_u64() {
        let huge = "340282366920938463463374607431768211456"; // 2^128
        let ranked = rank_entries(vec![entry("a", "18446744073709551616"), entry("b", huge)]);
        assert_eq!(ranked[0].address, "b");
    }

    #[test]
    fn test_leaderboards_wire_format() {
        let boards = Leaderboards {
            up: vec![entry("a", "1")],
            down: vec![],
        };
        let json = serde_json::to_value(&boards).unwrap();
        assert_eq!(json["up"][0]["side"], 1);
        assert!(json["down"].as_array().unwrap().is_empty());
    }
}
