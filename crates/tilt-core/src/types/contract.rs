//! # Contract State Types

use crate::errors::CoreResult;
use crate::math::{current_price, format_ether, parse_ether, parse_uint};
use crate::types::Side;
use ethnum::U256;
use serde::{Deserialize, Serialize};

/// Snapshot of the token contract. Numeric fields are decimal strings so
/// values beyond 2^53 survive JSON clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractState {
    /// Total minted units
    pub total_supply: String,
    /// Units held by the Up side
    pub ups: String,
    /// Whether the Up side currently holds the majority
    pub is_up_only: bool,
    /// Contract balance in ether
    pub tvl: String,
    /// Marginal price in ether
    pub current_price: String,
}

impl Default for ContractState {
    fn default() -> Self {
        Self {
            total_supply: "0".to_string(),
            ups: "0".to_string(),
            is_up_only: true,
            tvl: "0".to_string(),
            current_price: "0".to_string(),
        }
    }
}

impl ContractState {
    /// Build a snapshot from raw contract reads
    pub fn from_chain(
        total_supply: U256,
        ups: U256,
        is_up_only: bool,
        balance_wei: U256,
    ) -> CoreResult<Self> {
        Ok(Self {
            total_supply: total_supply.to_string(),
            ups: ups.to_string(),
            is_up_only,
            tvl: format_ether(balance_wei),
            current_price: format_ether(current_price(total_supply)?),
        })
    }

    /// Supply snapshot as an integer
    pub fn supply(&self) -> CoreResult<U256> {
        parse_uint("totalSupply", &self.total_supply)
    }

    /// Reject snapshots whose numeric fields do not parse
    pub fn validate(&self) -> CoreResult<()> {
        parse_uint("totalSupply", &self.total_supply)?;
        parse_uint("ups", &self.ups)?;
        parse_ether("tvl", &self.tvl)?;
        parse_ether("currentPrice", &self.current_price)?;
        Ok(())
    }
}

/// A single holder's position as read from the contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserState {
    pub address: String,
    pub balance: String,
    pub side: Side,
}
