//! Lightweight contract reader
//!
//! Implements only the read calls the service and its clients need, over
//! plain Ethereum JSON-RPC (`eth_call` / `eth_getBalance`). Calldata is
//! built by hand: a keccak-256 selector followed by 32-byte words.

use crate::errors::{SdkError, SdkResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use sha3::{Digest, Keccak256};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tilt_core::constants::ZERO_ADDRESS;
use tilt_core::{validate_address, ContractState, Side, UserState, U256};
use tracing::debug;

/// Read-only view of the token contract
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Supply, Up-side supply, majority flag and contract balance
    async fn contract_state(&self) -> SdkResult<ContractState>;

    /// Balance and side of one holder
    async fn user_state(&self, address: &str) -> SdkResult<UserState>;

    /// Authoritative mint cost including the fee, in wei
    async fn mint_fees_with_fee(&self, amount: U256) -> SdkResult<U256>;

    /// Authoritative burn refund after the fee, in wei
    async fn burn_refunds_after_fee(&self, amount: U256) -> SdkResult<U256>;
}

/// Whether an address points at a deployed contract rather than the placeholder
pub fn is_contract_configured(address: &str) -> bool {
    !address.is_empty() && !address.eq_ignore_ascii_case(ZERO_ADDRESS)
}

/// JSON-RPC response wrapper
#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

/// JSON-RPC error structure
#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

/// `ChainReader` over an HTTP JSON-RPC endpoint
pub struct RpcChainReader {
    url: String,
    contract: String,
    http: reqwest::Client,
    next_id: AtomicU64,
}

impl RpcChainReader {
    pub fn new(url: impl Into<String>, contract: impl Into<String>, timeout: Duration) -> SdkResult<Self> {
        let contract = contract.into();
        validate_address(&contract)?;
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            url: url.into(),
            contract,
            http,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn contract_address(&self) -> &str {
        &self.contract
    }

    /// Make a JSON-RPC call
    async fn call<T>(&self, method: &str, params: Value) -> SdkResult<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let request_body = json!({
            "jsonrpc": "2.0",
            "id": self.next_id.fetch_add(1, Ordering::Relaxed),
            "method": method,
            "params": params
        });

        debug!("RPC call: {} with params: {}", method, request_body["params"]);

        let response: RpcResponse<T> = self
            .http
            .post(&self.url)
            .json(&request_body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(error) = response.error {
            return Err(SdkError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        response
            .result
            .ok_or_else(|| SdkError::Decode(format!("No result in {} response", method)))
    }

    /// Call a view function and return its first return word
    async fn read_word(&self, signature: &str, args: &[[u8; 32]]) -> SdkResult<[u8; 32]> {
        let params = json!([
            { "to": self.contract, "data": encode_call(signature, args) },
            "latest"
        ]);
        let raw: String = self.call("eth_call", params).await?;
        decode_word(&raw)
    }

    async fn read_uint(&self, signature: &str, args: &[[u8; 32]]) -> SdkResult<U256> {
        Ok(U256::from_be_bytes(self.read_word(signature, args).await?))
    }

    async fn read_bool(&self, signature: &str) -> SdkResult<bool> {
        let word = self.read_word(signature, &[]).await?;
        Ok(word.iter().any(|b| *b != 0))
    }

    /// Native-currency balance held by the contract, in wei
    async fn contract_balance(&self) -> SdkResult<U256> {
        let raw: String = self
            .call("eth_getBalance", json!([self.contract, "latest"]))
            .await?;
        decode_quantity(&raw)
    }
}

#[async_trait]
impl ChainReader for RpcChainReader {
    async fn contract_state(&self) -> SdkResult<ContractState> {
        let (total_supply, ups, is_up_only, balance) = tokio::try_join!(
            self.read_uint("totalSupply()", &[]),
            self.read_uint("ups()", &[]),
            self.read_bool("isUpOnly()"),
            self.contract_balance(),
        )?;

        Ok(ContractState::from_chain(total_supply, ups, is_up_only, balance)?)
    }

    async fn user_state(&self, address: &str) -> SdkResult<UserState> {
        let args = [encode_address(address)?];
        let (balance, side) = tokio::try_join!(
            self.read_uint("balanceOf(address)", &args),
            self.read_uint("sides(address)", &args),
        )?;

        Ok(UserState {
            address: address.to_string(),
            balance: balance.to_string(),
            side: decode_side(side)?,
        })
    }

    async fn mint_fees_with_fee(&self, amount: U256) -> SdkResult<U256> {
        self.read_uint("mintFeesWithFee(uint256)", &[encode_uint(amount)])
            .await
    }

    async fn burn_refunds_after_fee(&self, amount: U256) -> SdkResult<U256> {
        self.read_uint("burnRefundsAfterFee(uint256)", &[encode_uint(amount)])
            .await
    }
}

// ============================================================================
// ABI helpers
// ============================================================================

/// Decode a `sides(address)` word; anything above 255 is malformed
pub fn decode_side(word: U256) -> SdkResult<Side> {
    if word > U256::from(u8::MAX) {
        return Err(SdkError::Decode(format!("side out of range: {}", word)));
    }
    Ok(Side::try_from(word.as_u8())?)
}

/// First four bytes of the keccak-256 of a function signature
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = Keccak256::digest(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// `0x`-prefixed calldata for a call with static arguments
pub fn encode_call(signature: &str, args: &[[u8; 32]]) -> String {
    let mut data = Vec::with_capacity(4 + 32 * args.len());
    data.extend_from_slice(&selector(signature));
    for word in args {
        data.extend_from_slice(word);
    }
    format!("0x{}", hex::encode(data))
}

pub fn encode_uint(value: U256) -> [u8; 32] {
    value.to_be_bytes()
}

/// Left-pad a 20-byte address into an ABI word
pub fn encode_address(address: &str) -> SdkResult<[u8; 32]> {
    validate_address(address)?;
    let bytes = hex::decode(&address[2..])?;
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(&bytes);
    Ok(word)
}

/// First 32-byte word of hex-encoded return data
pub fn decode_word(raw: &str) -> SdkResult<[u8; 32]> {
    let bytes = hex::decode(strip_hex_prefix(raw))?;
    if bytes.len() < 32 {
        return Err(SdkError::Decode(format!(
            "return data too short: {} bytes",
            bytes.len()
        )));
    }
    let mut word = [0u8; 32];
    word.copy_from_slice(&bytes[..32]);
    Ok(word)
}

/// Hex quantity such as `0x1bc16d674ec80000`
pub fn decode_quantity(raw: &str) -> SdkResult<U256> {
    let digits = strip_hex_prefix(raw);
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 16)
        .map_err(|e| SdkError::Decode(format!("invalid quantity {:?}: {}", raw, e)))
}

fn strip_hex_prefix(raw: &str) -> &str {
    raw.strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .unwrap_or(raw)
}
