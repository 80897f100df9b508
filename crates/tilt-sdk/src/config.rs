use crate::errors::{SdkError, SdkResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tilt_core::constants::ZERO_ADDRESS;

/// Client configuration, loadable from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Push channel endpoint
    pub ws_url: String,

    /// Base URL of the REST API used by the fallback poll
    pub api_url: String,

    /// JSON-RPC endpoint for direct contract reads
    pub rpc_url: Option<String>,

    /// Token contract; the zero address disables contract reads
    pub contract_address: String,

    /// Reconnect configuration
    pub reconnect: ReconnectConfig,

    /// Interval of the REST poll that runs while the channel is down (seconds)
    pub fallback_poll_secs: u64,

    /// Timeout for REST and RPC requests (seconds)
    pub request_timeout_secs: u64,
}

/// What to do once `max_attempts` consecutive reconnects have failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconnectPolicy {
    /// Stop scheduling reconnects; the fallback poll keeps data fresh
    StopAfterMax,
    /// Keep retrying at the capped delay
    RetryForever,
}

/// Reconnect configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReconnectConfig {
    /// Base delay between reconnects in milliseconds
    pub base_delay_ms: u64,

    /// Maximum delay between reconnects in milliseconds
    pub max_delay_ms: u64,

    /// Consecutive failures before the policy applies
    pub max_attempts: u32,

    /// Behavior after `max_attempts`
    pub policy: ReconnectPolicy,
}

impl ClientConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> SdkResult<Self> {
        let config: ClientConfig = toml::from_str(content)
            .map_err(|e| SdkError::Configuration(format!("Failed to parse client config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> SdkResult<()> {
        if !self.ws_url.starts_with("ws://") && !self.ws_url.starts_with("wss://") {
            return Err(SdkError::Configuration(format!(
                "ws_url must use ws:// or wss://, got {}",
                self.ws_url
            )));
        }

        if self.api_url.is_empty() {
            return Err(SdkError::Configuration("api_url cannot be empty".to_string()));
        }

        if self.fallback_poll_secs == 0 {
            return Err(SdkError::Configuration(
                "fallback_poll_secs must be greater than 0".to_string(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(SdkError::Configuration(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }

        self.reconnect.validate()
    }

    /// Whether contract reads should be attempted at all
    pub fn is_contract_configured(&self) -> bool {
        self.rpc_url.is_some() && crate::chain::is_contract_configured(&self.contract_address)
    }

    pub fn fallback_poll_interval(&self) -> Duration {
        Duration::from_secs(self.fallback_poll_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl ReconnectConfig {
    /// Validate reconnect configuration
    pub fn validate(&self) -> SdkResult<()> {
        if self.base_delay_ms == 0 {
            return Err(SdkError::Configuration(
                "base_delay_ms must be greater than 0".to_string(),
            ));
        }

        if self.max_delay_ms < self.base_delay_ms {
            return Err(SdkError::Configuration(format!(
                "max_delay_ms ({}) must be at least base_delay_ms ({})",
                self.max_delay_ms, self.base_delay_ms
            )));
        }

        if self.max_attempts == 0 {
            return Err(SdkError::Configuration(
                "max_attempts must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Delay before reconnect number `attempt` (1-based): `min(base * 2^attempt, cap)`
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let delay = self.base_delay_ms.saturating_mul(factor).min(self.max_delay_ms);
        Duration::from_millis(delay)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            ws_url: "ws://127.0.0.1:8080/ws".to_string(),
            api_url: "http://127.0.0.1:8080".to_string(),
            rpc_url: None,
            contract_address: ZERO_ADDRESS.to_string(),
            reconnect: ReconnectConfig::default(),
            fallback_poll_secs: 60,
            request_timeout_secs: 10,
        }
    }
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 1_000,
            max_delay_ms: 30_000,
            max_attempts: 5,
            policy: ReconnectPolicy::StopAfterMax,
        }
    }
}
