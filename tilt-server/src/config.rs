//! Configuration management for the sync service
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `TILT__SECTION__KEY` environment variables. The result is validated before
//! use.

use crate::core::{ServerError, ServerResult};
use crate::hub::HubSettings;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use tilt_core::constants::{DEFAULT_ACTIVITY_LIMIT, DEFAULT_LEADERBOARD_LIMIT, ZERO_ADDRESS};
use tilt_core::validate_address;
use validator::Validate;

/// Prefix of environment overrides, e.g. `TILT__API__BIND_ADDRESS`
pub const ENV_PREFIX: &str = "TILT";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ServerConfig {
    pub api: ApiConfig,
    pub chain: ChainConfig,
    pub sync: SyncConfig,
    pub farcaster: FarcasterConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ApiConfig {
    pub bind_address: String,
    pub enable_cors: bool,
    /// Outbound frames buffered per WebSocket before broadcasts skip it
    #[validate(range(min = 8, max = 65536))]
    pub queue_capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ChainConfig {
    /// Read contract state from the chain on every sampler tick
    pub enabled: bool,
    #[validate(url)]
    pub rpc_url: String,
    pub contract_address: String,
    #[validate(range(min = 1, max = 120))]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SyncConfig {
    #[validate(range(min = 1, max = 3600))]
    pub broadcast_interval_secs: u64,
    /// Activities carried by the `activities` message
    #[validate(range(min = 1, max = 100))]
    pub activity_limit: usize,
    /// Entries per side carried by the `leaderboard` message
    #[validate(range(min = 1, max = 100))]
    pub leaderboard_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct FarcasterConfig {
    /// Neynar API key; lookups are skipped without one
    pub api_key: Option<String>,
    #[validate(url)]
    pub base_url: String,
    #[validate(range(min = 1, max = 604800))]
    pub cache_ttl_secs: u64,
    #[validate(range(min = 1, max = 120))]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct MonitoringConfig {
    pub log_level: String,
    pub structured_logging: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            enable_cors: true,
            queue_capacity: 256,
        }
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            rpc_url: "https://mainnet.base.org".to_string(),
            contract_address: ZERO_ADDRESS.to_string(),
            request_timeout_secs: 10,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            broadcast_interval_secs: 10,
            activity_limit: DEFAULT_ACTIVITY_LIMIT,
            leaderboard_limit: DEFAULT_LEADERBOARD_LIMIT,
        }
    }
}

impl Default for FarcasterConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.neynar.com".to_string(),
            cache_ttl_secs: 3600,
            request_timeout_secs: 10,
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            structured_logging: false,
        }
    }
}

impl ServerConfig {
    /// Load defaults, the file at `path` if it exists, then the process
    /// environment
    pub fn load(path: Option<&Path>) -> ServerResult<Self> {
        Self::load_with_env(path, None)
    }

    /// Like `load`, reading overrides from `env` instead of the process
    /// environment when given
    pub fn load_with_env(
        path: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> ServerResult<Self> {
        let defaults = config::Config::try_from(&ServerConfig::default())?;
        let mut builder = config::Config::builder().add_source(defaults);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        let config: ServerConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, without environment overrides
    pub fn from_file(path: &Path) -> ServerResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Configuration(format!("{}: {}", path.display(), e)))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| ServerError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> ServerResult<()> {
        Validate::validate(self)?;
        self.api.validate()?;
        self.chain.validate()?;
        self.sync.validate()?;
        self.farcaster.validate()?;
        Validate::validate(&self.monitoring)?;

        if !LOG_LEVELS.contains(&self.monitoring.log_level.to_lowercase().as_str()) {
            return Err(ServerError::Configuration(format!(
                "Unknown log level: {}",
                self.monitoring.log_level
            )));
        }

        Ok(())
    }

    /// Settings for the broadcast hub
    pub fn hub_settings(&self) -> HubSettings {
        HubSettings {
            queue_capacity: self.api.queue_capacity,
            activity_limit: self.sync.activity_limit,
            leaderboard_limit: self.sync.leaderboard_limit,
        }
    }

    pub fn broadcast_interval(&self) -> Duration {
        Duration::from_secs(self.sync.broadcast_interval_secs)
    }
}

impl ApiConfig {
    pub fn validate(&self) -> ServerResult<()> {
        Validate::validate(self)?;
        self.socket_addr()?;
        Ok(())
    }

    pub fn socket_addr(&self) -> ServerResult<SocketAddr> {
        self.bind_address.parse().map_err(|_| {
            ServerError::Configuration(format!("Invalid bind address: {}", self.bind_address))
        })
    }
}

impl ChainConfig {
    pub fn validate(&self) -> ServerResult<()> {
        Validate::validate(self)?;
        if self.enabled {
            validate_address(&self.contract_address)
                .map_err(|e| ServerError::Configuration(e.to_string()))?;
            if !tilt_sdk::chain::is_contract_configured(&self.contract_address) {
                return Err(ServerError::Configuration(
                    "Chain reads are enabled but the contract address is the zero address"
                        .to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Whether the sampler should read from the chain
    pub fn is_active(&self) -> bool {
        self.enabled && tilt_sdk::chain::is_contract_configured(&self.contract_address)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl SyncConfig {
    pub fn validate(&self) -> ServerResult<()> {
        Validate::validate(self)?;
        Ok(())
    }
}

impl FarcasterConfig {
    pub fn validate(&self) -> ServerResult<()> {
        Validate::validate(self)?;
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
