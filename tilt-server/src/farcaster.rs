//! Farcaster username resolution
//!
//! Maps wallet addresses to Farcaster profiles through Neynar's bulk lookup.
//! Results, misses included, are cached per lowercase address.

use crate::config::FarcasterConfig;
use crate::core::{ServerError, ServerResult};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Addresses per upstream request
const LOOKUP_BATCH: usize = 350;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarcasterUser {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pfp_url: Option<String>,
}

#[async_trait]
pub trait UsernameResolver: Send + Sync {
    /// Profiles keyed by lowercase address; unknown addresses are absent
    async fn resolve(&self, addresses: &[String]) -> ServerResult<HashMap<String, FarcasterUser>>;
}

/// Profile shape in Neynar responses
#[derive(Debug, Deserialize)]
struct NeynarUser {
    username: String,
    pfp_url: Option<String>,
}

struct CacheEntry {
    user: Option<FarcasterUser>,
    fetched_at: Instant,
}

pub struct NeynarResolver {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    ttl: Duration,
    cache: RwLock<HashMap<String, CacheEntry>>,
}

impl NeynarResolver {
    pub fn new(config: &FarcasterConfig) -> ServerResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            ttl: config.cache_ttl(),
            cache: RwLock::new(HashMap::new()),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch(&self, api_key: &str, addresses: &[String]) -> ServerResult<HashMap<String, FarcasterUser>> {
        let url = format!("{}/v2/farcaster/user/bulk-by-address", self.base_url);
        let response = self
            .http
            .get(url)
            .header("x-api-key", api_key)
            .query(&[("addresses", addresses.join(","))])
            .send()
            .await?;

        // Neynar answers 404 when none of the addresses has a profile
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(HashMap::new());
        }
        if !response.status().is_success() {
            return Err(ServerError::Upstream(format!(
                "Neynar lookup returned {}",
                response.status()
            )));
        }

        let body: HashMap<String, Vec<NeynarUser>> = response.json().await?;
        Ok(body
            .into_iter()
            .filter_map(|(address, users)| {
                users.into_iter().next().map(|user| {
                    (
                        address.to_lowercase(),
                        FarcasterUser {
                            username: user.username,
                            pfp_url: user.pfp_url,
                        },
                    )
                })
            })
            .collect())
    }
}

#[async_trait]
impl UsernameResolver for NeynarResolver {
    async fn resolve(&self, addresses: &[String]) -> ServerResult<HashMap<String, FarcasterUser>> {
        let Some(api_key) = &self.api_key else {
            return Ok(HashMap::new());
        };

        let mut wanted: Vec<String> = addresses
            .iter()
            .map(|a| a.trim().to_lowercase())
            .filter(|a| !a.is_empty())
            .collect();
        wanted.sort();
        wanted.dedup();

        let mut resolved = HashMap::new();
        let mut missing = Vec::new();
        {
            let cache = self.cache.read().await;
            for address in wanted {
                match cache.get(&address) {
                    Some(entry) if entry.fetched_at.elapsed() < self.ttl => {
                        if let Some(user) = &entry.user {
                            resolved.insert(address, user.clone());
                        }
                    }
                    _ => missing.push(address),
                }
            }
        }

        if missing.is_empty() {
            return Ok(resolved);
        }
        debug!("Resolving {} addresses via Neynar", missing.len());

        let mut fetched = HashMap::new();
        for batch in missing.chunks(LOOKUP_BATCH) {
            match self.fetch(api_key, batch).await {
                Ok(users) => fetched.extend(users),
                Err(e) => {
                    // Serve what is cached; misses are retried next call
                    warn!("Farcaster lookup failed: {}", e);
                    return Ok(resolved);
                }
            }
        }

        let now = Instant::now();
        let mut cache = self.cache.write().await;
        cache.retain(|_, entry| entry.fetched_at.elapsed() < self.ttl);
        for address in missing {
            let user = fetched.remove(&address);
            if let Some(user) = &user {
                resolved.insert(address.clone(), user.clone());
            }
            cache.insert(address, CacheEntry { user, fetched_at: now });
        }

        Ok(resolved)
    }
}
