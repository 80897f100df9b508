//! TILT Sync Service
//!
//! Serves the REST API and WebSocket push channel, and samples the TILT
//! contract on a fixed interval.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tilt_sdk::{ChainReader, RpcChainReader};
use tilt_server::api::{self, ApiState};
use tilt_server::farcaster::NeynarResolver;
use tilt_server::{Hub, MemStore, Sampler, ServerConfig, TiltStore};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "tilt-server")]
#[command(about = "TILT live state service")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "tilt.toml")]
    config: PathBuf,

    /// Override log level
    #[arg(long)]
    log_level: Option<String>,

    /// Override the API bind address
    #[arg(long)]
    bind: Option<String>,

    /// Dry run mode (validate config and exit)
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_found = cli.config.exists();
    let mut config = ServerConfig::load(Some(cli.config.as_path()))?;

    if let Some(log_level) = cli.log_level {
        config.monitoring.log_level = log_level;
    }
    if let Some(bind) = cli.bind {
        config.api.bind_address = bind;
    }

    init_logging(&config)?;

    if !config_found {
        warn!("Config file not found, using defaults: {}", cli.config.display());
    }

    info!("Starting TILT sync service");
    info!("Chain reads: {}", if config.chain.is_active() { "enabled" } else { "disabled" });
    if config.chain.is_active() {
        info!("Contract: {} via {}", config.chain.contract_address, config.chain.rpc_url);
    }

    config.validate()?;
    info!("Configuration validated successfully");

    if cli.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        return Ok(());
    }

    let chain: Option<Arc<dyn ChainReader>> = if config.chain.is_active() {
        Some(Arc::new(RpcChainReader::new(
            config.chain.rpc_url.clone(),
            config.chain.contract_address.clone(),
            config.chain.request_timeout(),
        )?))
    } else {
        None
    };

    let store: Arc<dyn TiltStore> = Arc::new(MemStore::new());
    let hub = Arc::new(Hub::new(store, config.hub_settings()));
    let resolver = Arc::new(NeynarResolver::new(&config.farcaster)?);
    if !resolver.is_enabled() {
        info!("No Neynar API key configured; username lookups disabled");
    }

    let shutdown = CancellationToken::new();

    let sampler = Sampler::new(hub.clone(), chain.clone(), config.broadcast_interval());
    let sampler_handle = sampler.spawn(shutdown.clone());

    let state = ApiState::new(hub, resolver).with_chain(chain);
    let (_addr, api_handle) = api::start_server(state, &config.api, shutdown.clone()).await?;

    info!("Service started successfully. Press Ctrl+C to shutdown.");
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
        result = sampler_handle => {
            if let Err(e) = result {
                error!("Sampler task error: {}", e);
            }
        }
    }

    shutdown.cancel();
    if let Err(e) = api_handle.await {
        error!("API server task error: {}", e);
    }

    info!("Shutting down TILT sync service");
    Ok(())
}

fn init_logging(config: &ServerConfig) -> Result<()> {
    let log_level = config
        .monitoring
        .log_level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::INFO);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "tilt_server={level},tilt_sdk={level},tower_http=info",
            level = log_level
        )
        .into()
    });

    if config.monitoring.structured_logging {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()?;
    }

    Ok(())
}
