//! Push channel client
//!
//! One background task owns the socket and its reconnect loop; a second task
//! polls the REST API while the channel is down. Both stop on the client's
//! cancellation token. Readers only ever touch the shared `SyncState`.

use crate::api::ApiClient;
use crate::backoff::Backoff;
use crate::config::ClientConfig;
use crate::errors::{SdkError, SdkResult};
use crate::sync::state::{Lifecycle, SyncState};
use futures::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tilt_core::constants::{DEFAULT_LEADERBOARD_LIMIT, MAX_CLIENT_ACTIVITIES};
use tilt_core::{ClientRequest, ServerMessage};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::time::{interval, sleep, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

type Outbound = Arc<Mutex<Option<mpsc::Sender<ClientRequest>>>>;

pub struct SyncClient {
    config: ClientConfig,
    api: ApiClient,
    state: Arc<RwLock<SyncState>>,
    outbound: Outbound,
    /// Set while a channel task is connecting, open or waiting to reconnect
    channel_active: Arc<AtomicBool>,
    poller_started: AtomicBool,
    shutdown: CancellationToken,
}

impl SyncClient {
    pub fn new(config: ClientConfig) -> SdkResult<Self> {
        config.validate()?;
        let api = ApiClient::new(config.api_url.clone(), config.request_timeout())?;
        Ok(Self {
            config,
            api,
            state: Arc::new(RwLock::new(SyncState::default())),
            outbound: Arc::new(Mutex::new(None)),
            channel_active: Arc::new(AtomicBool::new(false)),
            poller_started: AtomicBool::new(false),
            shutdown: CancellationToken::new(),
        })
    }

    /// Open the push channel and start the fallback poll.
    ///
    /// Returns false without doing anything when a channel task is already
    /// alive, or after `shutdown`.
    pub fn connect(&self) -> bool {
        if self.shutdown.is_cancelled() {
            return false;
        }
        if self.channel_active.swap(true, Ordering::SeqCst) {
            debug!("Push channel already active, ignoring connect");
            return false;
        }

        if !self.poller_started.swap(true, Ordering::SeqCst) {
            tokio::spawn(run_fallback_poll(
                self.api.clone(),
                self.state.clone(),
                self.config.fallback_poll_interval(),
                self.shutdown.clone(),
            ));
        }

        let task = ChannelTask {
            ws_url: self.config.ws_url.clone(),
            backoff: Backoff::new(self.config.reconnect.clone()),
            state: self.state.clone(),
            outbound: self.outbound.clone(),
            active: self.channel_active.clone(),
            shutdown: self.shutdown.clone(),
        };
        tokio::spawn(task.run());
        true
    }

    /// Clone of the last known state
    pub async fn snapshot(&self) -> SyncState {
        self.state.read().await.clone()
    }

    pub async fn lifecycle(&self) -> Lifecycle {
        self.state.read().await.lifecycle
    }

    /// Whether a channel task is connecting, open or waiting to reconnect
    pub fn is_channel_active(&self) -> bool {
        self.channel_active.load(Ordering::SeqCst)
    }

    pub async fn request_contract_state(&self) -> SdkResult<()> {
        self.request(ClientRequest::GetContractState).await
    }

    pub async fn request_activities(&self) -> SdkResult<()> {
        self.request(ClientRequest::GetActivities).await
    }

    pub async fn request_leaderboard(&self) -> SdkResult<()> {
        self.request(ClientRequest::GetLeaderboard).await
    }

    async fn request(&self, request: ClientRequest) -> SdkResult<()> {
        let sender = self.outbound.lock().await.clone();
        match sender {
            Some(tx) => tx.send(request).await.map_err(|_| SdkError::ChannelClosed),
            None => Err(SdkError::ChannelClosed),
        }
    }

    /// Fetch everything over REST once, regardless of channel state
    pub async fn refresh(&self) -> SdkResult<()> {
        poll_once(&self.api, &self.state).await
    }

    /// REST client sharing this client's configuration
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Stop the channel, the reconnect timer and the fallback poll
    pub fn shutdown(&self) {
        if !self.shutdown.is_cancelled() {
            info!("Shutting down sync client");
            self.shutdown.cancel();
        }
    }
}

impl Drop for SyncClient {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

struct ChannelTask {
    ws_url: String,
    backoff: Backoff,
    state: Arc<RwLock<SyncState>>,
    outbound: Outbound,
    active: Arc<AtomicBool>,
    shutdown: CancellationToken,
}

impl ChannelTask {
    async fn run(mut self) {
        loop {
            self.state.write().await.lifecycle = Lifecycle::Connecting;

            let result = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                result = connect_async(self.ws_url.as_str()) => result,
            };

            match result {
                Ok((stream, _)) => {
                    info!("Push channel open: {}", self.ws_url);
                    self.backoff.reset();
                    {
                        let mut state = self.state.write().await;
                        state.lifecycle = Lifecycle::Connected;
                        state.reconnect_attempt = 0;
                    }
                    self.run_session(stream).await;
                    if self.shutdown.is_cancelled() {
                        break;
                    }
                    warn!("Push channel closed");
                }
                Err(e) => warn!("Push channel connect failed: {}", e),
            }

            self.state.write().await.lifecycle = Lifecycle::Disconnected;

            let Some(delay) = self.backoff.next_delay() else {
                warn!(
                    "Giving up on push channel after {} attempts; relying on fallback poll",
                    self.backoff.attempt()
                );
                break;
            };
            self.state.write().await.reconnect_attempt = self.backoff.attempt();
            info!(
                "Reconnecting in {:?} (attempt {})",
                delay,
                self.backoff.attempt()
            );

            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = sleep(delay) => {}
            }
        }

        self.state.write().await.lifecycle = Lifecycle::Disconnected;
        *self.outbound.lock().await = None;
        self.active.store(false, Ordering::SeqCst);
        debug!("Push channel task stopped");
    }

    /// Pump one open socket until either side closes it
    async fn run_session(&mut self, stream: WebSocketStream<MaybeTlsStream<TcpStream>>) {
        let (mut sink, mut source) = stream.split();
        let (tx, mut rx) = mpsc::channel::<ClientRequest>(32);
        *self.outbound.lock().await = Some(tx);

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
                Some(request) = rx.recv() => {
                    let text = match serde_json::to_string(&request) {
                        Ok(text) => text,
                        Err(e) => {
                            warn!("Failed to encode request: {}", e);
                            continue;
                        }
                    };
                    if let Err(e) = sink.send(Message::Text(text)).await {
                        warn!("Push channel send failed: {}", e);
                        break;
                    }
                }
                frame = source.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        self.state.write().await.apply_text(&text);
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("Push channel read failed: {}", e);
                        break;
                    }
                },
            }
        }

        *self.outbound.lock().await = None;
    }
}

async fn run_fallback_poll(
    api: ApiClient,
    state: Arc<RwLock<SyncState>>,
    period: Duration,
    shutdown: CancellationToken,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick completes immediately; the channel gets a chance first
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                if state.read().await.is_connected() {
                    continue;
                }
                debug!("Push channel down, polling REST API");
                if let Err(e) = poll_once(&api, &state).await {
                    warn!("Fallback poll failed: {}", e);
                }
            }
        }
    }
    debug!("Fallback poll stopped");
}

/// Fetch contract state, activities and both leaderboards. Each part is
/// applied as soon as it arrives; the first failure is returned.
async fn poll_once(api: &ApiClient, state: &RwLock<SyncState>) -> SdkResult<()> {
    let mut first_error = None;

    match api.contract_state().await {
        Ok(contract) => {
            state.write().await.apply(ServerMessage::ContractState(contract));
        }
        Err(e) => first_error = first_error.or(Some(e)),
    }

    match api.activities(MAX_CLIENT_ACTIVITIES).await {
        Ok(activities) => {
            state.write().await.apply(ServerMessage::Activities(activities));
        }
        Err(e) => first_error = first_error.or(Some(e)),
    }

    match api.leaderboards(DEFAULT_LEADERBOARD_LIMIT).await {
        Ok(boards) => {
            state.write().await.apply(ServerMessage::Leaderboard(boards));
        }
        Err(e) => first_error = first_error.or(Some(e)),
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
