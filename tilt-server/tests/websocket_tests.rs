//! Push channel over a real socket

use anyhow::Result;
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tilt_core::{ActivityEvent, ActivityKind, ContractState, ServerMessage};
use tilt_sdk::{ClientConfig, Lifecycle, SyncClient};
use tilt_server::api::{start_server, ApiState};
use tilt_server::config::ApiConfig;
use tilt_server::farcaster::NeynarResolver;
use tilt_server::{Hub, HubSettings, MemStore, TiltStore};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn spawn_server() -> Result<(SocketAddr, Arc<Hub>, CancellationToken)> {
    let store: Arc<dyn TiltStore> = Arc::new(MemStore::new());
    let hub = Arc::new(Hub::new(store, HubSettings::default()));
    let resolver = Arc::new(NeynarResolver::new(&Default::default())?);
    let config = ApiConfig {
        bind_address: "127.0.0.1:0".to_string(),
        ..ApiConfig::default()
    };
    let shutdown = CancellationToken::new();
    let (addr, _handle) =
        start_server(ApiState::new(hub.clone(), resolver), &config, shutdown.clone()).await?;
    Ok((addr, hub, shutdown))
}

async fn next_message(socket: &mut Socket) -> Result<ServerMessage> {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await?
            .ok_or_else(|| anyhow::anyhow!("socket closed"))??;
        if let Message::Text(text) = frame {
            return Ok(serde_json::from_str(&text)?);
        }
    }
}

async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..200 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

#[tokio::test]
async fn test_baseline_request_and_broadcast() -> Result<()> {
    let (addr, hub, shutdown) = spawn_server().await?;
    let (mut socket, _) = tokio_tungstenite::connect_async(format!("ws://{}/ws", addr)).await?;

    let mut kinds = Vec::new();
    for _ in 0..4 {
        kinds.push(next_message(&mut socket).await?.kind());
    }
    assert_eq!(kinds, vec!["connected", "contract_state", "activities", "leaderboard"]);

    socket
        .send(Message::Text(r#"{"type":"get_activities"}"#.to_string()))
        .await?;
    assert_eq!(next_message(&mut socket).await?.kind(), "activities");

    // Garbage does not close the connection
    socket.send(Message::Text("hello?".to_string())).await?;

    let activity = ActivityEvent {
        id: "tx-0x01".to_string(),
        kind: ActivityKind::Burn,
        address: "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb".to_string(),
        amount: "7".to_string(),
        timestamp: 1,
        tx_hash: Some("0x01".to_string()),
        new_side: None,
    };
    hub.publish_activity(activity.clone()).await?;
    match next_message(&mut socket).await? {
        ServerMessage::NewActivity(received) => assert_eq!(received, activity),
        other => panic!("expected new_activity, got {:?}", other),
    }

    socket.close(None).await?;
    assert!(eventually(|| async { hub.connection_count().await == 0 }).await);

    shutdown.cancel();
    Ok(())
}

#[tokio::test]
async fn test_sync_client_follows_server() -> Result<()> {
    let (addr, hub, shutdown) = spawn_server().await?;
    hub.store()
        .set_contract_state(ContractState {
            total_supply: "1736000".to_string(),
            ..ContractState::default()
        })
        .await?;

    let client = SyncClient::new(ClientConfig {
        ws_url: format!("ws://{}/ws", addr),
        api_url: format!("http://{}", addr),
        ..ClientConfig::default()
    })?;
    assert!(client.connect());

    assert!(eventually(|| async { client.snapshot().await.supply_snapshot().is_some() }).await);
    assert_eq!(client.lifecycle().await, Lifecycle::Connected);

    hub.store()
        .set_contract_state(ContractState {
            total_supply: "1737000".to_string(),
            ..ContractState::default()
        })
        .await?;
    hub.broadcast_contract_state().await?;
    assert!(
        eventually(|| async {
            client.snapshot().await.contract_state.map(|s| s.total_supply)
                == Some("1737000".to_string())
        })
        .await
    );

    // REST refresh works against the same server
    client.refresh().await?;

    client.shutdown();
    shutdown.cancel();
    Ok(())
}
