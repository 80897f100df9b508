//! Sync state dispatch, reconnect backoff, live channel sessions and the
//! fallback poll

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use futures::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tilt_sdk::{
    ActivityEvent, ActivityKind, Backoff, ClientConfig, ContractState, LeaderboardEntry,
    Leaderboards, Lifecycle, ReconnectConfig, ReconnectPolicy, ServerMessage, Side, SyncClient,
    SyncState,
};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

const ADDR: &str = "0x2f803dd094e65b2fd3070941c9ce6eacf4fa87d1";

fn activity(id: &str) -> ActivityEvent {
    ActivityEvent {
        id: id.to_string(),
        kind: ActivityKind::Mint,
        address: ADDR.to_string(),
        amount: "1000".to_string(),
        timestamp: 1_700_000_000_000,
        tx_hash: None,
        new_side: None,
    }
}

#[test]
fn test_dispatch_each_message_type() {
    let mut state = SyncState::new();

    assert!(state.apply_text(r#"{"type":"connected","data":"Connected to TILT WebSocket server"}"#));
    assert_eq!(state, SyncState::new());

    let contract = ContractState {
        total_supply: "1736000".to_string(),
        ups: "1000000".to_string(),
        is_up_only: true,
        tvl: "1.500000000000000000".to_string(),
        current_price: "0.000003013696000000".to_string(),
    };
    let frame = serde_json::to_string(&ServerMessage::ContractState(contract.clone())).unwrap();
    assert!(state.apply_text(&frame));
    assert_eq!(state.contract_state, Some(contract));

    let frame =
        serde_json::to_string(&ServerMessage::Activities(vec![activity("b"), activity("a")]))
            .unwrap();
    assert!(state.apply_text(&frame));
    assert_eq!(state.activities.len(), 2);

    let frame = serde_json::to_string(&ServerMessage::NewActivity(activity("c"))).unwrap();
    assert!(state.apply_text(&frame));
    assert_eq!(state.activities[0].id, "c");

    let boards = Leaderboards {
        up: vec![LeaderboardEntry {
            address: ADDR.to_string(),
            balance: "10".to_string(),
            side: Side::Up,
            rank: 1,
        }],
        down: vec![],
    };
    let frame = serde_json::to_string(&ServerMessage::Leaderboard(boards.clone())).unwrap();
    assert!(state.apply_text(&frame));
    assert_eq!(state.leaderboards, boards);
}

#[test]
fn test_new_activity_twice_keeps_one() {
    let mut state = SyncState::new();
    let frame = serde_json::to_string(&ServerMessage::NewActivity(activity("tx-0xabc"))).unwrap();

    assert!(state.apply_text(&frame));
    assert!(!state.apply_text(&frame));
    assert_eq!(state.activities.len(), 1);
}

#[test]
fn test_unknown_and_malformed_frames_ignored() {
    let mut state = SyncState::new();
    state.apply(ServerMessage::NewActivity(activity("kept")));
    let before = state.clone();

    assert!(!state.apply_text(r#"{"type":"chat","data":{"text":"hi"}}"#));
    assert!(!state.apply_text(r#"{"type":"new_activity","data":{"id":1}}"#));
    assert!(!state.apply_text("{not json"));
    assert_eq!(state, before);
}

#[test]
fn test_contract_state_with_bad_numbers_rejected() {
    let mut state = SyncState::new();
    let good = ContractState {
        total_supply: "5".to_string(),
        ..ContractState::default()
    };
    assert!(state.apply(ServerMessage::ContractState(good.clone())));

    let bad = ContractState {
        total_supply: "NaN".to_string(),
        ..ContractState::default()
    };
    assert!(!state.apply(ServerMessage::ContractState(bad)));
    assert_eq!(state.contract_state, Some(good));
}

#[test]
fn test_backoff_sequence_bounded_by_cap() {
    let config = ReconnectConfig::default();
    let cap = Duration::from_millis(config.max_delay_ms);
    let mut backoff = Backoff::new(config);

    let delays: Vec<Duration> = (0..5).map(|_| backoff.next_delay().unwrap()).collect();
    assert_eq!(
        delays,
        vec![
            Duration::from_secs(2),
            Duration::from_secs(4),
            Duration::from_secs(8),
            Duration::from_secs(16),
            Duration::from_secs(30),
        ]
    );
    assert!(delays.windows(2).all(|w| w[0] <= w[1]));
    assert!(delays.iter().all(|d| *d <= cap));

    // Sixth failure: no further attempt
    assert!(backoff.next_delay().is_none());
    assert!(backoff.is_exhausted());

    backoff.reset();
    assert_eq!(backoff.next_delay(), Some(Duration::from_secs(2)));
}

#[test]
fn test_retry_forever_stays_at_cap() {
    let config = ReconnectConfig {
        policy: ReconnectPolicy::RetryForever,
        ..ReconnectConfig::default()
    };
    let mut backoff = Backoff::new(config);
    for _ in 0..20 {
        assert!(backoff.next_delay().unwrap() <= Duration::from_secs(30));
    }
    assert_eq!(backoff.next_delay(), Some(Duration::from_secs(30)));
    assert!(!backoff.is_exhausted());
}

fn client_config(ws_url: String) -> ClientConfig {
    ClientConfig {
        ws_url,
        reconnect: ReconnectConfig {
            base_delay_ms: 5,
            max_delay_ms: 20,
            max_attempts: 2,
            policy: ReconnectPolicy::StopAfterMax,
        },
        ..ClientConfig::default()
    }
}

async fn wait_for<F, Fut>(check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    wait_for_within(Duration::from_secs(2), check).await
}

async fn wait_for_within<F, Fut>(limit: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let rounds = limit.as_millis() / 10;
    for _ in 0..rounds {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

#[tokio::test]
async fn test_live_channel_applies_frames_and_sends_requests() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
        let state = ServerMessage::ContractState(ContractState {
            total_supply: "42".to_string(),
            ..ContractState::default()
        });
        ws.send(Message::Text(serde_json::to_string(&state).unwrap()))
            .await
            .unwrap();

        // Wait for the client's request and echo its type back
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => return text,
                Some(Ok(_)) => continue,
                other => panic!("unexpected frame: {:?}", other),
            }
        }
    });

    let client = SyncClient::new(client_config(format!("ws://{}", addr))).unwrap();
    assert!(client.connect());
    assert!(!client.connect(), "second connect must be a no-op");

    assert!(wait_for(|| async { client.snapshot().await.supply_snapshot().is_some() }).await);
    assert_eq!(client.lifecycle().await, Lifecycle::Connected);

    client.request_leaderboard().await.unwrap();
    let received = server.await.unwrap();
    assert_eq!(received, r#"{"type":"get_leaderboard"}"#);

    client.shutdown();
    assert!(wait_for(|| async { !client.is_channel_active() }).await);
    assert_eq!(client.lifecycle().await, Lifecycle::Disconnected);
}

#[tokio::test]
async fn test_stop_after_max_releases_channel() {
    // Bind then drop so the port refuses connections
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = SyncClient::new(client_config(format!("ws://{}", addr))).unwrap();
    assert!(client.connect());
    assert!(wait_for(|| async { !client.is_channel_active() }).await);

    let snapshot = client.snapshot().await;
    assert_eq!(snapshot.lifecycle, Lifecycle::Disconnected);
    assert_eq!(snapshot.reconnect_attempt, 2);
    assert!(client.request_activities().await.is_err());

    // The channel may be opened again once the previous task gave up
    assert!(client.connect());
    client.shutdown();
}

/// REST API stub; counts contract state requests
async fn spawn_rest_api(hits: Arc<AtomicUsize>) -> String {
    let app = Router::new()
        .route(
            "/api/contract/state",
            get(|State(hits): State<Arc<AtomicUsize>>| async move {
                hits.fetch_add(1, Ordering::SeqCst);
                Json(ContractState {
                    total_supply: "77".to_string(),
                    ..ContractState::default()
                })
            }),
        )
        .route(
            "/api/contract/activities",
            get(|| async { Json(vec![activity("polled")]) }),
        )
        .route(
            "/api/contract/leaderboard/:side",
            get(|| async { Json(Vec::<LeaderboardEntry>::new()) }),
        )
        .with_state(hits);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_fallback_poll_runs_while_channel_down() {
    let hits = Arc::new(AtomicUsize::new(0));
    let api_url = spawn_rest_api(hits.clone()).await;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let refused = listener.local_addr().unwrap();
    drop(listener);

    let client = SyncClient::new(ClientConfig {
        api_url,
        fallback_poll_secs: 1,
        ..client_config(format!("ws://{}", refused))
    })
    .unwrap();
    assert!(client.connect());

    let polled = wait_for_within(Duration::from_secs(5), || async {
        let snapshot = client.snapshot().await;
        !snapshot.activities.is_empty()
            && snapshot
                .contract_state
                .is_some_and(|state| state.total_supply == "77")
    })
    .await;
    assert!(polled, "fallback poll never applied REST state");

    let snapshot = client.snapshot().await;
    assert_ne!(snapshot.lifecycle, Lifecycle::Connected);
    assert_eq!(snapshot.activities[0].id, "polled");
    assert!(hits.load(Ordering::SeqCst) >= 1);

    client.shutdown();
}

#[tokio::test]
async fn test_fallback_poll_skipped_while_connected() {
    let hits = Arc::new(AtomicUsize::new(0));
    let api_url = spawn_rest_api(hits.clone()).await;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
        let state = ServerMessage::ContractState(ContractState {
            total_supply: "5".to_string(),
            ..ContractState::default()
        });
        ws.send(Message::Text(serde_json::to_string(&state).unwrap()))
            .await
            .unwrap();
        while let Some(Ok(_)) = ws.next().await {}
    });

    let client = SyncClient::new(ClientConfig {
        api_url,
        fallback_poll_secs: 1,
        ..client_config(format!("ws://{}", addr))
    })
    .unwrap();
    assert!(client.connect());
    assert!(wait_for(|| async { client.lifecycle().await == Lifecycle::Connected }).await);

    // Two poll periods pass with the channel open
    tokio::time::sleep(Duration::from_millis(2_500)).await;
    assert_eq!(hits.load(Ordering::SeqCst), 0);
    assert_eq!(
        client.snapshot().await.contract_state.map(|s| s.total_supply),
        Some("5".to_string())
    );

    client.shutdown();
    server.await.unwrap();
}

#[tokio::test]
async fn test_reconnect_after_server_close_resets_attempts() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    // Three sessions closed by the server, then one kept open. With two
    // allowed attempts this only works if each open resets the counter.
    let server = tokio::spawn(async move {
        for round in 1..=4u32 {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            let state = ServerMessage::ContractState(ContractState {
                total_supply: round.to_string(),
                ..ContractState::default()
            });
            ws.send(Message::Text(serde_json::to_string(&state).unwrap()))
                .await
                .unwrap();

            if round < 4 {
                let _ = ws.close(None).await;
            } else {
                while let Some(Ok(_)) = ws.next().await {}
            }
        }
    });

    let client = SyncClient::new(client_config(format!("ws://{}", addr))).unwrap();
    assert!(client.connect());

    let fresh = wait_for(|| async {
        let snapshot = client.snapshot().await;
        snapshot.is_connected()
            && snapshot
                .contract_state
                .is_some_and(|state| state.total_supply == "4")
    })
    .await;
    assert!(fresh, "client did not reconnect to the fourth session");

    let snapshot = client.snapshot().await;
    assert_eq!(snapshot.reconnect_attempt, 0);
    assert!(client.is_channel_active());
    client.request_contract_state().await.unwrap();

    client.shutdown();
    server.await.unwrap();
}
