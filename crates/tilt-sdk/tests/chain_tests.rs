//! Contract reads against a JSON-RPC stub

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tilt_sdk::chain::encode_call;
use tilt_sdk::{ChainReader, RpcChainReader, SdkError, Side};
use tokio::net::TcpListener;

const CONTRACT: &str = "0x2F803DD094E65b2fD3070941c9ce6eacf4fa87d1";
const HOLDER: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

/// Return words for `balanceOf` and `sides`, as 64 hex digits
struct Words {
    balance: String,
    side: String,
}

async fn rpc(State(words): State<Arc<Words>>, Json(body): Json<Value>) -> Json<Value> {
    let data = body["params"][0]["data"].as_str().unwrap_or_default();
    let word = if data.starts_with(&encode_call("balanceOf(address)", &[])) {
        &words.balance
    } else if data.starts_with(&encode_call("sides(address)", &[])) {
        &words.side
    } else {
        return Json(json!({
            "jsonrpc": "2.0",
            "id": body["id"],
            "error": { "code": -32601, "message": "unknown call" }
        }));
    };

    // Both calls carry the holder as their only argument
    assert!(data.ends_with(&HOLDER[2..]));
    Json(json!({ "jsonrpc": "2.0", "id": body["id"], "result": format!("0x{}", word) }))
}

async fn spawn_rpc(words: Words) -> String {
    let app = Router::new().route("/", post(rpc)).with_state(Arc::new(words));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn word(value: u128) -> String {
    format!("{:064x}", value)
}

#[tokio::test]
async fn test_user_state_reads_balance_and_side() {
    let url = spawn_rpc(Words {
        balance: word(1_000),
        side: word(2),
    })
    .await;
    let reader = RpcChainReader::new(url, CONTRACT, Duration::from_secs(5)).unwrap();

    let user = reader.user_state(HOLDER).await.unwrap();
    assert_eq!(user.address, HOLDER);
    assert_eq!(user.balance, "1000");
    assert_eq!(user.side, Side::Down);
}

#[tokio::test]
async fn test_user_state_rejects_wide_side_word() {
    // 2^128 + 1: the low bits alone would read as Up
    let side = format!("{:032x}{:032x}", 1u128, 1u128);
    let url = spawn_rpc(Words {
        balance: word(1),
        side,
    })
    .await;
    let reader = RpcChainReader::new(url, CONTRACT, Duration::from_secs(5)).unwrap();

    let err = reader.user_state(HOLDER).await.unwrap_err();
    assert!(matches!(err, SdkError::Decode(_)), "got {:?}", err);
}
