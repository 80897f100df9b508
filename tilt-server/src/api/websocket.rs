//! WebSocket endpoint for the push channel
//!
//! One writer task drains the connection's hub queue; one reader task hands
//! text frames to the hub. Whichever ends first tears the other down and the
//! connection is unregistered.

use super::ApiState;
use crate::hub::Hub;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{sink::SinkExt, stream::StreamExt};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Handle WebSocket upgrade
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<ApiState>) -> Response {
    debug!("WebSocket connection requested");
    ws.on_upgrade(move |socket| handle_socket(socket, state.hub))
}

async fn handle_socket(socket: WebSocket, hub: Arc<Hub>) {
    let (id, mut queue) = match hub.register().await {
        Ok(registered) => registered,
        Err(e) => {
            error!("Failed to register connection: {}", e);
            return;
        }
    };

    let (mut sender, mut receiver) = socket.split();

    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = queue.recv().await {
            if sender.send(Message::Text(frame.to_string())).await.is_err() {
                break;
            }
        }
    });

    let recv_hub = hub.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(message) = receiver.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    if let Err(e) = recv_hub.handle_text(id, &text).await {
                        warn!("Failed to answer connection {}: {}", id, e);
                    }
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    debug!("Connection {} read error: {}", id, e);
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => {
            recv_task.abort();
        }
        _ = (&mut recv_task) => {
            send_task.abort();
        }
    }

    hub.unregister(id).await;
}
