mod account;
mod chat;
pub mod handlers;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::protocol::ServerMessage;
use crate::state::{AppState, OUTBOX_CAPACITY};
use crate::types::new_session_id;

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    tracing::debug!("WebSocket connection request");
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Serialize and send one frame. Frames that fail to encode are logged and skipped.
async fn send_json(
    sender: &mut SplitSink<WebSocket, Message>,
    msg: &ServerMessage,
) -> Result<(), axum::Error> {
    match serde_json::to_string(msg) {
        Ok(json) => sender.send(Message::Text(json.into())).await,
        Err(e) => {
            tracing::error!("Failed to encode server message: {}", e);
            Ok(())
        }
    }
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let session_id = new_session_id();
    let (outbox, mut inbox) = mpsc::channel(OUTBOX_CAPACITY);

    // Queues the history frame ahead of anything else for this session
    state.connect(session_id.clone(), outbox).await;

    loop {
        tokio::select! {
            // Broadcasts and targeted deliveries from other sessions
            queued = inbox.recv() => {
                let Some(msg) = queued else {
                    tracing::warn!(session = %session_id, "Outbox closed, session stalled or replaced");
                    break;
                };
                if send_json(&mut sender, &msg).await.is_err() {
                    break;
                }
            }

            // Handle client messages
            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        tracing::trace!(session = %session_id, bytes = text.as_str().len(), "Received frame");

                        if let Some(response) =
                            handlers::handle_frame(text.as_str(), &session_id, &state).await
                        {
                            if send_json(&mut sender, &response).await.is_err() {
                                tracing::error!("Failed to send response");
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::debug!(session = %session_id, "WebSocket closed");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    state.on_disconnect(&session_id).await;
    if let Some(ref limiter) = state.rate_limiter {
        limiter.forget(&session_id).await;
    }
}
