//! Chat and signaling handlers
//!
//! Broadcast chat is delivered through every session's outbox, including the
//! sender's, so these handlers only answer directly on failure.

use crate::error::ChatError;
use crate::protocol::{ServerMessage, SignalKind};
use crate::state::AppState;
use crate::types::SessionId;
use std::sync::Arc;

pub async fn handle_chat_message(
    state: &Arc<AppState>,
    session_id: &SessionId,
    claimed_username: Option<String>,
    message: String,
) -> Option<ServerMessage> {
    match state.chat_sender(session_id, claimed_username).await {
        Ok(username) => {
            state.broadcast_chat(username, message).await;
            None
        }
        Err(e) => Some(e.into()),
    }
}

pub async fn handle_private_message(
    state: &Arc<AppState>,
    session_id: &SessionId,
    recipient: String,
    message: String,
) -> Option<ServerMessage> {
    let sender = match state.private_sender(session_id).await {
        Ok(sender) => sender,
        Err(e) => return Some(e.into()),
    };

    match state.send_private(sender, &recipient, message).await {
        Ok(()) => None,
        Err(ChatError::RecipientOffline) => Some(ServerMessage::PrivateMessageFailed {
            msg: ChatError::RecipientOffline.to_string(),
        }),
        Err(e) => Some(e.into()),
    }
}

pub async fn handle_signal(
    state: &Arc<AppState>,
    session_id: &SessionId,
    kind: SignalKind,
    target: SessionId,
    payload: serde_json::Value,
) -> Option<ServerMessage> {
    state
        .relay_signal(kind, &target, payload, session_id)
        .await;
    None
}
