//! WebSocket message dispatch
//!
//! This module provides the main entry point for handling client frames.
//! Rate limiting and parsing happen here, then messages are dispatched to
//! the account and chat handler modules.

use crate::protocol::{ClientMessage, ServerMessage, SignalKind};
use crate::state::AppState;
use crate::types::SessionId;
use std::sync::Arc;

use super::{account, chat};

/// Handle one raw text frame from `session_id` and return an optional direct response
pub async fn handle_frame(
    text: &str,
    session_id: &SessionId,
    state: &Arc<AppState>,
) -> Option<ServerMessage> {
    let parsed = serde_json::from_str::<ClientMessage>(text);

    // Call setup bursts ICE candidates, so signaling is never throttled
    let exempt = matches!(&parsed, Ok(msg) if msg.is_signaling());
    if let (false, Some(limiter)) = (exempt, state.rate_limiter.as_ref()) {
        if !limiter.check(session_id).await {
            tracing::warn!(session = %session_id, "Rate limited");
            return Some(ServerMessage::Error {
                code: "RATE_LIMITED".to_string(),
                msg: "Too many messages. Please slow down.".to_string(),
            });
        }
    }

    match parsed {
        Ok(msg) => handle_message(msg, session_id, state).await,
        Err(e) => {
            tracing::warn!(session = %session_id, "Failed to parse client message: {}", e);
            Some(ServerMessage::Error {
                code: "PARSE_ERROR".to_string(),
                msg: format!("Invalid message format: {}", e),
            })
        }
    }
}

/// Handle client messages and return optional response
pub async fn handle_message(
    msg: ClientMessage,
    session_id: &SessionId,
    state: &Arc<AppState>,
) -> Option<ServerMessage> {
    match msg {
        // Account messages
        ClientMessage::Signup { username, password } => {
            account::handle_signup(state, username, password).await
        }

        ClientMessage::Login { username, password } => {
            account::handle_login(state, session_id, username, password).await
        }

        // Chat messages
        ClientMessage::ChatMessage { username, message } => {
            chat::handle_chat_message(state, session_id, username, message).await
        }

        ClientMessage::PrivateMessage { recipient, message } => {
            chat::handle_private_message(state, session_id, recipient, message).await
        }

        // WebRTC signaling
        ClientMessage::Offer { target, sdp } => {
            chat::handle_signal(state, session_id, SignalKind::Offer, target, sdp).await
        }

        ClientMessage::Answer { target, sdp } => {
            chat::handle_signal(state, session_id, SignalKind::Answer, target, sdp).await
        }

        ClientMessage::IceCandidate { target, candidate } => {
            chat::handle_signal(state, session_id, SignalKind::Candidate, target, candidate).await
        }
    }
}
