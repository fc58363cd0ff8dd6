//! Signup and login handlers

use crate::protocol::ServerMessage;
use crate::state::AppState;
use std::sync::Arc;

pub async fn handle_signup(
    state: &Arc<AppState>,
    username: String,
    password: String,
) -> Option<ServerMessage> {
    match state.signup(&username, &password).await {
        Ok(()) => Some(ServerMessage::SignupSuccess {
            msg: "Account created successfully!".to_string(),
        }),
        Err(e) => {
            tracing::info!(%username, "Signup rejected: {}", e);
            Some(ServerMessage::SignupFailed { msg: e.to_string() })
        }
    }
}

pub async fn handle_login(
    state: &Arc<AppState>,
    session_id: &str,
    username: String,
    password: String,
) -> Option<ServerMessage> {
    match state.login(session_id, &username, &password).await {
        Ok(username) => Some(ServerMessage::LoginSuccess { username }),
        Err(e) => Some(ServerMessage::LoginFailed { msg: e.to_string() }),
    }
}
