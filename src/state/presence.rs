//! Session lifecycle, signup/login, and presence broadcasts

use super::registry::{ConnectionRegistry, Outbox};
use super::relay::queue_history;
use crate::error::{ChatError, ChatResult};
use crate::protocol::ServerMessage;
use crate::state::AppState;
use crate::types::{SessionId, Username, MAX_CREDENTIAL_CHARS};

/// Reject empty fields and fields longer than the limit once trimmed.
/// Whitespace-only values are not considered empty.
pub fn validate_signup(username: &str, password: &str) -> ChatResult<()> {
    let too_long = |s: &str| s.trim().chars().count() > MAX_CREDENTIAL_CHARS;
    if username.is_empty() || password.is_empty() || too_long(username) || too_long(password) {
        return Err(ChatError::InvalidFormat);
    }
    Ok(())
}

/// Send the current user list to every connected session
fn broadcast_presence(registry: &ConnectionRegistry) {
    let users = registry.snapshot_identities();
    let reached = registry.broadcast(&ServerMessage::UserList { users });
    tracing::debug!(reached, "Presence broadcast");
}

impl AppState {
    /// Register a new connection and queue its history as the first event it receives
    pub async fn connect(&self, session_id: SessionId, outbox: Outbox) {
        let history = self.history.read().await;
        let mut registry = self.registry.write().await;

        registry.register(session_id.clone(), outbox);
        queue_history(&registry, &history, &session_id);
        tracing::info!(session = %session_id, sessions = registry.len(), "Session connected");
    }

    /// Create an account. Does not log the session in.
    pub async fn signup(&self, username: &str, password: &str) -> ChatResult<()> {
        validate_signup(username, password)?;

        self.accounts
            .write()
            .await
            .create(username.to_string(), password.to_string())
            .await?;

        tracing::info!(username, "User signed up");
        Ok(())
    }

    /// Check credentials and bind the session to `username`, then announce presence.
    /// Logging in again on the same session simply rebinds it.
    pub async fn login(
        &self,
        session_id: &str,
        username: &str,
        password: &str,
    ) -> ChatResult<Username> {
        if !self.accounts.read().await.verify(username, password) {
            tracing::info!(username, "Login failed");
            return Err(ChatError::InvalidCredential);
        }

        let mut registry = self.registry.write().await;
        if !registry.bind(session_id, username.to_string()) {
            tracing::warn!(session = %session_id, "Login for unregistered session");
        }
        broadcast_presence(&registry);

        tracing::info!(session = %session_id, username, "User logged in");
        Ok(username.to_string())
    }

    /// Drop a closed connection. Announces presence only if the session was logged in.
    pub async fn on_disconnect(&self, session_id: &str) -> Option<Username> {
        let mut registry = self.registry.write().await;

        match registry.unregister(session_id) {
            Some(username) => {
                tracing::info!(session = %session_id, %username, "User disconnected");
                broadcast_presence(&registry);
                Some(username)
            }
            None => {
                tracing::info!(session = %session_id, "Anonymous session disconnected");
                None
            }
        }
    }

    /// Identity the session is logged in as
    pub async fn identity_of(&self, session_id: &str) -> Option<Username> {
        self.registry.read().await.identity_of(session_id).cloned()
    }

    /// Identities currently online, in connection order
    pub async fn online_users(&self) -> Vec<Username> {
        self.registry.read().await.snapshot_identities()
    }
}
