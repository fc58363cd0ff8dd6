//! Broadcast chat, private messages, and history delivery

use super::registry::ConnectionRegistry;
use crate::error::{ChatError, ChatResult};
use crate::protocol::ServerMessage;
use crate::state::AppState;
use crate::store::History;
use crate::types::{ChatMessage, SessionId, Username};

/// Queue the `load_messages` frame for one session.
/// Callers hold both locks so nothing can be queued ahead of it on connect.
pub(super) fn queue_history(
    registry: &ConnectionRegistry,
    history: &History,
    session_id: &str,
) -> bool {
    registry.deliver(
        session_id,
        ServerMessage::LoadMessages {
            session_id: session_id.to_string(),
            messages: history.snapshot(),
        },
    )
}

impl AppState {
    /// Record a chat message in history and deliver it to every connected session.
    /// The username is not validated here.
    pub async fn broadcast_chat(&self, username: Username, body: String) -> ChatMessage {
        let message = ChatMessage::new(username, body);

        // Hold history while fanning out so delivery order matches history order
        let mut history = self.history.write().await;
        history.append(message.clone()).await;

        let reached = self.registry.read().await.broadcast(&message.clone().into());
        tracing::debug!(username = %message.username, reached, "Chat message broadcast");
        message
    }

    /// Deliver a private message to the first session logged in as `recipient`
    pub async fn send_private(
        &self,
        sender: Option<Username>,
        recipient: &str,
        body: String,
    ) -> ChatResult<()> {
        let registry = self.registry.read().await;

        let Some(session_id) = registry.lookup_session_for_identity(recipient) else {
            tracing::info!(?sender, recipient, "Private message failed: recipient offline");
            return Err(ChatError::RecipientOffline);
        };

        tracing::info!(?sender, recipient, "Private message sent");
        registry.deliver(
            session_id,
            ServerMessage::PrivateMessage {
                sender,
                message: body,
            },
        );
        Ok(())
    }

    /// Send the full history to one session
    pub async fn deliver_history(&self, session_id: &str) -> bool {
        let history = self.history.read().await;
        let registry = self.registry.read().await;
        queue_history(&registry, &history, session_id)
    }

    /// Who a chat message from `session_id` is attributed to.
    ///
    /// By default this is the session's login and `claimed` is ignored. With
    /// `trust_client_username` set, the client-supplied name wins.
    pub async fn chat_sender(
        &self,
        session_id: &SessionId,
        claimed: Option<String>,
    ) -> ChatResult<Username> {
        let bound = self.identity_of(session_id).await;
        let sender = if self.config.trust_client_username {
            claimed.or(bound)
        } else {
            bound
        };
        sender.ok_or(ChatError::NotLoggedIn)
    }

    /// Sender field of a private message from `session_id`.
    /// Anonymous senders are only allowed when client-supplied names are trusted.
    pub async fn private_sender(&self, session_id: &SessionId) -> ChatResult<Option<Username>> {
        match self.identity_of(session_id).await {
            Some(identity) => Ok(Some(identity)),
            None if self.config.trust_client_username => Ok(None),
            None => Err(ChatError::NotLoggedIn),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::state::OUTBOX_CAPACITY;
    use tokio::sync::mpsc::{self, Receiver};

    async fn connect(state: &AppState, id: &str) -> Receiver<ServerMessage> {
        let (tx, mut rx) = mpsc::channel(OUTBOX_CAPACITY);
        state.connect(id.to_string(), tx).await;
        let _ = rx.try_recv();
        rx
    }

    async fn logged_in(state: &AppState, id: &str, name: &str) -> Receiver<ServerMessage> {
        let mut rx = connect(state, id).await;
        state.signup(name, "pw").await.unwrap();
        state.login(id, name, "pw").await.unwrap();
        while rx.try_recv().is_ok() {}
        rx
    }

    #[tokio::test]
    async fn test_broadcast_reaches_everyone() {
        let state = AppState::in_memory(ServerConfig::default()).await;
        let mut anon = connect(&state, "anon").await;
        let mut alice = logged_in(&state, "s1", "alice").await;
        let _ = anon.try_recv(); // presence

        let msg = state
            .broadcast_chat("alice".to_string(), "hi".to_string())
            .await;

        let expected: ServerMessage = msg.clone().into();
        assert_eq!(alice.try_recv().unwrap(), expected);
        assert_eq!(anon.try_recv().unwrap(), expected);
        assert_eq!(state.history.read().await.snapshot(), vec![msg]);
    }

    #[tokio::test]
    async fn test_history_capped_at_limit() {
        let state = AppState::in_memory(ServerConfig::default()).await;
        for i in 0..150 {
            state
                .broadcast_chat("alice".to_string(), format!("{}", i))
                .await;
        }

        let history = state.history.read().await.snapshot();
        assert_eq!(history.len(), 100);
        assert_eq!(history.first().unwrap().message, "50");
        assert_eq!(history.last().unwrap().message, "149");
    }

    #[tokio::test]
    async fn test_private_to_offline_recipient() {
        let state = AppState::in_memory(ServerConfig::default()).await;
        let mut alice = logged_in(&state, "s1", "alice").await;

        let result = state
            .send_private(Some("alice".to_string()), "bob", "hey".to_string())
            .await;
        assert_eq!(result, Err(ChatError::RecipientOffline));
        assert!(alice.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_private_reaches_only_recipient() {
        let state = AppState::in_memory(ServerConfig::default()).await;
        let mut alice = logged_in(&state, "s1", "alice").await;
        let mut bob = logged_in(&state, "s2", "bob").await;
        while alice.try_recv().is_ok() {}

        state
            .send_private(Some("alice".to_string()), "bob", "psst".to_string())
            .await
            .unwrap();

        assert_eq!(
            bob.try_recv().unwrap(),
            ServerMessage::PrivateMessage {
                sender: Some("alice".to_string()),
                message: "psst".to_string(),
            }
        );
        assert!(alice.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_deliver_history_resends_snapshot() {
        let state = AppState::in_memory(ServerConfig::default()).await;
        let mut rx = connect(&state, "s1").await;
        state.broadcast_chat("a".to_string(), "one".to_string()).await;
        let _ = rx.try_recv();

        assert!(state.deliver_history("s1").await);
        match rx.try_recv().unwrap() {
            ServerMessage::LoadMessages {
                session_id,
                messages,
            } => {
                assert_eq!(session_id, "s1");
                assert_eq!(messages.len(), 1);
            }
            other => panic!("Expected LoadMessages, got {:?}", other),
        }
        assert!(!state.deliver_history("gone").await);
    }

    #[tokio::test]
    async fn test_chat_sender_ignores_claim_by_default() {
        let state = AppState::in_memory(ServerConfig::default()).await;
        let _rx = logged_in(&state, "s1", "alice").await;
        let _anon = connect(&state, "s2").await;

        assert_eq!(
            state
                .chat_sender(&"s1".to_string(), Some("mallory".to_string()))
                .await,
            Ok("alice".to_string())
        );
        assert_eq!(
            state
                .chat_sender(&"s2".to_string(), Some("mallory".to_string()))
                .await,
            Err(ChatError::NotLoggedIn)
        );
        assert_eq!(
            state.private_sender(&"s2".to_string()).await,
            Err(ChatError::NotLoggedIn)
        );
    }

    #[tokio::test]
    async fn test_chat_sender_trusts_claim_when_configured() {
        let config = ServerConfig {
            trust_client_username: true,
            ..ServerConfig::default()
        };
        let state = AppState::in_memory(config).await;
        let _rx = logged_in(&state, "s1", "alice").await;
        let _anon = connect(&state, "s2").await;

        assert_eq!(
            state
                .chat_sender(&"s1".to_string(), Some("mallory".to_string()))
                .await,
            Ok("mallory".to_string())
        );
        assert_eq!(
            state.chat_sender(&"s1".to_string(), None).await,
            Ok("alice".to_string())
        );
        assert_eq!(state.private_sender(&"s2".to_string()).await, Ok(None));
    }
}
