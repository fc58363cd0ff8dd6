use serde::{Deserialize, Serialize};

/// Opaque ID types for type safety
pub type SessionId = String;
pub type Username = String;

/// Maximum length (in characters, after trimming) of usernames and passwords
pub const MAX_CREDENTIAL_CHARS: usize = 20;

/// Default number of chat messages kept in history
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Allocate a fresh session identifier
pub fn new_session_id() -> SessionId {
    ulid::Ulid::new().to_string()
}

/// A broadcast chat message as stored in history and sent to clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub username: Username,
    pub message: String,
    pub timestamp: String, // ISO8601, millisecond precision, UTC
}

impl ChatMessage {
    /// Create a message stamped with the current time
    pub fn new(username: Username, message: String) -> Self {
        Self {
            username,
            message,
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        }
    }
}
