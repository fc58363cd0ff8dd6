//! Error taxonomy for chat operations and persistence

use std::path::PathBuf;

/// Result type for chat operations
pub type ChatResult<T> = Result<T, ChatError>;

/// Errors reported to the originating session only
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    #[error("Invalid username or password format.")]
    InvalidFormat,

    #[error("Username already exists.")]
    UsernameTaken,

    #[error("Invalid username or password.")]
    InvalidCredential,

    #[error("Recipient is not online.")]
    RecipientOffline,

    #[error("You must be logged in to do that.")]
    NotLoggedIn,
}

impl ChatError {
    /// Stable code used on the wire for `error` frames
    pub fn code(&self) -> &'static str {
        match self {
            ChatError::InvalidFormat => "INVALID_FORMAT",
            ChatError::UsernameTaken => "USERNAME_TAKEN",
            ChatError::InvalidCredential => "INVALID_CREDENTIAL",
            ChatError::RecipientOffline => "RECIPIENT_OFFLINE",
            ChatError::NotLoggedIn => "NOT_LOGGED_IN",
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence failures. Logged, never surfaced to clients.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode state: {0}")]
    Encode(#[from] serde_json::Error),
}
