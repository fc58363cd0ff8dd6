use crate::error::ChatError;
use crate::types::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Missing credential fields decode as empty and fail validation
    Signup {
        #[serde(default)]
        username: String,
        #[serde(default)]
        password: String,
    },
    Login {
        #[serde(default)]
        username: String,
        #[serde(default)]
        password: String,
    },
    /// Public chat message. `username` is only honoured when the server trusts
    /// client-supplied names; otherwise the session's login is used.
    ChatMessage {
        #[serde(default)]
        username: Option<String>,
        message: String,
    },
    PrivateMessage {
        recipient: Username,
        message: String,
    },
    // WebRTC signaling, forwarded verbatim to `target`
    Offer {
        target: SessionId,
        sdp: serde_json::Value,
    },
    Answer {
        target: SessionId,
        sdp: serde_json::Value,
    },
    IceCandidate {
        target: SessionId,
        candidate: serde_json::Value,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    /// First event on every connection: the session's own id and chat history
    LoadMessages {
        session_id: SessionId,
        messages: Vec<ChatMessage>,
    },
    SignupSuccess {
        msg: String,
    },
    SignupFailed {
        msg: String,
    },
    LoginSuccess {
        username: Username,
    },
    LoginFailed {
        msg: String,
    },
    /// Presence broadcast: every identity currently logged in
    UserList {
        users: Vec<Username>,
    },
    ChatMessage {
        username: Username,
        message: String,
        timestamp: String,
    },
    PrivateMessage {
        sender: Option<Username>,
        message: String,
    },
    PrivateMessageFailed {
        msg: String,
    },
    Offer {
        sdp: serde_json::Value,
        sender: SessionId,
    },
    Answer {
        sdp: serde_json::Value,
        sender: SessionId,
    },
    IceCandidate {
        candidate: serde_json::Value,
        sender: SessionId,
    },
    Error {
        code: String,
        msg: String,
    },
}

impl ClientMessage {
    /// WebRTC signaling frames, which bypass the inbound rate limit
    pub fn is_signaling(&self) -> bool {
        matches!(
            self,
            ClientMessage::Offer { .. }
                | ClientMessage::Answer { .. }
                | ClientMessage::IceCandidate { .. }
        )
    }
}

impl From<ChatMessage> for ServerMessage {
    fn from(m: ChatMessage) -> Self {
        ServerMessage::ChatMessage {
            username: m.username,
            message: m.message,
            timestamp: m.timestamp,
        }
    }
}

impl From<ChatError> for ServerMessage {
    fn from(e: ChatError) -> Self {
        ServerMessage::Error {
            code: e.code().to_string(),
            msg: e.to_string(),
        }
    }
}

/// Kind of a signaling payload being relayed between peers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Offer,
    Answer,
    Candidate,
}

impl SignalKind {
    /// Wrap an opaque payload into the outbound frame for this kind
    pub fn into_message(self, payload: serde_json::Value, sender: SessionId) -> ServerMessage {
        match self {
            SignalKind::Offer => ServerMessage::Offer {
                sdp: payload,
                sender,
            },
            SignalKind::Answer => ServerMessage::Answer {
                sdp: payload,
                sender,
            },
            SignalKind::Candidate => ServerMessage::IceCandidate {
                candidate: payload,
                sender,
            },
        }
    }
}
