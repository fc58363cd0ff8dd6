//! End-to-end tests over a real WebSocket connection.
//!
//! These start the server on an ephemeral port and talk to it with
//! tokio-tungstenite clients.

use chatrelay::app;
use chatrelay::config::ServerConfig;
use chatrelay::protocol::{ClientMessage, ServerMessage};
use chatrelay::state::AppState;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::time::{timeout, Duration};
use tokio_tungstenite::{tungstenite::Message, MaybeTlsStream, WebSocketStream};

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Start a server on a free port, return the WebSocket URL
async fn start_test_server() -> String {
    let config = ServerConfig {
        rate_limit: None,
        ..ServerConfig::default()
    };
    let state = Arc::new(AppState::in_memory(config).await);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        app::serve(listener, state).await.unwrap();
    });

    format!("ws://127.0.0.1:{port}/ws")
}

async fn connect(url: &str) -> Ws {
    let (ws, _) = tokio_tungstenite::connect_async(url)
        .await
        .expect("Should connect to server");
    ws
}

async fn send(ws: &mut Ws, msg: ClientMessage) {
    let json = serde_json::to_string(&msg).unwrap();
    ws.send(Message::Text(json.into())).await.unwrap();
}

async fn recv(ws: &mut Ws) -> ServerMessage {
    loop {
        let msg = timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("Should receive frame within timeout")
            .expect("Connection closed")
            .expect("WebSocket error");
        if let Message::Text(_) = msg {
            return serde_json::from_str(msg.to_text().unwrap()).unwrap();
        }
    }
}

async fn signup_and_login(ws: &mut Ws, name: &str, password: &str) {
    send(
        ws,
        ClientMessage::Signup {
            username: name.to_string(),
            password: password.to_string(),
        },
    )
    .await;
    assert!(matches!(recv(ws).await, ServerMessage::SignupSuccess { .. }));

    send(
        ws,
        ClientMessage::Login {
            username: name.to_string(),
            password: password.to_string(),
        },
    )
    .await;
    assert_eq!(
        recv(ws).await,
        ServerMessage::LoginSuccess {
            username: name.to_string()
        }
    );
}

#[tokio::test]
async fn test_history_is_first_frame() {
    let url = start_test_server().await;
    let mut ws = connect(&url).await;

    match recv(&mut ws).await {
        ServerMessage::LoadMessages {
            session_id,
            messages,
        } => {
            assert!(!session_id.is_empty());
            assert!(messages.is_empty());
        }
        other => panic!("Expected LoadMessages, got {other:?}"),
    }
}

#[tokio::test]
async fn test_two_users_chat_and_whisper() {
    let url = start_test_server().await;

    let mut alice = connect(&url).await;
    assert!(matches!(
        recv(&mut alice).await,
        ServerMessage::LoadMessages { .. }
    ));
    signup_and_login(&mut alice, "alice", "secret1").await;
    assert_eq!(
        recv(&mut alice).await,
        ServerMessage::UserList {
            users: vec!["alice".to_string()]
        }
    );

    let mut bob = connect(&url).await;
    assert!(matches!(
        recv(&mut bob).await,
        ServerMessage::LoadMessages { .. }
    ));
    signup_and_login(&mut bob, "bob", "secret2").await;

    let both = ServerMessage::UserList {
        users: vec!["alice".to_string(), "bob".to_string()],
    };
    assert_eq!(recv(&mut bob).await, both);
    assert_eq!(recv(&mut alice).await, both);

    // Broadcast reaches both, sender included
    send(
        &mut alice,
        ClientMessage::ChatMessage {
            username: Some("alice".to_string()),
            message: "hi".to_string(),
        },
    )
    .await;
    for ws in [&mut alice, &mut bob] {
        match recv(ws).await {
            ServerMessage::ChatMessage {
                username, message, ..
            } => {
                assert_eq!(username, "alice");
                assert_eq!(message, "hi");
            }
            other => panic!("Expected ChatMessage, got {other:?}"),
        }
    }

    // Private message to an online user
    send(
        &mut alice,
        ClientMessage::PrivateMessage {
            recipient: "bob".to_string(),
            message: "psst".to_string(),
        },
    )
    .await;
    assert_eq!(
        recv(&mut bob).await,
        ServerMessage::PrivateMessage {
            sender: Some("alice".to_string()),
            message: "psst".to_string(),
        }
    );

    // Private message to an offline user
    send(
        &mut alice,
        ClientMessage::PrivateMessage {
            recipient: "carol".to_string(),
            message: "anyone?".to_string(),
        },
    )
    .await;
    assert!(matches!(
        recv(&mut alice).await,
        ServerMessage::PrivateMessageFailed { .. }
    ));

    // Bob leaves, alice sees the updated user list
    bob.close(None).await.unwrap();
    assert_eq!(
        recv(&mut alice).await,
        ServerMessage::UserList {
            users: vec!["alice".to_string()]
        }
    );
}

#[tokio::test]
async fn test_signaling_between_sockets() {
    let url = start_test_server().await;

    let mut caller = connect(&url).await;
    let caller_id = match recv(&mut caller).await {
        ServerMessage::LoadMessages { session_id, .. } => session_id,
        other => panic!("Expected LoadMessages, got {other:?}"),
    };
    let mut callee = connect(&url).await;
    let callee_id = match recv(&mut callee).await {
        ServerMessage::LoadMessages { session_id, .. } => session_id,
        other => panic!("Expected LoadMessages, got {other:?}"),
    };

    let sdp = serde_json::json!({"type": "offer", "sdp": "v=0"});
    send(
        &mut caller,
        ClientMessage::Offer {
            target: callee_id.clone(),
            sdp: sdp.clone(),
        },
    )
    .await;
    assert_eq!(
        recv(&mut callee).await,
        ServerMessage::Offer {
            sdp,
            sender: caller_id.clone()
        }
    );

    let answer = serde_json::json!({"type": "answer", "sdp": "v=0"});
    send(
        &mut callee,
        ClientMessage::Answer {
            target: caller_id,
            sdp: answer.clone(),
        },
    )
    .await;
    assert_eq!(
        recv(&mut caller).await,
        ServerMessage::Answer {
            sdp: answer,
            sender: callee_id
        }
    );
}

#[tokio::test]
async fn test_invalid_frame_gets_parse_error() {
    let url = start_test_server().await;
    let mut ws = connect(&url).await;
    let _ = recv(&mut ws).await;

    ws.send(Message::Text("hello".into())).await.unwrap();
    match recv(&mut ws).await {
        ServerMessage::Error { code, .. } => assert_eq!(code, "PARSE_ERROR"),
        other => panic!("Expected Error, got {other:?}"),
    }
}
