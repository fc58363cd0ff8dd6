//! Server configuration loaded from environment variables

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::types::DEFAULT_HISTORY_LIMIT;

/// Runtime configuration for the chat relay
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP/WebSocket server listens on
    pub bind_addr: SocketAddr,
    /// Account table (username -> password) JSON file. `None` keeps accounts in memory only.
    pub users_file: Option<PathBuf>,
    /// Chat history JSON file. `None` keeps history in memory only.
    pub messages_file: Option<PathBuf>,
    /// Directory served as static assets
    pub static_dir: PathBuf,
    /// File served at `/`
    pub index_file: PathBuf,
    /// Maximum number of chat messages kept in history
    pub history_limit: usize,
    /// Attribute chat messages to the client-supplied `username` instead of the session's login
    pub trust_client_username: bool,
    /// Inbound event limit per session (None = disabled)
    pub rate_limit: Option<RateLimitConfig>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitConfig {
    pub max_events: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_events: 30,
            window: Duration::from_secs(10),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            users_file: Some(PathBuf::from("users.json")),
            messages_file: Some(PathBuf::from("messages.json")),
            static_dir: PathBuf::from("public"),
            index_file: PathBuf::from("index.html"),
            history_limit: DEFAULT_HISTORY_LIMIT,
            trust_client_username: false,
            rate_limit: Some(RateLimitConfig::default()),
        }
    }
}

fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| v != "0" && v.to_lowercase() != "false")
        .unwrap_or(default)
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(key, value = %raw, "Invalid value, using default");
                default
            }
        },
        Err(_) => default,
    }
}

/// Empty string disables file persistence for that store
fn env_path(key: &str, default: Option<PathBuf>) -> Option<PathBuf> {
    match std::env::var(key) {
        Ok(raw) if raw.trim().is_empty() => None,
        Ok(raw) => Some(PathBuf::from(raw.trim())),
        Err(_) => default,
    }
}

impl ServerConfig {
    /// Load config from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bind_addr = env_parse("CHAT_BIND_ADDR", defaults.bind_addr);
        let users_file = env_path("CHAT_USERS_FILE", defaults.users_file);
        let messages_file = env_path("CHAT_MESSAGES_FILE", defaults.messages_file);
        let static_dir = env_parse("CHAT_STATIC_DIR", defaults.static_dir);
        let index_file = env_parse("CHAT_INDEX_FILE", defaults.index_file);

        let mut history_limit = env_parse("CHAT_HISTORY_LIMIT", defaults.history_limit);
        if history_limit == 0 {
            tracing::warn!("CHAT_HISTORY_LIMIT must be positive, using default");
            history_limit = DEFAULT_HISTORY_LIMIT;
        }

        let trust_client_username = env_flag("CHAT_TRUST_CLIENT_USERNAME", false);

        let rate_limit = if env_flag("CHAT_RATE_LIMIT", true) {
            let fallback = RateLimitConfig::default();
            Some(RateLimitConfig {
                max_events: env_parse("CHAT_RATE_LIMIT_MAX", fallback.max_events),
                window: Duration::from_secs(env_parse(
                    "CHAT_RATE_LIMIT_WINDOW",
                    fallback.window.as_secs(),
                )),
            })
        } else {
            None
        };

        if trust_client_username {
            tracing::warn!(
                "CHAT_TRUST_CLIENT_USERNAME is set - chat messages carry unverified usernames"
            );
        }

        tracing::info!(
            %bind_addr,
            ?users_file,
            ?messages_file,
            history_limit,
            trust_client_username,
            rate_limit_enabled = rate_limit.is_some(),
            "Server config loaded"
        );

        Self {
            bind_addr,
            users_file,
            messages_file,
            static_dir,
            index_file,
            history_limit,
            trust_client_username,
            rate_limit,
        }
    }
}
