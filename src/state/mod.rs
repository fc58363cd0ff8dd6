mod presence;
pub mod registry;
mod relay;
mod signaling;

pub use registry::{ConnectionRegistry, Outbox, OUTBOX_CAPACITY};

use crate::abuse::RateLimiter;
use crate::config::ServerConfig;
use crate::store::{open_store, AccountTable, Accounts, History, HistoryLog, Store};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared application state.
///
/// Lock order, when more than one is held: `accounts`, then `history`, then `registry`.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RwLock<ConnectionRegistry>>,
    pub accounts: Arc<RwLock<Accounts>>,
    pub history: Arc<RwLock<History>>,
    pub config: Arc<ServerConfig>,
    /// Per-session inbound limiter (None = disabled)
    pub rate_limiter: Option<RateLimiter>,
}

impl AppState {
    /// Build state from config, loading accounts and history from the configured files
    pub async fn open(config: ServerConfig) -> Self {
        let account_store = open_store::<AccountTable>(config.users_file.as_deref());
        let history_store = open_store::<HistoryLog>(config.messages_file.as_deref());
        Self::with_stores(config, account_store, history_store).await
    }

    pub async fn with_stores(
        config: ServerConfig,
        account_store: Arc<dyn Store<AccountTable>>,
        history_store: Arc<dyn Store<HistoryLog>>,
    ) -> Self {
        let accounts = Accounts::open(account_store).await;
        let history = History::open(history_store, config.history_limit).await;
        let rate_limiter = config
            .rate_limit
            .as_ref()
            .map(|rl| RateLimiter::new(rl.max_events, rl.window));

        Self {
            registry: Arc::new(RwLock::new(ConnectionRegistry::new())),
            accounts: Arc::new(RwLock::new(accounts)),
            history: Arc::new(RwLock::new(history)),
            config: Arc::new(config),
            rate_limiter,
        }
    }

    /// Fresh state with nothing persisted to disk
    pub async fn in_memory(config: ServerConfig) -> Self {
        let config = ServerConfig {
            users_file: None,
            messages_file: None,
            ..config
        };
        Self::open(config).await
    }
}
