use std::collections::VecDeque;
use std::sync::Arc;

use super::{load_or_default, Store};
use crate::types::ChatMessage;

/// Persisted history: oldest message first
pub type HistoryLog = VecDeque<ChatMessage>;

/// Bounded, ordered history of broadcast chat messages.
/// Once full, each append evicts the oldest message.
pub struct History {
    messages: HistoryLog,
    limit: usize,
    store: Arc<dyn Store<HistoryLog>>,
}

impl History {
    /// Load history from `store`, keeping only the newest `limit` entries
    pub async fn open(store: Arc<dyn Store<HistoryLog>>, limit: usize) -> Self {
        let mut messages = load_or_default(store.as_ref()).await;
        let limit = limit.max(1);
        while messages.len() > limit {
            messages.pop_front();
        }
        tracing::info!(messages = messages.len(), store = %store.describe(), "History loaded");
        Self {
            messages,
            limit,
            store,
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Copy of the current history, oldest first
    pub fn snapshot(&self) -> Vec<ChatMessage> {
        self.messages.iter().cloned().collect()
    }

    /// Append `message`, evicting the oldest entries beyond the limit, and persist
    pub async fn append(&mut self, message: ChatMessage) {
        self.messages.push_back(message);
        while self.messages.len() > self.limit {
            self.messages.pop_front();
        }

        if let Err(e) = self.store.save(&self.messages).await {
            tracing::error!(error = %e, "Failed to persist chat history");
        }
    }
}
