use std::collections::BTreeMap;
use std::sync::Arc;

use super::{load_or_default, Store};
use crate::error::{ChatError, ChatResult};
use crate::types::Username;

/// Persisted account table: username -> plaintext password
pub type AccountTable = BTreeMap<Username, String>;

/// The account store. Accounts are created on signup and never changed afterwards.
pub struct Accounts {
    table: AccountTable,
    store: Arc<dyn Store<AccountTable>>,
}

impl Accounts {
    /// Load the account table from `store`, starting empty if it cannot be read
    pub async fn open(store: Arc<dyn Store<AccountTable>>) -> Self {
        let table = load_or_default(store.as_ref()).await;
        tracing::info!(accounts = table.len(), store = %store.describe(), "Accounts loaded");
        Self { table, store }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn contains(&self, username: &str) -> bool {
        self.table.contains_key(username)
    }

    /// Exact match on both username and password
    pub fn verify(&self, username: &str, password: &str) -> bool {
        match self.table.get(username) {
            Some(stored) => constant_time_eq(stored.as_bytes(), password.as_bytes()),
            None => false,
        }
    }

    /// Insert a new account and persist the table.
    ///
    /// The in-memory table is updated even if the write fails, so the caller
    /// always observes its own signup.
    pub async fn create(&mut self, username: Username, password: String) -> ChatResult<()> {
        if self.contains(&username) {
            return Err(ChatError::UsernameTaken);
        }
        self.table.insert(username, password);

        if let Err(e) = self.store.save(&self.table).await {
            tracing::error!(error = %e, "Failed to persist accounts");
        }
        Ok(())
    }
}

/// Constant-time byte comparison to prevent timing attacks
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
