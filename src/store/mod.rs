//! Durable storage for accounts and chat history
//!
//! Both artifacts are small JSON documents rewritten wholesale on every
//! mutation. A missing file loads as the empty default; an unreadable or
//! malformed one is logged and also degrades to the default.

mod accounts;
mod history;

pub use accounts::{AccountTable, Accounts};
pub use history::{History, HistoryLog};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::{StoreError, StoreResult};

/// Backend that persists a single value of type `T`
#[async_trait]
pub trait Store<T>: Send + Sync {
    /// Load the stored value. A missing backing file yields `T::default()`.
    async fn load(&self) -> StoreResult<T>;

    /// Replace the stored value
    async fn save(&self, value: &T) -> StoreResult<()>;

    /// Human readable location, for logs
    fn describe(&self) -> String;
}

/// Load from `store`, logging failures and falling back to the default
pub async fn load_or_default<T: Default>(store: &dyn Store<T>) -> T {
    match store.load().await {
        Ok(value) => value,
        Err(e) => {
            tracing::error!(store = %store.describe(), error = %e, "Failed to load, starting empty");
            T::default()
        }
    }
}

/// Pretty-printed JSON document on disk
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl<T> Store<T> for JsonFileStore
where
    T: Serialize + DeserializeOwned + Default + Send + Sync + 'static,
{
    async fn load(&self) -> StoreResult<T> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        serde_json::from_slice(&bytes).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    async fn save(&self, value: &T) -> StoreResult<()> {
        let json = serde_json::to_vec_pretty(value)?;

        // Write-then-rename so a crash never leaves a truncated document behind
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|source| StoreError::Write {
                path: tmp.clone(),
                source,
            })?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|source| StoreError::Write {
                path: self.path.clone(),
                source,
            })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-process store, used when no file is configured and in tests
#[derive(Debug, Default)]
pub struct MemoryStore<T> {
    value: Mutex<T>,
}

impl<T> MemoryStore<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: Mutex::new(value),
        }
    }
}

impl<T: Clone> MemoryStore<T> {
    /// Last value handed to `save`
    pub fn snapshot(&self) -> T {
        self.value
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl<T> Store<T> for MemoryStore<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn load(&self) -> StoreResult<T> {
        Ok(self.snapshot())
    }

    async fn save(&self, value: &T) -> StoreResult<()> {
        *self
            .value
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = value.clone();
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

/// Build a file-backed store when a path is configured, otherwise an in-memory one
pub fn open_store<T>(path: Option<&Path>) -> Arc<dyn Store<T>>
where
    T: Serialize + DeserializeOwned + Default + Clone + Send + Sync + 'static,
{
    match path {
        Some(path) => Arc::new(JsonFileStore::new(path)),
        None => Arc::new(MemoryStore::new(T::default())),
    }
}
