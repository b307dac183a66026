//! Storage layer for GoMate
//!
//! This crate provides the on-device key-value store used to persist the
//! session, favourites and theme. Values are always stored as text; structured
//! values are JSON encoded through [`read_json`] and [`write_json`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod kv;
pub mod memory;

pub use kv::{KvConfig, KvStore};
pub use memory::MemoryStore;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Storage error types
#[derive(Debug, Error)]
pub enum StorageError {
    /// Sled database error
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored bytes are not valid UTF-8 text
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Backend-specific failure
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// Text key-value store shared by every state slice
///
/// Read, write and remove are the only operations the application needs.
/// Implementations must be safe to share between stores; each store uses its
/// own disjoint keys.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`
    async fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    async fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; removing a missing key is not an error
    async fn remove_item(&self, key: &str) -> Result<()>;

    /// Remove several keys
    ///
    /// Every key is attempted even if an earlier removal fails. The first
    /// failure is returned.
    async fn multi_remove(&self, keys: &[&str]) -> Result<()> {
        let mut first_error = None;
        for key in keys {
            if let Err(e) = self.remove_item(key).await {
                tracing::warn!(key = *key, error = %e, "Failed to remove key");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Read and decode a JSON value stored under `key`
pub async fn read_json<T, S>(store: &S, key: &str) -> Result<Option<T>>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    match store.get_item(key).await? {
        Some(text) => Ok(Some(serde_json::from_str(&text)?)),
        None => Ok(None),
    }
}

/// Encode `value` as JSON and store it under `key`
pub async fn write_json<T, S>(store: &S, key: &str, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let text = serde_json::to_string(value)?;
    store.set_item(key, &text).await
}
