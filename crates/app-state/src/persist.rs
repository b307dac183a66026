//! Best-effort writes to the key-value store
//!
//! Storage mirrors the in-memory state and is never authoritative while the
//! app is running. These helpers log every failure and hand the error back;
//! callers are free to drop it, and no state transition waits on it.

use serde::Serialize;
use storage::{KeyValueStore, StorageError};

/// Store `value` under `key`
pub async fn persist(
    store: &dyn KeyValueStore,
    key: &str,
    value: &str,
) -> Result<(), StorageError> {
    store.set_item(key, value).await.map_err(|e| {
        tracing::warn!(key, error = %e, "Failed to persist value");
        e
    })
}

/// Store `value` as JSON under `key`
pub async fn persist_json<T>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError>
where
    T: Serialize + ?Sized,
{
    storage::write_json(store, key, value).await.map_err(|e| {
        tracing::warn!(key, error = %e, "Failed to persist JSON value");
        e
    })
}

/// Remove `keys`
pub async fn forget(store: &dyn KeyValueStore, keys: &[&str]) -> Result<(), StorageError> {
    store.multi_remove(keys).await.map_err(|e| {
        tracing::warn!(?keys, error = %e, "Failed to remove persisted keys");
        e
    })
}
