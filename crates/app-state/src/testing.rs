//! Test doubles shared by the store tests

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use storage::{KeyValueStore, MemoryStore};

/// In-memory store whose operations yield to the runtime before completing
///
/// Every read waits `read_delay`. The n-th write waits `write_delays[n]`
/// (zero once the schedule runs out), so earlier writes can be made to
/// finish after later ones.
pub(crate) struct DelayedStore {
    inner: MemoryStore,
    read_delay: Duration,
    write_delays: Vec<Duration>,
    writes: AtomicUsize,
}

impl DelayedStore {
    pub(crate) fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            read_delay: Duration::ZERO,
            write_delays: Vec::new(),
            writes: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = delay;
        self
    }

    pub(crate) fn with_write_delays(mut self, delays: impl IntoIterator<Item = Duration>) -> Self {
        self.write_delays = delays.into_iter().collect();
        self
    }
}

#[async_trait]
impl KeyValueStore for DelayedStore {
    async fn get_item(&self, key: &str) -> storage::Result<Option<String>> {
        tokio::time::sleep(self.read_delay).await;
        self.inner.get_item(key).await
    }

    async fn set_item(&self, key: &str, value: &str) -> storage::Result<()> {
        let n = self.writes.fetch_add(1, Ordering::SeqCst);
        let delay = self.write_delays.get(n).copied().unwrap_or_default();
        tokio::time::sleep(delay).await;
        self.inner.set_item(key, value).await
    }

    async fn remove_item(&self, key: &str) -> storage::Result<()> {
        self.inner.remove_item(key).await
    }
}
