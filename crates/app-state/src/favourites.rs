//! Favourite destinations
//!
//! An ordered collection with at most one entry per destination id. After
//! every mutation the full collection is written to storage as a JSON
//! snapshot. Mutations hold an async mutex for their whole
//! read-modify-write cycle, so the snapshot order matches the order in
//! which mutations were applied.

use std::sync::Arc;
use storage::KeyValueStore;
use tokio::sync::{watch, Mutex};
use travel_client::Destination;

use crate::keys;
use crate::persist::{forget, persist_json};

/// Favourites slice of the application state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FavouritesState {
    /// Favourites in insertion order
    pub items: Vec<Destination>,
    /// The persisted snapshot is being read
    pub loading: bool,
}

impl FavouritesState {
    /// Whether a destination with `id` is a favourite
    pub fn contains(&self, id: &str) -> bool {
        self.items.iter().any(|d| d.id == id)
    }
}

/// State transitions of the favourites slice
#[derive(Debug, Clone, PartialEq)]
pub enum FavouritesAction {
    /// Snapshot read started
    LoadStarted,
    /// Snapshot read finished; `None` when there was nothing usable
    LoadFinished(Option<Vec<Destination>>),
    /// Add unless the id is already present
    Added(Destination),
    /// Remove by id
    Removed(String),
    /// Replace the whole collection
    Replaced(Vec<Destination>),
    /// Empty the collection
    Cleared,
}

impl FavouritesAction {
    fn name(&self) -> &'static str {
        match self {
            FavouritesAction::LoadStarted => "load_started",
            FavouritesAction::LoadFinished(_) => "load_finished",
            FavouritesAction::Added(_) => "added",
            FavouritesAction::Removed(_) => "removed",
            FavouritesAction::Replaced(_) => "replaced",
            FavouritesAction::Cleared => "cleared",
        }
    }
}

/// Keep the first occurrence of every id
fn dedup_by_id(items: Vec<Destination>) -> Vec<Destination> {
    let mut seen = std::collections::HashSet::new();
    items.into_iter().filter(|d| seen.insert(d.id.clone())).collect()
}

impl FavouritesState {
    /// Apply a transition
    pub fn apply(&mut self, action: FavouritesAction) {
        match action {
            FavouritesAction::LoadStarted => self.loading = true,
            FavouritesAction::LoadFinished(items) => {
                self.loading = false;
                if let Some(items) = items {
                    self.items = dedup_by_id(items);
                }
            }
            FavouritesAction::Added(destination) => {
                if !self.contains(&destination.id) {
                    self.items.push(destination);
                }
            }
            FavouritesAction::Removed(id) => self.items.retain(|d| d.id != id),
            FavouritesAction::Replaced(items) => self.items = dedup_by_id(items),
            FavouritesAction::Cleared => self.items.clear(),
        }
    }
}

/// Favourites store
pub struct FavouritesStore {
    state: watch::Sender<FavouritesState>,
    storage: Arc<dyn KeyValueStore>,
    write_lock: Mutex<()>,
}

impl FavouritesStore {
    /// Create an empty favourites store
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            state: watch::Sender::new(FavouritesState::default()),
            storage,
            write_lock: Mutex::new(()),
        }
    }

    /// Current state
    pub fn state(&self) -> FavouritesState {
        self.state.borrow().clone()
    }

    /// Receive every subsequent state change
    pub fn subscribe(&self) -> watch::Receiver<FavouritesState> {
        self.state.subscribe()
    }

    /// Whether a destination with `id` is a favourite
    pub fn is_favourite(&self, id: &str) -> bool {
        self.state.borrow().contains(id)
    }

    fn dispatch(&self, action: FavouritesAction) -> FavouritesState {
        tracing::debug!(action = action.name(), "favourites");
        self.state.send_modify(|state| state.apply(action));
        self.state()
    }

    async fn write_snapshot(&self, items: &[Destination]) {
        let _ = persist_json(&*self.storage, keys::FAVOURITES, items).await;
    }

    /// Read the persisted snapshot
    ///
    /// A missing or unparsable snapshot leaves the collection as it was.
    pub async fn load(&self) {
        let _guard = self.write_lock.lock().await;
        self.dispatch(FavouritesAction::LoadStarted);

        let snapshot = storage::read_json::<Vec<Destination>, _>(&*self.storage, keys::FAVOURITES);
        let items = match snapshot.await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable favourites snapshot");
                None
            }
        };

        let state = self.dispatch(FavouritesAction::LoadFinished(items));
        tracing::debug!(count = state.items.len(), "Favourites loaded");
    }

    /// Remove `destination` if it is a favourite, otherwise append it
    ///
    /// Returns whether the destination is a favourite afterwards.
    pub async fn toggle(&self, destination: Destination) -> bool {
        let _guard = self.write_lock.lock().await;

        let action = if self.is_favourite(&destination.id) {
            FavouritesAction::Removed(destination.id)
        } else {
            FavouritesAction::Added(destination)
        };
        let added = matches!(action, FavouritesAction::Added(_));

        let state = self.dispatch(action);
        self.write_snapshot(&state.items).await;
        added
    }

    /// Append `destination` unless its id is already present
    pub async fn add(&self, destination: Destination) {
        let _guard = self.write_lock.lock().await;
        if self.is_favourite(&destination.id) {
            return;
        }
        let state = self.dispatch(FavouritesAction::Added(destination));
        self.write_snapshot(&state.items).await;
    }

    /// Remove the favourite with `id`
    pub async fn remove(&self, id: &str) {
        let _guard = self.write_lock.lock().await;
        let state = self.dispatch(FavouritesAction::Removed(id.to_string()));
        self.write_snapshot(&state.items).await;
    }

    /// Replace the collection, dropping repeated ids
    pub async fn set(&self, items: Vec<Destination>) {
        let _guard = self.write_lock.lock().await;
        let state = self.dispatch(FavouritesAction::Replaced(items));
        self.write_snapshot(&state.items).await;
    }

    /// Empty the collection and remove the snapshot
    pub async fn clear(&self) {
        let _guard = self.write_lock.lock().await;
        self.dispatch(FavouritesAction::Cleared);
        let _ = forget(&*self.storage, &[keys::FAVOURITES]).await;
    }
}
