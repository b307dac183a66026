//! Application store
//!
//! Owns the four state slices and the collaborators they share. The view
//! layer receives one `AppStore` and reads or subscribes to each slice.

use std::sync::Arc;
use storage::KeyValueStore;
use travel_client::{AuthService, DestinationCatalog, User};

use crate::destinations::{DestinationsState, DestinationsStore};
use crate::favourites::{FavouritesState, FavouritesStore};
use crate::session::{SessionState, SessionStore};
use crate::theme::{ThemeState, ThemeStore};

/// Point-in-time copy of every slice
#[derive(Debug, Clone, PartialEq)]
pub struct AppSnapshot {
    /// Session slice
    pub session: SessionState,
    /// Favourites slice
    pub favourites: FavouritesState,
    /// Theme slice
    pub theme: ThemeState,
    /// Destinations slice
    pub destinations: DestinationsState,
}

/// Composition root of the application state
pub struct AppStore {
    /// Authentication session
    pub session: SessionStore,
    /// Favourite destinations
    pub favourites: FavouritesStore,
    /// Theme preference
    pub theme: ThemeStore,
    /// Destination listing
    pub destinations: DestinationsStore,
}

impl AppStore {
    /// Build every store over the shared collaborators
    pub fn new(
        storage: Arc<dyn KeyValueStore>,
        auth: Arc<dyn AuthService>,
        catalog: Arc<dyn DestinationCatalog>,
    ) -> Self {
        Self {
            session: SessionStore::new(auth, storage.clone()),
            favourites: FavouritesStore::new(storage.clone()),
            theme: ThemeStore::new(storage),
            destinations: DestinationsStore::new(catalog),
        }
    }

    /// Restore the session, theme and favourites from storage concurrently
    ///
    /// Returns the restored user, if any.
    pub async fn hydrate(&self) -> Option<User> {
        let (user, (), ()) = tokio::join!(
            self.session.restore_session(),
            self.theme.load(),
            self.favourites.load(),
        );
        tracing::info!(
            restored = user.is_some(),
            favourites = self.favourites.state().items.len(),
            dark = self.theme.is_dark(),
            "Hydrated application state"
        );
        user
    }

    /// Log out and drop the user's favourites
    pub async fn logout(&self) {
        self.session.logout().await;
        self.favourites.clear().await;
    }

    /// Copy of every slice
    pub fn snapshot(&self) -> AppSnapshot {
        AppSnapshot {
            session: self.session.state(),
            favourites: self.favourites.state(),
            theme: self.theme.state(),
            destinations: self.destinations.state(),
        }
    }
}
