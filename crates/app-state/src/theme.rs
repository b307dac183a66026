//! Light/dark theme preference

use std::sync::Arc;
use storage::KeyValueStore;
use tokio::sync::{watch, Mutex};

use crate::keys;
use crate::persist::persist;

/// Persisted theme mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeMode {
    /// Light theme
    #[default]
    Light,
    /// Dark theme
    Dark,
}

impl ThemeMode {
    /// Stored representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        }
    }

    /// Parse a stored value; anything other than `"dark"` is light
    pub fn from_stored(value: &str) -> Self {
        if value == "dark" {
            ThemeMode::Dark
        } else {
            ThemeMode::Light
        }
    }

    fn from_dark(is_dark: bool) -> Self {
        if is_dark {
            ThemeMode::Dark
        } else {
            ThemeMode::Light
        }
    }
}

/// Theme slice of the application state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThemeState {
    /// Dark theme selected
    pub is_dark: bool,
}

impl ThemeState {
    /// Current mode
    pub fn mode(&self) -> ThemeMode {
        ThemeMode::from_dark(self.is_dark)
    }
}

/// Theme store
pub struct ThemeStore {
    state: watch::Sender<ThemeState>,
    storage: Arc<dyn KeyValueStore>,
    write_lock: Mutex<()>,
}

impl ThemeStore {
    /// Create a store in light mode
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            state: watch::Sender::new(ThemeState::default()),
            storage,
            write_lock: Mutex::new(()),
        }
    }

    /// Current state
    pub fn state(&self) -> ThemeState {
        *self.state.borrow()
    }

    /// Receive every subsequent state change
    pub fn subscribe(&self) -> watch::Receiver<ThemeState> {
        self.state.subscribe()
    }

    /// Whether the dark theme is selected
    pub fn is_dark(&self) -> bool {
        self.state().is_dark
    }

    /// Read the persisted mode; a missing value keeps the current one
    ///
    /// Holds the write lock, so a toggle issued during the read is applied
    /// on top of the loaded value.
    pub async fn load(&self) {
        let _guard = self.write_lock.lock().await;
        match self.storage.get_item(keys::THEME_MODE).await {
            Ok(Some(value)) => {
                let mode = ThemeMode::from_stored(&value);
                tracing::debug!(mode = mode.as_str(), "Theme loaded");
                self.state.send_modify(|s| s.is_dark = mode == ThemeMode::Dark);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Failed to read theme mode"),
        }
    }

    /// Flip the theme and persist it. Returns the new dark flag.
    pub async fn toggle(&self) -> bool {
        let _guard = self.write_lock.lock().await;
        let is_dark = !self.is_dark();
        self.apply(is_dark).await;
        is_dark
    }

    /// Select dark or light explicitly and persist it
    pub async fn set_dark(&self, is_dark: bool) {
        let _guard = self.write_lock.lock().await;
        self.apply(is_dark).await;
    }

    async fn apply(&self, is_dark: bool) {
        self.state.send_modify(|s| s.is_dark = is_dark);
        let mode = ThemeMode::from_dark(is_dark);
        tracing::debug!(mode = mode.as_str(), "Theme changed");
        let _ = persist(&*self.storage, keys::THEME_MODE, mode.as_str()).await;
    }
}
