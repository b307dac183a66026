//! Application state for GoMate
//!
//! Each slice of state (session, favourites, theme, destinations) lives in
//! its own store. A store holds its state in a `watch` channel, changes it
//! only by applying typed actions, and mirrors the persistent part to a
//! shared key-value store.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod app;
pub mod destinations;
pub mod favourites;
pub mod keys;
pub mod persist;
pub mod session;
pub mod theme;

#[cfg(test)]
mod testing;

pub use app::{AppSnapshot, AppStore};
pub use destinations::{DestinationsAction, DestinationsState, DestinationsStore, FetchError};
pub use favourites::{FavouritesAction, FavouritesState, FavouritesStore};
pub use session::{AuthError, SessionAction, SessionState, SessionStatus, SessionStore};
pub use theme::{ThemeMode, ThemeState, ThemeStore};
