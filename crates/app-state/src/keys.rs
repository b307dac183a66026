//! Persistent storage keys
//!
//! Every state slice owns a disjoint set of keys in the shared key-value
//! store.

/// Session token
pub const USER_TOKEN: &str = "userToken";

/// JSON snapshot of the signed-in user
pub const USER_DATA: &str = "userData";

/// JSON array of favourite destinations
pub const FAVOURITES: &str = "@favourites";

/// `"dark"` or `"light"`
pub const THEME_MODE: &str = "@theme_mode";

/// Favourites key written by older builds; only ever removed
pub const LEGACY_FAVOURITES: &str = "favourites";

/// Keys removed when the user logs out. The theme survives logout.
pub const LOGOUT_KEYS: [&str; 4] = [USER_TOKEN, USER_DATA, FAVOURITES, LEGACY_FAVOURITES];
