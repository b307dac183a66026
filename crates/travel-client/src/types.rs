//! Records exchanged with the GoMate backends
//!
//! Field names on the wire follow the backends' camelCase JSON. Destination
//! records keep the short `image`/`lat`/`lng` keys so that persisted
//! favourites snapshots stay readable by older builds.

use serde::{Deserialize, Serialize};

/// An authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Numeric user id assigned by the backend
    pub id: u64,

    /// Login name
    pub username: String,

    /// Email address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Given name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    /// Family name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl User {
    /// Create a user with only the required fields
    pub fn new(id: u64, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            email: None,
            first_name: None,
            last_name: None,
        }
    }

    /// "First Last", falling back to the username
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => self.username.clone(),
        }
    }
}

/// Login credentials
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    /// Login name
    pub username: String,
    /// Password
    pub password: String,
}

impl Credentials {
    /// Create credentials
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: username.into(), password: password.into() }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Fields submitted when creating an account
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Login name
    pub username: String,
    /// Email address
    pub email: String,
    /// Password
    pub password: String,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Successful response of the login endpoint
///
/// The backend has used both `token` and `accessToken` for the session
/// token. Either is accepted; `token` wins when both are present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LoginPayload")]
pub struct LoginResponse {
    /// The authenticated user
    #[serde(flatten)]
    pub user: User,

    /// Opaque session token
    pub token: String,
}

#[derive(Deserialize)]
struct LoginPayload {
    #[serde(flatten)]
    user: User,
    token: Option<String>,
    #[serde(rename = "accessToken")]
    access_token: Option<String>,
}

impl TryFrom<LoginPayload> for LoginResponse {
    type Error = String;

    fn try_from(payload: LoginPayload) -> Result<Self, Self::Error> {
        let token = payload
            .token
            .or(payload.access_token)
            .ok_or_else(|| "missing field `token`".to_string())?;
        Ok(Self { user: payload.user, token })
    }
}

/// Status tag shown on a destination card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DestinationStatus {
    /// Popular with travellers
    Popular,
    /// Currently trending
    Trending,
    /// Must visit
    #[serde(rename = "Must Visit")]
    MustVisit,
}

impl DestinationStatus {
    /// Status assigned to the record at `index` when the source has none
    pub fn for_index(index: usize) -> Self {
        match index % 3 {
            0 => DestinationStatus::Popular,
            1 => DestinationStatus::Trending,
            _ => DestinationStatus::MustVisit,
        }
    }

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            DestinationStatus::Popular => "Popular",
            DestinationStatus::Trending => "Trending",
            DestinationStatus::MustVisit => "Must Visit",
        }
    }
}

impl std::fmt::Display for DestinationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A destination from the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    /// Unique id
    pub id: String,
    /// Country or place name
    pub name: String,
    /// Short description (region)
    pub description: String,
    /// Flag or cover image URL
    #[serde(rename = "image")]
    pub image_url: String,
    /// Capital city
    pub capital: String,
    /// Population
    pub population: u64,
    /// Area in km²
    pub area: f64,
    /// Comma-separated spoken languages
    pub languages: String,
    /// Currency name
    pub currency: String,
    /// Continent
    pub continent: String,
    /// Primary timezone
    pub timezone: String,
    /// Latitude
    #[serde(rename = "lat")]
    pub latitude: f64,
    /// Longitude
    #[serde(rename = "lng")]
    pub longitude: f64,
    /// Status tag
    pub status: DestinationStatus,
}

impl Destination {
    /// Case-insensitive substring match on name or description
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.name.to_lowercase().contains(&query)
            || self.description.to_lowercase().contains(&query)
    }
}
