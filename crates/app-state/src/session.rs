//! Session state management
//!
//! The session store owns the signed-in user and token. Every change goes
//! through [`SessionAction`] and [`SessionState::apply`]; the async
//! operations on [`SessionStore`] talk to the authentication service and the
//! key-value store, then apply the resulting action.
//!
//! ```text
//!              login / register
//!  Anonymous ───────────────────► Authenticating ──► Authenticated
//!      ▲                               │                   │
//!      │                               ▼                   │
//!      │                           AuthError               │
//!      └──────────────────── logout ───────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storage::KeyValueStore;
use tokio::sync::watch;
use travel_client::{ApiError, AuthService, Credentials, Registration, User};

use crate::keys;
use crate::persist::{forget, persist, persist_json};

/// Authentication failures surfaced to the user
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// The service refused the credentials or the registration
    #[error("{0}")]
    Rejected(String),

    /// The request failed before the service could answer
    #[error("{0}")]
    Transport(String),
}

impl AuthError {
    fn from_login(err: ApiError) -> Self {
        if err.is_rejection() {
            AuthError::Rejected(err.server_message().unwrap_or("Login failed").to_string())
        } else {
            AuthError::Transport(err.message().to_string())
        }
    }

    fn from_registration(err: ApiError) -> Self {
        if err.is_rejection() {
            AuthError::Rejected("Registration failed".to_string())
        } else {
            AuthError::Transport(err.message().to_string())
        }
    }
}

/// Coarse session status derived from [`SessionState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Nobody is signed in
    Anonymous,
    /// A login or registration is in flight
    Authenticating,
    /// A user is signed in
    Authenticated,
    /// The last login or registration failed
    AuthError,
}

/// Session slice of the application state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    /// Signed-in user
    pub user: Option<User>,
    /// Session token
    pub token: Option<String>,
    /// Whether `user` and `token` are populated
    pub is_authenticated: bool,
    /// A login or registration is in flight
    pub loading: bool,
    /// Message of the last failure
    pub error: Option<String>,
}

/// State transitions of the session slice
#[derive(Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Login request sent
    LoginStarted,
    /// Login accepted
    LoginSucceeded {
        /// Signed-in user
        user: User,
        /// Issued token
        token: String,
    },
    /// Login failed with a message
    LoginFailed(String),
    /// Registration request sent
    RegisterStarted,
    /// Registration accepted
    RegisterSucceeded {
        /// Created user
        user: User,
        /// Session token
        token: String,
    },
    /// Registration failed with a message
    RegisterFailed(String),
    /// Session rehydrated from storage
    Restored {
        /// Persisted user
        user: User,
        /// Persisted token
        token: String,
    },
    /// User logged out
    LoggedOut,
}

impl SessionAction {
    /// Action name for logs; never includes the token
    pub fn name(&self) -> &'static str {
        match self {
            SessionAction::LoginStarted => "login_started",
            SessionAction::LoginSucceeded { .. } => "login_succeeded",
            SessionAction::LoginFailed(_) => "login_failed",
            SessionAction::RegisterStarted => "register_started",
            SessionAction::RegisterSucceeded { .. } => "register_succeeded",
            SessionAction::RegisterFailed(_) => "register_failed",
            SessionAction::Restored { .. } => "restored",
            SessionAction::LoggedOut => "logged_out",
        }
    }
}

impl std::fmt::Debug for SessionAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl SessionState {
    /// Apply a transition
    pub fn apply(&mut self, action: SessionAction) {
        match action {
            SessionAction::LoginStarted | SessionAction::RegisterStarted => {
                self.loading = true;
                self.error = None;
            }
            SessionAction::LoginSucceeded { user, token }
            | SessionAction::RegisterSucceeded { user, token } => {
                self.loading = false;
                self.is_authenticated = true;
                self.user = Some(user);
                self.token = Some(token);
                self.error = None;
            }
            SessionAction::LoginFailed(message) | SessionAction::RegisterFailed(message) => {
                self.loading = false;
                self.error = Some(message);
            }
            SessionAction::Restored { user, token } => {
                self.is_authenticated = true;
                self.user = Some(user);
                self.token = Some(token);
            }
            SessionAction::LoggedOut => *self = SessionState::default(),
        }
    }

    /// Derived status
    pub fn status(&self) -> SessionStatus {
        if self.loading {
            SessionStatus::Authenticating
        } else if self.is_authenticated {
            SessionStatus::Authenticated
        } else if self.error.is_some() {
            SessionStatus::AuthError
        } else {
            SessionStatus::Anonymous
        }
    }
}

/// Token stored after a successful registration
///
/// The registration service issues no token, so one is made up locally. It
/// is not accepted by any backend.
fn placeholder_token() -> String {
    format!("dummy-token-{}", chrono::Utc::now().timestamp_millis())
}

/// Session store
pub struct SessionStore {
    state: watch::Sender<SessionState>,
    auth: Arc<dyn AuthService>,
    storage: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    /// Create an empty (anonymous) session store
    pub fn new(auth: Arc<dyn AuthService>, storage: Arc<dyn KeyValueStore>) -> Self {
        Self { state: watch::Sender::new(SessionState::default()), auth, storage }
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receive every subsequent state change
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    fn dispatch(&self, action: SessionAction) {
        tracing::debug!(action = action.name(), "session");
        self.state.send_modify(|state| state.apply(action));
    }

    /// Log in with `credentials`
    ///
    /// On success the token and the full login response are persisted. A
    /// failed write is logged and does not fail the login.
    pub async fn login(&self, credentials: &Credentials) -> Result<User, AuthError> {
        self.dispatch(SessionAction::LoginStarted);

        let response = match self.auth.login(credentials).await {
            Ok(response) => response,
            Err(e) => {
                let err = AuthError::from_login(e);
                tracing::info!(username = %credentials.username, error = %err, "Login failed");
                self.dispatch(SessionAction::LoginFailed(err.to_string()));
                return Err(err);
            }
        };

        let _ = persist(&*self.storage, keys::USER_TOKEN, &response.token).await;
        let _ = persist_json(&*self.storage, keys::USER_DATA, &response).await;

        tracing::info!(username = %response.user.username, "Logged in");
        let user = response.user.clone();
        self.dispatch(SessionAction::LoginSucceeded { user: response.user, token: response.token });
        Ok(user)
    }

    /// Create an account and sign in as it
    pub async fn register(&self, registration: &Registration) -> Result<User, AuthError> {
        self.dispatch(SessionAction::RegisterStarted);

        let user = match self.auth.register(registration).await {
            Ok(user) => user,
            Err(e) => {
                let err = AuthError::from_registration(e);
                tracing::info!(
                    username = %registration.username,
                    error = %err,
                    "Registration failed"
                );
                self.dispatch(SessionAction::RegisterFailed(err.to_string()));
                return Err(err);
            }
        };

        let token = placeholder_token();
        tracing::warn!(username = %user.username, "Using a locally generated session token");

        let _ = persist(&*self.storage, keys::USER_TOKEN, &token).await;
        let _ = persist_json(&*self.storage, keys::USER_DATA, &user).await;

        self.dispatch(SessionAction::RegisterSucceeded { user: user.clone(), token });
        Ok(user)
    }

    /// Log out
    ///
    /// Removes the session and favourites keys. The in-memory session is
    /// reset even if the removal fails.
    pub async fn logout(&self) {
        let _ = forget(&*self.storage, &keys::LOGOUT_KEYS).await;
        self.dispatch(SessionAction::LoggedOut);
        tracing::info!("Logged out");
    }

    /// Rehydrate the session from storage without contacting the network
    ///
    /// Returns the restored user. A missing or unreadable session leaves the
    /// state untouched.
    pub async fn restore_session(&self) -> Option<User> {
        let token = self.read_key(keys::USER_TOKEN).await?;
        let user_data = self.read_key(keys::USER_DATA).await?;

        let user: User = match serde_json::from_str(&user_data) {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring malformed persisted user");
                return None;
            }
        };

        tracing::info!(username = %user.username, "Session restored");
        self.dispatch(SessionAction::Restored { user: user.clone(), token });
        Some(user)
    }

    async fn read_key(&self, key: &str) -> Option<String> {
        match self.storage.get_item(key).await {
            Ok(Some(value)) if !value.is_empty() => Some(value),
            Ok(_) => {
                tracing::debug!(key, "No persisted value");
                None
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to read persisted session");
                None
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use storage::{MemoryStore, StorageError};
    use travel_client::LoginResponse;

    /// Authentication service answering from canned results
    pub(crate) struct StubAuth {
        pub login: std::result::Result<LoginResponse, ApiError>,
        pub register: std::result::Result<User, ApiError>,
    }

    impl StubAuth {
        pub(crate) fn accepting(username: &str, token: &str) -> Self {
            Self {
                login: Ok(LoginResponse { user: User::new(1, username), token: token.to_string() }),
                register: Ok(User::new(2, username)),
            }
        }

        pub(crate) fn rejecting(message: &str) -> Self {
            Self {
                login: Err(ApiError::from_server(400, message)),
                register: Err(ApiError::from_server(400, message)),
            }
        }

        pub(crate) fn unreachable() -> Self {
            Self {
                login: Err(ApiError::network("error sending request")),
                register: Err(ApiError::network("error sending request")),
            }
        }
    }

    #[async_trait]
    impl AuthService for StubAuth {
        async fn login(&self, _: &Credentials) -> std::result::Result<LoginResponse, ApiError> {
            self.login.clone()
        }

        async fn register(&self, _: &Registration) -> std::result::Result<User, ApiError> {
            self.register.clone()
        }
    }

    mockall::mock! {
        pub Storage {}

        #[async_trait]
        impl KeyValueStore for Storage {
            async fn get_item(&self, key: &str) -> storage::Result<Option<String>>;
            async fn set_item(&self, key: &str, value: &str) -> storage::Result<()>;
            async fn remove_item(&self, key: &str) -> storage::Result<()>;
        }
    }

    /// Storage whose every operation fails
    pub(crate) fn broken_storage() -> MockStorage {
        let mut storage = MockStorage::new();
        storage
            .expect_get_item()
            .returning(|_| Err(StorageError::Backend("read failed".to_string())));
        storage
            .expect_set_item()
            .returning(|_, _| Err(StorageError::Backend("write failed".to_string())));
        storage
            .expect_remove_item()
            .returning(|_| Err(StorageError::Backend("remove failed".to_string())));
        storage
    }

    fn registration() -> Registration {
        Registration {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "engine1".to_string(),
        }
    }

    fn store_with(auth: StubAuth, storage: MemoryStore) -> SessionStore {
        SessionStore::new(Arc::new(auth), Arc::new(storage))
    }

    #[test]
    fn test_reducer_transitions() {
        let mut state = SessionState::default();
        assert_eq!(state.status(), SessionStatus::Anonymous);

        state.apply(SessionAction::LoginStarted);
        assert_eq!(state.status(), SessionStatus::Authenticating);

        state.apply(SessionAction::LoginFailed("nope".to_string()));
        assert_eq!(state.status(), SessionStatus::AuthError);
        assert!(!state.is_authenticated);

        state.apply(SessionAction::LoginStarted);
        assert!(state.error.is_none());

        state.apply(SessionAction::LoginSucceeded {
            user: User::new(1, "emilys"),
            token: "abc".to_string(),
        });
        assert_eq!(state.status(), SessionStatus::Authenticated);

        state.apply(SessionAction::LoggedOut);
        assert_eq!(state, SessionState::default());
    }

    #[test]
    fn test_action_debug_hides_token() {
        let action = SessionAction::Restored {
            user: User::new(1, "emilys"),
            token: "secret".to_string(),
        };
        assert_eq!(format!("{:?}", action), "restored");
    }

    #[tokio::test]
    async fn test_login_success() {
        let storage = MemoryStore::new();
        let store = store_with(StubAuth::accepting("emilys", "abc"), storage.clone());

        let user = store
            .login(&Credentials::new("emilys", "emilyspass"))
            .await
            .unwrap();
        assert_eq!(user.username, "emilys");

        let state = store.state();
        assert!(state.is_authenticated);
        assert!(!state.loading);
        assert_eq!(state.user.unwrap().username, "emilys");
        assert_eq!(state.token.as_deref(), Some("abc"));

        assert_eq!(storage.get_item(keys::USER_TOKEN).await.unwrap(), Some("abc".to_string()));
        let data = storage.get_item(keys::USER_DATA).await.unwrap().unwrap();
        let persisted: serde_json::Value = serde_json::from_str(&data).unwrap();
        assert_eq!(persisted["username"], "emilys");
        assert_eq!(persisted["token"], "abc");
    }

    #[tokio::test]
    async fn test_login_rejected() {
        let storage = MemoryStore::new();
        let store = store_with(StubAuth::rejecting("Invalid credentials"), storage.clone());

        let err = store.login(&Credentials::new("x", "wrong")).await.unwrap_err();
        assert_eq!(err, AuthError::Rejected("Invalid credentials".to_string()));

        let state = store.state();
        assert!(!state.is_authenticated);
        assert!(!state.loading);
        assert_eq!(state.error.as_deref(), Some("Invalid credentials"));
        assert_eq!(state.status(), SessionStatus::AuthError);
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn test_login_rejected_without_message() {
        let auth = StubAuth {
            login: Err(ApiError::http(401, "HTTP 401: ")),
            register: Ok(User::new(2, "ada")),
        };
        let store = store_with(auth, MemoryStore::new());

        store.login(&Credentials::new("x", "y")).await.unwrap_err();
        assert_eq!(store.state().error.as_deref(), Some("Login failed"));
    }

    #[tokio::test]
    async fn test_login_transport_failure() {
        let store = store_with(StubAuth::unreachable(), MemoryStore::new());

        let err = store.login(&Credentials::new("emilys", "emilyspass")).await.unwrap_err();
        assert!(matches!(err, AuthError::Transport(_)));
        assert_eq!(store.state().error.as_deref(), Some("error sending request"));
    }

    #[tokio::test]
    async fn test_login_survives_storage_failure() {
        let store = SessionStore::new(
            Arc::new(StubAuth::accepting("emilys", "abc")),
            Arc::new(broken_storage()),
        );

        store.login(&Credentials::new("emilys", "emilyspass")).await.unwrap();
        assert!(store.state().is_authenticated);
    }

    #[tokio::test]
    async fn test_register_synthesizes_token() {
        let storage = MemoryStore::new();
        let store = store_with(StubAuth::accepting("ada", "unused"), storage.clone());

        let user = store.register(&registration()).await.unwrap();
        assert_eq!(user.id, 2);

        let state = store.state();
        assert!(state.is_authenticated);
        assert!(state.token.as_deref().unwrap().starts_with("dummy-token-"));
        assert_eq!(storage.get_item(keys::USER_TOKEN).await.unwrap(), state.token);
        assert!(storage.contains(keys::USER_DATA));
    }

    #[tokio::test]
    async fn test_register_rejected() {
        let store = store_with(StubAuth::rejecting("Username taken"), MemoryStore::new());

        let err = store.register(&registration()).await.unwrap_err();
        assert_eq!(err, AuthError::Rejected("Registration failed".to_string()));
        assert_eq!(store.state().error.as_deref(), Some("Registration failed"));
        assert!(!store.state().is_authenticated);
    }

    #[tokio::test]
    async fn test_restore_without_token_is_noop() {
        let storage =
            MemoryStore::with_entries([(keys::USER_DATA, r#"{"id":1,"username":"emilys"}"#)]);
        let store = store_with(StubAuth::unreachable(), storage);

        assert!(store.restore_session().await.is_none());
        assert_eq!(store.state(), SessionState::default());
        assert_eq!(store.state().status(), SessionStatus::Anonymous);
    }

    #[tokio::test]
    async fn test_restore_session() {
        let storage = MemoryStore::with_entries([
            (keys::USER_TOKEN, "abc"),
            (
                keys::USER_DATA,
                r#"{"id":1,"username":"emilys","email":"e@x.dev","firstName":"Emily","lastName":"Johnson","token":"abc"}"#,
            ),
        ]);
        // The network must not be touched
        let store = store_with(StubAuth::unreachable(), storage);

        let user = store.restore_session().await.unwrap();
        assert_eq!(user.first_name.as_deref(), Some("Emily"));

        let state = store.state();
        assert!(state.is_authenticated);
        assert_eq!(state.token.as_deref(), Some("abc"));
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_restore_malformed_user() {
        let storage =
            MemoryStore::with_entries([(keys::USER_TOKEN, "abc"), (keys::USER_DATA, "{oops")]);
        let store = store_with(StubAuth::unreachable(), storage);

        assert!(store.restore_session().await.is_none());
        assert_eq!(store.state(), SessionState::default());
    }

    #[tokio::test]
    async fn test_restore_with_broken_storage() {
        let store =
            SessionStore::new(Arc::new(StubAuth::unreachable()), Arc::new(broken_storage()));

        assert!(store.restore_session().await.is_none());
        assert_eq!(store.state(), SessionState::default());
    }

    #[tokio::test]
    async fn test_logout_clears_session_keys() {
        let storage = MemoryStore::with_entries([
            (keys::FAVOURITES, "[]"),
            (keys::LEGACY_FAVOURITES, "[]"),
            (keys::THEME_MODE, "dark"),
        ]);
        let store = store_with(StubAuth::accepting("emilys", "abc"), storage.clone());
        store.login(&Credentials::new("emilys", "emilyspass")).await.unwrap();

        store.logout().await;

        let state = store.state();
        assert!(state.user.is_none());
        assert!(state.token.is_none());
        assert!(!state.is_authenticated);
        assert!(!storage.contains(keys::USER_TOKEN));
        assert!(!storage.contains(keys::USER_DATA));
        assert!(!storage.contains(keys::FAVOURITES));
        assert!(!storage.contains(keys::LEGACY_FAVOURITES));
        assert!(storage.contains(keys::THEME_MODE));
    }

    #[tokio::test]
    async fn test_logout_with_failing_storage() {
        let store = SessionStore::new(
            Arc::new(StubAuth::accepting("emilys", "abc")),
            Arc::new(broken_storage()),
        );
        store.login(&Credentials::new("emilys", "emilyspass")).await.unwrap();
        assert!(store.state().is_authenticated);

        store.logout().await;

        let state = store.state();
        assert!(state.user.is_none());
        assert!(state.token.is_none());
        assert!(!state.is_authenticated);
    }

    #[tokio::test]
    async fn test_subscribers_see_transitions() {
        let store = store_with(StubAuth::accepting("emilys", "abc"), MemoryStore::new());
        let mut rx = store.subscribe();

        store.login(&Credentials::new("emilys", "emilyspass")).await.unwrap();

        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_authenticated);
    }
}
