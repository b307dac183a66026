//! Authentication and registration service
//!
//! [`AuthService`] is the seam the session store depends on; [`DummyJsonAuth`]
//! is the HTTP implementation used by the application.

use async_trait::async_trait;

use crate::client::{ApiClient, ApiError, ApiRequest};
use crate::types::{Credentials, LoginResponse, Registration, User};

/// Login endpoint path
pub const LOGIN_PATH: &str = "/auth/login";

/// Registration endpoint path
pub const REGISTER_PATH: &str = "/users/add";

/// Remote authentication collaborator
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Exchange credentials for a user record and session token
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError>;

    /// Create an account; the backend echoes the created user but issues no
    /// token
    async fn register(&self, registration: &Registration) -> Result<User, ApiError>;
}

/// [`AuthService`] backed by the DummyJSON API
#[derive(Debug, Clone)]
pub struct DummyJsonAuth {
    client: ApiClient,
}

impl DummyJsonAuth {
    /// Create a service using `client`
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AuthService for DummyJsonAuth {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        let request = ApiRequest::post(LOGIN_PATH)
            .json_body(credentials)
            .map_err(|e| ApiError::parse(0, e.to_string()))?;

        let response = self.client.send::<LoginResponse>(request).await?;
        tracing::debug!(username = %response.data.user.username, "Login accepted");
        Ok(response.data)
    }

    async fn register(&self, registration: &Registration) -> Result<User, ApiError> {
        let request = ApiRequest::post(REGISTER_PATH)
            .json_body(registration)
            .map_err(|e| ApiError::parse(0, e.to_string()))?;

        let response = self.client.send::<User>(request).await?;
        tracing::debug!(id = response.data.id, "Registration accepted");
        Ok(response.data)
    }
}
