//! HTTP client for the GoMate backends
//!
//! This module provides request/response types, error classification, retry
//! with exponential backoff, and the reqwest-based client used by the
//! authentication service and the remote destination catalog.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

/// Broad classification of an [`ApiError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// The request never produced an HTTP response (connect, DNS, timeout)
    Network,
    /// The server answered with a non-2xx status
    Http,
    /// The response body could not be read or decoded
    Parse,
}

impl std::fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiErrorKind::Network => write!(f, "network"),
            ApiErrorKind::Http => write!(f, "http"),
            ApiErrorKind::Parse => write!(f, "parse"),
        }
    }
}

/// API error with HTTP status and message
///
/// # Examples
/// ```
/// use travel_client::client::{ApiError, ApiErrorKind};
///
/// let error = ApiError::http(404, "Not found");
/// assert_eq!(error.status(), 404);
/// assert_eq!(error.kind(), ApiErrorKind::Http);
/// assert!(!error.is_network_error());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("API error {status} ({kind}): {message}")]
pub struct ApiError {
    /// HTTP status code (0 when no response was received)
    status: u16,
    /// Error classification
    kind: ApiErrorKind,
    /// Human-readable error message
    message: String,
    /// The `message` field of the server's error payload, if it sent one
    server_message: Option<String>,
}

impl ApiError {
    /// Create a new error
    pub fn new(status: u16, kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self { status, kind, message: message.into(), server_message: None }
    }

    /// A failure before any HTTP response arrived
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(0, ApiErrorKind::Network, message)
    }

    /// A non-2xx response without a usable error payload
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::new(status, ApiErrorKind::Http, message)
    }

    /// A non-2xx response whose payload carried a `message`
    pub fn from_server(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            status,
            kind: ApiErrorKind::Http,
            server_message: Some(message.clone()),
            message,
        }
    }

    /// A response body that could not be decoded
    pub fn parse(status: u16, message: impl Into<String>) -> Self {
        Self::new(status, ApiErrorKind::Parse, message)
    }

    /// Get the HTTP status code
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Get the error classification
    pub fn kind(&self) -> ApiErrorKind {
        self.kind
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the server-provided message, if any
    pub fn server_message(&self) -> Option<&str> {
        self.server_message.as_deref()
    }

    /// True when the server rejected the request (as opposed to a transport
    /// or decoding failure)
    pub fn is_rejection(&self) -> bool {
        self.kind == ApiErrorKind::Http
    }

    /// Check if this is a network-related error that should be retried
    ///
    /// Transport failures plus statuses 408, 425, 429, 500, 502, 503, 504,
    /// 522 and 524.
    pub fn is_network_error(&self) -> bool {
        self.kind == ApiErrorKind::Network
            || matches!(self.status, 408 | 425 | 429 | 500 | 502 | 503 | 504 | 522 | 524)
    }
}

// =============================================================================
// Request Types
// =============================================================================

/// HTTP method for API requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// GET request
    Get,
    /// POST request
    Post,
}

impl HttpMethod {
    /// Method name as sent on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// API request parameters
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// HTTP method
    pub method: HttpMethod,
    /// Path relative to the base URL (e.g., "/auth/login")
    pub path: String,
    /// Query parameters
    pub params: HashMap<String, String>,
    /// Request headers
    pub headers: HashMap<String, String>,
    /// Request body (for POST)
    pub body: Option<Vec<u8>>,
    /// Encoding type (e.g., "application/json")
    pub encoding: Option<String>,
}

impl ApiRequest {
    /// Create a new GET request
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            path: path.into(),
            params: HashMap::new(),
            headers: HashMap::new(),
            body: None,
            encoding: None,
        }
    }

    /// Create a new POST request
    pub fn post(path: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Post,
            path: path.into(),
            params: HashMap::new(),
            headers: HashMap::new(),
            body: None,
            encoding: Some("application/json".to_string()),
        }
    }

    /// Add a query parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Add a header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set the request body from JSON
    pub fn json_body<T: Serialize>(mut self, value: &T) -> Result<Self, serde_json::Error> {
        let body = serde_json::to_vec(value)?;
        self.body = Some(body);
        self.encoding = Some("application/json".to_string());
        Ok(self)
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// API response
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    /// HTTP status code
    pub status: u16,
    /// Response data
    pub data: T,
}

impl<T> ApiResponse<T> {
    /// Create a new response
    pub fn new(status: u16, data: T) -> Self {
        Self { status, data }
    }

    /// Check if the response is successful (2xx status)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Error payload returned by the backends
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    /// Error message
    pub message: String,
}

// =============================================================================
// Client Configuration
// =============================================================================

/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base service URL (e.g., "https://dummyjson.com")
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
    /// Custom headers to include in all requests
    pub default_headers: HashMap<String, String>,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://dummyjson.com".to_string(),
            timeout: Duration::from_secs(15),
            user_agent: format!("GoMate/{}", env!("CARGO_PKG_VERSION")),
            default_headers: HashMap::new(),
        }
    }
}

impl ApiClientConfig {
    /// Create a new config with a base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), ..Default::default() }
    }

    /// Set the timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Add a default header
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(key.into(), value.into());
        self
    }
}

// =============================================================================
// Retry Logic with Exponential Backoff
// =============================================================================

use std::future::Future;
use tokio::time::sleep;

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: usize,
    /// Initial delay between retries
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Backoff multiplier (e.g., 2.0 for exponential backoff)
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Create a new retry configuration
    pub fn new(max_retries: usize) -> Self {
        Self { max_retries, ..Default::default() }
    }

    /// Set the initial delay
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Calculate the delay for a given retry attempt
    fn calculate_delay(&self, attempt: usize) -> Duration {
        let delay_ms = self.initial_delay.as_millis() as f64
            * self.backoff_multiplier.powi(attempt as i32);

        Duration::from_millis(delay_ms as u64).min(self.max_delay)
    }
}

/// Retry `operation` while `should_retry` accepts the error
async fn retry<F, Fut, T, E>(
    config: &RetryConfig,
    should_retry: impl Fn(&E) -> bool,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempts = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(err) => {
                attempts += 1;

                if !should_retry(&err) || attempts > config.max_retries {
                    return Err(err);
                }

                let delay = config.calculate_delay(attempts - 1);
                tracing::debug!(attempt = attempts, ?delay, "Retrying request");
                sleep(delay).await;
            }
        }
    }
}

/// Retry network errors only
async fn network_retry<F, Fut, T>(config: &RetryConfig, operation: F) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    retry(config, |err: &ApiError| err.is_network_error(), operation).await
}

// =============================================================================
// Client Implementation
// =============================================================================

use reqwest::{Client as ReqwestClient, Response as ReqwestResponse};

/// reqwest-based client for the GoMate backends
///
/// # Examples
/// ```
/// use travel_client::client::{ApiClient, ApiClientConfig, ApiRequest};
///
/// async fn example() -> Result<(), Box<dyn std::error::Error>> {
///     let client = ApiClient::new(ApiClientConfig::new("https://dummyjson.com"))?;
///
///     let request = ApiRequest::get("/users/1");
///     let response = client.send::<serde_json::Value>(request).await?;
///     println!("{}", response.data);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: ReqwestClient,
    config: ApiClientConfig,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(config: ApiClientConfig) -> Result<Self, ApiError> {
        let client = ReqwestClient::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| ApiError::network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Execute a request and decode the JSON response
    pub async fn send<T>(&self, request: ApiRequest) -> Result<ApiResponse<T>, ApiError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), request.path);

        let mut req = match request.method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
        };

        for (key, value) in &request.params {
            req = req.query(&[(key, value)]);
        }

        for (key, value) in &self.config.default_headers {
            req = req.header(key, value);
        }

        for (key, value) in &request.headers {
            req = req.header(key, value);
        }

        if let Some(body) = &request.body {
            if let Some(encoding) = &request.encoding {
                req = req.header("Content-Type", encoding);
            }
            req = req.body(body.clone());
        }

        tracing::debug!(method = request.method.as_str(), %url, "Sending request");

        let response = req.send().await.map_err(|e| ApiError::network(e.to_string()))?;

        self.parse_response(response).await
    }

    /// Execute a request, retrying network-class failures
    pub async fn send_with_retry<T>(
        &self,
        request: ApiRequest,
        policy: &RetryConfig,
    ) -> Result<ApiResponse<T>, ApiError>
    where
        T: for<'de> Deserialize<'de>,
    {
        network_retry(policy, || self.send(request.clone())).await
    }

    /// Parse reqwest response into ApiResponse
    async fn parse_response<T>(&self, response: ReqwestResponse) -> Result<ApiResponse<T>, ApiError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let status = response.status().as_u16();

        if !response.status().is_success() {
            let error_body = response.text().await.unwrap_or_default();

            return Err(match serde_json::from_str::<ApiErrorBody>(&error_body) {
                Ok(body) => ApiError::from_server(status, body.message),
                Err(_) => ApiError::http(status, format!("HTTP {}: {}", status, error_body)),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ApiError::parse(status, format!("Failed to read response: {}", e)))?;

        let data: T = serde_json::from_str(&body)
            .map_err(|e| ApiError::parse(status, format!("Failed to parse JSON: {}", e)))?;

        Ok(ApiResponse::new(status, data))
    }

    /// Get the client configuration
    pub fn config(&self) -> &ApiClientConfig {
        &self.config
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_api_error_network() {
        let error = ApiError::network("connection refused");
        assert_eq!(error.status(), 0);
        assert_eq!(error.kind(), ApiErrorKind::Network);
        assert!(error.is_network_error());
        assert!(!error.is_rejection());
        assert!(error.server_message().is_none());
    }

    #[test]
    fn test_api_error_from_server() {
        let error = ApiError::from_server(400, "Invalid credentials");
        assert_eq!(error.status(), 400);
        assert!(error.is_rejection());
        assert!(!error.is_network_error());
        assert_eq!(error.server_message(), Some("Invalid credentials"));
        assert_eq!(error.message(), "Invalid credentials");
    }

    #[test]
    fn test_api_error_retryable_status() {
        assert!(ApiError::http(503, "down").is_network_error());
        assert!(ApiError::http(429, "slow down").is_network_error());
        assert!(!ApiError::http(404, "missing").is_network_error());
    }

    #[test]
    fn test_api_error_display() {
        let error = ApiError::http(404, "Record not found");
        let display = error.to_string();
        assert!(display.contains("404"));
        assert!(display.contains("http"));
        assert!(display.contains("Record not found"));
    }

    #[test]
    fn test_request_builders() {
        let req = ApiRequest::get("/v3.1/all")
            .param("fields", "name")
            .header("Accept", "application/json");

        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "/v3.1/all");
        assert_eq!(req.params.get("fields"), Some(&"name".to_string()));
        assert!(req.encoding.is_none());

        let req = ApiRequest::post("/auth/login")
            .json_body(&serde_json::json!({"username": "emilys"}))
            .unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.encoding, Some("application/json".to_string()));
        let body = String::from_utf8(req.body.unwrap()).unwrap();
        assert!(body.contains("emilys"));
    }

    #[test]
    fn test_response_success() {
        assert!(ApiResponse::new(201, ()).is_success());
        assert!(!ApiResponse::new(400, ()).is_success());
    }

    #[test]
    fn test_client_config_builder() {
        let config = ApiClientConfig::new("https://custom.server")
            .with_timeout(Duration::from_secs(60))
            .with_user_agent("CustomAgent/1.0")
            .with_header("X-Custom", "value");

        assert_eq!(config.base_url, "https://custom.server");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.user_agent, "CustomAgent/1.0");
        assert_eq!(config.default_headers.get("X-Custom"), Some(&"value".to_string()));

        let client = ApiClient::new(config).unwrap();
        assert_eq!(client.base_url(), "https://custom.server");
    }

    #[test]
    fn test_client_config_default() {
        let config = ApiClientConfig::default();
        assert_eq!(config.base_url, "https://dummyjson.com");
        assert!(config.user_agent.starts_with("GoMate/"));
    }

    #[test]
    fn test_retry_config_calculate_delay() {
        let config = RetryConfig {
            max_delay: Duration::from_secs(1),
            ..RetryConfig::new(3).with_initial_delay(Duration::from_millis(100))
        };

        assert_eq!(config.calculate_delay(0), Duration::from_millis(100));
        assert_eq!(config.calculate_delay(2), Duration::from_millis(400));
        assert_eq!(config.calculate_delay(10), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_retry_success_after_retries() {
        let config = RetryConfig::new(3).with_initial_delay(Duration::from_millis(10));
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        let result = retry(
            &config,
            |_: &String| true,
            || {
                let c = counter_clone.clone();
                async move {
                    if c.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err("temporary error".to_string())
                    } else {
                        Ok("success")
                    }
                }
            },
        )
        .await;

        assert!(result.is_ok());
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_exhausted() {
        let config = RetryConfig::new(2).with_initial_delay(Duration::from_millis(10));
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        let result = retry(
            &config,
            |_: &String| true,
            || {
                let c = counter_clone.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err::<String, _>("always fails".to_string())
                }
            },
        )
        .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 3); // Initial + 2 retries
    }

    #[tokio::test]
    async fn test_network_retry_skips_rejections() {
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        let result: Result<String, ApiError> = network_retry(&RetryConfig::new(2), || {
            let c = counter_clone.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(ApiError::from_server(400, "Invalid input"))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
