//! GoMate application wiring
//!
//! Builds the application state over the on-disk store and the configured
//! backends.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;

use std::sync::Arc;
use std::time::Duration;

use app_state::AppStore;
use storage::{KvConfig, KvStore, StorageError};
use travel_client::client::RetryConfig;
use travel_client::{
    ApiClient, ApiClientConfig, ApiError, DestinationCatalog, DummyJsonAuth, RestCountriesCatalog,
    StaticCatalog,
};
use tracing_subscriber::EnvFilter;

pub use config::{AppConfig, CatalogSource, ConfigError};

/// Startup failures
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// Configuration could not be resolved
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The database could not be opened
    #[error("Failed to open storage: {0}")]
    Storage(#[from] StorageError),

    /// An HTTP client could not be built
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] ApiError),
}

/// Install the global `tracing` subscriber
///
/// `RUST_LOG` takes precedence over the default `info,gomate=debug,app_state=debug`
/// filter. Calling this more than once is harmless.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,gomate=debug,app_state=debug"));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// A built application
pub struct App {
    /// Application state
    pub store: AppStore,
    /// Database behind the state
    pub kv: KvStore,
}

impl App {
    /// Open storage and build every store described by `config`
    pub fn build(config: &AppConfig) -> Result<Self, BootstrapError> {
        let path = config.data_dir()?.join("gomate.db");
        tracing::info!(?path, "Opening storage");
        let kv = KvStore::new(KvConfig::new(path).cache_capacity(config.storage.cache_capacity))?;

        let auth_client = ApiClient::new(
            ApiClientConfig::new(config.auth.base_url.clone()).with_timeout(config.auth_timeout()),
        )?;
        let auth = Arc::new(DummyJsonAuth::new(auth_client));

        let catalog = build_catalog(config)?;
        let store = AppStore::new(Arc::new(kv.clone()), auth, catalog);

        Ok(Self { store, kv })
    }

    /// Flush pending writes to disk
    pub fn flush(&self) -> Result<(), StorageError> {
        self.kv.flush()
    }
}

fn build_catalog(config: &AppConfig) -> Result<Arc<dyn DestinationCatalog>, ApiError> {
    let settings = &config.catalog;
    match settings.source {
        CatalogSource::Builtin => {
            tracing::debug!("Using built-in destinations");
            Ok(Arc::new(
                StaticCatalog::new().with_latency(Duration::from_millis(settings.latency_ms)),
            ))
        }
        CatalogSource::RestCountries => {
            tracing::debug!(base_url = %settings.base_url, "Using REST Countries");
            let client = ApiClient::new(
                ApiClientConfig::new(settings.base_url.clone())
                    .with_timeout(config.catalog_timeout()),
            )?;
            let retry = RetryConfig::new(settings.max_retries)
                .with_initial_delay(Duration::from_millis(settings.retry_delay_ms));
            Ok(Arc::new(
                RestCountriesCatalog::new(client)
                    .with_limit(settings.limit)
                    .with_retry(retry),
            ))
        }
    }
}
