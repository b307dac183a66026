//! Application configuration
//!
//! Values are resolved in this order, later sources winning:
//!
//! 1. Defaults
//! 2. `gomate.toml` in the platform config directory (or an explicit path)
//! 3. `GOMATE_*` environment variables
//!
//! ```toml
//! [auth]
//! base_url = "https://dummyjson.com"
//! timeout_secs = 15
//!
//! [catalog]
//! source = "rest_countries"   # builtin | rest_countries
//! base_url = "https://restcountries.com"
//! limit = 50
//!
//! [storage]
//! data_dir = "/var/lib/gomate"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`AppConfig`]
    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// No data directory could be determined
    #[error("No data directory available; set GOMATE_DATA_DIR")]
    NoDataDir,
}

/// Result type for configuration
pub type Result<T> = std::result::Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

/// Where destinations come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogSource {
    /// The dataset bundled with the app
    #[default]
    Builtin,
    /// The REST Countries API
    RestCountries,
}

impl std::str::FromStr for CatalogSource {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "builtin" | "static" => Ok(CatalogSource::Builtin),
            "rest_countries" | "restcountries" | "remote" => Ok(CatalogSource::RestCountries),
            other => Err(ConfigError::Invalid(format!(
                "Unknown catalog source: '{}'. Valid options: builtin, rest_countries",
                other
            ))),
        }
    }
}

/// Authentication service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Base URL of the authentication API
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self { base_url: "https://dummyjson.com".to_string(), timeout_secs: 15 }
    }
}

/// Destination catalog settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// Which catalog to use
    pub source: CatalogSource,
    /// Base URL of the REST Countries API
    pub base_url: String,
    /// Maximum number of remote destinations
    pub limit: usize,
    /// Retries for network-class failures
    pub max_retries: usize,
    /// Delay before the first retry in milliseconds; doubles on each attempt
    pub retry_delay_ms: u64,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Simulated latency of the built-in catalog in milliseconds
    pub latency_ms: u64,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            source: CatalogSource::Builtin,
            base_url: "https://restcountries.com".to_string(),
            limit: 50,
            max_retries: 2,
            retry_delay_ms: 100,
            timeout_secs: 15,
            latency_ms: 1000,
        }
    }
}

/// On-device storage settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Directory holding the database; the platform data dir when unset
    pub data_dir: Option<PathBuf>,
    /// Sled page cache size in bytes
    pub cache_capacity: u64,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self { data_dir: None, cache_capacity: 16 * 1024 * 1024 }
    }
}

// =============================================================================
// AppConfig
// =============================================================================

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Authentication service
    pub auth: AuthSettings,
    /// Destination catalog
    pub catalog: CatalogSettings,
    /// On-device storage
    pub storage: StorageSettings,
}

impl AppConfig {
    /// Load defaults, then the config file, then environment overrides
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let mut config = match config_path.or_else(Self::default_config_path) {
            Some(path) if path.exists() => {
                info!(?path, "Loading config from file");
                Self::from_file(&path)?
            }
            Some(path) => {
                debug!(?path, "Config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Ok(toml::from_str(&contents)?)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        let urls = [
            ("auth.base_url", &self.auth.base_url),
            ("catalog.base_url", &self.catalog.base_url),
        ];
        for (name, url) in urls {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::Invalid(format!(
                    "{} must start with http:// or https://, got: {}",
                    name, url
                )));
            }
        }

        if self.catalog.limit == 0 {
            return Err(ConfigError::Invalid("catalog.limit must be greater than 0".into()));
        }

        if self.auth.timeout_secs == 0 || self.catalog.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeouts must be greater than 0".into()));
        }

        Ok(())
    }

    /// Apply `GOMATE_*` overrides read through `lookup`
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("GOMATE_AUTH_URL") {
            debug!(url = %url, "Overriding auth URL from environment");
            self.auth.base_url = url;
        }

        if let Some(url) = lookup("GOMATE_CATALOG_URL") {
            debug!(url = %url, "Overriding catalog URL from environment");
            self.catalog.base_url = url;
        }

        if let Some(source) = lookup("GOMATE_CATALOG") {
            match source.parse() {
                Ok(parsed) => self.catalog.source = parsed,
                Err(e) => warn!(error = %e, "Ignoring GOMATE_CATALOG"),
            }
        }

        if let Some(dir) = lookup("GOMATE_DATA_DIR") {
            self.storage.data_dir = Some(PathBuf::from(dir));
        }
    }

    /// Directory holding the database
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.storage.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => directories::ProjectDirs::from("com", "gomate", "gomate")
                .map(|dirs| dirs.data_dir().to_path_buf())
                .ok_or(ConfigError::NoDataDir),
        }
    }

    /// Authentication request timeout
    pub fn auth_timeout(&self) -> Duration {
        Duration::from_secs(self.auth.timeout_secs)
    }

    /// Catalog request timeout
    pub fn catalog_timeout(&self) -> Duration {
        Duration::from_secs(self.catalog.timeout_secs)
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "gomate", "gomate")
            .map(|dirs| dirs.config_dir().join("gomate.toml"))
    }
}
