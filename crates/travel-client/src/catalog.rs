//! Destination catalogs
//!
//! The destinations store only sees [`DestinationCatalog`]. Two sources are
//! provided: the built-in dataset the app ships with, and the REST Countries
//! API.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::client::{ApiClient, ApiError, ApiRequest, RetryConfig};
use crate::types::{Destination, DestinationStatus};

/// Source of destination records
#[async_trait]
pub trait DestinationCatalog: Send + Sync {
    /// Fetch the full destination list
    async fn fetch_destinations(&self) -> Result<Vec<Destination>, ApiError>;
}

// =============================================================================
// Built-in dataset
// =============================================================================

/// Catalog serving the built-in dataset, optionally after a simulated delay
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    latency: Duration,
}

impl StaticCatalog {
    /// Catalog that answers immediately
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate network latency before answering
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

#[async_trait]
impl DestinationCatalog for StaticCatalog {
    async fn fetch_destinations(&self) -> Result<Vec<Destination>, ApiError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let destinations = builtin_destinations();
        tracing::debug!(count = destinations.len(), "Serving built-in destinations");
        Ok(destinations)
    }
}

#[allow(clippy::too_many_arguments)]
fn destination(
    id: &str,
    name: &str,
    description: &str,
    flag: &str,
    capital: &str,
    status: DestinationStatus,
    population: u64,
    area: f64,
    languages: &str,
    currency: &str,
    continent: &str,
    timezone: &str,
    (latitude, longitude): (f64, f64),
) -> Destination {
    Destination {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        image_url: format!("https://flagcdn.com/w320/{}.png", flag),
        capital: capital.to_string(),
        population,
        area,
        languages: languages.to_string(),
        currency: currency.to_string(),
        continent: continent.to_string(),
        timezone: timezone.to_string(),
        latitude,
        longitude,
        status,
    }
}

/// The dataset bundled with the app
pub fn builtin_destinations() -> Vec<Destination> {
    use DestinationStatus::*;

    vec![
        destination(
            "1",
            "France",
            "Western Europe",
            "fr",
            "Paris",
            Popular,
            67_390_000,
            551_695.0,
            "French",
            "Euro",
            "Europe",
            "UTC+01:00",
            (46.23, 2.21),
        ),
        destination(
            "2",
            "Japan",
            "East Asia",
            "jp",
            "Tokyo",
            Trending,
            125_800_000,
            377_975.0,
            "Japanese",
            "Japanese Yen",
            "Asia",
            "UTC+09:00",
            (36.20, 138.25),
        ),
        destination(
            "3",
            "United States",
            "North America",
            "us",
            "Washington, D.C.",
            MustVisit,
            329_500_000,
            9_372_610.0,
            "English",
            "United States Dollar",
            "Americas",
            "UTC-05:00",
            (37.09, -95.71),
        ),
        destination(
            "4",
            "Australia",
            "Oceania",
            "au",
            "Canberra",
            Popular,
            25_690_000,
            7_692_024.0,
            "English",
            "Australian Dollar",
            "Oceania",
            "UTC+10:00",
            (-25.27, 133.77),
        ),
        destination(
            "5",
            "Brazil",
            "South America",
            "br",
            "Brasília",
            Trending,
            212_600_000,
            8_515_767.0,
            "Portuguese",
            "Brazilian Real",
            "Americas",
            "UTC-03:00",
            (-14.24, -51.93),
        ),
        destination(
            "6",
            "Germany",
            "Central Europe",
            "de",
            "Berlin",
            Popular,
            83_240_000,
            357_114.0,
            "German",
            "Euro",
            "Europe",
            "UTC+01:00",
            (51.17, 10.45),
        ),
        destination(
            "7",
            "Italy",
            "Southern Europe",
            "it",
            "Rome",
            MustVisit,
            60_360_000,
            301_336.0,
            "Italian",
            "Euro",
            "Europe",
            "UTC+01:00",
            (41.87, 12.57),
        ),
        destination(
            "8",
            "Canada",
            "North America",
            "ca",
            "Ottawa",
            Trending,
            38_010_000,
            9_984_670.0,
            "English, French",
            "Canadian Dollar",
            "Americas",
            "UTC-05:00",
            (56.13, -106.35),
        ),
    ]
}

// =============================================================================
// REST Countries
// =============================================================================

/// Path of the REST Countries listing endpoint
pub const COUNTRIES_PATH: &str = "/v3.1/all";

#[derive(Debug, Deserialize)]
struct CountryName {
    common: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CountryFlags {
    png: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CountryCurrency {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Country {
    cca3: Option<String>,
    name: Option<CountryName>,
    region: Option<String>,
    flags: Option<CountryFlags>,
    #[serde(default)]
    capital: Vec<String>,
    population: Option<u64>,
    area: Option<f64>,
    languages: Option<BTreeMap<String, String>>,
    currencies: Option<BTreeMap<String, CountryCurrency>>,
    #[serde(default)]
    continents: Vec<String>,
    #[serde(default)]
    timezones: Vec<String>,
    #[serde(default)]
    latlng: Vec<f64>,
}

impl Country {
    fn common_name(&self) -> Option<&str> {
        self.name.as_ref()?.common.as_deref()
    }

    fn flag_png(&self) -> Option<&str> {
        self.flags.as_ref()?.png.as_deref()
    }

    fn into_destination(self, index: usize) -> Option<Destination> {
        let name = self.common_name()?.to_string();
        let image_url = self.flag_png()?.to_string();

        let languages = match &self.languages {
            Some(languages) if !languages.is_empty() => {
                languages.values().cloned().collect::<Vec<_>>().join(", ")
            }
            _ => "N/A".to_string(),
        };

        let currency = self
            .currencies
            .as_ref()
            .and_then(|currencies| currencies.values().next())
            .and_then(|currency| currency.name.clone())
            .unwrap_or_else(|| "N/A".to_string());

        Some(Destination {
            id: self.cca3.unwrap_or_else(|| format!("country-{}", index)),
            name,
            description: self.region.unwrap_or_else(|| "Unknown Region".to_string()),
            image_url,
            capital: self.capital.into_iter().next().unwrap_or_else(|| "N/A".to_string()),
            population: self.population.unwrap_or(0),
            area: self.area.unwrap_or(0.0),
            languages,
            currency,
            continent: self
                .continents
                .into_iter()
                .next()
                .unwrap_or_else(|| "Unknown".to_string()),
            timezone: self.timezones.into_iter().next().unwrap_or_else(|| "N/A".to_string()),
            latitude: self.latlng.first().copied().unwrap_or(0.0),
            longitude: self.latlng.get(1).copied().unwrap_or(0.0),
            status: DestinationStatus::for_index(index),
        })
    }
}

/// Catalog backed by the REST Countries API
#[derive(Debug, Clone)]
pub struct RestCountriesCatalog {
    client: ApiClient,
    limit: usize,
    retry: RetryConfig,
}

impl RestCountriesCatalog {
    /// Create a catalog keeping the first 50 usable countries
    pub fn new(client: ApiClient) -> Self {
        Self { client, limit: 50, retry: RetryConfig::new(2) }
    }

    /// Keep at most `limit` countries
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Retry network-class failures up to `max_retries` times
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.retry.max_retries = max_retries;
        self
    }

    /// Replace the retry policy
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

#[async_trait]
impl DestinationCatalog for RestCountriesCatalog {
    async fn fetch_destinations(&self) -> Result<Vec<Destination>, ApiError> {
        let request = ApiRequest::get(COUNTRIES_PATH);
        let response = self
            .client
            .send_with_retry::<Vec<Country>>(request, &self.retry)
            .await?;

        tracing::debug!(count = response.data.len(), "Countries received");

        let destinations: Vec<Destination> = response
            .data
            .into_iter()
            .filter(|country| country.common_name().is_some() && country.flag_png().is_some())
            .take(self.limit)
            .enumerate()
            .filter_map(|(index, country)| country.into_destination(index))
            .collect();

        Ok(destinations)
    }
}
