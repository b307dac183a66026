//! Destination listing and selection

use std::sync::Arc;
use tokio::sync::watch;
use travel_client::{ApiError, Destination, DestinationCatalog};

const FETCH_FAILED: &str = "Failed to fetch destinations";

/// Catalog fetch failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The catalog could not be loaded
    #[error("{0}")]
    Unavailable(String),
}

impl From<ApiError> for FetchError {
    fn from(err: ApiError) -> Self {
        let message = err.server_message().unwrap_or(err.message());
        if message.is_empty() {
            FetchError::Unavailable(FETCH_FAILED.to_string())
        } else {
            FetchError::Unavailable(message.to_string())
        }
    }
}

/// Destinations slice of the application state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DestinationsState {
    /// Last fetched list
    pub items: Vec<Destination>,
    /// A fetch is in flight
    pub loading: bool,
    /// Message of the last failed fetch
    pub error: Option<String>,
    /// Destination currently viewed
    pub selected: Option<Destination>,
}

/// State transitions of the destinations slice
#[derive(Debug, Clone, PartialEq)]
pub enum DestinationsAction {
    /// Fetch started
    FetchStarted,
    /// Fetch returned a list
    FetchSucceeded(Vec<Destination>),
    /// Fetch failed with a message
    FetchFailed(String),
    /// Destination opened
    Selected(Destination),
    /// Selection dismissed
    SelectionCleared,
}

impl DestinationsState {
    /// Apply a transition
    pub fn apply(&mut self, action: DestinationsAction) {
        match action {
            DestinationsAction::FetchStarted => {
                self.loading = true;
                self.error = None;
            }
            DestinationsAction::FetchSucceeded(items) => {
                self.loading = false;
                self.items = items;
                self.error = None;
            }
            DestinationsAction::FetchFailed(message) => {
                self.loading = false;
                self.items.clear();
                self.error = Some(message);
            }
            DestinationsAction::Selected(destination) => self.selected = Some(destination),
            DestinationsAction::SelectionCleared => self.selected = None,
        }
    }

    /// Items whose name or description contains `query`, ignoring case
    pub fn search(&self, query: &str) -> Vec<Destination> {
        let query = query.trim();
        if query.is_empty() {
            return self.items.clone();
        }
        self.items.iter().filter(|d| d.matches(query)).cloned().collect()
    }
}

/// Destinations store
pub struct DestinationsStore {
    state: watch::Sender<DestinationsState>,
    catalog: Arc<dyn DestinationCatalog>,
}

impl DestinationsStore {
    /// Create an empty store backed by `catalog`
    pub fn new(catalog: Arc<dyn DestinationCatalog>) -> Self {
        Self { state: watch::Sender::new(DestinationsState::default()), catalog }
    }

    /// Current state
    pub fn state(&self) -> DestinationsState {
        self.state.borrow().clone()
    }

    /// Receive every subsequent state change
    pub fn subscribe(&self) -> watch::Receiver<DestinationsState> {
        self.state.subscribe()
    }

    /// Load the catalog, replacing the current list. Returns the item count.
    ///
    /// Retrying after a failure is another call to `fetch`.
    pub async fn fetch(&self) -> Result<usize, FetchError> {
        self.state.send_modify(|s| s.apply(DestinationsAction::FetchStarted));

        match self.catalog.fetch_destinations().await {
            Ok(items) => {
                let count = items.len();
                tracing::info!(count, "Destinations fetched");
                self.state.send_modify(|s| s.apply(DestinationsAction::FetchSucceeded(items)));
                Ok(count)
            }
            Err(e) => {
                let err = FetchError::from(e);
                tracing::warn!(error = %err, "Failed to fetch destinations");
                let message = err.to_string();
                self.state.send_modify(|s| s.apply(DestinationsAction::FetchFailed(message)));
                Err(err)
            }
        }
    }

    /// Filter the current list by `query`
    pub fn search(&self, query: &str) -> Vec<Destination> {
        self.state.borrow().search(query)
    }

    /// Record the destination being viewed
    pub fn select(&self, destination: Destination) {
        tracing::debug!(id = %destination.id, "Destination selected");
        self.state.send_modify(|s| s.apply(DestinationsAction::Selected(destination)));
    }

    /// Forget the viewed destination
    pub fn clear_selection(&self) {
        self.state.send_modify(|s| s.apply(DestinationsAction::SelectionCleared));
    }
}
