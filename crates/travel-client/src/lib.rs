//! GoMate backend client
//!
//! This crate provides the HTTP client, the authentication service, the
//! destination catalogs, and the records they exchange.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod auth;
pub mod catalog;
pub mod client;
pub mod types;

pub use auth::{AuthService, DummyJsonAuth};
pub use catalog::{builtin_destinations, DestinationCatalog, RestCountriesCatalog, StaticCatalog};
pub use client::{ApiClient, ApiClientConfig, ApiError, ApiErrorKind};
pub use types::{Credentials, Destination, DestinationStatus, LoginResponse, Registration, User};
