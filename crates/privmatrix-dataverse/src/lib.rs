//! Dataverse Web API backend for the privmatrix engine.
//!
//! This crate implements the engine's `AccessControlService` boundary against
//! the Dataverse Web API (OData v4):
//!
//! - `OAuth2` client-credentials authentication with a cached token
//! - Entity-definition, business-unit, and role queries with
//!   `@odata.nextLink` cursor pagination
//! - Per-entity privilege metadata retrieval
//! - `$batch` submission of privilege add/remove operations with
//!   continue-on-error semantics
//! - Retry on throttling (429) and transient HTTP failures
//!
//! # Example
//!
//! ```no_run
//! use privmatrix_dataverse::{DataverseConfig, DataverseCredentials, DataverseService};
//! use privmatrix_engine::{Catalog, UpdateSession};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DataverseConfig::builder()
//!     .resource_url("https://org.crm.dynamics.com")
//!     .tenant_id("your-tenant-id")
//!     .build()?;
//!
//! let credentials = DataverseCredentials {
//!     client_id: "your-client-id".to_string(),
//!     client_secret: "your-client-secret".to_string().into(),
//! };
//!
//! let service = DataverseService::new(config, credentials)?;
//!
//! let mut session = UpdateSession::new();
//! let handle = session.begin_load();
//! let catalog = Catalog::load(&service, handle.token()).await?;
//! session.install_catalog(&handle, catalog);
//! # Ok(())
//! # }
//! ```

mod auth;
mod batch;
mod client;
mod config;
mod error;
mod service;

// Re-exports
pub use auth::TokenCache;
pub use client::{ODataError, ODataErrorBody, ODataPage, WebApiClient};
pub use config::{DataverseConfig, DataverseConfigBuilder, DataverseCredentials};
pub use error::{DataverseError, DataverseResult};
pub use service::DataverseService;
