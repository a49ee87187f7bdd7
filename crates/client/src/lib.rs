//! Async client for the hosted read-only geospatial SQL endpoint.
//!
//! This crate pairs the statement builders from `recfinder-query` with an
//! HTTP transport, a bounded statement-keyed result cache, and a typed
//! facade covering every supported lookup: entity searches, single-record
//! fetches, schedules, taxonomy browsing, and zipcode-centroid resolution.
//!
//! # Example
//!
//! ```no_run
//! use recfinder_client::{ClientConfig, FinderClient, SearchParams};
//! use recfinder_query::GeoMode;
//!
//! # async fn run() -> Result<(), recfinder_client::ClientError> {
//! let client = FinderClient::new(ClientConfig::default())?;
//! let params = SearchParams::default();
//! let (facilities, programs) = client.search(&params, &GeoMode::None).await?;
//! println!("{} facilities, {} programs", facilities.rows.len(), programs.rows.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod api;
pub mod cache;
pub mod config;
pub mod error;

pub use api::{FinderClient, RowSet, SearchFields, SearchParams};
pub use cache::StatementCache;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};

/// Version of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of this crate.
pub const NAME: &str = env!("CARGO_PKG_NAME");
