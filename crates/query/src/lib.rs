//! Statement construction for the recfinder geospatial SQL endpoint.
//!
//! The hosted dataset exposes a single read-only SQL-over-HTTP endpoint.
//! This crate translates structured, domain-level search requests (free
//! text, coordinates or zipcode, categorical filters, entity taxonomy)
//! into finalized SQL statements, without performing any I/O of its own.
//!
//! # Architecture
//!
//! - [`schema`] - static registry mapping logical entity names to physical
//!   table identifiers
//! - [`expr`] - the value-oriented query expression builder and the
//!   fragment/parameter model used for injection-safe literal rendering
//! - [`compose`] - geospatial, free-text, and filter clause composition
//! - [`director`] - per-entity-type orchestration producing complete
//!   statements
//! - [`types`] - validated request value types (coordinates, zipcodes,
//!   filter sets)
//! - [`error`] - error types for construction failures
//!
//! # Example
//!
//! ```
//! use recfinder_query::director::{ProgramsDirector, QueryDirector};
//! use recfinder_query::types::{Coordinates, FilterSet, GeoMode};
//!
//! let coords = Coordinates::new(39.9526, -75.1652)?;
//! let statement = ProgramsDirector::list(
//!     GeoMode::Point(coords),
//!     Some("swimming"),
//!     FilterSet::default(),
//! )
//! .build();
//!
//! assert!(statement.as_str().contains("ORDER BY distance"));
//! # Ok::<(), recfinder_query::QueryError>(())
//! ```
//!
//! Statement generation is deterministic for identical logical inputs;
//! the downstream result cache is keyed on the statement text and relies
//! on that property.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod compose;
pub mod director;
pub mod error;
pub mod expr;
pub mod schema;
pub mod types;

// Re-export commonly used types at crate root
pub use director::{
    FacilitiesDirector, LookupDirector, ProgramsDirector, QueryDirector, TaxonomyDirector,
};
pub use error::{QueryError, QueryResult};
pub use expr::{SelectExpr, SqlFragment, SqlParam, Statement};
pub use types::{AgeRange, Coordinates, EntityType, FilterSet, GeoMode, ZipCode};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
