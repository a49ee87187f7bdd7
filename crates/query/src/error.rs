//! Error types for statement construction.
//!
//! All failures that can occur while resolving entity names or assembling a
//! statement are represented here. Construction is pure, so every variant is
//! detectable before any network call is made.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// The primary error type for statement construction.
#[derive(Error, Debug)]
pub enum QueryError {
    /// A logical entity name has no mapping in the schema registry.
    #[error("unknown entity: {name}")]
    UnknownEntity { name: String },

    /// A latitude/longitude pair is out of range or not a finite number.
    #[error("invalid coordinates: ({latitude}, {longitude})")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    /// A coordinate string could not be parsed as `lat,lng`.
    #[error("malformed coordinate string: {value}")]
    MalformedCoordinates { value: String },

    /// A zipcode is not a 5-digit numeric code.
    #[error("invalid zipcode: {value}")]
    InvalidZipCode { value: String },
}

/// Result type alias for statement construction.
pub type QueryResult<T> = Result<T, QueryError>;
