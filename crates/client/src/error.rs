//! Error types for the client facade.
//!
//! Construction errors from the query crate pass through transparently;
//! transport failures propagate unmodified with no retry and no partial
//! cache population.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

use recfinder_query::QueryError;

/// The primary error type for client operations.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Statement construction failed before any network call was made.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Network or HTTP failure, propagated unmodified from the transport.
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// A zipcode-centroid lookup returned zero rows.
    #[error("no zipcode found: {zip}")]
    ZipNotFound { zip: String },

    /// The response payload did not carry the expected row shape.
    #[error("malformed response payload: {message}")]
    Decode { message: String },

    /// The client configuration failed validation.
    #[error("invalid client configuration: {message}")]
    InvalidConfig { message: String },
}

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
