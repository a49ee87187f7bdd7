//! Client configuration.
//!
//! Supports programmatic construction, environment variable overrides, and
//! validation.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `RECFINDER_BASE_URL` | https://phl.carto.com/api/v2 | Endpoint base URL |
//! | `RECFINDER_REQUEST_TIMEOUT` | 30 | Request timeout (seconds) |
//! | `RECFINDER_CACHE_QUERIES` | true | Enable the statement cache |
//! | `RECFINDER_CACHE_MAX_ENTRIES` | 256 | Cache capacity (statements) |
//! | `RECFINDER_CACHE_TTL` | 900 | Cache retention window (seconds) |

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};

/// Configuration for [`FinderClient`](crate::api::FinderClient).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the hosted SQL endpoint; the `sql` path segment is
    /// appended per request.
    pub base_url: String,

    /// Request timeout in seconds.
    pub request_timeout: u64,

    /// Whether successful results are cached by statement text.
    pub cache_enabled: bool,

    /// Maximum number of cached statements before oldest-insertion
    /// eviction.
    pub cache_max_entries: usize,

    /// Cache retention window in seconds.
    pub cache_ttl: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://phl.carto.com/api/v2".to_string(),
            request_timeout: 30,
            cache_enabled: true,
            cache_max_entries: 256,
            cache_ttl: 900,
        }
    }
}

impl ClientConfig {
    /// Creates a configuration from environment variables, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> T {
            std::env::var(name)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        }

        Self {
            base_url: std::env::var("RECFINDER_BASE_URL").unwrap_or(defaults.base_url),
            request_timeout: parse_var("RECFINDER_REQUEST_TIMEOUT", defaults.request_timeout),
            cache_enabled: parse_var("RECFINDER_CACHE_QUERIES", defaults.cache_enabled),
            cache_max_entries: parse_var("RECFINDER_CACHE_MAX_ENTRIES", defaults.cache_max_entries),
            cache_ttl: parse_var("RECFINDER_CACHE_TTL", defaults.cache_ttl),
        }
    }

    /// Validates configuration invariants.
    pub fn validate(&self) -> ClientResult<()> {
        let base = self.base_url.trim();
        if base.is_empty() {
            return Err(ClientError::InvalidConfig {
                message: "base_url must not be empty".to_string(),
            });
        }

        let lower = base.to_ascii_lowercase();
        if !lower.starts_with("http://") && !lower.starts_with("https://") {
            return Err(ClientError::InvalidConfig {
                message: "base_url must start with http:// or https://".to_string(),
            });
        }

        if self.request_timeout == 0 {
            return Err(ClientError::InvalidConfig {
                message: "request_timeout must be > 0".to_string(),
            });
        }

        if self.cache_enabled && self.cache_max_entries == 0 {
            return Err(ClientError::InvalidConfig {
                message: "cache_max_entries must be > 0 when the cache is enabled".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ClientConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_base_url() {
        let config = ClientConfig {
            base_url: "  ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_malformed_scheme() {
        let config = ClientConfig {
            base_url: "ftp://example.org".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_capacity_with_cache_enabled() {
        let config = ClientConfig {
            cache_max_entries: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let disabled = ClientConfig {
            cache_enabled: false,
            cache_max_entries: 0,
            ..Default::default()
        };
        assert!(disabled.validate().is_ok());
    }
}
