//! Core request types consumed by the directors.
//!
//! This module defines the caller-facing value shapes: the entity taxonomy
//! tag, validated geolocation inputs, and the filter set. All of these are
//! read-only to the builder: directors consume them but never mutate them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, QueryResult};

/// Logical category of searchable record.
///
/// Selects table bindings and default predicates; immutable once chosen for
/// a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    /// Recreation programs (activities).
    Programs,
    /// Physical facilities (locations).
    Facilities,
}

impl EntityType {
    /// Resolves the aliases accepted at the request boundary.
    ///
    /// The UI routes historically used several spellings per entity
    /// (`activities`, `locations`, `places`, singular forms); all of them
    /// collapse onto the two canonical variants.
    pub fn resolve(name: &str) -> QueryResult<Self> {
        match name.to_lowercase().as_str() {
            "program" | "programs" | "activity" | "activities" => Ok(EntityType::Programs),
            "facility" | "facilities" | "location" | "locations" | "place" | "places" => {
                Ok(EntityType::Facilities)
            }
            _ => Err(QueryError::UnknownEntity {
                name: name.to_string(),
            }),
        }
    }

    /// The column a result set of this entity type is displayed and
    /// alphabetically ordered by.
    pub fn display_name_column(&self) -> &'static str {
        match self {
            EntityType::Programs => "program_name",
            EntityType::Facilities => "facility_name",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityType::Programs => write!(f, "programs"),
            EntityType::Facilities => write!(f, "facilities"),
        }
    }
}

impl FromStr for EntityType {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityType::resolve(s)
    }
}

/// A validated latitude/longitude pair.
///
/// Validation happens at construction, so a `Coordinates` value held by a
/// director is always usable in a distance projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    /// Creates a coordinate pair, rejecting non-finite or out-of-range
    /// values.
    pub fn new(latitude: f64, longitude: f64) -> QueryResult<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        if !valid {
            return Err(QueryError::InvalidCoordinates {
                latitude,
                longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Latitude in decimal degrees.
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in decimal degrees.
    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl FromStr for Coordinates {
    type Err = QueryError;

    /// Parses the `"lat,lng"` form produced by the address geocoder.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || QueryError::MalformedCoordinates {
            value: s.to_string(),
        };
        let (lat, lng) = s.split_once(',').ok_or_else(malformed)?;
        let latitude: f64 = lat.trim().parse().map_err(|_| malformed())?;
        let longitude: f64 = lng.trim().parse().map_err(|_| malformed())?;
        Coordinates::new(latitude, longitude)
    }
}

/// A format-validated 5-digit zipcode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ZipCode(String);

impl ZipCode {
    /// Creates a zipcode, rejecting anything but exactly five ASCII digits.
    pub fn new(code: &str) -> QueryResult<Self> {
        if code.len() == 5 && code.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(code.to_string()))
        } else {
            Err(QueryError::InvalidZipCode {
                value: code.to_string(),
            })
        }
    }

    /// The validated code as text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ZipCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ZipCode {
    type Error = QueryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ZipCode::new(&value)
    }
}

impl From<ZipCode> for String {
    fn from(zip: ZipCode) -> Self {
        zip.0
    }
}

/// Geolocation mode for a query.
///
/// At most one of coordinates or zipcode drives the distance/ordering
/// clauses on a given query; modeling them as one enum makes the
/// exclusivity structural rather than a runtime check.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum GeoMode {
    /// No geolocation; results order alphabetically.
    #[default]
    None,
    /// Explicit coordinates; results order by distance in miles.
    Point(Coordinates),
    /// Zipcode containment; results carry `within_zip_code` and order by
    /// distance from the zip centroid.
    Zip(ZipCode),
}

/// Inclusive age range filter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeRange {
    /// Lower bound, inclusive.
    pub low: i64,
    /// Upper bound, inclusive.
    pub high: i64,
}

impl AgeRange {
    /// The range is applied only when both bounds are positive; a zero or
    /// negative bound means the UI slider was left at rest.
    pub fn is_applicable(&self) -> bool {
        self.low > 0 && self.high > 0
    }
}

/// Caller-supplied categorical filters.
///
/// Deserialization drops unrecognized keys, matching the endpoint contract:
/// unknown filter names are silently ignored, not errors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSet {
    /// `"Free"` selects zero-fee entries; any other value selects paid ones.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee: Option<String>,

    /// Inclusive age window, applied only when both bounds are positive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_range: Option<AgeRange>,

    /// Single gender value matched against the first element of the
    /// multi-value gender field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

impl FilterSet {
    /// Returns true if no recognized filter is set.
    pub fn is_empty(&self) -> bool {
        self.fee.is_none() && self.age_range.is_none() && self.gender.is_none()
    }
}
