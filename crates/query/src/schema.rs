//! Schema registry.
//!
//! Static mapping from logical entity names to the physical table and view
//! identifiers exposed by the hosted dataset. Loaded once at first use and
//! read-only for the process lifetime.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::error::{QueryError, QueryResult};

/// Physical table identifiers used by the directors.
///
/// These are also reachable through [`resolve`] under their logical names;
/// the constants exist so director code can reference tables without a
/// fallible lookup.
pub mod table {
    /// Recreation programs.
    pub const PROGRAMS: &str = "ppr_programs";
    /// Facilities (locations).
    pub const FACILITIES: &str = "ppr_facilities";
    /// Geometry assets carrying each facility's locator point.
    pub const ASSETS: &str = "ppr_assets";
    /// Zipcode polygons.
    pub const ZIPCODES: &str = "zip_codes";
    /// Day-of-week lookup table.
    pub const DAYS: &str = "ppr_days";
    /// Program schedule rows.
    pub const PROGRAM_SCHEDULES: &str = "ppr_program_schedules";
    /// Facility schedule rows.
    pub const FACILITY_SCHEDULES: &str = "ppr_facility_schedules";
    /// Program taxonomy: activity categories.
    pub const ACTIVITY_CATEGORIES: &str = "ppr_activity_categories";
    /// Program taxonomy: activity types (category terms).
    pub const ACTIVITY_TYPES: &str = "ppr_activity_types";
    /// Facility taxonomy: location types.
    pub const LOCATION_TYPES: &str = "ppr_location_types";
}

static REGISTRY: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("programs", table::PROGRAMS),
        ("facilities", table::FACILITIES),
        ("assets", table::ASSETS),
        ("zipcodes", table::ZIPCODES),
        ("days", table::DAYS),
        ("programSchedules", table::PROGRAM_SCHEDULES),
        ("facilitySchedules", table::FACILITY_SCHEDULES),
        ("programCategories", table::ACTIVITY_CATEGORIES),
        ("programCategoryTerms", table::ACTIVITY_TYPES),
        ("locationCategories", table::LOCATION_TYPES),
    ])
});

/// Resolves a logical entity name to its physical table identifier.
///
/// Fails with [`QueryError::UnknownEntity`] if the logical name has no
/// mapping.
pub fn resolve(logical: &str) -> QueryResult<&'static str> {
    REGISTRY
        .get(logical)
        .copied()
        .ok_or_else(|| QueryError::UnknownEntity {
            name: logical.to_string(),
        })
}
