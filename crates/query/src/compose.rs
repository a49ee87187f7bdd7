//! Clause composition.
//!
//! Geospatial, free-text, and filter clauses, expressed as further methods
//! on [`SelectExpr`]. Each method is independent and side-effect free; the
//! directors sequence them into complete statements.

use crate::expr::{SelectExpr, SqlFragment, SqlParam};
use crate::schema::table;
use crate::types::{Coordinates, FilterSet, ZipCode};

/// Fixed meters-to-miles conversion applied to every distance projection.
pub const METERS_TO_MILES_RATIO: f64 = 0.000621371;

/// Escapes ILIKE pattern metacharacters in user text.
///
/// Postgres treats backslash as the default LIKE escape character, so
/// escaping `\`, `%`, and `_` makes the bound pattern match the user's text
/// literally. Quote injection is handled separately by parameter binding.
fn escape_like(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

impl SelectExpr {
    /// Joins the geometry assets table and projects the entity's locator
    /// point as `latitude` / `longitude`.
    ///
    /// Every geolocated entity hangs off a facility row, so the join is on
    /// the facility's locator-point link id regardless of the root table.
    pub fn join_geometry_assets(self) -> Self {
        self.join(
            table::ASSETS,
            None,
            SqlFragment::new(format!(
                "{}.website_locator_points_link_id = {}.linkid",
                table::FACILITIES,
                table::ASSETS
            )),
        )
        .field_as(
            format!("ST_Y(ST_Centroid({}.the_geom))", table::ASSETS),
            "latitude",
        )
        .field_as(
            format!("ST_X(ST_Centroid({}.the_geom))", table::ASSETS),
            "longitude",
        )
    }

    /// Projects the great-circle distance in miles from the entity's
    /// locator point to the given coordinates, and orders ascending by it.
    ///
    /// Requires [`Self::join_geometry_assets`] to have been applied.
    pub fn with_distance_from(self, coords: Coordinates) -> Self {
        self.field_fragment(SqlFragment::with_params(
            format!(
                "ST_Distance(ST_Centroid({}.the_geom)::geography, \
                 ST_SetSRID(ST_Point($1, $2), 4326)::geography) * {} AS distance",
                table::ASSETS,
                METERS_TO_MILES_RATIO
            ),
            vec![
                SqlParam::Float(coords.longitude()),
                SqlParam::Float(coords.latitude()),
            ],
        ))
        .order_by("distance")
    }

    /// Left-joins the zip polygon filtered to the given code, projects the
    /// geometric containment test as `within_zip_code`, and orders
    /// ascending by distance in miles from the zip centroid.
    ///
    /// The zipcode has passed format validation at [`ZipCode::new`]; no
    /// re-validation happens here.
    pub fn within_zip_code(self, zip: &ZipCode) -> Self {
        self.field_fragment(SqlFragment::new(format!(
            "ST_Intersects({}.the_geom, {}.the_geom) AS within_zip_code",
            table::ZIPCODES,
            table::ASSETS
        )))
        .left_join(
            table::ZIPCODES,
            None,
            SqlFragment::with_params(
                format!("{}.code = $1", table::ZIPCODES),
                vec![SqlParam::text(zip.as_str())],
            ),
        )
        .field_fragment(SqlFragment::new(format!(
            "ST_Distance(ST_Centroid({}.the_geom)::geography, \
             ST_Centroid({}.the_geom)::geography) * {} AS distance",
            table::ASSETS,
            table::ZIPCODES,
            METERS_TO_MILES_RATIO
        )))
        .order_by("distance")
    }

    /// Attaches a case-insensitive pattern match OR-chain across the given
    /// fields as a single WHERE predicate.
    ///
    /// An empty field list leaves the WHERE set unchanged; it must not
    /// attach an empty or always-false clause.
    pub fn search_fields(self, fields: &[&str], text: &str) -> Self {
        let pattern = format!("%{}%", escape_like(text));
        let mut expr: Option<SqlFragment> = None;
        for field in fields {
            let clause = SqlFragment::with_params(
                format!("{} ILIKE $1", field),
                vec![SqlParam::text(&pattern)],
            );
            expr = Some(match expr {
                None => clause,
                Some(prev) => prev.or(clause),
            });
        }
        match expr {
            Some(fragment) => self.and_where(fragment),
            None => self,
        }
    }

    /// Applies the recognized filters, combined with AND across keys.
    ///
    /// Filter semantics:
    /// - `fee`: equality to a zero amount when the value is the literal
    ///   token `Free`, inequality otherwise.
    /// - `ageRange`: both inclusive-range predicates, applied only when
    ///   both bounds are positive; otherwise skipped entirely.
    /// - `gender`: equality against the first element of the multi-value
    ///   gender field.
    pub fn apply_filters(mut self, filters: &FilterSet) -> Self {
        if filters.is_empty() {
            return self;
        }
        if let Some(fee) = &filters.fee {
            let comparator = if fee == "Free" { "=" } else { "!=" };
            self = self.and_where(SqlFragment::with_params(
                format!("fee {} $1", comparator),
                vec![SqlParam::text("0.00")],
            ));
        }
        if let Some(range) = &filters.age_range {
            if range.is_applicable() {
                self = self
                    .and_where(SqlFragment::with_params(
                        "age_low >= $1",
                        vec![SqlParam::Integer(range.low)],
                    ))
                    .and_where(SqlFragment::with_params(
                        "age_high <= $1",
                        vec![SqlParam::Integer(range.high)],
                    ));
            }
        }
        if let Some(gender) = &filters.gender {
            self = self.and_where(SqlFragment::with_params(
                "gender->>0 = $1",
                vec![SqlParam::text(gender)],
            ));
        }
        self
    }
}
