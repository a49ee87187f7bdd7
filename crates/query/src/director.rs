//! Query directors.
//!
//! One director per entity type, each sequencing composer calls into a
//! complete, ready-to-execute statement. Directors own the entity-specific
//! required predicates and projections; dispatch is by type, selected once
//! at request start, rather than by string-switching inside the builder.
//!
//! Inputs are validated before a director is constructed ([`Coordinates`],
//! [`ZipCode`], [`EntityType`]), so `build` itself is infallible.

use crate::expr::{SelectExpr, SqlFragment, SqlParam, Statement};
use crate::schema::table;
use crate::types::{EntityType, FilterSet, GeoMode, ZipCode};

/// Builds a complete statement for one entity type.
pub trait QueryDirector {
    /// Produces the finalized statement.
    fn build(&self) -> Statement;
}

/// Applies the geolocation mode and the ordering policy.
///
/// Geolocation ordering (distance ascending) takes precedence, with a
/// secondary alphabetical tie-break on the entity's display name; without
/// geolocation, results order alphabetically only.
fn apply_geo_ordering(expr: SelectExpr, geo: &GeoMode, name_column: &str) -> SelectExpr {
    let alphabetical = format!("lower({})", name_column);
    match geo {
        GeoMode::None => expr.order_by(alphabetical),
        GeoMode::Point(coords) => expr.with_distance_from(*coords).order_by(alphabetical),
        GeoMode::Zip(zip) => expr.within_zip_code(zip).order_by(alphabetical),
    }
}

/// Columns searched by program free text.
const PROGRAM_SEARCH_FIELDS: &[&str] = &["program_name", "program_description"];

/// Columns searched by facility free text.
const FACILITY_SEARCH_FIELDS: &[&str] = &["facility_description", "facility_name", "long_name"];

#[derive(Debug, Clone)]
enum ProgramsMode {
    List {
        geo: GeoMode,
        freetext: Option<String>,
        filters: FilterSet,
    },
    Single {
        id: String,
    },
}

/// Director for the programs entity.
///
/// Always joins the owning facility (for `facility_name` and publication
/// status) and the geometry assets, and always applies the mandatory
/// baseline predicates: the program must be public, approved, and active.
/// Caller-supplied filters cannot override those predicates.
#[derive(Debug, Clone)]
pub struct ProgramsDirector {
    mode: ProgramsMode,
}

impl ProgramsDirector {
    /// List mode: no id constraint; supports free text, geolocation
    /// ordering, and filters.
    pub fn list(geo: GeoMode, freetext: Option<&str>, filters: FilterSet) -> Self {
        Self {
            mode: ProgramsMode::List {
                geo,
                freetext: freetext.map(str::to_string),
                filters,
            },
        }
    }

    /// Single-record mode: constrained by id, with an expanded descriptive
    /// projection and no free-text or filter support.
    pub fn by_id(id: &str) -> Self {
        Self {
            mode: ProgramsMode::Single { id: id.to_string() },
        }
    }

    fn base() -> SelectExpr {
        SelectExpr::new(table::PROGRAMS)
            .field(format!("{}.id", table::PROGRAMS))
            .field(format!("{}.program_name", table::PROGRAMS))
            .field(format!("{}.program_description", table::PROGRAMS))
            .field(format!("{}.age_low", table::PROGRAMS))
            .field(format!("{}.age_high", table::PROGRAMS))
            .field(format!("{}.fee", table::PROGRAMS))
            .field_as(format!("{}.gender->>0", table::PROGRAMS), "gender")
            .field("facility_name")
            .field("facility_is_published")
            .join(
                table::FACILITIES,
                None,
                SqlFragment::new(format!(
                    "{}.facility->>0 = {}.id",
                    table::PROGRAMS,
                    table::FACILITIES
                )),
            )
            .join_geometry_assets()
            .and_where(SqlFragment::new("program_is_public"))
            .and_where(SqlFragment::new("program_is_approved"))
            .and_where(SqlFragment::new("program_is_active"))
    }
}

impl QueryDirector for ProgramsDirector {
    fn build(&self) -> Statement {
        let expr = Self::base();
        match &self.mode {
            ProgramsMode::List {
                geo,
                freetext,
                filters,
            } => {
                let mut expr = expr
                    .field_as("fee_frequency->>0", "fee_frequency")
                    .field_as("address", "facility_address")
                    .field_as("facility->>0", "facility_id");
                expr = apply_geo_ordering(expr, geo, EntityType::Programs.display_name_column());
                if let Some(text) = freetext {
                    expr = expr.search_fields(PROGRAM_SEARCH_FIELDS, text);
                }
                expr.apply_filters(filters).finalize()
            }
            ProgramsMode::Single { id } => expr
                .field("address")
                .field_as("programdescriptionshort", "desc_short")
                .field_as("registration_status->>0", "registration_status")
                .field(format!("{}.registration_form_link", table::PROGRAMS))
                .field_as(format!("{}.id", table::FACILITIES), "location_id")
                .and_where(SqlFragment::with_params(
                    format!("{}.id = $1", table::PROGRAMS),
                    vec![SqlParam::text(id)],
                ))
                .finalize(),
        }
    }
}

#[derive(Debug, Clone)]
enum FacilitiesMode {
    List {
        geo: GeoMode,
        freetext: Option<String>,
    },
    Single {
        id: String,
    },
}

/// Director for the facilities entity.
///
/// Selects all facility columns joined to the geometry assets. Supports the
/// same geolocation modes and free-text search as programs, but carries no
/// baseline publication predicates.
#[derive(Debug, Clone)]
pub struct FacilitiesDirector {
    mode: FacilitiesMode,
}

impl FacilitiesDirector {
    /// List mode with optional free text and geolocation.
    pub fn list(geo: GeoMode, freetext: Option<&str>) -> Self {
        Self {
            mode: FacilitiesMode::List {
                geo,
                freetext: freetext.map(str::to_string),
            },
        }
    }

    /// Single-record mode by facility id.
    pub fn by_id(id: &str) -> Self {
        Self {
            mode: FacilitiesMode::Single { id: id.to_string() },
        }
    }

    fn base() -> SelectExpr {
        SelectExpr::new(table::FACILITIES)
            .field(format!("{}.*", table::FACILITIES))
            .join_geometry_assets()
    }
}

impl QueryDirector for FacilitiesDirector {
    fn build(&self) -> Statement {
        let expr = Self::base();
        match &self.mode {
            FacilitiesMode::List { geo, freetext } => {
                let mut expr =
                    apply_geo_ordering(expr, geo, EntityType::Facilities.display_name_column());
                if let Some(text) = freetext {
                    expr = expr.search_fields(FACILITY_SEARCH_FIELDS, text);
                }
                expr.finalize()
            }
            FacilitiesMode::Single { id } => expr
                .and_where(SqlFragment::with_params(
                    format!("{}.id = $1", table::FACILITIES),
                    vec![SqlParam::text(id)],
                ))
                .finalize(),
        }
    }
}

#[derive(Debug, Clone)]
enum TaxonomyOp {
    Terms {
        entity: EntityType,
    },
    TermEntities {
        entity: EntityType,
        term_id: String,
        geo: GeoMode,
        filters: FilterSet,
    },
    TermId {
        entity: EntityType,
        term: String,
    },
}

/// Director for taxonomy browsing.
///
/// Covers the distinct category listing per entity type, the lookup of all
/// entities tagged with a resolved term, and the resolution of a term's
/// display name to its id.
#[derive(Debug, Clone)]
pub struct TaxonomyDirector {
    op: TaxonomyOp,
}

impl TaxonomyDirector {
    /// Distinct category/type listing for an entity type, ordered by the
    /// category display name.
    pub fn terms(entity: EntityType) -> Self {
        Self {
            op: TaxonomyOp::Terms { entity },
        }
    }

    /// All entities tagged with the given resolved term.
    ///
    /// Filters apply to program lookups only; the facility taxonomy carries
    /// no filterable columns.
    pub fn term_entities(
        entity: EntityType,
        term_id: &str,
        geo: GeoMode,
        filters: FilterSet,
    ) -> Self {
        Self {
            op: TaxonomyOp::TermEntities {
                entity,
                term_id: term_id.to_string(),
                geo,
                filters,
            },
        }
    }

    /// Category id for a term display name.
    pub fn term_id(entity: EntityType, term: &str) -> Self {
        Self {
            op: TaxonomyOp::TermId {
                entity,
                term: term.to_string(),
            },
        }
    }

    fn build_terms(entity: EntityType) -> Statement {
        match entity {
            EntityType::Programs => SelectExpr::aliased(table::ACTIVITY_CATEGORIES, "category")
                .field("category.*")
                .order_by("activity_category_name")
                .finalize(),
            EntityType::Facilities => SelectExpr::aliased(table::LOCATION_TYPES, "location_type")
                .field("location_type.*")
                .and_where(SqlFragment::with_params(
                    "publish = $1",
                    vec![SqlParam::text("true")],
                ))
                .order_by("location_type_name")
                .finalize(),
        }
    }

    fn build_term_entities(
        entity: EntityType,
        term_id: &str,
        geo: &GeoMode,
        filters: &FilterSet,
    ) -> Statement {
        match entity {
            EntityType::Programs => {
                let mut expr = SelectExpr::new(table::PROGRAMS)
                    .field(format!("{}.program_name_full", table::PROGRAMS))
                    .field(format!("{}.id", table::PROGRAMS))
                    .field(format!("{}.program_id", table::PROGRAMS))
                    .field(format!("{}.activity_type", table::PROGRAMS))
                    .field(format!("{}.program_name", table::PROGRAMS))
                    .field(format!("{}.program_description", table::PROGRAMS))
                    .field(format!("{}.age_low", table::PROGRAMS))
                    .field(format!("{}.age_high", table::PROGRAMS))
                    .field(format!("{}.fee", table::PROGRAMS))
                    .field_as(format!("{}.gender->>0", table::PROGRAMS), "gender")
                    .field_as("lower(activity_category_name)", "activity_category_name")
                    .field("facility_name")
                    .field("facility_is_published")
                    .join(
                        table::FACILITIES,
                        None,
                        SqlFragment::new(format!(
                            "{}.facility->>0 = {}.id",
                            table::PROGRAMS,
                            table::FACILITIES
                        )),
                    )
                    .join(
                        table::ACTIVITY_CATEGORIES,
                        Some("category"),
                        SqlFragment::new(format!(
                            "category.id = {}.activity_category->>0",
                            table::PROGRAMS
                        )),
                    )
                    .join_geometry_assets()
                    .and_where(SqlFragment::new("program_is_public"))
                    .and_where(SqlFragment::new("program_is_approved"))
                    .and_where(SqlFragment::new("program_is_active"))
                    .and_where(SqlFragment::with_params(
                        "activity_category ? $1",
                        vec![SqlParam::text(term_id)],
                    ))
                    .apply_filters(filters);
                expr = apply_geo_ordering(expr, geo, entity.display_name_column());
                expr.finalize()
            }
            EntityType::Facilities => {
                let expr = SelectExpr::new(table::FACILITIES)
                    .field(format!("{}.*", table::FACILITIES))
                    .join_geometry_assets()
                    .and_where(SqlFragment::with_params(
                        "location_type ? $1",
                        vec![SqlParam::text(term_id)],
                    ));
                apply_geo_ordering(expr, geo, entity.display_name_column()).finalize()
            }
        }
    }

    fn build_term_id(entity: EntityType, term: &str) -> Statement {
        let (taxonomy_table, name_column) = match entity {
            EntityType::Programs => (table::ACTIVITY_CATEGORIES, "activity_category_name"),
            EntityType::Facilities => (table::LOCATION_TYPES, "location_type_name"),
        };
        SelectExpr::new(taxonomy_table)
            .field("id")
            .and_where(SqlFragment::with_params(
                format!("{} = $1", name_column),
                vec![SqlParam::text(term)],
            ))
            .finalize()
    }
}

impl QueryDirector for TaxonomyDirector {
    fn build(&self) -> Statement {
        match &self.op {
            TaxonomyOp::Terms { entity } => Self::build_terms(*entity),
            TaxonomyOp::TermEntities {
                entity,
                term_id,
                geo,
                filters,
            } => Self::build_term_entities(*entity, term_id, geo, filters),
            TaxonomyOp::TermId { entity, term } => Self::build_term_id(*entity, term),
        }
    }
}

/// Director for the simple reference lookups: schedule rows, the days
/// table, programs owned by a facility, and zipcode centroids.
#[derive(Debug, Clone)]
pub enum LookupDirector {
    /// Full day-of-week lookup table.
    Days,
    /// Schedule rows for a program.
    ProgramSchedules {
        /// Owning program id.
        program_id: String,
    },
    /// Schedule rows for a facility.
    FacilitySchedules {
        /// Owning facility id.
        facility_id: String,
    },
    /// Programs owned by a facility.
    ProgramsByFacility {
        /// Owning facility id.
        facility_id: String,
    },
    /// Centroid coordinates of a zipcode polygon.
    ZipCentroid {
        /// Validated zipcode.
        zip: ZipCode,
    },
}

impl QueryDirector for LookupDirector {
    fn build(&self) -> Statement {
        match self {
            LookupDirector::Days => SelectExpr::new(table::DAYS).finalize(),
            LookupDirector::ProgramSchedules { program_id } => {
                SelectExpr::new(table::PROGRAM_SCHEDULES)
                    .and_where(SqlFragment::with_params(
                        "program->>0 = $1",
                        vec![SqlParam::text(program_id)],
                    ))
                    .finalize()
            }
            LookupDirector::FacilitySchedules { facility_id } => {
                SelectExpr::new(table::FACILITY_SCHEDULES)
                    .and_where(SqlFragment::with_params(
                        "facility->>0 = $1",
                        vec![SqlParam::text(facility_id)],
                    ))
                    .finalize()
            }
            LookupDirector::ProgramsByFacility { facility_id } => {
                SelectExpr::new(table::PROGRAMS)
                    .field("id")
                    .field("program_name")
                    .and_where(SqlFragment::with_params(
                        format!("{}.facility->>0 = $1", table::PROGRAMS),
                        vec![SqlParam::text(facility_id)],
                    ))
                    .finalize()
            }
            LookupDirector::ZipCentroid { zip } => SelectExpr::new(table::ZIPCODES)
                .field_as("ST_Y(ST_Centroid(the_geom))", "latitude")
                .field_as("ST_X(ST_Centroid(the_geom))", "longitude")
                .and_where(SqlFragment::with_params(
                    "code = $1",
                    vec![SqlParam::text(zip.as_str())],
                ))
                .finalize(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_programs_baseline_predicates_in_both_modes() {
        for stmt in [
            ProgramsDirector::list(GeoMode::None, None, FilterSet::default()).build(),
            ProgramsDirector::by_id("abc-123").build(),
        ] {
            let text = stmt.as_str();
            assert!(text.contains("(program_is_public)"));
            assert!(text.contains("(program_is_approved)"));
            assert!(text.contains("(program_is_active)"));
        }
    }

    #[test]
    fn test_programs_single_mode_id_predicate() {
        let stmt = ProgramsDirector::by_id("abc-123").build();
        assert!(stmt.as_str().contains("ppr_programs.id = 'abc-123'"));
        assert!(stmt.as_str().contains("AS desc_short"));
        assert!(!stmt.as_str().contains("ILIKE"));
    }

    #[test]
    fn test_ordering_column_comes_from_entity_type() {
        let programs = ProgramsDirector::list(GeoMode::None, None, FilterSet::default()).build();
        assert!(programs.as_str().ends_with(&format!(
            "ORDER BY lower({})",
            EntityType::Programs.display_name_column()
        )));

        let facilities = FacilitiesDirector::list(GeoMode::None, None).build();
        assert!(facilities.as_str().ends_with(&format!(
            "ORDER BY lower({})",
            EntityType::Facilities.display_name_column()
        )));
    }

    #[test]
    fn test_facilities_have_no_program_predicates() {
        let stmt = FacilitiesDirector::list(GeoMode::None, None).build();
        assert!(!stmt.as_str().contains("program_is_public"));
    }

    #[test]
    fn test_lookup_zip_centroid() {
        let zip = ZipCode::new("19103").unwrap();
        let stmt = LookupDirector::ZipCentroid { zip }.build();
        assert_eq!(
            stmt.as_str(),
            "SELECT ST_Y(ST_Centroid(the_geom)) AS latitude, \
             ST_X(ST_Centroid(the_geom)) AS longitude \
             FROM zip_codes WHERE (code = '19103')"
        );
    }

    #[test]
    fn test_lookup_days_selects_everything() {
        assert_eq!(LookupDirector::Days.build().as_str(), "SELECT * FROM ppr_days");
    }
}
