//! API facade for the hosted SQL endpoint.
//!
//! The endpoint is read-only and accepts a single `GET <base>/sql?q=...`
//! operation carrying a URL-encoded SQL statement; the response is a JSON
//! payload with a `rows` array. [`FinderClient`] constructs statements
//! through the directors, consults the statement cache, and performs the
//! fetch on a miss. No operation mutates caller-supplied parameters, and
//! failed fetches never populate the cache.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use recfinder_query::director::{
    FacilitiesDirector, LookupDirector, ProgramsDirector, QueryDirector, TaxonomyDirector,
};
use recfinder_query::{Coordinates, EntityType, FilterSet, GeoMode, Statement, ZipCode};

use crate::cache::StatementCache;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// One page of results from the endpoint.
///
/// Rows are raw JSON objects; geolocated entities carry at least
/// `latitude` and `longitude`, plus `within_zip_code` and/or `distance`
/// when a geolocation mode is active. Extra response envelope fields are
/// ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RowSet {
    /// The result rows.
    pub rows: Vec<Map<String, Value>>,

    /// Total row count reported by the endpoint, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_rows: Option<u64>,

    /// Server-side execution time in seconds, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,
}

/// The free-form search fields submitted by a caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchFields {
    /// Free text matched across the per-entity documented columns.
    #[serde(default)]
    pub freetext: Option<String>,

    /// Address text; geocoded upstream into coordinates, unused here.
    #[serde(default)]
    pub address: Option<String>,

    /// Zipcode text; validated into a [`ZipCode`] before it drives
    /// geolocation.
    #[serde(default)]
    pub zip: Option<String>,
}

/// A complete search request: fields plus categorical filters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchParams {
    /// Free-form search fields.
    #[serde(default)]
    pub fields: SearchFields,

    /// Categorical filters; unrecognized keys are dropped at
    /// deserialization.
    #[serde(default)]
    pub filters: FilterSet,
}

/// Client facade over the hosted SQL endpoint.
///
/// Holds the HTTP channel and the process-wide statement cache; cheap to
/// share behind an `Arc`.
pub struct FinderClient {
    http: reqwest::Client,
    config: ClientConfig,
    cache: StatementCache,
}

impl FinderClient {
    /// Creates a client, validating the configuration.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .build()?;
        let cache = StatementCache::new(
            config.cache_max_entries,
            Duration::from_secs(config.cache_ttl),
        );
        Ok(Self {
            http,
            config,
            cache,
        })
    }

    /// The statement cache, exposed for inspection and explicit clearing.
    pub fn cache(&self) -> &StatementCache {
        &self.cache
    }

    /// Runs a finalized statement through the cache/fetch path.
    async fn run(&self, statement: Statement) -> ClientResult<Arc<RowSet>> {
        let text = statement.into_text();

        if self.config.cache_enabled {
            if let Some(hit) = self.cache.get(&text) {
                debug!(statement = %text, "statement served from local cache");
                return Ok(hit);
            }
        }

        debug!(statement = %text, "dispatching statement");
        let url = format!("{}/sql", self.config.base_url.trim_end_matches('/'));
        let response = self
            .http
            .get(&url)
            .query(&[("q", text.as_str())])
            .send()
            .await?
            .error_for_status()?;
        let rows: RowSet = response.json().await?;

        let payload = Arc::new(rows);
        if self.config.cache_enabled {
            self.cache.put(text, Arc::clone(&payload));
        }
        Ok(payload)
    }

    /// Searches facilities and programs concurrently and returns both
    /// result sets, facilities first.
    ///
    /// A failure in either leg fails the whole operation; there is no
    /// partial-success mode.
    pub async fn search(
        &self,
        params: &SearchParams,
        geo: &GeoMode,
    ) -> ClientResult<(Arc<RowSet>, Arc<RowSet>)> {
        let freetext = params
            .fields
            .freetext
            .as_deref()
            .filter(|text| !text.is_empty());
        let facilities = self.get_facilities(freetext, geo);
        let programs = self.get_programs(freetext, geo, &params.filters);
        tokio::try_join!(facilities, programs)
    }

    /// Program list query with optional free text, geolocation, and
    /// filters.
    pub async fn get_programs(
        &self,
        freetext: Option<&str>,
        geo: &GeoMode,
        filters: &FilterSet,
    ) -> ClientResult<Arc<RowSet>> {
        let director = ProgramsDirector::list(geo.clone(), freetext, filters.clone());
        self.run(director.build()).await
    }

    /// Facility list query with optional free text and geolocation.
    pub async fn get_facilities(
        &self,
        freetext: Option<&str>,
        geo: &GeoMode,
    ) -> ClientResult<Arc<RowSet>> {
        let director = FacilitiesDirector::list(geo.clone(), freetext);
        self.run(director.build()).await
    }

    /// Single program with the expanded descriptive projection.
    pub async fn get_program_by_id(&self, program_id: &str) -> ClientResult<Arc<RowSet>> {
        self.run(ProgramsDirector::by_id(program_id).build()).await
    }

    /// Single facility with its geometry columns.
    pub async fn get_facility_by_id(&self, facility_id: &str) -> ClientResult<Arc<RowSet>> {
        self.run(FacilitiesDirector::by_id(facility_id).build())
            .await
    }

    /// Schedule rows for a program.
    pub async fn get_program_schedules(&self, program_id: &str) -> ClientResult<Arc<RowSet>> {
        let director = LookupDirector::ProgramSchedules {
            program_id: program_id.to_string(),
        };
        self.run(director.build()).await
    }

    /// Schedule rows for a facility.
    pub async fn get_facility_schedules(&self, facility_id: &str) -> ClientResult<Arc<RowSet>> {
        let director = LookupDirector::FacilitySchedules {
            facility_id: facility_id.to_string(),
        };
        self.run(director.build()).await
    }

    /// Programs owned by a facility (id and name only).
    pub async fn get_programs_by_facility_id(
        &self,
        facility_id: &str,
    ) -> ClientResult<Arc<RowSet>> {
        let director = LookupDirector::ProgramsByFacility {
            facility_id: facility_id.to_string(),
        };
        self.run(director.build()).await
    }

    /// The full day-of-week lookup table.
    pub async fn get_days(&self) -> ClientResult<Arc<RowSet>> {
        self.run(LookupDirector::Days.build()).await
    }

    /// Distinct taxonomy term listing for an entity type.
    pub async fn get_entity_taxonomy(&self, entity_type: &str) -> ClientResult<Arc<RowSet>> {
        let entity = EntityType::resolve(entity_type)?;
        self.run(TaxonomyDirector::terms(entity).build()).await
    }

    /// All entities tagged with a resolved taxonomy term.
    pub async fn get_taxonomy_term_entities(
        &self,
        entity_type: &str,
        term_id: &str,
        geo: &GeoMode,
        filters: &FilterSet,
    ) -> ClientResult<Arc<RowSet>> {
        let entity = EntityType::resolve(entity_type)?;
        let director =
            TaxonomyDirector::term_entities(entity, term_id, geo.clone(), filters.clone());
        self.run(director.build()).await
    }

    /// Taxonomy term id for a term display name.
    pub async fn get_taxonomy_term_id(
        &self,
        entity_type: &str,
        term: &str,
    ) -> ClientResult<Arc<RowSet>> {
        let entity = EntityType::resolve(entity_type)?;
        self.run(TaxonomyDirector::term_id(entity, term).build())
            .await
    }

    /// Resolves a zipcode to its polygon centroid coordinates.
    ///
    /// Fails with [`ClientError::ZipNotFound`] when the lookup returns zero
    /// rows.
    pub async fn get_zip_centroid(&self, zip: &str) -> ClientResult<Coordinates> {
        let zip = ZipCode::new(zip)?;
        let rows = self
            .run(LookupDirector::ZipCentroid { zip: zip.clone() }.build())
            .await?;

        let row = rows.rows.first().ok_or_else(|| ClientError::ZipNotFound {
            zip: zip.to_string(),
        })?;
        let latitude = coordinate_field(row, "latitude")?;
        let longitude = coordinate_field(row, "longitude")?;
        Ok(Coordinates::new(latitude, longitude)?)
    }
}

fn coordinate_field(row: &Map<String, Value>, name: &str) -> ClientResult<f64> {
    row.get(name)
        .and_then(Value::as_f64)
        .ok_or_else(|| ClientError::Decode {
            message: format!("centroid row missing numeric '{}' column", name),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_set_ignores_envelope_extras() {
        let payload: RowSet = serde_json::from_value(serde_json::json!({
            "rows": [{"id": "a", "latitude": 39.9, "longitude": -75.1}],
            "time": 0.012,
            "fields": {"id": {"type": "string"}},
            "total_rows": 1
        }))
        .unwrap();
        assert_eq!(payload.rows.len(), 1);
        assert_eq!(payload.total_rows, Some(1));
    }

    #[test]
    fn test_search_params_deserialization() {
        let params: SearchParams = serde_json::from_value(serde_json::json!({
            "fields": {"freetext": "camp", "address": "", "zip": "19103"},
            "filters": {"fee": "Free", "unknownFilter": 7}
        }))
        .unwrap();
        assert_eq!(params.fields.freetext.as_deref(), Some("camp"));
        assert_eq!(params.filters.fee.as_deref(), Some("Free"));
    }

    #[test]
    fn test_coordinate_field_errors_on_missing_column() {
        let row = Map::new();
        assert!(matches!(
            coordinate_field(&row, "latitude"),
            Err(ClientError::Decode { .. })
        ));
    }
}
