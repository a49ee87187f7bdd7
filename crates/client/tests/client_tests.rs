//! Integration tests for the client facade against a mock SQL endpoint.

use wiremock::matchers::{method, path, query_param_contains};
use wiremock::{Mock, MockServer, ResponseTemplate};

use recfinder_client::{ClientConfig, ClientError, FinderClient, SearchParams};
use recfinder_query::GeoMode;

fn client_for(server: &MockServer) -> FinderClient {
    let config = ClientConfig {
        base_url: server.uri(),
        ..Default::default()
    };
    FinderClient::new(config).unwrap()
}

fn rows_body(rows: serde_json::Value) -> serde_json::Value {
    serde_json::json!({ "rows": rows, "time": 0.004 })
}

// ============================================================================
// Search
// ============================================================================

#[tokio::test]
async fn test_search_returns_facilities_then_programs() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sql"))
        .and(query_param_contains("q", "FROM ppr_facilities"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows_body(
            serde_json::json!([{"id": "f1", "facility_name": "Shot Tower Rec Center"}]),
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sql"))
        .and(query_param_contains("q", "FROM ppr_programs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows_body(
            serde_json::json!([{"id": "p1", "program_name": "Summer Camp"}]),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let params = SearchParams::default();
    let (facilities, programs) = client.search(&params, &GeoMode::None).await.unwrap();

    assert_eq!(facilities.rows[0]["facility_name"], "Shot Tower Rec Center");
    assert_eq!(programs.rows[0]["program_name"], "Summer Camp");
}

#[tokio::test]
async fn test_search_fails_when_either_leg_fails() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sql"))
        .and(query_param_contains("q", "FROM ppr_facilities"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(rows_body(serde_json::json!([]))),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sql"))
        .and(query_param_contains("q", "FROM ppr_programs"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client.search(&SearchParams::default(), &GeoMode::None).await;
    assert!(matches!(result, Err(ClientError::Transport(_))));
}

// ============================================================================
// Caching
// ============================================================================

#[tokio::test]
async fn test_identical_statement_fetches_at_most_once() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows_body(
            serde_json::json!([{"id": "1", "day_name": "Monday"}]),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let first = client.get_days().await.unwrap();
    let second = client.get_days().await.unwrap();

    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!(client.cache().len(), 1);
}

#[tokio::test]
async fn test_disabled_cache_refetches_every_call() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sql"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(rows_body(serde_json::json!([]))),
        )
        .expect(2)
        .mount(&server)
        .await;

    let config = ClientConfig {
        base_url: server.uri(),
        cache_enabled: false,
        ..Default::default()
    };
    let client = FinderClient::new(config).unwrap();
    client.get_days().await.unwrap();
    client.get_days().await.unwrap();

    assert!(client.cache().is_empty());
}

#[tokio::test]
async fn test_failed_fetch_does_not_populate_the_cache() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sql"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client.get_days().await;

    assert!(matches!(result, Err(ClientError::Transport(_))));
    assert!(client.cache().is_empty());
}

// ============================================================================
// Zipcode centroid
// ============================================================================

#[tokio::test]
async fn test_zip_centroid_parses_coordinates() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sql"))
        .and(query_param_contains("q", "FROM zip_codes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows_body(
            serde_json::json!([{"latitude": 39.9523, "longitude": -75.1738}]),
        )))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let centroid = client.get_zip_centroid("19103").await.unwrap();
    assert!((centroid.latitude() - 39.9523).abs() < 1e-9);
    assert!((centroid.longitude() - (-75.1738)).abs() < 1e-9);
}

#[tokio::test]
async fn test_zip_centroid_reports_unknown_zip() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sql"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(rows_body(serde_json::json!([]))),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client.get_zip_centroid("99999").await;
    assert!(matches!(result, Err(ClientError::ZipNotFound { zip }) if zip == "99999"));
}

#[tokio::test]
async fn test_zip_centroid_rejects_malformed_zip_without_fetching() {
    // No mock mounted: a malformed zipcode must fail before any request.
    let server = MockServer::start().await;
    let client = client_for(&server);

    let result = client.get_zip_centroid("1910").await;
    assert!(matches!(result, Err(ClientError::Query(_))));
}

// ============================================================================
// Taxonomy and validation
// ============================================================================

#[tokio::test]
async fn test_entity_taxonomy_accepts_aliases() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sql"))
        .and(query_param_contains("q", "FROM ppr_activity_categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows_body(
            serde_json::json!([{"id": "c1", "activity_category_name": "Sports"}]),
        )))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let terms = client.get_entity_taxonomy("activities").await.unwrap();
    assert_eq!(terms.rows[0]["activity_category_name"], "Sports");
}

#[tokio::test]
async fn test_unknown_entity_type_fails_without_fetching() {
    let server = MockServer::start().await;
    let client = client_for(&server);

    let result = client.get_entity_taxonomy("parades").await;
    assert!(matches!(result, Err(ClientError::Query(_))));
}
