/// Integration tests with mocked external APIs
/// Runs the enrichment pipeline against wiremock stand-ins for the valuation
/// provider, the assessment provider and the record store.
use property_enrichment_api::config::Config;
use property_enrichment_api::enrichment::PropertyEnricher;
use property_enrichment_api::errors::AppError;
use property_enrichment_api::models::{PropertyField, PropertyPayload};
use property_enrichment_api::services::{AssessmentService, ValuationService};
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ADDRESS: &str = "123 Main St, Springfield, IL";
const STORE_PATH: &str = "/v0/appTEST/Properties";

/// Helper function to create test config with every provider on one mock server
fn create_test_config(base: &str) -> Config {
    Config {
        port: 8080,
        valuation_base_url: format!("{}/valuation", base),
        valuation_api_key: "test_valuation_key".to_string(),
        valuation_api_host: Some("valuation.example.com".to_string()),
        assessment_base_url: format!("{}/assessment", base),
        assessment_api_key: "test_assessment_key".to_string(),
        store_base_url: format!("{}/v0", base),
        store_base_id: "appTEST".to_string(),
        store_table: "Properties".to_string(),
        store_token: "test_store_token".to_string(),
        http_timeout_secs: 5,
        is_buying_home_default: None,
    }
}

fn enricher(config: &Config) -> PropertyEnricher {
    PropertyEnricher::from_config(config, reqwest::Client::new())
}

fn jane_doe() -> PropertyPayload {
    PropertyPayload {
        address: ADDRESS.to_string(),
        first_name: Some("Jane".to_string()),
        last_name: Some("Doe".to_string()),
        email: Some("jane@example.com".to_string()),
        ..Default::default()
    }
}

async fn mount_store_success(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(STORE_PATH))
        .and(header("Authorization", "Bearer test_store_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "recA1B2C3",
            "createdTime": "2026-10-18T12:00:00.000Z",
            "fields": {}
        })))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_valuation(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/valuation/search"))
        .and(query_param("address", ADDRESS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "zpid": 2077506123u64,
            "zestimate": 405000,
            "imgSrc": "https://photos.example.com/thumb.jpg"
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/valuation/property"))
        .and(query_param("zpid", "2077506123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "zpid": 2077506123u64,
            "zestimate": 412000,
            "rentZestimate": 2150,
            "bedrooms": 3,
            "bathrooms": 2,
            "livingArea": 1850,
            "lotAreaValue": 0.25,
            "yearBuilt": 1978,
            "homeType": "SINGLE_FAMILY",
            "address": { "city": "Springfield", "state": "IL", "zipcode": "62704" }
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/valuation/images"))
        .and(query_param("zpid", "2077506123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "images": ["https://photos.example.com/1.jpg", "https://photos.example.com/2.jpg"]
        })))
        .mount(server)
        .await;
}

async fn mount_assessment(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/assessment/property/expandedprofile"))
        .and(query_param("address", ADDRESS))
        .and(header("apikey", "test_assessment_key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "property": [{
                "identifier": { "attomId": 184713191, "apn": "14-28-322-045" },
                "address": { "line1": "123 MAIN ST", "locality": "SPRINGFIELD", "countrySubd": "IL", "postal1": "62704" },
                "building": { "rooms": { "beds": 4, "bathstotal": 2.5 }, "size": { "livingsize": 1900 } },
                "summary": { "yearbuilt": 1979, "propclass": "Single Family Residence" },
                "lot": { "lotsize2": 10890 }
            }],
            "assessment": [{
                "tax": { "taxamt": 5123.45, "taxyear": 2023 },
                "assessed": { "assdttlvalue": 120000 },
                "market": { "mktttlvalue": 390000 },
                "legal": { "legal1": "LOT 12 BLK 3 OAK PARK ADD" }
            }]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/assessment/property/detailwithschools"))
        .and(query_param("attomid", "184713191"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "property": [{ "school": { "districtName": "Springfield School District 186" } }]
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_valuation_lookup_sends_credentials() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/valuation/search"))
        .and(query_param("address", ADDRESS))
        .and(header("X-RapidAPI-Key", "test_valuation_key"))
        .and(header("X-RapidAPI-Host", "valuation.example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"zpid": 42})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri());
    let service = ValuationService::new(reqwest::Client::new(), &config);
    let result = service.lookup_by_address(ADDRESS).await;

    assert!(result.is_ok());
    assert_eq!(result.unwrap()["zpid"], json!(42));
}

#[tokio::test]
async fn test_provider_error_carries_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/assessment/property/expandedprofile"))
        .respond_with(ResponseTemplate::new(429).set_body_string("Too Many Requests"))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri());
    let service = AssessmentService::new(reqwest::Client::new(), &config);
    let err = service.lookup_by_address(ADDRESS).await.unwrap_err();

    match err {
        AppError::Provider {
            provider,
            status,
            reason,
        } => {
            assert_eq!(provider, "assessment");
            assert_eq!(status, Some(429));
            assert_eq!(reason, "Too Many Requests");
        }
        other => panic!("Expected provider error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_network_failure_has_no_status() {
    // Nothing listens on this port
    let config = create_test_config("http://127.0.0.1:9");
    let service = ValuationService::new(reqwest::Client::new(), &config);
    let err = service.lookup_by_address(ADDRESS).await.unwrap_err();

    assert!(matches!(
        err,
        AppError::Provider {
            provider: "valuation",
            status: None,
            ..
        }
    ));
}

#[tokio::test]
async fn test_full_enrichment_with_precedence() {
    let mock_server = MockServer::start().await;
    mount_valuation(&mock_server).await;
    mount_assessment(&mock_server).await;
    mount_store_success(&mock_server).await;

    let config = create_test_config(&mock_server.uri());
    let payload = PropertyPayload {
        bedrooms: Some(5),
        ..jane_doe()
    };

    let record = enricher(&config).create_property(&payload).await.unwrap();

    assert_eq!(record.id.as_deref(), Some("recA1B2C3"));
    assert!(record.created_at.is_some());

    // User input wins
    assert_eq!(record.get(PropertyField::Bedrooms), &json!(5));
    assert_eq!(record.get(PropertyField::FirstName), &json!("Jane"));
    // Valuation beats assessment
    assert_eq!(record.get(PropertyField::Bathrooms), &json!(2.0));
    assert_eq!(record.get(PropertyField::EstimatedValue), &json!(412000.0));
    assert_eq!(record.get(PropertyField::City), &json!("Springfield"));
    assert_eq!(
        record.get(PropertyField::ImageUrl),
        &json!("https://photos.example.com/1.jpg")
    );
    // Assessment fills what valuation lacks
    assert_eq!(record.get(PropertyField::TaxAmount), &json!(5123.45));
    assert_eq!(record.get(PropertyField::TaxYear), &json!(2023));
    assert_eq!(record.get(PropertyField::ParcelNumber), &json!("14-28-322-045"));
    assert_eq!(
        record.get(PropertyField::SchoolDistrict),
        &json!("Springfield School District 186")
    );
    assert_eq!(record.get(PropertyField::ValuationId), &json!("2077506123"));
    assert_eq!(record.get(PropertyField::AssessmentId), &json!("184713191"));
    // Nobody supplies these
    assert!(record.get(PropertyField::Phone).is_null());
    assert_eq!(record.get(PropertyField::IsBuyingHome), &Value::Null);
}

#[tokio::test]
async fn test_all_providers_fail_record_is_still_persisted() {
    let mock_server = MockServer::start().await;

    // Valuation answers without an identifier
    Mock::given(method("GET"))
        .and(path("/valuation/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/valuation/property"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/valuation/images"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;
    // Assessment is down
    Mock::given(method("GET"))
        .and(path("/assessment/property/expandedprofile"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/assessment/property/detailwithschools"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path(STORE_PATH))
        .and(body_partial_json(json!({
            "fields": {
                "Address": ADDRESS,
                "First Name": "Jane",
                "Last Name": "Doe",
                "Email": "jane@example.com",
                "Estimated Value": null,
                "School District": null,
                "Tax Amount": null
            },
            "typecast": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "recEMPTY"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri());
    let record = enricher(&config).create_property(&jane_doe()).await.unwrap();

    assert_eq!(record.id.as_deref(), Some("recEMPTY"));
    assert_eq!(record.get(PropertyField::Address), &json!(ADDRESS));
    assert_eq!(record.get(PropertyField::Email), &json!("jane@example.com"));
    assert!(record.get(PropertyField::EstimatedValue).is_null());
    assert!(record.get(PropertyField::SchoolDistrict).is_null());
    assert!(record.get(PropertyField::TaxAmount).is_null());
    // Only the four user fields are populated
    assert_eq!(record.populated(), 4);
}

#[tokio::test]
async fn test_school_lookup_skipped_without_assessment_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/assessment/property/expandedprofile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "property": [{ "address": { "locality": "SPRINGFIELD" } }]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/assessment/property/detailwithschools"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri());
    let data = enricher(&config).collect_provider_data(ADDRESS).await;

    assert!(data.assessment_profile.is_some());
    assert!(data.schools.is_none());
    // Valuation routes were never mounted: lookup 404s and degrades to no data
    assert!(data.valuation_summary.is_none());
    assert!(data.valuation_details.is_none());
}

#[tokio::test]
async fn test_secondary_valuation_calls_fail_independently() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/valuation/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"zpid": "77"})))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/valuation/property"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/valuation/images"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "images": ["https://photos.example.com/77.jpg"]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri());
    let data = enricher(&config).collect_provider_data(ADDRESS).await;

    assert!(data.valuation_details.is_none());
    assert_eq!(
        data.valuation_media.unwrap()["images"][0],
        json!("https://photos.example.com/77.jpg")
    );
}

#[tokio::test]
async fn test_persistence_failure_is_fatal() {
    let mock_server = MockServer::start().await;
    mount_valuation(&mock_server).await;

    Mock::given(method("POST"))
        .and(path(STORE_PATH))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "error": { "type": "INVALID_VALUE_FOR_COLUMN" }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri());
    let result = enricher(&config).create_property(&jane_doe()).await;

    let err = result.unwrap_err();
    assert_eq!(err.provider_status(), Some(422));
    assert!(err.to_string().contains("Failed to persist property"));
}

#[tokio::test]
async fn test_store_response_without_id_is_an_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(STORE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"fields": {}})))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri());
    let result = enricher(&config).create_property(&jane_doe()).await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_concurrent_requests_are_independent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(STORE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "recX"})))
        .expect(10)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri());
    let pipeline = enricher(&config);

    let mut handles = vec![];
    for i in 0..10 {
        let pipeline = pipeline.clone();
        handles.push(tokio::spawn(async move {
            let payload = PropertyPayload {
                address: format!("{} Main St, Springfield, IL", i),
                ..Default::default()
            };
            pipeline.create_property(&payload).await
        }));
    }

    for handle in handles {
        let record = handle.await.unwrap().unwrap();
        assert_eq!(record.id.as_deref(), Some("recX"));
    }
}
