//! Integration tests for the HTTP client and handlers using a mock server

use meridian_cloud::databases::{DatabaseCreateRequest, DatabaseMoveRequest};
use meridian_cloud::{CloudClient, RetryConfig, WORK_REQUEST_ID_HEADER};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client_for(server: &MockServer) -> CloudClient {
    CloudClient::builder()
        .base_url(server.uri())
        .api_key("test-key")
        .api_secret("test-secret")
        .retry(RetryConfig::disabled())
        .build()
        .expect("client builds")
}

fn database_body(id: &str, state: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": "orders",
        "projectId": "proj-1",
        "lifecycleState": state,
        "engine": "postgres",
        "storageGb": 50
    })
}

#[tokio::test]
async fn get_database_decodes_model_and_sends_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/databases/db-1"))
        .and(header("x-api-key", "test-key"))
        .and(header("x-api-secret-key", "test-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(database_body("db-1", "AVAILABLE")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let db = client.databases().get("db-1").await.expect("get succeeds");

    assert_eq!(db.id, "db-1");
    assert_eq!(db.lifecycle_state, "AVAILABLE");
    assert_eq!(db.engine.as_deref(), Some("postgres"));
}

#[tokio::test]
async fn missing_database_maps_to_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/databases/db-9"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"message": "db-9 not found"})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client.databases().get("db-9").await.unwrap_err();

    assert!(err.is_not_found());
    assert!(err.to_string().contains("db-9"));
}

#[tokio::test]
async fn list_databases_unwraps_envelope() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/databases"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "databases": [database_body("db-1", "AVAILABLE"), database_body("db-2", "STOPPED")]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let dbs = client.databases().list().await.expect("list succeeds");

    assert_eq!(dbs.len(), 2);
    assert_eq!(dbs[1].id, "db-2");
}

#[tokio::test]
async fn create_database_exposes_request_metadata() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/databases"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(database_body("db-7", "PROVISIONING"))
                .insert_header("x-meridian-request-id", "req-42"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let request = DatabaseCreateRequest::new("orders", "proj-1").with_storage_gb(50);
    let response = client
        .databases()
        .create(&request)
        .await
        .expect("create succeeds");

    assert_eq!(response.body.id, "db-7");
    assert_eq!(response.request_id.as_deref(), Some("req-42"));
    assert_eq!(response.work_request_id, None);
}

#[tokio::test]
async fn move_database_surfaces_work_request_header() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/databases/db-1/actions/move"))
        .respond_with(ResponseTemplate::new(202).insert_header(WORK_REQUEST_ID_HEADER, "wr-100"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let request = DatabaseMoveRequest {
        target_project_id: "proj-2".into(),
    };
    let response = client
        .databases()
        .move_to_project("db-1", &request)
        .await
        .expect("move succeeds");

    assert_eq!(response.work_request_id.as_deref(), Some("wr-100"));
}

#[tokio::test]
async fn transient_server_error_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/databases/db-1"))
        .respond_with(ResponseTemplate::new(503).set_body_string("warming up"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/databases/db-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(database_body("db-1", "AVAILABLE")))
        .expect(1)
        .mount(&server)
        .await;

    let client = CloudClient::builder()
        .base_url(server.uri())
        .api_key("k")
        .api_secret("s")
        .retry(RetryConfig {
            enabled: true,
            max_attempts: 3,
            backoff_ms: 1,
            max_backoff_ms: 10,
        })
        .build()
        .expect("client builds");

    let db = client.databases().get("db-1").await.expect("retries succeed");
    assert_eq!(db.lifecycle_state, "AVAILABLE");
}

#[tokio::test]
async fn authentication_failure_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/databases/db-1"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "bad key"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = CloudClient::builder()
        .base_url(server.uri())
        .api_key("k")
        .api_secret("s")
        .retry(RetryConfig {
            enabled: true,
            max_attempts: 3,
            backoff_ms: 1,
            max_backoff_ms: 10,
        })
        .build()
        .expect("client builds");

    let err = client.databases().get("db-1").await.unwrap_err();
    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn work_request_lookup_decodes_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/work-requests/wr-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "wr-1",
            "operationType": "MOVE_DATABASE",
            "status": "IN_PROGRESS",
            "percentComplete": 40.0,
            "resources": [
                {"entityType": "database", "identifier": "db-1", "actionType": "UPDATED"}
            ]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let wr = client.work_requests().get("wr-1").await.expect("get succeeds");

    assert_eq!(wr.status, "IN_PROGRESS");
    assert_eq!(wr.resources.len(), 1);
    assert_eq!(wr.resources[0].identifier, "db-1");
}
