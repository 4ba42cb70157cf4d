//! Integration tests for the HTTP surface
//!
//! Drives the real router through `axum-test`; the CORS and header checks go
//! through `tower::ServiceExt::oneshot` so raw responses can be inspected.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use axum_test::TestServer;
use proration_api::config::{LimitsConfig, ProrationConfig};
use proration_api::create_app;
use proration_api::error::ApiErrorResponse;
use proration_api::handlers::REQUEST_ID_HEADER;
use proration_api::types::{HealthResponse, ServiceInfo};
use serde_json::{Value, json};
use tower::ServiceExt;

fn create_test_server() -> TestServer {
    create_test_server_with(ProrationConfig::default())
}

fn create_test_server_with(config: ProrationConfig) -> TestServer {
    let app = create_app(config).expect("Failed to create app");
    TestServer::new(app).expect("Failed to create test server")
}

#[tokio::test]
async fn test_service_info() {
    let server = create_test_server();

    for path in ["/", "/api"] {
        let response = server.get(path).await;
        response.assert_status_ok();

        let info: ServiceInfo = response.json();
        assert_eq!(info.message, "Allocation Portal API");
        assert_eq!(info.version, "1.0.0");
        assert_eq!(info.endpoints.health, "/api/health");
        assert_eq!(info.endpoints.prorate, "/api/prorate (POST)");
    }
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server();

    let response = server.get("/api/health").await;
    response.assert_status_ok();

    let health: HealthResponse = response.json();
    assert_eq!(health.status, "UP");
    assert_eq!(health.service, "Allocation Portal API");
}

#[tokio::test]
async fn test_prorate_oversubscribed_pool() {
    let server = create_test_server();

    let response = server
        .post("/api/prorate")
        .json(&json!({
            "pool": 100,
            "claims": [
                {"id": "Investor A", "requested_amount": 150, "weight": 100},
                {"id": "Investor B", "requested_amount": 50, "weight": 25}
            ]
        }))
        .await;

    response.assert_status_ok();
    response.assert_json(&json!({"Investor A": 80.0, "Investor B": 20.0}));
}

#[tokio::test]
async fn test_prorate_accepts_portal_field_names() {
    let server = create_test_server();

    let response = server
        .post("/api/prorate")
        .json(&json!({
            "allocation_amount": 100,
            "investor_amounts": [
                {"name": "Investor A", "requested_amount": 20, "average_amount": 100},
                {"name": "Investor B", "requested_amount": 200, "average_amount": 100}
            ]
        }))
        .await;

    response.assert_status_ok();
    response.assert_json(&json!({"Investor A": 20.0, "Investor B": 80.0}));
}

#[tokio::test]
async fn test_prorate_preserves_claim_order() {
    let server = create_test_server();

    let response = server
        .post("/api/prorate")
        .json(&json!({
            "pool": 1000,
            "claims": [
                {"id": "zeta", "requested_amount": 10, "weight": 1},
                {"id": "alpha", "requested_amount": 20, "weight": 1},
                {"id": "mid", "requested_amount": 30, "weight": 1}
            ]
        }))
        .await;

    response.assert_status_ok();
    let text = response.text();
    assert_eq!(text, r#"{"zeta":10.0,"alpha":20.0,"mid":30.0}"#);
}

#[tokio::test]
async fn test_prorate_rejects_invalid_input() {
    let server = create_test_server();

    let cases = [
        (json!({"pool": 0, "claims": [{"id": "a", "requested_amount": 1, "weight": 1}]}), "pool"),
        (json!({"pool": 10, "claims": []}), "claims"),
        (
            json!({"pool": 10, "claims": [
                {"id": "a", "requested_amount": 1, "weight": 1},
                {"id": "a", "requested_amount": 2, "weight": 1}
            ]}),
            "id",
        ),
        (json!({"pool": 10, "claims": [{"id": "a", "requested_amount": -1, "weight": 1}]}), "requested_amount"),
        (json!({"pool": 10, "claims": [{"id": "a", "requested_amount": 1, "weight": -1}]}), "weight"),
    ];

    for (body, field) in cases {
        let response = server.post("/api/prorate").json(&body).await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let error: ApiErrorResponse = response.json();
        assert_eq!(error.code, "VALIDATION_ERROR", "body: {body}");
        assert_eq!(error.details, Some(json!({ "field": field })), "body: {body}");
        assert!(error.request_id.is_some());
    }
}

#[tokio::test]
async fn test_prorate_rejects_malformed_body() {
    let server = create_test_server();

    let response = server
        .post("/api/prorate")
        .text(r#"{"pool": 100, "claims": [{"id": "a"}"#)
        .content_type("application/json")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let error: ApiErrorResponse = response.json();
    assert_eq!(error.code, "VALIDATION_ERROR");
    assert!(error.error.starts_with("Malformed request body"));

    let response = server.post("/api/prorate").json(&json!({"claims": []})).await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_prorate_respects_claim_limit() {
    let config = ProrationConfig {
        limits: LimitsConfig { max_claims_per_request: 2, ..LimitsConfig::default() },
        ..ProrationConfig::default()
    };
    let server = create_test_server_with(config);

    let claims: Vec<Value> = (0..3)
        .map(|i| json!({"id": format!("claim-{i}"), "requested_amount": 10, "weight": 1}))
        .collect();
    let response = server.post("/api/prorate").json(&json!({"pool": 5, "claims": claims})).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let error: ApiErrorResponse = response.json();
    assert_eq!(error.error, "Too many claims: 3 exceeds the limit of 2");
}

#[tokio::test]
async fn test_prorate_without_basis_is_a_server_error() {
    let server = create_test_server();

    let response = server
        .post("/api/prorate")
        .json(&json!({
            "pool": 100,
            "claims": [
                {"id": "a", "requested_amount": 80, "weight": 0},
                {"id": "b", "requested_amount": 80, "weight": 0}
            ]
        }))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let error: ApiErrorResponse = response.json();
    assert_eq!(error.code, "PRORATION_ERROR");
    assert_eq!(error.error, "Failed to calculate proration");
    assert_eq!(error.details.unwrap()["reason"], "NO_PRORATION_BASIS");
}

#[tokio::test]
async fn test_zero_weights_are_fine_when_pool_covers_demand() {
    let server = create_test_server();

    let response = server
        .post("/api/prorate")
        .json(&json!({
            "pool": 200,
            "claims": [
                {"id": "a", "requested_amount": 80, "weight": 0},
                {"id": "b", "requested_amount": 80, "weight": 0}
            ]
        }))
        .await;

    response.assert_status_ok();
    response.assert_json(&json!({"a": 80.0, "b": 80.0}));
}

#[tokio::test]
async fn test_unknown_route() {
    let server = create_test_server();

    let response = server.get("/api/allocations").await;
    response.assert_status(StatusCode::NOT_FOUND);

    let error: ApiErrorResponse = response.json();
    assert_eq!(error.code, "NOT_FOUND");
    assert_eq!(error.error, "Resource not found: /api/allocations");
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let config = ProrationConfig {
        limits: LimitsConfig { max_body_size_kb: 1, ..LimitsConfig::default() },
        ..ProrationConfig::default()
    };
    let server = create_test_server_with(config);

    let claims: Vec<Value> = (0..200)
        .map(|i| json!({"id": format!("claim-{i}"), "requested_amount": 10, "weight": 1}))
        .collect();
    let response = server.post("/api/prorate").json(&json!({"pool": 5, "claims": claims})).await;

    assert!(response.status_code().is_client_error());
}

#[tokio::test]
async fn test_request_id_header() {
    let app = create_app(ProrationConfig::default()).unwrap();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/prorate")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"pool": 10, "claims": []}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let header_id = response
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .expect("request id header");

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let error: ApiErrorResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(error.request_id.as_deref(), Some(header_id.as_str()));
}

#[tokio::test]
async fn test_cors_preflight() {
    let app = create_app(ProrationConfig::default()).unwrap();

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/prorate")
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();

    assert!(response.status().is_success());
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:3000"
    );
    assert_eq!(response.headers().get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(), "true");

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/prorate")
        .header(header::ORIGIN, "http://evil.example")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}
