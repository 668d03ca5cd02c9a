//! HTTP API tests
//!
//! Drives the axum router in-process with `tower::ServiceExt::oneshot`:
//! happy paths, the error envelope, and the conflict mapping the UI relies
//! on ("this slot was just taken").

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode, header};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

use consult_server::booking::{BookingManager, BookingStorage};
use consult_server::core::{Config, ServerState};
use consult_server::services::{CatalogService, MeetLinkProvisioner};
use shared::models::{Consultant, ConsultantStats, Service, WeeklyTemplate};

fn consultant() -> Consultant {
    Consultant {
        id: "c001".to_string(),
        name: "Sunnie".to_string(),
        title: "Data Science Advisor".to_string(),
        avatar: None,
        specialties: vec!["career planning".to_string()],
        bio: None,
        experience: vec![],
        stats: ConsultantStats {
            total_sessions: 128,
            avg_rating: 4.9,
            response_time: "within 2 hours".to_string(),
        },
        services: vec![Service {
            id: "s001".to_string(),
            duration_min: 60,
            price: Decimal::from(1500),
            description: "deep dive".to_string(),
        }],
        meeting_platform: Some("Google Meet".to_string()),
        weekly_template: WeeklyTemplate::default(),
        is_available: true,
    }
}

struct TestApp {
    app: Router,
    _dir: tempfile::TempDir,
}

fn test_app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let storage = BookingStorage::open(dir.path().join("consult.redb")).unwrap();
    let catalog = Arc::new(CatalogService::new());
    catalog.upsert(consultant());
    let manager = Arc::new(BookingManager::new(
        storage,
        catalog.clone(),
        Arc::new(MeetLinkProvisioner::default()),
        300,
    ));

    let config = Config {
        work_dir: dir.path().to_string_lossy().into_owned(),
        http_port: 0,
        hold_ttl_secs: 300,
        sweep_interval_secs: 60,
        catalog_path: None,
        log_level: "info".to_string(),
        environment: "development".to_string(),
    };

    let state = ServerState::with_services(config, catalog, manager);
    TestApp {
        app: consult_server::api::router(state),
        _dir: dir,
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn create_payload(requester: &str) -> Value {
    json!({
        "consultant_id": "c001",
        "service_id": "s001",
        "slot_start": "2025-02-06T10:00:00Z",
        "topic": "career advice",
        "requester_id": requester,
    })
}

#[tokio::test]
async fn test_health_and_consultant_directory() {
    let test = test_app();

    let (status, body) = send(&test.app, get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["consultants"], 1);

    let (status, body) = send(&test.app, get("/api/consultants")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"], "c001");
    assert_eq!(body[0]["min_price"], 1500.0);

    let (status, body) = send(&test.app, get("/api/consultants/c001")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["services"][0]["duration_min"], 60);

    let (status, body) = send(&test.app, get("/api/consultants/c999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "E0003");
}

#[tokio::test]
async fn test_availability_window() {
    let test = test_app();

    let (status, body) = send(
        &test.app,
        get("/api/consultants/c001/availability?from=2025-02-06&to=2025-02-06"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["offering"], true);
    assert_eq!(body["slots"].as_array().unwrap().len(), 7);
    assert_eq!(body["slots"][1]["id"], "slot-2025-02-06-1000");
    assert_eq!(body["slots"][1]["status"], "FREE");

    // Inverted range is a validation error
    let (status, body) = send(
        &test.app,
        get("/api/consultants/c001/availability?from=2025-02-07&to=2025-02-06"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "E0002");
}

#[tokio::test]
async fn test_booking_flow_over_http() {
    let test = test_app();

    // Create
    let (status, booking) = send(&test.app, post("/api/bookings", create_payload("u001"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(booking["status"], "PENDING_PAYMENT");
    let id = booking["id"].as_str().unwrap().to_string();

    // The same slot now conflicts, with the actionable message
    let (status, body) = send(&test.app, post("/api/bookings", create_payload("u002"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "E1002");
    assert!(body["message"].as_str().unwrap().contains("choose another"));

    // Availability reflects it
    let (_, body) = send(
        &test.app,
        get("/api/consultants/c001/availability?from=2025-02-06&to=2025-02-06"),
    )
    .await;
    assert_eq!(body["slots"][1]["status"], "BOOKED");

    // Pay
    let (status, paid) = send(
        &test.app,
        post(
            &format!("/api/bookings/{}/pay", id),
            json!({"payment_ref": "pay-001"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paid["status"], "CONFIRMED");
    assert!(!paid["meeting_link"].as_str().unwrap().is_empty());

    // Listing by requester finds it
    let (status, body) = send(&test.app, get("/api/bookings?requester_id=u001")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    // Completing before the session end is rejected
    let (status, body) = send(
        &test.app,
        post(&format!("/api/bookings/{}/complete", id), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "E1007");

    // Cancel, then the slot is free again
    let (status, cancelled) = send(
        &test.app,
        post(
            &format!("/api/bookings/{}/cancel", id),
            json!({"actor": "REQUESTER"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "CANCELLED");

    let (_, body) = send(
        &test.app,
        get("/api/consultants/c001/availability?from=2025-02-06&to=2025-02-06"),
    )
    .await;
    assert_eq!(body["slots"][1]["status"], "FREE");
}

#[tokio::test]
async fn test_request_validation() {
    let test = test_app();

    // Empty topic is a typed engine error
    let mut payload = create_payload("u001");
    payload["topic"] = json!("   ");
    let (status, body) = send(&test.app, post("/api/bookings", payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("topic"));

    // Empty requester id is caught by payload validation
    let mut payload = create_payload("");
    payload["requester_id"] = json!("");
    let (status, _) = send(&test.app, post("/api/bookings", payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Listing needs exactly one party
    let (status, _) = send(&test.app, get("/api/bookings?requester_id=a&consultant_id=b")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
