/// Router tests driven in-process with `tower::ServiceExt::oneshot`
/// Exercises the HTTP facade against an in-memory store
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use mortgage_intake::autosave::DraftStore;
use mortgage_intake::clock::FixedClock;
use mortgage_intake::handlers::{router, AppState};
use mortgage_intake::repository::ApplicationRepository;
use mortgage_intake::storage::MemoryStore;

/// Helper function to create a router over a fresh in-memory store
fn test_app() -> Router {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(FixedClock::on(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()));
    let state = AppState {
        applications: ApplicationRepository::new(store.clone(), clock.clone()),
        drafts: DraftStore::new(store, clock),
    };
    router(Arc::new(state))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn complete_draft() -> Value {
    json!({
        "firstName": "Sarah",
        "lastName": "Johnson",
        "email": "sarah.johnson@email.com",
        "phone": "(555) 123-4567",
        "dateOfBirth": "1985-03-15",
        "ssn": "123-45-6789",
        "address": "123 Main St",
        "city": "New York",
        "state": "NY",
        "zipCode": "10001",
        "propertyAddress": "456 Oak Ave",
        "propertyCity": "Brooklyn",
        "propertyState": "NY",
        "propertyZipCode": "11201",
        "propertyType": "single-family",
        "occupancy": "primary",
        "loanPurpose": "purchase",
        "purchasePrice": "450,000",
        "downPayment": "90,000",
        "loanAmount": "360,000",
        "loanTerm": "30",
        "annualIncome": "150,000",
        "incomeSource": "employment",
        "employmentStatus": "employed"
    })
}

#[tokio::test]
async fn test_health() {
    let app = test_app();
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_format_and_validate_fields() {
    let app = test_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/fields/format",
        Some(json!({"kind": "ssn", "value": "123456789"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["value"], "123-45-6789");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/fields/validate",
        Some(json!({"kind": "email", "value": "bad@"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], false);
    assert_eq!(body["error"], "Please enter a valid email address");

    let (_, body) = send(
        &app,
        Method::POST,
        "/api/v1/fields/validate",
        Some(json!({"kind": "required", "value": " ", "fieldName": "City"})),
    )
    .await;
    assert_eq!(body["error"], "City is required");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/fields/format",
        Some(json!({"kind": "zip", "value": "1"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_step_validation_and_loan_estimate() {
    let app = test_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/steps/4/validate",
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], false);
    assert_eq!(body["errors"]["employmentStatus"], "Employment status is required");

    let (status, _) = send(&app, Method::POST, "/api/v1/steps/9/validate", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/loan/estimate",
        Some(json!({"purchasePrice": "375,000", "downPayment": "75,000", "loanTerm": "30"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["loanAmount"], "300,000");
    assert_eq!(body["monthlyPayment"], "1,896");
}

#[tokio::test]
async fn test_submit_rejects_incomplete_draft() {
    let app = test_app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/applications",
        Some(json!({"firstName": "Sarah"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"]["lastName"], "Last name is required");
    assert!(body["fields"].get("firstName").is_none());
}

#[tokio::test]
async fn test_submit_review_and_list() {
    let app = test_app();

    // Autosave, then submit: the draft is cleared
    let (status, _) = send(&app, Method::PUT, "/api/v1/draft", Some(complete_draft())).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::POST, "/api/v1/applications", Some(complete_draft())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], "APP-001");

    let (status, _) = send(&app, Method::GET, "/api/v1/draft", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, Method::GET, "/api/v1/applications/APP-001", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["creditScore"], 750);
    assert_eq!(body["submittedDate"], "2026-10-16");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/applications/APP-001/approve",
        Some(json!({"approvedAmount": "360,000"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "approved");
    assert_eq!(body["interestRate"], "6.5%");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/applications/APP-001/reject",
        Some(json!({"rejectionReason": "too late"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&app, Method::GET, "/api/v1/applications?status=approved&q=sarah", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["applications"].as_array().unwrap().len(), 1);
    assert_eq!(body["stats"]["approved"], 1);

    let (_, body) = send(&app, Method::GET, "/api/v1/applications?status=pending", None).await;
    assert_eq!(body["applications"].as_array().unwrap().len(), 0);
    assert_eq!(body["stats"]["total"], 1);
}

#[tokio::test]
async fn test_unknown_application_and_blank_decisions() {
    let app = test_app();

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/applications/APP-404/approve",
        Some(json!({"approvedAmount": "1"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    send(&app, Method::POST, "/api/v1/applications", Some(complete_draft())).await;
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/applications/APP-001/reject",
        Some(json!({"rejectionReason": "   "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::GET, "/api/v1/applications?status=bogus", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_clear_all() {
    let app = test_app();
    send(&app, Method::POST, "/api/v1/applications", Some(complete_draft())).await;

    let (status, _) = send(&app, Method::DELETE, "/api/v1/applications", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&app, Method::GET, "/api/v1/applications", None).await;
    assert_eq!(body["stats"]["total"], 0);
}

#[tokio::test]
async fn test_draft_round_trip_keeps_every_field() {
    let app = test_app();
    let draft = json!({
        "firstName": "Sarah",
        "employerAddress": "1 Corporate Way",
        "employerPhone": "(555) 987-6543",
        "previousEmployer": "Acme",
        "housingStatus": "rent",
        "contactMethod": "phone",
        "hasOtherProperties": true
    });

    let (status, _) = send(&app, Method::PUT, "/api/v1/draft", Some(draft.clone())).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::GET, "/api/v1/draft", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], draft);

    let (status, _) = send(&app, Method::DELETE, "/api/v1/draft", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_estimate_without_purchase_price_leaves_loan_amount_blank() {
    let app = test_app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/loan/estimate",
        Some(json!({"purchasePrice": "", "downPayment": "50,000", "loanTerm": "4000000000"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["loanAmount"], "");
    assert_eq!(body["monthlyPayment"], "0");
}
