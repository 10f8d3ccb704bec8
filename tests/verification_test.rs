mod common;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;

use skillbridge_backend::models::verification::{SubjectType, VerificationDecision};
use skillbridge_backend::{AppState, PolicySettings};

async fn body_json(response: axum::response::Response) -> JsonValue {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn clean_subject_is_approved() {
    common::init();
    let state = AppState::new(PolicySettings::default());

    let run = state
        .verification
        .start_run(SubjectType::Company, "acme-robotics".to_string())
        .expect("start run");
    assert!(state.verification.run_once().expect("worker pass"));

    let finished = state.verification.run(run.run_id).expect("run");
    assert_eq!(finished.decision, Some(VerificationDecision::Approve));
    assert_eq!(finished.risk_score, Some(0.0));
    assert!(finished.reason_codes.is_empty());
    assert!(finished.ended_at.is_some());
}

#[tokio::test]
async fn placeholder_subject_goes_to_manual_review() {
    common::init();
    let state = AppState::new(PolicySettings::default());

    let run = state
        .verification
        .start_run(SubjectType::Company, "test-company".to_string())
        .expect("start run");
    assert!(state.verification.run_once().expect("worker pass"));

    let finished = state.verification.run(run.run_id).expect("run");
    assert_eq!(finished.decision, Some(VerificationDecision::ManualReview));
    assert!(finished
        .reason_codes
        .contains(&"placeholder_identity".to_string()));
}

#[tokio::test]
async fn same_subject_verifies_to_the_same_outcome() {
    common::init();
    let state = AppState::new(PolicySettings::default());

    let first = state
        .verification
        .start_run(SubjectType::Agency, "recruit-hub-7781".to_string())
        .expect("start run");
    let second = state
        .verification
        .start_run(SubjectType::Agency, "recruit-hub-7781".to_string())
        .expect("start run");
    assert!(state.verification.run_once().expect("worker pass"));
    assert!(state.verification.run_once().expect("worker pass"));
    assert!(!state.verification.run_once().expect("worker pass"));

    let a = state.verification.run(first.run_id).expect("run");
    let b = state.verification.run(second.run_id).expect("run");
    assert_eq!(a.decision, b.decision);
    assert_eq!(a.risk_score, b.risk_score);
    assert_eq!(a.reason_codes, b.reason_codes);
}

#[tokio::test]
async fn verification_runs_over_the_integration_api() {
    common::init();
    let state = AppState::new(PolicySettings::default());
    let app = common::app(state.clone());

    let request = Request::builder()
        .method("POST")
        .uri("/api/integration/verification/runs")
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", common::token("admin")))
        .body(Body::from(
            json!({"subject_type": "COMPANY", "subject_id": "northwind-labs"}).to_string(),
        ))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = body_json(response).await;
    assert_eq!(body["status"], "PENDING");
    let run_id = body["run_id"].as_str().unwrap().to_string();

    assert!(state.verification.run_once().expect("worker pass"));

    let request = Request::builder()
        .uri(format!("/api/integration/verification/runs/{}", run_id))
        .header("authorization", format!("Bearer {}", common::token("hr")))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "COMPLETED");
    assert_eq!(body["decision"], "APPROVE");
    assert!(!body["signals"].as_array().unwrap().is_empty());
}
