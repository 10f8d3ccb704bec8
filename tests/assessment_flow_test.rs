mod common;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use chrono::Utc;
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;

use skillbridge_backend::models::answer::AnswerValue;
use skillbridge_backend::models::assessment::AssessmentType;
use skillbridge_backend::services::assessment_service::SubmitOutcome;
use skillbridge_backend::{AppState, PolicySettings};

async fn body_json(response: axum::response::Response) -> JsonValue {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

fn post_json(uri: &str, token: Option<&str>, body: JsonValue) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(t) = token {
        builder = builder.header("authorization", format!("Bearer {}", t));
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

fn get_req(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).expect("request")
}

async fn create_assessment(app: &axum::Router, questions: JsonValue) -> String {
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/integration/assessments",
            Some(&common::token("hr")),
            json!({
                "candidate_id": "cand-42",
                "provider": "acme-jobs",
                "assessment_type": "QUICK_CHECK",
                "skill_category": "javascript",
                "questions": questions
            }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    body["assessment_id"].as_str().expect("assessment id").to_string()
}

#[tokio::test]
async fn full_flow_from_creation_to_results() {
    common::init();
    let state = AppState::new(PolicySettings::default());
    let app = common::app(state);

    let questions = serde_json::to_value(vec![
        common::multiple_choice("q1", "const"),
        common::true_false("q2", true),
    ])
    .unwrap();
    let id = create_assessment(&app, questions).await;

    // First fetch starts the attempt and issues question 0.
    let response = app
        .clone()
        .oneshot(get_req(&format!("/api/assessments/{}/question", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["question_index"], 0);
    assert_eq!(body["total_questions"], 2);
    assert_eq!(body["question"]["question_id"], "q1");
    // Grading material must never reach the candidate.
    assert!(body["question"].get("correct_answer").is_none());
    assert!(body["question"].get("explanation").is_none());
    assert!(body["deadline"].is_string());

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/assessments/{}/answer", id),
            None,
            json!({"question_id": "q1", "answer": "const"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["accepted"], true);
    assert_eq!(body["completed"], false);
    assert_eq!(body["next_question"]["question"]["question_id"], "q2");

    // Re-submitting the same question returns the stored answer untouched.
    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/assessments/{}/answer", id),
            None,
            json!({"question_id": "q1", "answer": "let"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["already_answered"], true);
    assert_eq!(body["accepted"], false);
    // The stored answer comes back, not the retried one, and the reply
    // carries the question currently on the clock.
    assert_eq!(body["answer"]["answer"], "const");
    assert_eq!(body["next_question"]["question"]["question_id"], "q2");

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/assessments/{}/answer", id),
            None,
            json!({"question_id": "q2", "answer": "true"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["completed"], true);
    assert!(body["next_question"].is_null());

    // The question endpoint now signals completion instead of a generic
    // rejection, so clients know to fetch the results.
    let response = app
        .clone()
        .oneshot(get_req(&format!("/api/assessments/{}/question", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["error"], "assessment_completed");

    // A retried final answer stays idempotent after completion.
    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/assessments/{}/answer", id),
            None,
            json!({"question_id": "q2", "answer": "false"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["already_answered"], true);
    assert_eq!(body["completed"], true);
    assert_eq!(body["answer"]["answer"], "true");
    assert!(body["next_question"].is_null());

    let response = app
        .clone()
        .oneshot(get_req(&format!("/api/assessments/{}/results", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["overall_score"], 100);
    assert_eq!(body["skill_level"], "EXPERT");
    assert_eq!(body["correct_answers"], 2);
    assert_eq!(body["incorrect_answers"], 0);
    assert_eq!(body["total_questions"], 2);
    assert_eq!(body["status"], "COMPLETED");

    let response = app
        .clone()
        .oneshot(get_req(&format!("/api/assessments/{}/progress", id)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["status"], "COMPLETED");
    assert_eq!(body["answered"], 2);
    assert_eq!(body["average_score"], 100);
    assert!(body.get("current_deadline").is_none());
}

#[tokio::test]
async fn out_of_order_submission_is_rejected_as_stale() {
    common::init();
    let state = AppState::new(PolicySettings::default());
    let app = common::app(state);

    let questions = serde_json::to_value(vec![
        common::multiple_choice("q1", "const"),
        common::true_false("q2", false),
    ])
    .unwrap();
    let id = create_assessment(&app, questions).await;

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/assessments/{}/answer", id),
            None,
            json!({"question_id": "q2", "answer": "false"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["error"], "stale_submission");
}

#[tokio::test]
async fn early_complete_backfills_unanswered_questions() {
    common::init();
    let state = AppState::new(PolicySettings::default());
    let app = common::app(state);

    let questions = serde_json::to_value(vec![
        common::multiple_choice("q1", "const"),
        common::true_false("q2", true),
        common::scenario("q3", &["profiler", "heap"]),
    ])
    .unwrap();
    let id = create_assessment(&app, questions).await;

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/assessments/{}/answer", id),
            None,
            json!({"question_id": "q1", "answer": "const"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(post_json(&format!("/api/assessments/{}/complete", id), None, json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "COMPLETED");

    // Completing again is a no-op.
    let response = app
        .clone()
        .oneshot(post_json(&format!("/api/assessments/{}/complete", id), None, json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get_req(&format!("/api/assessments/{}/results", id)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["total_questions"], 3);
    assert_eq!(body["correct_answers"], 1);
    // One correct out of three, averaged: round(100/3).
    assert_eq!(body["overall_score"], 33);
    assert_eq!(body["skill_level"], "BEGINNER");
}

#[tokio::test]
async fn integration_surface_requires_hr_or_admin_role() {
    common::init();
    let state = AppState::new(PolicySettings::default());
    let app = common::app(state);

    let payload = json!({
        "candidate_id": "cand-1",
        "provider": "acme-jobs",
        "assessment_type": "QUICK_CHECK",
        "skill_category": "javascript",
        "questions": serde_json::to_value(vec![common::true_false("q1", true)]).unwrap()
    });

    let response = app
        .clone()
        .oneshot(post_json("/api/integration/assessments", None, payload.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/integration/assessments",
            Some(&common::token("candidate")),
            payload,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn simultaneous_answers_for_one_question_record_exactly_once() {
    common::init();
    let state = AppState::new(PolicySettings::default());

    let id = state
        .assessments
        .create_attempt(
            "cand-7".to_string(),
            "acme-jobs".to_string(),
            AssessmentType::QuickCheck,
            "javascript".to_string(),
            vec![common::true_false("q1", true), common::true_false("q2", false)],
        )
        .expect("create attempt");

    // Two racing submits for the same current question, as a double-click
    // would produce. The attempt lock serializes them.
    let now = Utc::now();
    let s1 = state.clone();
    let s2 = state.clone();
    let first = std::thread::spawn(move || {
        s1.assessments
            .submit_answer(id, "q1", AnswerValue::Text("true".to_string()), now)
    });
    let second = std::thread::spawn(move || {
        s2.assessments
            .submit_answer(id, "q1", AnswerValue::Text("false".to_string()), now)
    });
    let outcomes = [
        first.join().expect("thread").expect("submit"),
        second.join().expect("thread").expect("submit"),
    ];

    let recorded = outcomes
        .iter()
        .filter(|o| matches!(o, SubmitOutcome::Recorded { .. }))
        .count();
    assert_eq!(recorded, 1);
    assert!(outcomes
        .iter()
        .any(|o| matches!(o, SubmitOutcome::AlreadyAnswered { .. })));

    let attempt = state.store.attempt_snapshot(id).expect("snapshot");
    assert_eq!(attempt.current_question_index, 1);
    assert_eq!(attempt.answers.len(), 1);
}

#[tokio::test]
async fn results_require_a_finished_attempt() {
    common::init();
    let state = AppState::new(PolicySettings::default());
    let app = common::app(state);

    let questions = serde_json::to_value(vec![common::true_false("q1", true)]).unwrap();
    let id = create_assessment(&app, questions).await;

    let response = app
        .clone()
        .oneshot(get_req(&format!("/api/assessments/{}/results", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
