#![allow(dead_code)]

use std::env;

use axum::{
    routing::{get, post},
    Router,
};
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;
use skillbridge_backend::middleware::auth::Claims;
use skillbridge_backend::models::question::Question;
use skillbridge_backend::{routes, AppState};

pub const TEST_SECRET: &str = "test_secret_key";

pub fn init() {
    env::set_var("SERVER_ADDRESS", "127.0.0.1:0");
    env::set_var("JWT_SECRET", TEST_SECRET);
    env::set_var("PUBLIC_RPS", "1000");
    env::set_var("INTEGRATION_RPS", "1000");
    // Every test binary shares one process-wide config; first caller wins.
    let _ = skillbridge_backend::config::init_config();
}

/// Same route table as the server binary, minus the rate-limit layers so
/// request-heavy tests cannot trip them.
pub fn app(state: AppState) -> Router {
    let public_api = Router::new()
        .route(
            "/api/assessments/:id/question",
            get(routes::assessment::get_current_question),
        )
        .route(
            "/api/assessments/:id/answer",
            post(routes::assessment::submit_answer),
        )
        .route(
            "/api/assessments/:id/complete",
            post(routes::assessment::complete_assessment),
        )
        .route(
            "/api/assessments/:id/results",
            get(routes::assessment::get_results),
        )
        .route(
            "/api/assessments/:id/progress",
            get(routes::assessment::get_progress),
        )
        .route(
            "/api/assessments/:id/violation",
            post(routes::assessment::report_violation),
        )
        .route(
            "/api/submissions",
            post(routes::submissions::create_submission),
        )
        .route(
            "/api/submissions/:id",
            get(routes::submissions::get_submission),
        )
        .route(
            "/api/submissions/:id/stream",
            get(routes::submissions::stream_submission),
        );

    let integration_api = Router::new()
        .route(
            "/api/integration/assessments",
            post(routes::integration::create_assessment),
        )
        .route(
            "/api/integration/assessments/:id/audit",
            get(routes::integration::get_assessment_audit),
        )
        .route(
            "/api/integration/verification/runs",
            post(routes::integration::start_verification_run),
        )
        .route(
            "/api/integration/verification/runs/:id",
            get(routes::integration::get_verification_run),
        )
        .layer(axum::middleware::from_fn(
            skillbridge_backend::middleware::auth::require_hr_or_admin,
        ));

    Router::new()
        .route("/health", get(routes::health::health))
        .merge(public_api)
        .merge(integration_api)
        .with_state(state)
}

pub fn token(role: &str) -> String {
    let claims = Claims {
        sub: "hr-user-1".to_string(),
        exp: (Utc::now().timestamp() + 3600) as usize,
        role: Some(role.to_string()),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .expect("encode token")
}

pub fn multiple_choice(id: &str, correct: &str) -> Question {
    serde_json::from_value(json!({
        "question_id": id,
        "type": "multiple_choice",
        "question_text": "Which keyword declares a constant?",
        "time_limit_secs": 90,
        "difficulty": "BEGINNER",
        "category": "syntax",
        "options": ["var", "let", correct],
        "correct_answer": correct,
        "explanation": null
    }))
    .expect("question json")
}

pub fn true_false(id: &str, correct: bool) -> Question {
    serde_json::from_value(json!({
        "question_id": id,
        "type": "true_false",
        "question_text": "Arrays are zero-indexed.",
        "time_limit_secs": 30,
        "difficulty": "BEGINNER",
        "category": "fundamentals",
        "correct_answer": correct
    }))
    .expect("question json")
}

pub fn scenario(id: &str, keywords: &[&str]) -> Question {
    serde_json::from_value(json!({
        "question_id": id,
        "type": "scenario",
        "question_text": "How would you debug a memory leak?",
        "time_limit_secs": 180,
        "difficulty": "ADVANCED",
        "category": "debugging",
        "expected_keywords": keywords,
        "min_words": 10
    }))
    .expect("question json")
}

pub fn coding(id: &str, language: &str, input: &str, expected: &str) -> Question {
    serde_json::from_value(json!({
        "question_id": id,
        "type": "coding",
        "question_text": "Print the answer.",
        "time_limit_secs": 300,
        "difficulty": "INTERMEDIATE",
        "category": "implementation",
        "language": language,
        "starter_code": null,
        "test_cases": [{"input": input, "expected": expected}]
    }))
    .expect("question json")
}
