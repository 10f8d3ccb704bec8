use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Stale submission: expected question {expected}, got {got}")]
    StaleSubmission { expected: String, got: String },

    #[error("Attempt has been terminated")]
    AttemptTerminated,

    #[error("Assessment is already completed")]
    AssessmentCompleted,

    #[error("Execution failure: {0}")]
    ExecutionFailure(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let (status, code, message) = match self {
            Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            Error::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            Error::StaleSubmission { expected, got } => (
                StatusCode::CONFLICT,
                "stale_submission",
                format!("expected question {}, got {}", expected, got),
            ),
            Error::AttemptTerminated => (
                StatusCode::CONFLICT,
                "attempt_terminated",
                "This assessment has been terminated and no longer accepts input".to_string(),
            ),
            Error::AssessmentCompleted => (
                StatusCode::CONFLICT,
                "assessment_completed",
                "This assessment is already completed; fetch the results instead".to_string(),
            ),
            Error::ExecutionFailure(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "execution_failure", msg)
            }
            Error::Validation(err) => {
                (StatusCode::BAD_REQUEST, "validation_error", err.to_string())
            }
            Error::Json(err) => (StatusCode::BAD_REQUEST, "bad_json", err.to_string()),
            Error::Anyhow(err) => (StatusCode::BAD_REQUEST, "bad_request", err.to_string()),
            Error::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg),
            Error::Io(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                err.to_string(),
            ),
            Error::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error", msg),
        };

        let body = Json(json!({ "error": code, "message": message }));
        (status, body).into_response()
    }
}
