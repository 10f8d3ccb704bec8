use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::dto::assessment_dto::{CreateAssessmentRequest, CreateAssessmentResponse};
use crate::dto::verification_dto::{StartVerificationRequest, VerificationRunResponse};
use crate::middleware::auth::Claims;
use crate::models::assessment::AssessmentStatus;
use crate::AppState;

#[axum::debug_handler]
pub async fn create_assessment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateAssessmentRequest>,
) -> crate::error::Result<Response> {
    payload.validate()?;
    let total_questions = payload.questions.len();
    let assessment_id = state.assessments.create_attempt(
        payload.candidate_id.clone(),
        payload.provider,
        payload.assessment_type,
        payload.skill_category.clone(),
        payload.questions,
    )?;
    state.audit.record(
        Some(claims.sub),
        "assessment.created",
        "assessment",
        assessment_id,
        Some(json!({
            "candidate_id": payload.candidate_id,
            "skill_category": payload.skill_category,
            "total_questions": total_questions,
        })),
    );
    Ok((
        StatusCode::CREATED,
        Json(CreateAssessmentResponse {
            assessment_id,
            status: AssessmentStatus::Created,
            total_questions,
        }),
    )
        .into_response())
}

#[axum::debug_handler]
pub async fn get_assessment_audit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> crate::error::Result<Response> {
    // Also covers violation entries recorded against the attempt.
    let entries = state.audit.for_entity(id);
    Ok(Json(entries).into_response())
}

#[axum::debug_handler]
pub async fn start_verification_run(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<StartVerificationRequest>,
) -> crate::error::Result<Response> {
    payload.validate()?;
    let run = state
        .verification
        .start_run(payload.subject_type, payload.subject_id)?;
    state.audit.record(
        Some(claims.sub),
        "verification.started",
        "verification_run",
        run.run_id,
        Some(json!({ "subject_type": run.subject_type, "subject_id": run.subject_id })),
    );
    Ok((
        StatusCode::ACCEPTED,
        Json(VerificationRunResponse::from(run)),
    )
        .into_response())
}

#[axum::debug_handler]
pub async fn get_verification_run(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> crate::error::Result<Response> {
    let run = state.verification.run(id)?;
    Ok(Json(VerificationRunResponse::from(run)).into_response())
}
