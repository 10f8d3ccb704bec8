use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::dto::assessment_dto::{
    CompleteAssessmentResponse, IssuedQuestionResponse, ProgressResponse, ReportViolationRequest,
    ReportViolationResponse, SubmitAnswerRequest, SubmitAnswerResponse,
};
use crate::services::assessment_service::SubmitOutcome;
use crate::AppState;

#[axum::debug_handler]
pub async fn get_current_question(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> crate::error::Result<Response> {
    let issued = state.assessments.current_question(id, Utc::now())?;
    Ok(Json(IssuedQuestionResponse::from(&issued)).into_response())
}

#[axum::debug_handler]
pub async fn submit_answer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SubmitAnswerRequest>,
) -> crate::error::Result<Response> {
    payload.validate()?;
    let outcome =
        state
            .assessments
            .submit_answer(id, &payload.question_id, payload.answer, Utc::now())?;

    let response = match outcome {
        SubmitOutcome::Recorded {
            submission_id,
            next_question,
            completed,
        } => {
            state.audit.record(
                None,
                "assessment.answer_submitted",
                "assessment",
                id,
                Some(serde_json::json!({
                    "question_id": payload.question_id,
                    "submission_id": submission_id,
                    "completed": completed,
                })),
            );
            SubmitAnswerResponse {
                accepted: true,
                already_answered: false,
                submission_id,
                completed,
                next_question: next_question.as_ref().map(IssuedQuestionResponse::from),
                answer: None,
            }
        }
        SubmitOutcome::AlreadyAnswered {
            answer,
            current_question,
            completed,
        } => SubmitAnswerResponse {
            accepted: false,
            already_answered: true,
            submission_id: None,
            completed,
            next_question: current_question.as_ref().map(IssuedQuestionResponse::from),
            answer: Some(answer),
        },
    };
    Ok(Json(response).into_response())
}

#[axum::debug_handler]
pub async fn complete_assessment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> crate::error::Result<Response> {
    let attempt = state.assessments.complete_assessment(id, Utc::now())?;
    state.audit.record(
        None,
        "assessment.completed",
        "assessment",
        id,
        Some(serde_json::json!({ "status": attempt.status })),
    );
    Ok(Json(CompleteAssessmentResponse {
        assessment_id: attempt.assessment_id,
        status: attempt.status,
        completed_at: attempt.completed_at,
    })
    .into_response())
}

#[axum::debug_handler]
pub async fn get_results(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> crate::error::Result<Response> {
    let report = state.results.build_results(id)?;
    Ok(Json(report).into_response())
}

#[axum::debug_handler]
pub async fn get_progress(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> crate::error::Result<Response> {
    let progress = state.assessments.progress(id, Utc::now())?;
    Ok(Json(ProgressResponse {
        assessment_id: progress.assessment_id,
        status: progress.status,
        answered: progress.answered,
        total_questions: progress.total_questions,
        current_question_index: progress.current_question_index,
        violation_count: progress.violation_count,
        average_score: progress.average_score,
        current_deadline: progress.current_deadline,
    })
    .into_response())
}

#[axum::debug_handler]
pub async fn report_violation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReportViolationRequest>,
) -> crate::error::Result<Response> {
    payload.validate()?;
    let receipt = state.security.report_violation(
        id,
        payload.kind,
        payload.details.unwrap_or_default(),
        Utc::now(),
    )?;
    Ok((
        StatusCode::OK,
        Json(ReportViolationResponse {
            violation_count: receipt.violation_count,
            remaining: receipt.remaining,
            terminated: receipt.terminated,
        }),
    )
        .into_response())
}
