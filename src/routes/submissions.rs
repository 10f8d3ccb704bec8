use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    response::{IntoResponse, Json, Response},
};
use futures::stream::{self, Stream, StreamExt};
use tokio::sync::broadcast;
use uuid::Uuid;
use validator::Validate;

use crate::dto::submission_dto::{
    CreateSubmissionRequest, CreateSubmissionResponse, SubmissionDetailResponse,
};
use crate::error::Error;
use crate::models::assessment::AssessmentStatus;
use crate::models::question::QuestionType;
use crate::models::submission::{CodeSubmission, RunJob, SubmissionEvent, SubmissionStatus};
use crate::AppState;

#[axum::debug_handler]
pub async fn create_submission(
    State(state): State<AppState>,
    Json(payload): Json<CreateSubmissionRequest>,
) -> crate::error::Result<Response> {
    payload.validate()?;

    let attempt = state.store.attempt_snapshot(payload.assessment_id)?;
    // A finished attempt takes no more code; its report is already fixed.
    match attempt.status {
        AssessmentStatus::Terminated => return Err(Error::AttemptTerminated),
        AssessmentStatus::Completed => return Err(Error::AssessmentCompleted),
        _ => {}
    }
    let (_, question) = attempt.question_by_id(&payload.question_id).ok_or_else(|| {
        Error::NotFound(format!("Question {} not found", payload.question_id))
    })?;
    if question.question_type != QuestionType::Coding {
        return Err(Error::BadRequest(format!(
            "Question {} does not accept code submissions",
            payload.question_id
        )));
    }

    let submission = CodeSubmission::new(
        payload.assessment_id,
        payload.question_id.clone(),
        payload.language.clone(),
        payload.code,
        payload.user_id,
    );
    let submission_id = state.store.insert_submission(submission);
    state.queue.enqueue(RunJob {
        submission_id,
        assessment_id: payload.assessment_id,
        question_id: payload.question_id,
        language: payload.language,
    });
    state
        .notifier
        .publish(&submission_id.to_string(), SubmissionEvent::Queued { submission_id });

    Ok((
        StatusCode::ACCEPTED,
        Json(CreateSubmissionResponse {
            submission_id,
            status: SubmissionStatus::Queued,
        }),
    )
        .into_response())
}

#[axum::debug_handler]
pub async fn get_submission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> crate::error::Result<Response> {
    let submission = state.store.submission(id)?;
    Ok(Json(SubmissionDetailResponse::from(submission)).into_response())
}

/// Server-sent events for one submission. The connection replays the
/// submission's current state first, then forwards live events, so a client
/// that connects after completion still sees the terminal status.
#[axum::debug_handler]
pub async fn stream_submission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> crate::error::Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    let submission = state.store.submission(id)?;
    // Subscribe before snapshotting so no event published in between is lost.
    let rx = state.notifier.subscribe(&id.to_string());

    let seed: Vec<std::result::Result<Event, Infallible>> = snapshot_events(&submission)
        .iter()
        .filter_map(|e| Event::default().json_data(e).ok())
        .map(Ok)
        .collect();

    let live = stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => match Event::default().json_data(&event) {
                    Ok(ev) => return Some((Ok(ev), rx)),
                    Err(_) => continue,
                },
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    });

    let stream = stream::iter(seed).chain(live);
    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    ))
}

/// Events that reconstruct the submission's state for a fresh subscriber.
fn snapshot_events(submission: &CodeSubmission) -> Vec<SubmissionEvent> {
    let id = submission.submission_id;
    let mut events = Vec::new();
    match submission.status {
        SubmissionStatus::Queued => events.push(SubmissionEvent::Queued { submission_id: id }),
        SubmissionStatus::Running => events.push(SubmissionEvent::Running { submission_id: id }),
        SubmissionStatus::Completed => {
            if let Some(result) = submission.result.clone() {
                events.push(SubmissionEvent::Completed {
                    submission_id: id,
                    result,
                });
            }
        }
        SubmissionStatus::Failed => events.push(SubmissionEvent::Failed {
            submission_id: id,
            error: submission
                .error
                .clone()
                .unwrap_or_else(|| "execution failed".to_string()),
        }),
    }
    if let Some(report) = submission.plagiarism.clone() {
        events.push(SubmissionEvent::PlagiarismReady {
            submission_id: id,
            report,
        });
    }
    events
}
