use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::plagiarism::PlagiarismReport;
use crate::models::submission::{CodeSubmission, RunnerResult, SubmissionStatus};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSubmissionRequest {
    pub assessment_id: Uuid,
    #[validate(length(min = 1))]
    pub question_id: String,
    #[validate(length(min = 1))]
    pub language: String,
    #[validate(length(min = 1, max = 65536))]
    pub code: String,
    #[validate(length(min = 1))]
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateSubmissionResponse {
    pub submission_id: Uuid,
    pub status: SubmissionStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionDetailResponse {
    pub submission_id: Uuid,
    pub assessment_id: Uuid,
    pub question_id: String,
    pub language: String,
    pub status: SubmissionStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<RunnerResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plagiarism: Option<PlagiarismReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<CodeSubmission> for SubmissionDetailResponse {
    fn from(s: CodeSubmission) -> Self {
        Self {
            submission_id: s.submission_id,
            assessment_id: s.assessment_id,
            question_id: s.question_id,
            language: s.language,
            status: s.status,
            created_at: s.created_at,
            ended_at: s.ended_at,
            result: s.result,
            plagiarism: s.plagiarism,
            error: s.error,
        }
    }
}
