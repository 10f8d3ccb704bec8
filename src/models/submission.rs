use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::plagiarism::PlagiarismReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeSubmission {
    pub submission_id: Uuid,
    pub assessment_id: Uuid,
    pub question_id: String,
    pub language: String,
    pub code: String,
    pub user_id: String,
    pub status: SubmissionStatus,
    pub created_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub result: Option<RunnerResult>,
    pub plagiarism: Option<PlagiarismReport>,
    pub error: Option<String>,
}

impl CodeSubmission {
    pub fn new(
        assessment_id: Uuid,
        question_id: String,
        language: String,
        code: String,
        user_id: String,
    ) -> Self {
        Self {
            submission_id: Uuid::new_v4(),
            assessment_id,
            question_id,
            language,
            code,
            user_id,
            status: SubmissionStatus::Queued,
            created_at: Utc::now(),
            ended_at: None,
            result: None,
            plagiarism: None,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCaseResult {
    pub test_case_id: Option<String>,
    pub passed: bool,
    pub output: String,
    pub expected: Option<String>,
    pub duration_ms: Option<u64>,
    pub stderr: Option<String>,
}

/// Produced exactly once per submission; immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerResult {
    pub submission_id: Uuid,
    pub results: Vec<TestCaseResult>,
    pub total_passed: usize,
    pub total_tests: usize,
    pub runtime_ms: Option<u64>,
    pub memory_kb: Option<u64>,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub exit_code: Option<i32>,
}

impl RunnerResult {
    pub fn pass_ratio(&self) -> f64 {
        if self.total_tests == 0 {
            0.0
        } else {
            self.total_passed as f64 / self.total_tests as f64
        }
    }
}

/// Unit of work handed to the runner worker. A closed struct rather than a
/// loose JSON payload so unhandled fields fail at compile time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunJob {
    pub submission_id: Uuid,
    pub assessment_id: Uuid,
    pub question_id: String,
    pub language: String,
}

/// Events fanned out to stream subscribers, tagged by status.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionEvent {
    Queued {
        submission_id: Uuid,
    },
    Running {
        submission_id: Uuid,
    },
    Completed {
        submission_id: Uuid,
        result: RunnerResult,
    },
    Failed {
        submission_id: Uuid,
        error: String,
    },
    PlagiarismReady {
        submission_id: Uuid,
        report: PlagiarismReport,
    },
}
