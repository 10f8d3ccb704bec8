use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubjectType {
    Company,
    Agency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Pending,
    Running,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationDecision {
    Approve,
    ManualReview,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationSignal {
    pub key: String,
    pub passed: bool,
    pub score: f64,
    pub explanation: String,
}

/// Company/agency trust check. Much simpler lifecycle than an assessment
/// attempt: PENDING -> RUNNING -> COMPLETED with a decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationRun {
    pub run_id: Uuid,
    pub subject_type: SubjectType,
    pub subject_id: String,
    pub status: RunStatus,
    pub decision: Option<VerificationDecision>,
    pub risk_score: Option<f64>,
    pub reason_codes: Vec<String>,
    pub signals: Vec<VerificationSignal>,
    pub created_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl VerificationRun {
    pub fn new(subject_type: SubjectType, subject_id: String) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            subject_type,
            subject_id,
            status: RunStatus::Pending,
            decision: None,
            risk_score: None,
            reason_codes: Vec::new(),
            signals: Vec::new(),
            created_at: Utc::now(),
            ended_at: None,
        }
    }
}
