use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::verification::{
    RunStatus, SubjectType, VerificationDecision, VerificationRun, VerificationSignal,
};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StartVerificationRequest {
    pub subject_type: SubjectType,
    #[validate(length(min = 1))]
    pub subject_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerificationRunResponse {
    pub run_id: Uuid,
    pub subject_type: SubjectType,
    pub subject_id: String,
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<VerificationDecision>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<f64>,
    pub reason_codes: Vec<String>,
    pub signals: Vec<VerificationSignal>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

impl From<VerificationRun> for VerificationRunResponse {
    fn from(run: VerificationRun) -> Self {
        Self {
            run_id: run.run_id,
            subject_type: run.subject_type,
            subject_id: run.subject_id,
            status: run.status,
            decision: run.decision,
            risk_score: run.risk_score,
            reason_codes: run.reason_codes,
            signals: run.signals,
            created_at: run.created_at,
            ended_at: run.ended_at,
        }
    }
}
