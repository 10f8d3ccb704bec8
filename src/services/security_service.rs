use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::assessment::AssessmentStatus;
use crate::models::audit_log::AuditEntry;
use crate::models::violation::{SecurityViolation, ViolationKind};
use crate::store::Store;

#[derive(Debug, Clone)]
pub struct ViolationReceipt {
    pub violation_count: usize,
    pub remaining: usize,
    pub terminated: bool,
}

/// Applies the proctoring policy: every violation is recorded, and the
/// attempt is terminated once the count exceeds the configured maximum.
#[derive(Clone)]
pub struct SecurityService {
    store: Store,
    max_violations: usize,
}

impl SecurityService {
    pub fn new(store: Store, max_violations: usize) -> Self {
        Self {
            store,
            max_violations,
        }
    }

    pub fn report_violation(
        &self,
        assessment_id: Uuid,
        kind: ViolationKind,
        details: String,
        now: DateTime<Utc>,
    ) -> Result<ViolationReceipt> {
        let max = self.max_violations;
        let receipt = self.store.with_attempt(assessment_id, |attempt| {
            if attempt.is_terminal() {
                return Err(Error::AttemptTerminated);
            }
            attempt.violations.push(SecurityViolation {
                kind,
                details: details.clone(),
                timestamp: now,
            });
            let count = attempt.violations.len();
            let terminated = count > max;
            if terminated {
                attempt.status = AssessmentStatus::Terminated;
                attempt.completed_at = Some(now);
                attempt.question_started_at = None;
            }
            Ok(ViolationReceipt {
                violation_count: count,
                remaining: max.saturating_sub(count),
                terminated,
            })
        })??;

        self.store.append_audit(AuditEntry {
            id: Uuid::new_v4(),
            actor: None,
            action: "security.violation".to_string(),
            entity_type: "assessment".to_string(),
            entity_id: assessment_id,
            details: Some(json!({
                "kind": kind,
                "details": details,
                "violation_count": receipt.violation_count,
                "terminated": receipt.terminated,
            })),
            created_at: now,
        });

        if receipt.terminated {
            warn!(
                assessment_id = %assessment_id,
                violations = receipt.violation_count,
                "assessment terminated for repeated violations"
            );
        }

        Ok(receipt)
    }
}
