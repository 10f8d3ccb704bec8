use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::assessment::AssessmentAttempt;
use crate::models::audit_log::AuditEntry;
use crate::models::submission::CodeSubmission;
use crate::models::verification::VerificationRun;

/// In-memory repository. Each attempt sits behind its own mutex so all
/// state-machine writes for one assessment are serialized; the maps only
/// guard membership. The API is create/read/update-by-id so a durable
/// backend can replace this for multi-process deployments.
#[derive(Clone, Default)]
pub struct Store {
    attempts: Arc<RwLock<HashMap<Uuid, Arc<Mutex<AssessmentAttempt>>>>>,
    submissions: Arc<RwLock<HashMap<Uuid, CodeSubmission>>>,
    verification_runs: Arc<RwLock<HashMap<Uuid, VerificationRun>>>,
    audit: Arc<Mutex<Vec<AuditEntry>>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_attempt(&self, attempt: AssessmentAttempt) -> Uuid {
        let id = attempt.assessment_id;
        self.attempts
            .write()
            .expect("attempts lock poisoned")
            .insert(id, Arc::new(Mutex::new(attempt)));
        id
    }

    /// Runs `f` under the attempt's own lock. This is the serialization
    /// point for concurrent submissions against the same assessment.
    pub fn with_attempt<R>(
        &self,
        assessment_id: Uuid,
        f: impl FnOnce(&mut AssessmentAttempt) -> R,
    ) -> Result<R> {
        let slot = {
            let map = self.attempts.read().expect("attempts lock poisoned");
            map.get(&assessment_id).cloned()
        };
        let slot = slot.ok_or_else(|| {
            Error::NotFound(format!("Assessment {} not found", assessment_id))
        })?;
        let mut attempt = slot.lock().expect("attempt lock poisoned");
        Ok(f(&mut attempt))
    }

    pub fn attempt_snapshot(&self, assessment_id: Uuid) -> Result<AssessmentAttempt> {
        self.with_attempt(assessment_id, |a| a.clone())
    }

    pub fn attempt_ids(&self) -> Vec<Uuid> {
        self.attempts
            .read()
            .expect("attempts lock poisoned")
            .keys()
            .copied()
            .collect()
    }

    pub fn insert_submission(&self, submission: CodeSubmission) -> Uuid {
        let id = submission.submission_id;
        self.submissions
            .write()
            .expect("submissions lock poisoned")
            .insert(id, submission);
        id
    }

    pub fn submission(&self, submission_id: Uuid) -> Result<CodeSubmission> {
        self.submissions
            .read()
            .expect("submissions lock poisoned")
            .get(&submission_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Submission {} not found", submission_id)))
    }

    pub fn update_submission(
        &self,
        submission_id: Uuid,
        f: impl FnOnce(&mut CodeSubmission),
    ) -> Result<CodeSubmission> {
        let mut map = self.submissions.write().expect("submissions lock poisoned");
        let sub = map.get_mut(&submission_id).ok_or_else(|| {
            Error::NotFound(format!("Submission {} not found", submission_id))
        })?;
        f(sub);
        Ok(sub.clone())
    }

    /// Latest submission for a question within an attempt, by creation time.
    /// The results aggregator uses this to grade coding answers. `before`
    /// caps the creation time so submissions that arrive after an attempt
    /// finished can never change its report.
    pub fn latest_submission_for_question(
        &self,
        assessment_id: Uuid,
        question_id: &str,
        before: Option<chrono::DateTime<chrono::Utc>>,
    ) -> Option<CodeSubmission> {
        let map = self.submissions.read().expect("submissions lock poisoned");
        map.values()
            .filter(|s| s.assessment_id == assessment_id && s.question_id == question_id)
            .filter(|s| before.map_or(true, |cutoff| s.created_at <= cutoff))
            .max_by_key(|s| s.created_at)
            .cloned()
    }

    pub fn insert_verification_run(&self, run: VerificationRun) -> Uuid {
        let id = run.run_id;
        self.verification_runs
            .write()
            .expect("verification lock poisoned")
            .insert(id, run);
        id
    }

    pub fn verification_run(&self, run_id: Uuid) -> Result<VerificationRun> {
        self.verification_runs
            .read()
            .expect("verification lock poisoned")
            .get(&run_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Verification run {} not found", run_id)))
    }

    pub fn update_verification_run(
        &self,
        run_id: Uuid,
        f: impl FnOnce(&mut VerificationRun),
    ) -> Result<VerificationRun> {
        let mut map = self
            .verification_runs
            .write()
            .expect("verification lock poisoned");
        let run = map.get_mut(&run_id).ok_or_else(|| {
            Error::NotFound(format!("Verification run {} not found", run_id))
        })?;
        f(run);
        Ok(run.clone())
    }

    pub fn append_audit(&self, entry: AuditEntry) {
        self.audit.lock().expect("audit lock poisoned").push(entry);
    }

    pub fn audit_for_entity(&self, entity_id: Uuid) -> Vec<AuditEntry> {
        self.audit
            .lock()
            .expect("audit lock poisoned")
            .iter()
            .filter(|e| e.entity_id == entity_id)
            .cloned()
            .collect()
    }
}
