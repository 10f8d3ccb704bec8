use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{error, info};
use uuid::Uuid;

use crate::error::Result;
use crate::models::submission::{RunJob, SubmissionEvent, SubmissionStatus};
use crate::services::notifier_service::NotifierService;
use crate::services::plagiarism_service::PlagiarismService;
use crate::services::runner_service::RunnerService;
use crate::store::Store;

/// FIFO submission queue plus the worker that drains it. One job is
/// processed at a time; a failed run marks the submission FAILED and the
/// worker moves on, it never takes the loop down.
#[derive(Clone)]
pub struct QueueService {
    jobs: Arc<Mutex<VecDeque<RunJob>>>,
    store: Store,
    runner: RunnerService,
    plagiarism: PlagiarismService,
    notifier: NotifierService,
}

impl QueueService {
    pub fn new(
        store: Store,
        runner: RunnerService,
        plagiarism: PlagiarismService,
        notifier: NotifierService,
    ) -> Self {
        Self {
            jobs: Arc::new(Mutex::new(VecDeque::new())),
            store,
            runner,
            plagiarism,
            notifier,
        }
    }

    pub fn enqueue(&self, job: RunJob) {
        self.jobs.lock().expect("queue lock poisoned").push_back(job);
    }

    fn dequeue(&self) -> Option<RunJob> {
        self.jobs.lock().expect("queue lock poisoned").pop_front()
    }

    pub fn depth(&self) -> usize {
        self.jobs.lock().expect("queue lock poisoned").len()
    }

    /// Processes at most one queued job. Returns `Ok(true)` when a job was
    /// taken, so the poll loop can spin again immediately instead of
    /// sleeping while the queue is hot.
    pub async fn run_once(&self) -> Result<bool> {
        let Some(job) = self.dequeue() else {
            return Ok(false);
        };

        info!(submission_id = %job.submission_id, "processing submission");

        self.store
            .update_submission(job.submission_id, |s| s.status = SubmissionStatus::Running)?;
        self.notifier.publish(
            &job.submission_id.to_string(),
            SubmissionEvent::Running {
                submission_id: job.submission_id,
            },
        );

        let submission = self.store.submission(job.submission_id)?;
        let tests = self
            .store
            .attempt_snapshot(job.assessment_id)
            .ok()
            .and_then(|a| {
                a.question_by_id(&job.question_id)
                    .map(|(_, q)| q.test_cases().to_vec())
            })
            .unwrap_or_default();

        match self
            .runner
            .execute(job.submission_id, &job.language, &submission.code, &tests)
            .await
        {
            Ok(result) => {
                self.store.update_submission(job.submission_id, |s| {
                    s.status = SubmissionStatus::Completed;
                    s.ended_at = Some(Utc::now());
                    s.result = Some(result.clone());
                })?;
                self.notifier.publish(
                    &job.submission_id.to_string(),
                    SubmissionEvent::Completed {
                        submission_id: job.submission_id,
                        result: result.clone(),
                    },
                );
                self.spawn_plagiarism_check(job.submission_id, submission.code.clone(), result);
            }
            Err(e) => {
                error!(submission_id = %job.submission_id, error = %e, "submission run failed");
                self.store.update_submission(job.submission_id, |s| {
                    s.status = SubmissionStatus::Failed;
                    s.ended_at = Some(Utc::now());
                    s.error = Some(e.to_string());
                })?;
                self.notifier.publish(
                    &job.submission_id.to_string(),
                    SubmissionEvent::Failed {
                        submission_id: job.submission_id,
                        error: e.to_string(),
                    },
                );
            }
        }

        Ok(true)
    }

    /// Plagiarism scoring rides behind result delivery so a slow corpus
    /// never delays the COMPLETED event.
    fn spawn_plagiarism_check(
        &self,
        submission_id: Uuid,
        code: String,
        result: crate::models::submission::RunnerResult,
    ) {
        let store = self.store.clone();
        let notifier = self.notifier.clone();
        let plagiarism = self.plagiarism.clone();
        tokio::spawn(async move {
            let report = plagiarism.score(&code, Some(&result));
            match store.update_submission(submission_id, |s| {
                s.plagiarism = Some(report.clone());
            }) {
                Ok(_) => notifier.publish(
                    &submission_id.to_string(),
                    SubmissionEvent::PlagiarismReady {
                        submission_id,
                        report,
                    },
                ),
                Err(e) => {
                    error!(submission_id = %submission_id, error = %e, "failed to store plagiarism report")
                }
            }
        });
    }
}
