use chrono::{DateTime, Duration, Utc};
use tracing::info;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::answer::{Answer, AnswerValue};
use crate::models::assessment::{AssessmentAttempt, AssessmentStatus, AssessmentType};
use crate::models::question::{Question, QuestionType};
use crate::models::submission::{CodeSubmission, RunJob, SubmissionEvent};
use crate::services::grading_service::GradingService;
use crate::services::notifier_service::NotifierService;
use crate::services::queue_service::QueueService;
use crate::store::Store;

/// What the candidate sees next after an accepted answer.
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    Recorded {
        /// Submission spawned for a coding answer, if any.
        submission_id: Option<Uuid>,
        next_question: Option<IssuedQuestion>,
        completed: bool,
    },
    /// The question was already answered (double-click, retry). The stored
    /// answer is returned unchanged; nothing is overwritten. The question
    /// currently on the clock rides along so the client can resync.
    AlreadyAnswered {
        answer: Answer,
        current_question: Option<IssuedQuestion>,
        completed: bool,
    },
}

/// A question as issued to the candidate, with its server-side deadline.
#[derive(Debug, Clone)]
pub struct IssuedQuestion {
    pub index: usize,
    pub total: usize,
    pub question: Question,
    pub deadline: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct AttemptProgress {
    pub assessment_id: Uuid,
    pub status: AssessmentStatus,
    pub answered: usize,
    pub total_questions: usize,
    pub current_question_index: usize,
    pub violation_count: usize,
    /// Running average over the questions answered so far.
    pub average_score: u32,
    /// Deadline of the question currently on the clock.
    pub current_deadline: Option<DateTime<Utc>>,
}

/// Drives the attempt state machine. Every mutation happens under the
/// attempt's own lock in the store, so concurrent requests against the same
/// assessment serialize; side effects (enqueue, events) run after the lock
/// is released.
#[derive(Clone)]
pub struct AssessmentService {
    store: Store,
    queue: QueueService,
    notifier: NotifierService,
    /// Slack added to each question's time limit before the server expires
    /// it, absorbing network latency on the final submit.
    grace: Duration,
}

impl AssessmentService {
    pub fn new(store: Store, queue: QueueService, notifier: NotifierService, grace_seconds: i64) -> Self {
        Self {
            store,
            queue,
            notifier,
            grace: Duration::seconds(grace_seconds),
        }
    }

    pub fn create_attempt(
        &self,
        candidate_id: String,
        provider: String,
        assessment_type: AssessmentType,
        skill_category: String,
        questions: Vec<Question>,
    ) -> Result<Uuid> {
        if questions.is_empty() {
            return Err(Error::BadRequest(
                "An assessment needs at least one question".to_string(),
            ));
        }
        let attempt = AssessmentAttempt::new(
            candidate_id,
            provider,
            assessment_type,
            skill_category,
            questions,
        );
        let id = self.store.insert_attempt(attempt);
        info!(assessment_id = %id, "assessment created");
        Ok(id)
    }

    /// Returns the question the candidate should be working on. The first
    /// call starts the attempt and the per-question clock.
    pub fn current_question(&self, assessment_id: Uuid, now: DateTime<Utc>) -> Result<IssuedQuestion> {
        let grace = self.grace;
        let issued = self.store.with_attempt(assessment_id, |attempt| {
            expire_overdue(attempt, now, grace);
            match attempt.status {
                AssessmentStatus::Terminated => return Err(Error::AttemptTerminated),
                AssessmentStatus::Completed => return Err(Error::AssessmentCompleted),
                AssessmentStatus::Created => {
                    attempt.status = AssessmentStatus::InProgress;
                    attempt.started_at = Some(now);
                    attempt.question_started_at = Some(now);
                }
                AssessmentStatus::InProgress => {
                    if attempt.question_started_at.is_none() {
                        attempt.question_started_at = Some(now);
                    }
                }
            }
            let question = attempt
                .current_question()
                .cloned()
                .ok_or_else(|| Error::Internal("In-progress attempt with no current question".to_string()))?;
            let started = attempt.question_started_at.unwrap_or(now);
            Ok(IssuedQuestion {
                index: attempt.current_question_index,
                total: attempt.total_questions,
                deadline: started + Duration::seconds(question.time_limit_secs),
                question,
            })
        })??;
        Ok(issued)
    }

    /// Records an answer for `question_id`. Out-of-order submissions against
    /// a newer question are rejected as stale; re-submissions of an already
    /// answered question return the stored answer untouched.
    pub fn submit_answer(
        &self,
        assessment_id: Uuid,
        question_id: &str,
        answer: AnswerValue,
        now: DateTime<Utc>,
    ) -> Result<SubmitOutcome> {
        let grace = self.grace;
        let qid = question_id.to_string();
        let outcome = self.store.with_attempt(assessment_id, move |attempt| {
            expire_overdue(attempt, now, grace);
            match attempt.status {
                AssessmentStatus::Terminated => return Err(Error::AttemptTerminated),
                AssessmentStatus::Created => {
                    attempt.status = AssessmentStatus::InProgress;
                    attempt.started_at = Some(now);
                    attempt.question_started_at = Some(now);
                }
                AssessmentStatus::Completed | AssessmentStatus::InProgress => {}
            }

            let (index, question) = attempt
                .question_by_id(&qid)
                .map(|(i, q)| (i, q.clone()))
                .ok_or_else(|| Error::NotFound(format!("Question {} not found", qid)))?;

            // Retries of an already-answered question stay idempotent even
            // after the attempt finished; the stored answer wins.
            if index < attempt.current_question_index {
                let stored = attempt.answers[index].clone();
                let current = issued_current(attempt);
                return Ok(RawOutcome::AlreadyAnswered {
                    answer: stored,
                    current,
                    completed: attempt.status == AssessmentStatus::Completed,
                });
            }
            if attempt.status == AssessmentStatus::Completed {
                return Err(Error::AssessmentCompleted);
            }
            if index > attempt.current_question_index {
                let expected = attempt
                    .current_question()
                    .map(|q| q.question_id.clone())
                    .unwrap_or_default();
                return Err(Error::StaleSubmission { expected, got: qid });
            }

            let elapsed = attempt
                .question_started_at
                .map(|s| (now - s).num_seconds().max(0))
                .unwrap_or(0);
            let time_taken = elapsed.min(question.time_limit_secs);
            attempt.answers.push(Answer {
                question_id: question.question_id.clone(),
                answer: answer.clone(),
                time_taken_secs: time_taken,
                submitted_at: now,
                elapsed: false,
            });
            attempt.current_question_index += 1;

            let job = if question.question_type == QuestionType::Coding {
                let language = question.language().unwrap_or("python").to_string();
                let code = answer.as_text().unwrap_or("").to_string();
                let submission = CodeSubmission::new(
                    attempt.assessment_id,
                    question.question_id.clone(),
                    language.clone(),
                    code,
                    attempt.candidate_id.clone(),
                );
                let run_job = RunJob {
                    submission_id: submission.submission_id,
                    assessment_id: attempt.assessment_id,
                    question_id: question.question_id.clone(),
                    language,
                };
                Some((submission, run_job))
            } else {
                None
            };

            let completed = attempt.current_question_index >= attempt.total_questions;
            let next = if completed {
                attempt.status = AssessmentStatus::Completed;
                attempt.completed_at = Some(now);
                attempt.question_started_at = None;
                None
            } else {
                attempt.question_started_at = Some(now);
                attempt.current_question().cloned().map(|q| IssuedQuestion {
                    index: attempt.current_question_index,
                    total: attempt.total_questions,
                    deadline: now + Duration::seconds(q.time_limit_secs),
                    question: q,
                })
            };

            Ok(RawOutcome::Recorded {
                job,
                next,
                completed,
            })
        })??;

        match outcome {
            RawOutcome::AlreadyAnswered {
                answer,
                current,
                completed,
            } => Ok(SubmitOutcome::AlreadyAnswered {
                answer,
                current_question: current,
                completed,
            }),
            RawOutcome::Recorded {
                job,
                next,
                completed,
            } => {
                let submission_id = match job {
                    Some((submission, run_job)) => {
                        let id = self.store.insert_submission(submission);
                        self.queue.enqueue(run_job);
                        self.notifier.publish(
                            &id.to_string(),
                            SubmissionEvent::Queued { submission_id: id },
                        );
                        Some(id)
                    }
                    None => None,
                };
                if completed {
                    info!(assessment_id = %assessment_id, "assessment completed");
                }
                Ok(SubmitOutcome::Recorded {
                    submission_id,
                    next_question: next,
                    completed,
                })
            }
        }
    }

    /// Finishes the attempt early. Idempotent: completing a finished attempt
    /// is a no-op. Unanswered questions are backfilled as empty so the
    /// report always covers every question.
    pub fn complete_assessment(&self, assessment_id: Uuid, now: DateTime<Utc>) -> Result<AssessmentAttempt> {
        self.store.with_attempt(assessment_id, |attempt| {
            if !attempt.is_terminal() {
                backfill_unanswered(attempt, now, 0, false);
                attempt.status = AssessmentStatus::Completed;
                attempt.completed_at = Some(now);
                attempt.question_started_at = None;
            }
            attempt.clone()
        })
    }

    pub fn progress(&self, assessment_id: Uuid, now: DateTime<Utc>) -> Result<AttemptProgress> {
        let grace = self.grace;
        // Expire under the same lock as the snapshot so the reported index
        // and deadline never predate a lapsed question.
        let attempt = self.store.with_attempt(assessment_id, |attempt| {
            expire_overdue(attempt, now, grace);
            attempt.clone()
        })?;

        let mut score_sum = 0u32;
        for (idx, answer) in attempt.answers.iter().enumerate() {
            let Some(question) = attempt.questions.get(idx) else {
                break;
            };
            let runner_result = self
                .store
                .latest_submission_for_question(
                    assessment_id,
                    &question.question_id,
                    attempt.completed_at,
                )
                .and_then(|s| s.result);
            score_sum += GradingService::grade(question, answer, runner_result.as_ref()).score;
        }
        let answered = attempt.answers.len();
        let average_score = if answered == 0 {
            0
        } else {
            ((score_sum as f64) / (answered as f64)).round() as u32
        };

        let current_deadline = match (attempt.question_started_at, attempt.current_question()) {
            (Some(started), Some(q)) => Some(started + Duration::seconds(q.time_limit_secs)),
            _ => None,
        };

        Ok(AttemptProgress {
            assessment_id,
            status: attempt.status,
            answered,
            total_questions: attempt.total_questions,
            current_question_index: attempt.current_question_index,
            violation_count: attempt.violations.len(),
            average_score,
            current_deadline,
        })
    }

    /// Expires any question whose deadline (limit plus grace) has passed,
    /// auto-answering it as empty. Also invoked lazily on every read/write
    /// so behavior does not depend on sweeper cadence.
    pub fn expire_overdue_at(&self, assessment_id: Uuid, now: DateTime<Utc>) -> Result<usize> {
        let grace = self.grace;
        self.store
            .with_attempt(assessment_id, |attempt| expire_overdue(attempt, now, grace))
    }

    /// One sweeper pass over every live attempt. Returns how many questions
    /// were expired.
    pub fn sweep_once(&self, now: DateTime<Utc>) -> usize {
        let mut expired = 0;
        for id in self.store.attempt_ids() {
            if let Ok(n) = self.expire_overdue_at(id, now) {
                expired += n;
            }
        }
        expired
    }
}

enum RawOutcome {
    Recorded {
        job: Option<(CodeSubmission, RunJob)>,
        next: Option<IssuedQuestion>,
        completed: bool,
    },
    AlreadyAnswered {
        answer: Answer,
        current: Option<IssuedQuestion>,
        completed: bool,
    },
}

/// The question currently on the clock, with its deadline, or `None` once
/// the attempt is out of questions.
fn issued_current(attempt: &AssessmentAttempt) -> Option<IssuedQuestion> {
    let started = attempt.question_started_at?;
    let question = attempt.current_question().cloned()?;
    Some(IssuedQuestion {
        index: attempt.current_question_index,
        total: attempt.total_questions,
        deadline: started + Duration::seconds(question.time_limit_secs),
        question,
    })
}

/// Advances past every question whose deadline already passed, recording a
/// full-time empty answer marked `elapsed`. Completes the attempt when the
/// last question expires.
fn expire_overdue(attempt: &mut AssessmentAttempt, now: DateTime<Utc>, grace: Duration) -> usize {
    let mut expired = 0;
    while attempt.status == AssessmentStatus::InProgress {
        let Some(started) = attempt.question_started_at else {
            break;
        };
        let Some(question) = attempt.current_question() else {
            break;
        };
        let limit = Duration::seconds(question.time_limit_secs);
        let deadline = started + limit + grace;
        if now < deadline {
            break;
        }
        let time_limit = question.time_limit_secs;
        let question_id = question.question_id.clone();
        attempt.answers.push(Answer {
            question_id,
            answer: AnswerValue::empty(),
            time_taken_secs: time_limit,
            submitted_at: deadline,
            elapsed: true,
        });
        attempt.current_question_index += 1;
        expired += 1;
        if attempt.current_question_index >= attempt.total_questions {
            attempt.status = AssessmentStatus::Completed;
            attempt.completed_at = Some(now);
            attempt.question_started_at = None;
        } else {
            // The next question's clock starts at the previous deadline, not
            // at sweep time, so a late sweep cannot grant extra time.
            attempt.question_started_at = Some(deadline);
        }
    }
    expired
}

fn backfill_unanswered(attempt: &mut AssessmentAttempt, now: DateTime<Utc>, time_taken: i64, elapsed: bool) {
    while attempt.answers.len() < attempt.total_questions {
        let idx = attempt.answers.len();
        let question_id = attempt.questions[idx].question_id.clone();
        attempt.answers.push(Answer {
            question_id,
            answer: AnswerValue::empty(),
            time_taken_secs: time_taken,
            submitted_at: now,
            elapsed,
        });
    }
    attempt.current_question_index = attempt.total_questions;
}
