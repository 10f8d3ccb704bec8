use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::answer::Answer;
use crate::models::question::Question;
use crate::models::violation::SecurityViolation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssessmentStatus {
    Created,
    InProgress,
    Completed,
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssessmentType {
    QuickCheck,
    Comprehensive,
}

/// One candidate's run through a question set. Mutated exclusively through
/// the assessment service, which holds the per-attempt lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentAttempt {
    pub assessment_id: Uuid,
    pub candidate_id: String,
    pub provider: String,
    pub assessment_type: AssessmentType,
    pub skill_category: String,
    pub questions: Vec<Question>,
    pub answers: Vec<Answer>,
    pub total_questions: usize,
    pub current_question_index: usize,
    pub status: AssessmentStatus,
    pub violations: Vec<SecurityViolation>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// When the question at `current_question_index` was issued. Basis for
    /// the server-side deadline; client timers are cosmetic.
    pub question_started_at: Option<DateTime<Utc>>,
}

impl AssessmentAttempt {
    pub fn new(
        candidate_id: String,
        provider: String,
        assessment_type: AssessmentType,
        skill_category: String,
        questions: Vec<Question>,
    ) -> Self {
        let total_questions = questions.len();
        Self {
            assessment_id: Uuid::new_v4(),
            candidate_id,
            provider,
            assessment_type,
            skill_category,
            questions,
            answers: Vec::new(),
            total_questions,
            current_question_index: 0,
            status: AssessmentStatus::Created,
            violations: Vec::new(),
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            question_started_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            AssessmentStatus::Completed | AssessmentStatus::Terminated
        )
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_question_index)
    }

    pub fn question_by_id(&self, question_id: &str) -> Option<(usize, &Question)> {
        self.questions
            .iter()
            .enumerate()
            .find(|(_, q)| q.question_id == question_id)
    }
}
