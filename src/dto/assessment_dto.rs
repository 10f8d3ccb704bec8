use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::answer::{Answer, AnswerValue};
use crate::models::assessment::{AssessmentStatus, AssessmentType};
use crate::models::question::{Difficulty, Question, QuestionDetails, QuestionType};
use crate::models::violation::ViolationKind;
use crate::services::assessment_service::IssuedQuestion;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAssessmentRequest {
    #[validate(length(min = 1))]
    pub candidate_id: String,
    #[validate(length(min = 1))]
    pub provider: String,
    pub assessment_type: AssessmentType,
    #[validate(length(min = 1))]
    pub skill_category: String,
    #[validate(length(min = 1))]
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateAssessmentResponse {
    pub assessment_id: Uuid,
    pub status: AssessmentStatus,
    pub total_questions: usize,
}

/// Candidate-facing projection of a question. Grading material (correct
/// answers, expected keywords, test expectations) never crosses this
/// boundary.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub question_id: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub question_text: String,
    pub time_limit_secs: i64,
    pub difficulty: Difficulty,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starter_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_words: Option<i32>,
}

impl From<&Question> for QuestionView {
    fn from(q: &Question) -> Self {
        let (options, language, starter_code, min_words) = match &q.details {
            QuestionDetails::MultipleChoice(mc) => (Some(mc.options.clone()), None, None, None),
            QuestionDetails::Coding(c) => (
                None,
                Some(c.language.clone()),
                c.starter_code.clone(),
                None,
            ),
            QuestionDetails::Scenario(sc) => (None, None, None, sc.min_words),
            QuestionDetails::TrueFalse(_) => (None, None, None, None),
        };
        Self {
            question_id: q.question_id.clone(),
            question_type: q.question_type,
            question_text: q.question_text.clone(),
            time_limit_secs: q.time_limit_secs,
            difficulty: q.difficulty,
            category: q.category.clone(),
            options,
            language,
            starter_code,
            min_words,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IssuedQuestionResponse {
    pub question_index: usize,
    pub total_questions: usize,
    pub question: QuestionView,
    pub deadline: DateTime<Utc>,
}

impl From<&IssuedQuestion> for IssuedQuestionResponse {
    fn from(issued: &IssuedQuestion) -> Self {
        Self {
            question_index: issued.index,
            total_questions: issued.total,
            question: QuestionView::from(&issued.question),
            deadline: issued.deadline,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitAnswerRequest {
    #[validate(length(min = 1))]
    pub question_id: String,
    pub answer: AnswerValue,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitAnswerResponse {
    pub accepted: bool,
    /// True when this question already had an answer; the stored one wins.
    pub already_answered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_id: Option<Uuid>,
    pub completed: bool,
    /// On a retry this is the question currently on the clock, so a client
    /// that double-submitted can resync without an extra round trip.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_question: Option<IssuedQuestionResponse>,
    /// The stored answer, echoed back on a retry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<Answer>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompleteAssessmentResponse {
    pub assessment_id: Uuid,
    pub status: AssessmentStatus,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressResponse {
    pub assessment_id: Uuid,
    pub status: AssessmentStatus,
    pub answered: usize,
    pub total_questions: usize,
    pub current_question_index: usize,
    pub violation_count: usize,
    pub average_score: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReportViolationRequest {
    pub kind: ViolationKind,
    #[validate(length(max = 512))]
    pub details: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportViolationResponse {
    pub violation_count: usize,
    pub remaining: usize,
    pub terminated: bool,
}
