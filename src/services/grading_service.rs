use serde::{Deserialize, Serialize};

use crate::models::answer::{Answer, AnswerValue};
use crate::models::question::{Difficulty, Question, QuestionDetails};
use crate::models::submission::RunnerResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradedAnswer {
    pub question_id: String,
    pub category: String,
    pub difficulty: Difficulty,
    /// 0..=100.
    pub score: u32,
    pub is_correct: bool,
    pub partial: bool,
    /// Coding answers graded before their runner result exists score zero
    /// and carry this flag so a re-run after execution can lift them.
    pub pending_execution: bool,
}

pub struct GradingService;

impl GradingService {
    /// Grades one question/answer pair. Deterministic: same inputs, same
    /// graded record. `runner_result` is only consulted for coding questions.
    pub fn grade(
        question: &Question,
        answer: &Answer,
        runner_result: Option<&RunnerResult>,
    ) -> GradedAnswer {
        let (score, is_correct, partial, pending) = match &question.details {
            QuestionDetails::MultipleChoice(mc) => {
                let given = answer.answer.as_text().unwrap_or("");
                let correct = eq_ignore_case(given, &mc.correct_answer);
                (if correct { 100 } else { 0 }, correct, false, false)
            }
            QuestionDetails::TrueFalse(tf) => {
                let given = answer.answer.as_text().unwrap_or("");
                let correct = given
                    .trim()
                    .parse::<bool>()
                    .map(|b| b == tf.correct_answer)
                    .unwrap_or(false);
                (if correct { 100 } else { 0 }, correct, false, false)
            }
            QuestionDetails::Scenario(sc) => {
                let text = match &answer.answer {
                    AnswerValue::Text(s) => s.to_lowercase(),
                    AnswerValue::Multi(v) => v.join(" ").to_lowercase(),
                };
                let total = sc.expected_keywords.len().max(1);
                let hit = sc
                    .expected_keywords
                    .iter()
                    .filter(|k| text.contains(&k.to_lowercase()))
                    .count();
                let score = (hit * 100 / total) as u32;
                (score, score >= 60, score > 0 && score < 100, false)
            }
            QuestionDetails::Coding(_) => match runner_result {
                Some(r) => {
                    let score = (r.pass_ratio() * 100.0).round() as u32;
                    let correct = r.total_tests > 0 && r.total_passed == r.total_tests;
                    (score, correct, score > 0 && !correct, false)
                }
                None => (0, false, false, true),
            },
        };

        GradedAnswer {
            question_id: question.question_id.clone(),
            category: if question.category.is_empty() {
                "general".to_string()
            } else {
                question.category.clone()
            },
            difficulty: question.difficulty,
            score,
            is_correct,
            partial,
            pending_execution: pending,
        }
    }
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}
