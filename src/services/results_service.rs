use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::assessment::AssessmentStatus;
use crate::services::grading_service::{GradedAnswer, GradingService};
use crate::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentReport {
    pub assessment_id: Uuid,
    pub skill_category: String,
    pub status: AssessmentStatus,
    pub overall_score: u32,
    pub skill_level: SkillLevel,
    pub correct_answers: usize,
    pub incorrect_answers: usize,
    pub partial_answers: usize,
    pub total_questions: usize,
    /// Percentage of fully correct answers.
    pub accuracy_rate: u32,
    pub total_time_secs: i64,
    pub avg_time_per_question_secs: i64,
    pub graded_answers: Vec<GradedAnswer>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendations: Vec<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Builds the final report from stored answers and runner results. Pure
/// read path: calling it twice on an unchanged attempt produces identical
/// output, so it can be re-run after late runner results arrive.
#[derive(Clone)]
pub struct ResultsService {
    store: Store,
}

impl ResultsService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn build_results(&self, assessment_id: Uuid) -> Result<AssessmentReport> {
        let attempt = self.store.attempt_snapshot(assessment_id)?;

        if !attempt.is_terminal() {
            return Err(Error::BadRequest(format!(
                "Assessment {} is still in progress",
                assessment_id
            )));
        }

        let mut graded = Vec::with_capacity(attempt.answers.len());
        for (idx, answer) in attempt.answers.iter().enumerate() {
            let Some(question) = attempt.questions.get(idx) else {
                break;
            };
            // Submissions created after the attempt finished are ignored so
            // the report cannot be moved after the fact.
            let runner_result = self
                .store
                .latest_submission_for_question(
                    assessment_id,
                    &question.question_id,
                    attempt.completed_at,
                )
                .and_then(|s| s.result);
            graded.push(GradingService::grade(question, answer, runner_result.as_ref()));
        }

        let total_questions = attempt.total_questions;
        let correct = graded.iter().filter(|g| g.is_correct).count();
        let partial = graded.iter().filter(|g| g.partial && !g.is_correct).count();
        let incorrect = graded.len() - correct - partial;

        // Documented fixed formula: unweighted average of per-question
        // scores, rounded; unanswered questions count as zero.
        let score_sum: u32 = graded.iter().map(|g| g.score).sum();
        let overall_score = if total_questions == 0 {
            0
        } else {
            ((score_sum as f64) / (total_questions as f64)).round() as u32
        };
        let skill_level = skill_level_for(overall_score);

        let accuracy_rate = if total_questions == 0 {
            0
        } else {
            ((correct as f64 / total_questions as f64) * 100.0).round() as u32
        };

        let total_time_secs: i64 = attempt.answers.iter().map(|a| a.time_taken_secs).sum();
        let avg_time_per_question_secs = if total_questions == 0 {
            0
        } else {
            total_time_secs / total_questions as i64
        };

        let (strengths, weaknesses) = category_analysis(&graded, &attempt.skill_category);
        let recommendations = recommendations_for(overall_score, &attempt.skill_category);

        Ok(AssessmentReport {
            assessment_id,
            skill_category: attempt.skill_category,
            status: attempt.status,
            overall_score,
            skill_level,
            correct_answers: correct,
            incorrect_answers: incorrect,
            partial_answers: partial,
            total_questions,
            accuracy_rate,
            total_time_secs,
            avg_time_per_question_secs,
            graded_answers: graded,
            strengths,
            weaknesses,
            recommendations,
            completed_at: attempt.completed_at,
        })
    }
}

fn skill_level_for(score: u32) -> SkillLevel {
    if score >= 90 {
        SkillLevel::Expert
    } else if score >= 75 {
        SkillLevel::Advanced
    } else if score >= 60 {
        SkillLevel::Intermediate
    } else {
        SkillLevel::Beginner
    }
}

/// Clusters per-category accuracy. BTreeMap keeps the category order
/// stable so the report is byte-identical across runs.
fn category_analysis(graded: &[GradedAnswer], skill_category: &str) -> (Vec<String>, Vec<String>) {
    let mut per_category: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for g in graded {
        let entry = per_category.entry(g.category.as_str()).or_insert((0, 0));
        entry.1 += 1;
        if g.is_correct {
            entry.0 += 1;
        }
    }

    let mut strengths = Vec::new();
    let mut weaknesses = Vec::new();
    for (category, (correct, total)) in &per_category {
        let ratio = *correct as f64 / *total as f64;
        if ratio >= 0.7 {
            strengths.push(format!("Strong performance in {}", category));
        } else if ratio < 0.5 {
            weaknesses.push(format!("Review {} fundamentals", category));
        }
    }

    if strengths.is_empty() {
        strengths.push(format!("Completed the {} assessment", skill_category));
    }
    if weaknesses.is_empty() {
        weaknesses.push("Minor improvements possible in advanced areas".to_string());
    }

    (strengths, weaknesses)
}

fn recommendations_for(score: u32, skill_category: &str) -> Vec<String> {
    if score < 70 {
        vec![
            format!("Take a structured {} course", skill_category),
            format!("Practice with real-world {} projects", skill_category),
            "Review fundamentals and core concepts regularly".to_string(),
        ]
    } else if score < 85 {
        vec![
            format!("Apply {} skills in practical projects", skill_category),
            format!("Study advanced {} patterns", skill_category),
            format!("Join {} developer communities", skill_category),
        ]
    } else {
        vec![
            format!("Share your {} knowledge through mentoring", skill_category),
            format!("Explore specialized {} topics", skill_category),
            format!("Contribute to open-source {} projects", skill_category),
        ]
    }
}
