use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub question_id: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub question_text: String,
    #[serde(default = "default_time_limit")]
    pub time_limit_secs: i64,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub category: String,
    #[serde(flatten)]
    pub details: QuestionDetails,
}

fn default_time_limit() -> i64 {
    90
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    Coding,
    Scenario,
    TrueFalse,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Difficulty {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
    Expert,
}

/// Per-type payload, flattened into the question JSON. Variants are tried in
/// declaration order, so the most field-rich shapes come first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuestionDetails {
    MultipleChoice(MultipleChoiceDetails),
    Coding(CodingDetails),
    Scenario(ScenarioDetails),
    TrueFalse(TrueFalseDetails),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultipleChoiceDetails {
    pub options: Vec<String>,
    pub correct_answer: String,
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodingDetails {
    pub language: String,
    pub starter_code: Option<String>,
    pub test_cases: Vec<TestCase>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioDetails {
    pub expected_keywords: Vec<String>,
    pub min_words: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrueFalseDetails {
    pub correct_answer: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub input: String,
    pub expected: String,
}

impl Question {
    /// Test cases declared on a coding question; empty for other types.
    pub fn test_cases(&self) -> &[TestCase] {
        match &self.details {
            QuestionDetails::Coding(c) => &c.test_cases,
            _ => &[],
        }
    }

    pub fn language(&self) -> Option<&str> {
        match &self.details {
            QuestionDetails::Coding(c) => Some(c.language.as_str()),
            _ => None,
        }
    }
}
