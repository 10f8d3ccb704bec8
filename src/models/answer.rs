use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recorded answer. Written exactly once per question; retries of the
/// same question get the stored copy back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: String,
    pub answer: AnswerValue,
    pub time_taken_secs: i64,
    pub submitted_at: DateTime<Utc>,
    /// True when the server recorded this answer because the question
    /// deadline passed without a client submission.
    #[serde(default)]
    pub elapsed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Text(String),
    Multi(Vec<String>),
}

impl AnswerValue {
    pub fn empty() -> Self {
        AnswerValue::Text(String::new())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AnswerValue::Text(s) => Some(s.as_str()),
            AnswerValue::Multi(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            AnswerValue::Text(s) => s.trim().is_empty(),
            AnswerValue::Multi(v) => v.is_empty(),
        }
    }
}
