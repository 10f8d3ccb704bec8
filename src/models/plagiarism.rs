use serde::{Deserialize, Serialize};

/// Similarity verdict for one submission. All scores live in [0, 1];
/// `final_score` is the fixed weighted combination computed by the scorer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlagiarismReport {
    pub static_score: f64,
    pub dynamic_score: f64,
    pub web_score: f64,
    pub final_score: f64,
    pub evidence: Vec<EvidenceItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub source: String,
    pub similarity: f64,
    pub snippet: String,
    pub url: Option<String>,
}
