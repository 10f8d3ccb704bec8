use std::collections::HashSet;

use sha2::{Digest, Sha256};

use crate::models::plagiarism::{EvidenceItem, PlagiarismReport};
use crate::models::submission::RunnerResult;

/// Fixed combination weights: static structure, dynamic behavior, web
/// sources. They must sum to 1.0.
pub const STATIC_WEIGHT: f64 = 0.5;
pub const DYNAMIC_WEIGHT: f64 = 0.2;
pub const WEB_WEIGHT: f64 = 0.3;

/// Corpus entries only make it into the evidence list above this floor.
const EVIDENCE_FLOOR: f64 = 0.3;

const SHINGLE_LINES: usize = 3;

/// One reference sample the scorer compares against: a known solution, or a
/// snippet harvested from a public web source (then `url` is set).
#[derive(Debug, Clone)]
pub struct CorpusEntry {
    pub source: String,
    pub code: String,
    pub expected_outputs: Option<Vec<String>>,
    pub url: Option<String>,
}

#[derive(Clone, Default)]
pub struct PlagiarismService {
    corpus: Vec<CorpusEntry>,
}

impl PlagiarismService {
    pub fn new(corpus: Vec<CorpusEntry>) -> Self {
        Self { corpus }
    }

    /// Scores one submission against the corpus. Pure and synchronous; the
    /// queue worker spawns it off the result-delivery path.
    pub fn score(&self, code: &str, runner_result: Option<&RunnerResult>) -> PlagiarismReport {
        let code_prints = shingle_fingerprints(code);
        let outputs: Vec<String> = runner_result
            .map(|r| r.results.iter().map(|t| t.output.trim().to_string()).collect())
            .unwrap_or_default();

        let mut static_score: f64 = 0.0;
        let mut dynamic_score: f64 = 0.0;
        let mut web_score: f64 = 0.0;
        let mut evidence = Vec::new();

        for entry in &self.corpus {
            let structural = jaccard(&code_prints, &shingle_fingerprints(&entry.code));
            let behavioral = entry
                .expected_outputs
                .as_ref()
                .map(|expected| output_similarity(&outputs, expected))
                .unwrap_or(0.0);

            if entry.url.is_some() {
                web_score = web_score.max(structural);
            } else {
                static_score = static_score.max(structural);
            }
            dynamic_score = dynamic_score.max(behavioral);

            let similarity = structural.max(behavioral);
            if similarity >= EVIDENCE_FLOOR {
                evidence.push(EvidenceItem {
                    source: entry.source.clone(),
                    similarity,
                    snippet: snippet_of(&entry.code),
                    url: entry.url.clone(),
                });
            }
        }

        evidence.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let final_score = (STATIC_WEIGHT * static_score
            + DYNAMIC_WEIGHT * dynamic_score
            + WEB_WEIGHT * web_score)
            .clamp(0.0, 1.0);

        PlagiarismReport {
            static_score,
            dynamic_score,
            web_score,
            final_score,
            evidence,
        }
    }
}

/// Normalizes away whitespace and casing, then fingerprints every
/// three-line window. Line-window matching mirrors how pairwise similarity
/// reports count matched line ranges.
fn shingle_fingerprints(code: &str) -> HashSet<String> {
    let lines: Vec<String> = code
        .lines()
        .map(|l| l.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase())
        .filter(|l| !l.is_empty())
        .collect();

    if lines.is_empty() {
        return HashSet::new();
    }

    let mut prints = HashSet::new();
    if lines.len() < SHINGLE_LINES {
        prints.insert(digest(&lines.join("\n")));
        return prints;
    }
    for window in lines.windows(SHINGLE_LINES) {
        prints.insert(digest(&window.join("\n")));
    }
    prints
}

fn digest(s: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    hex::encode(hasher.finalize())
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count() as f64;
    let union = a.union(b).count() as f64;
    intersection / union
}

fn output_similarity(actual: &[String], expected: &[String]) -> f64 {
    if actual.is_empty() || expected.is_empty() {
        return 0.0;
    }
    let matches = actual
        .iter()
        .zip(expected.iter())
        .filter(|(a, e)| a.trim() == e.trim())
        .count() as f64;
    matches / expected.len().max(actual.len()) as f64
}

fn snippet_of(code: &str) -> String {
    code.lines().take(SHINGLE_LINES).collect::<Vec<_>>().join("\n")
}
