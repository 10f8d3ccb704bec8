mod common;

use chrono::Utc;
use uuid::Uuid;

use skillbridge_backend::models::answer::{Answer, AnswerValue};
use skillbridge_backend::models::submission::{RunnerResult, TestCaseResult};
use skillbridge_backend::services::grading_service::GradingService;
use skillbridge_backend::services::plagiarism_service::{
    CorpusEntry, PlagiarismService, DYNAMIC_WEIGHT, STATIC_WEIGHT, WEB_WEIGHT,
};

fn answer(question_id: &str, text: &str) -> Answer {
    Answer {
        question_id: question_id.to_string(),
        answer: AnswerValue::Text(text.to_string()),
        time_taken_secs: 10,
        submitted_at: Utc::now(),
        elapsed: false,
    }
}

#[test]
fn multiple_choice_matches_case_insensitively() {
    let q = common::multiple_choice("q1", "const");

    let graded = GradingService::grade(&q, &answer("q1", "  CONST "), None);
    assert!(graded.is_correct);
    assert_eq!(graded.score, 100);

    let graded = GradingService::grade(&q, &answer("q1", "let"), None);
    assert!(!graded.is_correct);
    assert_eq!(graded.score, 0);
}

#[test]
fn scenario_scores_by_keyword_coverage() {
    let q = common::scenario("q1", &["profiler", "heap", "snapshot"]);

    let graded = GradingService::grade(
        &q,
        &answer("q1", "I would attach a profiler and inspect the heap."),
        None,
    );
    // Two of three keywords.
    assert_eq!(graded.score, 66);
    assert!(graded.is_correct);
    assert!(graded.partial);

    let graded = GradingService::grade(&q, &answer("q1", "restart the server"), None);
    assert_eq!(graded.score, 0);
    assert!(!graded.is_correct);
}

#[test]
fn coding_without_a_runner_result_is_pending() {
    let q = common::coding("c1", "python", "", "42");

    let graded = GradingService::grade(&q, &answer("c1", "print(42)"), None);
    assert_eq!(graded.score, 0);
    assert!(graded.pending_execution);

    let result = RunnerResult {
        submission_id: Uuid::new_v4(),
        results: vec![TestCaseResult {
            test_case_id: Some("t1".to_string()),
            passed: true,
            output: "42".to_string(),
            expected: Some("42".to_string()),
            duration_ms: Some(3),
            stderr: None,
        }],
        total_passed: 1,
        total_tests: 1,
        runtime_ms: Some(3),
        memory_kb: None,
        stdout: Some("42".to_string()),
        stderr: None,
        exit_code: Some(0),
    };
    let graded = GradingService::grade(&q, &answer("c1", "print(42)"), Some(&result));
    assert_eq!(graded.score, 100);
    assert!(graded.is_correct);
    assert!(!graded.pending_execution);
}

#[test]
fn identical_code_maxes_the_static_score() {
    let code = "def solve(n):\n    total = 0\n    for i in range(n):\n        total += i\n    return total\n";
    let service = PlagiarismService::new(vec![CorpusEntry {
        source: "known-solution-1".to_string(),
        code: code.to_string(),
        expected_outputs: None,
        url: None,
    }]);

    let report = service.score(code, None);
    assert_eq!(report.static_score, 1.0);
    assert_eq!(report.web_score, 0.0);
    // Static weight alone.
    assert!((report.final_score - 0.5).abs() < 1e-9);
    assert_eq!(report.evidence.len(), 1);
    assert_eq!(report.evidence[0].source, "known-solution-1");
}

#[test]
fn unrelated_code_scores_near_zero() {
    let service = PlagiarismService::new(vec![CorpusEntry {
        source: "known-solution-1".to_string(),
        code: "def solve(n):\n    total = 0\n    for i in range(n):\n        total += i\n    return total\n".to_string(),
        expected_outputs: None,
        url: None,
    }]);

    let report = service.score(
        "import sys\nlines = sys.stdin.read().split()\nprint(len(lines))\n",
        None,
    );
    assert_eq!(report.static_score, 0.0);
    assert_eq!(report.final_score, 0.0);
    assert!(report.evidence.is_empty());
}

#[test]
fn combination_weights_sum_to_one() {
    assert!((STATIC_WEIGHT + DYNAMIC_WEIGHT + WEB_WEIGHT - 1.0).abs() < 1e-9);
}

#[test]
fn web_sources_count_toward_the_web_score() {
    let code = "a = 1\nb = 2\nc = a + b\nprint(c)\n";
    let service = PlagiarismService::new(vec![CorpusEntry {
        source: "stackexchange".to_string(),
        code: code.to_string(),
        expected_outputs: None,
        url: Some("https://example.com/answer/1".to_string()),
    }]);

    let report = service.score(code, None);
    assert_eq!(report.web_score, 1.0);
    assert_eq!(report.static_score, 0.0);
    assert!((report.final_score - 0.3).abs() < 1e-9);
    assert_eq!(report.evidence[0].url.as_deref(), Some("https://example.com/answer/1"));
}
