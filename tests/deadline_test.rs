mod common;

use chrono::{Duration, Utc};

use skillbridge_backend::models::assessment::{AssessmentStatus, AssessmentType};
use skillbridge_backend::services::assessment_service::SubmitOutcome;
use skillbridge_backend::{AppState, PolicySettings};

fn two_question_attempt(state: &AppState) -> uuid::Uuid {
    state
        .assessments
        .create_attempt(
            "cand-3".to_string(),
            "acme-jobs".to_string(),
            AssessmentType::QuickCheck,
            "javascript".to_string(),
            vec![common::true_false("q1", true), common::true_false("q2", false)],
        )
        .expect("create attempt")
}

#[tokio::test]
async fn questions_expire_after_limit_plus_grace() {
    common::init();
    let state = AppState::new(PolicySettings {
        question_grace_seconds: 5,
        ..PolicySettings::default()
    });
    let id = two_question_attempt(&state);

    let t0 = Utc::now();
    let issued = state.assessments.current_question(id, t0).expect("question");
    assert_eq!(issued.question.question_id, "q1");
    assert_eq!(issued.deadline, t0 + Duration::seconds(30));

    // Inside the window nothing expires, even past the nominal limit.
    assert_eq!(
        state
            .assessments
            .expire_overdue_at(id, t0 + Duration::seconds(34))
            .unwrap(),
        0
    );

    assert_eq!(
        state
            .assessments
            .expire_overdue_at(id, t0 + Duration::seconds(36))
            .unwrap(),
        1
    );

    let attempt = state.store.attempt_snapshot(id).expect("snapshot");
    assert_eq!(attempt.current_question_index, 1);
    assert_eq!(attempt.answers.len(), 1);
    assert!(attempt.answers[0].elapsed);
    assert!(attempt.answers[0].answer.is_empty());
    // Full time limit is charged on expiry.
    assert_eq!(attempt.answers[0].time_taken_secs, 30);
}

#[tokio::test]
async fn late_submission_lands_on_the_expired_question() {
    common::init();
    let state = AppState::new(PolicySettings {
        question_grace_seconds: 5,
        ..PolicySettings::default()
    });
    let id = two_question_attempt(&state);

    let t0 = Utc::now();
    state.assessments.current_question(id, t0).expect("question");

    // Answer q1 long after its deadline: the lazy expiry check runs first,
    // so q1 is already auto-answered and the stored answer wins.
    let outcome = state
        .assessments
        .submit_answer(
            id,
            "q1",
            skillbridge_backend::models::answer::AnswerValue::Text("true".to_string()),
            t0 + Duration::seconds(40),
        )
        .expect("submit");
    match outcome {
        SubmitOutcome::AlreadyAnswered { answer, current_question, .. } => {
            assert!(answer.elapsed);
            assert!(answer.answer.is_empty());
            // The reply points at the question now on the clock.
            let current = current_question.expect("current question");
            assert_eq!(current.question.question_id, "q2");
        }
        other => panic!("expected AlreadyAnswered, got {:?}", other),
    }
}

#[tokio::test]
async fn progress_accounts_for_lapsed_deadlines() {
    common::init();
    let state = AppState::new(PolicySettings {
        question_grace_seconds: 5,
        ..PolicySettings::default()
    });
    let id = two_question_attempt(&state);

    let t0 = Utc::now();
    state.assessments.current_question(id, t0).expect("question");

    // q1's 30s window plus grace has lapsed; progress must not report the
    // stale index or a deadline in the past.
    let progress = state
        .assessments
        .progress(id, t0 + Duration::seconds(40))
        .expect("progress");
    assert_eq!(progress.answered, 1);
    assert_eq!(progress.current_question_index, 1);
    // q2's clock started at q1's deadline, not at read time.
    assert_eq!(
        progress.current_deadline,
        Some(t0 + Duration::seconds(35 + 30))
    );
}

#[tokio::test]
async fn expiring_the_last_question_completes_the_attempt() {
    common::init();
    let state = AppState::new(PolicySettings {
        question_grace_seconds: 5,
        ..PolicySettings::default()
    });
    let id = two_question_attempt(&state);

    let t0 = Utc::now();
    state.assessments.current_question(id, t0).expect("question");

    // Both 30s windows (plus grace) have passed in one sweep.
    let expired = state
        .assessments
        .expire_overdue_at(id, t0 + Duration::seconds(120))
        .unwrap();
    assert_eq!(expired, 2);

    let attempt = state.store.attempt_snapshot(id).expect("snapshot");
    assert_eq!(attempt.status, AssessmentStatus::Completed);
    assert!(attempt.completed_at.is_some());

    let report = state.results.build_results(id).expect("report");
    assert_eq!(report.total_questions, 2);
    assert_eq!(report.correct_answers, 0);
    assert_eq!(report.overall_score, 0);
}

#[tokio::test]
async fn sweeper_covers_every_live_attempt() {
    common::init();
    let state = AppState::new(PolicySettings {
        question_grace_seconds: 0,
        ..PolicySettings::default()
    });
    let a = two_question_attempt(&state);
    let b = two_question_attempt(&state);

    let t0 = Utc::now();
    state.assessments.current_question(a, t0).expect("question");
    state.assessments.current_question(b, t0).expect("question");

    let expired = state.assessments.sweep_once(t0 + Duration::seconds(200));
    assert_eq!(expired, 4);
}

#[tokio::test]
async fn report_is_deterministic_for_a_finished_attempt() {
    common::init();
    let state = AppState::new(PolicySettings::default());
    let id = two_question_attempt(&state);

    let t0 = Utc::now();
    state
        .assessments
        .submit_answer(
            id,
            "q1",
            skillbridge_backend::models::answer::AnswerValue::Text("true".to_string()),
            t0,
        )
        .expect("submit");
    state
        .assessments
        .submit_answer(
            id,
            "q2",
            skillbridge_backend::models::answer::AnswerValue::Text("true".to_string()),
            t0 + Duration::seconds(3),
        )
        .expect("submit");

    let first = serde_json::to_value(state.results.build_results(id).expect("report")).unwrap();
    let second = serde_json::to_value(state.results.build_results(id).expect("report")).unwrap();
    assert_eq!(first, second);
    assert_eq!(first["correct_answers"], 1);
    assert_eq!(first["overall_score"], 50);
}
