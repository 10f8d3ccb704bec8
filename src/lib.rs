pub mod config;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

use std::time::Duration;

use crate::services::assessment_service::AssessmentService;
use crate::services::audit_service::AuditService;
use crate::services::notifier_service::NotifierService;
use crate::services::plagiarism_service::{CorpusEntry, PlagiarismService};
use crate::services::queue_service::QueueService;
use crate::services::results_service::ResultsService;
use crate::services::runner_service::{ExecutionLimits, RunnerService};
use crate::services::security_service::SecurityService;
use crate::services::verification_service::VerificationService;
use crate::store::Store;

/// Runtime policy knobs, passed in at construction rather than read from
/// the environment so tests can pin them per instance.
#[derive(Debug, Clone)]
pub struct PolicySettings {
    pub max_violations: usize,
    pub question_grace_seconds: i64,
    pub runner_limits: ExecutionLimits,
    pub plagiarism_corpus: Vec<CorpusEntry>,
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            max_violations: 3,
            question_grace_seconds: 5,
            runner_limits: ExecutionLimits::default(),
            plagiarism_corpus: Vec::new(),
        }
    }
}

impl PolicySettings {
    /// Settings derived from the loaded configuration. Requires
    /// `config::init_config` to have run.
    pub fn from_config() -> Self {
        let config = crate::config::get_config();
        Self {
            max_violations: config.max_violations as usize,
            question_grace_seconds: config.question_grace_seconds,
            runner_limits: ExecutionLimits {
                test_timeout: Duration::from_millis(config.runner_timeout_ms),
                max_output_bytes: config.runner_max_output_bytes,
                ..ExecutionLimits::default()
            },
            plagiarism_corpus: Vec::new(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub assessments: AssessmentService,
    pub security: SecurityService,
    pub results: ResultsService,
    pub queue: QueueService,
    pub notifier: NotifierService,
    pub audit: AuditService,
    pub verification: VerificationService,
}

impl AppState {
    pub fn new(settings: PolicySettings) -> Self {
        let store = Store::new();
        let notifier = NotifierService::new();
        let runner = RunnerService::new(settings.runner_limits);
        let plagiarism = PlagiarismService::new(settings.plagiarism_corpus);
        let queue = QueueService::new(
            store.clone(),
            runner,
            plagiarism,
            notifier.clone(),
        );
        let assessments = AssessmentService::new(
            store.clone(),
            queue.clone(),
            notifier.clone(),
            settings.question_grace_seconds,
        );
        let security = SecurityService::new(store.clone(), settings.max_violations);
        let results = ResultsService::new(store.clone());
        let audit = AuditService::new(store.clone());
        let verification = VerificationService::new(store.clone());

        Self {
            store,
            assessments,
            security,
            results,
            queue,
            notifier,
            audit,
            verification,
        }
    }
}
