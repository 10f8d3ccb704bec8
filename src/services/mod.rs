pub mod assessment_service;
pub mod audit_service;
pub mod grading_service;
pub mod notifier_service;
pub mod plagiarism_service;
pub mod queue_service;
pub mod results_service;
pub mod runner_service;
pub mod security_service;
pub mod verification_service;
