pub mod answer;
pub mod assessment;
pub mod audit_log;
pub mod plagiarism;
pub mod question;
pub mod submission;
pub mod verification;
pub mod violation;
