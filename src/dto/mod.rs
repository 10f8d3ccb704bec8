pub mod assessment_dto;
pub mod submission_dto;
pub mod verification_dto;
