//! Certification compliance: status classification and per-program
//! evaluation of a coach's held certifications against program requirements.

pub mod domain;
pub mod evaluator;
pub mod repository;
pub mod router;
pub mod status;

#[cfg(test)]
mod tests;

pub use domain::{
    CertificationId, CertificationRequirement, CertificationType, CertificationTypeId, Coach,
    CoachCertification, CoachId, Program, ProgramId, TenantId,
};
pub use evaluator::{
    ComplianceEvaluator, ComplianceReport, ComplianceSummary, EvaluationError,
    ExpiringCertification, MissingRequirement, ProgramCompliance, RequirementDraft,
};
pub use repository::{ComplianceStore, RepositoryError};
pub use router::compliance_router;
pub use status::{classify, CertificationStatus, DEFAULT_LOOKAHEAD_DAYS};
