use super::domain::{
    CertificationRequirement, CertificationType, CertificationTypeId, Coach, CoachCertification,
    CoachId, Program, ProgramId,
};

/// Storage abstraction over the relational store's compliance queries, so the
/// evaluator can be exercised in isolation.
pub trait ComplianceStore: Send + Sync {
    fn coach(&self, id: &CoachId) -> Result<Option<Coach>, RepositoryError>;
    fn program(&self, id: &ProgramId) -> Result<Option<Program>, RepositoryError>;
    fn programs_for_coach(&self, id: &CoachId) -> Result<Vec<Program>, RepositoryError>;
    fn requirements_for_program(
        &self,
        id: &ProgramId,
    ) -> Result<Vec<CertificationRequirement>, RepositoryError>;
    fn certifications_for_coach(
        &self,
        id: &CoachId,
    ) -> Result<Vec<CoachCertification>, RepositoryError>;
    fn certification_types(
        &self,
        ids: &[CertificationTypeId],
    ) -> Result<Vec<CertificationType>, RepositoryError>;
    /// Replace a program's requirement rows wholesale. Locked-row preservation
    /// is the caller's responsibility; the store writes what it is given.
    fn replace_requirements(
        &self,
        program: &ProgramId,
        requirements: Vec<CertificationRequirement>,
    ) -> Result<(), RepositoryError>;
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
