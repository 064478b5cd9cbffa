use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::actor::Actor;

use super::domain::{
    CertificationId, CertificationRequirement, CertificationTypeId, CoachCertification, CoachId,
    ProgramId,
};
use super::repository::{ComplianceStore, RepositoryError};
use super::status::{classify, CertificationStatus};

/// A required certification type the coach does not hold at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingRequirement {
    pub certification_type: CertificationTypeId,
    pub type_name: String,
}

/// A held certification that is expiring soon or already expired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiringCertification {
    pub certification: CertificationId,
    pub certification_type: CertificationTypeId,
    pub type_name: String,
    pub expiration_date: Option<NaiveDate>,
    pub status: CertificationStatus,
    pub is_required: bool,
}

/// Per-program compliance result for one coach.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramCompliance {
    pub program: ProgramId,
    pub program_name: String,
    pub missing_required: Vec<MissingRequirement>,
    pub expiring: Vec<ExpiringCertification>,
    pub is_compliant: bool,
}

/// Aggregates across every program the coach is assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceSummary {
    pub total_programs: usize,
    pub compliant_programs: usize,
    pub missing_required: usize,
    pub expiring_or_expired: usize,
}

/// Full evaluation output for one coach at one reference date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub coach: CoachId,
    pub reference_date: NaiveDate,
    pub programs: Vec<ProgramCompliance>,
    pub summary: ComplianceSummary,
}

/// Desired requirement row in a bulk edit, before locking rules are applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementDraft {
    pub certification_type: CertificationTypeId,
    pub is_required: bool,
    #[serde(default)]
    pub locked_by_admin: bool,
}

/// Error raised by the evaluator and the requirement-sync operation.
#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error("actor is not permitted to access this resource")]
    Forbidden,
    #[error("coach not found")]
    UnknownCoach,
    #[error("program not found")]
    UnknownProgram,
    #[error("certification type '{}' is scoped to a different tenant", .0 .0)]
    TenantMismatch(CertificationTypeId),
    #[error("requirement for '{}' is locked and may only be changed by a system administrator", .0 .0)]
    LockedRequirement(CertificationTypeId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Read-only evaluator joining program requirements against a coach's held
/// certifications. Safe to call unboundedly often; two calls over the same
/// store snapshot produce identical reports.
pub struct ComplianceEvaluator<S> {
    store: Arc<S>,
    lookahead_days: i64,
}

impl<S> ComplianceEvaluator<S>
where
    S: ComplianceStore + 'static,
{
    pub fn new(store: Arc<S>, lookahead_days: i64) -> Self {
        Self {
            store,
            lookahead_days,
        }
    }

    pub fn lookahead_days(&self) -> i64 {
        self.lookahead_days
    }

    /// Evaluate a coach's compliance across every assigned program.
    pub fn evaluate(
        &self,
        actor: &Actor,
        coach_id: &CoachId,
        reference: NaiveDate,
    ) -> Result<ComplianceReport, EvaluationError> {
        let coach = self
            .store
            .coach(coach_id)?
            .ok_or(EvaluationError::UnknownCoach)?;
        if !actor.can_view_coach(&coach) {
            return Err(EvaluationError::Forbidden);
        }

        let programs = self.store.programs_for_coach(coach_id)?;
        let certifications = self.store.certifications_for_coach(coach_id)?;
        let held = authoritative_by_type(&certifications);

        let mut requirements_by_program: Vec<(ProgramId, Vec<CertificationRequirement>)> =
            Vec::with_capacity(programs.len());
        let mut wanted_types: BTreeSet<CertificationTypeId> =
            held.keys().cloned().collect();
        for program in &programs {
            let requirements = self.store.requirements_for_program(&program.id)?;
            for requirement in &requirements {
                wanted_types.insert(requirement.certification_type.clone());
            }
            requirements_by_program.push((program.id.clone(), requirements));
        }

        let wanted: Vec<CertificationTypeId> = wanted_types.into_iter().collect();
        let types = self.store.certification_types(&wanted)?;
        let type_names: HashMap<&CertificationTypeId, &str> = types
            .iter()
            .map(|t| (&t.id, t.name.as_str()))
            .collect();
        let universal: BTreeSet<&CertificationTypeId> = types
            .iter()
            .filter(|t| t.is_universal)
            .map(|t| &t.id)
            .collect();

        let mut report_programs = Vec::with_capacity(programs.len());
        let mut summary = ComplianceSummary {
            total_programs: programs.len(),
            compliant_programs: 0,
            missing_required: 0,
            expiring_or_expired: 0,
        };

        for (program, (_, requirements)) in programs.iter().zip(&requirements_by_program) {
            let requirement_by_type: HashMap<&CertificationTypeId, &CertificationRequirement> =
                requirements
                    .iter()
                    .map(|r| (&r.certification_type, r))
                    .collect();

            let display_name = |type_id: &CertificationTypeId| -> String {
                type_names
                    .get(type_id)
                    .map(|name| (*name).to_string())
                    .unwrap_or_else(|| type_id.0.clone())
            };

            let mut missing_required = Vec::new();
            for requirement in requirements {
                if requirement.is_required && !held.contains_key(&requirement.certification_type) {
                    missing_required.push(MissingRequirement {
                        certification_type: requirement.certification_type.clone(),
                        type_name: display_name(&requirement.certification_type),
                    });
                }
            }

            let mut expiring = Vec::new();
            let mut expired_required = false;
            for (type_id, certification) in &held {
                let requirement = requirement_by_type.get(type_id).copied();
                // A held certification is relevant to this program when the
                // program lists its type, or the type is universal.
                if requirement.is_none() && !universal.contains(type_id) {
                    continue;
                }

                let status = classify(
                    certification.expiration_date,
                    reference,
                    self.lookahead_days,
                );
                let is_required = requirement.is_some_and(|r| r.is_required);
                if status.needs_attention() {
                    expiring.push(ExpiringCertification {
                        certification: certification.id.clone(),
                        certification_type: (*type_id).clone(),
                        type_name: display_name(type_id),
                        expiration_date: certification.expiration_date,
                        status,
                        is_required,
                    });
                }
                if is_required && status == CertificationStatus::Expired {
                    expired_required = true;
                }
            }

            let is_compliant = missing_required.is_empty() && !expired_required;
            if is_compliant {
                summary.compliant_programs += 1;
            }
            summary.missing_required += missing_required.len();
            summary.expiring_or_expired += expiring.len();

            report_programs.push(ProgramCompliance {
                program: program.id.clone(),
                program_name: program.name.clone(),
                missing_required,
                expiring,
                is_compliant,
            });
        }

        Ok(ComplianceReport {
            coach: coach.id,
            reference_date: reference,
            programs: report_programs,
            summary,
        })
    }

    /// Bulk-replace a program's requirement list on behalf of an actor.
    ///
    /// Locked rows are preserved when the actor is not the system admin: a
    /// draft that omits a locked row leaves it in place, and a draft that
    /// tries to alter one is rejected outright. Tenant-scoped certification
    /// types may only be attached to programs of the same tenant.
    pub fn sync_requirements(
        &self,
        actor: &Actor,
        program_id: &ProgramId,
        drafts: Vec<RequirementDraft>,
    ) -> Result<Vec<CertificationRequirement>, EvaluationError> {
        let program = self
            .store
            .program(program_id)?
            .ok_or(EvaluationError::UnknownProgram)?;
        if !actor.can_edit_requirements(&program.tenant) {
            return Err(EvaluationError::Forbidden);
        }

        let draft_types: Vec<CertificationTypeId> = drafts
            .iter()
            .map(|d| d.certification_type.clone())
            .collect();
        for certification_type in self.store.certification_types(&draft_types)? {
            if let Some(type_tenant) = &certification_type.tenant {
                if *type_tenant != program.tenant {
                    return Err(EvaluationError::TenantMismatch(certification_type.id));
                }
            }
        }

        let existing = self.store.requirements_for_program(program_id)?;
        let next = if actor.is_system_admin() {
            drafts
                .into_iter()
                .map(|draft| CertificationRequirement {
                    program: program_id.clone(),
                    certification_type: draft.certification_type,
                    is_required: draft.is_required,
                    locked_by_admin: draft.locked_by_admin,
                })
                .collect()
        } else {
            let locked: BTreeMap<&CertificationTypeId, &CertificationRequirement> = existing
                .iter()
                .filter(|r| r.locked_by_admin)
                .map(|r| (&r.certification_type, r))
                .collect();

            let mut next: Vec<CertificationRequirement> =
                locked.values().map(|r| (*r).clone()).collect();
            for draft in drafts {
                if let Some(locked_row) = locked.get(&draft.certification_type) {
                    if draft.is_required != locked_row.is_required || !draft.locked_by_admin {
                        return Err(EvaluationError::LockedRequirement(draft.certification_type));
                    }
                    // Identical restatement of a locked row; already kept.
                    continue;
                }
                if draft.locked_by_admin {
                    return Err(EvaluationError::LockedRequirement(draft.certification_type));
                }
                next.push(CertificationRequirement {
                    program: program_id.clone(),
                    certification_type: draft.certification_type,
                    is_required: draft.is_required,
                    locked_by_admin: false,
                });
            }
            next
        };

        self.store.replace_requirements(program_id, next.clone())?;
        Ok(next)
    }
}

/// Collapse a coach's certifications to one authoritative instance per type.
/// Keyed by a `BTreeMap` so downstream iteration order is deterministic.
fn authoritative_by_type(
    certifications: &[CoachCertification],
) -> BTreeMap<CertificationTypeId, &CoachCertification> {
    let mut held: BTreeMap<CertificationTypeId, &CoachCertification> = BTreeMap::new();
    for certification in certifications {
        match held.entry(certification.certification_type.clone()) {
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(certification);
            }
            std::collections::btree_map::Entry::Occupied(mut slot) => {
                if certification.supersedes(slot.get()) {
                    slot.insert(certification);
                }
            }
        }
    }
    held
}
