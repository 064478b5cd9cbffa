use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::actor::{Actor, Role, UserId};
use crate::compliance::domain::{
    CertificationId, CertificationRequirement, CertificationType, CertificationTypeId, Coach,
    CoachCertification, CoachId, Program, ProgramId, TenantId,
};
use crate::compliance::evaluator::ComplianceEvaluator;
use crate::compliance::status::DEFAULT_LOOKAHEAD_DAYS;
use crate::store::MemoryStore;

pub(super) fn reference() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 4, 15).expect("valid date")
}

pub(super) fn tenant() -> TenantId {
    TenantId("lincoln-high".to_string())
}

pub(super) fn coach_id() -> CoachId {
    CoachId("coach-1".to_string())
}

pub(super) fn program_id() -> ProgramId {
    ProgramId("prog-soccer".to_string())
}

pub(super) fn cpr() -> CertificationTypeId {
    CertificationTypeId("cpr".to_string())
}

pub(super) fn system_admin() -> Actor {
    Actor::system_admin("root")
}

pub(super) fn school_admin(tenant_slug: &str) -> Actor {
    Actor {
        user: UserId("admin-1".to_string()),
        role: Role::SchoolAdmin,
        tenant: Some(TenantId(tenant_slug.to_string())),
    }
}

pub(super) fn created_at(offset_secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap() + Duration::seconds(offset_secs)
}

/// A store holding one tenant, one coach assigned to one soccer program, and
/// the CPR certification type required by that program.
pub(super) fn seeded_store() -> MemoryStore {
    let store = MemoryStore::default();

    store.put_coach(Coach {
        id: coach_id(),
        full_name: "Morgan Taylor".to_string(),
        email: "mtaylor@lincoln.example.org".to_string(),
        tenant: Some(tenant()),
    });
    store.put_program(Program {
        id: program_id(),
        name: "Girls Soccer".to_string(),
        sport: "soccer".to_string(),
        tenant: tenant(),
    });
    store.assign(&coach_id(), &program_id());
    store.put_certification_type(CertificationType {
        id: cpr(),
        name: "CPR".to_string(),
        tenant: None,
        validity_months: Some(24),
        is_universal: false,
    });
    store.put_requirement(CertificationRequirement {
        program: program_id(),
        certification_type: cpr(),
        is_required: true,
        locked_by_admin: false,
    });

    store
}

pub(super) fn certification(
    id: &str,
    type_id: CertificationTypeId,
    expiration: Option<NaiveDate>,
    created_offset_secs: i64,
) -> CoachCertification {
    CoachCertification {
        id: CertificationId(id.to_string()),
        coach: coach_id(),
        certification_type: type_id,
        certificate_number: format!("NUM-{id}"),
        issuing_organization: "Red Cross".to_string(),
        issue_date: NaiveDate::from_ymd_opt(2025, 5, 1).expect("valid"),
        expiration_date: expiration,
        document_url: Some(format!("https://docs.example.org/{id}.pdf")),
        created_at: created_at(created_offset_secs),
    }
}

pub(super) fn evaluator(store: &MemoryStore) -> ComplianceEvaluator<MemoryStore> {
    ComplianceEvaluator::new(Arc::new(store.clone()), DEFAULT_LOOKAHEAD_DAYS)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("body is readable");
    serde_json::from_slice(&body).expect("body is json")
}
