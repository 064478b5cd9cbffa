use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for a school (the multi-tenancy boundary).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TenantId(pub String);

/// Identifier wrapper for a coach.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CoachId(pub String);

/// Identifier wrapper for an athletics program.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProgramId(pub String);

/// Identifier wrapper for a certification type (a named credential kind).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CertificationTypeId(pub String);

/// Identifier wrapper for a certification held by a coach.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CertificationId(pub String);

/// A coach as the compliance engine sees them. `tenant` is `None` for
/// globally-scoped coaches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coach {
    pub id: CoachId,
    pub full_name: String,
    pub email: String,
    pub tenant: Option<TenantId>,
}

/// An athletics program; always belongs to exactly one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub id: ProgramId,
    pub name: String,
    pub sport: String,
    pub tenant: TenantId,
}

/// A named credential kind, e.g. "CPR". Globally scoped when `tenant` is
/// `None`. Universal types are relevant across all programs regardless of
/// sport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificationType {
    pub id: CertificationTypeId,
    pub name: String,
    pub tenant: Option<TenantId>,
    pub validity_months: Option<u32>,
    pub is_universal: bool,
}

/// Program x certification-type requirement row.
///
/// `locked_by_admin` rows may only be removed or altered by the system admin;
/// bulk edits by lower-privilege actors must leave them untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificationRequirement {
    pub program: ProgramId,
    pub certification_type: CertificationTypeId,
    pub is_required: bool,
    pub locked_by_admin: bool,
}

/// A certification instance held by a coach. `expiration_date` is `None` for
/// non-expiring credentials; expiry is always a computed state, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoachCertification {
    pub id: CertificationId,
    pub coach: CoachId,
    pub certification_type: CertificationTypeId,
    pub certificate_number: String,
    pub issuing_organization: String,
    pub issue_date: NaiveDate,
    pub expiration_date: Option<NaiveDate>,
    pub document_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl CoachCertification {
    /// Whether this certification governs compliance over `other` when both
    /// are of the same type: a non-expiring certification beats any dated one,
    /// a later expiration beats an earlier one, and ties go to the
    /// most-recently-created instance.
    pub fn supersedes(&self, other: &Self) -> bool {
        match (self.expiration_date, other.expiration_date) {
            (None, Some(_)) => true,
            (Some(_), None) => false,
            (None, None) => self.created_at > other.created_at,
            (Some(mine), Some(theirs)) => {
                mine > theirs || (mine == theirs && self.created_at > other.created_at)
            }
        }
    }
}
