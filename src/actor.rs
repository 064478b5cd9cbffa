//! Explicit calling-actor context.
//!
//! The identity/session provider is an external collaborator; it hands every
//! request a `(user, role, tenant)` triple. That triple is carried through the
//! engine as an explicit [`Actor`] value rather than re-derived from ambient
//! session state, so impersonation and privilege checks stay visible at the
//! call sites that depend on them.

use serde::{Deserialize, Serialize};

use crate::compliance::domain::{Coach, TenantId};

/// Opaque identifier for an authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Roles recognized by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SystemAdmin,
    SchoolAdmin,
    Coach,
    AssistantCoach,
    Parent,
    Student,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::SystemAdmin => "system_admin",
            Role::SchoolAdmin => "school_admin",
            Role::Coach => "coach",
            Role::AssistantCoach => "assistant_coach",
            Role::Parent => "parent",
            Role::Student => "student",
        }
    }
}

/// The authenticated caller on whose behalf an operation runs.
///
/// `tenant` is `None` for globally-scoped actors (the system administrator);
/// every other role is expected to carry its school's tenant id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub user: UserId,
    pub role: Role,
    pub tenant: Option<TenantId>,
}

impl Actor {
    pub fn system_admin(user: impl Into<String>) -> Self {
        Self {
            user: UserId(user.into()),
            role: Role::SystemAdmin,
            tenant: None,
        }
    }

    pub fn is_system_admin(&self) -> bool {
        matches!(self.role, Role::SystemAdmin)
    }

    /// Whether this actor may read the given coach's compliance data.
    ///
    /// System admins see everyone; school admins see coaches of their own
    /// tenant; coaches and assistant coaches see only themselves.
    pub fn can_view_coach(&self, coach: &Coach) -> bool {
        match self.role {
            Role::SystemAdmin => true,
            Role::SchoolAdmin => {
                self.tenant.is_some() && self.tenant.as_ref() == coach.tenant.as_ref()
            }
            Role::Coach | Role::AssistantCoach => coach.id.0 == self.user.0,
            Role::Parent | Role::Student => false,
        }
    }

    /// Whether this actor may create or modify notification schedules in the
    /// given scope (`None` = global).
    pub fn can_manage_schedule_scope(&self, scope: Option<&TenantId>) -> bool {
        match self.role {
            Role::SystemAdmin => true,
            Role::SchoolAdmin => match scope {
                Some(tenant) => self.tenant.as_ref() == Some(tenant),
                None => false,
            },
            _ => false,
        }
    }

    /// Whether this actor may edit a program's certification requirements.
    /// Locked requirement rows are additionally restricted to the system
    /// admin; that check happens where the rows are compared.
    pub fn can_edit_requirements(&self, program_tenant: &TenantId) -> bool {
        match self.role {
            Role::SystemAdmin => true,
            Role::SchoolAdmin => self.tenant.as_ref() == Some(program_tenant),
            _ => false,
        }
    }

    /// Running the scheduled dispatch cycle is restricted to the system admin.
    pub fn can_run_dispatch(&self) -> bool {
        self.is_system_admin()
    }
}
