use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::actor::Actor;
use crate::compliance::domain::TenantId;

use super::domain::{NotificationSchedule, ScheduleChannels, ScheduleId};
use super::repository::{RepositoryError, ScheduleStore};

/// Inbound shape for creating a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleDraft {
    #[serde(default)]
    pub tenant: Option<TenantId>,
    pub days_before_expiry: i32,
    pub notification_type: ScheduleChannels,
}

/// Widest accepted day offset on either side of the expiration date.
pub const MAX_DAY_OFFSET: i32 = 730;

/// Error raised by schedule resolution and mutation.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("actor is not permitted to manage schedules in this scope")]
    Forbidden,
    #[error("a schedule for this scope and day offset already exists")]
    Duplicate,
    #[error("day offset must be within 730 days of the expiration date")]
    InvalidOffset,
    #[error("schedule not found")]
    NotFound,
    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for ScheduleError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::Conflict => Self::Duplicate,
            RepositoryError::NotFound => Self::NotFound,
            other => Self::Repository(other),
        }
    }
}

static SCHEDULE_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_schedule_id() -> ScheduleId {
    let id = SCHEDULE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ScheduleId(format!("sched-{id:06}"))
}

/// Service resolving the effective schedule set and gating mutations behind
/// actor capabilities.
pub struct ScheduleService<S> {
    store: Arc<S>,
}

impl<S> ScheduleService<S>
where
    S: ScheduleStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// The effective schedules for a tenant: the union of active global
    /// schedules and the tenant's own active schedules. No precedence
    /// collapsing happens here; a global and a tenant schedule sharing a day
    /// offset both fire, each under its own identity.
    pub fn resolve(
        &self,
        tenant: Option<&TenantId>,
    ) -> Result<Vec<NotificationSchedule>, ScheduleError> {
        let mut schedules = self.store.active_for_scope(None)?;
        if let Some(tenant) = tenant {
            schedules.extend(self.store.active_for_scope(Some(tenant))?);
        }
        schedules.sort_by(|a, b| {
            b.days_before_expiry
                .cmp(&a.days_before_expiry)
                .then_with(|| a.tenant.is_some().cmp(&b.tenant.is_some()))
        });
        Ok(schedules)
    }

    /// Create a schedule in the draft's scope. Tenant admins may only create
    /// schedules for their own tenant; global scope is system-admin only.
    pub fn create(
        &self,
        actor: &Actor,
        draft: ScheduleDraft,
    ) -> Result<NotificationSchedule, ScheduleError> {
        if !actor.can_manage_schedule_scope(draft.tenant.as_ref()) {
            return Err(ScheduleError::Forbidden);
        }
        if draft.days_before_expiry.unsigned_abs() > MAX_DAY_OFFSET as u32 {
            return Err(ScheduleError::InvalidOffset);
        }

        let schedule = NotificationSchedule {
            id: next_schedule_id(),
            tenant: draft.tenant,
            days_before_expiry: draft.days_before_expiry,
            notification_type: draft.notification_type,
            is_active: true,
        };
        Ok(self.store.insert(schedule)?)
    }

    /// Activate or deactivate an existing schedule within the actor's scope.
    pub fn set_active(
        &self,
        actor: &Actor,
        id: &ScheduleId,
        active: bool,
    ) -> Result<(), ScheduleError> {
        let schedule = self.store.schedule(id)?.ok_or(ScheduleError::NotFound)?;
        if !actor.can_manage_schedule_scope(schedule.tenant.as_ref()) {
            return Err(ScheduleError::Forbidden);
        }
        self.store.set_active(id, active)?;
        Ok(())
    }
}
