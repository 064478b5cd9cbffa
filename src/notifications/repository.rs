use chrono::NaiveDate;

use crate::compliance::domain::{
    CertificationId, CertificationType, Coach, CoachCertification, CoachId, TenantId,
};
pub use crate::compliance::repository::RepositoryError;

use super::domain::{
    EmailMessage, Notification, NotificationId, NotificationLogEntry, NotificationSchedule,
    ScheduleId,
};

/// One-to-one join row for dispatch queries: the certification together with
/// the coach holding it and the credential type it instantiates. The join
/// cardinality is explicit in the type so handlers never guess at
/// array-vs-object shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiringCertificationRow {
    pub certification: CoachCertification,
    pub coach: Coach,
    pub certification_type: CertificationType,
}

/// Storage abstraction over notification-schedule rows.
pub trait ScheduleStore: Send + Sync {
    /// Active schedules in exactly the given scope (`None` = global rows only).
    fn active_for_scope(
        &self,
        tenant: Option<&TenantId>,
    ) -> Result<Vec<NotificationSchedule>, RepositoryError>;
    /// Every active schedule, global and tenant-scoped alike.
    fn all_active(&self) -> Result<Vec<NotificationSchedule>, RepositoryError>;
    fn schedule(&self, id: &ScheduleId) -> Result<Option<NotificationSchedule>, RepositoryError>;
    /// Insert a schedule; a duplicate (tenant, days_before_expiry) pair is a
    /// [`RepositoryError::Conflict`], never a silent overwrite.
    fn insert(
        &self,
        schedule: NotificationSchedule,
    ) -> Result<NotificationSchedule, RepositoryError>;
    fn set_active(&self, id: &ScheduleId, active: bool) -> Result<(), RepositoryError>;
}

/// Storage abstraction over notifications and the idempotency ledger.
pub trait NotificationStore: Send + Sync {
    /// Certifications whose expiration date equals `date` exactly, optionally
    /// filtered to coaches of one tenant.
    fn certifications_expiring_on(
        &self,
        date: NaiveDate,
        tenant: Option<&TenantId>,
    ) -> Result<Vec<ExpiringCertificationRow>, RepositoryError>;
    /// Whether any ledger entry exists for the pair, regardless of channel.
    fn log_contains(
        &self,
        certification: &CertificationId,
        schedule: &ScheduleId,
    ) -> Result<bool, RepositoryError>;
    /// Append a ledger entry. The (certification, schedule, channel) triple is
    /// unique; a concurrent writer losing the race sees
    /// [`RepositoryError::Conflict`].
    fn append_log(&self, entry: NotificationLogEntry) -> Result<(), RepositoryError>;
    fn insert_notification(
        &self,
        notification: Notification,
    ) -> Result<Notification, RepositoryError>;
    /// Whether the recipient already has an unread notification pointing at
    /// the same link (used by the on-demand generator to avoid piling up).
    fn has_unread_with_link(
        &self,
        recipient: &CoachId,
        link: &str,
    ) -> Result<bool, RepositoryError>;
    /// Mark a notification read; [`RepositoryError::NotFound`] when the id
    /// does not exist or belongs to a different recipient.
    fn mark_read(&self, id: &NotificationId, recipient: &CoachId) -> Result<(), RepositoryError>;
}

/// Trait describing the outbound email delivery seam.
pub trait EmailTransport: Send + Sync {
    fn send(&self, message: EmailMessage) -> Result<(), EmailError>;
}

/// Email dispatch error. Failures are never retried within a cycle.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("email transport unavailable: {0}")]
    Transport(String),
}
