//! Expiry notifications: schedule resolution and the idempotent
//! deduplication/dispatch cycle.

pub mod dispatch;
pub mod domain;
pub mod repository;
pub mod router;
pub mod schedules;

#[cfg(test)]
mod tests;

pub use dispatch::{CycleOutcome, DispatchEngine, MarkReadError};
pub use domain::{
    expiry_copy, EmailMessage, Notification, NotificationChannel, NotificationId,
    NotificationKind, NotificationLogEntry, NotificationSchedule, ScheduleChannels, ScheduleId,
};
pub use repository::{
    EmailError, EmailTransport, ExpiringCertificationRow, NotificationStore, RepositoryError,
    ScheduleStore,
};
pub use router::{notification_router, NotificationState};
pub use schedules::{ScheduleDraft, ScheduleError, ScheduleService};
