use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, TimeZone, Utc};

use crate::actor::{Actor, Role, UserId};
use crate::compliance::domain::{
    CertificationId, CertificationType, CertificationTypeId, Coach, CoachCertification, CoachId,
    TenantId,
};
use crate::notifications::dispatch::DispatchEngine;
use crate::notifications::domain::{
    EmailMessage, Notification, NotificationId, NotificationLogEntry, NotificationSchedule,
    ScheduleChannels, ScheduleId,
};
use crate::notifications::repository::{
    EmailError, EmailTransport, ExpiringCertificationRow, NotificationStore, RepositoryError,
    ScheduleStore,
};
use crate::store::{MemoryStore, RecordingMailer};

pub(super) fn reference() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 4, 15).expect("valid date")
}

pub(super) fn tenant() -> TenantId {
    TenantId("lincoln-high".to_string())
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

pub(super) fn schedule(
    id: &str,
    tenant: Option<TenantId>,
    days_before_expiry: i32,
    notification_type: ScheduleChannels,
) -> NotificationSchedule {
    NotificationSchedule {
        id: ScheduleId(id.to_string()),
        tenant,
        days_before_expiry,
        notification_type,
        is_active: true,
    }
}

pub(super) fn seeded_coach(store: &MemoryStore, id: &str, tenant: Option<TenantId>) -> CoachId {
    let coach_id = CoachId(id.to_string());
    store.put_coach(Coach {
        id: coach_id.clone(),
        full_name: "Morgan Taylor".to_string(),
        email: format!("{id}@lincoln.example.org"),
        tenant,
    });
    coach_id
}

pub(super) fn seeded_type(store: &MemoryStore, id: &str, name: &str) -> CertificationTypeId {
    let type_id = CertificationTypeId(id.to_string());
    store.put_certification_type(CertificationType {
        id: type_id.clone(),
        name: name.to_string(),
        tenant: None,
        validity_months: Some(24),
        is_universal: false,
    });
    type_id
}

pub(super) fn seeded_certification(
    store: &MemoryStore,
    id: &str,
    coach: &CoachId,
    type_id: &CertificationTypeId,
    expiration: NaiveDate,
) -> CertificationId {
    let cert_id = CertificationId(id.to_string());
    store.put_certification(CoachCertification {
        id: cert_id.clone(),
        coach: coach.clone(),
        certification_type: type_id.clone(),
        certificate_number: format!("NUM-{id}"),
        issuing_organization: "Red Cross".to_string(),
        issue_date: NaiveDate::from_ymd_opt(2025, 5, 1).expect("valid"),
        expiration_date: Some(expiration),
        document_url: None,
        created_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
    });
    cert_id
}

/// A store with one tenant coach holding a CPR certification that expires
/// seven days after [`reference`].
pub(super) fn store_with_expiring_cert() -> (MemoryStore, CoachId, CertificationId) {
    let store = MemoryStore::default();
    let coach = seeded_coach(&store, "coach-1", Some(tenant()));
    let cpr = seeded_type(&store, "cpr", "CPR");
    let cert = seeded_certification(
        &store,
        "cert-1",
        &coach,
        &cpr,
        reference() + chrono::Duration::days(7),
    );
    (store, coach, cert)
}

pub(super) fn engine(
    store: &MemoryStore,
) -> (
    DispatchEngine<MemoryStore, MemoryStore, RecordingMailer>,
    Arc<RecordingMailer>,
) {
    let mailer = Arc::new(RecordingMailer::default());
    let engine = DispatchEngine::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        mailer.clone(),
    );
    (engine, mailer)
}

pub(super) fn insert_schedule(store: &MemoryStore, schedule: NotificationSchedule) {
    ScheduleStore::insert(store, schedule).expect("schedule inserts");
}

/// Store wrapper whose expiry query fails for one target date; everything else
/// delegates to the wrapped [`MemoryStore`]. Used to exercise per-schedule
/// isolation in the dispatch cycle.
pub(super) struct FlakyStore {
    pub(super) inner: MemoryStore,
    pub(super) fail_on: NaiveDate,
}

impl NotificationStore for FlakyStore {
    fn certifications_expiring_on(
        &self,
        date: NaiveDate,
        tenant: Option<&TenantId>,
    ) -> Result<Vec<ExpiringCertificationRow>, RepositoryError> {
        if date == self.fail_on {
            return Err(RepositoryError::Unavailable("replica lagging".to_string()));
        }
        self.inner.certifications_expiring_on(date, tenant)
    }

    fn log_contains(
        &self,
        certification: &CertificationId,
        schedule: &ScheduleId,
    ) -> Result<bool, RepositoryError> {
        self.inner.log_contains(certification, schedule)
    }

    fn append_log(&self, entry: NotificationLogEntry) -> Result<(), RepositoryError> {
        self.inner.append_log(entry)
    }

    fn insert_notification(
        &self,
        notification: Notification,
    ) -> Result<Notification, RepositoryError> {
        self.inner.insert_notification(notification)
    }

    fn has_unread_with_link(
        &self,
        recipient: &CoachId,
        link: &str,
    ) -> Result<bool, RepositoryError> {
        self.inner.has_unread_with_link(recipient, link)
    }

    fn mark_read(&self, id: &NotificationId, recipient: &CoachId) -> Result<(), RepositoryError> {
        self.inner.mark_read(id, recipient)
    }
}

/// Transport whose sends always fail; used to exercise per-channel isolation.
#[derive(Default, Clone)]
pub(super) struct FailingMailer {
    attempts: Arc<Mutex<Vec<EmailMessage>>>,
}

impl FailingMailer {
    pub(super) fn attempts(&self) -> usize {
        self.attempts.lock().expect("mailer mutex poisoned").len()
    }
}

impl EmailTransport for FailingMailer {
    fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        self.attempts
            .lock()
            .expect("mailer mutex poisoned")
            .push(message);
        Err(EmailError::Transport("smtp relay offline".to_string()))
    }
}
