use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use crate::compliance::domain::{
    CertificationId, CertificationRequirement, CertificationType, CertificationTypeId, Coach,
    CoachCertification, CoachId, Program, ProgramId, TenantId,
};
use crate::compliance::repository::{ComplianceStore, RepositoryError};
use crate::notifications::domain::{
    EmailMessage, Notification, NotificationId, NotificationLogEntry, NotificationSchedule,
    ScheduleId,
};
use crate::notifications::repository::{
    EmailError, EmailTransport, ExpiringCertificationRow, NotificationStore, ScheduleStore,
};

#[derive(Default)]
struct MemoryData {
    coaches: HashMap<CoachId, Coach>,
    programs: HashMap<ProgramId, Program>,
    assignments: Vec<(CoachId, ProgramId)>,
    requirements: HashMap<ProgramId, Vec<CertificationRequirement>>,
    certification_types: HashMap<CertificationTypeId, CertificationType>,
    certifications: HashMap<CertificationId, CoachCertification>,
    schedules: HashMap<ScheduleId, NotificationSchedule>,
    log: Vec<NotificationLogEntry>,
    notifications: HashMap<NotificationId, Notification>,
}

/// In-memory stand-in for the relational store, implementing every repository
/// trait over one mutex-guarded data set so it behaves like a single database
/// snapshot.
#[derive(Default, Clone)]
pub struct MemoryStore {
    data: Arc<Mutex<MemoryData>>,
}

impl MemoryStore {
    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryData> {
        self.data.lock().expect("store mutex poisoned")
    }

    pub fn put_coach(&self, coach: Coach) {
        self.lock().coaches.insert(coach.id.clone(), coach);
    }

    pub fn put_program(&self, program: Program) {
        self.lock().programs.insert(program.id.clone(), program);
    }

    pub fn assign(&self, coach: &CoachId, program: &ProgramId) {
        self.lock()
            .assignments
            .push((coach.clone(), program.clone()));
    }

    pub fn put_certification_type(&self, certification_type: CertificationType) {
        self.lock()
            .certification_types
            .insert(certification_type.id.clone(), certification_type);
    }

    pub fn put_requirement(&self, requirement: CertificationRequirement) {
        self.lock()
            .requirements
            .entry(requirement.program.clone())
            .or_default()
            .push(requirement);
    }

    pub fn put_certification(&self, certification: CoachCertification) {
        self.lock()
            .certifications
            .insert(certification.id.clone(), certification);
    }

    pub fn log_entries(&self) -> Vec<NotificationLogEntry> {
        self.lock().log.clone()
    }

    pub fn notifications_for(&self, recipient: &CoachId) -> Vec<Notification> {
        let mut notifications: Vec<Notification> = self
            .lock()
            .notifications
            .values()
            .filter(|n| n.recipient == *recipient)
            .cloned()
            .collect();
        notifications.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        notifications
    }

    pub fn schedule_rows(&self) -> Vec<NotificationSchedule> {
        let mut schedules: Vec<NotificationSchedule> =
            self.lock().schedules.values().cloned().collect();
        schedules.sort_by(|a, b| a.id.cmp(&b.id));
        schedules
    }
}

impl ComplianceStore for MemoryStore {
    fn coach(&self, id: &CoachId) -> Result<Option<Coach>, RepositoryError> {
        Ok(self.lock().coaches.get(id).cloned())
    }

    fn program(&self, id: &ProgramId) -> Result<Option<Program>, RepositoryError> {
        Ok(self.lock().programs.get(id).cloned())
    }

    fn programs_for_coach(&self, id: &CoachId) -> Result<Vec<Program>, RepositoryError> {
        let data = self.lock();
        let mut programs: Vec<Program> = data
            .assignments
            .iter()
            .filter(|(coach, _)| coach == id)
            .filter_map(|(_, program)| data.programs.get(program).cloned())
            .collect();
        programs.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(programs)
    }

    fn requirements_for_program(
        &self,
        id: &ProgramId,
    ) -> Result<Vec<CertificationRequirement>, RepositoryError> {
        Ok(self.lock().requirements.get(id).cloned().unwrap_or_default())
    }

    fn certifications_for_coach(
        &self,
        id: &CoachId,
    ) -> Result<Vec<CoachCertification>, RepositoryError> {
        let data = self.lock();
        let mut certifications: Vec<CoachCertification> = data
            .certifications
            .values()
            .filter(|c| c.coach == *id)
            .cloned()
            .collect();
        certifications.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(certifications)
    }

    fn certification_types(
        &self,
        ids: &[CertificationTypeId],
    ) -> Result<Vec<CertificationType>, RepositoryError> {
        let data = self.lock();
        Ok(ids
            .iter()
            .filter_map(|id| data.certification_types.get(id).cloned())
            .collect())
    }

    fn replace_requirements(
        &self,
        program: &ProgramId,
        requirements: Vec<CertificationRequirement>,
    ) -> Result<(), RepositoryError> {
        self.lock()
            .requirements
            .insert(program.clone(), requirements);
        Ok(())
    }
}

impl ScheduleStore for MemoryStore {
    fn active_for_scope(
        &self,
        tenant: Option<&TenantId>,
    ) -> Result<Vec<NotificationSchedule>, RepositoryError> {
        let data = self.lock();
        let mut schedules: Vec<NotificationSchedule> = data
            .schedules
            .values()
            .filter(|s| s.is_active && s.tenant.as_ref() == tenant)
            .cloned()
            .collect();
        schedules.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(schedules)
    }

    fn all_active(&self) -> Result<Vec<NotificationSchedule>, RepositoryError> {
        let data = self.lock();
        let mut schedules: Vec<NotificationSchedule> = data
            .schedules
            .values()
            .filter(|s| s.is_active)
            .cloned()
            .collect();
        schedules.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(schedules)
    }

    fn schedule(&self, id: &ScheduleId) -> Result<Option<NotificationSchedule>, RepositoryError> {
        Ok(self.lock().schedules.get(id).cloned())
    }

    fn insert(
        &self,
        schedule: NotificationSchedule,
    ) -> Result<NotificationSchedule, RepositoryError> {
        let mut data = self.lock();
        let duplicate = data.schedules.values().any(|existing| {
            existing.tenant == schedule.tenant
                && existing.days_before_expiry == schedule.days_before_expiry
        });
        if duplicate {
            return Err(RepositoryError::Conflict);
        }
        data.schedules.insert(schedule.id.clone(), schedule.clone());
        Ok(schedule)
    }

    fn set_active(&self, id: &ScheduleId, active: bool) -> Result<(), RepositoryError> {
        let mut data = self.lock();
        match data.schedules.get_mut(id) {
            Some(schedule) => {
                schedule.is_active = active;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }
}

impl NotificationStore for MemoryStore {
    fn certifications_expiring_on(
        &self,
        date: NaiveDate,
        tenant: Option<&TenantId>,
    ) -> Result<Vec<ExpiringCertificationRow>, RepositoryError> {
        let data = self.lock();
        let mut rows = Vec::new();
        for certification in data.certifications.values() {
            if certification.expiration_date != Some(date) {
                continue;
            }
            let coach = data.coaches.get(&certification.coach).ok_or_else(|| {
                RepositoryError::Unavailable(format!(
                    "certification {} references unknown coach",
                    certification.id.0
                ))
            })?;
            if let Some(tenant) = tenant {
                if coach.tenant.as_ref() != Some(tenant) {
                    continue;
                }
            }
            let certification_type = data
                .certification_types
                .get(&certification.certification_type)
                .ok_or_else(|| {
                    RepositoryError::Unavailable(format!(
                        "certification {} references unknown type",
                        certification.id.0
                    ))
                })?;
            rows.push(ExpiringCertificationRow {
                certification: certification.clone(),
                coach: coach.clone(),
                certification_type: certification_type.clone(),
            });
        }
        rows.sort_by(|a, b| a.certification.id.cmp(&b.certification.id));
        Ok(rows)
    }

    fn log_contains(
        &self,
        certification: &CertificationId,
        schedule: &ScheduleId,
    ) -> Result<bool, RepositoryError> {
        Ok(self
            .lock()
            .log
            .iter()
            .any(|entry| entry.certification == *certification && entry.schedule == *schedule))
    }

    fn append_log(&self, entry: NotificationLogEntry) -> Result<(), RepositoryError> {
        let mut data = self.lock();
        let duplicate = data.log.iter().any(|existing| {
            existing.certification == entry.certification
                && existing.schedule == entry.schedule
                && existing.channel == entry.channel
        });
        if duplicate {
            return Err(RepositoryError::Conflict);
        }
        data.log.push(entry);
        Ok(())
    }

    fn insert_notification(
        &self,
        notification: Notification,
    ) -> Result<Notification, RepositoryError> {
        let mut data = self.lock();
        if data.notifications.contains_key(&notification.id) {
            return Err(RepositoryError::Conflict);
        }
        data.notifications
            .insert(notification.id.clone(), notification.clone());
        Ok(notification)
    }

    fn has_unread_with_link(
        &self,
        recipient: &CoachId,
        link: &str,
    ) -> Result<bool, RepositoryError> {
        Ok(self.lock().notifications.values().any(|n| {
            n.recipient == *recipient && !n.read && n.link.as_deref() == Some(link)
        }))
    }

    fn mark_read(&self, id: &NotificationId, recipient: &CoachId) -> Result<(), RepositoryError> {
        let mut data = self.lock();
        match data.notifications.get_mut(id) {
            Some(notification) if notification.recipient == *recipient => {
                notification.read = true;
                Ok(())
            }
            _ => Err(RepositoryError::NotFound),
        }
    }
}

/// Email transport that records every accepted message; doubles as the demo
/// transport and the test spy.
#[derive(Default, Clone)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<EmailMessage>>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().expect("mailer mutex poisoned").clone()
    }
}

impl EmailTransport for RecordingMailer {
    fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        self.sent
            .lock()
            .expect("mailer mutex poisoned")
            .push(message);
        Ok(())
    }
}
