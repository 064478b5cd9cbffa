//! Notification deduplication and dispatch.
//!
//! The engine runs once per day under an external trigger. For each active
//! schedule it computes the single calendar day a certification can match
//! (`reference + days_before_expiry`), fans out over the schedule's channels,
//! and records every accepted dispatch in the notification log. The log
//! append is the serialization point: a conflict there means another cycle
//! already sent the triple, and the item is skipped rather than failed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::actor::Actor;
use crate::compliance::evaluator::ComplianceReport;

use super::domain::{
    expiry_copy, EmailMessage, Notification, NotificationChannel, NotificationId, NotificationKind,
    NotificationLogEntry, NotificationSchedule,
};
use super::repository::{
    EmailError, EmailTransport, ExpiringCertificationRow, NotificationStore, RepositoryError,
    ScheduleStore,
};

/// Tally of one dispatch cycle. Failures are per-item; the cycle itself
/// always runs to completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleOutcome {
    pub notifications_sent: usize,
    pub already_sent: usize,
    pub failures: usize,
}

/// Error raised by the read-marking operation.
#[derive(Debug, thiserror::Error)]
pub enum MarkReadError {
    #[error("notification not found")]
    NotFound,
    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for MarkReadError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound => Self::NotFound,
            other => Self::Repository(other),
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum ChannelError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Email(#[from] EmailError),
}

static NOTIFICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_notification_id() -> NotificationId {
    let id = NOTIFICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    NotificationId(format!("notif-{id:06}"))
}

fn certification_link(certification_id: &str) -> String {
    format!("/certifications/{certification_id}")
}

/// The one stateful actor in the engine. Idempotent per
/// (certification, schedule) pair; safe to re-run after partial failure.
pub struct DispatchEngine<S, N, E> {
    schedules: Arc<S>,
    store: Arc<N>,
    email: Arc<E>,
}

impl<S, N, E> DispatchEngine<S, N, E>
where
    S: ScheduleStore + 'static,
    N: NotificationStore + 'static,
    E: EmailTransport + 'static,
{
    pub fn new(schedules: Arc<S>, store: Arc<N>, email: Arc<E>) -> Self {
        Self {
            schedules,
            store,
            email,
        }
    }

    /// Run one dispatch cycle against a reference date (date-only; callers
    /// pass today's calendar date in production).
    pub fn run_cycle(&self, reference: NaiveDate) -> CycleOutcome {
        let mut outcome = CycleOutcome::default();

        let schedules = match self.schedules.all_active() {
            Ok(schedules) => schedules,
            Err(err) => {
                warn!(error = %err, "could not load notification schedules; cycle aborted");
                return outcome;
            }
        };

        for schedule in &schedules {
            if let Err(err) = self.run_schedule(schedule, reference, &mut outcome) {
                outcome.failures += 1;
                warn!(
                    schedule = %schedule.id.0,
                    error = %err,
                    "schedule processing failed; continuing with remaining schedules"
                );
            }
        }

        info!(
            %reference,
            sent = outcome.notifications_sent,
            skipped = outcome.already_sent,
            failures = outcome.failures,
            "dispatch cycle complete"
        );
        outcome
    }

    fn run_schedule(
        &self,
        schedule: &NotificationSchedule,
        reference: NaiveDate,
        outcome: &mut CycleOutcome,
    ) -> Result<(), RepositoryError> {
        let Some(target) =
            reference.checked_add_signed(Duration::days(i64::from(schedule.days_before_expiry)))
        else {
            outcome.failures += 1;
            warn!(
                schedule = %schedule.id.0,
                days = schedule.days_before_expiry,
                "day offset leaves the calendar range; schedule skipped"
            );
            return Ok(());
        };
        let rows = self
            .store
            .certifications_expiring_on(target, schedule.tenant.as_ref())?;

        for row in rows {
            if self
                .store
                .log_contains(&row.certification.id, &schedule.id)?
            {
                outcome.already_sent += 1;
                debug!(
                    certification = %row.certification.id.0,
                    schedule = %schedule.id.0,
                    "already notified; skipping"
                );
                continue;
            }

            for channel in schedule.notification_type.channels() {
                match self.dispatch_channel(schedule, &row, target, *channel) {
                    Ok(()) => {
                        let entry = NotificationLogEntry {
                            certification: row.certification.id.clone(),
                            schedule: schedule.id.clone(),
                            channel: *channel,
                            sent_at: Utc::now(),
                        };
                        match self.store.append_log(entry) {
                            Ok(()) => outcome.notifications_sent += 1,
                            // A concurrent cycle won the insert race; the
                            // triple is covered either way.
                            Err(RepositoryError::Conflict) => outcome.already_sent += 1,
                            Err(err) => {
                                outcome.failures += 1;
                                warn!(
                                    certification = %row.certification.id.0,
                                    schedule = %schedule.id.0,
                                    channel = channel.label(),
                                    error = %err,
                                    "dispatched but could not record log entry"
                                );
                            }
                        }
                    }
                    Err(err) => {
                        outcome.failures += 1;
                        warn!(
                            certification = %row.certification.id.0,
                            schedule = %schedule.id.0,
                            channel = channel.label(),
                            error = %err,
                            "channel dispatch failed; no log entry written"
                        );
                    }
                }
            }
        }

        Ok(())
    }

    fn dispatch_channel(
        &self,
        schedule: &NotificationSchedule,
        row: &ExpiringCertificationRow,
        expiration: NaiveDate,
        channel: NotificationChannel,
    ) -> Result<(), ChannelError> {
        let (title, message) = expiry_copy(
            schedule.days_before_expiry,
            &row.certification_type.name,
            expiration,
        );

        match channel {
            NotificationChannel::InApp => {
                self.store.insert_notification(Notification {
                    id: next_notification_id(),
                    recipient: row.coach.id.clone(),
                    kind: NotificationKind::CertificationExpiry,
                    title,
                    message,
                    link: Some(certification_link(&row.certification.id.0)),
                    read: false,
                    created_at: Utc::now(),
                })?;
            }
            NotificationChannel::Email => {
                self.email.send(EmailMessage {
                    to: row.coach.email.clone(),
                    subject: title,
                    html_body: format!("<p>{message}</p>"),
                })?;
            }
        }
        Ok(())
    }

    /// On-demand generator: turn an already-computed compliance report into
    /// in-app notifications for the coach, skipping anything that still has
    /// an unread notification pointing at the same certification. Does not
    /// touch the dispatch ledger; that belongs to the scheduled cycle.
    pub fn notify_coach(&self, report: &ComplianceReport) -> Result<usize, RepositoryError> {
        let mut created = 0;
        for program in &report.programs {
            for item in &program.expiring {
                let Some(expiration) = item.expiration_date else {
                    continue;
                };
                let link = certification_link(&item.certification.0);
                if self.store.has_unread_with_link(&report.coach, &link)? {
                    continue;
                }

                let days_out = (expiration - report.reference_date).num_days();
                let (title, message) = expiry_copy(days_out as i32, &item.type_name, expiration);
                self.store.insert_notification(Notification {
                    id: next_notification_id(),
                    recipient: report.coach.clone(),
                    kind: NotificationKind::CertificationExpiry,
                    title,
                    message,
                    link: Some(link),
                    read: false,
                    created_at: Utc::now(),
                })?;
                created += 1;
            }
        }
        Ok(created)
    }

    /// Mark an in-app notification read on behalf of its recipient.
    pub fn mark_read(&self, actor: &Actor, id: &NotificationId) -> Result<(), MarkReadError> {
        let recipient = crate::compliance::domain::CoachId(actor.user.0.clone());
        self.store.mark_read(id, &recipient)?;
        Ok(())
    }
}
