use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::compliance::domain::{CertificationId, CoachId, TenantId};

/// Identifier wrapper for a notification schedule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScheduleId(pub String);

/// Identifier wrapper for an in-app notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationId(pub String);

/// Delivery channel for a single dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    Email,
    InApp,
}

impl NotificationChannel {
    pub const fn label(self) -> &'static str {
        match self {
            NotificationChannel::Email => "email",
            NotificationChannel::InApp => "in_app",
        }
    }
}

/// Channel selection carried on a schedule row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleChannels {
    Email,
    InApp,
    Both,
}

impl ScheduleChannels {
    /// Expand to the concrete channels a dispatch fans out over.
    pub const fn channels(self) -> &'static [NotificationChannel] {
        match self {
            ScheduleChannels::Email => &[NotificationChannel::Email],
            ScheduleChannels::InApp => &[NotificationChannel::InApp],
            ScheduleChannels::Both => &[NotificationChannel::Email, NotificationChannel::InApp],
        }
    }
}

/// When and how an expiry reminder fires. `tenant = None` is a global
/// schedule; negative `days_before_expiry` fires after expiration.
///
/// At most one schedule may exist per (tenant, days_before_expiry) pair;
/// stores surface a conflict on violating inserts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSchedule {
    pub id: ScheduleId,
    pub tenant: Option<TenantId>,
    pub days_before_expiry: i32,
    pub notification_type: ScheduleChannels,
    pub is_active: bool,
}

/// Append-only idempotency ledger row: this (certification, schedule,
/// channel) triple has been dispatched. Never mutated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationLogEntry {
    pub certification: CertificationId,
    pub schedule: ScheduleId,
    pub channel: NotificationChannel,
    pub sent_at: DateTime<Utc>,
}

/// Category of an in-app notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    CertificationExpiry,
}

/// User-facing in-app notification. Mutated only by read-marking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub recipient: CoachId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Outbound email payload handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// Title and message copy for an expiry reminder at a given day offset.
pub fn expiry_copy(
    days_before_expiry: i32,
    type_name: &str,
    expiration: NaiveDate,
) -> (String, String) {
    let title = if days_before_expiry < 0 {
        "Certification Expired".to_string()
    } else if days_before_expiry == 0 {
        "Certification Expiring Today".to_string()
    } else {
        format!("Certification Expiring in {days_before_expiry} Days")
    };

    let message = if days_before_expiry < 0 {
        format!("Your {type_name} certification expired on {expiration}.")
    } else {
        format!("Your {type_name} certification expires on {expiration}.")
    };

    (title, message)
}
