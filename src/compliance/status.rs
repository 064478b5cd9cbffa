//! Certification status classification.
//!
//! The pure function the rest of the engine composes: map an optional
//! expiration date to a status relative to a reference date and a lookahead
//! window. Date-only comparisons; time-of-day never participates.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Default number of days before expiration a certification is flagged as
/// expiring.
pub const DEFAULT_LOOKAHEAD_DAYS: i64 = 30;

/// Computed lifecycle state of a certification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificationStatus {
    Valid,
    Expiring,
    Expired,
    NoExpiry,
}

impl CertificationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            CertificationStatus::Valid => "valid",
            CertificationStatus::Expiring => "expiring",
            CertificationStatus::Expired => "expired",
            CertificationStatus::NoExpiry => "no_expiry",
        }
    }

    /// Whether the certification still satisfies a requirement.
    pub const fn is_satisfied(self) -> bool {
        !matches!(self, CertificationStatus::Expired)
    }

    /// Whether the certification belongs on an attention list.
    pub const fn needs_attention(self) -> bool {
        matches!(
            self,
            CertificationStatus::Expiring | CertificationStatus::Expired
        )
    }
}

/// Classify an expiration date against a reference date.
///
/// - `None` expiration is a non-expiring credential ([`CertificationStatus::NoExpiry`],
///   which is valid everywhere compliance is computed).
/// - Strictly before the reference date is [`CertificationStatus::Expired`].
/// - Within `[reference, reference + lookahead_days]` is
///   [`CertificationStatus::Expiring`] (the reference day itself counts).
/// - Anything later is [`CertificationStatus::Valid`].
pub fn classify(
    expiration: Option<NaiveDate>,
    reference: NaiveDate,
    lookahead_days: i64,
) -> CertificationStatus {
    let Some(expiration) = expiration else {
        return CertificationStatus::NoExpiry;
    };

    if expiration < reference {
        return CertificationStatus::Expired;
    }

    let window_end = Duration::try_days(lookahead_days)
        .and_then(|window| reference.checked_add_signed(window));
    match window_end {
        Some(window_end) if expiration > window_end => CertificationStatus::Valid,
        // A window that runs off the calendar covers every future date.
        _ => CertificationStatus::Expiring,
    }
}
