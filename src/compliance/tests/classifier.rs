use chrono::Duration;

use super::common::reference;
use crate::compliance::status::{classify, CertificationStatus, DEFAULT_LOOKAHEAD_DAYS};

#[test]
fn no_expiration_is_non_expiring_and_satisfied() {
    let status = classify(None, reference(), DEFAULT_LOOKAHEAD_DAYS);
    assert_eq!(status, CertificationStatus::NoExpiry);
    assert!(status.is_satisfied());
    assert!(!status.needs_attention());
}

#[test]
fn day_before_reference_is_expired() {
    let status = classify(
        Some(reference() - Duration::days(1)),
        reference(),
        DEFAULT_LOOKAHEAD_DAYS,
    );
    assert_eq!(status, CertificationStatus::Expired);
    assert!(!status.is_satisfied());
    assert!(status.needs_attention());
}

#[test]
fn reference_day_itself_is_expiring() {
    let status = classify(Some(reference()), reference(), DEFAULT_LOOKAHEAD_DAYS);
    assert_eq!(status, CertificationStatus::Expiring);
    assert!(status.is_satisfied());
}

#[test]
fn window_boundary_is_inclusive() {
    let last_day_in = reference() + Duration::days(DEFAULT_LOOKAHEAD_DAYS);
    assert_eq!(
        classify(Some(last_day_in), reference(), DEFAULT_LOOKAHEAD_DAYS),
        CertificationStatus::Expiring
    );
    assert_eq!(
        classify(
            Some(last_day_in + Duration::days(1)),
            reference(),
            DEFAULT_LOOKAHEAD_DAYS
        ),
        CertificationStatus::Valid
    );
}

#[test]
fn custom_lookahead_window_is_respected() {
    let eight_out = reference() + Duration::days(8);
    assert_eq!(
        classify(Some(eight_out), reference(), 7),
        CertificationStatus::Valid
    );
    assert_eq!(
        classify(Some(eight_out), reference(), 8),
        CertificationStatus::Expiring
    );
}

/// Moving the expiration date earlier against a fixed reference date can only
/// move the status toward expiry, never back toward valid.
#[test]
fn classification_is_monotonic_in_expiration_date() {
    fn rank(status: CertificationStatus) -> u8 {
        match status {
            CertificationStatus::Expired => 0,
            CertificationStatus::Expiring => 1,
            CertificationStatus::Valid => 2,
            CertificationStatus::NoExpiry => unreachable!("dated input"),
        }
    }

    let mut previous = None;
    for offset in -45..=45 {
        let expiration = reference() + Duration::days(offset);
        let status = classify(Some(expiration), reference(), DEFAULT_LOOKAHEAD_DAYS);
        if let Some(previous) = previous {
            assert!(
                rank(status) >= previous,
                "status regressed at offset {offset}"
            );
        }
        previous = Some(rank(status));
    }
}

#[test]
fn oversized_lookahead_windows_saturate() {
    // A window end past the calendar's range covers every future date.
    let status = classify(Some(reference() + Duration::days(10)), reference(), i64::MAX);
    assert_eq!(status, CertificationStatus::Expiring);

    let expired = classify(Some(reference() - Duration::days(1)), reference(), i64::MAX);
    assert_eq!(expired, CertificationStatus::Expired);
}

#[test]
fn repeated_calls_agree() {
    let expiration = Some(reference() + Duration::days(12));
    let first = classify(expiration, reference(), DEFAULT_LOOKAHEAD_DAYS);
    let second = classify(expiration, reference(), DEFAULT_LOOKAHEAD_DAYS);
    assert_eq!(first, second);
}
