//! Tests for the half-open overlap rule and `TimeRange` helpers.

use chrono::{TimeZone, Utc};
use slot_engine::{overlaps, ErrorKind, TimeRange};

fn range(start_hour: u32, start_min: u32, end_hour: u32, end_min: u32) -> TimeRange {
    TimeRange::new(
        Utc.with_ymd_and_hms(2026, 3, 16, start_hour, start_min, 0).unwrap(),
        Utc.with_ymd_and_hms(2026, 3, 16, end_hour, end_min, 0).unwrap(),
    )
    .unwrap()
}

#[test]
fn partial_overlap_detected() {
    let a = range(10, 0, 11, 0);
    let b = range(10, 30, 11, 30);
    assert!(a.overlaps(&b));
    assert_eq!(a.overlap_minutes(&b), 30);
}

#[test]
fn touching_ranges_do_not_overlap() {
    // 10:00-11:00 and 11:00-12:00 share only an endpoint
    let a = range(10, 0, 11, 0);
    let b = range(11, 0, 12, 0);
    assert!(!a.overlaps(&b));
    assert!(!b.overlaps(&a));
    assert_eq!(a.overlap_minutes(&b), 0);
}

#[test]
fn containing_range_overlaps_inner() {
    let outer = range(9, 0, 12, 0);
    let inner = range(10, 0, 11, 0);
    assert!(outer.overlaps(&inner));
    assert!(outer.contains(&inner));
    assert!(!inner.contains(&outer));
    assert_eq!(outer.overlap_minutes(&inner), 60);
}

#[test]
fn contains_allows_shared_endpoints() {
    let window = range(9, 0, 12, 0);
    assert!(window.contains(&range(9, 0, 10, 0)));
    assert!(window.contains(&range(11, 0, 12, 0)));
    assert!(!window.contains(&range(11, 30, 12, 30)));
}

#[test]
fn generic_overlap_works_on_plain_numbers() {
    assert!(overlaps(1, 5, 4, 8));
    assert!(!overlaps(1, 4, 4, 8));
    assert!(!overlaps(6, 8, 1, 5));
}

#[test]
fn empty_or_inverted_range_rejected() {
    let t = Utc.with_ymd_and_hms(2026, 3, 16, 10, 0, 0).unwrap();
    let err = TimeRange::new(t, t).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let earlier = Utc.with_ymd_and_hms(2026, 3, 16, 9, 0, 0).unwrap();
    assert!(TimeRange::new(t, earlier).is_err());
}

#[test]
fn duration_in_minutes() {
    assert_eq!(range(9, 0, 12, 0).duration_minutes(), 180);
    assert_eq!(range(9, 15, 9, 45).duration_minutes(), 30);
}
