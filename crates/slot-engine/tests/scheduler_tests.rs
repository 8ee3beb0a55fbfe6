//! Tests for the scheduling facade: booking, rescheduling, status transitions, and the
//! configuration changes that feed slot generation.

use std::sync::Arc;
use std::thread;

use chrono::{DateTime, NaiveDate, TimeZone, Utc, Weekday};
use slot_engine::store::AppointmentStore;
use slot_engine::{
    AppointmentStatus, EngineConfig, ErrorKind, MemoryStore, NewAppointment,
    NewAvailabilityWindow, NewBlockedRange, ProviderId, Scheduler, TimeOfDay, TimezonePolicy,
};

// ── Helpers ─────────────────────────────────────────────────────────────────

fn at(hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 16, hour, min, 0).unwrap()
}

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 16).unwrap()
}

fn tod(s: &str) -> TimeOfDay {
    s.parse().unwrap()
}

/// Scheduler over a fresh store with Monday 09:00-12:00 (UTC) for one provider.
fn setup() -> (Scheduler<MemoryStore>, ProviderId) {
    let scheduler = Scheduler::new(MemoryStore::new(), EngineConfig::default());
    let provider = ProviderId::new_v4();
    scheduler
        .add_window(NewAvailabilityWindow::new(provider, Weekday::Mon, tod("09:00"), tod("12:00")))
        .unwrap();
    (scheduler, provider)
}

// ── Create ──────────────────────────────────────────────────────────────────

#[test]
fn create_inside_window_succeeds() {
    let (scheduler, provider) = setup();

    let appt = scheduler
        .create_appointment(NewAppointment::new(provider, at(10, 0), at(11, 0)))
        .unwrap();

    assert_eq!(appt.status, AppointmentStatus::Scheduled);
    assert_eq!(appt.provider_id, provider);
    assert_eq!(scheduler.store().get_appointment(appt.id).unwrap(), appt);
}

#[test]
fn create_overlapping_existing_is_conflict() {
    let (scheduler, provider) = setup();
    scheduler
        .create_appointment(NewAppointment::new(provider, at(10, 0), at(11, 0)))
        .unwrap();

    let err = scheduler
        .create_appointment(NewAppointment::new(provider, at(10, 30), at(11, 30)))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[test]
fn create_outside_window_is_unavailable() {
    let (scheduler, provider) = setup();

    let err = scheduler
        .create_appointment(NewAppointment::new(provider, at(13, 0), at(14, 0)))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Unavailable);
    assert!(scheduler
        .store()
        .list_appointments_overlapping(provider, at(0, 0), at(23, 59))
        .unwrap()
        .is_empty());
}

#[test]
fn create_running_seconds_past_window_is_unavailable() {
    let (scheduler, provider) = setup();
    let end = at(12, 0) + chrono::Duration::seconds(45);

    assert!(!scheduler.is_slot_available(provider, at(11, 0), end).unwrap());
    let err = scheduler
        .create_appointment(NewAppointment::new(provider, at(11, 0), end))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Unavailable);
}

#[test]
fn create_inside_block_is_unavailable() {
    let (scheduler, provider) = setup();
    scheduler
        .add_blocked_range(NewBlockedRange {
            provider_id: provider,
            start: at(9, 0),
            end: at(12, 0),
            reason: Some("court".to_string()),
        })
        .unwrap();

    let err = scheduler
        .create_appointment(NewAppointment::new(provider, at(9, 0), at(10, 0)))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Unavailable);
}

#[test]
fn create_with_inverted_range_is_validation_error() {
    let (scheduler, provider) = setup();

    let err = scheduler
        .create_appointment(NewAppointment::new(provider, at(11, 0), at(10, 0)))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn booked_slot_disappears_from_generated_slots() {
    let (scheduler, provider) = setup();
    scheduler
        .create_appointment(NewAppointment::new(provider, at(10, 0), at(11, 0)))
        .unwrap();

    let slots = scheduler.generate_slots(provider, monday(), 60, "UTC").unwrap();

    assert_eq!(slots.len(), 2);
    assert_eq!(slots[0].start, at(9, 0));
    assert_eq!(slots[1].start, at(11, 0));
}

#[test]
fn concurrent_bookings_for_same_slot_admit_exactly_one() {
    let (scheduler, provider) = setup();
    let scheduler = Arc::new(scheduler);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let scheduler = Arc::clone(&scheduler);
            thread::spawn(move || {
                scheduler.create_appointment(NewAppointment::new(provider, at(10, 0), at(11, 0)))
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }
}

// ── Reschedule ──────────────────────────────────────────────────────────────

#[test]
fn reschedule_onto_own_range_succeeds() {
    let (scheduler, provider) = setup();
    let appt = scheduler
        .create_appointment(NewAppointment::new(provider, at(10, 0), at(11, 0)))
        .unwrap();

    // Shift by 30 minutes: overlaps only its own old range
    let moved = scheduler
        .reschedule_appointment(appt.id, at(10, 30), at(11, 30))
        .unwrap();

    assert_eq!(moved.start, at(10, 30));
    assert_eq!(moved.end, at(11, 30));
    assert_eq!(moved.status, AppointmentStatus::Scheduled);
}

#[test]
fn reschedule_onto_other_appointment_is_conflict() {
    let (scheduler, provider) = setup();
    let first = scheduler
        .create_appointment(NewAppointment::new(provider, at(9, 0), at(10, 0)))
        .unwrap();
    scheduler
        .create_appointment(NewAppointment::new(provider, at(11, 0), at(12, 0)))
        .unwrap();

    let err = scheduler
        .reschedule_appointment(first.id, at(10, 30), at(11, 30))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Conflict);
    let unchanged = scheduler.store().get_appointment(first.id).unwrap();
    assert_eq!(unchanged.start, at(9, 0));
}

#[test]
fn reschedule_cancelled_is_state_error_without_mutation() {
    let (scheduler, provider) = setup();
    let appt = scheduler
        .create_appointment(NewAppointment::new(provider, at(10, 0), at(11, 0)))
        .unwrap();
    scheduler.cancel_appointment(appt.id).unwrap();

    let err = scheduler
        .reschedule_appointment(appt.id, at(9, 0), at(10, 0))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::State);
    let stored = scheduler.store().get_appointment(appt.id).unwrap();
    assert_eq!(stored.start, at(10, 0));
    assert_eq!(stored.end, at(11, 0));
}

#[test]
fn reschedule_unknown_appointment_is_not_found() {
    let (scheduler, _) = setup();

    let err = scheduler
        .reschedule_appointment(slot_engine::AppointmentId::new_v4(), at(9, 0), at(10, 0))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
}

// ── Status transitions ──────────────────────────────────────────────────────

#[test]
fn cancel_frees_capacity() {
    let (scheduler, provider) = setup();
    let appt = scheduler
        .create_appointment(NewAppointment::new(provider, at(10, 0), at(11, 0)))
        .unwrap();

    let cancelled = scheduler.cancel_appointment(appt.id).unwrap();

    assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
    assert!(scheduler.is_slot_available(provider, at(10, 0), at(11, 0)).unwrap());
    scheduler
        .create_appointment(NewAppointment::new(provider, at(10, 0), at(11, 0)))
        .unwrap();
}

#[test]
fn cancelling_twice_is_state_error() {
    let (scheduler, provider) = setup();
    let appt = scheduler
        .create_appointment(NewAppointment::new(provider, at(10, 0), at(11, 0)))
        .unwrap();
    scheduler.cancel_appointment(appt.id).unwrap();

    let err = scheduler.cancel_appointment(appt.id).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::State);
}

#[test]
fn terminal_states_reject_further_transitions() {
    let (scheduler, provider) = setup();
    let completed = scheduler
        .create_appointment(NewAppointment::new(provider, at(9, 0), at(10, 0)))
        .unwrap();
    let missed = scheduler
        .create_appointment(NewAppointment::new(provider, at(10, 0), at(11, 0)))
        .unwrap();

    scheduler.complete_appointment(completed.id).unwrap();
    scheduler.mark_no_show(missed.id).unwrap();

    assert_eq!(scheduler.cancel_appointment(completed.id).unwrap_err().kind(), ErrorKind::State);
    assert_eq!(scheduler.cancel_appointment(missed.id).unwrap_err().kind(), ErrorKind::State);
}

#[test]
fn scheduled_is_not_a_transition_target() {
    let (scheduler, provider) = setup();
    let appt = scheduler
        .create_appointment(NewAppointment::new(provider, at(10, 0), at(11, 0)))
        .unwrap();

    let err = scheduler
        .transition_status(appt.id, AppointmentStatus::Scheduled)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
}

// ── Availability checks ─────────────────────────────────────────────────────

#[test]
fn availability_check_outside_window_is_false() {
    let (scheduler, provider) = setup();

    assert!(!scheduler.is_slot_available(provider, at(13, 0), at(14, 0)).unwrap());
    assert!(scheduler.is_slot_available(provider, at(9, 0), at(10, 0)).unwrap());
}

#[test]
fn conflict_check_with_exclusion() {
    let (scheduler, provider) = setup();
    let appt = scheduler
        .create_appointment(NewAppointment::new(provider, at(10, 0), at(11, 0)))
        .unwrap();

    assert!(scheduler
        .has_appointment_conflict(provider, at(10, 30), at(11, 30), None)
        .unwrap());
    assert!(!scheduler
        .has_appointment_conflict(provider, at(10, 30), at(11, 30), Some(appt.id))
        .unwrap());
}

#[test]
fn provider_zone_drives_availability() {
    let (scheduler, provider) = setup();
    scheduler
        .store()
        .set_provider_timezone(provider, "America/New_York")
        .unwrap();

    // 09:00-10:00 New York (EDT) is 13:00-14:00 UTC
    assert!(scheduler.is_slot_available(provider, at(13, 0), at(14, 0)).unwrap());
    assert!(!scheduler.is_slot_available(provider, at(9, 0), at(10, 0)).unwrap());

    let slots = scheduler
        .generate_slots_for_provider(provider, monday(), Some(60))
        .unwrap();
    assert_eq!(slots[0].start, at(13, 0));
}

#[test]
fn unknown_zone_falls_back_to_utc_when_lenient() {
    let (scheduler, provider) = setup();

    let slots = scheduler
        .generate_slots(provider, monday(), 60, "Mars/Olympus_Mons")
        .unwrap();

    assert_eq!(slots.len(), 3);
    assert_eq!(slots[0].start, at(9, 0));
}

#[test]
fn unknown_zone_is_error_when_strict() {
    let config = EngineConfig {
        timezone_policy: TimezonePolicy::Strict,
        ..EngineConfig::default()
    };
    let scheduler = Scheduler::new(MemoryStore::new(), config);

    let err = scheduler
        .generate_slots(ProviderId::new_v4(), monday(), 60, "Mars/Olympus_Mons")
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Timezone);
}

#[test]
fn slot_duration_limits_enforced() {
    let (scheduler, provider) = setup();

    assert_eq!(
        scheduler.generate_slots(provider, monday(), 0, "UTC").unwrap_err().kind(),
        ErrorKind::Validation
    );
    assert_eq!(
        scheduler.generate_slots(provider, monday(), 24 * 60 + 1, "UTC").unwrap_err().kind(),
        ErrorKind::Validation
    );
}

#[test]
fn default_slot_length_comes_from_config() {
    let (scheduler, provider) = setup();

    let slots = scheduler.generate_slots_for_provider(provider, monday(), None).unwrap();

    // 30-minute default over 09:00-12:00
    assert_eq!(slots.len(), 6);
}

#[test]
fn next_available_slot_skips_booked_and_empty_days() {
    let (scheduler, provider) = setup();
    scheduler
        .create_appointment(NewAppointment::new(provider, at(9, 0), at(12, 0)))
        .unwrap();

    // Monday fully booked; next Monday is the following week
    let next = scheduler
        .next_available_slot(provider, at(8, 0), 60)
        .unwrap()
        .unwrap();

    assert_eq!(next.start, Utc.with_ymd_and_hms(2026, 3, 23, 9, 0, 0).unwrap());
}

#[test]
fn next_available_slot_respects_not_before() {
    let (scheduler, provider) = setup();

    let next = scheduler
        .next_available_slot(provider, at(10, 15), 60)
        .unwrap()
        .unwrap();

    assert_eq!(next.start, at(11, 0));
}

#[test]
fn open_ranges_through_facade() {
    let (scheduler, provider) = setup();
    scheduler
        .create_appointment(NewAppointment::new(provider, at(10, 0), at(11, 0)))
        .unwrap();

    let open = scheduler.open_ranges(provider, monday()).unwrap();

    assert_eq!(open.len(), 2);
    assert_eq!(open[0].end, at(10, 0));
    assert_eq!(open[1].start, at(11, 0));
}

// ── Windows ─────────────────────────────────────────────────────────────────

#[test]
fn overlapping_window_rejected_as_conflict() {
    let (scheduler, provider) = setup();

    let err = scheduler
        .add_window(NewAvailabilityWindow::new(provider, Weekday::Mon, tod("11:00"), tod("13:00")))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[test]
fn replace_window_may_overlap_its_old_self() {
    let (scheduler, provider) = setup();
    let window = scheduler.list_windows(provider).unwrap().remove(0);

    let replaced = scheduler
        .replace_window(
            window.id,
            NewAvailabilityWindow::new(provider, Weekday::Mon, tod("08:00"), tod("12:30")),
        )
        .unwrap();

    assert_eq!(replaced.id, window.id);
    assert_eq!(replaced.start, tod("08:00"));
    assert_eq!(scheduler.list_windows(provider).unwrap().len(), 1);
}

#[test]
fn replace_window_cannot_change_provider() {
    let (scheduler, provider) = setup();
    let window = scheduler.list_windows(provider).unwrap().remove(0);

    let err = scheduler
        .replace_window(
            window.id,
            NewAvailabilityWindow::new(ProviderId::new_v4(), Weekday::Mon, tod("08:00"), tod("12:00")),
        )
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn removing_window_removes_slots() {
    let (scheduler, provider) = setup();
    let window = scheduler.list_windows(provider).unwrap().remove(0);

    scheduler.remove_window(window.id).unwrap();

    assert!(scheduler.generate_slots(provider, monday(), 60, "UTC").unwrap().is_empty());
    assert_eq!(scheduler.remove_window(window.id).unwrap_err().kind(), ErrorKind::NotFound);
}

#[test]
fn seeding_defaults_is_guarded() {
    let scheduler = Scheduler::new(MemoryStore::new(), EngineConfig::default());
    let provider = ProviderId::new_v4();

    assert_eq!(scheduler.seed_default_availability(provider).unwrap().len(), 10);
    assert!(scheduler.seed_default_availability(provider).unwrap().is_empty());

    // Default afternoon block: 14:00-17:00 in hour slots
    let slots = scheduler.generate_slots(provider, monday(), 60, "UTC").unwrap();
    assert_eq!(slots.len(), 6);
}
