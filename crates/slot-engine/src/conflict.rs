//! Detect collisions between a candidate range and a provider's existing bookings.
//!
//! Adjacent ranges (where one ends exactly when another starts) are NOT conflicts.
//! Cancelled and no-show appointments never conflict.

use chrono_tz::Tz;

use crate::availability::is_within_availability;
use crate::error::Result;
use crate::interval::TimeRange;
use crate::model::{Appointment, AppointmentId, ProviderId};
use crate::store::{AppointmentStore, AvailabilityStore, BlockStore};
use crate::timezone::to_local;

/// An active appointment colliding with a candidate range.
#[derive(Debug, Clone, PartialEq)]
pub struct Conflict {
    pub appointment: Appointment,
    pub overlap_minutes: i64,
}

/// Outcome of the full legality check for a candidate range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotCheck {
    Available,
    /// Outside every availability window for the local weekday.
    OutsideAvailability,
    /// Inside a blocked range.
    Blocked,
    /// Overlaps an active appointment.
    Booked,
}

impl SlotCheck {
    pub fn is_available(self) -> bool {
        self == SlotCheck::Available
    }
}

/// All active appointments of `provider` overlapping `range`, except `exclude`.
pub fn find_appointment_conflicts<S>(
    store: &S,
    provider: ProviderId,
    range: &TimeRange,
    exclude: Option<AppointmentId>,
) -> Result<Vec<Conflict>>
where
    S: AppointmentStore + ?Sized,
{
    let appointments = store.list_appointments_overlapping(provider, range.start, range.end)?;
    Ok(appointments
        .into_iter()
        .filter(|a| a.status.is_active() && Some(a.id) != exclude)
        .filter_map(|a| {
            let overlap_minutes = a.range().overlap_minutes(range);
            a.range().overlaps(range).then_some(Conflict {
                appointment: a,
                overlap_minutes,
            })
        })
        .collect())
}

/// Whether `range` collides with an active appointment other than `exclude`.
pub fn has_appointment_conflict<S>(
    store: &S,
    provider: ProviderId,
    range: &TimeRange,
    exclude: Option<AppointmentId>,
) -> Result<bool>
where
    S: AppointmentStore + ?Sized,
{
    Ok(!find_appointment_conflicts(store, provider, range, exclude)?.is_empty())
}

/// Whether `range` collides with any blocked range of `provider`.
pub fn has_blocked_conflict<S>(store: &S, provider: ProviderId, range: &TimeRange) -> Result<bool>
where
    S: BlockStore + ?Sized,
{
    let blocks = store.list_blocks_overlapping(provider, range.start, range.end)?;
    Ok(blocks.iter().any(|b| b.range().overlaps(range)))
}

/// Classify `range` against availability (in `tz`), blocks, and active appointments.
///
/// `exclude` lets an appointment being moved ignore its own current booking.
pub fn check_slot<S>(
    store: &S,
    provider: ProviderId,
    range: &TimeRange,
    tz: Tz,
    exclude: Option<AppointmentId>,
) -> Result<SlotCheck>
where
    S: AvailabilityStore + BlockStore + AppointmentStore + ?Sized,
{
    let (_, weekday, _) = to_local(range.start, tz);
    let windows = store.list_windows_for_day(provider, weekday)?;
    if !is_within_availability(&windows, range, tz) {
        return Ok(SlotCheck::OutsideAvailability);
    }
    if has_blocked_conflict(store, provider, range)? {
        return Ok(SlotCheck::Blocked);
    }
    if has_appointment_conflict(store, provider, range, exclude)? {
        return Ok(SlotCheck::Booked);
    }
    Ok(SlotCheck::Available)
}

/// True only when `range` is inside availability and free of blocks and active
/// appointments. Read-only: nothing is reserved.
pub fn is_slot_available<S>(store: &S, provider: ProviderId, range: &TimeRange, tz: Tz) -> Result<bool>
where
    S: AvailabilityStore + BlockStore + AppointmentStore + ?Sized,
{
    Ok(check_slot(store, provider, range, tz, None)?.is_available())
}
