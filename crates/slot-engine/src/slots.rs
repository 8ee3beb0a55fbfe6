//! Generate bookable slots for a provider's local calendar day.
//!
//! Availability windows for the day's weekday are walked in fixed steps of wall-clock
//! time; each candidate is projected to UTC and dropped if it touches a blocked range
//! or a non-cancelled appointment. The free-range view merges the busy periods first
//! and returns the gaps inside each window.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::dst::DstPolicy;
use crate::error::{Result, SchedulingError};
use crate::interval::TimeRange;
use crate::model::{Appointment, AppointmentStatus, AvailabilityWindow, BlockedRange, ProviderId, Slot};
use crate::store::{AppointmentStore, AvailabilityStore, BlockStore};
use crate::timezone::{day_bounds, local_minutes_to_utc, local_to_utc};

/// Longest date span accepted by [`generate_slots_in_range`].
pub const MAX_RANGE_DAYS: i64 = 62;

/// Longest slot the per-day walk accepts.
pub const MAX_SLOT_MINUTES: u32 = 24 * 60;

/// Everything slot generation needs for one local day.
struct DayPlan {
    date: NaiveDate,
    windows: Vec<AvailabilityWindow>,
    blocks: Vec<BlockedRange>,
    appointments: Vec<Appointment>,
}

fn load_day<S>(store: &S, provider: ProviderId, date: NaiveDate, tz: Tz) -> Result<Option<DayPlan>>
where
    S: AvailabilityStore + BlockStore + AppointmentStore + ?Sized,
{
    let windows = store.list_windows_for_day(provider, date.weekday())?;
    // Nothing to walk: skip the block and appointment reads entirely.
    if windows.is_empty() {
        return Ok(None);
    }

    let (day_start, day_end) = day_bounds(date, tz)?;
    let blocks = store.list_blocks_overlapping(provider, day_start, day_end)?;
    let mut appointments = store.list_appointments_overlapping(provider, day_start, day_end)?;
    appointments.retain(|a| a.status != AppointmentStatus::Cancelled);

    Ok(Some(DayPlan {
        date,
        windows,
        blocks,
        appointments,
    }))
}

fn validate_duration(slot_minutes: u32) -> Result<()> {
    if slot_minutes == 0 || slot_minutes > MAX_SLOT_MINUTES {
        return Err(SchedulingError::Validation(format!(
            "slot duration must be between 1 and {} minutes, got {}",
            MAX_SLOT_MINUTES, slot_minutes
        )));
    }
    Ok(())
}

/// Project a window onto `date` in `tz`. `None` when a boundary is lost to a DST gap.
fn window_range(window: &AvailabilityWindow, date: NaiveDate, tz: Tz, dst: DstPolicy) -> Option<TimeRange> {
    let start = local_to_utc(date, window.start, tz, dst)?;
    let end = local_to_utc(date, window.end, tz, dst)?;
    (start < end).then_some(TimeRange { start, end })
}

impl DayPlan {
    fn is_excluded(&self, slot: &TimeRange) -> bool {
        self.blocks.iter().any(|b| b.range().overlaps(slot))
            || self.appointments.iter().any(|a| a.range().overlaps(slot))
    }

    fn slots(&self, slot_minutes: u32, tz: Tz, dst: DstPolicy) -> Vec<Slot> {
        let step = slot_minutes;
        let mut slots = Vec::new();

        for window in &self.windows {
            let mut cursor = window.start.minutes();
            // The last slot may end exactly on the window's end.
            while cursor + step <= window.end.minutes() {
                let start = local_minutes_to_utc(self.date, cursor, tz, dst);
                let end = local_minutes_to_utc(self.date, cursor + step, tz, dst);
                cursor += step;

                let (Some(start), Some(end)) = (start, end) else {
                    continue;
                };
                // A fall-back overlap would otherwise stretch the slot past its length.
                let end = end.min(start + Duration::minutes(i64::from(step)));
                let slot = TimeRange { start, end };
                if start < end && !self.is_excluded(&slot) {
                    slots.push(slot);
                }
            }
        }

        slots
    }

    fn open_ranges(&self, tz: Tz, dst: DstPolicy) -> Vec<TimeRange> {
        let busy = self.busy_periods();
        let mut open = Vec::new();
        for window in &self.windows {
            let Some(range) = window_range(window, self.date, tz, dst) else {
                continue;
            };
            open.extend(free_gaps(&busy, range));
        }
        open
    }

    fn busy_periods(&self) -> Vec<TimeRange> {
        self.blocks
            .iter()
            .map(BlockedRange::range)
            .chain(self.appointments.iter().map(Appointment::range))
            .collect()
    }
}

/// Merge overlapping or adjacent busy periods, clipped to `window`.
///
/// Returns a sorted, non-overlapping list.
fn merge_busy_periods(busy: &[TimeRange], window: TimeRange) -> Vec<TimeRange> {
    let mut intervals: Vec<TimeRange> = busy
        .iter()
        .filter(|b| b.overlaps(&window))
        .map(|b| TimeRange {
            start: b.start.max(window.start),
            end: b.end.min(window.end),
        })
        .collect();

    intervals.sort();

    let mut merged: Vec<TimeRange> = Vec::new();
    for interval in intervals {
        if let Some(last) = merged.last_mut() {
            if interval.start <= last.end {
                last.end = last.end.max(interval.end);
                continue;
            }
        }
        merged.push(interval);
    }

    merged
}

/// Gaps inside `window` left uncovered by `busy`, in order.
fn free_gaps(busy: &[TimeRange], window: TimeRange) -> Vec<TimeRange> {
    let mut gaps = Vec::new();
    let mut cursor: DateTime<Utc> = window.start;

    for period in merge_busy_periods(busy, window) {
        if cursor < period.start {
            gaps.push(TimeRange {
                start: cursor,
                end: period.start,
            });
        }
        cursor = cursor.max(period.end);
    }

    if cursor < window.end {
        gaps.push(TimeRange {
            start: cursor,
            end: window.end,
        });
    }

    gaps
}

/// Bookable slots of `slot_minutes` on local day `date` in `tz`, in chronological order.
///
/// A slot is kept only if it fits entirely inside an active window for the weekday and
/// overlaps no blocked range and no non-cancelled appointment. A day with no windows
/// yields an empty list.
///
/// # Errors
/// Returns `SchedulingError::Validation` if `slot_minutes` is zero or longer than a day.
pub fn generate_slots<S>(
    store: &S,
    provider: ProviderId,
    date: NaiveDate,
    slot_minutes: u32,
    tz: Tz,
    dst: DstPolicy,
) -> Result<Vec<Slot>>
where
    S: AvailabilityStore + BlockStore + AppointmentStore + ?Sized,
{
    validate_duration(slot_minutes)?;
    let Some(plan) = load_day(store, provider, date, tz)? else {
        debug!(%provider, %date, "no availability windows for weekday");
        return Ok(Vec::new());
    };
    let slots = plan.slots(slot_minutes, tz, dst);
    debug!(%provider, %date, count = slots.len(), "generated slots");
    Ok(slots)
}

/// Slots for every local day in `from..=to`, concatenated in date order.
///
/// # Errors
/// Returns `SchedulingError::Validation` if `to` precedes `from`, the span exceeds
/// [`MAX_RANGE_DAYS`], or `slot_minutes` is out of range.
pub fn generate_slots_in_range<S>(
    store: &S,
    provider: ProviderId,
    from: NaiveDate,
    to: NaiveDate,
    slot_minutes: u32,
    tz: Tz,
    dst: DstPolicy,
) -> Result<Vec<Slot>>
where
    S: AvailabilityStore + BlockStore + AppointmentStore + ?Sized,
{
    let span = (to - from).num_days();
    if span < 0 {
        return Err(SchedulingError::Validation(format!(
            "range end {} is before start {}",
            to, from
        )));
    }
    if span >= MAX_RANGE_DAYS {
        return Err(SchedulingError::Validation(format!(
            "date range spans {} days, limit is {}",
            span + 1,
            MAX_RANGE_DAYS
        )));
    }

    let mut slots = Vec::new();
    for date in from.iter_days().take(span as usize + 1) {
        slots.extend(generate_slots(store, provider, date, slot_minutes, tz, dst)?);
    }
    Ok(slots)
}

/// Maximal free sub-ranges of each availability window on `date`, after removing
/// blocked ranges and non-cancelled appointments.
pub fn open_ranges_for_day<S>(
    store: &S,
    provider: ProviderId,
    date: NaiveDate,
    tz: Tz,
    dst: DstPolicy,
) -> Result<Vec<TimeRange>>
where
    S: AvailabilityStore + BlockStore + AppointmentStore + ?Sized,
{
    Ok(load_day(store, provider, date, tz)?
        .map(|plan| plan.open_ranges(tz, dst))
        .unwrap_or_default())
}
