//! Weekly availability: the default onboarding template, overlap validation for window
//! changes, and the containment test that decides whether a UTC range falls inside a
//! provider's working hours.

use chrono::{DateTime, Duration, Utc, Weekday};
use chrono_tz::Tz;

use crate::clock::TimeOfDay;
use crate::error::Result;
use crate::interval::{overlaps, TimeRange};
use crate::model::{AvailabilityWindow, NewAvailabilityWindow, ProviderId, WindowId};
use crate::store::AvailabilityStore;
use crate::timezone::to_local;

const DEFAULT_DAYS: [Weekday; 5] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
];

/// Morning and afternoon blocks applied to each default weekday.
const DEFAULT_BLOCKS: [(TimeOfDay, TimeOfDay); 2] = [
    (TimeOfDay::at(9, 0), TimeOfDay::at(12, 0)),
    (TimeOfDay::at(14, 0), TimeOfDay::at(17, 0)),
];

/// The onboarding template: Monday through Friday, 09:00-12:00 and 14:00-17:00.
pub fn default_template(provider: ProviderId) -> Vec<NewAvailabilityWindow> {
    DEFAULT_DAYS
        .iter()
        .flat_map(|day| {
            DEFAULT_BLOCKS
                .iter()
                .map(move |&(start, end)| NewAvailabilityWindow::new(provider, *day, start, end))
        })
        .collect()
}

/// Insert the default template unconditionally.
///
/// Calling this twice duplicates every window; use [`seed_defaults_if_empty`] unless the
/// caller has already checked.
pub fn seed_defaults<S>(store: &S, provider: ProviderId) -> Result<Vec<AvailabilityWindow>>
where
    S: AvailabilityStore + ?Sized,
{
    default_template(provider)
        .into_iter()
        .map(|window| store.create_window(window).map_err(Into::into))
        .collect()
}

/// Seed the default template only if the provider has no windows at all.
///
/// Returns the windows that were created (empty when the provider was already configured).
pub fn seed_defaults_if_empty<S>(store: &S, provider: ProviderId) -> Result<Vec<AvailabilityWindow>>
where
    S: AvailabilityStore + ?Sized,
{
    if !store.list_windows(provider)?.is_empty() {
        return Ok(Vec::new());
    }
    seed_defaults(store, provider)
}

/// Does a window `[start, end)` on `weekday` overlap another window of the same provider?
///
/// `exclude` skips the window being replaced so an update does not collide with itself.
/// Inactive windows still count: reactivating one must not create a silent overlap.
pub fn check_availability_overlap<S>(
    store: &S,
    provider: ProviderId,
    weekday: Weekday,
    start: TimeOfDay,
    end: TimeOfDay,
    exclude: Option<WindowId>,
) -> Result<bool>
where
    S: AvailabilityStore + ?Sized,
{
    let windows = store.list_windows(provider)?;
    Ok(windows.iter().any(|w| {
        w.weekday == weekday && Some(w.id) != exclude && overlaps(start, end, w.start, w.end)
    }))
}

/// Whether `range`, projected into `tz`, sits inside one of `windows`.
///
/// The range must start and end on the same local day; an end at exactly the next local
/// midnight counts as `24:00`. Only active windows on the start's weekday are considered.
pub fn is_within_availability(windows: &[AvailabilityWindow], range: &TimeRange, tz: Tz) -> bool {
    let Some((weekday, start, end)) = local_span(range.start, range.end, tz) else {
        return false;
    };
    windows
        .iter()
        .any(|w| w.active && w.weekday == weekday && w.start <= start && w.end >= end)
}

/// The start is floored and the end ceiled to whole minutes, so the span never shrinks.
fn local_span(start: DateTime<Utc>, end: DateTime<Utc>, tz: Tz) -> Option<(Weekday, TimeOfDay, TimeOfDay)> {
    let (start_date, weekday, start_time) = to_local(start, tz);
    let end_local = end.with_timezone(&tz).naive_local();
    let end_date = end_local.date();
    let end_time = TimeOfDay::from_naive_ceil(end_local.time());
    if end_date == start_date {
        return Some((weekday, start_time, end_time));
    }
    if end_date == start_date + Duration::days(1) && end_time == TimeOfDay::MIDNIGHT {
        return Some((weekday, start_time, TimeOfDay::END_OF_DAY));
    }
    None
}
