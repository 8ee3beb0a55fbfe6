//! Timezone resolution and wall-clock to UTC projection.
//!
//! Weekly windows are wall-clock values in the provider's zone; blocks and appointments
//! are UTC instants. Everything here converts between the two for a given calendar date.

use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::clock::TimeOfDay;
use crate::dst::DstPolicy;
use crate::error::{Result, SchedulingError};

/// What to do with a zone name that is not a known IANA identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimezonePolicy {
    /// Fall back to UTC and log a warning.
    #[default]
    Lenient,
    /// Fail with [`SchedulingError::InvalidTimezone`].
    Strict,
}

/// Resolve an IANA zone name under the given policy.
pub fn resolve_timezone(name: &str, policy: TimezonePolicy) -> Result<Tz> {
    match name.trim().parse::<Tz>() {
        Ok(tz) => Ok(tz),
        Err(_) => match policy {
            TimezonePolicy::Strict => Err(SchedulingError::InvalidTimezone(name.to_string())),
            TimezonePolicy::Lenient => {
                warn!(timezone = name, "unresolvable timezone, falling back to UTC");
                Ok(Tz::UTC)
            }
        },
    }
}

/// Resolve a wall-clock time on `date` in `tz` to a UTC instant.
///
/// `24:00` resolves to midnight of the following day. Returns `None` when the time falls
/// in a DST gap and the policy is [`DstPolicy::Skip`].
pub fn local_to_utc(date: NaiveDate, time: TimeOfDay, tz: Tz, policy: DstPolicy) -> Option<DateTime<Utc>> {
    local_minutes_to_utc(date, time.minutes(), tz, policy)
}

/// Same as [`local_to_utc`] with the wall-clock time given as minutes after local midnight.
pub(crate) fn local_minutes_to_utc(
    date: NaiveDate,
    minutes: u32,
    tz: Tz,
    policy: DstPolicy,
) -> Option<DateTime<Utc>> {
    let naive = date.and_hms_opt(0, 0, 0)? + Duration::minutes(i64::from(minutes));
    resolve_naive(naive, tz, policy)
}

fn resolve_naive(naive: NaiveDateTime, tz: Tz, policy: DstPolicy) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => match policy {
            DstPolicy::Skip => None,
            DstPolicy::ShiftForward => {
                // Gaps are at most a few hours; walk forward a minute at a time.
                (1..=24 * 60).find_map(|offset| {
                    tz.from_local_datetime(&(naive + Duration::minutes(offset)))
                        .earliest()
                        .map(|dt| dt.with_timezone(&Utc))
                })
            }
        },
    }
}

/// UTC bounds of the local calendar day `date` in `tz`, as `[midnight, next midnight)`.
///
/// A day whose midnight is skipped by DST starts at the first valid instant.
pub fn day_bounds(date: NaiveDate, tz: Tz) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let start = local_to_utc(date, TimeOfDay::MIDNIGHT, tz, DstPolicy::ShiftForward);
    let end = local_to_utc(date, TimeOfDay::END_OF_DAY, tz, DstPolicy::ShiftForward);
    match (start, end) {
        (Some(start), Some(end)) if start < end => Ok((start, end)),
        _ => Err(SchedulingError::Validation(format!(
            "cannot compute day bounds for {} in {}",
            date, tz
        ))),
    }
}

/// Local weekday and wall-clock time of a UTC instant.
pub fn to_local(instant: DateTime<Utc>, tz: Tz) -> (NaiveDate, Weekday, TimeOfDay) {
    let local = instant.with_timezone(&tz);
    let naive = local.naive_local();
    (naive.date(), local.weekday(), TimeOfDay::from_naive(naive.time()))
}
