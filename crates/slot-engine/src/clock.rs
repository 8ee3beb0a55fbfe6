//! Wall-clock values used by the weekly schedule: time-of-day and day-of-week.
//!
//! Times of day are held as minutes since midnight rather than compared as `"HH:MM"`
//! strings, so ordering stays correct even for input that was not zero-padded.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, SchedulingError};

const MINUTES_PER_DAY: u16 = 24 * 60;

/// A wall-clock time of day with minute precision, `00:00..=24:00`.
///
/// `24:00` is only meaningful as the end of a window and denotes the following midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    pub const MIDNIGHT: TimeOfDay = TimeOfDay(0);
    pub const END_OF_DAY: TimeOfDay = TimeOfDay(MINUTES_PER_DAY);

    /// For constants known to be in range.
    pub(crate) const fn at(hour: u16, minute: u16) -> Self {
        TimeOfDay(hour * 60 + minute)
    }

    pub fn from_hm(hour: u32, minute: u32) -> Result<Self> {
        if minute > 59 || hour > 24 || (hour == 24 && minute != 0) {
            return Err(SchedulingError::Validation(format!(
                "time of day out of range: {:02}:{:02}",
                hour, minute
            )));
        }
        Ok(TimeOfDay((hour * 60 + minute) as u16))
    }

    pub fn from_minutes(minutes: u32) -> Result<Self> {
        if minutes > u32::from(MINUTES_PER_DAY) {
            return Err(SchedulingError::Validation(format!(
                "time of day out of range: {} minutes",
                minutes
            )));
        }
        Ok(TimeOfDay(minutes as u16))
    }

    /// Truncates seconds.
    pub fn from_naive(time: NaiveTime) -> Self {
        TimeOfDay((time.hour() * 60 + time.minute()) as u16)
    }

    /// Rounds any seconds up to the next minute; `23:59:30` becomes `24:00`.
    pub fn from_naive_ceil(time: NaiveTime) -> Self {
        let floor = Self::from_naive(time);
        if time.second() == 0 && time.nanosecond() == 0 {
            floor
        } else {
            TimeOfDay(floor.0 + 1)
        }
    }

    pub fn minutes(self) -> u32 {
        u32::from(self.0)
    }

    pub fn hour(self) -> u32 {
        self.minutes() / 60
    }

    pub fn minute(self) -> u32 {
        self.minutes() % 60
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for TimeOfDay {
    type Err = SchedulingError;

    /// Parses 24-hour `"HH:MM"`; a trailing `":SS"` is accepted and ignored.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || SchedulingError::Validation(format!("invalid time of day '{}'", s));
        let mut parts = s.trim().split(':');
        let hour: u32 = parts
            .next()
            .filter(|p| !p.is_empty() && p.len() <= 2)
            .and_then(|p| p.parse().ok())
            .ok_or_else(invalid)?;
        let minute: u32 = parts
            .next()
            .filter(|p| p.len() == 2)
            .and_then(|p| p.parse().ok())
            .ok_or_else(invalid)?;
        if let Some(seconds) = parts.next() {
            seconds
                .parse::<u32>()
                .ok()
                .filter(|s| *s < 60)
                .ok_or_else(invalid)?;
        }
        if parts.next().is_some() {
            return Err(invalid());
        }
        TimeOfDay::from_hm(hour, minute)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Map the 0=Sunday..6=Saturday encoding onto [`Weekday`].
pub fn weekday_from_index(index: u8) -> Result<Weekday> {
    match index {
        0 => Ok(Weekday::Sun),
        1 => Ok(Weekday::Mon),
        2 => Ok(Weekday::Tue),
        3 => Ok(Weekday::Wed),
        4 => Ok(Weekday::Thu),
        5 => Ok(Weekday::Fri),
        6 => Ok(Weekday::Sat),
        other => Err(SchedulingError::Validation(format!(
            "day of week must be 0 (Sunday) through 6 (Saturday), got {}",
            other
        ))),
    }
}

/// Inverse of [`weekday_from_index`].
pub fn weekday_index(day: Weekday) -> u8 {
    day.num_days_from_sunday() as u8
}
