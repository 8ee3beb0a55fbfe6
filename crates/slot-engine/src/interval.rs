//! Half-open time ranges and the overlap rule every other component builds on.
//!
//! Two ranges overlap when `a.start < b.end && a.end > b.start`. Ranges that merely
//! touch (one ends exactly when the other starts) do NOT overlap.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SchedulingError};

/// Do the half-open ranges `[start_a, end_a)` and `[start_b, end_b)` intersect?
pub fn overlaps<T: PartialOrd>(start_a: T, end_a: T, start_b: T, end_b: T) -> bool {
    start_a < end_b && end_a > start_b
}

/// An absolute, half-open `[start, end)` range in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// Build a range, rejecting `end <= start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if end <= start {
            return Err(SchedulingError::Validation(format!(
                "range end {} must be after start {}",
                end.to_rfc3339(),
                start.to_rfc3339()
            )));
        }
        Ok(Self { start, end })
    }

    pub fn overlaps(&self, other: &TimeRange) -> bool {
        overlaps(self.start, self.end, other.start, other.end)
    }

    /// Minutes shared with `other`; zero when the ranges do not overlap.
    pub fn overlap_minutes(&self, other: &TimeRange) -> i64 {
        if !self.overlaps(other) {
            return 0;
        }
        let overlap_start = self.start.max(other.start);
        let overlap_end = self.end.min(other.end);
        (overlap_end - overlap_start).num_minutes()
    }

    /// Whether `other` lies entirely inside this range (shared endpoints allowed).
    pub fn contains(&self, other: &TimeRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}
