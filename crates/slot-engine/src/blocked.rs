//! Blocked-range queries: advisory overlap checks between blocks, and the rolling
//! "future and recent" listing.

use chrono::{DateTime, Duration, Utc};

use crate::error::Result;
use crate::interval::TimeRange;
use crate::model::{BlockId, BlockedRange, ProviderId};
use crate::store::BlockStore;

/// Blocks of `provider` overlapping `range`, skipping `exclude`.
///
/// Blocks are allowed to overlap each other; this only reports the collisions.
pub fn find_blocked_range_overlaps<S>(
    store: &S,
    provider: ProviderId,
    range: &TimeRange,
    exclude: Option<BlockId>,
) -> Result<Vec<BlockedRange>>
where
    S: BlockStore + ?Sized,
{
    let mut blocks = store.list_blocks_overlapping(provider, range.start, range.end)?;
    blocks.retain(|b| Some(b.id) != exclude && b.range().overlaps(range));
    Ok(blocks)
}

/// Whether any other block of `provider` overlaps `range`.
pub fn check_blocked_range_overlap<S>(
    store: &S,
    provider: ProviderId,
    range: &TimeRange,
    exclude: Option<BlockId>,
) -> Result<bool>
where
    S: BlockStore + ?Sized,
{
    Ok(!find_blocked_range_overlaps(store, provider, range, exclude)?.is_empty())
}

/// Blocks ending on or after midnight (UTC) of `now`, reaching back `recent_days` more days.
pub fn list_future_and_recent<S>(
    store: &S,
    provider: ProviderId,
    now: DateTime<Utc>,
    recent_days: u32,
) -> Result<Vec<BlockedRange>>
where
    S: BlockStore + ?Sized,
{
    let midnight = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .unwrap_or(now);
    let cutoff = midnight - Duration::days(i64::from(recent_days));
    Ok(store.list_blocks_ending_after(provider, cutoff)?)
}
