//! DST transition policies for wall-clock slot boundaries.

use serde::{Deserialize, Serialize};

/// Policy for a wall-clock time that does not exist locally (the spring-forward gap).
///
/// Ambiguous times in the fall-back overlap always resolve to the earlier instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DstPolicy {
    /// Drop slots with a boundary in the DST gap (e.g., 2:30 AM during spring forward)
    #[default]
    Skip,
    /// Shift to the next valid time after the gap
    ShiftForward,
}
