//! Storage seams consumed by the engine.
//!
//! The engine holds no state of its own. Every read and write goes through these
//! traits, which a persistence layer implements (see [`crate::memory::MemoryStore`]
//! for the in-process reference implementation).

use chrono::{DateTime, Utc, Weekday};

use crate::error::StoreResult;
use crate::model::{
    Appointment, AppointmentId, AppointmentStatus, AvailabilityWindow, BlockId, BlockedRange,
    NewAppointment, NewAvailabilityWindow, NewBlockedRange, ProviderId, WindowId,
};

/// Recurring weekly windows, keyed by provider.
pub trait AvailabilityStore: Send + Sync {
    /// All windows for the provider, ordered by (day-of-week with Sunday first, start).
    fn list_windows(&self, provider: ProviderId) -> StoreResult<Vec<AvailabilityWindow>>;

    /// Active windows for one weekday, ordered by start.
    fn list_windows_for_day(
        &self,
        provider: ProviderId,
        weekday: Weekday,
    ) -> StoreResult<Vec<AvailabilityWindow>>;

    fn get_window(&self, id: WindowId) -> StoreResult<AvailabilityWindow>;

    fn create_window(&self, window: NewAvailabilityWindow) -> StoreResult<AvailabilityWindow>;

    /// Full replace of an existing window.
    fn update_window(
        &self,
        id: WindowId,
        window: NewAvailabilityWindow,
    ) -> StoreResult<AvailabilityWindow>;

    fn delete_window(&self, id: WindowId) -> StoreResult<()>;
}

/// Absolute-time exclusions, keyed by provider.
pub trait BlockStore: Send + Sync {
    /// Blocks overlapping `[range_start, range_end)`, ordered by start.
    fn list_blocks_overlapping(
        &self,
        provider: ProviderId,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> StoreResult<Vec<BlockedRange>>;

    /// Blocks whose end is on or after `cutoff`, ordered by start.
    fn list_blocks_ending_after(
        &self,
        provider: ProviderId,
        cutoff: DateTime<Utc>,
    ) -> StoreResult<Vec<BlockedRange>>;

    fn create_block(&self, block: NewBlockedRange) -> StoreResult<BlockedRange>;

    fn delete_block(&self, id: BlockId) -> StoreResult<()>;
}

/// Booked appointments.
///
/// # Exclusion constraint
///
/// [`insert_appointment`](AppointmentStore::insert_appointment) and
/// [`update_appointment_times`](AppointmentStore::update_appointment_times) must reject,
/// atomically with the write, any range that overlaps another active appointment of the
/// same provider, returning [`crate::StoreError::Overlap`]. The engine's own pre-checks
/// are a separate read and cannot prevent two concurrent requests from both passing.
pub trait AppointmentStore: Send + Sync {
    fn get_appointment(&self, id: AppointmentId) -> StoreResult<Appointment>;

    /// Appointments overlapping `[range_start, range_end)` in any status, ordered by start.
    fn list_appointments_overlapping(
        &self,
        provider: ProviderId,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> StoreResult<Vec<Appointment>>;

    fn insert_appointment(&self, appointment: NewAppointment) -> StoreResult<Appointment>;

    /// Persist new time fields only; status and other fields are untouched.
    fn update_appointment_times(
        &self,
        id: AppointmentId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Appointment>;

    fn update_appointment_status(
        &self,
        id: AppointmentId,
        status: AppointmentStatus,
    ) -> StoreResult<Appointment>;
}

/// Per-provider settings owned by the surrounding system.
pub trait ProviderDirectory: Send + Sync {
    /// IANA zone name configured for the provider, if any.
    fn provider_timezone(&self, provider: ProviderId) -> StoreResult<Option<String>>;
}

/// Everything the [`crate::Scheduler`] needs from persistence.
pub trait SchedulingStore: AvailabilityStore + BlockStore + AppointmentStore + ProviderDirectory {}

impl<T> SchedulingStore for T where
    T: AvailabilityStore + BlockStore + AppointmentStore + ProviderDirectory
{
}
