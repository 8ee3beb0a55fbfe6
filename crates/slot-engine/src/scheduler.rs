//! The scheduling facade: slot queries, booking, rescheduling, cancellation, and the
//! configuration changes (windows and blocks) that feed them.
//!
//! Every operation is a sequence of store reads followed by at most one write. All
//! checks pass before the write is issued, so a failure never leaves partial state.
//! Double-booking under concurrent requests is closed by the store's exclusion
//! constraint on appointment writes, which surfaces here as [`SchedulingError::Conflict`].

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::{debug, warn};

use crate::availability::{check_availability_overlap, seed_defaults_if_empty};
use crate::blocked::{find_blocked_range_overlaps, list_future_and_recent};
use crate::config::EngineConfig;
use crate::conflict::{check_slot, find_appointment_conflicts, SlotCheck};
use crate::error::{Result, SchedulingError};
use crate::interval::TimeRange;
use crate::model::{
    Appointment, AppointmentId, AppointmentStatus, AvailabilityWindow, BlockId, BlockedRange,
    NewAppointment, NewAvailabilityWindow, NewBlockedRange, ProviderId, Slot, WindowId,
};
use crate::slots;
use crate::store::SchedulingStore;
use crate::timezone::{resolve_timezone, to_local};

/// A newly created block plus any existing blocks it overlaps.
///
/// Overlapping blocks are allowed; the list is advisory.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockOutcome {
    pub block: BlockedRange,
    pub overlapping: Vec<BlockedRange>,
}

pub struct Scheduler<S> {
    store: S,
    config: EngineConfig,
}

impl<S: SchedulingStore> Scheduler<S> {
    pub fn new(store: S, config: EngineConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resolve a zone name under the configured [`crate::TimezonePolicy`].
    pub fn resolve_timezone(&self, name: &str) -> Result<Tz> {
        resolve_timezone(name, self.config.timezone_policy)
    }

    /// The provider's zone from the directory, or the configured default.
    pub fn provider_timezone(&self, provider: ProviderId) -> Result<Tz> {
        match self.store.provider_timezone(provider)? {
            Some(name) => self.resolve_timezone(&name),
            None => self.resolve_timezone(&self.config.default_timezone),
        }
    }

    fn validate_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<TimeRange> {
        let range = TimeRange::new(start, end)?;
        if range.duration_minutes() > i64::from(self.config.max_slot_minutes) {
            return Err(SchedulingError::Validation(format!(
                "duration of {} minutes exceeds the {} minute limit",
                range.duration_minutes(),
                self.config.max_slot_minutes
            )));
        }
        Ok(range)
    }

    fn validate_slot_minutes(&self, slot_minutes: u32) -> Result<u32> {
        if slot_minutes == 0 || slot_minutes > self.config.max_slot_minutes {
            return Err(SchedulingError::Validation(format!(
                "slot duration must be between 1 and {} minutes, got {}",
                self.config.max_slot_minutes, slot_minutes
            )));
        }
        Ok(slot_minutes)
    }

    // ── Slot queries ────────────────────────────────────────────────────────

    /// Bookable slots on local day `date` in `timezone`.
    pub fn generate_slots(
        &self,
        provider: ProviderId,
        date: NaiveDate,
        slot_minutes: u32,
        timezone: &str,
    ) -> Result<Vec<Slot>> {
        let slot_minutes = self.validate_slot_minutes(slot_minutes)?;
        let tz = self.resolve_timezone(timezone)?;
        slots::generate_slots(&self.store, provider, date, slot_minutes, tz, self.config.dst_policy)
    }

    /// Bookable slots on `date` in the provider's own zone. `None` uses the configured
    /// default slot length.
    pub fn generate_slots_for_provider(
        &self,
        provider: ProviderId,
        date: NaiveDate,
        slot_minutes: Option<u32>,
    ) -> Result<Vec<Slot>> {
        let slot_minutes =
            self.validate_slot_minutes(slot_minutes.unwrap_or(self.config.default_slot_minutes))?;
        let tz = self.provider_timezone(provider)?;
        slots::generate_slots(&self.store, provider, date, slot_minutes, tz, self.config.dst_policy)
    }

    /// Bookable slots for each day in `from..=to`, in the provider's zone.
    pub fn generate_slots_in_range(
        &self,
        provider: ProviderId,
        from: NaiveDate,
        to: NaiveDate,
        slot_minutes: u32,
    ) -> Result<Vec<Slot>> {
        let slot_minutes = self.validate_slot_minutes(slot_minutes)?;
        let tz = self.provider_timezone(provider)?;
        slots::generate_slots_in_range(
            &self.store,
            provider,
            from,
            to,
            slot_minutes,
            tz,
            self.config.dst_policy,
        )
    }

    /// Free sub-ranges of the provider's windows on `date`, in the provider's zone.
    pub fn open_ranges(&self, provider: ProviderId, date: NaiveDate) -> Result<Vec<TimeRange>> {
        let tz = self.provider_timezone(provider)?;
        slots::open_ranges_for_day(&self.store, provider, date, tz, self.config.dst_policy)
    }

    /// The earliest slot starting at or after `not_before`, searching up to the configured
    /// horizon.
    pub fn next_available_slot(
        &self,
        provider: ProviderId,
        not_before: DateTime<Utc>,
        slot_minutes: u32,
    ) -> Result<Option<Slot>> {
        let slot_minutes = self.validate_slot_minutes(slot_minutes)?;
        let tz = self.provider_timezone(provider)?;
        let (first_day, _, _) = to_local(not_before, tz);

        for offset in 0..=i64::from(self.config.search_horizon_days) {
            let Some(date) = first_day.checked_add_signed(Duration::days(offset)) else {
                break;
            };
            let day_slots =
                slots::generate_slots(&self.store, provider, date, slot_minutes, tz, self.config.dst_policy)?;
            if let Some(slot) = day_slots.into_iter().find(|s| s.start >= not_before) {
                return Ok(Some(slot));
            }
        }
        Ok(None)
    }

    /// Whether `[start, end)` is inside the provider's availability and free of blocks
    /// and active appointments. Reserves nothing.
    pub fn is_slot_available(
        &self,
        provider: ProviderId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<bool> {
        let range = self.validate_range(start, end)?;
        let tz = self.provider_timezone(provider)?;
        Ok(check_slot(&self.store, provider, &range, tz, None)?.is_available())
    }

    /// Whether `[start, end)` overlaps an active appointment other than `exclude`.
    pub fn has_appointment_conflict(
        &self,
        provider: ProviderId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude: Option<AppointmentId>,
    ) -> Result<bool> {
        let range = TimeRange::new(start, end)?;
        Ok(!find_appointment_conflicts(&self.store, provider, &range, exclude)?.is_empty())
    }

    // ── Appointments ────────────────────────────────────────────────────────

    fn ensure_no_conflict(
        &self,
        provider: ProviderId,
        range: &TimeRange,
        exclude: Option<AppointmentId>,
    ) -> Result<()> {
        let conflicts = find_appointment_conflicts(&self.store, provider, range, exclude)?;
        if let Some(first) = conflicts.first() {
            debug!(
                %provider,
                conflicting = %first.appointment.id,
                overlap_minutes = first.overlap_minutes,
                "appointment conflict"
            );
            return Err(SchedulingError::Conflict(format!(
                "overlaps appointment {} by {} minutes",
                first.appointment.id, first.overlap_minutes
            )));
        }
        Ok(())
    }

    /// Book `candidate` after checking for conflicts, availability, and blocks.
    ///
    /// # Errors
    /// - `Validation` if the range is empty, inverted, or too long.
    /// - `Conflict` if an active appointment overlaps (also when the store's exclusion
    ///   constraint rejects the insert).
    /// - `Unavailable` if the range is outside availability or inside a blocked range.
    pub fn create_appointment(&self, candidate: NewAppointment) -> Result<Appointment> {
        let provider = candidate.provider_id;
        let range = self.validate_range(candidate.start, candidate.end)?;
        self.ensure_no_conflict(provider, &range, None)?;

        let tz = self.provider_timezone(provider)?;
        match check_slot(&self.store, provider, &range, tz, None)? {
            SlotCheck::Available => {}
            SlotCheck::OutsideAvailability => {
                return Err(SchedulingError::Unavailable(
                    "outside the provider's availability".to_string(),
                ))
            }
            SlotCheck::Blocked => {
                return Err(SchedulingError::Unavailable(
                    "inside a blocked range".to_string(),
                ))
            }
            SlotCheck::Booked => {
                return Err(SchedulingError::Conflict(
                    "overlaps an existing appointment".to_string(),
                ))
            }
        }

        let appointment = self.store.insert_appointment(candidate)?;
        debug!(%provider, appointment = %appointment.id, "appointment created");
        Ok(appointment)
    }

    fn load_editable(&self, id: AppointmentId) -> Result<Appointment> {
        let appointment = self.store.get_appointment(id)?;
        if !appointment.status.is_editable() {
            return Err(SchedulingError::State(format!(
                "appointment {} is {} and can no longer be changed",
                id, appointment.status
            )));
        }
        Ok(appointment)
    }

    /// Move a scheduled appointment to `[new_start, new_end)`.
    ///
    /// Only the time fields change. The appointment's own current booking is ignored when
    /// checking for conflicts, so it may be moved onto a range overlapping its old one.
    pub fn reschedule_appointment(
        &self,
        id: AppointmentId,
        new_start: DateTime<Utc>,
        new_end: DateTime<Utc>,
    ) -> Result<Appointment> {
        let range = self.validate_range(new_start, new_end)?;
        let appointment = self.load_editable(id)?;
        self.ensure_no_conflict(appointment.provider_id, &range, Some(id))?;

        let updated = self.store.update_appointment_times(id, range.start, range.end)?;
        debug!(appointment = %id, "appointment rescheduled");
        Ok(updated)
    }

    /// Cancel a scheduled appointment. Cancelling twice is a `State` error.
    pub fn cancel_appointment(&self, id: AppointmentId) -> Result<Appointment> {
        self.transition_status(id, AppointmentStatus::Cancelled)
    }

    pub fn complete_appointment(&self, id: AppointmentId) -> Result<Appointment> {
        self.transition_status(id, AppointmentStatus::Completed)
    }

    pub fn mark_no_show(&self, id: AppointmentId) -> Result<Appointment> {
        self.transition_status(id, AppointmentStatus::NoShow)
    }

    /// Move a scheduled appointment into one of the terminal states.
    ///
    /// # Errors
    /// - `Validation` if `target` is `Scheduled` (not a transition target).
    /// - `State` if the appointment is already terminal.
    pub fn transition_status(
        &self,
        id: AppointmentId,
        target: AppointmentStatus,
    ) -> Result<Appointment> {
        if target == AppointmentStatus::Scheduled {
            return Err(SchedulingError::Validation(
                "scheduled is not a valid transition target".to_string(),
            ));
        }
        self.load_editable(id)?;
        let updated = self.store.update_appointment_status(id, target)?;
        debug!(appointment = %id, status = %target, "appointment status changed");
        Ok(updated)
    }

    // ── Weekly availability ─────────────────────────────────────────────────

    pub fn list_windows(&self, provider: ProviderId) -> Result<Vec<AvailabilityWindow>> {
        Ok(self.store.list_windows(provider)?)
    }

    fn ensure_window_fits(&self, window: &NewAvailabilityWindow, exclude: Option<WindowId>) -> Result<()> {
        window.validate()?;
        if check_availability_overlap(
            &self.store,
            window.provider_id,
            window.weekday,
            window.start,
            window.end,
            exclude,
        )? {
            return Err(SchedulingError::Conflict(format!(
                "{} {}-{} overlaps an existing availability window",
                window.weekday, window.start, window.end
            )));
        }
        Ok(())
    }

    pub fn add_window(&self, window: NewAvailabilityWindow) -> Result<AvailabilityWindow> {
        self.ensure_window_fits(&window, None)?;
        Ok(self.store.create_window(window)?)
    }

    /// Fully replace window `id`; the provider cannot change.
    pub fn replace_window(
        &self,
        id: WindowId,
        window: NewAvailabilityWindow,
    ) -> Result<AvailabilityWindow> {
        let existing = self.store.get_window(id)?;
        if existing.provider_id != window.provider_id {
            return Err(SchedulingError::Validation(format!(
                "window {} belongs to another provider",
                id
            )));
        }
        self.ensure_window_fits(&window, Some(id))?;
        Ok(self.store.update_window(id, window)?)
    }

    pub fn remove_window(&self, id: WindowId) -> Result<()> {
        Ok(self.store.delete_window(id)?)
    }

    /// Seed the Mon-Fri default schedule for a provider that has no windows yet.
    pub fn seed_default_availability(&self, provider: ProviderId) -> Result<Vec<AvailabilityWindow>> {
        let created = seed_defaults_if_empty(&self.store, provider)?;
        debug!(%provider, created = created.len(), "seeded default availability");
        Ok(created)
    }

    // ── Blocked ranges ──────────────────────────────────────────────────────

    pub fn add_blocked_range(&self, block: NewBlockedRange) -> Result<BlockOutcome> {
        let range = TimeRange::new(block.start, block.end)?;
        let overlapping = find_blocked_range_overlaps(&self.store, block.provider_id, &range, None)?;
        if !overlapping.is_empty() {
            warn!(
                provider = %block.provider_id,
                count = overlapping.len(),
                "blocked range overlaps existing blocks"
            );
        }
        let block = self.store.create_block(block)?;
        Ok(BlockOutcome { block, overlapping })
    }

    pub fn remove_blocked_range(&self, id: BlockId) -> Result<()> {
        Ok(self.store.delete_block(id)?)
    }

    pub fn blocks_overlapping(
        &self,
        provider: ProviderId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<BlockedRange>> {
        let range = TimeRange::new(start, end)?;
        Ok(self.store.list_blocks_overlapping(provider, range.start, range.end)?)
    }

    /// Blocks still relevant as of `now`: ending today or later, plus the configured
    /// number of recent days.
    pub fn future_and_recent_blocks(
        &self,
        provider: ProviderId,
        now: DateTime<Utc>,
    ) -> Result<Vec<BlockedRange>> {
        list_future_and_recent(&self.store, provider, now, self.config.recent_block_days)
    }
}
