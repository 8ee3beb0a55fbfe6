//! In-process store backed by `RwLock`-guarded maps.
//!
//! Appointment writes check for overlapping active appointments and apply the write
//! under the same write lock, which gives the exclusion constraint required by
//! [`AppointmentStore`].

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc, Weekday};

use crate::error::{StoreError, StoreResult};
use crate::interval::overlaps;
use crate::model::{
    Appointment, AppointmentId, AppointmentStatus, AvailabilityWindow, BlockId, BlockedRange,
    NewAppointment, NewAvailabilityWindow, NewBlockedRange, ProviderId, WindowId,
};
use crate::store::{AppointmentStore, AvailabilityStore, BlockStore, ProviderDirectory};

#[derive(Debug, Default)]
struct Tables {
    windows: HashMap<WindowId, AvailabilityWindow>,
    blocks: HashMap<BlockId, BlockedRange>,
    appointments: HashMap<AppointmentId, Appointment>,
    timezones: HashMap<ProviderId, String>,
}

impl Tables {
    fn find_active_overlap(
        &self,
        provider: ProviderId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude: Option<AppointmentId>,
    ) -> Option<&Appointment> {
        self.appointments.values().find(|a| {
            a.provider_id == provider
                && Some(a.id) != exclude
                && a.status.is_active()
                && overlaps(start, end, a.start, a.end)
        })
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the provider's IANA zone name, as the user directory would.
    pub fn set_provider_timezone(&self, provider: ProviderId, timezone: impl Into<String>) -> StoreResult<()> {
        self.write()?.timezones.insert(provider, timezone.into());
        Ok(())
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }
}

fn not_found(entity: &'static str, id: impl ToString) -> StoreError {
    StoreError::NotFound {
        entity,
        id: id.to_string(),
    }
}

fn overlap_error(existing: &Appointment) -> StoreError {
    StoreError::Overlap(format!(
        "appointment {} occupies {} to {}",
        existing.id,
        existing.start.to_rfc3339(),
        existing.end.to_rfc3339()
    ))
}

impl AvailabilityStore for MemoryStore {
    fn list_windows(&self, provider: ProviderId) -> StoreResult<Vec<AvailabilityWindow>> {
        let tables = self.read()?;
        let mut windows: Vec<AvailabilityWindow> = tables
            .windows
            .values()
            .filter(|w| w.provider_id == provider)
            .cloned()
            .collect();
        windows.sort_by_key(|w| (w.weekday.num_days_from_sunday(), w.start, w.end));
        Ok(windows)
    }

    fn list_windows_for_day(
        &self,
        provider: ProviderId,
        weekday: Weekday,
    ) -> StoreResult<Vec<AvailabilityWindow>> {
        let tables = self.read()?;
        let mut windows: Vec<AvailabilityWindow> = tables
            .windows
            .values()
            .filter(|w| w.provider_id == provider && w.weekday == weekday && w.active)
            .cloned()
            .collect();
        windows.sort_by_key(|w| (w.start, w.end));
        Ok(windows)
    }

    fn get_window(&self, id: WindowId) -> StoreResult<AvailabilityWindow> {
        self.read()?
            .windows
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("availability window", id))
    }

    fn create_window(&self, window: NewAvailabilityWindow) -> StoreResult<AvailabilityWindow> {
        let window = window.into_window(WindowId::new_v4());
        self.write()?.windows.insert(window.id, window.clone());
        Ok(window)
    }

    fn update_window(
        &self,
        id: WindowId,
        window: NewAvailabilityWindow,
    ) -> StoreResult<AvailabilityWindow> {
        let mut tables = self.write()?;
        let slot = tables
            .windows
            .get_mut(&id)
            .ok_or_else(|| not_found("availability window", id))?;
        *slot = window.into_window(id);
        Ok(slot.clone())
    }

    fn delete_window(&self, id: WindowId) -> StoreResult<()> {
        self.write()?
            .windows
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found("availability window", id))
    }
}

impl BlockStore for MemoryStore {
    fn list_blocks_overlapping(
        &self,
        provider: ProviderId,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> StoreResult<Vec<BlockedRange>> {
        let tables = self.read()?;
        let mut blocks: Vec<BlockedRange> = tables
            .blocks
            .values()
            .filter(|b| b.provider_id == provider && overlaps(b.start, b.end, range_start, range_end))
            .cloned()
            .collect();
        blocks.sort_by_key(|b| (b.start, b.end));
        Ok(blocks)
    }

    fn list_blocks_ending_after(
        &self,
        provider: ProviderId,
        cutoff: DateTime<Utc>,
    ) -> StoreResult<Vec<BlockedRange>> {
        let tables = self.read()?;
        let mut blocks: Vec<BlockedRange> = tables
            .blocks
            .values()
            .filter(|b| b.provider_id == provider && b.end >= cutoff)
            .cloned()
            .collect();
        blocks.sort_by_key(|b| (b.start, b.end));
        Ok(blocks)
    }

    fn create_block(&self, block: NewBlockedRange) -> StoreResult<BlockedRange> {
        let block = block.into_block(BlockId::new_v4());
        self.write()?.blocks.insert(block.id, block.clone());
        Ok(block)
    }

    fn delete_block(&self, id: BlockId) -> StoreResult<()> {
        self.write()?
            .blocks
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found("blocked range", id))
    }
}

impl AppointmentStore for MemoryStore {
    fn get_appointment(&self, id: AppointmentId) -> StoreResult<Appointment> {
        self.read()?
            .appointments
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("appointment", id))
    }

    fn list_appointments_overlapping(
        &self,
        provider: ProviderId,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> StoreResult<Vec<Appointment>> {
        let tables = self.read()?;
        let mut appointments: Vec<Appointment> = tables
            .appointments
            .values()
            .filter(|a| a.provider_id == provider && overlaps(a.start, a.end, range_start, range_end))
            .cloned()
            .collect();
        appointments.sort_by_key(|a| (a.start, a.end));
        Ok(appointments)
    }

    fn insert_appointment(&self, appointment: NewAppointment) -> StoreResult<Appointment> {
        let mut tables = self.write()?;
        if let Some(existing) =
            tables.find_active_overlap(appointment.provider_id, appointment.start, appointment.end, None)
        {
            return Err(overlap_error(existing));
        }
        let appointment = appointment.into_appointment(AppointmentId::new_v4());
        tables.appointments.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    fn update_appointment_times(
        &self,
        id: AppointmentId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Appointment> {
        let mut tables = self.write()?;
        let current = tables
            .appointments
            .get(&id)
            .ok_or_else(|| not_found("appointment", id))?;
        if current.status.is_active() {
            if let Some(existing) = tables.find_active_overlap(current.provider_id, start, end, Some(id)) {
                return Err(overlap_error(existing));
            }
        }
        let appointment = tables
            .appointments
            .get_mut(&id)
            .ok_or_else(|| not_found("appointment", id))?;
        appointment.start = start;
        appointment.end = end;
        Ok(appointment.clone())
    }

    fn update_appointment_status(
        &self,
        id: AppointmentId,
        status: AppointmentStatus,
    ) -> StoreResult<Appointment> {
        let mut tables = self.write()?;
        let appointment = tables
            .appointments
            .get_mut(&id)
            .ok_or_else(|| not_found("appointment", id))?;
        appointment.status = status;
        Ok(appointment.clone())
    }
}

impl ProviderDirectory for MemoryStore {
    fn provider_timezone(&self, provider: ProviderId) -> StoreResult<Option<String>> {
        Ok(self.read()?.timezones.get(&provider).cloned())
    }
}
