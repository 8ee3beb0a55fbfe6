//! Domain records: weekly availability windows, blocked ranges, and appointments.
//!
//! None of these link to each other at the storage level. Whether an appointment is
//! legal is computed from the windows and blocks at decision time.

use std::fmt;

use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::TimeOfDay;
use crate::error::{Result, SchedulingError};
use crate::interval::TimeRange;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new_v4() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

id_type!(
    /// The calendar owner being scheduled against.
    ProviderId
);
id_type!(WindowId);
id_type!(BlockId);
id_type!(AppointmentId);
id_type!(ClientId);
id_type!(AppointmentTypeId);

/// A recurring weekly working window, e.g. Monday 09:00-12:00 in the provider's zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub id: WindowId,
    pub provider_id: ProviderId,
    pub weekday: Weekday,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
    pub active: bool,
}

/// Input for creating or fully replacing an [`AvailabilityWindow`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAvailabilityWindow {
    pub provider_id: ProviderId,
    pub weekday: Weekday,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl NewAvailabilityWindow {
    pub fn new(provider_id: ProviderId, weekday: Weekday, start: TimeOfDay, end: TimeOfDay) -> Self {
        Self {
            provider_id,
            weekday,
            start,
            end,
            active: true,
        }
    }

    /// Reject windows whose start is not strictly before their end, or that start at `24:00`.
    pub fn validate(&self) -> Result<()> {
        if self.start >= self.end {
            return Err(SchedulingError::Validation(format!(
                "window start {} must be before end {}",
                self.start, self.end
            )));
        }
        if self.start == TimeOfDay::END_OF_DAY {
            return Err(SchedulingError::Validation(
                "window cannot start at 24:00".to_string(),
            ));
        }
        Ok(())
    }

    pub fn into_window(self, id: WindowId) -> AvailabilityWindow {
        AvailabilityWindow {
            id,
            provider_id: self.provider_id,
            weekday: self.weekday,
            start: self.start,
            end: self.end,
            active: self.active,
        }
    }
}

/// An absolute-time exclusion such as a vacation or a one-off block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedRange {
    pub id: BlockId,
    pub provider_id: ProviderId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub reason: Option<String>,
}

impl BlockedRange {
    pub fn range(&self) -> TimeRange {
        TimeRange {
            start: self.start,
            end: self.end,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBlockedRange {
    pub provider_id: ProviderId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl NewBlockedRange {
    pub fn validate(&self) -> Result<()> {
        TimeRange::new(self.start, self.end).map(|_| ())
    }

    pub fn into_block(self, id: BlockId) -> BlockedRange {
        BlockedRange {
            id,
            provider_id: self.provider_id,
            start: self.start,
            end: self.end,
            reason: self.reason,
        }
    }
}

/// Appointment status.
///
/// `Scheduled` is the only editable state; the other three are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    /// Active appointments occupy the provider's time.
    pub fn is_active(self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled | AppointmentStatus::NoShow)
    }

    /// Only scheduled appointments can be rescheduled or have their status changed.
    pub fn is_editable(self) -> bool {
        self == AppointmentStatus::Scheduled
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::NoShow => "no_show",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub provider_id: ProviderId,
    pub client_id: Option<ClientId>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub appointment_type_id: Option<AppointmentTypeId>,
}

impl Appointment {
    pub fn range(&self) -> TimeRange {
        TimeRange {
            start: self.start,
            end: self.end,
        }
    }
}

/// A booking request as handed to [`crate::Scheduler::create_appointment`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAppointment {
    pub provider_id: ProviderId,
    #[serde(default)]
    pub client_id: Option<ClientId>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub appointment_type_id: Option<AppointmentTypeId>,
}

impl NewAppointment {
    pub fn new(provider_id: ProviderId, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            provider_id,
            client_id: None,
            start,
            end,
            notes: None,
            appointment_type_id: None,
        }
    }

    pub fn into_appointment(self, id: AppointmentId) -> Appointment {
        Appointment {
            id,
            provider_id: self.provider_id,
            client_id: self.client_id,
            start: self.start,
            end: self.end,
            status: AppointmentStatus::Scheduled,
            notes: self.notes,
            appointment_type_id: self.appointment_type_id,
        }
    }
}

/// A bookable interval of fixed duration, in UTC.
pub type Slot = TimeRange;
