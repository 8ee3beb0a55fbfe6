//! # slot-engine
//!
//! Availability and appointment scheduling for a single calendar owner ("provider").
//!
//! The engine combines recurring weekly working windows, ad-hoc blocked ranges, and
//! existing appointments into one decision procedure: which slots are bookable on a
//! given day, and whether a booking, reschedule, or cancellation is legal. It is
//! stateless; all durable state lives behind the [`store`] traits.
//!
//! ## Modules
//!
//! - [`interval`]: Half-open ranges and the overlap rule
//! - [`clock`]: Time-of-day and day-of-week values for weekly windows
//! - [`model`]: Windows, blocked ranges, appointments, identifiers
//! - [`store`]: Storage traits the engine reads and writes through
//! - [`memory`]: In-process store implementation
//! - [`availability`]: Default template, window overlap, containment
//! - [`blocked`]: Blocked-range overlap and rolling listings
//! - [`conflict`]: Appointment and block collision checks
//! - [`slots`]: Per-day slot generation and free ranges
//! - [`timezone`] / [`dst`]: Zone resolution and wall-clock projection
//! - [`scheduler`]: The facade tying it together
//! - [`config`]: Engine configuration
//! - [`error`]: Error types

pub mod availability;
pub mod blocked;
pub mod clock;
pub mod config;
pub mod conflict;
pub mod dst;
pub mod error;
pub mod interval;
pub mod memory;
pub mod model;
pub mod scheduler;
pub mod slots;
pub mod store;
pub mod timezone;

pub use clock::TimeOfDay;
pub use config::EngineConfig;
pub use conflict::{Conflict, SlotCheck};
pub use dst::DstPolicy;
pub use error::{ErrorKind, SchedulingError, StoreError};
pub use interval::{overlaps, TimeRange};
pub use memory::MemoryStore;
pub use model::{
    Appointment, AppointmentId, AppointmentStatus, AppointmentTypeId, AvailabilityWindow, BlockId,
    BlockedRange, ClientId, NewAppointment, NewAvailabilityWindow, NewBlockedRange, ProviderId,
    Slot, WindowId,
};
pub use scheduler::{BlockOutcome, Scheduler};
pub use store::SchedulingStore;
pub use timezone::TimezonePolicy;
