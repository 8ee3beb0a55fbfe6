//! Error types for slot-engine operations.

use thiserror::Error;

/// Coarse classification of a [`SchedulingError`], for callers that map failures to
/// user-facing messages ("not available", "time taken", ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Unavailable,
    Conflict,
    NotFound,
    State,
    Timezone,
    Store,
}

#[derive(Error, Debug)]
pub enum SchedulingError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Not available: {0}")]
    Unavailable(String),

    #[error("Time taken: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    State(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl SchedulingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SchedulingError::Validation(_) => ErrorKind::Validation,
            SchedulingError::Unavailable(_) => ErrorKind::Unavailable,
            SchedulingError::Conflict(_) => ErrorKind::Conflict,
            SchedulingError::NotFound(_) => ErrorKind::NotFound,
            SchedulingError::State(_) => ErrorKind::State,
            SchedulingError::InvalidTimezone(_) => ErrorKind::Timezone,
            SchedulingError::Store(_) => ErrorKind::Store,
        }
    }
}

/// Failures reported by a store implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// The store's exclusion constraint rejected a write that would double-book a provider.
    #[error("overlapping active appointment: {0}")]
    Overlap(String),

    #[error("{0}")]
    Backend(String),
}

impl From<StoreError> for SchedulingError {
    fn from(err: StoreError) -> Self {
        match err {
            e @ StoreError::NotFound { .. } => SchedulingError::NotFound(e.to_string()),
            StoreError::Overlap(msg) => SchedulingError::Conflict(msg),
            StoreError::Backend(msg) => SchedulingError::Store(msg),
        }
    }
}

pub type Result<T> = std::result::Result<T, SchedulingError>;

pub type StoreResult<T> = std::result::Result<T, StoreError>;
