//! Booking engine error taxonomy
//!
//! Every variant is an expected, recoverable condition reported to the
//! caller as a typed failure. Only [`BookingError::Storage`] wraps an
//! infrastructure fault; the engine itself never retries a transition,
//! since replaying a non-idempotent transition could break the write-once
//! and state-machine invariants.

use super::storage::StorageError;
use shared::booking::BookingStatus;
use thiserror::Error;

/// Booking engine errors
#[derive(Debug, Error)]
pub enum BookingError {
    #[error("Invalid date range: {0}")]
    InvalidRange(String),

    #[error("Slot is no longer available")]
    SlotUnavailable,

    #[error("Hold has expired")]
    HoldExpired,

    #[error("Hold not found: {0}")]
    HoldNotFound(String),

    #[error("Invalid transition: booking is {current}")]
    InvalidTransition { current: BookingStatus },

    #[error("Booking was modified concurrently")]
    ConcurrentModification,

    #[error("Session has not finished yet")]
    TooEarly,

    #[error("Booking has already been rated")]
    AlreadyRated,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Service does not belong to this consultant: {0}")]
    InvalidService(String),

    #[error("Topic must not be empty")]
    MissingTopic,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Meeting provisioning failed: {0}")]
    Provisioning(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl BookingError {
    /// Collapse a CAS status conflict into the transition error the loser
    /// of a race is supposed to see; everything else passes through.
    pub(crate) fn from_cas(err: StorageError) -> Self {
        match err {
            StorageError::StatusConflict { actual, .. } => {
                BookingError::InvalidTransition { current: actual }
            }
            StorageError::BookingNotFound(id) => BookingError::NotFound(id),
            other => BookingError::Storage(other),
        }
    }
}

pub type BookingResult<T> = Result<T, BookingError>;
