//! Booking engine core
//!
//! - [`availability`] - pure slot generation from the weekly template
//! - [`ledger`] - atomic slot reservation (holds with TTL)
//! - [`manager`] - the booking state machine
//! - [`storage`] - redb-backed bookings/holds repository
//!
//! Occupancy is always derived from the repository's current booking set;
//! no component keeps its own mutable copy of who owns which slot.

pub mod availability;
pub mod error;
pub mod ledger;
pub mod manager;
pub mod storage;

// Re-exports
pub use availability::{BusyKind, BusyRange, MAX_RANGE_DAYS, generate_slots};
pub use error::{BookingError, BookingResult};
pub use ledger::{DEFAULT_HOLD_TTL_SECS, SlotLedger};
pub use manager::BookingManager;
pub use storage::{BookingStorage, Hold, StorageError};
