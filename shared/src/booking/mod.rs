//! Booking domain types
//!
//! The booking record, its status machine vocabulary, computed slot views,
//! and the API payloads that drive the state transitions.

pub mod record;
pub mod slot;
pub mod types;

// Re-exports
pub use record::{Booking, BookingStatus, CancelActor, NewBooking};
pub use slot::{Availability, Slot, SlotStatus};
pub use types::{
    CancelBookingRequest, CreateBookingRequest, PayBookingRequest, RateBookingRequest,
    RejectBookingRequest,
};
