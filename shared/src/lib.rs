//! Shared types for the consultation booking engine
//!
//! Domain models (consultants, services, bookings, slots) and the API
//! payload types used by both the server and its clients.

pub mod booking;
pub mod models;

// Re-exports
pub use serde::{Deserialize, Serialize};
