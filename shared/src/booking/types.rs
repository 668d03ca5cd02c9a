//! API payloads for booking operations
//!
//! Each state transition has its own named payload; there is no generic
//! "set status" request.

use super::record::CancelActor;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Create a booking for a specific consultant/service/slot
///
/// Requester identity is part of the payload; authentication is handled by
/// an external collaborator and is not this engine's concern.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateBookingRequest {
    #[validate(length(min = 1))]
    pub consultant_id: String,
    #[validate(length(min = 1))]
    pub service_id: String,
    pub slot_start: DateTime<Utc>,
    /// Checked by the engine so the error is typed (missing topic), not a
    /// generic validation failure
    pub topic: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub attachment_url: Option<String>,
    #[validate(length(min = 1))]
    pub requester_id: String,
}

/// Confirm payment of a pending booking
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PayBookingRequest {
    /// Opaque reference issued by the external payment processor
    #[validate(length(min = 1))]
    pub payment_ref: String,
}

/// Cancel a pending or confirmed booking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelBookingRequest {
    pub actor: CancelActor,
}

/// Consultant declines a pending booking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectBookingRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

/// Rate a completed booking, write-once
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateBookingRequest {
    pub rating: u8,
    #[serde(default)]
    pub review: Option<String>,
}
