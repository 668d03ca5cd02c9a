//! Booking record and status vocabulary
//!
//! A booking is never physically deleted; cancellation and rejection are
//! statuses, so the audit history survives. All mutation goes through the
//! server-side state machine, never through raw field assignment.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Booking lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    PendingPayment,
    Confirmed,
    Completed,
    Cancelled,
    Rejected,
}

impl BookingStatus {
    /// Terminal statuses admit no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Rejected)
    }

    /// Whether a booking in this status still occupies its calendar slot
    pub fn occupies_slot(&self) -> bool {
        !matches!(self, Self::Cancelled | Self::Rejected)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::PendingPayment => "PENDING_PAYMENT",
            Self::Confirmed => "CONFIRMED",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::Rejected => "REJECTED",
        };
        write!(f, "{}", s)
    }
}

/// Who initiated a cancellation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CancelActor {
    Requester,
    Consultant,
}

/// Creation payload with the service price/duration already frozen
///
/// Built by the manager after catalog validation; the ledger turns it into
/// a persisted booking when the hold is committed.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub consultant_id: String,
    pub service_id: String,
    pub duration_min: u32,
    pub price: Decimal,
    pub slot_start: DateTime<Utc>,
    pub requester_id: String,
    pub topic: String,
    pub description: Option<String>,
    pub attachment_url: Option<String>,
}

/// Booking entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub consultant_id: String,
    pub service_id: String,
    /// Frozen at creation time; editing the service later must not change it
    pub duration_min: u32,
    /// Frozen at creation time
    pub price: Decimal,
    pub slot_start: DateTime<Utc>,
    pub requester_id: String,
    pub topic: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub attachment_url: Option<String>,
    /// Assigned on payment confirmation
    #[serde(default)]
    pub meeting_link: Option<String>,
    /// Opaque reference from the external payment processor
    #[serde(default)]
    pub payment_ref: Option<String>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cancelled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cancelled_by: Option<CancelActor>,
    #[serde(default)]
    pub rejected_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reject_reason: Option<String>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Write-once, only on a completed booking
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub review: Option<String>,
}

impl Booking {
    /// Materialize a new booking in `PENDING_PAYMENT`
    pub fn new(id: String, new: NewBooking, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            consultant_id: new.consultant_id,
            service_id: new.service_id,
            duration_min: new.duration_min,
            price: new.price,
            slot_start: new.slot_start,
            requester_id: new.requester_id,
            topic: new.topic,
            description: new.description,
            attachment_url: new.attachment_url,
            meeting_link: None,
            payment_ref: None,
            status: BookingStatus::PendingPayment,
            created_at,
            paid_at: None,
            cancelled_at: None,
            cancelled_by: None,
            rejected_at: None,
            reject_reason: None,
            completed_at: None,
            rating: None,
            review: None,
        }
    }

    /// End of the booked time range, exclusive
    pub fn slot_end(&self) -> DateTime<Utc> {
        self.slot_start + Duration::minutes(i64::from(self.duration_min))
    }

    /// Whether this booking blocks its slot on the consultant's calendar
    pub fn occupies_slot(&self) -> bool {
        self.status.occupies_slot()
    }

    /// Half-open range overlap test against `[start, end)`
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.slot_start < end && start < self.slot_end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn new_booking(slot_start: DateTime<Utc>, duration_min: u32) -> Booking {
        Booking::new(
            "bk-1".to_string(),
            NewBooking {
                consultant_id: "c001".to_string(),
                service_id: "s001".to_string(),
                duration_min,
                price: Decimal::from(800),
                slot_start,
                requester_id: "u001".to_string(),
                topic: "career advice".to_string(),
                description: None,
                attachment_url: None,
            },
            slot_start - Duration::days(1),
        )
    }

    #[test]
    fn test_new_booking_starts_pending_payment() {
        let start = Utc.with_ymd_and_hms(2025, 2, 6, 10, 0, 0).unwrap();
        let booking = new_booking(start, 60);
        assert_eq!(booking.status, BookingStatus::PendingPayment);
        assert_eq!(booking.slot_end(), start + Duration::minutes(60));
        assert!(booking.occupies_slot());
    }

    #[test]
    fn test_overlap_is_half_open() {
        let start = Utc.with_ymd_and_hms(2025, 2, 6, 10, 0, 0).unwrap();
        let booking = new_booking(start, 60);

        // Adjacent ranges do not overlap
        assert!(!booking.overlaps(start - Duration::minutes(30), start));
        assert!(!booking.overlaps(booking.slot_end(), booking.slot_end() + Duration::minutes(30)));

        // Any shared instant does
        assert!(booking.overlaps(start + Duration::minutes(30), start + Duration::minutes(90)));
        assert!(booking.overlaps(start - Duration::minutes(30), start + Duration::minutes(1)));
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(BookingStatus::Completed.is_terminal());
        assert!(BookingStatus::Cancelled.is_terminal());
        assert!(BookingStatus::Rejected.is_terminal());
        assert!(!BookingStatus::PendingPayment.is_terminal());
        assert!(!BookingStatus::Confirmed.is_terminal());
    }

    #[test]
    fn test_cancelled_frees_slot() {
        assert!(BookingStatus::PendingPayment.occupies_slot());
        assert!(BookingStatus::Confirmed.occupies_slot());
        assert!(BookingStatus::Completed.occupies_slot());
        assert!(!BookingStatus::Cancelled.occupies_slot());
        assert!(!BookingStatus::Rejected.occupies_slot());
    }

    #[test]
    fn test_status_wire_format() {
        let json = serde_json::to_string(&BookingStatus::PendingPayment).unwrap();
        assert_eq!(json, "\"PENDING_PAYMENT\"");
        let back: BookingStatus = serde_json::from_str("\"CONFIRMED\"").unwrap();
        assert_eq!(back, BookingStatus::Confirmed);
    }
}
