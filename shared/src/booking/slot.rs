//! Computed slot views
//!
//! Slots are derived on demand from the weekly template minus the current
//! booking/hold state; they are never persisted as rows.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Derived availability of a candidate slot
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotStatus {
    Free,
    /// A reservation is in flight but not yet committed
    Held,
    Booked,
}

/// A candidate bookable time window for one consultant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    /// Stable display id, `slot-YYYY-MM-DD-HHMM`
    pub id: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub start: DateTime<Utc>,
    pub status: SlotStatus,
}

impl Slot {
    pub fn new(date: NaiveDate, time: NaiveTime, status: SlotStatus) -> Self {
        Self {
            id: format!("slot-{}-{}", date.format("%Y-%m-%d"), time.format("%H%M")),
            date,
            time,
            start: date.and_time(time).and_utc(),
            status,
        }
    }

    pub fn is_free(&self) -> bool {
        self.status == SlotStatus::Free
    }
}

/// Result of an availability query
///
/// `offering == false` means the consultant's kill switch is off ("not
/// offering consultations at all"), which the caller must distinguish from
/// an offering consultant who is temporarily fully booked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Availability {
    pub consultant_id: String,
    pub offering: bool,
    pub slots: Vec<Slot>,
}

impl Availability {
    /// An empty result for a consultant who is not taking bookings
    pub fn not_offering(consultant_id: impl Into<String>) -> Self {
        Self {
            consultant_id: consultant_id.into(),
            offering: false,
            slots: Vec::new(),
        }
    }
}
