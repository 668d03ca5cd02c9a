//! Slot ledger — atomic slot reservation
//!
//! Owns the no-double-booking invariant. A reservation happens in two
//! steps: `try_reserve` claims the window with a TTL-bounded [`Hold`], and
//! `commit_hold` converts the hold into a `PENDING_PAYMENT` booking once
//! the request is complete. Abandoned holds expire and the slot frees
//! itself; nothing a caller forgets to clean up can block a calendar
//! permanently.
//!
//! Every mutation runs inside one redb write transaction. redb serializes
//! write transactions, so two overlapping `try_reserve` calls cannot both
//! observe a free window: exactly one commits, the other sees the new hold
//! and fails with a conflict.

use super::error::{BookingError, BookingResult};
use super::storage::{BookingStorage, Hold};
use chrono::{DateTime, Duration, Utc};
use shared::booking::{Booking, NewBooking};
use uuid::Uuid;

/// Default TTL for uncommitted holds
pub const DEFAULT_HOLD_TTL_SECS: u64 = 300;

/// Slot reservation ledger over the booking storage
#[derive(Clone)]
pub struct SlotLedger {
    storage: BookingStorage,
    hold_ttl: Duration,
}

impl SlotLedger {
    pub fn new(storage: BookingStorage, hold_ttl_secs: u64) -> Self {
        Self {
            storage,
            hold_ttl: Duration::seconds(hold_ttl_secs as i64),
        }
    }

    /// Atomically claim `[slot_start, slot_start + duration)` for a consultant
    ///
    /// Fails with [`BookingError::SlotUnavailable`] when the window overlaps
    /// a non-cancelled booking or a live hold. Expired holds are ignored
    /// here (lazy expiry), so a slot becomes reservable the instant its
    /// stale hold passes the TTL, even before the sweep removes it.
    pub fn try_reserve(
        &self,
        consultant_id: &str,
        slot_start: DateTime<Utc>,
        duration_min: u32,
        holder_id: &str,
        now: DateTime<Utc>,
    ) -> BookingResult<Hold> {
        let slot_end = slot_start + Duration::minutes(i64::from(duration_min));
        let txn = self.storage.begin_write()?;

        let conflict = self
            .storage
            .occupying_bookings_txn(&txn, consultant_id)?
            .iter()
            .any(|b| b.overlaps(slot_start, slot_end))
            || self
                .storage
                .holds_for_consultant_txn(&txn, consultant_id)?
                .iter()
                .any(|h| !h.is_expired(now) && h.overlaps(slot_start, slot_end));

        if conflict {
            tracing::debug!(
                consultant_id,
                %slot_start,
                "Reservation conflict, slot already taken"
            );
            return Err(BookingError::SlotUnavailable);
        }

        let hold = Hold {
            id: format!("hold-{}", Uuid::new_v4()),
            consultant_id: consultant_id.to_string(),
            slot_start,
            duration_min,
            holder_id: holder_id.to_string(),
            created_at: now,
            expires_at: now + self.hold_ttl,
        };

        self.storage.insert_hold(&txn, &hold)?;
        txn.commit().map_err(super::storage::StorageError::from)?;

        tracing::debug!(hold_id = %hold.id, consultant_id, %slot_start, "Slot held");
        Ok(hold)
    }

    /// Release a hold explicitly (caller abandoned the request)
    ///
    /// Releasing a hold that no longer exists is fine — it may have expired
    /// and been swept already.
    pub fn release_hold(&self, hold_id: &str) -> BookingResult<()> {
        let txn = self.storage.begin_write()?;
        if let Some(hold) = self.storage.get_hold_txn(&txn, hold_id)? {
            self.storage.remove_hold(&txn, &hold)?;
            txn.commit().map_err(super::storage::StorageError::from)?;
            tracing::debug!(hold_id, "Hold released");
        }
        Ok(())
    }

    /// Convert a hold into a persisted `PENDING_PAYMENT` booking
    ///
    /// The expiry check and the booking insert share one transaction, so
    /// the TTL sweep can never reclaim a hold that is mid-commit.
    pub fn commit_hold(
        &self,
        hold_id: &str,
        new: NewBooking,
        now: DateTime<Utc>,
    ) -> BookingResult<Booking> {
        let txn = self.storage.begin_write()?;

        let hold = self
            .storage
            .get_hold_txn(&txn, hold_id)?
            .ok_or_else(|| BookingError::HoldNotFound(hold_id.to_string()))?;

        if hold.is_expired(now) {
            // Reclaim it while we are here rather than leaving it to the sweep
            self.storage.remove_hold(&txn, &hold)?;
            txn.commit().map_err(super::storage::StorageError::from)?;
            return Err(BookingError::HoldExpired);
        }

        let booking = Booking::new(format!("bk-{}", Uuid::new_v4()), new, now);
        self.storage.insert_booking(&txn, &booking)?;
        self.storage.remove_hold(&txn, &hold)?;
        txn.commit().map_err(super::storage::StorageError::from)?;

        tracing::info!(
            booking_id = %booking.id,
            consultant_id = %booking.consultant_id,
            slot_start = %booking.slot_start,
            "Hold committed to booking"
        );
        Ok(booking)
    }

    /// Remove every hold whose TTL has elapsed, returns how many
    ///
    /// Runs as a periodic background task. The expiry re-check happens
    /// inside the write transaction, so a hold observed live by a
    /// concurrent `commit_hold` is never destroyed under it.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> BookingResult<usize> {
        let txn = self.storage.begin_write()?;

        let expired: Vec<Hold> = self
            .storage
            .all_holds_txn(&txn)?
            .into_iter()
            .filter(|h| h.is_expired(now))
            .collect();

        for hold in &expired {
            self.storage.remove_hold(&txn, hold)?;
        }
        txn.commit().map_err(super::storage::StorageError::from)?;

        if !expired.is_empty() {
            tracing::info!(count = expired.len(), "Swept expired holds");
        }
        Ok(expired.len())
    }
}
