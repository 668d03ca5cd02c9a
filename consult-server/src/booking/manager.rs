//! BookingManager - the booking state machine
//!
//! Every lifecycle change is a named transition that validates its own
//! precondition; nothing outside this module assigns a booking status.
//!
//! ```text
//! PENDING_PAYMENT ──confirm_payment──▶ CONFIRMED ──complete──▶ COMPLETED ──rate
//!        │   │                            │
//!        │   └──────reject──▶ REJECTED    │
//!        └──────────cancel──▶ CANCELLED ◀─┘
//! ```
//!
//! Races on one booking are decided by the storage compare-and-swap:
//! whichever transition commits first wins, and the loser observes the
//! winner's status as an invalid-transition error instead of silently
//! overwriting it.

use super::availability::{BusyKind, BusyRange, generate_slots};
use super::error::{BookingError, BookingResult};
use super::ledger::SlotLedger;
use super::storage::{BookingStorage, StorageError};
use crate::services::{CatalogService, MeetingProvisioner};
use chrono::{DateTime, NaiveDate, Utc};
use shared::booking::{
    Availability, Booking, BookingStatus, CancelActor, CreateBookingRequest, NewBooking,
};
use std::sync::Arc;

/// Booking state machine over the slot ledger and storage
pub struct BookingManager {
    storage: BookingStorage,
    ledger: SlotLedger,
    catalog: Arc<CatalogService>,
    meetings: Arc<dyn MeetingProvisioner>,
}

impl BookingManager {
    pub fn new(
        storage: BookingStorage,
        catalog: Arc<CatalogService>,
        meetings: Arc<dyn MeetingProvisioner>,
        hold_ttl_secs: u64,
    ) -> Self {
        let ledger = SlotLedger::new(storage.clone(), hold_ttl_secs);
        Self {
            storage,
            ledger,
            catalog,
            meetings,
        }
    }

    /// Direct access to the reservation ledger
    pub fn ledger(&self) -> &SlotLedger {
        &self.ledger
    }

    fn require(&self, booking_id: &str) -> BookingResult<Booking> {
        self.storage
            .get_booking(booking_id)?
            .ok_or_else(|| BookingError::NotFound(booking_id.to_string()))
    }

    // ========== Transitions ==========

    /// Create a booking: validate against the catalog, reserve the slot,
    /// commit the hold into a `PENDING_PAYMENT` record
    ///
    /// The service's price and duration are frozen into the booking here;
    /// later catalog edits never touch existing bookings.
    pub fn create_booking(
        &self,
        request: &CreateBookingRequest,
        now: DateTime<Utc>,
    ) -> BookingResult<Booking> {
        // 1. Referential checks against the catalog
        let consultant = self
            .catalog
            .get_consultant(&request.consultant_id)
            .ok_or_else(|| BookingError::NotFound(request.consultant_id.clone()))?;

        let topic = request.topic.trim();
        if topic.is_empty() {
            return Err(BookingError::MissingTopic);
        }

        let service = consultant
            .service(&request.service_id)
            .ok_or_else(|| BookingError::InvalidService(request.service_id.clone()))?;

        // 2. Kill switch: a disabled consultant offers no slots at all
        if !consultant.is_available {
            return Err(BookingError::SlotUnavailable);
        }

        // 3. Reserve the window, then commit the hold in the same request
        let hold = self.ledger.try_reserve(
            &consultant.id,
            request.slot_start,
            service.duration_min,
            &request.requester_id,
            now,
        )?;

        let booking = self.ledger.commit_hold(
            &hold.id,
            NewBooking {
                consultant_id: consultant.id.clone(),
                service_id: service.id.clone(),
                duration_min: service.duration_min,
                price: service.price,
                slot_start: request.slot_start,
                requester_id: request.requester_id.clone(),
                topic: topic.to_string(),
                description: request.description.clone(),
                attachment_url: request.attachment_url.clone(),
            },
            now,
        )?;

        tracing::info!(
            booking_id = %booking.id,
            consultant_id = %booking.consultant_id,
            requester_id = %booking.requester_id,
            "Booking created"
        );
        Ok(booking)
    }

    /// Confirm payment: provision the meeting link and flip to `CONFIRMED`
    ///
    /// The link is obtained before the status write, and both land in one
    /// committed update, so a confirmed booking always has its link. A
    /// provisioning failure leaves the booking in `PENDING_PAYMENT` and the
    /// caller simply retries. Re-confirming with the same payment
    /// reference is a no-op returning the stored record.
    pub async fn confirm_payment(
        &self,
        booking_id: &str,
        payment_ref: &str,
        now: DateTime<Utc>,
    ) -> BookingResult<Booking> {
        let booking = self.require(booking_id)?;

        match booking.status {
            BookingStatus::PendingPayment => {
                let link = self
                    .meetings
                    .provision(booking_id)
                    .await
                    .map_err(|e| BookingError::Provisioning(e.to_string()))?;

                let payment_ref = payment_ref.to_string();
                let link_for_update = link.clone();
                let ref_for_update = payment_ref.clone();
                match self.storage.compare_and_swap_status(
                    booking_id,
                    BookingStatus::PendingPayment,
                    move |b| {
                        b.status = BookingStatus::Confirmed;
                        b.meeting_link = Some(link_for_update);
                        b.payment_ref = Some(ref_for_update);
                        b.paid_at = Some(now);
                    },
                ) {
                    Ok(updated) => {
                        tracing::info!(booking_id, "Payment confirmed, meeting link assigned");
                        Ok(updated)
                    }
                    Err(StorageError::StatusConflict {
                        actual: BookingStatus::Confirmed,
                        ..
                    }) => {
                        // Lost a race to another confirmation; same reference
                        // means the work is already done
                        let stored = self.require(booking_id)?;
                        if stored.payment_ref.as_deref() == Some(payment_ref.as_str()) {
                            Ok(stored)
                        } else {
                            Err(BookingError::InvalidTransition {
                                current: BookingStatus::Confirmed,
                            })
                        }
                    }
                    Err(e) => Err(BookingError::from_cas(e)),
                }
            }
            BookingStatus::Confirmed => {
                if booking.payment_ref.as_deref() == Some(payment_ref) {
                    Ok(booking)
                } else {
                    Err(BookingError::InvalidTransition {
                        current: BookingStatus::Confirmed,
                    })
                }
            }
            status => Err(BookingError::InvalidTransition { current: status }),
        }
    }

    /// Cancel a pending or confirmed booking
    ///
    /// Cancellation is idempotent: repeating it returns the original
    /// record, original `cancelled_at` included. The slot frees itself
    /// because cancelled bookings stop occupying the calendar.
    pub fn cancel(
        &self,
        booking_id: &str,
        actor: CancelActor,
        now: DateTime<Utc>,
    ) -> BookingResult<Booking> {
        let booking = self.require(booking_id)?;

        match booking.status {
            BookingStatus::PendingPayment | BookingStatus::Confirmed => {
                match self
                    .storage
                    .compare_and_swap_status(booking_id, booking.status, move |b| {
                        b.status = BookingStatus::Cancelled;
                        b.cancelled_at = Some(now);
                        b.cancelled_by = Some(actor);
                    }) {
                    Ok(updated) => {
                        tracing::info!(booking_id, actor = ?actor, "Booking cancelled");
                        Ok(updated)
                    }
                    Err(StorageError::StatusConflict {
                        actual: BookingStatus::Cancelled,
                        ..
                    }) => {
                        // Another cancel won the race; still a success
                        self.require(booking_id)
                    }
                    Err(e) => Err(BookingError::from_cas(e)),
                }
            }
            BookingStatus::Cancelled => Ok(booking),
            status => Err(BookingError::InvalidTransition { current: status }),
        }
    }

    /// Consultant declines a booking before it is paid
    pub fn reject(
        &self,
        booking_id: &str,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> BookingResult<Booking> {
        let booking = self.require(booking_id)?;

        match booking.status {
            BookingStatus::PendingPayment => {
                let updated = self
                    .storage
                    .compare_and_swap_status(booking_id, BookingStatus::PendingPayment, move |b| {
                        b.status = BookingStatus::Rejected;
                        b.rejected_at = Some(now);
                        b.reject_reason = reason;
                    })
                    .map_err(BookingError::from_cas)?;
                tracing::info!(booking_id, "Booking rejected by consultant");
                Ok(updated)
            }
            status => Err(BookingError::InvalidTransition { current: status }),
        }
    }

    /// Mark a confirmed booking as completed once the session is over
    pub fn complete(&self, booking_id: &str, now: DateTime<Utc>) -> BookingResult<Booking> {
        let booking = self.require(booking_id)?;

        match booking.status {
            BookingStatus::Confirmed => {
                if now < booking.slot_end() {
                    return Err(BookingError::TooEarly);
                }
                let updated = self
                    .storage
                    .compare_and_swap_status(booking_id, BookingStatus::Confirmed, move |b| {
                        b.status = BookingStatus::Completed;
                        b.completed_at = Some(now);
                    })
                    .map_err(BookingError::from_cas)?;
                tracing::info!(booking_id, "Booking completed");
                Ok(updated)
            }
            status => Err(BookingError::InvalidTransition { current: status }),
        }
    }

    /// Attach a rating to a completed booking, write-once
    pub fn rate(
        &self,
        booking_id: &str,
        rating: u8,
        review: Option<String>,
    ) -> BookingResult<Booking> {
        if !(1..=5).contains(&rating) {
            return Err(BookingError::Validation(format!(
                "rating must be 1-5, got {}",
                rating
            )));
        }

        match self.storage.write_rating(booking_id, rating, review) {
            Ok(updated) => {
                tracing::info!(booking_id, rating, "Booking rated");
                Ok(updated)
            }
            Err(StorageError::RatingExists(_)) => Err(BookingError::AlreadyRated),
            Err(StorageError::StatusConflict { actual, .. }) => {
                Err(BookingError::InvalidTransition { current: actual })
            }
            Err(StorageError::BookingNotFound(id)) => Err(BookingError::NotFound(id)),
            Err(e) => Err(BookingError::Storage(e)),
        }
    }

    // ========== Queries ==========

    /// Bookable slots for a consultant over a date range
    ///
    /// Recomputed from the current booking/hold state on every call; the
    /// ledger never keeps a separate occupancy copy that could drift.
    pub fn availability(
        &self,
        consultant_id: &str,
        from: NaiveDate,
        to: NaiveDate,
        now: DateTime<Utc>,
    ) -> BookingResult<Availability> {
        let consultant = self
            .catalog
            .get_consultant(consultant_id)
            .ok_or_else(|| BookingError::NotFound(consultant_id.to_string()))?;

        let mut busy: Vec<BusyRange> = self
            .storage
            .occupying_bookings(consultant_id)?
            .iter()
            .map(|b| BusyRange {
                start: b.slot_start,
                end: b.slot_end(),
                kind: BusyKind::Booked,
            })
            .collect();

        busy.extend(
            self.storage
                .holds_for_consultant(consultant_id)?
                .iter()
                .filter(|h| !h.is_expired(now))
                .map(|h| BusyRange {
                    start: h.slot_start,
                    end: h.slot_end(),
                    kind: BusyKind::Held,
                }),
        );

        generate_slots(&consultant, from, to, &busy)
    }

    /// Get a booking by id
    pub fn get_booking(&self, booking_id: &str) -> BookingResult<Booking> {
        self.require(booking_id)
    }

    /// A requester's bookings, optionally filtered by status
    pub fn bookings_for_requester(
        &self,
        requester_id: &str,
        status: Option<BookingStatus>,
    ) -> BookingResult<Vec<Booking>> {
        Ok(self.storage.find_by_requester(requester_id, status)?)
    }

    /// A consultant's bookings, optionally filtered by status
    pub fn bookings_for_consultant(
        &self,
        consultant_id: &str,
        status: Option<BookingStatus>,
    ) -> BookingResult<Vec<Booking>> {
        Ok(self.storage.find_by_consultant(consultant_id, status)?)
    }

    // ========== Maintenance ==========

    /// Reclaim holds whose TTL elapsed, called by the periodic sweep task
    pub fn sweep_expired_holds(&self, now: DateTime<Utc>) -> BookingResult<usize> {
        self.ledger.sweep_expired(now)
    }
}
