//! Availability generation
//!
//! Computes the bookable slots for a consultant over a date range from the
//! weekly template and the current busy ranges. Pure calendar arithmetic:
//! no storage access, no clock, deterministic for a given input. The
//! caller collects busy ranges from the repository (occupying bookings and
//! live holds) and hands them in.

use super::error::{BookingError, BookingResult};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use shared::booking::{Availability, Slot, SlotStatus};
use shared::models::Consultant;

/// Hard cap on a single availability query, bounds the output size
pub const MAX_RANGE_DAYS: i64 = 90;

/// A time range that blocks candidate slots
#[derive(Debug, Clone)]
pub struct BusyRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub kind: BusyKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusyKind {
    Booked,
    Held,
}

impl BusyRange {
    fn covers(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

/// Generate the ordered slot sequence for one consultant
///
/// A candidate start time is BOOKED when it falls inside a booked range,
/// HELD when only a hold covers it, FREE otherwise. A disabled consultant
/// yields `offering: false` with no slots — that is a result, not an
/// error, so callers can tell "not offering" from "fully booked".
pub fn generate_slots(
    consultant: &Consultant,
    from: NaiveDate,
    to: NaiveDate,
    busy: &[BusyRange],
) -> BookingResult<Availability> {
    if from > to {
        return Err(BookingError::InvalidRange(format!(
            "{} is after {}",
            from, to
        )));
    }
    let span_days = (to - from).num_days();
    if span_days > MAX_RANGE_DAYS {
        return Err(BookingError::InvalidRange(format!(
            "range spans {} days, maximum is {}",
            span_days, MAX_RANGE_DAYS
        )));
    }

    if !consultant.is_available {
        return Ok(Availability::not_offering(consultant.id.clone()));
    }

    let template = &consultant.weekly_template;
    let mut slots = Vec::new();

    for date in from.iter_days().take_while(|d| *d <= to) {
        if !template.offers_on(date.weekday()) {
            continue;
        }

        for &time in &template.start_times {
            let start = date.and_time(time).and_utc();
            let status = slot_status(start, busy);
            slots.push(Slot::new(date, time, status));
        }
    }

    Ok(Availability {
        consultant_id: consultant.id.clone(),
        offering: true,
        slots,
    })
}

fn slot_status(start: DateTime<Utc>, busy: &[BusyRange]) -> SlotStatus {
    let mut held = false;
    for range in busy {
        if range.covers(start) {
            match range.kind {
                // A booking always wins over a hold on the same window
                BusyKind::Booked => return SlotStatus::Booked,
                BusyKind::Held => held = true,
            }
        }
    }
    if held { SlotStatus::Held } else { SlotStatus::Free }
}
