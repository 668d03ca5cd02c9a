//! Booking API Handlers
//!
//! Thin adapters over [`BookingManager`]: validate the payload, pass the
//! current instant, translate engine errors into the response envelope.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::Utc;
use serde::Deserialize;
use validator::Validate;

use crate::common::{AppError, AppResult};
use crate::core::ServerState;
use shared::booking::{
    Booking, BookingStatus, CancelBookingRequest, CreateBookingRequest, PayBookingRequest,
    RateBookingRequest, RejectBookingRequest,
};

/// Query params for listing bookings
///
/// Exactly one of `requester_id` / `consultant_id` selects the party.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub requester_id: Option<String>,
    pub consultant_id: Option<String>,
    pub status: Option<BookingStatus>,
}

/// Create a booking (reserve + commit in one request)
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CreateBookingRequest>,
) -> AppResult<Json<Booking>> {
    payload.validate()?;
    let booking = state.manager.create_booking(&payload, Utc::now())?;
    Ok(Json(booking))
}

/// List bookings for a requester or a consultant
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Booking>>> {
    let bookings = match (&query.requester_id, &query.consultant_id) {
        (Some(requester_id), None) => state
            .manager
            .bookings_for_requester(requester_id, query.status)?,
        (None, Some(consultant_id)) => state
            .manager
            .bookings_for_consultant(consultant_id, query.status)?,
        _ => {
            return Err(AppError::Validation(
                "Provide exactly one of requester_id or consultant_id".to_string(),
            ));
        }
    };
    Ok(Json(bookings))
}

/// Get booking by id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Booking>> {
    let booking = state.manager.get_booking(&id)?;
    Ok(Json(booking))
}

/// Confirm payment of a pending booking
pub async fn pay(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<PayBookingRequest>,
) -> AppResult<Json<Booking>> {
    payload.validate()?;
    let booking = state
        .manager
        .confirm_payment(&id, &payload.payment_ref, Utc::now())
        .await?;
    Ok(Json(booking))
}

/// Cancel a pending or confirmed booking
pub async fn cancel(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<CancelBookingRequest>,
) -> AppResult<Json<Booking>> {
    let booking = state.manager.cancel(&id, payload.actor, Utc::now())?;
    Ok(Json(booking))
}

/// Consultant declines a pending booking
pub async fn reject(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<RejectBookingRequest>,
) -> AppResult<Json<Booking>> {
    let booking = state.manager.reject(&id, payload.reason, Utc::now())?;
    Ok(Json(booking))
}

/// Complete a confirmed booking after the session ends
pub async fn complete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Booking>> {
    let booking = state.manager.complete(&id, Utc::now())?;
    Ok(Json(booking))
}

/// Rate a completed booking, write-once
pub async fn rate(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<RateBookingRequest>,
) -> AppResult<Json<Booking>> {
    let booking = state.manager.rate(&id, payload.rating, payload.review)?;
    Ok(Json(booking))
}
