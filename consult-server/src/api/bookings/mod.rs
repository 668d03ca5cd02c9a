//! Booking API Module
//!
//! Each lifecycle transition is its own POST route; there is no generic
//! status-update endpoint.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

/// Booking router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/bookings", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::create).get(handler::list))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/pay", post(handler::pay))
        .route("/{id}/cancel", post(handler::cancel))
        .route("/{id}/reject", post(handler::reject))
        .route("/{id}/complete", post(handler::complete))
        .route("/{id}/rating", post(handler::rate))
}
