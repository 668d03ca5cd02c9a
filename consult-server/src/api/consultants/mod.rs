//! Consultant API Module
//!
//! Read-only access to the consultant directory plus availability queries.
//! All calendar mutations go through the bookings API.

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

/// Consultant router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/consultants", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/availability", get(handler::availability))
}
