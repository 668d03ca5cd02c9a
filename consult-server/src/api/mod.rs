//! API routing
//!
//! # Structure
//!
//! - [`health`] - liveness check
//! - [`consultants`] - consultant directory and availability queries
//! - [`bookings`] - booking lifecycle operations

pub mod bookings;
pub mod consultants;
pub mod health;

use crate::core::ServerState;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// Re-export common types for handlers
pub use crate::common::{AppError, AppResult};

/// Compose the full application router
pub fn router(state: ServerState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(consultants::router())
        .merge(bookings::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
