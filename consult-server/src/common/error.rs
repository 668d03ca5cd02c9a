//! Unified Error Handling
//!
//! Application-wide error type, response envelope, and the mapping from
//! engine errors to HTTP responses. Every engine error surfaces as a
//! specific, actionable message with a stable code, never a generic
//! failure.

use crate::booking::BookingError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

/// Unified API response structure
#[derive(Debug, Serialize)]
pub struct AppResponse<T> {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// Application-level error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ========== Business Logic Errors ==========
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    /// Conflicting state (slot taken, raced transition, repeated rating)
    #[error("{1}")]
    Conflict(&'static str, String),

    /// Precondition not met (session not over, foreign service)
    #[error("{1}")]
    BusinessRule(&'static str, String),

    // ========== System Errors ==========
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // Not found (404)
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "E0003", msg.clone()),

            // Validation (400)
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "E0002", msg.clone()),

            // Conflict (409)
            AppError::Conflict(code, msg) => (StatusCode::CONFLICT, *code, msg.clone()),

            // Business rule (422)
            AppError::BusinessRule(code, msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, *code, msg.clone())
            }

            // External capability down (503)
            AppError::ServiceUnavailable(msg) => {
                error!(target: "meeting", error = %msg, "Provisioning failure");
                (StatusCode::SERVICE_UNAVAILABLE, "E9003", msg.clone())
            }

            // Database errors (500)
            AppError::Database(msg) => {
                error!(target: "database", error = %msg, "Database error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "E9002",
                    "Database error".to_string(),
                )
            }

            // Internal errors (500)
            AppError::Internal(msg) => {
                error!(target: "internal", error = %msg, "Internal error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "E9001",
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(AppResponse::<()> {
            code: code.to_string(),
            message,
            data: None,
        });

        (status, body).into_response()
    }
}

impl From<BookingError> for AppError {
    fn from(e: BookingError) -> Self {
        match e {
            BookingError::InvalidRange(msg) => {
                AppError::Validation(format!("Invalid date range: {}", msg))
            }
            BookingError::SlotUnavailable => AppError::Conflict(
                "E1002",
                "This slot was just taken, please choose another time".to_string(),
            ),
            BookingError::HoldExpired => AppError::Conflict(
                "E1003",
                "The reservation expired before it was confirmed, please pick a slot again"
                    .to_string(),
            ),
            BookingError::HoldNotFound(id) => AppError::NotFound(format!("Hold {} not found", id)),
            BookingError::InvalidTransition { current } => AppError::Conflict(
                "E1005",
                format!("Booking is {}, this operation is not allowed", current),
            ),
            BookingError::ConcurrentModification => AppError::Conflict(
                "E1006",
                "The booking was changed by someone else, please reload and retry".to_string(),
            ),
            BookingError::TooEarly => AppError::BusinessRule(
                "E1007",
                "The session has not finished yet, complete it after it ends".to_string(),
            ),
            BookingError::AlreadyRated => AppError::Conflict(
                "E1008",
                "This booking has already been rated".to_string(),
            ),
            BookingError::NotFound(id) => AppError::NotFound(format!("{} not found", id)),
            BookingError::InvalidService(id) => AppError::BusinessRule(
                "E1009",
                format!("Service {} is not offered by this consultant", id),
            ),
            BookingError::MissingTopic => AppError::Validation(
                "Please provide a topic for the consultation".to_string(),
            ),
            BookingError::Validation(msg) => AppError::Validation(msg),
            BookingError::Provisioning(_) => AppError::ServiceUnavailable(
                "Could not prepare the meeting link, please try again".to_string(),
            ),
            BookingError::Storage(e) => AppError::Database(e.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::Validation(e.to_string())
    }
}
