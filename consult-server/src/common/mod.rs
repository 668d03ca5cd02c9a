//! Common utilities
//!
//! - [`error`] - application error type and response envelope
//! - [`logger`] - tracing setup

pub mod error;
pub mod logger;

// Re-exports
pub use error::{AppError, AppResponse, AppResult};
pub use logger::{cleanup_old_logs, init_logger, init_logger_with_file};
