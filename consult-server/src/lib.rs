//! Consult Server - consultation booking & availability engine
//!
//! # Architecture
//!
//! The engine manages bookable time slots for consultants, turns a student
//! request into a reserved, paid, and eventually completed session, and
//! protects the invariants a shared calendar needs: no double-booking,
//! consistent status transitions, idempotent cancellation.
//!
//! # Module structure
//!
//! ```text
//! consult-server/src/
//! ├── core/          # config, state, server, background tasks
//! ├── api/           # HTTP routes and handlers
//! ├── booking/       # availability, slot ledger, state machine, storage
//! ├── services/      # consultant catalog, meeting provisioning
//! └── common/        # errors, logging
//! ```

pub mod api;
pub mod booking;
pub mod common;
pub mod core;
pub mod services;

// Re-export public types
pub use booking::{BookingError, BookingManager, BookingStorage, SlotLedger};
pub use common::{AppError, AppResult};
pub use core::{Config, Server, ServerState};
pub use services::{CatalogService, MeetingProvisioner};

// Re-export logger functions
pub use common::logger::{cleanup_old_logs, init_logger, init_logger_with_file};
