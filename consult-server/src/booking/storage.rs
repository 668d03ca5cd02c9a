//! redb-based storage for bookings and holds
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `bookings` | booking_id | `Booking` | Authoritative booking records |
//! | `bookings_by_consultant` | `(consultant_id, booking_id)` | `()` | Calendar queries |
//! | `bookings_by_requester` | `(requester_id, booking_id)` | `()` | "My bookings" queries |
//! | `holds` | hold_id | `Hold` | In-flight reservations |
//! | `holds_by_consultant` | `(consultant_id, hold_id)` | `()` | Per-consultant conflict scans |
//!
//! # Concurrency
//!
//! redb admits a single write transaction at a time, so every mutation that
//! runs inside one write transaction is atomic with respect to all other
//! writers. The ledger and the state machine rely on this: overlap checks
//! and the status compare-and-swap both read and write within one
//! transaction.

use chrono::{DateTime, Duration, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use serde::{Deserialize, Serialize};
use shared::booking::{Booking, BookingStatus};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Booking records: key = booking_id, value = JSON-serialized Booking
const BOOKINGS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("bookings");

/// Secondary index: key = (consultant_id, booking_id), value = empty
const BOOKINGS_BY_CONSULTANT: TableDefinition<(&str, &str), ()> =
    TableDefinition::new("bookings_by_consultant");

/// Secondary index: key = (requester_id, booking_id), value = empty
const BOOKINGS_BY_REQUESTER: TableDefinition<(&str, &str), ()> =
    TableDefinition::new("bookings_by_requester");

/// Holds: key = hold_id, value = JSON-serialized Hold
const HOLDS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("holds");

/// Secondary index: key = (consultant_id, hold_id), value = empty
const HOLDS_BY_CONSULTANT: TableDefinition<(&str, &str), ()> =
    TableDefinition::new("holds_by_consultant");

/// A short-lived claim on a slot while a booking request is in flight
///
/// Holds are durable so an interrupted checkout cannot silently lose its
/// reservation on restart; the TTL sweep reclaims the ones never committed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hold {
    pub id: String,
    pub consultant_id: String,
    pub slot_start: DateTime<Utc>,
    pub duration_min: u32,
    pub holder_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Hold {
    /// End of the held time range, exclusive
    pub fn slot_end(&self) -> DateTime<Utc> {
        self.slot_start + Duration::minutes(i64::from(self.duration_min))
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Half-open range overlap test against `[start, end)`
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.slot_start < end && start < self.slot_end()
    }
}

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Booking not found: {0}")]
    BookingNotFound(String),

    #[error("Hold not found: {0}")]
    HoldNotFound(String),

    /// Compare-and-swap observed a different status than the caller expected
    #[error("Status conflict on {id}: expected {expected}, found {actual}")]
    StatusConflict {
        id: String,
        expected: BookingStatus,
        actual: BookingStatus,
    },

    /// A rating is already stored; ratings are write-once
    #[error("Rating already exists on {0}")]
    RatingExists(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Booking storage backed by redb
#[derive(Clone)]
pub struct BookingStorage {
    db: Arc<Database>,
}

impl BookingStorage {
    /// Open or create the database at the given path
    ///
    /// redb commits are durable as soon as `commit()` returns (copy-on-write
    /// with atomic pointer swap), so a power loss never leaves the booking
    /// set in a half-written state.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    /// Create all tables so later read transactions never hit a missing table
    fn init_tables(&self) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let _ = write_txn.open_table(BOOKINGS_TABLE)?;
            let _ = write_txn.open_table(BOOKINGS_BY_CONSULTANT)?;
            let _ = write_txn.open_table(BOOKINGS_BY_REQUESTER)?;
            let _ = write_txn.open_table(HOLDS_TABLE)?;
            let _ = write_txn.open_table(HOLDS_BY_CONSULTANT)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Booking Operations ==========

    /// Insert a new booking and its index entries (within transaction)
    pub fn insert_booking(&self, txn: &WriteTransaction, booking: &Booking) -> StorageResult<()> {
        let value = serde_json::to_vec(booking)?;
        {
            let mut table = txn.open_table(BOOKINGS_TABLE)?;
            table.insert(booking.id.as_str(), value.as_slice())?;
        }
        {
            let mut index = txn.open_table(BOOKINGS_BY_CONSULTANT)?;
            index.insert((booking.consultant_id.as_str(), booking.id.as_str()), ())?;
        }
        {
            let mut index = txn.open_table(BOOKINGS_BY_REQUESTER)?;
            index.insert((booking.requester_id.as_str(), booking.id.as_str()), ())?;
        }
        Ok(())
    }

    /// Overwrite an existing booking record (within transaction)
    ///
    /// Consultant/requester ids are immutable, so the index entries never
    /// need rewriting.
    pub fn store_booking(&self, txn: &WriteTransaction, booking: &Booking) -> StorageResult<()> {
        let value = serde_json::to_vec(booking)?;
        let mut table = txn.open_table(BOOKINGS_TABLE)?;
        table.insert(booking.id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Get a booking by id
    pub fn get_booking(&self, booking_id: &str) -> StorageResult<Option<Booking>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(BOOKINGS_TABLE)?;

        match table.get(booking_id)? {
            Some(value) => {
                let booking: Booking = serde_json::from_slice(value.value())?;
                Ok(Some(booking))
            }
            None => Ok(None),
        }
    }

    /// Get a booking by id (within transaction)
    pub fn get_booking_txn(
        &self,
        txn: &WriteTransaction,
        booking_id: &str,
    ) -> StorageResult<Option<Booking>> {
        let table = txn.open_table(BOOKINGS_TABLE)?;

        match table.get(booking_id)? {
            Some(value) => {
                let booking: Booking = serde_json::from_slice(value.value())?;
                Ok(Some(booking))
            }
            None => Ok(None),
        }
    }

    /// All bookings for a consultant, optionally filtered by status
    pub fn find_by_consultant(
        &self,
        consultant_id: &str,
        status: Option<BookingStatus>,
    ) -> StorageResult<Vec<Booking>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(BOOKINGS_BY_CONSULTANT)?;
        let table = read_txn.open_table(BOOKINGS_TABLE)?;

        let mut bookings = Vec::new();
        for entry in index.range((consultant_id, "")..)? {
            let (key, _) = entry?;
            let (cid, booking_id) = key.value();
            if cid != consultant_id {
                break;
            }
            if let Some(value) = table.get(booking_id)? {
                let booking: Booking = serde_json::from_slice(value.value())?;
                if status.is_none_or(|s| booking.status == s) {
                    bookings.push(booking);
                }
            }
        }

        bookings.sort_by_key(|b| b.slot_start);
        Ok(bookings)
    }

    /// All bookings created by a requester, optionally filtered by status
    pub fn find_by_requester(
        &self,
        requester_id: &str,
        status: Option<BookingStatus>,
    ) -> StorageResult<Vec<Booking>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(BOOKINGS_BY_REQUESTER)?;
        let table = read_txn.open_table(BOOKINGS_TABLE)?;

        let mut bookings = Vec::new();
        for entry in index.range((requester_id, "")..)? {
            let (key, _) = entry?;
            let (rid, booking_id) = key.value();
            if rid != requester_id {
                break;
            }
            if let Some(value) = table.get(booking_id)? {
                let booking: Booking = serde_json::from_slice(value.value())?;
                if status.is_none_or(|s| booking.status == s) {
                    bookings.push(booking);
                }
            }
        }

        bookings.sort_by_key(|b| b.slot_start);
        Ok(bookings)
    }

    /// Slot-occupying (non-cancelled, non-rejected) bookings for a
    /// consultant, read within a write transaction for conflict checks
    pub fn occupying_bookings_txn(
        &self,
        txn: &WriteTransaction,
        consultant_id: &str,
    ) -> StorageResult<Vec<Booking>> {
        let index = txn.open_table(BOOKINGS_BY_CONSULTANT)?;
        let table = txn.open_table(BOOKINGS_TABLE)?;

        let mut bookings = Vec::new();
        for entry in index.range((consultant_id, "")..)? {
            let (key, _) = entry?;
            let (cid, booking_id) = key.value();
            if cid != consultant_id {
                break;
            }
            if let Some(value) = table.get(booking_id)? {
                let booking: Booking = serde_json::from_slice(value.value())?;
                if booking.occupies_slot() {
                    bookings.push(booking);
                }
            }
        }
        Ok(bookings)
    }

    /// Slot-occupying bookings for a consultant (consistent read snapshot)
    pub fn occupying_bookings(&self, consultant_id: &str) -> StorageResult<Vec<Booking>> {
        Ok(self
            .find_by_consultant(consultant_id, None)?
            .into_iter()
            .filter(Booking::occupies_slot)
            .collect())
    }

    /// Atomically update a booking's status
    ///
    /// The closure is applied only when the stored status matches
    /// `expected`; otherwise the transaction is abandoned and
    /// [`StorageError::StatusConflict`] reports what was actually stored.
    /// This is what serializes racing transitions on one booking.
    pub fn compare_and_swap_status(
        &self,
        booking_id: &str,
        expected: BookingStatus,
        mutate: impl FnOnce(&mut Booking),
    ) -> StorageResult<Booking> {
        let txn = self.db.begin_write()?;

        let mut booking = self
            .get_booking_txn(&txn, booking_id)?
            .ok_or_else(|| StorageError::BookingNotFound(booking_id.to_string()))?;

        if booking.status != expected {
            return Err(StorageError::StatusConflict {
                id: booking_id.to_string(),
                expected,
                actual: booking.status,
            });
        }

        mutate(&mut booking);
        self.store_booking(&txn, &booking)?;
        txn.commit()?;
        Ok(booking)
    }

    /// Write-once rating on a completed booking
    ///
    /// The status and the "no rating yet" checks share the write
    /// transaction with the update, so two racing `Rate` calls cannot both
    /// pass the guard.
    pub fn write_rating(
        &self,
        booking_id: &str,
        rating: u8,
        review: Option<String>,
    ) -> StorageResult<Booking> {
        let txn = self.db.begin_write()?;

        let mut booking = self
            .get_booking_txn(&txn, booking_id)?
            .ok_or_else(|| StorageError::BookingNotFound(booking_id.to_string()))?;

        if booking.status != BookingStatus::Completed {
            return Err(StorageError::StatusConflict {
                id: booking_id.to_string(),
                expected: BookingStatus::Completed,
                actual: booking.status,
            });
        }
        if booking.rating.is_some() {
            return Err(StorageError::RatingExists(booking_id.to_string()));
        }

        booking.rating = Some(rating);
        booking.review = review;
        self.store_booking(&txn, &booking)?;
        txn.commit()?;
        Ok(booking)
    }

    // ========== Hold Operations ==========

    /// Insert a hold and its index entry (within transaction)
    pub fn insert_hold(&self, txn: &WriteTransaction, hold: &Hold) -> StorageResult<()> {
        let value = serde_json::to_vec(hold)?;
        {
            let mut table = txn.open_table(HOLDS_TABLE)?;
            table.insert(hold.id.as_str(), value.as_slice())?;
        }
        {
            let mut index = txn.open_table(HOLDS_BY_CONSULTANT)?;
            index.insert((hold.consultant_id.as_str(), hold.id.as_str()), ())?;
        }
        Ok(())
    }

    /// Get a hold by id (within transaction)
    pub fn get_hold_txn(
        &self,
        txn: &WriteTransaction,
        hold_id: &str,
    ) -> StorageResult<Option<Hold>> {
        let table = txn.open_table(HOLDS_TABLE)?;

        match table.get(hold_id)? {
            Some(value) => {
                let hold: Hold = serde_json::from_slice(value.value())?;
                Ok(Some(hold))
            }
            None => Ok(None),
        }
    }

    /// Remove a hold and its index entry (within transaction)
    pub fn remove_hold(&self, txn: &WriteTransaction, hold: &Hold) -> StorageResult<()> {
        {
            let mut table = txn.open_table(HOLDS_TABLE)?;
            table.remove(hold.id.as_str())?;
        }
        {
            let mut index = txn.open_table(HOLDS_BY_CONSULTANT)?;
            index.remove((hold.consultant_id.as_str(), hold.id.as_str()))?;
        }
        Ok(())
    }

    /// All holds for a consultant, expired ones included (within transaction)
    pub fn holds_for_consultant_txn(
        &self,
        txn: &WriteTransaction,
        consultant_id: &str,
    ) -> StorageResult<Vec<Hold>> {
        let index = txn.open_table(HOLDS_BY_CONSULTANT)?;
        let table = txn.open_table(HOLDS_TABLE)?;

        let mut holds = Vec::new();
        for entry in index.range((consultant_id, "")..)? {
            let (key, _) = entry?;
            let (cid, hold_id) = key.value();
            if cid != consultant_id {
                break;
            }
            if let Some(value) = table.get(hold_id)? {
                holds.push(serde_json::from_slice(value.value())?);
            }
        }
        Ok(holds)
    }

    /// All holds for a consultant (consistent read snapshot)
    pub fn holds_for_consultant(&self, consultant_id: &str) -> StorageResult<Vec<Hold>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(HOLDS_BY_CONSULTANT)?;
        let table = read_txn.open_table(HOLDS_TABLE)?;

        let mut holds = Vec::new();
        for entry in index.range((consultant_id, "")..)? {
            let (key, _) = entry?;
            let (cid, hold_id) = key.value();
            if cid != consultant_id {
                break;
            }
            if let Some(value) = table.get(hold_id)? {
                holds.push(serde_json::from_slice(value.value())?);
            }
        }
        Ok(holds)
    }

    /// Every stored hold (within transaction) — used by the expiry sweep
    pub fn all_holds_txn(&self, txn: &WriteTransaction) -> StorageResult<Vec<Hold>> {
        let table = txn.open_table(HOLDS_TABLE)?;

        let mut holds = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            holds.push(serde_json::from_slice(value.value())?);
        }
        Ok(holds)
    }
}
