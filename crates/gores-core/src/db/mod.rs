//! Direct SQLite database access for gores.
//!
//! Holds the three tables the request handler works with: users, bookings
//! and the key/value rows backing browser sessions. Every method is a single
//! self-contained statement except [`Database::create_booking_exclusive`],
//! which wraps its read and insert in one immediate transaction.

pub mod types;

pub use types::*;

use crate::error::{Error, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

/// Schema for all gores tables.
pub const SCHEMA_SQL: &str = include_str!("migrations/001_schema.sql");

/// How long a statement waits for a lock held by another process.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Database connection wrapper.
///
/// Thread-safe via internal Mutex. All database operations acquire the lock.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open database at specific path
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open_path_with_timeout(path, DEFAULT_BUSY_TIMEOUT)
    }

    /// Open database at specific path with a custom busy timeout
    pub fn open_path_with_timeout(path: &Path, busy_timeout: Duration) -> Result<Self> {
        let conn = Connection::open(path).map_err(Error::Database)?;
        conn.busy_timeout(busy_timeout)?;
        debug!("opened database at {}", path.display());
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Open a private in-memory database with the schema applied
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(Error::Database)?;
        let db = Self { conn: Mutex::new(conn) };
        db.migrate()?;
        Ok(db)
    }

    /// Create all tables that do not exist yet
    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().map_err(|_| Error::LockPoisoned)?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(())
    }

    /// Check database connectivity
    pub fn ping(&self) -> Result<()> {
        let conn = self.conn.lock().map_err(|_| Error::LockPoisoned)?;
        conn.execute_batch("SELECT 1").map_err(Error::Database)
    }

    /// Check that every gores table exists
    pub fn has_schema(&self) -> Result<bool> {
        let conn = self.conn.lock().map_err(|_| Error::LockPoisoned)?;
        let count: u32 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master
             WHERE type = 'table' AND name IN ('users', 'bookings', 'session_entries')",
            [],
            |row| row.get(0),
        )?;
        Ok(count == 3)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Session Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Load all label/value rows for a session updated after `since_ms`
    pub fn load_session_values(
        &self,
        session_id: &str,
        since_ms: i64,
    ) -> Result<Vec<(String, String)>> {
        let conn = self.conn.lock().map_err(|_| Error::LockPoisoned)?;
        let mut stmt = conn.prepare(
            "SELECT label, value FROM session_entries
             WHERE session_id = ?1 AND updated_at > ?2",
        )?;

        let rows = stmt
            .query_map(params![session_id, since_ms], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Insert or overwrite one session value, stamping it with `now_ms`
    pub fn upsert_session_value(
        &self,
        session_id: &str,
        label: &str,
        value: &str,
        now_ms: i64,
    ) -> Result<()> {
        let conn = self.conn.lock().map_err(|_| Error::LockPoisoned)?;
        conn.execute(
            "INSERT INTO session_entries (session_id, label, value, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(session_id, label)
             DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![session_id, label, value, now_ms],
        )?;
        Ok(())
    }

    /// Remove every row of a session, returning the number of rows deleted
    pub fn delete_session(&self, session_id: &str) -> Result<usize> {
        let conn = self.conn.lock().map_err(|_| Error::LockPoisoned)?;
        let deleted = conn.execute(
            "DELETE FROM session_entries WHERE session_id = ?1",
            params![session_id],
        )?;
        Ok(deleted)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // User Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Get user by name
    pub fn get_user(&self, name: &str) -> Result<Option<User>> {
        let conn = self.conn.lock().map_err(|_| Error::LockPoisoned)?;
        let mut stmt =
            conn.prepare("SELECT name, email, phone, password FROM users WHERE name = ?1")?;

        Ok(stmt
            .query_row(params![name], |row| {
                Ok(User {
                    name: row.get(0)?,
                    email: row.get(1)?,
                    phone: row.get(2)?,
                    password: row.get(3)?,
                })
            })
            .optional()?)
    }

    /// Create a user, replacing an existing one with the same name
    pub fn upsert_user(&self, user: &User) -> Result<()> {
        let conn = self.conn.lock().map_err(|_| Error::LockPoisoned)?;
        conn.execute(
            "INSERT INTO users (name, email, phone, password) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(name) DO UPDATE SET
                email = excluded.email, phone = excluded.phone, password = excluded.password",
            params![user.name, user.email, user.phone, user.password],
        )?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Booking Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// List bookings intersecting `[start, end]`, ordered by begin date
    pub fn list_bookings_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<BookingEntry>> {
        let conn = self.conn.lock().map_err(|_| Error::LockPoisoned)?;
        Self::query_bookings_between(&conn, start, end)
    }

    /// Get booking by ID
    pub fn get_booking(&self, id: i64) -> Result<Option<BookingEntry>> {
        let conn = self.conn.lock().map_err(|_| Error::LockPoisoned)?;
        let mut stmt = conn.prepare(
            "SELECT id, owner, begin_date, end_date, note FROM bookings WHERE id = ?1",
        )?;

        Ok(stmt.query_row(params![id], Self::map_booking).optional()?)
    }

    /// Delete booking, returning whether a row was removed
    pub fn delete_booking(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock().map_err(|_| Error::LockPoisoned)?;
        let deleted = conn.execute("DELETE FROM bookings WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    /// Insert a booking unless `conflicts` reports a clash with the bookings
    /// already overlapping its range.
    ///
    /// The read and the insert share one `BEGIN IMMEDIATE` transaction, so a
    /// second process trying the same thing blocks on the write lock until
    /// this one commits and then sees the new row.
    pub fn create_booking_exclusive<F>(&self, booking: &NewBooking, conflicts: F) -> Result<i64>
    where
        F: FnOnce(&[BookingEntry]) -> bool,
    {
        let mut conn = self.conn.lock().map_err(|_| Error::LockPoisoned)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing = Self::query_bookings_between(&tx, booking.begin, booking.end)?;
        if conflicts(&existing) {
            // Dropping the transaction rolls it back.
            return Err(Error::Conflict(format!(
                "{} to {} overlaps {} existing booking(s)",
                booking.begin,
                booking.end,
                existing.len()
            )));
        }

        tx.execute(
            "INSERT INTO bookings (owner, begin_date, end_date, note) VALUES (?1, ?2, ?3, ?4)",
            params![booking.owner, booking.begin, booking.end, booking.note],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(id)
    }

    fn query_bookings_between(
        conn: &Connection,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<BookingEntry>> {
        let mut stmt = conn.prepare(
            "SELECT id, owner, begin_date, end_date, note FROM bookings
             WHERE end_date >= ?1 AND begin_date <= ?2
             ORDER BY begin_date ASC, id ASC",
        )?;

        let bookings = stmt
            .query_map(params![start, end], Self::map_booking)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(bookings)
    }

    fn map_booking(row: &rusqlite::Row) -> rusqlite::Result<BookingEntry> {
        Ok(BookingEntry {
            id: row.get(0)?,
            owner: row.get(1)?,
            begin: row.get(2)?,
            end: row.get(3)?,
            note: row.get(4)?,
            is_own: false,
            month: 0,
            year: 0,
        })
    }
}
