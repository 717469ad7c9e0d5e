//! Database types for gores-core.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Years whose dates are stored as four-digit `YYYY-MM-DD` text.
///
/// Range queries compare that text, so dates outside these years would sort
/// out of order (`+10000-01-01` sorts before `2024-03-10`).
pub const STORABLE_YEARS: RangeInclusive<i32> = 1..=9999;

/// Whether `date` can be stored and range-queried.
pub fn is_storable(date: NaiveDate) -> bool {
    STORABLE_YEARS.contains(&date.year())
}

// ─────────────────────────────────────────────────────────────────────────────
// Entity Types
// ─────────────────────────────────────────────────────────────────────────────

/// A registered user.
///
/// The password column holds clear text; it is only ever compared, never
/// shown. Hashing it needs a schema migration and is not done yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing)]
    pub password: String,
}

/// A reservation covering the closed date range `[begin, end]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingEntry {
    pub id: i64,
    pub owner: String,
    pub begin: NaiveDate,
    pub end: NaiveDate,
    pub note: String,
    /// Set when the entry belongs to the user viewing the calendar.
    #[serde(default)]
    pub is_own: bool,
    /// Month the entry was fetched for (not derived from its own dates).
    #[serde(default)]
    pub month: u32,
    /// Year the entry was fetched for.
    #[serde(default)]
    pub year: i32,
}

impl BookingEntry {
    /// Whether `day` lies inside the closed interval of this entry.
    pub fn covers(&self, day: NaiveDate) -> bool {
        self.begin <= day && day <= self.end
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Input Types (for creating entities)
// ─────────────────────────────────────────────────────────────────────────────

/// Input for creating a new booking
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub owner: String,
    pub begin: NaiveDate,
    pub end: NaiveDate,
    pub note: String,
}
