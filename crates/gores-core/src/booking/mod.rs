//! Booking creation and deletion guarded against overlapping reservations.
//!
//! Intervals are closed on both ends at day granularity, so two bookings that
//! share a single boundary date conflict.

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::db::{is_storable, BookingEntry, Database, NewBooking};
use crate::error::{Error, Result};

/// Whether the closed interval `[begin, end]` clashes with `existing`.
///
/// True when `existing` contains the new start, contains the new end, or is
/// itself contained in the new interval.
pub fn overlaps(existing: &BookingEntry, begin: NaiveDate, end: NaiveDate) -> bool {
    let contains_begin = existing.begin <= begin && begin <= existing.end;
    let contains_end = existing.begin <= end && end <= existing.end;
    let swallowed = begin <= existing.begin && existing.end <= end;
    contains_begin || contains_end || swallowed
}

/// Whether `candidate` clashes with any of `existing`.
pub fn has_conflict(existing: &[BookingEntry], candidate: &NewBooking) -> bool {
    existing
        .iter()
        .any(|entry| overlaps(entry, candidate.begin, candidate.end))
}

/// Check `candidate` against the stored bookings and insert it if free.
///
/// Check and insert run in one immediate transaction; see
/// [`Database::create_booking_exclusive`].
pub fn create_entry(db: &Database, candidate: &NewBooking) -> Result<i64> {
    if candidate.begin > candidate.end {
        return Err(Error::malformed(format!(
            "booking ends ({}) before it begins ({})",
            candidate.end, candidate.begin
        )));
    }
    if let Some(date) = [candidate.begin, candidate.end].into_iter().find(|d| !is_storable(*d)) {
        return Err(Error::malformed(format!("date {date} is out of range")));
    }

    match db.create_booking_exclusive(candidate, |existing| has_conflict(existing, candidate)) {
        Ok(id) => {
            info!(
                "created booking {id} for {} ({} to {})",
                candidate.owner, candidate.begin, candidate.end
            );
            Ok(id)
        }
        Err(e) => {
            if e.is_conflict() {
                warn!("rejected booking for {}: {e}", candidate.owner);
            }
            Err(e)
        }
    }
}

/// Delete booking `id` when `user` owns it or is listed in `admins`.
///
/// Names compare case-insensitively.
pub fn delete_entry(db: &Database, id: i64, user: &str, admins: &[String]) -> Result<()> {
    let entry = db
        .get_booking(id)?
        .ok_or_else(|| Error::not_found("Booking", id))?;

    let is_owner = entry.owner.eq_ignore_ascii_case(user);
    let is_admin = admins.iter().any(|admin| admin.eq_ignore_ascii_case(user));
    if !is_owner && !is_admin {
        return Err(Error::PermissionDenied(format!(
            "{user} may not delete booking {id} of {}",
            entry.owner
        )));
    }

    db.delete_booking(id)?;
    info!("deleted booking {id} of {} on behalf of {user}", entry.owner);
    Ok(())
}
