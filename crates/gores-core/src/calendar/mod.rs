//! Month calendar laid out as a fixed 5×7 grid merged with bookings.

mod grid;

pub use grid::*;

use chrono::NaiveDate;
use serde::Serialize;

use crate::db::{BookingEntry, Database};
use crate::error::Result;

/// Weeks shown per month.
pub const GRID_WEEKS: usize = 5;
/// Days per week row.
pub const DAYS_PER_WEEK: usize = 7;
/// Cells in every grid.
pub const GRID_DAYS: usize = GRID_WEEKS * DAYS_PER_WEEK;

/// Month names used for labels, January first.
pub const GERMAN_MONTHS: [&str; 12] = [
    "Januar",
    "Februar",
    "März",
    "April",
    "Mai",
    "Juni",
    "Juli",
    "August",
    "September",
    "Oktober",
    "November",
    "Dezember",
];

/// Localized name of `month` (1-based); empty for out-of-range values.
pub fn month_name(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|idx| GERMAN_MONTHS.get(idx as usize))
        .copied()
        .unwrap_or("")
}

/// Supplies the bookings shown on a grid.
pub trait BookingSource {
    /// Bookings intersecting `[start, end]`, sorted ascending by begin date.
    fn bookings_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<BookingEntry>>;
}

impl BookingSource for Database {
    fn bookings_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<BookingEntry>> {
        self.list_bookings_between(start, end)
    }
}

/// Display class of a grid cell. Serializes to the CSS class name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DayClass {
    #[serde(rename = "rightmonth")]
    RightMonth,
    #[serde(rename = "wrongmonth")]
    WrongMonth,
    #[serde(rename = "res_rightmonth")]
    RightMonthEntry,
    #[serde(rename = "res_wrongmonth")]
    WrongMonthEntry,
    #[serde(rename = "eig_res_rightmonth")]
    RightMonthOwnEntry,
    #[serde(rename = "eig_res_wrongmonth")]
    WrongMonthOwnEntry,
}

impl DayClass {
    /// Classify a cell. `is_own` only matters when the cell has an entry.
    pub fn classify(is_requested_month: bool, has_entry: bool, is_own: bool) -> Self {
        match (is_requested_month, has_entry, is_own) {
            (true, true, true) => Self::RightMonthOwnEntry,
            (false, true, true) => Self::WrongMonthOwnEntry,
            (true, true, false) => Self::RightMonthEntry,
            (false, true, false) => Self::WrongMonthEntry,
            (true, false, _) => Self::RightMonth,
            (false, false, _) => Self::WrongMonth,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RightMonth => "rightmonth",
            Self::WrongMonth => "wrongmonth",
            Self::RightMonthEntry => "res_rightmonth",
            Self::WrongMonthEntry => "res_wrongmonth",
            Self::RightMonthOwnEntry => "eig_res_rightmonth",
            Self::WrongMonthOwnEntry => "eig_res_wrongmonth",
        }
    }

    pub fn is_requested_month(&self) -> bool {
        matches!(
            self,
            Self::RightMonth | Self::RightMonthEntry | Self::RightMonthOwnEntry
        )
    }
}

impl std::fmt::Display for DayClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One cell of the grid.
#[derive(Debug, Clone, Serialize)]
pub struct Day {
    pub day_of_month: u32,
    pub date: NaiveDate,
    /// Month the grid was built for, not the month of `date`.
    pub month: u32,
    pub entry: Option<BookingEntry>,
    pub class: DayClass,
}

/// A month view: 35 cells plus navigation and picker data.
#[derive(Debug, Clone, Serialize)]
pub struct CalendarGrid {
    pub year: i32,
    pub month: u32,
    /// `"März 2024"`
    pub month_year: String,
    pub prev_year: i32,
    pub next_year: i32,
    pub prev_month: u32,
    pub prev_month_year: i32,
    pub prev_month_name: &'static str,
    pub next_month: u32,
    pub next_month_year: i32,
    pub next_month_name: &'static str,
    pub grid_start: NaiveDate,
    pub weeks: Vec<Vec<Day>>,
    pub all_days_in_month: Vec<u32>,
    pub all_months: Vec<u32>,
    pub all_years: Vec<i32>,
    pub all_entries: Vec<BookingEntry>,
}

impl CalendarGrid {
    /// All cells in order.
    pub fn days(&self) -> impl Iterator<Item = &Day> {
        self.weeks.iter().flatten()
    }

    /// Last date shown on the grid.
    pub fn grid_end(&self) -> Option<NaiveDate> {
        self.days().last().map(|day| day.date)
    }
}
