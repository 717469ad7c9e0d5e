//! Grid construction.

use chrono::{Datelike, Days, Months, NaiveDate};
use tracing::debug;

use super::{
    month_name, BookingSource, CalendarGrid, Day, DayClass, DAYS_PER_WEEK, GRID_DAYS, GRID_WEEKS,
};
use crate::db::{BookingEntry, STORABLE_YEARS};
use crate::error::{Error, Result};

/// Years offered by the year picker, starting at the requested year.
const PICKER_YEARS: i32 = 4;

/// Build the grid for `(year, month)` as seen by `viewer`.
///
/// The grid starts on the Sunday on or before the 1st and always has 35
/// cells, so long months starting late in the week lose their last days.
///
/// Bookings are merged with a single forward cursor. That is only correct
/// for sorted, non-overlapping bookings: once an overlapped entry falls
/// behind the cursor it is never attached, and neither is anything after it.
pub fn build_grid<S>(year: i32, month: u32, viewer: &str, source: &S) -> Result<CalendarGrid>
where
    S: BookingSource + ?Sized,
{
    if !STORABLE_YEARS.contains(&year) {
        return Err(Error::malformed(format!("year {year} is out of range")));
    }
    let first_of_month = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| Error::malformed(format!("invalid month {month}/{year}")))?;
    let back = u64::from(first_of_month.weekday().num_days_from_sunday());
    let grid_start = shift_days(first_of_month, back, false)?;
    // Nothing is stored past the last storable year
    let last_storable = NaiveDate::from_ymd_opt(*STORABLE_YEARS.end(), 12, 31)
        .ok_or_else(|| Error::Other("no last storable date".into()))?;
    let fetch_end = shift_days(grid_start, GRID_DAYS as u64, true)?.min(last_storable);

    let mut entries = source
        .bookings_between(grid_start, fetch_end)
        .map_err(|e| {
            if e.is_internal() {
                e
            } else {
                Error::Other(format!("loading bookings for {month}/{year}: {e}"))
            }
        })?;
    debug!("found {} booking(s) for {month}/{year}", entries.len());

    for entry in &mut entries {
        entry.is_own = entry.owner == viewer;
        entry.month = month;
        entry.year = year;
    }

    let weeks = merge(grid_start, month, &entries)?;

    let prev = first_of_month
        .checked_sub_months(Months::new(1))
        .ok_or_else(|| Error::malformed("no previous month"))?;
    let next = first_of_month
        .checked_add_months(Months::new(1))
        .ok_or_else(|| Error::malformed("no next month"))?;

    Ok(CalendarGrid {
        year,
        month,
        month_year: format!("{} {}", month_name(month), year),
        prev_year: year - 1,
        next_year: year + 1,
        prev_month: prev.month(),
        prev_month_year: prev.year(),
        prev_month_name: month_name(prev.month()),
        next_month: next.month(),
        next_month_year: next.year(),
        next_month_name: month_name(next.month()),
        grid_start,
        weeks,
        all_days_in_month: (1..=31).collect(),
        all_months: (1..=12).collect(),
        all_years: (year..year + PICKER_YEARS).collect(),
        all_entries: entries,
    })
}

fn merge(grid_start: NaiveDate, month: u32, entries: &[BookingEntry]) -> Result<Vec<Vec<Day>>> {
    let mut weeks = Vec::with_capacity(GRID_WEEKS);
    let mut cursor = 0;
    let mut current = grid_start;

    for _ in 0..GRID_WEEKS {
        let mut week = Vec::with_capacity(DAYS_PER_WEEK);
        for _ in 0..DAYS_PER_WEEK {
            let mut attached = None;
            if let Some(entry) = entries.get(cursor) {
                if entry.covers(current) {
                    attached = Some(entry.clone());
                }
                if current == entry.end {
                    cursor += 1;
                }
            }

            let is_own = attached.as_ref().is_some_and(|e| e.is_own);
            let class = DayClass::classify(current.month() == month, attached.is_some(), is_own);
            week.push(Day {
                day_of_month: current.day(),
                date: current,
                month,
                entry: attached,
                class,
            });

            current = shift_days(current, 1, true)?;
        }
        weeks.push(week);
    }

    Ok(weeks)
}

fn shift_days(date: NaiveDate, days: u64, forward: bool) -> Result<NaiveDate> {
    let shifted = if forward {
        date.checked_add_days(Days::new(days))
    } else {
        date.checked_sub_days(Days::new(days))
    };
    shifted.ok_or_else(|| Error::malformed(format!("date out of range near {date}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;
    use std::cell::RefCell;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entry(id: i64, owner: &str, begin: NaiveDate, end: NaiveDate) -> BookingEntry {
        BookingEntry {
            id,
            owner: owner.into(),
            begin,
            end,
            note: String::new(),
            is_own: false,
            month: 0,
            year: 0,
        }
    }

    /// Returns a fixed list and records the requested window.
    struct FixedSource {
        entries: Vec<BookingEntry>,
        window: RefCell<Option<(NaiveDate, NaiveDate)>>,
    }

    impl FixedSource {
        fn new(entries: Vec<BookingEntry>) -> Self {
            Self {
                entries,
                window: RefCell::new(None),
            }
        }
    }

    impl BookingSource for FixedSource {
        fn bookings_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<BookingEntry>> {
            *self.window.borrow_mut() = Some((start, end));
            Ok(self.entries.clone())
        }
    }

    struct FailingSource;

    impl BookingSource for FailingSource {
        fn bookings_between(&self, _: NaiveDate, _: NaiveDate) -> Result<Vec<BookingEntry>> {
            Err(Error::LockPoisoned)
        }
    }

    #[test]
    fn test_grid_shape_for_every_month() {
        let source = FixedSource::new(Vec::new());
        for year in [1999, 2023, 2024, 2100] {
            for month in 1..=12 {
                let grid = build_grid(year, month, "anna", &source).unwrap();
                assert_eq!(grid.weeks.len(), 5);
                assert!(grid.weeks.iter().all(|w| w.len() == 7));

                let dates: Vec<_> = grid.days().map(|d| d.date).collect();
                assert_eq!(dates.len(), GRID_DAYS);
                for pair in dates.windows(2) {
                    assert_eq!(pair[0].succ_opt().unwrap(), pair[1]);
                }
                assert_eq!(dates[0].weekday(), Weekday::Sun);
                assert!(dates[0] <= date(year, month, 1));
                assert!(dates.contains(&date(year, month, 1)));
            }
        }
    }

    #[test]
    fn test_march_2024_layout() {
        let source = FixedSource::new(Vec::new());
        let grid = build_grid(2024, 3, "anna", &source).unwrap();

        assert_eq!(grid.grid_start, date(2024, 2, 25));
        assert_eq!(
            *source.window.borrow(),
            Some((date(2024, 2, 25), date(2024, 3, 31)))
        );

        let days: Vec<_> = grid.days().collect();
        assert_eq!(days[0].class, DayClass::WrongMonth);
        assert_eq!(days[4].date, date(2024, 2, 29));
        assert_eq!(days[5].date, date(2024, 3, 1));
        assert_eq!(days[5].class, DayClass::RightMonth);
        // The fixed 35 cells end on the 30th; the 31st is not shown
        assert_eq!(grid.grid_end(), Some(date(2024, 3, 30)));
        assert_eq!(days[34].month, 3);
    }

    #[test]
    fn test_trailing_days_are_other_month() {
        let source = FixedSource::new(Vec::new());
        let grid = build_grid(2024, 2, "anna", &source).unwrap();

        assert_eq!(grid.grid_start, date(2024, 1, 28));
        let last = grid.days().last().unwrap();
        assert_eq!(last.date, date(2024, 3, 2));
        assert_eq!(last.day_of_month, 2);
        assert_eq!(last.month, 2);
        assert_eq!(last.class, DayClass::WrongMonth);
    }

    #[test]
    fn test_month_starting_on_sunday() {
        let source = FixedSource::new(Vec::new());
        let grid = build_grid(2024, 9, "anna", &source).unwrap();
        assert_eq!(grid.grid_start, date(2024, 9, 1));
        assert_eq!(grid.grid_end(), Some(date(2024, 10, 5)));
    }

    #[test]
    fn test_entries_are_merged_and_classified() {
        let source = FixedSource::new(vec![
            entry(1, "bob", date(2024, 2, 27), date(2024, 3, 2)),
            entry(2, "anna", date(2024, 3, 10), date(2024, 3, 12)),
        ]);
        let grid = build_grid(2024, 3, "anna", &source).unwrap();
        let by_date = |d: NaiveDate| grid.days().find(|day| day.date == d).unwrap();

        assert_eq!(by_date(date(2024, 2, 26)).class, DayClass::WrongMonth);
        assert_eq!(by_date(date(2024, 2, 27)).class, DayClass::WrongMonthEntry);
        assert_eq!(by_date(date(2024, 3, 1)).class, DayClass::RightMonthEntry);
        assert_eq!(by_date(date(2024, 3, 2)).entry.as_ref().unwrap().id, 1);
        assert_eq!(by_date(date(2024, 3, 3)).class, DayClass::RightMonth);
        assert_eq!(by_date(date(2024, 3, 10)).class, DayClass::RightMonthOwnEntry);
        assert_eq!(by_date(date(2024, 3, 12)).class, DayClass::RightMonthOwnEntry);
        assert!(by_date(date(2024, 3, 13)).entry.is_none());

        // Entries are stamped with the requested month, not their own dates
        assert!(grid.all_entries.iter().all(|e| e.month == 3 && e.year == 2024));
        assert!(!grid.all_entries[0].is_own);
        assert!(grid.all_entries[1].is_own);
    }

    #[test]
    fn test_own_entry_in_other_month() {
        let source = FixedSource::new(vec![entry(1, "anna", date(2024, 1, 30), date(2024, 2, 1))]);
        let grid = build_grid(2024, 2, "anna", &source).unwrap();
        let days: Vec<_> = grid.days().collect();

        // Grid starts on 2024-01-28
        assert_eq!(days[2].class, DayClass::WrongMonthOwnEntry);
        assert_eq!(days[4].class, DayClass::RightMonthOwnEntry);
        assert_eq!(days[5].class, DayClass::RightMonth);
    }

    #[test]
    fn test_entry_starting_before_grid() {
        let source = FixedSource::new(vec![entry(1, "bob", date(2024, 2, 1), date(2024, 2, 26))]);
        let grid = build_grid(2024, 3, "anna", &source).unwrap();
        let days: Vec<_> = grid.days().collect();

        assert_eq!(days[0].class, DayClass::WrongMonthEntry);
        assert_eq!(days[1].class, DayClass::WrongMonthEntry);
        assert_eq!(days[2].class, DayClass::WrongMonth);
    }

    #[test]
    fn test_overlapping_entries_stall_the_cursor() {
        let source = FixedSource::new(vec![
            entry(1, "bob", date(2024, 3, 1), date(2024, 3, 10)),
            entry(2, "bob", date(2024, 3, 3), date(2024, 3, 5)),
            entry(3, "bob", date(2024, 3, 20), date(2024, 3, 21)),
        ]);
        let grid = build_grid(2024, 3, "anna", &source).unwrap();
        let attached: Vec<_> = grid
            .days()
            .filter_map(|d| d.entry.as_ref().map(|e| e.id))
            .collect();

        // Only the first entry is shown; the overlapped one and everything
        // after it are skipped.
        assert_eq!(attached, vec![1; 10]);
    }

    #[test]
    fn test_navigation_rolls_over_years() {
        let source = FixedSource::new(Vec::new());

        let jan = build_grid(2024, 1, "anna", &source).unwrap();
        assert_eq!((jan.prev_month, jan.prev_month_year), (12, 2023));
        assert_eq!(jan.prev_month_name, "Dezember");
        assert_eq!((jan.next_month, jan.next_month_year), (2, 2024));
        assert_eq!(jan.month_year, "Januar 2024");

        let dec = build_grid(2024, 12, "anna", &source).unwrap();
        assert_eq!((dec.next_month, dec.next_month_year), (1, 2025));
        assert_eq!(dec.next_month_name, "Januar");
        assert_eq!((dec.prev_year, dec.next_year), (2023, 2025));
    }

    #[test]
    fn test_picker_lists() {
        let source = FixedSource::new(Vec::new());
        let grid = build_grid(2024, 3, "anna", &source).unwrap();

        assert_eq!(grid.all_months, (1..=12).collect::<Vec<_>>());
        assert_eq!(grid.all_days_in_month.len(), 31);
        assert_eq!(grid.all_days_in_month[0], 1);
        assert_eq!(grid.all_years, vec![2024, 2025, 2026, 2027]);
        assert_eq!(grid.month_year, "März 2024");
    }

    #[test]
    fn test_invalid_month_is_malformed() {
        let source = FixedSource::new(Vec::new());
        assert!(matches!(
            build_grid(2024, 13, "anna", &source).unwrap_err(),
            Error::MalformedInput(_)
        ));
        assert!(matches!(
            build_grid(2024, 0, "anna", &source).unwrap_err(),
            Error::MalformedInput(_)
        ));
    }

    #[test]
    fn test_years_outside_storage_are_malformed() {
        let source = FixedSource::new(Vec::new());
        for year in [0, -5, 10000] {
            assert!(matches!(
                build_grid(year, 1, "anna", &source).unwrap_err(),
                Error::MalformedInput(_)
            ));
        }
        assert!(source.window.borrow().is_none());
    }

    #[test]
    fn test_fetch_window_stops_at_last_storable_day() {
        let source = FixedSource::new(Vec::new());
        let grid = build_grid(9999, 12, "anna", &source).unwrap();

        assert_eq!(grid.grid_start, date(9999, 11, 28));
        assert_eq!(
            *source.window.borrow(),
            Some((date(9999, 11, 28), date(9999, 12, 31)))
        );
    }

    #[test]
    fn test_source_failure_aborts() {
        let err = build_grid(2024, 3, "anna", &FailingSource).unwrap_err();
        assert!(err.is_internal());
    }

    #[test]
    fn test_with_database_source() {
        let db = crate::db::Database::open_in_memory().unwrap();
        crate::booking::create_entry(
            &db,
            &crate::db::NewBooking {
                owner: "anna".into(),
                begin: date(2024, 3, 10),
                end: date(2024, 3, 12),
                note: "Ski".into(),
            },
        )
        .unwrap();

        let grid = build_grid(2024, 3, "anna", &db).unwrap();
        let booked: Vec<_> = grid.days().filter(|d| d.entry.is_some()).collect();
        assert_eq!(booked.len(), 3);
        assert!(booked.iter().all(|d| d.class == DayClass::RightMonthOwnEntry));
        assert_eq!(booked[0].entry.as_ref().unwrap().note, "Ski");
    }
}
