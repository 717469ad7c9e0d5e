//! Creating and deleting bookings from the month view.
//!
//! Both handlers always redirect back to the month the user came from and
//! report expected failures through the flash message.

use chrono::NaiveDate;
use gores_core::booking::{create_entry, delete_entry};
use gores_core::db::{NewBooking, STORABLE_YEARS};
use gores_core::gateway::{FormValues, Request, RequestContext, Response};
use gores_core::{Error, Result};
use tracing::warn;

use super::{main_target, require_user, App, MESSAGE_KEY};

pub const CONFLICT_MESSAGE: &str = "Konflikt mit einer bestehenden Buchung!";
pub const SAVE_FAILED_MESSAGE: &str = "Etwas ist beim Speichern schiefgelaufen...";
pub const NOT_FOUND_MESSAGE: &str = "Diese Buchung existiert nicht mehr.";
pub const FORBIDDEN_MESSAGE: &str = "Nur eigene Buchungen können gelöscht werden.";

pub fn do_save(ctx: &mut RequestContext<'_, App>, request: &Request, response: &mut Response) -> Result<()> {
    let Some(username) = require_user(ctx, response) else {
        return Ok(());
    };
    let form = &request.form;

    let outcome = parse_booking(form, username).and_then(|booking| create_entry(&ctx.state.db, &booking));
    match outcome {
        Ok(_) => {}
        Err(e) if e.is_conflict() => ctx.session.set(MESSAGE_KEY, CONFLICT_MESSAGE),
        Err(e) if e.is_internal() => return Err(e),
        Err(e) => {
            warn!("booking not saved: {e}");
            ctx.session.set(MESSAGE_KEY, SAVE_FAILED_MESSAGE);
        }
    }

    response.redirect(main_target(form.get("m"), form.get("y")));
    Ok(())
}

pub fn do_delete(ctx: &mut RequestContext<'_, App>, request: &Request, response: &mut Response) -> Result<()> {
    let Some(username) = require_user(ctx, response) else {
        return Ok(());
    };
    let query = &request.query;

    let raw_id = query.get("id");
    let id = raw_id
        .trim()
        .parse::<i64>()
        .map_err(|e| Error::malformed(format!("invalid booking id {raw_id:?}: {e}")))?;

    let app = ctx.state;
    match delete_entry(&app.db, id, &username, &app.config.booking.admin_users) {
        Ok(()) => {}
        Err(e) if e.is_not_found() => ctx.session.set(MESSAGE_KEY, NOT_FOUND_MESSAGE),
        Err(Error::PermissionDenied(reason)) => {
            warn!("{reason}");
            ctx.session.set(MESSAGE_KEY, FORBIDDEN_MESSAGE);
        }
        Err(e) => return Err(e),
    }

    response.redirect(main_target(query.get("m"), query.get("y")));
    Ok(())
}

fn parse_booking(form: &FormValues, owner: String) -> Result<NewBooking> {
    Ok(NewBooking {
        owner,
        begin: parse_date(form, "byear", "bmonth", "bday")?,
        end: parse_date(form, "end_year", "end_month", "end_day")?,
        note: form.get("bemerkung").to_string(),
    })
}

fn parse_date(form: &FormValues, year: &str, month: &str, day: &str) -> Result<NaiveDate> {
    let number = |key: &str| {
        let raw = form.get(key);
        raw.trim()
            .parse::<u32>()
            .map_err(|e| Error::malformed(format!("invalid {key} {raw:?}: {e}")))
    };
    let (y, m, d) = (number(year)?, number(month)?, number(day)?);

    i32::try_from(y)
        .ok()
        .filter(|y| STORABLE_YEARS.contains(y))
        .and_then(|y| NaiveDate::from_ymd_opt(y, m, d))
        .ok_or_else(|| Error::malformed(format!("no such date {y}-{m:02}-{d:02}")))
}
