//! The month view.

use chrono::{Datelike, Local};
use gores_core::calendar::build_grid;
use gores_core::gateway::{Request, RequestContext, Response};
use gores_core::{Error, Result};
use minijinja::context;
use tracing::debug;

use super::{require_user, App, MESSAGE_KEY};
use crate::templates;

/// Render the grid for `?m=&y=`, or the current month when either is missing.
///
/// The flash message is shown once and then blanked.
pub fn show_main(ctx: &mut RequestContext<'_, App>, request: &Request, response: &mut Response) -> Result<()> {
    let Some(username) = require_user(ctx, response) else {
        return Ok(());
    };

    let (year, month) = requested_month(request.query.get("y"), request.query.get("m"))?;
    debug!("showing {month}/{year} for {username}");

    let app = ctx.state;
    let cal = build_grid(year, month, &username, &app.db)?;
    let message = ctx.session.take(MESSAGE_KEY);

    let page = app.render(
        templates::MAIN,
        context! {
            site => &app.config.site,
            root => &app.config.server.root_path,
            username => &username,
            can_delete_all => app.is_admin(&username),
            message => message,
            cal => cal,
        },
    )?;
    response.push_str(&page);
    Ok(())
}

fn requested_month(year: &str, month: &str) -> Result<(i32, u32)> {
    if year.is_empty() || month.is_empty() {
        let today = Local::now().date_naive();
        return Ok((today.year(), today.month()));
    }

    let year = year
        .trim()
        .parse::<i32>()
        .map_err(|e| Error::malformed(format!("invalid year {year:?}: {e}")))?;
    let month = month
        .trim()
        .parse::<u32>()
        .map_err(|e| Error::malformed(format!("invalid month {month:?}: {e}")))?;
    if !(1..=12).contains(&month) {
        return Err(Error::malformed(format!("invalid month {month}")));
    }
    Ok((year, month))
}
