//! Login and logout.

use gores_core::auth::{self, USERNAME_KEY};
use gores_core::gateway::{Request, RequestContext, Response};
use gores_core::Result;
use minijinja::context;
use tracing::info;

use super::{App, MESSAGE_KEY};
use crate::templates;

pub fn show_login(ctx: &mut RequestContext<'_, App>, _: &Request, response: &mut Response) -> Result<()> {
    let app = ctx.state;
    let message = ctx.session.take(MESSAGE_KEY);
    let page = app.render(
        templates::LOGIN,
        context! {
            site => &app.config.site,
            root => &app.config.server.root_path,
            message => message,
        },
    )?;
    response.push_str(&page);
    Ok(())
}

/// A failed login answers 401 and leaves the session untouched.
pub fn do_login(ctx: &mut RequestContext<'_, App>, request: &Request, response: &mut Response) -> Result<()> {
    let username = request.form.get("username");
    let user = auth::authenticate(&ctx.state.db, username, request.form.get("password"))?;

    ctx.session.set(USERNAME_KEY, user.name.as_str());
    info!("user {} logged in", user.name);
    response.redirect("/main");
    Ok(())
}

pub fn do_logout(ctx: &mut RequestContext<'_, App>, _: &Request, response: &mut Response) -> Result<()> {
    let username = ctx.session.get(USERNAME_KEY).to_string();
    ctx.end_session()?;
    if !username.is_empty() {
        info!("user {username} logged out");
    }
    response.redirect("/login");
    Ok(())
}
