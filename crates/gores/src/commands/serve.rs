//! Serve one CGI request.

use anyhow::{Context, Result};
use gores_core::gateway::{CgiEnvironment, Gateway, Response};
use gores_core::session::SessionStore;
use gores_core::Error;
use std::io::{Read, Write};
use tracing::{error, warn};

use super::open_database;
use crate::config::Config;
use crate::handlers::{self, App};

/// Serve the request described by the process environment and stdin.
///
/// `config` is the outcome of loading the configuration; a failure there is
/// answered like any other startup failure.
pub fn execute(config: Result<Config>) -> Result<()> {
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let env = match CgiEnvironment::from_process_env() {
        Ok(env) => env,
        Err(e) => {
            warn!("rejected request environment: {e}");
            Response::from_error(&e).write_to(&mut out, None, "")?;
            return Ok(());
        }
    };
    serve(config, &env, stdin.lock(), &mut out)
}

/// Answer the request in `env`/`body` on `out`.
///
/// Startup failures are answered with a 500 as well, so the web server never
/// sees an empty response.
pub fn serve<R, W>(config: Result<Config>, env: &CgiEnvironment, body: R, out: &mut W) -> Result<()>
where
    R: Read,
    W: Write,
{
    let app = match config.and_then(open_app) {
        Ok(app) => app,
        Err(e) => {
            error!("startup failed: {e:#}");
            // Error responses never redirect, so no root path is needed
            Response::from_error(&Error::Other(e.to_string())).write_to(out, None, "")?;
            return Ok(());
        }
    };
    let config = &app.config;

    let sessions = SessionStore::with_ttl(&app.db, config.session_ttl());
    let gateway = Gateway::new(handlers::router(), config.server.root_path.clone());
    gateway.handle(&app, &sessions, env, body, out)?;
    Ok(())
}

fn open_app(config: Config) -> Result<App> {
    let db = open_database(&config)?;
    if !db.has_schema()? {
        db.migrate().context("Failed to create schema")?;
    }
    App::new(db, config)
}
