//! gores - Reservation calendar
//!
//! A CGI program: the web server starts one process per request, passes the
//! request through environment variables and stdin, and relays stdout.

use anyhow::Result;
use clap::Parser;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod cli;
mod commands;
mod config;
mod handlers;
mod templates;

use cli::{Cli, Commands};
use config::Config;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let loaded = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };

    // Execute command
    match cli.command {
        None | Some(Commands::Serve) => {
            // stdout is the response, so a broken config is answered there too
            let log_file = loaded.as_ref().ok().and_then(|c| c.server.log_file.as_deref());
            init_tracing(log_file)?;
            commands::serve::execute(loaded)
        }
        Some(Commands::Migrate) => {
            let config = loaded?;
            init_tracing(None)?;
            commands::migrate::execute(&config)
        }
        Some(Commands::User(cmd)) => {
            let config = loaded?;
            init_tracing(None)?;
            commands::user::execute(cmd, &config)
        }
        Some(Commands::Doctor) => {
            let config = loaded?;
            init_tracing(None)?;
            commands::doctor::execute(&config)
        }
    }
}

/// Log to `log_file` (appending), or to stderr when it is unset or cannot be
/// opened.
fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("gores=info".parse()?);
    let file = log_file.and_then(|path| {
        OpenOptions::new().create(true).append(true).open(path).ok()
    });

    let registry = tracing_subscriber::registry().with(filter);
    match file {
        Some(file) => registry
            .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
            .init(),
        None => registry.with(fmt::layer().with_writer(std::io::stderr)).init(),
    }
    Ok(())
}
