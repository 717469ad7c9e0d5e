//! Command implementations for the gores CLI.
//!
//! Each submodule implements one subcommand; `serve` is also what runs when
//! no subcommand is given.

pub mod doctor;
pub mod migrate;
pub mod serve;
pub mod user;

use anyhow::{Context, Result};
use gores_core::Database;

use crate::config::Config;

/// Open the configured database file.
pub fn open_database(config: &Config) -> Result<Database> {
    let path = &config.database.path;
    Database::open_path_with_timeout(path, config.busy_timeout())
        .with_context(|| format!("Failed to open database {}", path.display()))
}
