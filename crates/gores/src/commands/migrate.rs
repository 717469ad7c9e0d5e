//! Schema creation.

use anyhow::{Context, Result};
use colored::Colorize;

use super::open_database;
use crate::config::Config;

pub fn execute(config: &Config) -> Result<()> {
    let db = open_database(config)?;
    db.migrate().context("Failed to create schema")?;

    println!(
        "{} schema ready in {}",
        "✓".green(),
        config.database.path.display()
    );
    Ok(())
}
