//! Diagnostics command.

use anyhow::Result;
use colored::Colorize;

use super::open_database;
use crate::config::Config;
use crate::templates::Templates;

pub fn execute(config: &Config) -> Result<()> {
    println!("{}", "gores Doctor".cyan().bold());
    println!("{}", "─".repeat(50));
    println!();

    let mut issues = Vec::new();

    // Check config file
    print!("  Config file: ");
    let config_path = Config::config_path();
    if config_path.exists() {
        println!("{}", format!("✓ {}", config_path.display()).green());
    } else {
        println!("{}", "○ not found (using defaults)".yellow());
    }

    // Check database
    print!("  Database ({}): ", config.database.path.display());
    match open_database(config) {
        Ok(db) => match db.has_schema() {
            Ok(true) => println!("{}", "✓ schema present".green()),
            Ok(false) => {
                println!("{}", "✗ schema missing".red());
                issues.push("Database has no schema - run `gores migrate`".to_string());
            }
            Err(e) => {
                println!("{}", format!("✗ {e}").red());
                issues.push("Database not readable".to_string());
            }
        },
        Err(e) => {
            println!("{}", format!("✗ {e:#}").red());
            issues.push("Database not accessible".to_string());
        }
    }

    // Check log file
    print!("  Log file: ");
    match &config.server.log_file {
        Some(path) => match std::fs::OpenOptions::new().create(true).append(true).open(path) {
            Ok(_) => println!("{}", format!("✓ {}", path.display()).green()),
            Err(e) => {
                println!("{}", format!("○ {} ({e}), falling back to stderr", path.display()).yellow());
            }
        },
        None => println!("{}", "○ not set (stderr)".yellow()),
    }

    // Check templates
    print!("  Templates: ");
    match Templates::new() {
        Ok(_) => println!("{}", "✓ compiled".green()),
        Err(e) => {
            println!("{}", format!("✗ {e}").red());
            issues.push("Templates do not compile".to_string());
        }
    }

    // Admins
    print!("  Admin users: ");
    if config.booking.admin_users.is_empty() {
        println!("{}", "○ none".yellow());
    } else {
        println!("{}", config.booking.admin_users.join(", "));
    }

    // Summary
    println!();
    if issues.is_empty() {
        println!("{}", "✓ All checks passed".green().bold());
    } else {
        println!("{}", format!("✗ {} issue(s) found:", issues.len()).red().bold());
        for issue in &issues {
            println!("  • {}", issue);
        }
    }

    Ok(())
}
