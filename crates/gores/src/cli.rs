//! CLI argument definitions using clap derive macros.
//!
//! Without a subcommand the binary behaves as a CGI program and serves the
//! request described by its environment.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Reservation calendar
///
/// Run by the web server as a CGI program, or by hand for maintenance.
#[derive(Parser, Debug)]
#[command(name = "gores")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (overrides GORES_CONFIG)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve one CGI request (the default)
    Serve,

    /// Create the database schema
    Migrate,

    /// User management
    User(UserCommand),

    /// Run diagnostics
    Doctor,
}

// ─────────────────────────────────────────────────────────────────────────────
// User Commands
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct UserCommand {
    #[command(subcommand)]
    pub action: UserAction,
}

#[derive(Subcommand, Debug)]
pub enum UserAction {
    /// Add a user, or replace an existing one with the same name
    Add {
        /// Login name
        name: String,

        /// Password (stored as given)
        #[arg(short, long)]
        password: String,

        #[arg(short, long, default_value = "")]
        email: String,

        #[arg(long, default_value = "")]
        phone: String,
    },

    /// Show a user
    Show {
        name: String,
    },
}
