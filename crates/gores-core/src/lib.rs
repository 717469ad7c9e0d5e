//! gores-core - Core library for the gores reservation calendar
//!
//! Everything the `gores` CGI binary needs apart from configuration and
//! page rendering:
//!
//! - **gateway**: CGI request parsing, routing and response emission
//! - **session**: Cookie-bound sessions persisted with a TTL
//! - **calendar**: The 5×7 month grid with merged bookings
//! - **booking**: Overlap checks, creation and deletion of bookings
//! - **auth**: User lookup and login
//! - **db**: Direct SQLite database access

pub mod auth;
pub mod booking;
pub mod calendar;
pub mod db;
pub mod error;
pub mod gateway;
pub mod session;

// Re-export commonly used types
pub use db::Database;
pub use error::{Error, Result};
