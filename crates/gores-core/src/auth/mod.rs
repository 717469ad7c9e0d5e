//! Password login against the `users` table.
//!
//! Passwords are stored and compared in clear text. This mirrors the existing
//! user data and is a known weakness: hashing needs a migration of the
//! `users` rows and is not implemented yet.

use tracing::{debug, warn};

use crate::db::{Database, User};
use crate::error::{Error, Result};

/// Session key holding the name of the logged-in user.
pub const USERNAME_KEY: &str = "username";

/// Look up a user by name.
pub fn load_user(db: &Database, name: &str) -> Result<User> {
    db.get_user(name)?
        .ok_or_else(|| Error::not_found("User", name))
}

/// Check `name`/`password` and return the matching user.
///
/// Unknown users and wrong passwords both yield [`Error::Unauthorized`] so
/// the response does not reveal which one it was. Surrounding whitespace in
/// the submitted password is ignored.
pub fn authenticate(db: &Database, name: &str, password: &str) -> Result<User> {
    let user = match load_user(db, name) {
        Ok(user) => user,
        Err(e) if e.is_not_found() => {
            warn!("login for unknown user {name}");
            return Err(Error::Unauthorized);
        }
        Err(e) => return Err(e),
    };

    if user.password != password.trim() {
        warn!("wrong password for user {name}");
        return Err(Error::Unauthorized);
    }

    debug!("user {name} authenticated");
    Ok(user)
}
