//! Cookie-identified sessions persisted in `session_entries`.
//!
//! ## Lifecycle
//!
//! ```text
//! Request start
//!   │
//!   ├─► SID cookie present? ──► load rows updated within the TTL
//!   │                              │
//!   │                              ├─► rows found: keep identifier
//!   │                              └─► nothing:    mint new identifier
//!   │
//! Handler
//!   │
//!   └─► get / set on the in-memory map
//!
//! Response
//!   │
//!   └─► commit: upsert every key with the current timestamp
//! ```
//!
//! Commits rewrite all keys, so two concurrent requests on the same session
//! resolve last-writer-wins.

mod store;

pub use store::*;

use std::collections::{BTreeMap, HashMap};

/// Name of the cookie carrying the session identifier.
pub const SESSION_COOKIE: &str = "SID";

/// Key seeded into every freshly minted session.
pub const CREATED_AT_KEY: &str = "created_at";

/// Request-scoped session handle returned by [`SessionStore::init`].
#[derive(Debug, Clone, Default)]
pub struct Session {
    id: String,
    values: HashMap<String, String>,
    cookies: BTreeMap<String, String>,
    is_new: bool,
}

impl Session {
    /// Session identifier; empty after [`SessionStore::delete`].
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether the identifier was minted during this request.
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Value stored under `key`, or the empty string.
    pub fn get(&self, key: &str) -> &str {
        self.values.get(key).map(String::as_str).unwrap_or("")
    }

    /// Store `value` under `key`, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Read a one-shot value and blank it, e.g. a flash message.
    pub fn take(&mut self, key: &str) -> String {
        match self.values.get_mut(key) {
            Some(value) => std::mem::take(value),
            None => String::new(),
        }
    }

    /// All in-memory key/value pairs.
    pub fn values(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Cookies to send back to the client.
    pub fn cookies(&self) -> &BTreeMap<String, String> {
        &self.cookies
    }

    /// Value for the `Set-Cookie` line: `name=value` pairs joined by `"; "`.
    pub fn cookie_string(&self) -> String {
        self.cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Parse a `Cookie` header of the form `a=1; b=2`.
///
/// Pairs without a name are dropped; a pair without `=` gets an empty value.
pub fn parse_cookie_header(header: &str) -> BTreeMap<String, String> {
    header
        .split(';')
        .filter_map(|pair| {
            let mut parts = pair.trim().splitn(2, '=');
            let name = parts.next()?.trim();
            if name.is_empty() {
                return None;
            }
            let value = parts.next().unwrap_or("").trim();
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}
