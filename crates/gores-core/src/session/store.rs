//! Persistence of sessions with a time-to-live.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use tracing::{debug, info};

use super::{parse_cookie_header, Session, CREATED_AT_KEY, SESSION_COOKIE};
use crate::db::Database;
use crate::error::Result;

/// Sessions untouched for longer than this are treated as new.
pub const DEFAULT_TTL_MINUTES: i64 = 30;

/// Loads, commits and deletes [`Session`]s for one request.
pub struct SessionStore<'a> {
    db: &'a Database,
    ttl: Duration,
}

impl<'a> SessionStore<'a> {
    /// Create a store with the default 30 minute TTL.
    pub fn new(db: &'a Database) -> Self {
        Self::with_ttl(db, Duration::minutes(DEFAULT_TTL_MINUTES))
    }

    pub fn with_ttl(db: &'a Database, ttl: Duration) -> Self {
        Self { db, ttl }
    }

    /// Resolve the session for an inbound `Cookie` header.
    pub fn init(&self, cookie_header: &str) -> Result<Session> {
        self.init_at(cookie_header, Utc::now())
    }

    /// Same as [`init`](Self::init) with an explicit clock.
    ///
    /// Keeps the identifier from the `SID` cookie when it still has live rows;
    /// otherwise mints a new identifier, registers it as cookie and seeds
    /// `created_at`.
    pub fn init_at(&self, cookie_header: &str, now: DateTime<Utc>) -> Result<Session> {
        let cookies = parse_cookie_header(cookie_header);
        let existing_id = cookies
            .get(SESSION_COOKIE)
            .filter(|sid| !sid.is_empty())
            .cloned();

        let mut session = Session {
            cookies,
            ..Session::default()
        };

        if let Some(sid) = existing_id {
            debug!("found session cookie {sid}");
            session.id = sid;
            if self.load_from_store_at(&mut session, now)? {
                return Ok(session);
            }
        }

        let sid = uuid::Uuid::new_v4().to_string();
        session.cookies.insert(SESSION_COOKIE.to_string(), sid.clone());
        session.id = sid;
        session.is_new = true;
        session.values.clear();
        session.set(
            CREATED_AT_KEY,
            now.to_rfc3339_opts(SecondsFormat::Secs, true),
        );
        info!("created new session {}", session.id);

        Ok(session)
    }

    /// Populate `session` from rows updated within the TTL window ending at
    /// `now`.
    ///
    /// Returns `false` when no live row exists. Stale rows are not deleted.
    pub fn load_from_store_at(&self, session: &mut Session, now: DateTime<Utc>) -> Result<bool> {
        let since = (now - self.ttl).timestamp_millis();
        let rows = self.db.load_session_values(&session.id, since)?;
        let found = !rows.is_empty();
        for (label, value) in rows {
            session.set(label, value);
        }
        debug!("session {} loaded {} value(s)", session.id, session.values.len());
        Ok(found)
    }

    /// Upsert every in-memory key with the current timestamp.
    pub fn commit(&self, session: &Session) -> Result<()> {
        self.commit_at(session, Utc::now())
    }

    /// All keys are rewritten, not only the ones changed during the request.
    pub fn commit_at(&self, session: &Session, now: DateTime<Utc>) -> Result<()> {
        if session.id.is_empty() {
            return Ok(());
        }
        let now_ms = now.timestamp_millis();
        for (label, value) in session.values() {
            self.db.upsert_session_value(&session.id, label, value, now_ms)?;
        }
        debug!("committed {} value(s) for session {}", session.values.len(), session.id);
        Ok(())
    }

    /// Purge all persisted rows and clear the identifier.
    pub fn delete(&self, session: &mut Session) -> Result<()> {
        if session.id.is_empty() {
            return Ok(());
        }
        let deleted = self.db.delete_session(&session.id)?;
        info!("deleted session {} ({} row(s))", session.id, deleted);
        session.id.clear();
        Ok(())
    }
}
