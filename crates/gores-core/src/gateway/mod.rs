//! One-request-per-process gateway.
//!
//! ```text
//! CGI environment + stdin
//!   │
//!   ├─► parse_request ──(MalformedInput)──► 400, no session
//!   │
//!   ├─► SessionStore::init (load or mint)
//!   │
//!   ├─► Router::dispatch(path) ─► handler(ctx, request, response)
//!   │                                │
//!   │                                ├─► Ok:  commit session
//!   │                                └─► Err: error response, nothing committed
//!   │
//!   └─► Response::write_to(stdout)
//! ```

mod request;
mod response;
mod router;

pub use request::*;
pub use response::*;
pub use router::*;

use std::io::{Read, Write};

use tracing::{error, info, warn};

use crate::error::{Error, Result};
use crate::session::{Session, SessionStore};

/// Everything a handler may touch, scoped to one request.
pub struct RequestContext<'a, S> {
    /// Application state shared by all handlers.
    pub state: &'a S,
    pub sessions: &'a SessionStore<'a>,
    pub session: &'a mut Session,
}

impl<S> RequestContext<'_, S> {
    /// Delete the current session (logout).
    pub fn end_session(&mut self) -> Result<()> {
        self.sessions.delete(self.session)
    }
}

/// Parses the request, runs the matching handler and writes the response.
pub struct Gateway<S> {
    router: Router<S>,
    root_path: String,
}

impl<S: 'static> Gateway<S> {
    /// `root_path` prefixes every redirect target, e.g. `/cgi-bin/gores`.
    pub fn new(router: Router<S>, root_path: impl Into<String>) -> Self {
        Self {
            router,
            root_path: root_path.into(),
        }
    }

    /// Serve exactly one request.
    ///
    /// Handler failures become error responses; only I/O errors on `out`
    /// are returned.
    pub fn handle<R, W>(
        &self,
        state: &S,
        sessions: &SessionStore<'_>,
        env: &CgiEnvironment,
        body: R,
        out: &mut W,
    ) -> Result<()>
    where
        R: Read,
        W: Write,
    {
        let request = match parse_request(env, body) {
            Ok(request) => request,
            Err(e) => {
                warn!("rejected request for {:?}: {e}", env.path_info);
                Response::from_error(&e).write_to(out, None, &self.root_path)?;
                return Ok(());
            }
        };
        info!("handling {}", request.path);

        let mut session = match sessions.init(&request.cookie_header) {
            Ok(session) => session,
            Err(e) => {
                error!("failed to initialize session: {e}");
                Response::from_error(&e).write_to(out, None, &self.root_path)?;
                return Ok(());
            }
        };

        let mut response = Response::new();
        let handler = self.router.dispatch(&request.path);
        let outcome = {
            let mut ctx = RequestContext {
                state,
                sessions,
                session: &mut session,
            };
            handler(&mut ctx, &request, &mut response)
        };

        match outcome {
            Ok(()) => self.write_response(out, sessions, &session, &response),
            Err(e) => {
                log_failure(&request.path, &e);
                let cookie = session.cookie_string();
                Response::from_error(&e).write_to(out, Some(&cookie), &self.root_path)?;
                Ok(())
            }
        }
    }

    /// Commit `session`, then emit `response` with its cookies.
    ///
    /// If the commit fails the client gets a 500 instead of `response`.
    pub fn write_response<W: Write>(
        &self,
        out: &mut W,
        sessions: &SessionStore<'_>,
        session: &Session,
        response: &Response,
    ) -> Result<()> {
        let cookie = session.cookie_string();
        if let Err(e) = sessions.commit(session) {
            error!("failed to commit session {}: {e}", session.id());
            Response::from_error(&e).write_to(out, Some(&cookie), &self.root_path)?;
            return Ok(());
        }
        response.write_to(out, Some(&cookie), &self.root_path)?;
        Ok(())
    }
}

fn log_failure(path: &str, e: &Error) {
    if e.is_internal() {
        error!("handler for {path} failed: {e}");
    } else {
        warn!("handler for {path} failed: {e}");
    }
}
