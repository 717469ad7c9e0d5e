//! Path → handler table.

use std::collections::HashMap;

use tracing::debug;

use super::{Request, RequestContext, Response};
use crate::error::Result;

/// Body of the fallback response for unknown paths.
pub const NO_HANDLER_MESSAGE: &str = "No handler defined for this path!";

/// A request handler over application state `S`.
pub type Handler<S> = Box<dyn Fn(&mut RequestContext<'_, S>, &Request, &mut Response) -> Result<()>>;

/// Routes exact request paths to handlers.
pub struct Router<S> {
    handlers: HashMap<String, Handler<S>>,
    fallback: Handler<S>,
}

impl<S: 'static> Default for Router<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: 'static> Router<S> {
    /// An empty router whose fallback prints [`NO_HANDLER_MESSAGE`].
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            fallback: Box::new(no_handler::<S>),
        }
    }

    /// Register `handler` for `path`, replacing any previous one.
    pub fn add_handler<F>(&mut self, path: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(&mut RequestContext<'_, S>, &Request, &mut Response) -> Result<()> + 'static,
    {
        let path = path.into();
        if self.handlers.insert(path.clone(), Box::new(handler)).is_some() {
            debug!("replaced handler for {path}");
        }
        self
    }

    pub fn has_handler(&self, path: &str) -> bool {
        self.handlers.contains_key(path)
    }

    /// Handler for `path`, or the fallback.
    pub fn dispatch(&self, path: &str) -> &Handler<S> {
        self.handlers.get(path).unwrap_or(&self.fallback)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

fn no_handler<S>(_: &mut RequestContext<'_, S>, _: &Request, response: &mut Response) -> Result<()> {
    response.push_str(NO_HANDLER_MESSAGE);
    response.push_str("\n");
    Ok(())
}
