//! Outbound CGI response.

use std::io::{self, Write};

use http::StatusCode;

use crate::error::Error;

pub const DEFAULT_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Response assembled by a handler.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: String,
    location: Option<String>,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    /// `200 OK` with an HTML content type and an empty body.
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: vec![("Content-Type".to_string(), DEFAULT_CONTENT_TYPE.to_string())],
            body: String::new(),
            location: None,
        }
    }

    /// Plain-text response with the given status.
    pub fn text(status: StatusCode, message: &str) -> Self {
        let mut response = Self::new();
        response.status = status;
        response.set_header("Content-Type", "text/plain; charset=utf-8");
        response.body = format!("{message}\n");
        response
    }

    /// Plain-text response describing `error`.
    pub fn from_error(error: &Error) -> Self {
        Self::text(error.status(), &error.public_message())
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Value of the first header named `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Set a header, replacing an existing one with the same name.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.headers.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(&name)) {
            Some(slot) => slot.1 = value,
            None => self.headers.push((name, value)),
        }
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn push_str(&mut self, text: &str) {
        self.body.push_str(text);
    }

    /// Redirect with `303 See Other` to `target`, relative to the root path.
    pub fn redirect(&mut self, target: impl Into<String>) {
        self.status = StatusCode::SEE_OTHER;
        self.location = Some(target.into());
    }

    pub fn is_redirect(&self) -> bool {
        self.location.is_some()
    }

    /// Serialize as a CGI response.
    ///
    /// A redirect emits only status, cookie and `Location`; headers and body
    /// are suppressed.
    pub fn write_to<W: Write>(
        &self,
        out: &mut W,
        set_cookie: Option<&str>,
        root_path: &str,
    ) -> io::Result<()> {
        let reason = self.status.canonical_reason().unwrap_or("");
        writeln!(out, "Status: {} {}", self.status.as_u16(), reason)?;

        if let Some(cookie) = set_cookie.filter(|c| !c.is_empty()) {
            writeln!(out, "Set-Cookie: {cookie}")?;
        }

        if let Some(target) = &self.location {
            writeln!(out, "Location: {root_path}{target}")?;
            writeln!(out)?;
            return out.flush();
        }

        for (name, value) in &self.headers {
            writeln!(out, "{name}: {value}")?;
        }
        writeln!(out)?;
        out.write_all(self.body.as_bytes())?;
        out.flush()
    }
}

impl std::fmt::Write for Response {
    fn write_str(&mut self, s: &str) -> std::fmt::Result {
        self.body.push_str(s);
        Ok(())
    }
}
