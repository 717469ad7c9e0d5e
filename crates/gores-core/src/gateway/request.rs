//! Inbound CGI request parsing.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io::Read;

use serde::Serialize;

use crate::error::{Error, Result};

pub const ENV_PATH: &str = "PATH_INFO";
pub const ENV_QUERY: &str = "QUERY_STRING";
pub const ENV_COOKIE: &str = "HTTP_COOKIE";
pub const ENV_CONTENT_LENGTH: &str = "CONTENT_LENGTH";

/// Largest request body accepted.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// The CGI variables a request is built from.
#[derive(Debug, Clone, Default)]
pub struct CgiEnvironment {
    pub path_info: String,
    pub query_string: String,
    pub content_length: Option<String>,
    pub http_cookie: String,
}

impl CgiEnvironment {
    /// Read the variables from the process environment.
    pub fn from_process_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var_os(name))
    }

    /// Read the variables through `lookup`; missing ones default to empty.
    ///
    /// A value that is not valid UTF-8 is malformed input.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|value| {
                    value
                        .into_string()
                        .map_err(|_| Error::malformed(format!("{name} is not valid UTF-8")))
                })
                .transpose()
        };
        Ok(Self {
            path_info: var(ENV_PATH)?.unwrap_or_default(),
            query_string: var(ENV_QUERY)?.unwrap_or_default(),
            content_length: var(ENV_CONTENT_LENGTH)?,
            http_cookie: var(ENV_COOKIE)?.unwrap_or_default(),
        })
    }
}

/// Multi-valued `application/x-www-form-urlencoded` data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormValues(BTreeMap<String, Vec<String>>);

impl FormValues {
    /// Parse `key=value&key=value`.
    ///
    /// Rejects `;` separators and malformed percent escapes. A key without
    /// `=` gets an empty value; `+` decodes to a space.
    pub fn parse(input: &str) -> Result<Self> {
        validate_form_encoding(input)?;

        let mut values: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (key, value) in url::form_urlencoded::parse(input.as_bytes()) {
            values
                .entry(key.into_owned())
                .or_default()
                .push(value.into_owned());
        }
        Ok(Self(values))
    }

    /// First value for `key`, or the empty string.
    pub fn get(&self, key: &str) -> &str {
        self.0
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Every value for `key` in submission order.
    pub fn get_all(&self, key: &str) -> &[String] {
        self.0.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

fn validate_form_encoding(input: &str) -> Result<()> {
    if input.contains(';') {
        return Err(Error::malformed("invalid semicolon separator"));
    }

    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes
                .get(i + 1..i + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
            if !valid {
                let end = (i + 3).min(bytes.len());
                return Err(Error::malformed(format!(
                    "invalid escape {:?}",
                    String::from_utf8_lossy(&bytes[i..end])
                )));
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    Ok(())
}

/// A parsed inbound request.
#[derive(Debug, Clone, Default)]
pub struct Request {
    pub path: String,
    pub query: FormValues,
    /// Empty unless a content length was declared.
    pub form: FormValues,
    pub cookie_header: String,
}

/// Build a [`Request`] from the CGI variables and the request body.
///
/// The body is only read when `CONTENT_LENGTH` is set and non-empty, and
/// exactly that many bytes must be available.
pub fn parse_request<R: Read>(env: &CgiEnvironment, mut body: R) -> Result<Request> {
    let query = FormValues::parse(&env.query_string)
        .map_err(|e| Error::malformed(format!("error parsing query ({}): {e}", env.query_string)))?;

    let form = match env.content_length.as_deref().map(str::trim) {
        None | Some("") => FormValues::default(),
        Some(raw) => {
            let length: usize = raw
                .parse()
                .map_err(|e| Error::malformed(format!("invalid content length {raw:?}: {e}")))?;
            if length > MAX_BODY_BYTES {
                return Err(Error::malformed(format!(
                    "content length {length} exceeds {MAX_BODY_BYTES} bytes"
                )));
            }

            let mut buf = vec![0u8; length];
            body.read_exact(&mut buf)
                .map_err(|e| Error::malformed(format!("error reading POST data: {e}")))?;
            let text = String::from_utf8_lossy(&buf);
            FormValues::parse(&text)
                .map_err(|e| Error::malformed(format!("error parsing POST data: {e}")))?
        }
    };

    Ok(Request {
        path: env.path_info.clone(),
        query,
        form,
        cookie_header: env.http_cookie.clone(),
    })
}
