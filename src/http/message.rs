//! Parts shared by requests and responses: protocol version, headers and body.
//!
//! `Request` and `Response` embed a [`Message`]. Headers sit behind an `Arc`
//! and are only copied when a `with_*` call changes them; the body is a
//! shared [`Body`] handle that cloning never duplicates.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use regex::Regex;

use crate::error::{Error, Result};
use crate::stream::Stream;

static PROTOCOL_VERSION: OnceLock<Regex> = OnceLock::new();

fn protocol_version_regex() -> &'static Regex {
    PROTOCOL_VERSION.get_or_init(|| Regex::new(r"([0-9]\.[0-9])").expect("Invalid regex"))
}

/// Conversion into the list of values stored for one header.
pub trait IntoHeaderValues {
    fn into_header_values(self) -> Vec<String>;
}

impl IntoHeaderValues for &str {
    fn into_header_values(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl IntoHeaderValues for String {
    fn into_header_values(self) -> Vec<String> {
        vec![self]
    }
}

impl IntoHeaderValues for Vec<String> {
    fn into_header_values(self) -> Vec<String> {
        self
    }
}

impl IntoHeaderValues for Vec<&str> {
    fn into_header_values(self) -> Vec<String> {
        self.into_iter().map(str::to_string).collect()
    }
}

impl IntoHeaderValues for &[&str] {
    fn into_header_values(self) -> Vec<String> {
        self.iter().map(|v| v.to_string()).collect()
    }
}

impl<const N: usize> IntoHeaderValues for [&str; N] {
    fn into_header_values(self) -> Vec<String> {
        self.iter().map(|v| v.to_string()).collect()
    }
}

/// Case-insensitive header multimap keeping the first-seen casing and
/// insertion order of names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderBag {
    entries: Vec<(String, Vec<String>)>,
    // lowercase name -> canonical name
    names: HashMap<String, String>,
}

impl HeaderBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(&name.to_ascii_lowercase())
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        let canonical = self.names.get(&name.to_ascii_lowercase())?;
        self.entries
            .iter()
            .find(|(n, _)| n == canonical)
            .map(|(_, values)| values.as_slice())
    }

    /// Values joined with `,`, empty when the header is absent.
    pub fn line(&self, name: &str) -> String {
        self.get(name).map(|values| values.join(",")).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replaces every value of `name`.
    pub fn set(&mut self, name: &str, values: Vec<String>) -> Result<()> {
        if name.is_empty() {
            return Err(Error::invalid_argument("header name cannot be empty"));
        }
        if values.is_empty() {
            return Err(Error::invalid_argument(format!("header \"{name}\" needs at least one value")));
        }
        let lower = name.to_ascii_lowercase();
        match self.names.get(&lower) {
            Some(canonical) => {
                if let Some(entry) = self.entries.iter_mut().find(|(n, _)| n == canonical) {
                    entry.1 = values;
                }
            }
            None => {
                self.names.insert(lower, name.to_string());
                self.entries.push((name.to_string(), values));
            }
        }
        Ok(())
    }

    /// Appends the values not already present for `name`.
    pub fn append(&mut self, name: &str, values: Vec<String>) -> Result<()> {
        let mut merged = self.get(name).map(<[String]>::to_vec).unwrap_or_default();
        for value in values {
            if !merged.contains(&value) {
                merged.push(value);
            }
        }
        self.set(name, merged)
    }

    pub fn remove(&mut self, name: &str) -> bool {
        match self.names.remove(&name.to_ascii_lowercase()) {
            Some(canonical) => {
                self.entries.retain(|(n, _)| *n != canonical);
                true
            }
            None => false,
        }
    }
}

/// Shared handle on a message body stream.
#[derive(Debug, Clone, Default)]
pub struct Body(Arc<Mutex<Stream>>);

impl Body {
    pub fn new(stream: Stream) -> Self {
        Self(Arc::new(Mutex::new(stream)))
    }

    /// Locks the underlying stream.
    pub fn lock(&self) -> MutexGuard<'_, Stream> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether both handles point at the same stream.
    pub fn ptr_eq(&self, other: &Body) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl From<Stream> for Body {
    fn from(stream: Stream) -> Self {
        Body::new(stream)
    }
}

impl From<&str> for Body {
    fn from(content: &str) -> Self {
        Body::new(Stream::from_bytes(content))
    }
}

/// Rewinds and renders the whole stream, empty on read failure.
impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lock().to_text())
    }
}

#[derive(Debug, Clone)]
pub struct Message {
    protocol_version: String,
    headers: Arc<HeaderBag>,
    body: Body,
}

impl Default for Message {
    fn default() -> Self {
        Self {
            protocol_version: "1.1".to_string(),
            headers: Arc::new(HeaderBag::new()),
            body: Body::default(),
        }
    }
}

impl Message {
    pub fn protocol_version(&self) -> &str {
        &self.protocol_version
    }

    /// Extracts a `d.d` version out of inputs such as `"1.0"` or `"HTTP/2.0"`.
    pub(crate) fn set_protocol_version(&mut self, version: &str) -> Result<()> {
        let caps = protocol_version_regex().captures(version).ok_or_else(|| {
            Error::invalid_argument(format!("cannot retrieve an HTTP protocol version from \"{version}\""))
        })?;
        self.protocol_version = caps[1].to_string();
        Ok(())
    }

    pub fn headers(&self) -> &HeaderBag {
        &self.headers
    }

    pub(crate) fn headers_mut(&mut self) -> &mut HeaderBag {
        Arc::make_mut(&mut self.headers)
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub(crate) fn set_body(&mut self, body: Body) {
        self.body = body;
    }
}

/// Delegating accessors and copy-on-write mutators for types embedding a
/// [`Message`].
macro_rules! impl_message {
    ($ty:ty) => {
        impl $ty {
            pub fn protocol_version(&self) -> &str {
                self.message().protocol_version()
            }

            pub fn with_protocol_version(&self, version: &str) -> $crate::error::Result<Self> {
                let mut next = self.clone();
                next.message_mut().set_protocol_version(version)?;
                Ok(next)
            }

            pub fn headers(&self) -> &$crate::http::message::HeaderBag {
                self.message().headers()
            }

            pub fn has_header(&self, name: &str) -> bool {
                self.message().headers().contains(name)
            }

            /// Values of `name`, empty when absent.
            pub fn header(&self, name: &str) -> &[String] {
                self.message().headers().get(name).unwrap_or(&[])
            }

            pub fn header_line(&self, name: &str) -> String {
                self.message().headers().line(name)
            }

            pub fn with_header(
                &self,
                name: &str,
                value: impl $crate::http::message::IntoHeaderValues,
            ) -> $crate::error::Result<Self> {
                let mut next = self.clone();
                next.message_mut().headers_mut().set(name, value.into_header_values())?;
                Ok(next)
            }

            pub fn with_added_header(
                &self,
                name: &str,
                value: impl $crate::http::message::IntoHeaderValues,
            ) -> $crate::error::Result<Self> {
                let mut next = self.clone();
                next.message_mut().headers_mut().append(name, value.into_header_values())?;
                Ok(next)
            }

            pub fn without_header(&self, name: &str) -> Self {
                let mut next = self.clone();
                if self.has_header(name) {
                    next.message_mut().headers_mut().remove(name);
                }
                next
            }

            pub fn body(&self) -> &$crate::http::message::Body {
                self.message().body()
            }

            pub fn with_body(&self, body: impl Into<$crate::http::message::Body>) -> Self {
                let mut next = self.clone();
                next.message_mut().set_body(body.into());
                next
            }
        }
    };
}

pub(crate) use impl_message;
