//! Immutable URI value object.
//!
//! Components follow RFC 3986: scheme, user info, host, port, path, query
//! and fragment. Every `with_*` method validates its input and returns a new
//! [`Uri`], leaving the receiver untouched. Percent-encoding is applied per
//! component and never double-encodes an existing `%XX` triple.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use percent_encoding::percent_encode_byte;
use regex::Regex;
use url::form_urlencoded;

use crate::error::{Error, Result};

const SUB_DELIMS: &[u8] = b"!$&'()*+,;=";

/// Schemes this URI type accepts.
const SUPPORTED_SCHEMES: [&str; 2] = ["http", "https"];

/// RFC 3986 appendix B.
static URI_REFERENCE: OnceLock<Regex> = OnceLock::new();
static SCHEME: OnceLock<Regex> = OnceLock::new();
static HOST: OnceLock<Regex> = OnceLock::new();

fn uri_reference() -> &'static Regex {
    URI_REFERENCE.get_or_init(|| {
        Regex::new(r"^(?:([^:/?#]+):)?(?://([^/?#]*))?([^?#]*)(?:\?([^#]*))?(?:#(.*))?$")
            .expect("Invalid regex")
    })
}

fn scheme_regex() -> &'static Regex {
    SCHEME.get_or_init(|| Regex::new(r"^[a-z][a-z0-9+\-.]*$").expect("Invalid regex"))
}

fn host_regex() -> &'static Regex {
    HOST.get_or_init(|| {
        Regex::new(r"^(([a-z0-9]|[a-z0-9][a-z0-9\-]*[a-z0-9])\.)*([a-z0-9]|[a-z0-9][a-z0-9\-]*[a-z0-9])$")
            .expect("Invalid regex")
    })
}

/// Default port of well-known schemes.
pub fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "ftp" => Some(21),
        "gopher" => Some(70),
        "http" => Some(80),
        "https" => Some(443),
        "imap" => Some(143),
        "ldap" => Some(389),
        "nntp" | "news" => Some(119),
        "pop" => Some(110),
        "telnet" | "tn3270" => Some(23),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy)]
enum Component {
    UserInfo,
    Path,
    Query,
    Fragment,
}

impl Component {
    fn allows(self, b: u8) -> bool {
        let unreserved = b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~');
        if unreserved || SUB_DELIMS.contains(&b) {
            return true;
        }
        match self {
            Component::UserInfo => false,
            Component::Path => matches!(b, b':' | b'@' | b'/'),
            Component::Query | Component::Fragment => matches!(b, b':' | b'@' | b'/' | b'?'),
        }
    }
}

/// Percent-encodes every byte outside the component's allowed set, along
/// with any `%` that does not start a valid triple.
fn encode_component(input: &str, component: Component) -> String {
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'%' && is_hex_at(bytes, i + 1) && is_hex_at(bytes, i + 2) {
            out.push_str(&input[i..i + 3]);
            i += 3;
            continue;
        }
        if b != b'%' && component.allows(b) {
            out.push(b as char);
        } else {
            out.push_str(percent_encode_byte(b));
        }
        i += 1;
    }
    out
}

fn is_hex_at(bytes: &[u8], index: usize) -> bool {
    bytes.get(index).is_some_and(u8::is_ascii_hexdigit)
}

/// A query parameter value. Repeated keys accumulate into `Multiple`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    Single(String),
    Multiple(Vec<String>),
}

impl QueryValue {
    /// First value, the only one for `Single`.
    pub fn first(&self) -> Option<&str> {
        match self {
            QueryValue::Single(value) => Some(value),
            QueryValue::Multiple(values) => values.first().map(String::as_str),
        }
    }

    pub fn values(&self) -> Vec<&str> {
        match self {
            QueryValue::Single(value) => vec![value.as_str()],
            QueryValue::Multiple(values) => values.iter().map(String::as_str).collect(),
        }
    }

    fn push(&mut self, value: String) {
        match self {
            QueryValue::Single(first) => {
                *self = QueryValue::Multiple(vec![std::mem::take(first), value]);
            }
            QueryValue::Multiple(values) => values.push(value),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Single(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Single(value)
    }
}

impl From<Vec<String>> for QueryValue {
    fn from(values: Vec<String>) -> Self {
        QueryValue::Multiple(values)
    }
}

pub type QueryParams = BTreeMap<String, QueryValue>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Uri {
    scheme: String,
    user: String,
    pass: Option<String>,
    host: String,
    port: Option<u16>,
    path: String,
    query: String,
    fragment: String,
}

impl Uri {
    /// An empty URI reference.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a URI reference, validating each component through its setter.
    pub fn parse(input: &str) -> Result<Self> {
        let mut uri = Uri::new();
        if input.is_empty() {
            return Ok(uri);
        }

        let caps = uri_reference()
            .captures(input)
            .ok_or_else(|| Error::UriSyntax(input.to_string()))?;

        if let Some(scheme) = caps.get(1) {
            uri.set_scheme(scheme.as_str())?;
        }

        if let Some(authority) = caps.get(2) {
            let (userinfo, hostport) = match authority.as_str().rsplit_once('@') {
                Some((userinfo, hostport)) => (Some(userinfo), hostport),
                None => (None, authority.as_str()),
            };
            let (host, port) = split_host_port(hostport)
                .ok_or_else(|| Error::UriSyntax(input.to_string()))?;

            uri.set_host(host)?;
            if port.is_some() {
                uri.set_port(port)?;
            }
            if let Some(userinfo) = userinfo {
                let (user, pass) = match userinfo.split_once(':') {
                    Some((user, pass)) => (user, Some(pass)),
                    None => (userinfo, None),
                };
                if !user.is_empty() {
                    uri.set_user(user)?;
                    if let Some(pass) = pass {
                        uri.set_pass(pass);
                    }
                }
            }
        }

        uri.set_path(caps.get(3).map_or("", |m| m.as_str()))?;
        if let Some(query) = caps.get(4) {
            uri.set_query(query.as_str());
        }
        if let Some(fragment) = caps.get(5) {
            uri.set_fragment(fragment.as_str());
        }
        Ok(uri)
    }

    /// True when the URI has no scheme.
    pub fn is_relative_reference(&self) -> bool {
        self.scheme.is_empty()
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn with_scheme(&self, scheme: &str) -> Result<Self> {
        let mut uri = self.clone();
        uri.set_scheme(scheme)?;
        Ok(uri)
    }

    fn set_scheme(&mut self, scheme: &str) -> Result<()> {
        if scheme.is_empty() {
            self.scheme.clear();
            return Ok(());
        }
        let scheme = scheme.to_ascii_lowercase();
        if !scheme_regex().is_match(&scheme) {
            return Err(Error::uri_component("scheme", format!("invalid scheme \"{scheme}\"")));
        }
        if !SUPPORTED_SCHEMES.contains(&scheme.as_str()) {
            return Err(Error::uri_component("scheme", format!("unsupported scheme \"{scheme}\"")));
        }
        self.scheme = scheme;
        Ok(())
    }

    /// `[user[:pass]@]host[:port]`, the port omitted when it is the scheme
    /// default.
    pub fn authority(&self) -> String {
        let mut authority = String::new();
        let user_info = self.user_info();
        if !user_info.is_empty() {
            authority.push_str(&user_info);
            authority.push('@');
        }
        authority.push_str(&self.host);
        if let Some(port) = self.port {
            if default_port(&self.scheme) != Some(port) {
                authority.push(':');
                authority.push_str(&port.to_string());
            }
        }
        authority
    }

    pub fn user_info(&self) -> String {
        match self.pass.as_deref() {
            Some(pass) if !pass.is_empty() => format!("{}:{}", self.user, pass),
            _ => self.user.clone(),
        }
    }

    /// Sets the user info; an empty user clears both user and password.
    pub fn with_user_info(&self, user: &str, pass: Option<&str>) -> Result<Self> {
        let mut uri = self.clone();
        if user.is_empty() {
            uri.user.clear();
            uri.pass = None;
        } else {
            uri.set_user(user)?;
            if let Some(pass) = pass {
                uri.set_pass(pass);
            }
        }
        Ok(uri)
    }

    fn set_user(&mut self, user: &str) -> Result<()> {
        if self.host.is_empty() {
            return Err(Error::uri_component("user info", "cannot apply user info on a URI without host"));
        }
        self.user = encode_component(user, Component::UserInfo);
        Ok(())
    }

    fn set_pass(&mut self, pass: &str) {
        self.pass = Some(encode_component(pass, Component::UserInfo));
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn with_host(&self, host: &str) -> Result<Self> {
        let mut uri = self.clone();
        uri.set_host(host)?;
        Ok(uri)
    }

    fn set_host(&mut self, host: &str) -> Result<()> {
        let host = host.to_ascii_lowercase();
        if !host.is_empty() && !host_regex().is_match(&host) {
            return Err(Error::uri_component("host", format!("invalid host name \"{host}\"")));
        }
        if host.is_empty() {
            self.user.clear();
            self.pass = None;
            self.port = None;
        }
        self.host = host;
        Ok(())
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Sets the port. A port equal to the scheme's default is stored as `None`.
    pub fn with_port(&self, port: Option<u32>) -> Result<Self> {
        let mut uri = self.clone();
        uri.set_port(port)?;
        Ok(uri)
    }

    fn set_port(&mut self, port: Option<u32>) -> Result<()> {
        let Some(port) = port else {
            self.port = None;
            return Ok(());
        };
        if self.host.is_empty() {
            return Err(Error::uri_component("port", "a URI without host cannot contain a port"));
        }
        let port = u16::try_from(port)
            .map_err(|_| Error::uri_component("port", format!("port {port} is outside the valid range")))?;
        self.port = if default_port(&self.scheme) == Some(port) {
            None
        } else {
            Some(port)
        };
        Ok(())
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn with_path(&self, path: &str) -> Result<Self> {
        let mut uri = self.clone();
        uri.set_path(path)?;
        Ok(uri)
    }

    fn set_path(&mut self, path: &str) -> Result<()> {
        let has_authority = !self.authority().is_empty();
        if !has_authority && path.starts_with("//") {
            return Err(Error::uri_component(
                "path",
                "a path starting with \"//\" requires an authority",
            ));
        }
        if has_authority && !path.is_empty() && !path.starts_with('/') {
            return Err(Error::uri_component(
                "path",
                "cannot apply a rootless path on a URI containing an authority",
            ));
        }
        self.path = encode_component(path, Component::Path);
        Ok(())
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn with_query(&self, query: &str) -> Self {
        let mut uri = self.clone();
        uri.set_query(query);
        uri
    }

    fn set_query(&mut self, query: &str) {
        self.query = encode_component(query, Component::Query);
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    pub fn with_fragment(&self, fragment: &str) -> Self {
        let mut uri = self.clone();
        uri.set_fragment(fragment);
        uri
    }

    fn set_fragment(&mut self, fragment: &str) {
        self.fragment = encode_component(fragment, Component::Fragment);
    }

    /// Parses a query string into parameters.
    ///
    /// The first occurrence of a key yields a `Single` value, a second
    /// occurrence promotes it to `Multiple`, further occurrences append.
    pub fn parse_query(query: &str) -> QueryParams {
        let mut parsed = QueryParams::new();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let value = value.into_owned();
            match parsed.get_mut(key.as_ref()) {
                Some(existing) => existing.push(value),
                None => {
                    parsed.insert(key.into_owned(), QueryValue::Single(value));
                }
            }
        }
        parsed
    }

    /// Builds a form-encoded query string, repeating keys of `Multiple` values.
    pub fn build_query(params: &QueryParams) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in params {
            for v in value.values() {
                serializer.append_pair(key, v);
            }
        }
        serializer.finish()
    }
}

/// Splits `host[:port]`. Returns `None` when the port is not numeric.
fn split_host_port(hostport: &str) -> Option<(&str, Option<u32>)> {
    match hostport.rsplit_once(':') {
        Some((host, "")) => Some((host, None)),
        Some((host, port)) => {
            if !port.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            port.parse().ok().map(|port| (host, Some(port)))
        }
        None => Some((hostport, None)),
    }
}

fn first_segment_has_colon(path: &str) -> bool {
    path.split('/').next().is_some_and(|segment| segment.contains(':'))
}

impl FromStr for Uri {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Uri::parse(s)
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.scheme.is_empty() {
            write!(f, "{}:", self.scheme)?;
        }
        let authority = self.authority();
        if !authority.is_empty() {
            write!(f, "//{authority}")?;
        }
        if !self.path.is_empty() {
            if authority.is_empty() {
                // keep the path from reading as an authority or a scheme
                if self.path.starts_with("//") {
                    f.write_str("/.")?;
                } else if self.scheme.is_empty() && first_segment_has_colon(&self.path) {
                    f.write_str("./")?;
                }
            } else if !self.path.starts_with('/') {
                f.write_str("/")?;
            }
            f.write_str(&self.path)?;
        }
        if !self.query.is_empty() {
            write!(f, "?{}", self.query)?;
        }
        if !self.fragment.is_empty() {
            write!(f, "#{}", self.fragment)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_keeps_valid_triples() {
        assert_eq!(encode_component("a b%20c", Component::Path), "a%20b%20c");
        assert_eq!(encode_component("100%", Component::Query), "100%25");
        assert_eq!(encode_component("%zz", Component::Fragment), "%25zz");
        assert_eq!(encode_component("user@host", Component::UserInfo), "user%40host");
    }

    #[test]
    fn encoding_is_idempotent() {
        for input in ["é/ü?x=1", "a%2", "%%41", "[]{}|"] {
            let once = encode_component(input, Component::Query);
            assert_eq!(encode_component(&once, Component::Query), once);
        }
    }

    #[test]
    fn split_host_and_port() {
        assert_eq!(split_host_port("example.com:8080"), Some(("example.com", Some(8080))));
        assert_eq!(split_host_port("example.com:"), Some(("example.com", None)));
        assert_eq!(split_host_port("example.com"), Some(("example.com", None)));
        assert_eq!(split_host_port("example.com:http"), None);
    }
}
