use crate::error::{Error, Result};
use crate::http::message::{Message, impl_message};
use crate::http::uri::Uri;

/// An immutable HTTP request.
///
/// Every `with_*` method returns a new request; headers are copied only when
/// they change and the body stream is shared between copies.
#[derive(Debug, Clone)]
pub struct Request {
    message: Message,
    method: String,
    uri: Uri,
    target: Option<String>,
}

impl Default for Request {
    fn default() -> Self {
        Self {
            message: Message::default(),
            method: "GET".to_string(),
            uri: Uri::new(),
            target: None,
        }
    }
}

impl_message!(Request);

impl Request {
    /// A `GET` request for the empty URI.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn message(&self) -> &Message {
        &self.message
    }

    pub(crate) fn message_mut(&mut self) -> &mut Message {
        &mut self.message
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Sets the method, case preserved.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an empty method or one containing whitespace.
    pub fn with_method(&self, method: &str) -> Result<Self> {
        if method.is_empty() || method.chars().any(char::is_whitespace) {
            return Err(Error::invalid_argument(
                "request method cannot be empty and must not contain white spaces",
            ));
        }
        let mut request = self.clone();
        request.method = method.to_string();
        Ok(request)
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Replaces the URI.
    ///
    /// The `Host` header is taken from the new URI when it has a host, unless
    /// `preserve_host` is set and the request already carries a non-empty
    /// `Host` header.
    pub fn with_uri(&self, uri: Uri, preserve_host: bool) -> Result<Self> {
        if uri == self.uri {
            return Ok(self.clone());
        }
        let keep_existing = preserve_host && !self.header_line("Host").is_empty();
        let mut request = self.clone();
        request.uri = uri;
        if !keep_existing && !request.uri.host().is_empty() {
            let host = match request.uri.port() {
                Some(port) => format!("{}:{}", request.uri.host(), port),
                None => request.uri.host().to_string(),
            };
            request.message.headers_mut().set("Host", vec![host])?;
        }
        Ok(request)
    }

    /// The explicit target if one was set, else `path[?query]` with `/` for
    /// an empty path.
    pub fn request_target(&self) -> String {
        if let Some(target) = &self.target {
            return target.clone();
        }
        let path = match self.uri.path() {
            "" => "/",
            path => path,
        };
        match self.uri.query() {
            "" => path.to_string(),
            query => format!("{path}?{query}"),
        }
    }

    pub fn with_request_target(&self, target: &str) -> Self {
        let mut request = self.clone();
        request.target = Some(target.to_string());
        request
    }

    /// `Content-Length` as a number, 0 when missing or invalid.
    pub fn content_length(&self) -> usize {
        self.header_line("Content-Length").trim().parse().unwrap_or(0)
    }

    /// Whether the connection should stay open after the response.
    ///
    /// Follows the `Connection` header, defaulting to keep-alive except for
    /// HTTP/1.0.
    pub fn keep_alive(&self) -> bool {
        let connection = self.header_line("Connection");
        if connection.eq_ignore_ascii_case("close") {
            false
        } else if connection.eq_ignore_ascii_case("keep-alive") {
            true
        } else {
            self.protocol_version() != "1.0"
        }
    }
}
