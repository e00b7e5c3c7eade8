//! Ambient request data handed over by the server layer, and the
//! constructors that turn it into a [`Uri`] and a [`ServerRequest`].

use std::collections::{BTreeMap, HashSet};

use bytes::Bytes;

use crate::error::Result;
use crate::http::server_request::{ParsedBody, ServerRequest};
use crate::http::uri::Uri;
use crate::stream::Stream;

#[derive(Debug, Clone, Default)]
pub struct ServerEnvironment {
    /// Whether the request arrived over TLS.
    pub https: bool,
    pub method: String,
    /// Raw request target, path and query.
    pub request_uri: String,
    pub query_string: Option<String>,
    /// Protocol as sent on the request line, e.g. `HTTP/1.1`.
    pub protocol: String,
    pub server_name: Option<String>,
    pub server_addr: Option<String>,
    pub server_port: Option<u16>,
    pub remote_addr: Option<String>,
    /// Header lines in arrival order.
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl ServerEnvironment {
    /// First value of a header, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Server params in the usual CGI naming.
    pub fn server_params(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        params.insert("REQUEST_METHOD".to_string(), self.method.clone());
        params.insert("REQUEST_URI".to_string(), self.request_uri.clone());
        params.insert("SERVER_PROTOCOL".to_string(), self.protocol.clone());
        if self.https {
            params.insert("HTTPS".to_string(), "on".to_string());
        }
        let optional = [
            ("QUERY_STRING", self.query_string.clone()),
            ("SERVER_NAME", self.server_name.clone()),
            ("SERVER_ADDR", self.server_addr.clone()),
            ("SERVER_PORT", self.server_port.map(|p| p.to_string())),
            ("REMOTE_ADDR", self.remote_addr.clone()),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                params.insert(key.to_string(), value);
            }
        }
        params
    }

    fn cookies(&self) -> BTreeMap<String, String> {
        let mut cookies = BTreeMap::new();
        let lines = self
            .headers
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case("Cookie"));
        for (_, line) in lines {
            for pair in line.split(';') {
                let Some((name, value)) = pair.trim().split_once('=') else {
                    continue;
                };
                if name.is_empty() || name.contains(' ') || name.contains('.') {
                    tracing::debug!(cookie = name, "ignoring cookie with invalid name");
                    continue;
                }
                cookies.insert(name.to_string(), value.to_string());
            }
        }
        cookies
    }
}

impl Uri {
    /// Assembles the request URI from the server environment.
    ///
    /// The scheme follows the TLS flag. Host and port come from the `Host`
    /// header, else from the server name (or address) and port. Path and
    /// query come from the request URI, the query string filling in a
    /// missing query.
    pub fn from_environment(env: &ServerEnvironment) -> Result<Uri> {
        let mut uri = Uri::new().with_scheme(if env.https { "https" } else { "http" })?;

        if let Some(host) = env.header("Host") {
            let host_uri = Uri::parse(&format!("//{host}"))?;
            uri = uri
                .with_host(host_uri.host())?
                .with_port(host_uri.port().map(u32::from))?;
        } else {
            if let Some(name) = env.server_name.as_deref().or(env.server_addr.as_deref()) {
                uri = uri.with_host(name)?;
            }
            if let Some(port) = env.server_port.filter(|_| !uri.host().is_empty()) {
                uri = uri.with_port(Some(u32::from(port)))?;
            }
        }

        if !env.request_uri.is_empty() {
            let (path, query) = match env.request_uri.split_once('?') {
                Some((path, query)) => (path, Some(query)),
                None => (env.request_uri.as_str(), None),
            };
            uri = uri.with_path(path)?;
            if let Some(query) = query {
                uri = uri.with_query(query);
            }
        }
        if uri.query().is_empty() {
            if let Some(query) = &env.query_string {
                uri = uri.with_query(query);
            }
        }
        Ok(uri)
    }
}

impl ServerRequest {
    /// Builds the incoming request from the server environment.
    pub fn from_environment(env: ServerEnvironment) -> Result<ServerRequest> {
        let uri = Uri::from_environment(&env)?;
        let method = if env.method.is_empty() { "GET" } else { env.method.as_str() };
        let protocol = if env.protocol.is_empty() { "1.1" } else { env.protocol.as_str() };

        let mut request = ServerRequest::new()
            .with_server_params(env.server_params())
            .with_query_params(Uri::parse_query(uri.query()))
            .with_cookie_params(env.cookies())?
            .with_method(method)?
            .with_uri(uri, false)?
            .with_protocol_version(protocol)?;

        let mut seen = HashSet::new();
        for (name, line) in &env.headers {
            let values: Vec<String> = line.split(',').map(|v| v.trim().to_string()).collect();
            request = if seen.insert(name.to_ascii_lowercase()) {
                request.with_header(name, values)?
            } else {
                request.with_added_header(name, values)?
            };
        }

        let content_type = request.header_line("Content-Type");
        if content_type.starts_with("application/x-www-form-urlencoded") {
            let form = Uri::parse_query(&String::from_utf8_lossy(&env.body));
            request = request.with_parsed_body(Some(ParsedBody::Form(form)));
        }

        let mut body = Stream::from_bytes(env.body.to_vec());
        body.rewind()?;
        Ok(request.with_body(body))
    }
}
