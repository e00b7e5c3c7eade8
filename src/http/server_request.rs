//! Server-side view of an incoming request.
//!
//! [`ServerRequest`] wraps a [`Request`] with the data a server environment
//! provides: server params, cookies, decoded query params, a parsed body,
//! uploaded files and free-form attributes.

use std::collections::BTreeMap;

use serde_yaml::Value;

use crate::error::{Error, Result};
use crate::http::message::{Message, impl_message};
use crate::http::request::Request;
use crate::http::uploaded_file::UploadedFile;
use crate::http::uri::{QueryParams, Uri};

/// Decoded request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedBody {
    /// `application/x-www-form-urlencoded` fields.
    Form(QueryParams),
    /// Any structured document.
    Document(Value),
}

#[derive(Debug, Clone, Default)]
pub struct ServerRequest {
    request: Request,
    server_params: BTreeMap<String, String>,
    cookie_params: BTreeMap<String, String>,
    query_params: QueryParams,
    parsed_body: Option<ParsedBody>,
    uploaded_files: BTreeMap<String, UploadedFile>,
    attributes: BTreeMap<String, Value>,
}

impl_message!(ServerRequest);

impl ServerRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn message(&self) -> &Message {
        self.request.message()
    }

    pub(crate) fn message_mut(&mut self) -> &mut Message {
        self.request.message_mut()
    }

    /// The plain request this server request wraps.
    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn method(&self) -> &str {
        self.request.method()
    }

    pub fn with_method(&self, method: &str) -> Result<Self> {
        let request = self.request.with_method(method)?;
        Ok(self.with_request(request))
    }

    pub fn uri(&self) -> &Uri {
        self.request.uri()
    }

    pub fn with_uri(&self, uri: Uri, preserve_host: bool) -> Result<Self> {
        let request = self.request.with_uri(uri, preserve_host)?;
        Ok(self.with_request(request))
    }

    pub fn request_target(&self) -> String {
        self.request.request_target()
    }

    pub fn with_request_target(&self, target: &str) -> Self {
        self.with_request(self.request.with_request_target(target))
    }

    pub fn keep_alive(&self) -> bool {
        self.request.keep_alive()
    }

    fn with_request(&self, request: Request) -> Self {
        let mut next = self.clone();
        next.request = request;
        next
    }

    pub fn server_params(&self) -> &BTreeMap<String, String> {
        &self.server_params
    }

    pub fn with_server_params(&self, params: BTreeMap<String, String>) -> Self {
        let mut next = self.clone();
        next.server_params = params;
        next
    }

    pub fn cookie_params(&self) -> &BTreeMap<String, String> {
        &self.cookie_params
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookie_params.get(name).map(String::as_str)
    }

    /// # Errors
    ///
    /// `InvalidArgument` when a cookie name is empty or contains a space or a
    /// dot.
    pub fn with_cookie_params(&self, cookies: BTreeMap<String, String>) -> Result<Self> {
        if let Some(name) = cookies
            .keys()
            .find(|name| name.is_empty() || name.contains(' ') || name.contains('.'))
        {
            return Err(Error::invalid_argument(format!(
                "cookie name \"{name}\" cannot be empty or contain spaces or dots"
            )));
        }
        let mut next = self.clone();
        next.cookie_params = cookies;
        Ok(next)
    }

    pub fn query_params(&self) -> &QueryParams {
        &self.query_params
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).and_then(|value| value.first())
    }

    pub fn with_query_params(&self, params: QueryParams) -> Self {
        let mut next = self.clone();
        next.query_params = params;
        next
    }

    pub fn parsed_body(&self) -> Option<&ParsedBody> {
        self.parsed_body.as_ref()
    }

    pub fn with_parsed_body(&self, body: Option<ParsedBody>) -> Self {
        let mut next = self.clone();
        next.parsed_body = body;
        next
    }

    pub fn uploaded_files(&self) -> &BTreeMap<String, UploadedFile> {
        &self.uploaded_files
    }

    pub fn with_uploaded_files(&self, files: BTreeMap<String, UploadedFile>) -> Self {
        let mut next = self.clone();
        next.uploaded_files = files;
        next
    }

    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Sets an attribute; returns an identical copy when the value is
    /// unchanged.
    pub fn with_attribute(&self, name: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        if self.attributes.get(name) == Some(&value) {
            return self.clone();
        }
        let mut next = self.clone();
        next.attributes.insert(name.to_string(), value);
        next
    }

    pub fn without_attribute(&self, name: &str) -> Self {
        let mut next = self.clone();
        next.attributes.remove(name);
        next
    }
}

impl From<Request> for ServerRequest {
    fn from(request: Request) -> Self {
        Self {
            request,
            ..Self::default()
        }
    }
}
