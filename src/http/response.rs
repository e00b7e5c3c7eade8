use crate::error::{Error, Result};
use crate::http::message::{Message, impl_message};
use crate::stream::Stream;

/// Standard reason phrase of every status code a response may carry.
///
/// # Example
///
/// ```
/// # use chipmunk::http::response::reason_phrase;
/// assert_eq!(reason_phrase(200), Some("OK"));
/// assert_eq!(reason_phrase(404), Some("Not Found"));
/// assert_eq!(reason_phrase(299), None);
/// ```
pub fn reason_phrase(code: u16) -> Option<&'static str> {
    let phrase = match code {
        100 => "Continue",
        101 => "Switching Protocols",
        102 => "Processing",
        103 => "Early Hints",
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        203 => "Non-Authoritative Information",
        204 => "No Content",
        205 => "Reset Content",
        206 => "Partial Content",
        207 => "Multi-Status",
        208 => "Already Reported",
        226 => "IM Used",
        300 => "Multiple Choices",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        304 => "Not Modified",
        305 => "Use Proxy",
        306 => "Switch Proxy",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",
        400 => "Bad Request",
        401 => "Unauthorized",
        402 => "Payment Required",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        406 => "Not Acceptable",
        407 => "Proxy Authentication Required",
        408 => "Request Time-out",
        409 => "Conflict",
        410 => "Gone",
        411 => "Length Required",
        412 => "Precondition Failed",
        413 => "Request Entity Too Large",
        414 => "Request-URI Too Large",
        415 => "Unsupported Media Type",
        416 => "Requested range not satisfiable",
        417 => "Expectation Failed",
        421 => "Misdirected Request",
        422 => "Unprocessable Entity",
        423 => "Locked",
        424 => "Failed Dependency",
        425 => "Too Early",
        426 => "Upgrade Required",
        428 => "Precondition Required",
        429 => "Too Many Requests",
        431 => "Request Header Fields Too Large",
        451 => "Unavailable For Legal Reasons",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Time-out",
        505 => "HTTP Version not supported",
        506 => "Variant Also Negotiates",
        507 => "Insufficient Storage",
        508 => "Loop Detected",
        510 => "Not Extended",
        511 => "Network Authentication Required",
        _ => return None,
    };
    Some(phrase)
}

/// An immutable HTTP response, `200 OK` with an empty body by default.
#[derive(Debug, Clone)]
pub struct Response {
    message: Message,
    status: u16,
    reason: String,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            message: Message::default(),
            status: 200,
            reason: "OK".to_string(),
        }
    }
}

impl_message!(Response);

impl Response {
    /// A `200 OK` response whose body holds `content`.
    pub fn new(content: impl Into<Vec<u8>>) -> Self {
        Self::default().with_body(Stream::from_bytes(content))
    }

    pub(crate) fn message(&self) -> &Message {
        &self.message
    }

    pub(crate) fn message_mut(&mut self) -> &mut Message {
        &mut self.message
    }

    pub fn status_code(&self) -> u16 {
        self.status
    }

    pub fn reason_phrase(&self) -> &str {
        &self.reason
    }

    /// Sets the status; an empty `reason` selects the standard phrase.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a code missing from the status table.
    pub fn with_status(&self, code: u16, reason: &str) -> Result<Self> {
        let standard = reason_phrase(code)
            .ok_or_else(|| Error::invalid_argument(format!("unknown HTTP response status code {code}")))?;
        let reason = if reason.is_empty() { standard } else { reason };
        if code == self.status && reason == self.reason {
            return Ok(self.clone());
        }
        let mut response = self.clone();
        response.status = code;
        response.reason = reason.to_string();
        Ok(response)
    }

    /// Creates a simple 200 OK response with the given body.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::new(body)
    }

    pub fn bad_request() -> Self {
        Self::with_code(400, "400 Bad Request")
    }

    pub fn payload_too_large() -> Self {
        Self::with_code(413, "413 Request Entity Too Large")
    }

    /// Creates a 404 Not Found response.
    pub fn not_found() -> Self {
        Self::with_code(404, "404 Not Found")
    }

    /// Creates a 500 Internal Server Error response.
    pub fn internal_error() -> Self {
        Self::with_code(500, "500 Internal Server Error")
    }

    /// Response for an error that escaped the pipeline. The error text is
    /// only rendered when `display_errors` is set.
    pub fn for_error(error: &Error, display_errors: bool) -> Self {
        let code = error.status_code();
        let phrase = reason_phrase(code).unwrap_or("Internal Server Error");
        let body = if display_errors {
            format!("{code} {phrase}\n\n{error}\n")
        } else {
            format!("{code} {phrase}")
        };
        Self::with_code(code, body)
    }

    fn with_code(code: u16, body: impl Into<Vec<u8>>) -> Self {
        let mut response = Self::new(body);
        if let Some(phrase) = reason_phrase(code) {
            response.status = code;
            response.reason = phrase.to_string();
        }
        response
    }
}
