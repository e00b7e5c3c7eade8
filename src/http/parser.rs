use bytes::Bytes;

use crate::http::environment::ServerEnvironment;

#[derive(Debug, PartialEq, Eq)]
pub enum ParseError {
    InvalidRequest,
    InvalidMethod,
    InvalidHeader,
    InvalidContentLength,
    Incomplete,
}

/// Parses one HTTP/1.x request out of `buf`.
///
/// Returns the request data and the number of bytes consumed, or
/// `ParseError::Incomplete` when more data is needed. Connection-level
/// fields (TLS flag, addresses) are left for the caller to fill in.
pub fn parse_http_request(buf: &[u8]) -> Result<(ServerEnvironment, usize), ParseError> {
    // Look for header/body separator
    let headers_end = find_headers_end(buf).ok_or(ParseError::Incomplete)?;
    let header_bytes = &buf[..headers_end];
    let body_bytes = &buf[headers_end + 4..];

    let headers_str = std::str::from_utf8(header_bytes).map_err(|_| ParseError::InvalidRequest)?;

    let mut lines = headers_str.split("\r\n");

    // Request line
    let request_line = lines.next().ok_or(ParseError::InvalidRequest)?;
    let mut parts = request_line.split_whitespace();

    let method = parts.next().ok_or(ParseError::InvalidRequest)?;
    let target = parts.next().ok_or(ParseError::InvalidRequest)?;
    let version = parts.next().ok_or(ParseError::InvalidRequest)?;

    if !is_token(method) {
        return Err(ParseError::InvalidMethod);
    }
    if !version.starts_with("HTTP/") {
        return Err(ParseError::InvalidRequest);
    }

    // Headers
    let mut headers = Vec::new();

    for line in lines {
        if line.is_empty() {
            continue;
        }

        let (key, value) = line.split_once(':').ok_or(ParseError::InvalidHeader)?;
        let key = key.trim();
        if key.is_empty() || !is_token(key) {
            return Err(ParseError::InvalidHeader);
        }

        headers.push((key.to_string(), value.trim().to_string()));
    }

    // Body
    let content_length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("Content-Length"))
        .map(|(_, v)| v.parse::<usize>().map_err(|_| ParseError::InvalidContentLength))
        .transpose()?
        .unwrap_or(0);

    if body_bytes.len() < content_length {
        return Err(ParseError::Incomplete);
    }

    let query_string = target.split_once('?').map(|(_, q)| q.to_string());

    let env = ServerEnvironment {
        method: method.to_string(),
        request_uri: target.to_string(),
        query_string,
        protocol: version.to_string(),
        headers,
        body: Bytes::copy_from_slice(&body_bytes[..content_length]),
        ..ServerEnvironment::default()
    };

    let total_consumed = headers_end + 4 + content_length;
    Ok((env, total_consumed))
}

fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

/// RFC 9110 token characters.
fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b))
}
