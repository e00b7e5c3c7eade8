use chipmunk::Error;
use chipmunk::http::request::Request;
use chipmunk::http::response::Response;
use chipmunk::http::uri::Uri;
use chipmunk::stream::Stream;

#[test]
fn test_request_defaults() {
    let req = Request::new();

    assert_eq!(req.method(), "GET");
    assert_eq!(req.protocol_version(), "1.1");
    assert_eq!(req.request_target(), "/");
    assert!(req.headers().is_empty());
    assert_eq!(req.body().to_string(), "");
}

#[test]
fn test_request_header_retrieval_is_case_insensitive() {
    let req = Request::new()
        .with_header("Content-Type", "application/json")
        .unwrap();

    assert!(req.has_header("content-type"));
    assert_eq!(req.header("CONTENT-TYPE"), &["application/json".to_string()]);
    assert_eq!(req.header_line("Missing"), "");
    assert!(req.header("Missing").is_empty());
}

#[test]
fn test_request_header_first_casing_is_kept() {
    let req = Request::new()
        .with_header("X-Trace", "a")
        .unwrap()
        .with_added_header("x-trace", vec!["b", "a"])
        .unwrap();

    let names: Vec<&str> = req.headers().iter().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["X-Trace"]);
    assert_eq!(req.header_line("X-TRACE"), "a,b");
}

#[test]
fn test_request_with_header_replaces_values() {
    let req = Request::new().with_header("Accept", vec!["text/html", "text/plain"]).unwrap();
    let replaced = req.with_header("accept", "*/*").unwrap();

    assert_eq!(req.header_line("Accept"), "text/html,text/plain");
    assert_eq!(replaced.header_line("Accept"), "*/*");
}

#[test]
fn test_request_without_header() {
    let req = Request::new().with_header("X-A", "1").unwrap();
    let removed = req.without_header("x-a");

    assert!(req.has_header("X-A"));
    assert!(!removed.has_header("X-A"));
    // removing a missing header is harmless
    assert!(!removed.without_header("X-A").has_header("X-A"));
}

#[test]
fn test_request_rejects_empty_header_name() {
    let result = Request::new().with_header("", "value");
    assert!(matches!(result, Err(Error::InvalidArgument(_))));
}

#[test]
fn test_request_method_validation() {
    let req = Request::new().with_method("patch").unwrap();
    assert_eq!(req.method(), "patch");

    assert!(matches!(Request::new().with_method(""), Err(Error::InvalidArgument(_))));
    assert!(matches!(Request::new().with_method("GE T"), Err(Error::InvalidArgument(_))));
}

#[test]
fn test_request_protocol_version() {
    let req = Request::new().with_protocol_version("HTTP/1.0").unwrap();
    assert_eq!(req.protocol_version(), "1.0");

    assert!(Request::new().with_protocol_version("HTTP/x").is_err());
}

#[test]
fn test_request_with_uri_sets_host() {
    let uri = Uri::parse("http://example.com:8080/posts?page=2").unwrap();
    let req = Request::new().with_uri(uri, false).unwrap();

    assert_eq!(req.header_line("Host"), "example.com:8080");
    assert_eq!(req.request_target(), "/posts?page=2");
}

#[test]
fn test_request_with_uri_preserve_host() {
    let req = Request::new().with_header("Host", "original.test").unwrap();
    let uri = Uri::parse("http://other.test/").unwrap();

    let preserved = req.with_uri(uri.clone(), true).unwrap();
    assert_eq!(preserved.header_line("Host"), "original.test");

    let replaced = req.with_uri(uri, false).unwrap();
    assert_eq!(replaced.header_line("Host"), "other.test");
}

#[test]
fn test_request_explicit_target() {
    let req = Request::new().with_request_target("*");
    assert_eq!(req.request_target(), "*");
}

#[test]
fn test_request_content_length_parsing() {
    let req = Request::new().with_header("Content-Length", "42").unwrap();
    assert_eq!(req.content_length(), 42);

    let invalid = Request::new().with_header("Content-Length", "not-a-number").unwrap();
    assert_eq!(invalid.content_length(), 0);
    assert_eq!(Request::new().content_length(), 0);
}

#[test]
fn test_request_keep_alive() {
    // HTTP/1.1 defaults to keep-alive
    assert!(Request::new().keep_alive());

    let close = Request::new().with_header("Connection", "close").unwrap();
    assert!(!close.keep_alive());

    let old = Request::new().with_protocol_version("1.0").unwrap();
    assert!(!old.keep_alive());

    let old_keep = old.with_header("Connection", "Keep-Alive").unwrap();
    assert!(old_keep.keep_alive());
}

#[test]
fn test_copies_share_the_body() {
    let req = Request::new().with_body("payload");
    let copy = req.with_header("X-A", "1").unwrap();

    assert!(req.body().ptr_eq(copy.body()));
    assert_eq!(copy.body().to_string(), "payload");

    let other = copy.with_body(Stream::new());
    assert!(!other.body().ptr_eq(req.body()));
}

#[test]
fn test_response_default() {
    let resp = Response::default();

    assert_eq!(resp.status_code(), 200);
    assert_eq!(resp.reason_phrase(), "OK");
    assert_eq!(resp.protocol_version(), "1.1");
}

#[test]
fn test_response_default_reason_phrase() {
    let resp = Response::default().with_status(404, "").unwrap();
    assert_eq!(resp.status_code(), 404);
    assert_eq!(resp.reason_phrase(), "Not Found");

    let custom = resp.with_status(404, "Nothing Here").unwrap();
    assert_eq!(custom.reason_phrase(), "Nothing Here");
}

#[test]
fn test_response_unknown_status() {
    let result = Response::default().with_status(299, "");
    assert!(matches!(result, Err(Error::InvalidArgument(_))));

    assert!(Response::default().with_status(999, "Custom").is_err());
}

#[test]
fn test_response_ok_body() {
    let resp = Response::ok("Hello");
    assert_eq!(resp.status_code(), 200);
    assert_eq!(resp.body().to_string(), "Hello");
}

#[test]
fn test_response_not_found() {
    let resp = Response::not_found();
    assert_eq!(resp.status_code(), 404);
    assert_eq!(resp.body().to_string(), "404 Not Found");
}

#[test]
fn test_response_internal_error() {
    let resp = Response::internal_error();
    assert_eq!(resp.status_code(), 500);
    assert_eq!(resp.reason_phrase(), "Internal Server Error");
}

#[test]
fn test_response_for_error() {
    let error = Error::NoRouteFound {
        method: "GET".to_string(),
        path: "/nowhere".to_string(),
    };

    let hidden = Response::for_error(&error, false);
    assert_eq!(hidden.status_code(), 404);
    assert_eq!(hidden.body().to_string(), "404 Not Found");

    let shown = Response::for_error(&Error::NoResponseProduced, true);
    assert_eq!(shown.status_code(), 500);
    assert!(shown.body().to_string().contains("no HTTP response was produced"));
}
