use std::collections::BTreeMap;

use bytes::Bytes;
use chipmunk::Error;
use chipmunk::http::environment::ServerEnvironment;
use chipmunk::http::server_request::{ParsedBody, ServerRequest};
use chipmunk::http::uri::Uri;

fn env(request_uri: &str, headers: &[(&str, &str)]) -> ServerEnvironment {
    ServerEnvironment {
        method: "GET".to_string(),
        request_uri: request_uri.to_string(),
        protocol: "HTTP/1.1".to_string(),
        headers: headers
            .iter()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect(),
        ..ServerEnvironment::default()
    }
}

#[test]
fn test_uri_from_environment_uses_host_header() {
    let uri = Uri::from_environment(&env("/posts?page=2", &[("Host", "blog.test:8080")])).unwrap();

    assert_eq!(uri.to_string(), "http://blog.test:8080/posts?page=2");
}

#[test]
fn test_uri_from_environment_https_and_server_name() {
    let mut e = env("/secure", &[]);
    e.https = true;
    e.server_name = Some("secure.test".to_string());
    e.server_port = Some(443);

    let uri = Uri::from_environment(&e).unwrap();
    assert_eq!(uri.scheme(), "https");
    assert_eq!(uri.host(), "secure.test");
    assert_eq!(uri.port(), None);
    assert_eq!(uri.to_string(), "https://secure.test/secure");
}

#[test]
fn test_uri_from_environment_falls_back_to_server_addr_and_query_string() {
    let mut e = env("/search", &[]);
    e.server_addr = Some("10.0.0.1".to_string());
    e.server_port = Some(8000);
    e.query_string = Some("q=rust".to_string());

    let uri = Uri::from_environment(&e).unwrap();
    assert_eq!(uri.to_string(), "http://10.0.0.1:8000/search?q=rust");
}

#[test]
fn test_server_request_from_environment() {
    let e = env(
        "/posts?tag=a&tag=b",
        &[
            ("Host", "blog.test"),
            ("Accept", "text/html, application/json"),
            ("Cookie", "theme=dark; bad.name=x"),
        ],
    );
    let request = ServerRequest::from_environment(e).unwrap();

    assert_eq!(request.method(), "GET");
    assert_eq!(request.protocol_version(), "1.1");
    assert_eq!(request.uri().path(), "/posts");
    assert_eq!(request.header("accept"), &["text/html".to_string(), "application/json".to_string()]);
    assert_eq!(request.header_line("Host"), "blog.test");
    assert_eq!(request.cookie("theme"), Some("dark"));
    assert_eq!(request.cookie("bad.name"), None);
    assert_eq!(request.query_params().get("tag").map(|v| v.values()), Some(vec!["a", "b"]));
    assert_eq!(request.server_params().get("REQUEST_METHOD").map(String::as_str), Some("GET"));
}

#[test]
fn test_server_request_repeated_header_lines_accumulate() {
    let e = env("/", &[("X-Forwarded-For", "1.1.1.1"), ("x-forwarded-for", "2.2.2.2")]);
    let request = ServerRequest::from_environment(e).unwrap();

    assert_eq!(request.header_line("X-Forwarded-For"), "1.1.1.1,2.2.2.2");
}

#[test]
fn test_server_request_form_body() {
    let mut e = env("/login", &[("Content-Type", "application/x-www-form-urlencoded")]);
    e.method = "POST".to_string();
    e.body = Bytes::from_static(b"user=alice&pass=s%3Dcret");

    let request = ServerRequest::from_environment(e).unwrap();

    match request.parsed_body() {
        Some(ParsedBody::Form(form)) => {
            assert_eq!(form.get("user").and_then(|v| v.first()), Some("alice"));
            assert_eq!(form.get("pass").and_then(|v| v.first()), Some("s=cret"));
        }
        other => panic!("unexpected parsed body: {other:?}"),
    }
    // the raw body is readable from the start
    assert_eq!(request.body().lock().read(4).unwrap().as_ref(), b"user");
}

#[test]
fn test_server_request_invalid_host_is_rejected() {
    let result = ServerRequest::from_environment(env("/", &[("Host", "bad host")]));
    assert!(result.is_err());
}

#[test]
fn test_server_request_attributes() {
    let request = ServerRequest::new().with_attribute("user_id", 7);
    assert_eq!(request.attribute("user_id").and_then(|v| v.as_i64()), Some(7));

    let same = request.with_attribute("user_id", 7);
    assert_eq!(same.attributes(), request.attributes());

    let removed = request.without_attribute("user_id");
    assert!(removed.attribute("user_id").is_none());
    assert!(request.attribute("user_id").is_some());
    // removing a missing attribute is a no-op
    assert!(removed.without_attribute("user_id").attributes().is_empty());
}

#[test]
fn test_server_request_rejects_invalid_cookie_names() {
    let mut cookies = BTreeMap::new();
    cookies.insert("has space".to_string(), "v".to_string());

    let result = ServerRequest::new().with_cookie_params(cookies);
    assert!(matches!(result, Err(Error::InvalidArgument(_))));
}

#[test]
fn test_server_request_with_methods_do_not_modify_receiver() {
    let request = ServerRequest::new();
    let changed = request.with_method("DELETE").unwrap();

    assert_eq!(request.method(), "GET");
    assert_eq!(changed.method(), "DELETE");
}
