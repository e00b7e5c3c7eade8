use chipmunk::Error;
use chipmunk::routing::Route;

#[test]
fn test_route_captures_parameters() {
    let mut route = Route::new("GET", "/{id}-{slug}", "post").unwrap();
    route.where_param("id", "[0-9]+").unwrap();

    let params = route.matches("GET", "/50-my-post-title").unwrap();
    assert_eq!(params.get("id"), Some("50"));
    assert_eq!(params.get("slug"), Some("my-post-title"));

    let names: Vec<&str> = params.iter().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["id", "slug"]);
}

#[test]
fn test_route_constraint_rejects_path() {
    let mut route = Route::new("GET", "/{id}-{slug}", ()).unwrap();
    route.where_param("id", "[0-9]+").unwrap();

    assert!(route.matches("GET", "/abc-my-post-title").is_none());
}

#[test]
fn test_route_matches_whole_path() {
    let route = Route::new("GET", "/posts", ()).unwrap();

    assert!(route.matches("GET", "/posts").is_some());
    assert!(route.matches("GET", "/posts/1").is_none());
    assert!(route.matches("GET", "/api/posts").is_none());
}

#[test]
fn test_route_methods() {
    let route = Route::new("GET|POST", "/form", ()).unwrap();

    assert_eq!(route.methods(), &["GET".to_string(), "POST".to_string()]);
    assert!(route.matches("POST", "/form").is_some());
    assert!(route.matches("DELETE", "/form").is_none());
    // methods are case-sensitive
    assert!(route.matches("get", "/form").is_none());
}

#[test]
fn test_route_empty_methods() {
    assert!(matches!(Route::new("", "/", ()), Err(Error::InvalidArgument(_))));
}

#[test]
fn test_route_failed_match_after_success_is_clean() {
    let route = Route::new("GET", "/user/{name}", ()).unwrap();

    assert!(route.matches("GET", "/user/alice").is_some());
    assert!(route.matches("GET", "/other").is_none());
    assert_eq!(route.matches("GET", "/user/bob").unwrap().get("name"), Some("bob"));
}

#[test]
fn test_route_unknown_parameter() {
    let mut route = Route::new("GET", "/{id}", ()).unwrap();
    assert!(matches!(route.where_param("slug", "[a-z]+"), Err(Error::InvalidArgument(_))));
}

#[test]
fn test_route_empty_regex() {
    let mut route = Route::new("GET", "/{id}", ()).unwrap();
    assert!(matches!(route.where_param("id", ""), Err(Error::InvalidArgument(_))));
}

#[test]
fn test_route_chained_constraints() {
    let mut route = Route::new("GET", "/{year}/{month}", ()).unwrap();
    route
        .where_param("year", "[0-9]{4}")
        .unwrap()
        .where_param("month", "[0-9]{2}")
        .unwrap();

    assert!(route.matches("GET", "/2024/05").is_some());
    assert!(route.matches("GET", "/24/05").is_none());
}

#[test]
fn test_route_build_uri() {
    let route = Route::new("GET", "/{id}-{slug}", ()).unwrap();

    let uri = route.build_uri([("id", "50"), ("slug", "my-post-title")]).unwrap();
    assert_eq!(uri.path(), "/50-my-post-title");

    // missing vars are left as-is
    let partial = route.build_uri([("id", 7)]).unwrap();
    assert_eq!(partial.path(), "/7-%7Bslug%7D");
}

#[test]
fn test_route_build_uri_unknown_var() {
    let route = Route::new("GET", "/{id}", ()).unwrap();
    let result = route.build_uri([("slug", "x")]);

    assert!(matches!(result, Err(Error::InvalidArgument(_))));
}

#[test]
fn test_route_pattern_text_is_literal() {
    let route = Route::new("GET", "/posts/?", "posts").unwrap();

    assert!(route.matches("GET", "/posts/?").is_some());
    assert!(route.matches("GET", "/posts").is_none());
    assert!(route.matches("GET", "/posts/").is_none());
}
