use chipmunk::Error;
use chipmunk::routing::Router;

#[test]
fn test_router_catch_returns_params() {
    let mut router = Router::new();
    router.map("GET", "/{id}-{slug}", "post", "post").unwrap().where_param("id", "[0-9]+").unwrap();

    let found = router.catch("GET", "/50-my-post-title").unwrap();
    assert_eq!(*found.route.target(), "post");
    assert_eq!(found.name, Some("post"));
    assert_eq!(found.params.get("id"), Some("50"));
    assert_eq!(found.params.get("slug"), Some("my-post-title"));
}

#[test]
fn test_router_no_match() {
    let mut router = Router::new();
    router.map("GET", "/", "home", "").unwrap();

    assert!(router.catch("GET", "/missing").is_none());
    assert!(router.catch("POST", "/").is_none());
}

#[test]
fn test_router_named_route_wins_over_earlier_anonymous() {
    let mut router = Router::new();
    router.map("GET", "/{page}", "anonymous", "").unwrap();
    router.map("GET", "/{slug}", "named", "page").unwrap();

    let found = router.catch("GET", "/about").unwrap();
    assert_eq!(*found.route.target(), "named");
}

#[test]
fn test_router_insertion_order_within_group() {
    let mut router = Router::new();
    router.map("GET", "/{a}", "first", "").unwrap();
    router.map("GET", "/{b}", "second", "").unwrap();

    assert_eq!(*router.catch("GET", "/x").unwrap().route.target(), "first");
}

#[test]
fn test_router_named_route_overwrite_keeps_position() {
    let mut router = Router::new();
    router.map("GET", "/{x}", "one", "one").unwrap();
    router.map("GET", "/{y}", "two", "two").unwrap();
    router.map("GET", "/{z}", "one again", "one").unwrap();

    assert_eq!(router.len(), 2);
    assert_eq!(*router.catch("GET", "/q").unwrap().route.target(), "one again");
    assert_eq!(router.route("one").unwrap().pattern(), "/{z}");
}

#[test]
fn test_router_build_uri() {
    let mut router = Router::new();
    router.map("GET", "/{id}-{slug}", (), "post").unwrap();

    let uri = router
        .build_uri("post", [("id", "50"), ("slug", "my-post-title")])
        .unwrap()
        .unwrap();
    assert_eq!(uri.to_string(), "/50-my-post-title");
}

#[test]
fn test_router_build_uri_unknown_name() {
    let router: Router<()> = Router::new();
    let uri = router.build_uri("missing", [("id", "1")]).unwrap();

    assert!(uri.is_none());
}

#[test]
fn test_router_build_uri_empty_name() {
    let router: Router<()> = Router::new();
    let result = router.build_uri("", std::iter::empty::<(&str, &str)>());

    assert!(matches!(result, Err(Error::InvalidArgument(_))));
}

#[test]
fn test_router_build_uri_unknown_var() {
    let mut router = Router::new();
    router.map("GET", "/{id}", (), "item").unwrap();

    let result = router.build_uri("item", [("nope", "1")]);
    assert!(matches!(result, Err(Error::InvalidArgument(_))));
}
