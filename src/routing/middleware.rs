use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::http::response::Response;
use crate::http::uri::QueryValue;
use crate::middleware::Middleware;
use crate::middleware::components::Components;
use crate::middleware::dispatcher::Dispatcher;

/// Terminal pipeline step: resolves the request against the router and
/// invokes the matched target.
///
/// Route parameters are merged into the query params, replacing query
/// values of the same name.
#[derive(Debug, Default, Clone, Copy)]
pub struct RoutingMiddleware;

impl Middleware for RoutingMiddleware {
    fn name(&self) -> &'static str {
        "routing"
    }

    fn process(&self, mut components: Components, _dispatcher: &mut Dispatcher) -> Result<Response> {
        let method = components.request().method().to_string();
        let path = match components.request().uri().path() {
            "" => "/".to_string(),
            path => path.to_string(),
        };

        let (target, params) = {
            let router = components.require_router()?;
            let Some(found) = router.catch(&method, &path) else {
                warn!(method = %method, path = %path, "no route found");
                return Err(Error::NoRouteFound { method, path });
            };
            debug!(
                method = %method,
                path = %path,
                route = found.route.pattern(),
                route_name = found.name.unwrap_or_default(),
                "route resolved"
            );
            (found.route.target().clone(), found.params)
        };

        let mut query = components.request().query_params().clone();
        for (name, value) in params {
            query.insert(name, QueryValue::Single(value));
        }
        let request = components.request().with_query_params(query);
        components.set_request(request);

        target(components)
    }
}
