//! URI patterns, the router, and the pipeline step that dispatches to the
//! matched target.

pub mod middleware;
pub mod route;
pub mod router;

use std::sync::Arc;

use crate::error::Result;
use crate::http::response::Response;
use crate::middleware::components::Components;

pub use middleware::RoutingMiddleware;
pub use route::{Params, Route};
pub use router::{RouteMatch, Router};

/// Application code a route leads to.
pub type Handler = Arc<dyn Fn(Components) -> Result<Response> + Send + Sync>;

/// Wraps a closure as a [`Handler`].
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(Components) -> Result<Response> + Send + Sync + 'static,
{
    Arc::new(f)
}
