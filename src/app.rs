use std::fmt;
use std::sync::Arc;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::http::response::Response;
use crate::http::server_request::ServerRequest;
use crate::middleware::components::Components;
use crate::middleware::dispatcher::Dispatcher;
use crate::middleware::session::SessionStore;
use crate::middleware::{ConfigurationLoader, ErrorBoundary, Middleware, ModuleLoader, ModuleRegistry, SessionMiddleware};
use crate::routing::RoutingMiddleware;

/// An application: the middleware pipeline every request goes through.
///
/// Cloning is cheap; clones share the middlewares.
#[derive(Clone)]
pub struct App {
    middlewares: Arc<[Arc<dyn Middleware>]>,
}

impl App {
    /// # Errors
    ///
    /// `InvalidArgument` for an empty pipeline.
    pub fn new(middlewares: Vec<Arc<dyn Middleware>>) -> Result<Self> {
        if middlewares.is_empty() {
            return Err(Error::invalid_argument("middleware queue cannot be empty"));
        }
        Ok(Self {
            middlewares: middlewares.into(),
        })
    }

    /// The standard pipeline: error boundary, configuration, session,
    /// modules, routing.
    pub fn standard(config: Arc<Config>, registry: ModuleRegistry, store: Arc<dyn SessionStore>) -> Self {
        let display_errors = config.error.display_errors;
        let middlewares: Vec<Arc<dyn Middleware>> = vec![
            Arc::new(ErrorBoundary::translating(display_errors)),
            Arc::new(ConfigurationLoader::new(config)),
            Arc::new(SessionMiddleware::new(store)),
            Arc::new(ModuleLoader::new(Arc::new(registry))),
            Arc::new(RoutingMiddleware),
        ];
        Self {
            middlewares: middlewares.into(),
        }
    }

    /// Runs `request` through a fresh dispatcher.
    pub fn handle(&self, request: ServerRequest) -> Result<Response> {
        let mut dispatcher = Dispatcher::new(self.middlewares.to_vec())?;
        dispatcher.handle(Components::new(request))
    }

    pub fn middleware_names(&self) -> Vec<&'static str> {
        self.middlewares.iter().map(|m| m.name()).collect()
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("middlewares", &self.middleware_names())
            .finish()
    }
}
