use std::sync::Arc;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::http::server_request::ServerRequest;
use crate::middleware::session::Session;
use crate::routing::{Handler, Router};

/// Request-scoped state handed down the pipeline.
///
/// Only the request is always present; the other components are installed
/// by the middlewares that own them.
#[derive(Default)]
pub struct Components {
    request: ServerRequest,
    config: Option<Arc<Config>>,
    router: Option<Router<Handler>>,
    session: Option<Session>,
}

impl Components {
    pub fn new(request: ServerRequest) -> Self {
        Self {
            request,
            ..Self::default()
        }
    }

    pub fn request(&self) -> &ServerRequest {
        &self.request
    }

    pub fn set_request(&mut self, request: ServerRequest) {
        self.request = request;
    }

    pub fn config(&self) -> Option<&Arc<Config>> {
        self.config.as_ref()
    }

    pub fn require_config(&self) -> Result<&Arc<Config>> {
        self.config.as_ref().ok_or_else(|| missing("config"))
    }

    pub fn set_config(&mut self, config: Arc<Config>) {
        self.config = Some(config);
    }

    pub fn router(&self) -> Option<&Router<Handler>> {
        self.router.as_ref()
    }

    pub fn require_router(&self) -> Result<&Router<Handler>> {
        self.router.as_ref().ok_or_else(|| missing("router"))
    }

    pub fn require_router_mut(&mut self) -> Result<&mut Router<Handler>> {
        self.router.as_mut().ok_or_else(|| missing("router"))
    }

    pub fn set_router(&mut self, router: Router<Handler>) {
        self.router = Some(router);
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn require_session(&self) -> Result<&Session> {
        self.session.as_ref().ok_or_else(|| missing("session"))
    }

    pub fn set_session(&mut self, session: Session) {
        self.session = Some(session);
    }
}

fn missing(component: &str) -> Error {
    Error::Configuration(format!("component \"{component}\" has not been initialized"))
}
