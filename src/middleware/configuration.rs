use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::http::response::Response;
use crate::middleware::Middleware;
use crate::middleware::components::Components;
use crate::middleware::dispatcher::Dispatcher;
use crate::routing::Router;

#[derive(Debug, Clone)]
enum Source {
    Loaded(Arc<Config>),
    File(PathBuf),
}

/// Installs the configuration and an empty router into the components.
#[derive(Debug, Clone)]
pub struct ConfigurationLoader {
    source: Source,
}

impl ConfigurationLoader {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            source: Source::Loaded(config),
        }
    }

    /// Reads the YAML file at `path` on every request.
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            source: Source::File(path.into()),
        }
    }
}

impl Middleware for ConfigurationLoader {
    fn name(&self) -> &'static str {
        "configuration"
    }

    fn process(&self, mut components: Components, dispatcher: &mut Dispatcher) -> Result<Response> {
        let config = match &self.source {
            Source::Loaded(config) => Arc::clone(config),
            Source::File(path) => Arc::new(Config::from_file(path)?),
        };
        components.set_config(config);
        components.set_router(Router::new());
        dispatcher.handle(components)
    }
}
