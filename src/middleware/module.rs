use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::http::response::Response;
use crate::middleware::Middleware;
use crate::middleware::components::Components;
use crate::middleware::dispatcher::Dispatcher;
use crate::routing::{Handler, Router};

/// A pluggable part of an application.
pub trait Module: Send + Sync {
    /// Registers the module's routes.
    fn map_routes(&self, router: &mut Router<Handler>) -> Result<()>;
}

type Constructor = Arc<dyn Fn() -> Box<dyn Module> + Send + Sync>;

/// Module constructors by name, filled at startup.
#[derive(Clone, Default)]
pub struct ModuleRegistry {
    constructors: BTreeMap<String, Constructor>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: &str, constructor: F) -> &mut Self
    where
        F: Fn() -> Box<dyn Module> + Send + Sync + 'static,
    {
        self.constructors.insert(name.to_string(), Arc::new(constructor));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    pub fn instantiate(&self, name: &str) -> Option<Box<dyn Module>> {
        self.constructors.get(name).map(|constructor| constructor())
    }
}

impl fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.constructors.keys()).finish()
    }
}

/// Maps the routes of every module the configuration lists, in order.
#[derive(Debug, Clone)]
pub struct ModuleLoader {
    registry: Arc<ModuleRegistry>,
}

impl ModuleLoader {
    pub fn new(registry: Arc<ModuleRegistry>) -> Self {
        Self { registry }
    }
}

impl Middleware for ModuleLoader {
    fn name(&self) -> &'static str {
        "modules"
    }

    fn process(&self, mut components: Components, dispatcher: &mut Dispatcher) -> Result<Response> {
        let config = Arc::clone(components.require_config()?);
        let router = components.require_router_mut()?;

        for name in &config.modules {
            let module = self
                .registry
                .instantiate(name)
                .ok_or_else(|| Error::Configuration(format!("unknown module \"{name}\"")))?;
            module.map_routes(router)?;
            debug!(module = %name, routes = router.len(), "module loaded");
        }

        dispatcher.handle(components)
    }
}
