//! Middleware pipeline.
//!
//! A pipeline is an ordered list of middleware units run by a
//! [`Dispatcher`]. Each unit receives the request-scoped [`Components`]
//! and the dispatcher itself, and either answers with a response or hands
//! the components on with [`Dispatcher::handle`], inspecting or replacing
//! whatever comes back.
//!
//! ```text
//! handle ─→ MW1.process ─→ MW2.process ─→ MW3.process
//!                                             │
//! Response ←──────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use chipmunk::http::response::Response;
//! use chipmunk::middleware::{from_fn, Middleware};
//! use chipmunk::middleware::components::Components;
//! use chipmunk::middleware::dispatcher::Dispatcher;
//!
//! let pipeline: Vec<Arc<dyn Middleware>> = vec![
//!     Arc::new(from_fn("powered-by", |components, dispatcher: &mut Dispatcher| {
//!         dispatcher.handle(components)?.with_header("X-Powered-By", "chipmunk")
//!     })),
//!     Arc::new(from_fn("hello", |_, _: &mut Dispatcher| Ok(Response::ok("hello")))),
//! ];
//!
//! let mut dispatcher = Dispatcher::new(pipeline).unwrap();
//! let response = dispatcher.handle(Components::default()).unwrap();
//! assert_eq!(response.header_line("X-Powered-By"), "chipmunk");
//! ```

pub mod components;
pub mod configuration;
pub mod dispatcher;
pub mod error_boundary;
pub mod module;
pub mod session;

use crate::error::Result;
use crate::http::response::Response;

pub use components::Components;
pub use configuration::ConfigurationLoader;
pub use dispatcher::{Dispatcher, DispatcherState};
pub use error_boundary::ErrorBoundary;
pub use module::{Module, ModuleLoader, ModuleRegistry};
pub use session::{MemorySessionStore, Session, SessionMiddleware, SessionStore};

/// One unit of the pipeline.
pub trait Middleware: Send + Sync {
    /// Unique name for this middleware (used for logging/debugging).
    fn name(&self) -> &'static str;

    /// Answers the request, or delegates to the rest of the chain through
    /// `dispatcher`.
    fn process(&self, components: Components, dispatcher: &mut Dispatcher) -> Result<Response>;
}

/// Middleware backed by a closure.
pub struct FnMiddleware<F> {
    name: &'static str,
    f: F,
}

/// Wraps `f` as a named middleware.
pub fn from_fn<F>(name: &'static str, f: F) -> FnMiddleware<F>
where
    F: Fn(Components, &mut Dispatcher) -> Result<Response> + Send + Sync,
{
    FnMiddleware { name, f }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: Fn(Components, &mut Dispatcher) -> Result<Response> + Send + Sync,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn process(&self, components: Components, dispatcher: &mut Dispatcher) -> Result<Response> {
        (self.f)(components, dispatcher)
    }
}
