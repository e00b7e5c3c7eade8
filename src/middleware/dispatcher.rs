use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::http::response::Response;
use crate::middleware::Middleware;
use crate::middleware::components::Components;

/// Where the cursor of a [`Dispatcher`] stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    /// Before the first middleware.
    Idle,
    /// At the middleware with this index.
    Running(usize),
    /// Past the last middleware.
    Exhausted,
}

/// Runs a middleware list for one request.
///
/// The cursor is per instance, so a dispatcher serves a single top-level
/// request; build a new one for each.
pub struct Dispatcher {
    queue: Vec<Arc<dyn Middleware>>,
    offset: Option<usize>,
}

impl Dispatcher {
    /// # Errors
    ///
    /// `InvalidArgument` when `queue` is empty.
    pub fn new(queue: Vec<Arc<dyn Middleware>>) -> Result<Self> {
        if queue.is_empty() {
            return Err(Error::invalid_argument("middleware queue cannot be empty"));
        }
        Ok(Self { queue, offset: None })
    }

    pub fn state(&self) -> DispatcherState {
        match self.offset {
            None => DispatcherState::Idle,
            Some(i) if i < self.queue.len() => DispatcherState::Running(i),
            Some(_) => DispatcherState::Exhausted,
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Advances to the next middleware and lets it process `components`.
    ///
    /// # Errors
    ///
    /// `NoResponseProduced` when the chain is already exhausted; otherwise
    /// whatever the middleware returns.
    pub fn handle(&mut self, components: Components) -> Result<Response> {
        let offset = self.offset.map_or(0, |i| i + 1);
        self.offset = Some(offset);

        let Some(middleware) = self.queue.get(offset).cloned() else {
            tracing::debug!(position = offset, "middleware chain exhausted");
            return Err(Error::NoResponseProduced);
        };
        tracing::debug!(middleware = middleware.name(), position = offset, "dispatching");
        middleware.process(components, self)
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.queue.iter().map(|m| m.name()).collect();
        f.debug_struct("Dispatcher")
            .field("queue", &names)
            .field("offset", &self.offset)
            .finish()
    }
}
