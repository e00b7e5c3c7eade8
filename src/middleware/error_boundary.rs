use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::error;

use crate::error::{Error, Result};
use crate::http::response::Response;
use crate::middleware::Middleware;
use crate::middleware::components::Components;
use crate::middleware::dispatcher::Dispatcher;

/// Outermost pipeline step: every failure of the inner chain, panics
/// included, passes through here.
#[derive(Debug, Default, Clone, Copy)]
pub struct ErrorBoundary {
    translate: bool,
    display_errors: bool,
}

impl ErrorBoundary {
    /// Logs failures and passes them on.
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs failures and answers with an error response instead.
    pub fn translating(display_errors: bool) -> Self {
        Self {
            translate: true,
            display_errors,
        }
    }
}

impl Middleware for ErrorBoundary {
    fn name(&self) -> &'static str {
        "error-boundary"
    }

    fn process(&self, components: Components, dispatcher: &mut Dispatcher) -> Result<Response> {
        let path = components.request().uri().path().to_string();
        let result = panic::catch_unwind(AssertUnwindSafe(|| dispatcher.handle(components)))
            .unwrap_or_else(|payload| Err(Error::MiddlewarePanicked(panic_message(payload.as_ref()))));

        match result {
            Ok(response) => Ok(response),
            Err(e) => {
                error!(path = %path, error = %e, "unhandled error in middleware chain");
                if self.translate {
                    Ok(Response::for_error(&e, self.display_errors))
                } else {
                    Err(e)
                }
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
