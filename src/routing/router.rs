use crate::error::{Error, Result};
use crate::http::uri::Uri;
use crate::routing::route::{Params, Route};

/// A route that matched, with the parameters it captured.
#[derive(Debug)]
pub struct RouteMatch<'a, T> {
    pub route: &'a Route<T>,
    /// Set when the route was registered under a name.
    pub name: Option<&'a str>,
    pub params: Params,
}

/// Ordered route collection.
///
/// Named routes are tried before anonymous ones; within each group, in
/// registration order.
#[derive(Debug, Clone)]
pub struct Router<T> {
    named: Vec<(String, Route<T>)>,
    anonymous: Vec<Route<T>>,
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self {
            named: Vec::new(),
            anonymous: Vec::new(),
        }
    }
}

impl<T> Router<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a route and returns it for further constraints.
    ///
    /// A non-empty `name` replaces any route already registered under it,
    /// keeping the original position.
    pub fn map(&mut self, methods: &str, pattern: &str, target: T, name: &str) -> Result<&mut Route<T>> {
        let route = Route::new(methods, pattern, target)?;

        if name.is_empty() {
            self.anonymous.push(route);
            let last = self.anonymous.len() - 1;
            return Ok(&mut self.anonymous[last]);
        }

        let slot = match self.named.iter().position(|(n, _)| n == name) {
            Some(slot) => {
                self.named[slot].1 = route;
                slot
            }
            None => {
                self.named.push((name.to_string(), route));
                self.named.len() - 1
            }
        };
        Ok(&mut self.named[slot].1)
    }

    /// First route matching `method` and `path`.
    pub fn catch(&self, method: &str, path: &str) -> Option<RouteMatch<'_, T>> {
        let named = self
            .named
            .iter()
            .map(|(name, route)| (Some(name.as_str()), route));
        let anonymous = self.anonymous.iter().map(|route| (None, route));

        named.chain(anonymous).find_map(|(name, route)| {
            route
                .matches(method, path)
                .map(|params| RouteMatch { route, name, params })
        })
    }

    pub fn route(&self, name: &str) -> Option<&Route<T>> {
        self.named.iter().find(|(n, _)| n == name).map(|(_, r)| r)
    }

    pub fn route_mut(&mut self, name: &str) -> Option<&mut Route<T>> {
        self.named.iter_mut().find(|(n, _)| n == name).map(|(_, r)| r)
    }

    /// Builds the URI of the route registered as `name`, `None` when there
    /// is no such route.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an empty name or a var the pattern lacks.
    pub fn build_uri<I, K, V>(&self, name: &str, vars: I) -> Result<Option<Uri>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: ToString,
    {
        if name.is_empty() {
            return Err(Error::invalid_argument("route name cannot be empty"));
        }
        self.route(name).map(|route| route.build_uri(vars)).transpose()
    }

    pub fn len(&self) -> usize {
        self.named.len() + self.anonymous.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
