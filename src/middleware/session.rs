//! Cookie-tracked sessions.
//!
//! The session attached to a request is a shared handle: changes a
//! handler makes are visible to the middleware, which saves them once the
//! inner chain has answered.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde_yaml::Value;
use tracing::debug;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::http::response::Response;
use crate::middleware::Middleware;
use crate::middleware::components::Components;
use crate::middleware::dispatcher::Dispatcher;

pub const DEFAULT_COOKIE_NAME: &str = "CHIPMUNKSESSID";

pub type SessionVars = BTreeMap<String, Value>;

#[derive(Debug)]
struct State {
    vars: SessionVars,
    is_new: bool,
    invalidated: bool,
}

#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    state: Arc<Mutex<State>>,
}

impl Session {
    /// A new session with a random id.
    pub fn start() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            state: Arc::new(Mutex::new(State {
                vars: SessionVars::new(),
                is_new: true,
                invalidated: false,
            })),
        }
    }

    /// An existing session with its stored vars.
    pub fn restore(id: impl Into<String>, vars: SessionVars) -> Self {
        Self {
            id: id.into(),
            state: Arc::new(Mutex::new(State {
                vars,
                is_new: false,
                invalidated: false,
            })),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_new(&self) -> bool {
        self.lock().is_new
    }

    /// # Errors
    ///
    /// `InvalidArgument` for an empty key.
    pub fn set_var(&self, key: &str, value: impl Into<Value>) -> Result<&Self> {
        if key.is_empty() {
            return Err(Error::invalid_argument("session var name cannot be empty"));
        }
        self.lock().vars.insert(key.to_string(), value.into());
        Ok(self)
    }

    pub fn var(&self, key: &str) -> Option<Value> {
        self.lock().vars.get(key).cloned()
    }

    pub fn var_or(&self, key: &str, default: impl Into<Value>) -> Value {
        self.var(key).unwrap_or_else(|| default.into())
    }

    pub fn var_exists(&self, key: &str) -> bool {
        self.lock().vars.contains_key(key)
    }

    pub fn unset_var(&self, key: &str) {
        self.lock().vars.remove(key);
    }

    pub fn vars(&self) -> SessionVars {
        self.lock().vars.clone()
    }

    /// Drops all vars and marks the session for removal from the store.
    pub fn invalidate(&self) {
        let mut state = self.lock();
        state.vars.clear();
        state.invalidated = true;
    }

    pub fn is_invalidated(&self) -> bool {
        self.lock().invalidated
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Persistence of session vars by id.
pub trait SessionStore: Send + Sync {
    fn load(&self, id: &str) -> Result<Option<SessionVars>>;

    fn save(&self, id: &str, vars: &SessionVars) -> Result<()>;

    fn destroy(&self, id: &str) -> Result<()>;
}

#[derive(Debug)]
struct Entry {
    vars: SessionVars,
    touched: Instant,
}

/// Sessions kept in process memory, lost on restart.
///
/// With a ttl, a session not saved for that long is treated as gone and
/// evicted on the next lookup or [`purge_expired`](Self::purge_expired).
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, Entry>>,
    ttl: Option<Duration>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: Mutex::default(),
            ttl: Some(ttl),
        }
    }

    /// Removes expired sessions and returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let mut sessions = self.sessions();
        let before = sessions.len();
        sessions.retain(|_, entry| !self.is_expired(entry));
        before - sessions.len()
    }

    fn is_expired(&self, entry: &Entry) -> bool {
        self.ttl.is_some_and(|ttl| entry.touched.elapsed() >= ttl)
    }

    pub fn len(&self) -> usize {
        self.sessions().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self, id: &str) -> Result<Option<SessionVars>> {
        let mut sessions = self.sessions();
        match sessions.get(id) {
            Some(entry) if self.is_expired(entry) => {
                sessions.remove(id);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.vars.clone())),
            None => Ok(None),
        }
    }

    fn save(&self, id: &str, vars: &SessionVars) -> Result<()> {
        let entry = Entry {
            vars: vars.clone(),
            touched: Instant::now(),
        };
        self.sessions().insert(id.to_string(), entry);
        Ok(())
    }

    fn destroy(&self, id: &str) -> Result<()> {
        self.sessions().remove(id);
        Ok(())
    }
}

/// Attaches the caller's session, then saves it after the inner chain.
///
/// The cookie name is taken from the loaded configuration when there is
/// one. A new session is only stored, and its cookie only sent, once it
/// holds a var. An invalidated session is destroyed and its cookie
/// expired.
pub struct SessionMiddleware {
    store: Arc<dyn SessionStore>,
}

impl SessionMiddleware {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }
}

impl Middleware for SessionMiddleware {
    fn name(&self) -> &'static str {
        "session"
    }

    fn process(&self, mut components: Components, dispatcher: &mut Dispatcher) -> Result<Response> {
        let cookie_name = components
            .config()
            .map_or(DEFAULT_COOKIE_NAME.to_string(), |c| c.session.cookie_name.clone());

        let restored = match components.request().cookie(&cookie_name) {
            Some(id) => self.store.load(id)?.map(|vars| Session::restore(id, vars)),
            None => None,
        };
        let session = restored.unwrap_or_else(|| {
            let session = Session::start();
            debug!(session = session.id(), "session started");
            session
        });
        components.set_session(session.clone());

        let response = dispatcher.handle(components)?;

        if session.is_invalidated() {
            if session.is_new() {
                return Ok(response);
            }
            self.store.destroy(session.id())?;
            debug!(session = session.id(), "session destroyed");
            let cookie = format!("{cookie_name}=; Path=/; Max-Age=0; HttpOnly");
            return response.with_added_header("Set-Cookie", cookie);
        }

        let vars = session.vars();
        if session.is_new() && vars.is_empty() {
            return Ok(response);
        }
        self.store.save(session.id(), &vars)?;
        if session.is_new() {
            let cookie = format!("{cookie_name}={}; Path=/; HttpOnly", session.id());
            return response.with_added_header("Set-Cookie", cookie);
        }
        Ok(response)
    }
}
