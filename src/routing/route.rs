use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};
use crate::http::uri::Uri;

static TOKEN: OnceLock<Regex> = OnceLock::new();

fn token_regex() -> &'static Regex {
    TOKEN.get_or_init(|| Regex::new(r"\{(.+?)\}").expect("Invalid regex"))
}

/// Matching regex of a parameter nobody constrained.
pub const DEFAULT_PARAM_PATTERN: &str = ".+";

/// Parameter values captured by a successful match, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl IntoIterator for Params {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// A method set and URI pattern leading to a target.
///
/// Patterns name their parameters between braces, e.g. `/post-{id}`. Each
/// parameter matches `.+` until constrained with [`Route::where_param`];
/// the text around parameters is matched literally.
#[derive(Clone)]
pub struct Route<T> {
    methods: Vec<String>,
    pattern: String,
    target: T,
    // parameter name -> regex fragment, declaration order
    params: Vec<(String, String)>,
    regex: Regex,
    // capture group of each parameter
    groups: Vec<usize>,
}

impl<T> Route<T> {
    /// Creates a route. Several methods may be given separated with `|`
    /// (`"GET|POST"`); they are case-sensitive.
    ///
    /// Text outside `{name}` tokens matches literally: `/posts/?` only
    /// matches that exact path, not an optional slash. Use a parameter
    /// constraint with [`where_param`](Self::where_param) for regex
    /// behaviour.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when `methods` is empty.
    pub fn new(methods: &str, pattern: &str, target: T) -> Result<Self> {
        if methods.is_empty() {
            return Err(Error::invalid_argument("route methods cannot be empty"));
        }
        let mut params: Vec<(String, String)> = Vec::new();
        for caps in token_regex().captures_iter(pattern) {
            let name = &caps[1];
            if !params.iter().any(|(n, _)| n == name) {
                params.push((name.to_string(), DEFAULT_PARAM_PATTERN.to_string()));
            }
        }
        let (regex, groups) = compile(pattern, &params)?;
        Ok(Self {
            methods: methods.split('|').map(str::to_string).collect(),
            pattern: pattern.to_string(),
            target,
            params,
            regex,
            groups,
        })
    }

    /// Constrains parameter `name` to `regex` (no delimiters, no anchors).
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when the pattern has no such parameter, or the
    /// regex is empty or does not compile.
    pub fn where_param(&mut self, name: &str, regex: &str) -> Result<&mut Self> {
        if regex.is_empty() {
            return Err(Error::invalid_argument("route parameter regex cannot be empty"));
        }
        let slot = self
            .params
            .iter()
            .position(|(n, _)| n == name)
            .ok_or_else(|| {
                Error::invalid_argument(format!("parameter \"{name}\" does not exist in URI pattern"))
            })?;

        let mut params = self.params.clone();
        params[slot].1 = regex.to_string();
        let (compiled, groups) = compile(&self.pattern, &params)?;
        self.params = params;
        self.regex = compiled;
        self.groups = groups;
        Ok(self)
    }

    pub fn methods(&self) -> &[String] {
        &self.methods
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    /// Parameter names in declaration order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|(n, _)| n.as_str())
    }

    /// Matches `method` and the whole of `path`, returning the captured
    /// parameters. The route itself is never modified.
    pub fn matches(&self, method: &str, path: &str) -> Option<Params> {
        if !self.methods.iter().any(|m| m == method) {
            return None;
        }
        let caps = self.regex.captures(path)?;
        let values = self
            .params
            .iter()
            .zip(&self.groups)
            .map(|((name, _), group)| {
                let value = caps.get(*group).map_or("", |m| m.as_str());
                (name.clone(), value.to_string())
            })
            .collect();
        Some(Params(values))
    }

    /// Substitutes each `name => value` into the pattern.
    ///
    /// Values are not encoded and parameters left out stay as `{name}`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when a given name has no placeholder.
    pub fn build_uri<I, K, V>(&self, vars: I) -> Result<Uri>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: ToString,
    {
        let mut uri = self.pattern.clone();
        for (name, value) in vars {
            let token = format!("{{{}}}", name.as_ref());
            if !uri.contains(&token) {
                return Err(Error::invalid_argument(format!(
                    "URI var \"{}\" could not be found",
                    name.as_ref()
                )));
            }
            uri = uri.replace(&token, &value.to_string());
        }
        Uri::parse(&uri)
    }
}

impl<T> fmt::Debug for Route<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("methods", &self.methods)
            .field("pattern", &self.pattern)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Builds the anchored regex for `pattern` and the capture group index of
/// every parameter.
fn compile(pattern: &str, params: &[(String, String)]) -> Result<(Regex, Vec<usize>)> {
    let mut source = String::from("^");
    let mut groups = vec![0; params.len()];
    let mut next_group = 1;
    let mut last = 0;

    for caps in token_regex().captures_iter(pattern) {
        let token = caps.get(0).map_or(0..0, |m| m.range());
        source.push_str(&regex::escape(&pattern[last..token.start]));
        last = token.end;

        let slot = params.iter().position(|(n, _)| *n == caps[1]).unwrap_or(0);
        let fragment = &params[slot].1;
        let inner = Regex::new(fragment)
            .map_err(|e| Error::invalid_argument(format!("invalid parameter regex \"{fragment}\": {e}")))?
            .captures_len()
            - 1;

        if groups[slot] == 0 {
            groups[slot] = next_group;
        }
        source.push('(');
        source.push_str(fragment);
        source.push(')');
        next_group += 1 + inner;
    }
    source.push_str(&regex::escape(&pattern[last..]));
    source.push('$');

    let regex = Regex::new(&source)
        .map_err(|e| Error::invalid_argument(format!("invalid route pattern \"{pattern}\": {e}")))?;
    Ok((regex, groups))
}
