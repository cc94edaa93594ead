//! Main router implementation.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Value;
use tracing::{debug, trace};

use crate::config::RouterConfig;
use crate::error::{BoxError, DispatchError, Result};
use crate::filter::{FilterChain, FilterRegistry, FilterSet};
use crate::index::{ReverseIndex, RouteRef};
use crate::invoke::{HandlerRegistry, Invoke, TargetCall};
use crate::pattern::{self, Wildcard};
use crate::route::{Flow, Handler, Route, RouteSpec};
use crate::table::RouteTable;
use crate::verb::{Verb, VerbSelector};

/// One or many route patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patterns {
    /// A single string, split on the configured separator.
    One(String),
    /// Patterns that are already split.
    Many(Vec<String>),
}

impl Patterns {
    /// Expands into individual, trimmed pattern strings.
    ///
    /// An all-digit string is shorthand for a capturing group, so `"404"`
    /// becomes `"(404)"`.
    fn split(self, separator: &str) -> Vec<String> {
        match self {
            Self::One(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
                vec![format!("({s})")]
            }
            Self::One(s) => s.split(separator).map(|p| p.trim().to_string()).collect(),
            Self::Many(patterns) => patterns,
        }
    }
}

impl From<&str> for Patterns {
    fn from(s: &str) -> Self {
        Self::One(s.to_string())
    }
}

impl From<String> for Patterns {
    fn from(s: String) -> Self {
        Self::One(s)
    }
}

impl From<Vec<String>> for Patterns {
    fn from(patterns: Vec<String>) -> Self {
        Self::Many(patterns)
    }
}

impl From<Vec<&str>> for Patterns {
    fn from(patterns: Vec<&str>) -> Self {
        Self::Many(patterns.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Patterns {
    fn from(patterns: [&str; N]) -> Self {
        Self::Many(patterns.iter().map(|p| (*p).to_string()).collect())
    }
}

/// Outcome of a dispatch that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// The handler ran and returned this payload.
    Dispatched(Option<Value>),
    /// A before filter halted the pipeline; the handler did not run.
    Halted,
    /// No route matched.
    NotFound,
}

impl Dispatch {
    /// Returns true if a handler ran.
    pub const fn is_dispatched(&self) -> bool {
        matches!(self, Self::Dispatched(_))
    }

    /// Returns the handler payload, if any.
    pub fn payload(&self) -> Option<&Value> {
        match self {
            Self::Dispatched(payload) => payload.as_ref(),
            _ => None,
        }
    }
}

/// A route selected for a request, with its final parameters.
#[derive(Debug, Clone)]
pub struct Resolved {
    /// The matched route.
    pub route: Arc<Route>,
    /// Captured parameters followed by any missing defaults.
    pub params: Vec<String>,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn handler_error(route: &Route, source: BoxError) -> DispatchError {
    DispatchError::Handler {
        pattern: route.pattern().to_string(),
        source,
    }
}

/// Restores the enclosing group scope when a group callback ends.
struct GroupScope<'a> {
    router: &'a Router,
    previous: Option<RouteSpec>,
}

impl Drop for GroupScope<'_> {
    fn drop(&mut self) {
        *lock(&self.router.group) = self.previous.take();
    }
}

/// Maps verbs and paths to handlers.
///
/// Registration and dispatch both take `&self`; the route table, filters,
/// handler registry and lookup caches sit behind locks, so a router can be
/// shared across threads once configured.
#[derive(Debug, Default)]
pub struct Router {
    config: RouterConfig,
    table: RwLock<RouteTable>,
    filters: RwLock<FilterRegistry>,
    handlers: RwLock<HandlerRegistry>,
    index: ReverseIndex,
    group: Mutex<Option<RouteSpec>>,
}

impl Router {
    /// Creates a router with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a router with the given configuration.
    ///
    /// # Errors
    ///
    /// Fails if the configuration does not validate.
    pub fn with_config(config: RouterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    /// Returns the configuration.
    pub const fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Registers a route for one or more verbs and patterns.
    ///
    /// Every pattern gets its own copy of the spec. Attributes of an active
    /// [`group`](Self::group) fill whatever the route spec leaves unset.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the merged spec has no handler, or
    /// an invalid-pattern error when a pattern does not compile. Nothing is
    /// registered when an error is returned.
    pub fn register(
        &self,
        verbs: impl Into<VerbSelector>,
        patterns: impl Into<Patterns>,
        spec: impl Into<RouteSpec>,
    ) -> Result<&Self> {
        let spec = match lock(&self.group).as_ref() {
            Some(group) => spec.into().merge_missing(group),
            None => spec.into(),
        };
        if spec.handler.is_none() {
            return Err(DispatchError::Configuration(
                "route spec must name a handler".to_string(),
            ));
        }

        let patterns = patterns.into().split(&self.config.separator);
        let verbs = verbs.into().expand(&self.config.verbs);

        let mut routes = Vec::with_capacity(verbs.len() * patterns.len());
        for verb in &verbs {
            for raw in &patterns {
                let normalized = pattern::normalize_pattern(raw);
                routes.push(Route::build(*verb, &normalized, spec.clone())?);
            }
        }

        {
            let mut table = write(&self.table);
            for route in routes {
                debug!(
                    verb = %route.verb(),
                    pattern = route.pattern(),
                    fallback = route.is_fallback(),
                    "registered route"
                );
                table.insert(route);
            }
        }

        if self.config.invalidate_on_register {
            self.index.invalidate();
        }
        Ok(self)
    }

    /// Registers a GET route.
    ///
    /// # Errors
    ///
    /// See [`register`](Self::register).
    pub fn get(&self, patterns: impl Into<Patterns>, spec: impl Into<RouteSpec>) -> Result<&Self> {
        self.register(Verb::Get, patterns, spec)
    }

    /// Registers a POST route.
    ///
    /// # Errors
    ///
    /// See [`register`](Self::register).
    pub fn post(&self, patterns: impl Into<Patterns>, spec: impl Into<RouteSpec>) -> Result<&Self> {
        self.register(Verb::Post, patterns, spec)
    }

    /// Registers a PUT route.
    ///
    /// # Errors
    ///
    /// See [`register`](Self::register).
    pub fn put(&self, patterns: impl Into<Patterns>, spec: impl Into<RouteSpec>) -> Result<&Self> {
        self.register(Verb::Put, patterns, spec)
    }

    /// Registers a DELETE route.
    ///
    /// # Errors
    ///
    /// See [`register`](Self::register).
    pub fn delete(
        &self,
        patterns: impl Into<Patterns>,
        spec: impl Into<RouteSpec>,
    ) -> Result<&Self> {
        self.register(Verb::Delete, patterns, spec)
    }

    /// Registers a route for every configured verb.
    ///
    /// # Errors
    ///
    /// See [`register`](Self::register).
    pub fn any(&self, patterns: impl Into<Patterns>, spec: impl Into<RouteSpec>) -> Result<&Self> {
        self.register(VerbSelector::All, patterns, spec)
    }

    /// Registers one spec under several verb and pattern pairs.
    ///
    /// # Errors
    ///
    /// Stops at the first pair that fails to register.
    pub fn share<I, V, P>(&self, pairs: I, spec: impl Into<RouteSpec>) -> Result<&Self>
    where
        I: IntoIterator<Item = (V, P)>,
        V: Into<VerbSelector>,
        P: Into<Patterns>,
    {
        let spec = spec.into();
        for (verbs, patterns) in pairs {
            self.register(verbs, patterns, spec.clone())?;
        }
        Ok(self)
    }

    /// Registers controller targets under every verb.
    ///
    /// A target `admin.users` answers `admin/users` followed by up to
    /// `controller_segments` optional segments. The first segment picks the
    /// action, defaulting to the configured fallback action.
    ///
    /// # Errors
    ///
    /// See [`register`](Self::register).
    pub fn controller<I, S>(&self, targets: I) -> Result<&Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let defaults = vec![self.config.fallback_action.clone()];
        self.controller_with_defaults(targets, defaults)
    }

    /// Like [`controller`](Self::controller) with explicit defaults.
    ///
    /// # Errors
    ///
    /// See [`register`](Self::register).
    pub fn controller_with_defaults<I, S, D>(&self, targets: I, defaults: D) -> Result<&Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        D: IntoIterator<Item = String>,
    {
        let defaults: Vec<String> = defaults.into_iter().collect();
        let segment = format!("(:{}?)", Wildcard::Any.name());
        let wildcards = vec![segment; self.config.controller_segments].join("/");

        for target in targets {
            let target = target.as_ref().replace('.', "/");
            let pattern = format!("{target}/{wildcards}");
            let spec = RouteSpec::target(target.clone()).defaults(defaults.clone());
            self.register(VerbSelector::All, pattern.trim_matches('/'), spec)?;
        }
        Ok(self)
    }

    /// Runs `routes` with `attributes` merged into every route it registers.
    ///
    /// The scope ends when `routes` returns, whether it succeeded or not.
    /// Nested groups see the outer group's attributes where they set none of
    /// their own.
    ///
    /// # Errors
    ///
    /// Returns whatever `routes` returns.
    pub fn group<F>(&self, attributes: RouteSpec, routes: F) -> Result<()>
    where
        F: FnOnce(&Self) -> Result<()>,
    {
        let previous = {
            let mut current = lock(&self.group);
            let merged = match current.as_ref() {
                Some(outer) => attributes.merge_missing(outer),
                None => attributes,
            };
            current.replace(merged)
        };
        let _scope = GroupScope {
            router: self,
            previous,
        };
        routes(self)
    }

    /// Attaches before/after callbacks to routes whose pattern matches
    /// `pattern`, where `*` matches anything.
    ///
    /// # Errors
    ///
    /// Fails if the pattern cannot be translated.
    pub fn add_filter(&self, pattern: &str, filters: FilterSet) -> Result<&Self> {
        write(&self.filters).add(pattern, filters)?;
        debug!(pattern, "registered filter");
        Ok(self)
    }

    /// Registers the handler for a `target@action` string.
    pub fn register_action(&self, target: &str, action: &str, handler: impl Invoke + 'static) {
        write(&self.handlers).register(target, action, handler);
    }

    /// Marks a target as restful.
    pub fn mark_restful(&self, target: &str) {
        write(&self.handlers).mark_restful(target);
    }

    /// Finds a route by name or alias.
    pub fn find_by_name(&self, name: &str) -> Option<RouteRef> {
        let table = read(&self.table);
        self.index
            .find_by_name(&table, name, &self.config.alias_separator)
    }

    /// Finds a route by handler target.
    pub fn find_by_handler(&self, handler_id: &str) -> Option<RouteRef> {
        let table = read(&self.table);
        self.index.find_by_handler(&table, handler_id)
    }

    /// Drops the name and handler caches.
    pub fn invalidate_caches(&self) {
        self.index.invalidate();
    }

    /// Returns how many names and handler targets are cached.
    pub fn cached_lookups(&self) -> (usize, usize) {
        self.index.cached_len()
    }

    /// Builds the URL path of a named route.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::RouteNotFound`] for unknown names and
    /// [`DispatchError::MissingParameter`] when `params` are too few.
    pub fn url_for<S: AsRef<str>>(&self, name: &str, params: &[S]) -> Result<String> {
        let found = self
            .find_by_name(name)
            .ok_or_else(|| DispatchError::RouteNotFound(name.to_string()))?;
        pattern::fill(&found.pattern, params)
    }

    /// Returns a snapshot of every registered route.
    pub fn routes(&self) -> Vec<Arc<Route>> {
        read(&self.table).iter().cloned().collect()
    }

    /// Selects the route for a request without running it.
    ///
    /// Exact routes are looked up first. Otherwise every wildcard route of
    /// the verb is probed in registration order and the first match wins.
    pub fn resolve(&self, verb: &str, path: &str) -> Option<Resolved> {
        let verb = Verb::parse(verb)?;
        let path = pattern::normalize_path(path);
        let table = read(&self.table);

        if let Some(route) = table.exact(verb, &pattern::exact_key(&path)) {
            return Some(Resolved {
                params: route.with_defaults(Vec::new()),
                route: Arc::clone(route),
            });
        }

        let found = table.routes_for_verb(verb).find_map(|route| {
            let matcher = route.matcher()?;
            trace!(pattern = route.pattern(), path = %path, "probing route");
            matcher.captures(&path).map(|captured| Resolved {
                params: route.with_defaults(captured),
                route: Arc::clone(route),
            })
        });
        found
    }

    /// Dispatches a request to its handler.
    ///
    /// Callbacks run in the order route-before, filter-before, handler,
    /// filter-after, route-after. A before callback returning
    /// [`Flow::Halt`] stops the pipeline.
    ///
    /// # Errors
    ///
    /// Any handler or filter failure is returned as-is; callbacks that
    /// already ran are not undone.
    pub fn dispatch(&self, verb: &str, path: &str) -> Result<Dispatch> {
        let Some(resolved) = self.resolve(verb, path) else {
            debug!(verb, path, "no route matched");
            return Ok(Dispatch::NotFound);
        };

        debug!(
            verb,
            path,
            pattern = resolved.route.pattern(),
            params = ?resolved.params,
            "dispatching"
        );

        let chain = read(&self.filters)
            .filters_for(resolved.route.pattern())
            .cloned();
        self.run(&resolved, chain.as_ref())
    }

    fn run(&self, resolved: &Resolved, chain: Option<&FilterChain>) -> Result<Dispatch> {
        let route = resolved.route.as_ref();
        let params = resolved.params.as_slice();
        let global_before = chain.map(|c| c.before.as_slice()).unwrap_or_default();
        let global_after = chain.map(|c| c.after.as_slice()).unwrap_or_default();

        for before in route.before().into_iter().chain(global_before) {
            if before(params).map_err(|e| handler_error(route, e))? == Flow::Halt {
                debug!(pattern = route.pattern(), "halted by before filter");
                return Ok(Dispatch::Halted);
            }
        }

        let payload = self.invoke(route, params)?;

        for after in global_after.iter().chain(route.after()) {
            after(params).map_err(|e| handler_error(route, e))?;
        }

        Ok(Dispatch::Dispatched(payload))
    }

    fn invoke(&self, route: &Route, params: &[String]) -> Result<Option<Value>> {
        match route.handler() {
            Handler::Callback(callback) => callback
                .invoke(params)
                .map_err(|e| handler_error(route, e)),
            Handler::Target(target) => {
                let call = TargetCall::parse(target, params);
                let handler = read(&self.handlers).resolve(
                    route.verb(),
                    &call,
                    &self.config.fallback_action,
                )?;
                handler
                    .invoke(&call.params)
                    .map_err(|e| handler_error(route, e))
            }
        }
    }
}
