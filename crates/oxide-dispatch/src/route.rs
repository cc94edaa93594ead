//! Route definitions.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::error::{BoxError, DispatchError, Result};
use crate::invoke::Invoke;
use crate::pattern::{self, CompiledPattern};
use crate::verb::Verb;

/// Whether a before filter lets the request through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Continue to the next filter or the handler.
    Continue,
    /// Stop the pipeline; the handler and after filters do not run.
    Halt,
}

/// A before or after callback.
///
/// Filters receive the final parameter sequence. The [`Flow`] returned by an
/// after filter is ignored.
pub type Filter = Arc<dyn Fn(&[String]) -> std::result::Result<Flow, BoxError> + Send + Sync>;

/// What a route runs when it is dispatched.
#[derive(Clone)]
pub enum Handler {
    /// A callback invoked with the positional parameters.
    Callback(Arc<dyn Invoke>),
    /// A `target@action` string resolved through the
    /// [`HandlerRegistry`](crate::HandlerRegistry).
    Target(String),
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Callback(_) => f.write_str("Callback(..)"),
            Self::Target(target) => f.debug_tuple("Target").field(target).finish(),
        }
    }
}

/// A default parameter value, optionally labelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefaultValue {
    /// Parameter label, informational only.
    pub name: Option<String>,
    /// The value appended when the position was not captured.
    pub value: String,
}

impl From<&str> for DefaultValue {
    fn from(value: &str) -> Self {
        Self {
            name: None,
            value: value.to_string(),
        }
    }
}

impl From<String> for DefaultValue {
    fn from(value: String) -> Self {
        Self { name: None, value }
    }
}

impl<N: Into<String>, V: Into<String>> From<(N, V)> for DefaultValue {
    fn from((name, value): (N, V)) -> Self {
        Self {
            name: Some(name.into()),
            value: value.into(),
        }
    }
}

/// Attributes for a route about to be registered.
///
/// Every field is optional here; registration rejects a spec that ends up
/// without a handler. The same type describes group attributes.
#[derive(Clone, Default)]
pub struct RouteSpec {
    /// Handler to run.
    pub handler: Option<Handler>,
    /// Route name; several aliases may be joined by the alias separator.
    pub name: Option<String>,
    /// Default parameter values.
    pub defaults: Option<Vec<DefaultValue>>,
    /// Route-local before filter.
    pub before: Option<Filter>,
    /// Route-local after filter.
    pub after: Option<Filter>,
    /// Free-form attributes.
    pub attributes: BTreeMap<String, Value>,
}

impl fmt::Debug for RouteSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteSpec")
            .field("handler", &self.handler)
            .field("name", &self.name)
            .field("defaults", &self.defaults)
            .field("before", &self.before.is_some())
            .field("after", &self.after.is_some())
            .field("attributes", &self.attributes)
            .finish()
    }
}

impl RouteSpec {
    /// Creates an empty spec.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a spec that runs a callback.
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&[String]) -> crate::invoke::HandlerResult + Send + Sync + 'static,
    {
        Self {
            handler: Some(Handler::Callback(Arc::new(f))),
            ..Self::default()
        }
    }

    /// Creates a spec that dispatches to a `target@action` string.
    pub fn target(target: impl Into<String>) -> Self {
        Self {
            handler: Some(Handler::Target(target.into())),
            ..Self::default()
        }
    }

    /// Sets the route name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the default parameter values.
    #[must_use]
    pub fn defaults<I, D>(mut self, defaults: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<DefaultValue>,
    {
        self.defaults = Some(defaults.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the route-local before filter.
    #[must_use]
    pub fn before<F>(mut self, f: F) -> Self
    where
        F: Fn(&[String]) -> std::result::Result<Flow, BoxError> + Send + Sync + 'static,
    {
        self.before = Some(Arc::new(f));
        self
    }

    /// Sets the route-local after filter.
    #[must_use]
    pub fn after<F>(mut self, f: F) -> Self
    where
        F: Fn(&[String]) -> std::result::Result<Flow, BoxError> + Send + Sync + 'static,
    {
        self.after = Some(Arc::new(f));
        self
    }

    /// Sets a free-form attribute.
    #[must_use]
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Fills every attribute this spec lacks from `group`.
    ///
    /// Values already present on this route spec are kept.
    #[must_use]
    pub fn merge_missing(mut self, group: &Self) -> Self {
        if self.handler.is_none() {
            self.handler.clone_from(&group.handler);
        }
        if self.name.is_none() {
            self.name.clone_from(&group.name);
        }
        if self.defaults.is_none() {
            self.defaults.clone_from(&group.defaults);
        }
        if self.before.is_none() {
            self.before.clone_from(&group.before);
        }
        if self.after.is_none() {
            self.after.clone_from(&group.after);
        }
        for (key, value) in &group.attributes {
            self.attributes
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
        self
    }
}

impl From<&str> for RouteSpec {
    /// A bare string is both the handler target and the route name.
    fn from(target: &str) -> Self {
        Self::target(target).name(target)
    }
}

/// A registered route for one verb and one normalized pattern.
#[derive(Clone)]
pub struct Route {
    verb: Verb,
    pattern: String,
    fallback: bool,
    matcher: Option<CompiledPattern>,
    handler: Handler,
    name: Option<String>,
    defaults: Vec<DefaultValue>,
    before: Option<Filter>,
    after: Option<Filter>,
    attributes: BTreeMap<String, Value>,
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("verb", &self.verb)
            .field("pattern", &self.pattern)
            .field("fallback", &self.fallback)
            .field("handler", &self.handler)
            .field("name", &self.name)
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

impl Route {
    /// Builds a route from a normalized pattern and a merged spec.
    ///
    /// # Errors
    ///
    /// Fails when the route spec has no handler or the pattern does not compile.
    pub fn build(verb: Verb, pattern: &str, spec: RouteSpec) -> Result<Self> {
        let handler = spec.handler.ok_or_else(|| {
            DispatchError::Configuration(format!("route `{pattern}` has no handler"))
        })?;

        let matcher = if pattern::has_wildcards(pattern) {
            Some(CompiledPattern::compile(pattern)?)
        } else {
            None
        };

        Ok(Self {
            verb,
            pattern: pattern.to_string(),
            fallback: pattern::is_pattern(pattern),
            matcher,
            handler,
            name: spec.name,
            defaults: spec.defaults.unwrap_or_default(),
            before: spec.before,
            after: spec.after,
            attributes: spec.attributes,
        })
    }

    /// Returns the verb this route answers.
    pub const fn verb(&self) -> Verb {
        self.verb
    }

    /// Returns the normalized pattern.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns true if the pattern starts with a wildcard group.
    pub const fn is_fallback(&self) -> bool {
        self.fallback
    }

    /// Returns the compiled matcher for patterns containing wildcards.
    pub const fn matcher(&self) -> Option<&CompiledPattern> {
        self.matcher.as_ref()
    }

    /// Returns the handler.
    pub const fn handler(&self) -> &Handler {
        &self.handler
    }

    /// Returns the handler identity used for reverse lookup.
    pub fn handler_id(&self) -> Option<&str> {
        match &self.handler {
            Handler::Target(target) => Some(target),
            Handler::Callback(_) => None,
        }
    }

    /// Returns the raw name field.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns true if `name` is the whole name field or one of its aliases.
    pub fn answers_to(&self, name: &str, alias_separator: &str) -> bool {
        self.name.as_deref().is_some_and(|field| {
            field == name || field.split(alias_separator).any(|alias| alias.trim() == name)
        })
    }

    /// Returns the default parameter values.
    pub fn defaults(&self) -> &[DefaultValue] {
        &self.defaults
    }

    /// Returns a free-form attribute.
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Returns all free-form attributes.
    pub const fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    /// Returns the route-local before filter.
    pub const fn before(&self) -> Option<&Filter> {
        self.before.as_ref()
    }

    /// Returns the route-local after filter.
    pub const fn after(&self) -> Option<&Filter> {
        self.after.as_ref()
    }

    /// Appends the defaults the captured parameters do not cover.
    ///
    /// Only the missing tail is taken from the defaults; captured values
    /// always win for the positions they fill.
    pub fn with_defaults(&self, mut params: Vec<String>) -> Vec<String> {
        if self.defaults.len() > params.len() {
            params.extend(
                self.defaults[params.len()..]
                    .iter()
                    .map(|d| d.value.clone()),
            );
        }
        params
    }

    /// Returns a serializable view of this route.
    pub fn summary(&self) -> RouteSummary {
        RouteSummary {
            verb: self.verb,
            pattern: self.pattern.clone(),
            fallback: self.fallback,
            name: self.name.clone(),
            uses: self.handler_id().map(str::to_string),
            defaults: self.defaults.iter().map(|d| d.value.clone()).collect(),
            attributes: self.attributes.clone(),
        }
    }
}

/// Serializable description of a route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteSummary {
    /// Verb the route answers.
    pub verb: Verb,
    /// Normalized pattern.
    pub pattern: String,
    /// Whether the pattern starts with a wildcard.
    pub fallback: bool,
    /// Raw name field.
    pub name: Option<String>,
    /// Handler target, when the route dispatches to one.
    pub uses: Option<String>,
    /// Default parameter values.
    pub defaults: Vec<String>,
    /// Free-form attributes.
    pub attributes: BTreeMap<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(_: &[String]) -> crate::invoke::HandlerResult {
        Ok(None)
    }

    #[test]
    fn test_build_requires_handler() {
        let err = Route::build(Verb::Get, "about", RouteSpec::new().name("about")).unwrap_err();
        assert!(matches!(err, DispatchError::Configuration(_)));
    }

    #[test]
    fn test_fallback_classification() {
        let exact = Route::build(Verb::Get, "users/(:num)", RouteSpec::callback(ok)).unwrap();
        assert!(!exact.is_fallback());
        assert!(exact.matcher().is_some());

        let fallback = Route::build(Verb::Get, "(:any)", RouteSpec::callback(ok)).unwrap();
        assert!(fallback.is_fallback());

        let plain = Route::build(Verb::Get, "about", RouteSpec::callback(ok)).unwrap();
        assert!(plain.matcher().is_none());
    }

    #[test]
    fn test_with_defaults_fills_missing_tail() {
        let route = Route::build(
            Verb::Get,
            "posts/(:any?)/(:num?)",
            RouteSpec::callback(ok).defaults(["latest", "1"]),
        )
        .unwrap();

        assert_eq!(route.with_defaults(vec![]), vec!["latest", "1"]);
        assert_eq!(route.with_defaults(vec!["intro".into()]), vec!["intro", "1"]);
        assert_eq!(
            route.with_defaults(vec!["intro".into(), "3".into()]),
            vec!["intro", "3"]
        );
    }

    #[test]
    fn test_answers_to_aliases() {
        let route = Route::build(
            Verb::Post,
            "cart",
            RouteSpec::callback(ok).name("checkout | cart"),
        )
        .unwrap();

        assert!(route.answers_to("checkout", "|"));
        assert!(route.answers_to("cart", "|"));
        assert!(route.answers_to("checkout | cart", "|"));
        assert!(!route.answers_to("basket", "|"));
    }

    #[test]
    fn test_merge_missing_keeps_own_values() {
        let group = RouteSpec::new()
            .name("group")
            .attribute("prefix", "admin")
            .attribute("auth", true);
        let spec = RouteSpec::target("admin@index")
            .attribute("auth", false)
            .merge_missing(&group);

        assert_eq!(spec.name.as_deref(), Some("group"));
        assert_eq!(spec.attributes["prefix"], Value::from("admin"));
        assert_eq!(spec.attributes["auth"], Value::from(false));
        assert!(matches!(spec.handler, Some(Handler::Target(ref t)) if t == "admin@index"));
    }

    #[test]
    fn test_string_shorthand() {
        let spec = RouteSpec::from("users@show");
        assert_eq!(spec.name.as_deref(), Some("users@show"));
        assert!(matches!(spec.handler, Some(Handler::Target(ref t)) if t == "users@show"));
    }
}
