//! Pattern-keyed before/after filters.
//!
//! Filters are attached to route *patterns*, not request paths: a filter
//! registered for `admin/*` runs for every route whose registered pattern
//! starts with `admin/`.

use std::fmt;

use regex::Regex;

use crate::error::{BoxError, DispatchError, Result};
use crate::pattern;
use crate::route::{Filter, Flow};

/// Before and after callbacks to attach to a pattern.
#[derive(Clone, Default)]
pub struct FilterSet {
    /// Runs before the handler.
    pub before: Option<Filter>,
    /// Runs after the handler.
    pub after: Option<Filter>,
}

impl FilterSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the before callback.
    #[must_use]
    pub fn before<F>(mut self, f: F) -> Self
    where
        F: Fn(&[String]) -> std::result::Result<Flow, BoxError> + Send + Sync + 'static,
    {
        self.before = Some(std::sync::Arc::new(f));
        self
    }

    /// Sets the after callback.
    #[must_use]
    pub fn after<F>(mut self, f: F) -> Self
    where
        F: Fn(&[String]) -> std::result::Result<Flow, BoxError> + Send + Sync + 'static,
    {
        self.after = Some(std::sync::Arc::new(f));
        self
    }
}

/// The accumulated callbacks for one filter pattern.
#[derive(Clone, Default)]
pub struct FilterChain {
    /// Before callbacks in registration order.
    pub before: Vec<Filter>,
    /// After callbacks in registration order.
    pub after: Vec<Filter>,
}

impl fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterChain")
            .field("before", &self.before.len())
            .field("after", &self.after.len())
            .finish()
    }
}

#[derive(Debug, Clone)]
struct FilterEntry {
    pattern: String,
    regex: Regex,
    chain: FilterChain,
}

/// Translates a filter pattern into an anchored regex.
///
/// Literal text is escaped and each `*` becomes `(.*)`.
fn translate(pattern: &str) -> Result<Regex> {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("(.*)");

    Regex::new(&format!("^{body}$")).map_err(|source| DispatchError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Filters keyed by route-pattern predicates, in insertion order.
#[derive(Debug, Default, Clone)]
pub struct FilterRegistry {
    entries: Vec<FilterEntry>,
}

impl FilterRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds callbacks for a pattern.
    ///
    /// The pattern is normalized like a route pattern before translation.
    /// Adding to a pattern that already has filters appends to its chains.
    ///
    /// # Errors
    ///
    /// Fails if the translated pattern is not a valid regex.
    pub fn add(&mut self, pattern: &str, set: FilterSet) -> Result<()> {
        let pattern = pattern::normalize_pattern(pattern);
        let pos = match self.entries.iter().position(|e| e.pattern == pattern) {
            Some(pos) => pos,
            None => {
                self.entries.push(FilterEntry {
                    regex: translate(&pattern)?,
                    pattern,
                    chain: FilterChain::default(),
                });
                self.entries.len() - 1
            }
        };

        let chain = &mut self.entries[pos].chain;
        chain.before.extend(set.before);
        chain.after.extend(set.after);
        Ok(())
    }

    /// Returns the chain of the first pattern matching `route_pattern`.
    ///
    /// Chains of later matching patterns are not merged in.
    pub fn filters_for(&self, route_pattern: &str) -> Option<&FilterChain> {
        self.entries
            .iter()
            .find(|e| e.regex.is_match(route_pattern))
            .map(|e| &e.chain)
    }
}
