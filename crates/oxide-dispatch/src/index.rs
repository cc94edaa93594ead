//! Lazily built name and handler-identity lookups.
//!
//! Both indexes are filled on demand by scanning the route table and are
//! never refreshed on their own: a route registered after a name has been
//! looked up is invisible to that name until [`ReverseIndex::invalidate`]
//! runs (the router calls it on every registration when
//! `invalidate_on_register` is set).

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::trace;

use crate::route::Route;
use crate::table::RouteTable;

/// A route found by reverse lookup.
#[derive(Debug, Clone)]
pub struct RouteRef {
    /// Normalized pattern the route is registered under.
    pub pattern: String,
    /// The route itself.
    pub route: Arc<Route>,
}

impl RouteRef {
    fn of(route: &Arc<Route>) -> Self {
        Self {
            pattern: route.pattern().to_string(),
            route: Arc::clone(route),
        }
    }
}

/// Caches of routes by name and by handler identity.
#[derive(Debug, Default)]
pub struct ReverseIndex {
    names: RwLock<HashMap<String, RouteRef>>,
    uses: RwLock<HashMap<String, RouteRef>>,
}

fn cached(cache: &RwLock<HashMap<String, RouteRef>>, key: &str) -> Option<RouteRef> {
    cache
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(key)
        .cloned()
}

fn remember(cache: &RwLock<HashMap<String, RouteRef>>, key: &str, found: &RouteRef) {
    cache
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(key.to_string(), found.clone());
}

impl ReverseIndex {
    /// Creates empty caches.
    pub fn new() -> Self {
        Self::default()
    }

    /// Finds the first route whose name field is `name` or lists it as an
    /// alias.
    ///
    /// Verbs are scanned in [`Verb::ALL`](crate::Verb::ALL) order, so a name
    /// reused across verbs resolves to the earliest verb.
    pub fn find_by_name(
        &self,
        table: &RouteTable,
        name: &str,
        alias_separator: &str,
    ) -> Option<RouteRef> {
        if let Some(hit) = cached(&self.names, name) {
            return Some(hit);
        }

        trace!(name, "scanning routes by name");
        let found = table
            .iter()
            .find(|route| route.answers_to(name, alias_separator))
            .map(RouteRef::of)?;
        remember(&self.names, name, &found);
        Some(found)
    }

    /// Finds the first route whose handler target equals `handler_id`.
    pub fn find_by_handler(&self, table: &RouteTable, handler_id: &str) -> Option<RouteRef> {
        if let Some(hit) = cached(&self.uses, handler_id) {
            return Some(hit);
        }

        trace!(handler_id, "scanning routes by handler");
        let found = table
            .iter()
            .find(|route| route.handler_id() == Some(handler_id))
            .map(RouteRef::of)?;
        remember(&self.uses, handler_id, &found);
        Some(found)
    }

    /// Drops every cached entry.
    pub fn invalidate(&self) {
        self.names
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.uses
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Returns the number of cached name and handler entries.
    pub fn cached_len(&self) -> (usize, usize) {
        let names = self.names.read().unwrap_or_else(PoisonError::into_inner).len();
        let uses = self.uses.read().unwrap_or_else(PoisonError::into_inner).len();
        (names, uses)
    }
}
