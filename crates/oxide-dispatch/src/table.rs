//! Per-verb route storage.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::route::Route;
use crate::verb::Verb;

/// Routes registered for a single verb.
#[derive(Debug, Default, Clone)]
struct VerbRoutes {
    /// Exact routes in registration order.
    exact: Vec<Arc<Route>>,
    /// Pattern → position in `exact`.
    exact_index: HashMap<String, usize>,
    /// Fallback routes in registration order.
    fallback: Vec<Arc<Route>>,
}

impl VerbRoutes {
    fn insert(&mut self, route: Arc<Route>) {
        if route.is_fallback() {
            // Re-registering a pattern replaces it but keeps its priority.
            match self
                .fallback
                .iter()
                .position(|r| r.pattern() == route.pattern())
            {
                Some(pos) => self.fallback[pos] = route,
                None => self.fallback.push(route),
            }
        } else if let Some(&pos) = self.exact_index.get(route.pattern()) {
            self.exact[pos] = route;
        } else {
            self.exact_index
                .insert(route.pattern().to_string(), self.exact.len());
            self.exact.push(route);
        }
    }
}

/// Registry of routes partitioned by verb into exact and fallback routes.
#[derive(Debug, Default, Clone)]
pub struct RouteTable {
    verbs: BTreeMap<Verb, VerbRoutes>,
}

impl RouteTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a route under its verb and pattern.
    pub fn insert(&mut self, route: Route) -> Arc<Route> {
        let route = Arc::new(route);
        self.verbs
            .entry(route.verb())
            .or_default()
            .insert(Arc::clone(&route));
        route
    }

    /// Looks up an exact route by normalized pattern.
    pub fn exact(&self, verb: Verb, pattern: &str) -> Option<&Arc<Route>> {
        let routes = self.verbs.get(&verb)?;
        routes
            .exact_index
            .get(pattern)
            .and_then(|&pos| routes.exact.get(pos))
    }

    /// Returns all routes of a verb: exact routes first, then fallbacks,
    /// each in registration order.
    pub fn routes_for_verb(&self, verb: Verb) -> impl Iterator<Item = &Arc<Route>> {
        self.verbs
            .get(&verb)
            .into_iter()
            .flat_map(|routes| routes.exact.iter().chain(routes.fallback.iter()))
    }

    /// Iterates every route, verb by verb in [`Verb::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Route>> {
        self.verbs
            .values()
            .flat_map(|routes| routes.exact.iter().chain(routes.fallback.iter()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::RouteSpec;

    fn route(verb: Verb, pattern: &str, target: &str) -> Route {
        Route::build(verb, pattern, RouteSpec::target(target)).unwrap()
    }

    #[test]
    fn test_exact_and_fallback_partitions() {
        let mut table = RouteTable::new();
        table.insert(route(Verb::Get, "about", "pages@about"));
        table.insert(route(Verb::Get, "(:any)", "pages@show"));

        assert!(table.exact(Verb::Get, "about").is_some());
        assert!(table.exact(Verb::Get, "(:any)").is_none());
        assert_eq!(table.verbs[&Verb::Get].fallback.len(), 1);
        assert!(table.exact(Verb::Post, "about").is_none());
        assert!(!table.verbs.contains_key(&Verb::Post));
    }

    #[test]
    fn test_routes_for_verb_orders_exact_before_fallback() {
        let mut table = RouteTable::new();
        table.insert(route(Verb::Get, "(:num)", "a@one"));
        table.insert(route(Verb::Get, "zeta", "a@two"));
        table.insert(route(Verb::Get, "(:any)", "a@three"));
        table.insert(route(Verb::Get, "alpha", "a@four"));

        let patterns: Vec<_> = table
            .routes_for_verb(Verb::Get)
            .map(|r| r.pattern())
            .collect();
        assert_eq!(patterns, vec!["zeta", "alpha", "(:num)", "(:any)"]);
    }

    #[test]
    fn test_reregistering_replaces_in_place() {
        let mut table = RouteTable::new();
        table.insert(route(Verb::Get, "(:num)", "a@first"));
        table.insert(route(Verb::Get, "(:any)", "a@second"));
        table.insert(route(Verb::Get, "(:num)", "a@replaced"));
        table.insert(route(Verb::Get, "home", "a@home"));
        table.insert(route(Verb::Get, "home", "a@home2"));

        let fallback = &table.verbs[&Verb::Get].fallback;
        assert_eq!(fallback.len(), 2);
        assert_eq!(fallback[0].handler_id(), Some("a@replaced"));
        assert_eq!(
            table.exact(Verb::Get, "home").unwrap().handler_id(),
            Some("a@home2")
        );
        assert_eq!(table.iter().count(), 3);
    }

    #[test]
    fn test_iter_scans_verbs_in_order() {
        let mut table = RouteTable::new();
        table.insert(route(Verb::Post, "save", "a@save"));
        table.insert(route(Verb::Get, "show", "a@show"));
        table.insert(route(Verb::Delete, "drop", "a@drop"));

        let verbs: Vec<_> = table.iter().map(|r| r.verb()).collect();
        assert_eq!(verbs, vec![Verb::Delete, Verb::Get, Verb::Post]);
        assert_eq!(RouteTable::new().iter().count(), 0);
    }
}
