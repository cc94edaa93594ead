//! # oxide-dispatch
//!
//! Request routing and dispatch: maps an HTTP verb and path to a handler.
//!
//! This crate provides:
//! - Exact routes and wildcard pattern routes with typed segments
//! - Optional trailing segments and default parameter values
//! - Route groups that share attributes
//! - Before/after filters, per route and keyed by route pattern
//! - Named routes, reverse lookup by handler target, and URL generation
//! - `target@action` handlers resolved through a handler registry
//!
//! ## Quick Start
//!
//! ```
//! use oxide_dispatch::{Dispatch, Router, RouteSpec};
//! use serde_json::Value;
//!
//! let router = Router::new();
//! router
//!     .get("users/(:num)", RouteSpec::callback(|params: &[String]| {
//!         Ok(Some(Value::from(format!("user {}", params[0]))))
//!     }))
//!     .unwrap();
//!
//! let result = router.dispatch("GET", "/users/42").unwrap();
//! assert_eq!(result, Dispatch::Dispatched(Some(Value::from("user 42"))));
//! assert_eq!(router.dispatch("GET", "/users/abc").unwrap(), Dispatch::NotFound);
//! ```
//!
//! ## Wildcards
//!
//! | token | matches |
//! |---|---|
//! | `(:alpha)` | letters |
//! | `(:num)` | digits |
//! | `(:any)` | letters, digits and `.-_%=` |
//! | `(:all)` | anything, slashes included |
//!
//! Suffix a token with `?` to make the trailing segment optional:
//!
//! ```
//! use oxide_dispatch::{Router, RouteSpec};
//! use serde_json::Value;
//!
//! let router = Router::new();
//! router
//!     .get(
//!         "posts/(:any?)",
//!         RouteSpec::callback(|params: &[String]| Ok(Some(Value::from(params.join(",")))))
//!             .defaults(["latest"]),
//!     )
//!     .unwrap();
//!
//! let latest = router.dispatch("GET", "posts").unwrap();
//! assert_eq!(latest.payload(), Some(&Value::from("latest")));
//! let hello = router.dispatch("GET", "posts/hello").unwrap();
//! assert_eq!(hello.payload(), Some(&Value::from("hello")));
//! ```
//!
//! Wildcard routes are tried in registration order and the first match wins;
//! exact routes are always preferred.
//!
//! ## Groups and Filters
//!
//! ```
//! use oxide_dispatch::{FilterSet, Flow, Router, RouteSpec};
//!
//! let router = Router::new();
//! router
//!     .group(RouteSpec::new().attribute("area", "admin"), |r| {
//!         r.get("admin/users", "admin@users")?;
//!         Ok(())
//!     })
//!     .unwrap();
//! router
//!     .add_filter("admin/*", FilterSet::new().before(|_: &[String]| Ok(Flow::Halt)))
//!     .unwrap();
//! ```
//!
//! ## Named Routes
//!
//! ```
//! use oxide_dispatch::{Router, RouteSpec};
//!
//! let router = Router::new();
//! router.get("posts/(:num)", RouteSpec::target("posts@show").name("post")).unwrap();
//!
//! assert_eq!(router.url_for("post", &["7"]).unwrap(), "/posts/7");
//! assert_eq!(router.find_by_handler("posts@show").unwrap().pattern, "posts/(:num)");
//! ```

mod config;
mod error;
mod filter;
mod index;
mod invoke;
mod manifest;
pub mod pattern;
mod route;
mod router;
mod table;
mod verb;

pub use config::RouterConfig;
pub use error::{BoxError, DispatchError, Result};
pub use filter::{FilterChain, FilterRegistry, FilterSet};
pub use index::{ReverseIndex, RouteRef};
pub use invoke::{HandlerRegistry, HandlerResult, Invoke, TargetCall};
pub use manifest::{Manifest, OneOrMany, RouteEntry};
pub use pattern::{CompiledPattern, Wildcard};
pub use route::{DefaultValue, Filter, Flow, Handler, Route, RouteSpec, RouteSummary};
pub use router::{Dispatch, Patterns, Resolved, Router};
pub use table::RouteTable;
pub use verb::{effective_verb, Verb, VerbSelector};
