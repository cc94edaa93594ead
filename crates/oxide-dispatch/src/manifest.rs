//! JSON route manifests.
//!
//! A manifest declares router settings and target-backed routes:
//!
//! ```json
//! {
//!   "config": { "alias_separator": "|" },
//!   "routes": [
//!     { "verbs": "GET", "pattern": "users/(:num)", "uses": "users@show", "name": "user" },
//!     { "verbs": ["GET", "POST"], "pattern": "login, signin", "uses": "auth@login" }
//!   ],
//!   "controllers": ["admin.users"]
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::RouterConfig;
use crate::error::{DispatchError, Result};
use crate::route::RouteSpec;
use crate::router::{Patterns, Router};
use crate::verb::{Verb, VerbSelector};

/// A single string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    /// A single string.
    One(String),
    /// A list of strings.
    Many(Vec<String>),
}

impl Default for OneOrMany {
    fn default() -> Self {
        Self::One("*".to_string())
    }
}

impl OneOrMany {
    fn verbs(&self) -> Result<VerbSelector> {
        match self {
            Self::One(verb) => VerbSelector::parse(verb),
            Self::Many(verbs) if verbs.iter().any(|v| v.trim() == "*") => Ok(VerbSelector::All),
            Self::Many(verbs) => verbs
                .iter()
                .map(|v| {
                    Verb::parse(v.trim()).ok_or_else(|| {
                        DispatchError::Configuration(format!("unknown verb `{v}`"))
                    })
                })
                .collect::<Result<Vec<_>>>()
                .map(VerbSelector::Only),
        }
    }

    fn patterns(&self) -> Patterns {
        match self {
            Self::One(pattern) => Patterns::One(pattern.clone()),
            Self::Many(patterns) => Patterns::Many(patterns.clone()),
        }
    }
}

/// A route declared in a manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteEntry {
    /// Verb, `"*"`, or list of verbs. Defaults to `"*"`.
    #[serde(default)]
    pub verbs: OneOrMany,
    /// Pattern or list of patterns.
    pub pattern: OneOrMany,
    /// Handler target (`target@action`).
    pub uses: Option<String>,
    /// Route name, aliases joined by the alias separator.
    pub name: Option<String>,
    /// Default parameter values.
    #[serde(default)]
    pub defaults: Vec<String>,
    /// Free-form attributes.
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

impl RouteEntry {
    fn spec(&self) -> RouteSpec {
        let mut spec = self.uses.clone().map_or_else(RouteSpec::new, RouteSpec::target);
        spec.name.clone_from(&self.name);
        if !self.defaults.is_empty() {
            spec = spec.defaults(self.defaults.clone());
        }
        spec.attributes.clone_from(&self.attributes);
        spec
    }
}

/// Router settings plus route declarations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Router configuration.
    #[serde(default)]
    pub config: RouterConfig,
    /// Declared routes, registered in order.
    #[serde(default)]
    pub routes: Vec<RouteEntry>,
    /// Targets registered through the controller shortcut.
    #[serde(default)]
    pub controllers: Vec<String>,
}

impl Manifest {
    /// Parses a manifest document.
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a manifest file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Builds a router holding every declared route.
    ///
    /// # Errors
    ///
    /// Fails on invalid configuration, unknown verbs, routes without `uses`,
    /// or patterns that do not compile.
    pub fn build(&self) -> Result<Router> {
        let router = Router::with_config(self.config.clone())?;
        for entry in &self.routes {
            router.register(entry.verbs.verbs()?, entry.pattern.patterns(), entry.spec())?;
        }
        router.controller(&self.controllers)?;
        Ok(router)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"{
        "config": { "fallback_action": "index" },
        "routes": [
            { "verbs": "GET", "pattern": "users/(:num)", "uses": "users@show", "name": "user" },
            { "verbs": ["GET", "POST"], "pattern": "login, signin", "uses": "auth@login" },
            { "pattern": ["ping"], "uses": "health@ping", "defaults": ["fast"] }
        ],
        "controllers": ["admin.users"]
    }"#;

    #[test]
    fn test_build_from_manifest() {
        let manifest = Manifest::from_json(MANIFEST).unwrap();
        assert_eq!(manifest.config.fallback_action, "index");

        let router = manifest.build().unwrap();
        let user = router.resolve("GET", "users/5").unwrap();
        assert_eq!(user.route.handler_id(), Some("users@show"));
        assert_eq!(user.params, vec!["5"]);

        assert!(router.resolve("POST", "signin").is_some());
        assert!(router.resolve("PUT", "login").is_none());
        assert_eq!(router.resolve("TRACE", "ping").unwrap().params, vec!["fast"]);

        let admin = router.resolve("DELETE", "admin/users/drop").unwrap();
        assert_eq!(admin.params, vec!["drop"]);
        assert_eq!(router.url_for("user", &["5"]).unwrap(), "/users/5");
    }

    #[test]
    fn test_missing_uses_is_configuration_error() {
        let manifest =
            Manifest::from_json(r#"{ "routes": [ { "pattern": "nowhere" } ] }"#).unwrap();
        assert!(matches!(
            manifest.build(),
            Err(DispatchError::Configuration(_))
        ));
    }

    #[test]
    fn test_unknown_verb_is_configuration_error() {
        let manifest = Manifest::from_json(
            r#"{ "routes": [ { "verbs": ["GET", "FETCH"], "pattern": "x", "uses": "a@b" } ] }"#,
        )
        .unwrap();
        assert!(matches!(
            manifest.build(),
            Err(DispatchError::Configuration(_))
        ));
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("routes.json");
        std::fs::write(&path, MANIFEST).unwrap();

        let manifest = Manifest::from_path(&path).unwrap();
        assert_eq!(manifest.routes.len(), 3);
        assert!(matches!(
            Manifest::from_path(dir.path().join("missing.json")),
            Err(DispatchError::Io(_))
        ));
    }
}
