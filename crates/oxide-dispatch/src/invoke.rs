//! Handler invocation and named-target resolution.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use crate::error::{BoxError, DispatchError, Result};
use crate::verb::Verb;

/// Outcome of a handler: an optional response payload.
pub type HandlerResult = std::result::Result<Option<Value>, BoxError>;

/// Anything that can be invoked with positional parameters.
pub trait Invoke: Send + Sync {
    /// Runs the handler.
    fn invoke(&self, params: &[String]) -> HandlerResult;
}

impl<F> Invoke for F
where
    F: Fn(&[String]) -> HandlerResult + Send + Sync,
{
    fn invoke(&self, params: &[String]) -> HandlerResult {
        self(params)
    }
}

/// A `target@action` string split against the dispatch parameters.
///
/// The handler string is split on `@` and the request parameters are
/// appended; the first piece is the target, the second the action, the
/// rest are the parameters. A target without `@` therefore takes its
/// action from the first parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetCall {
    /// Target name, dashes folded to underscores.
    pub target: String,
    /// Action name, dashes folded to underscores. Empty if none was given.
    pub action: String,
    /// Remaining parameters for the action.
    pub params: Vec<String>,
}

impl TargetCall {
    /// Splits `handler` and appends `params`.
    pub fn parse(handler: &str, params: &[String]) -> Self {
        let mut parts = handler
            .split('@')
            .map(str::to_string)
            .chain(params.iter().cloned());

        let target = parts.next().unwrap_or_default().replace('-', "_");
        let action = parts.next().unwrap_or_default().replace('-', "_");

        Self {
            target,
            action,
            params: parts.collect(),
        }
    }
}

/// Registry of handlers addressed by `target@action`.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    actions: HashMap<String, Arc<dyn Invoke>>,
    restful: HashSet<String>,
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.actions.keys().collect();
        keys.sort();
        f.debug_struct("HandlerRegistry")
            .field("actions", &keys)
            .field("restful", &self.restful)
            .finish()
    }
}

fn key(target: &str, action: &str) -> String {
    format!("{target}@{action}")
}

impl HandlerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the handler for `target@action`.
    pub fn register(&mut self, target: &str, action: &str, handler: impl Invoke + 'static) {
        self.actions.insert(key(target, action), Arc::new(handler));
    }

    /// Marks a target as restful: its actions are looked up as
    /// `<verb>_<action>`, with the verb lower-cased.
    pub fn mark_restful(&mut self, target: &str) {
        self.restful.insert(target.to_string());
    }

    /// Picks the handler for a call.
    ///
    /// When the action is unknown, the `fallback_action` of the same target
    /// is used instead.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnresolvedTarget`] if neither is registered.
    pub fn resolve(
        &self,
        verb: Verb,
        call: &TargetCall,
        fallback_action: &str,
    ) -> Result<Arc<dyn Invoke>> {
        let action = if self.restful.contains(&call.target) {
            format!("{}_{}", verb.as_str().to_lowercase(), call.action)
        } else {
            call.action.clone()
        };

        if let Some(handler) = self.actions.get(&key(&call.target, &action)) {
            return Ok(Arc::clone(handler));
        }

        warn!(
            target_name = %call.target,
            action = %action,
            fallback = fallback_action,
            "unknown action, using fallback"
        );

        self.actions
            .get(&key(&call.target, fallback_action))
            .map(Arc::clone)
            .ok_or_else(|| DispatchError::UnresolvedTarget(key(&call.target, &action)))
    }
}
