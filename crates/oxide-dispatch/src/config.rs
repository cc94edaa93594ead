//! Router configuration.

use serde::{Deserialize, Serialize};

use crate::error::{DispatchError, Result};
use crate::verb::Verb;

/// Settings that shape registration and dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Separator for pattern lists such as `"home, index"`.
    pub separator: String,
    /// Separator for route-name aliases such as `"checkout|cart"`.
    pub alias_separator: String,
    /// Verbs that `"*"` expands to.
    pub verbs: Vec<Verb>,
    /// Action used when a named target's action is not registered.
    pub fallback_action: String,
    /// Optional segments appended by [`Router::controller`](crate::Router::controller).
    pub controller_segments: usize,
    /// Clear the name and handler caches whenever a route is registered.
    pub invalidate_on_register: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            separator: ",".to_string(),
            alias_separator: "|".to_string(),
            verbs: Verb::ALL.to_vec(),
            fallback_action: "home".to_string(),
            controller_segments: 5,
            invalidate_on_register: false,
        }
    }
}

impl RouterConfig {
    /// Parses a JSON config document; missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON or when [`validate`](Self::validate) does.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the pattern list separator.
    #[must_use]
    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Sets the alias separator.
    #[must_use]
    pub fn alias_separator(mut self, separator: impl Into<String>) -> Self {
        self.alias_separator = separator.into();
        self
    }

    /// Sets the fallback action.
    #[must_use]
    pub fn fallback_action(mut self, action: impl Into<String>) -> Self {
        self.fallback_action = action.into();
        self
    }

    /// Enables cache invalidation on registration.
    #[must_use]
    pub const fn invalidate_on_register(mut self, enabled: bool) -> Self {
        self.invalidate_on_register = enabled;
        self
    }

    /// Checks the settings for values the router cannot work with.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for empty separators, an empty verb set
    /// or an empty fallback action.
    pub fn validate(&self) -> Result<()> {
        if self.separator.is_empty() {
            return Err(DispatchError::Configuration(
                "separator must not be empty".to_string(),
            ));
        }
        if self.alias_separator.is_empty() {
            return Err(DispatchError::Configuration(
                "alias separator must not be empty".to_string(),
            ));
        }
        if self.verbs.is_empty() {
            return Err(DispatchError::Configuration(
                "at least one verb must be supported".to_string(),
            ));
        }
        if self.fallback_action.is_empty() {
            return Err(DispatchError::Configuration(
                "fallback action must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
