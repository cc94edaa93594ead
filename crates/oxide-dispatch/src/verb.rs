//! HTTP verbs and verb selection for registration.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DispatchError, Result};

/// HTTP request verbs understood by the router.
///
/// The declaration order is the order in which reverse lookups scan the
/// route table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verb {
    /// CONNECT method
    Connect,
    /// DELETE method
    Delete,
    /// GET method
    Get,
    /// HEAD method
    Head,
    /// OPTIONS method
    Options,
    /// PATCH method
    Patch,
    /// POST method
    Post,
    /// PUT method
    Put,
    /// TRACE method
    Trace,
}

impl Verb {
    /// Every supported verb, in scan order.
    pub const ALL: [Self; 9] = [
        Self::Connect,
        Self::Delete,
        Self::Get,
        Self::Head,
        Self::Options,
        Self::Patch,
        Self::Post,
        Self::Put,
        Self::Trace,
    ];

    /// Parses a verb from its upper-case name.
    ///
    /// Matching is case-sensitive: `"get"` is not a verb.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CONNECT" => Some(Self::Connect),
            "DELETE" => Some(Self::Delete),
            "GET" => Some(Self::Get),
            "HEAD" => Some(Self::Head),
            "OPTIONS" => Some(Self::Options),
            "PATCH" => Some(Self::Patch),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "TRACE" => Some(Self::Trace),
            _ => None,
        }
    }

    /// Returns the verb as a string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Connect => "CONNECT",
            Self::Delete => "DELETE",
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Patch => "PATCH",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Trace => "TRACE",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which verbs a registration applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerbSelector {
    /// Every verb in the router's configured verb set (`"*"`).
    All,
    /// An explicit list of verbs.
    Only(Vec<Verb>),
}

impl VerbSelector {
    /// Parses `"*"` or a single verb name.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for unknown verb names.
    pub fn parse(s: &str) -> Result<Self> {
        if s.trim() == "*" {
            return Ok(Self::All);
        }
        Verb::parse(s.trim())
            .map(|verb| Self::Only(vec![verb]))
            .ok_or_else(|| DispatchError::Configuration(format!("unknown verb `{s}`")))
    }

    /// Expands the selector against the configured verb set.
    pub fn expand(&self, supported: &[Verb]) -> Vec<Verb> {
        match self {
            Self::All => supported.to_vec(),
            Self::Only(verbs) => verbs.clone(),
        }
    }
}

impl From<Verb> for VerbSelector {
    fn from(verb: Verb) -> Self {
        Self::Only(vec![verb])
    }
}

impl From<Vec<Verb>> for VerbSelector {
    fn from(verbs: Vec<Verb>) -> Self {
        Self::Only(verbs)
    }
}

impl<const N: usize> From<[Verb; N]> for VerbSelector {
    fn from(verbs: [Verb; N]) -> Self {
        Self::Only(verbs.to_vec())
    }
}

/// Resolves the verb a transport adapter should hand to the router.
///
/// GET requests stay GET. Any other transport verb is treated as POST unless
/// the request carries a method-override field (such as a hidden `_method`
/// form input), in which case that value is used verbatim.
pub fn effective_verb(transport: Option<&str>, override_field: Option<&str>) -> String {
    match transport {
        None | Some("GET") => "GET".to_string(),
        Some(_) => override_field.unwrap_or("POST").to_string(),
    }
}
