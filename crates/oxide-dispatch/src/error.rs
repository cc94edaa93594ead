//! Error types for route registration and dispatch.

use thiserror::Error;

/// Boxed error returned by handlers and filters.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Dispatch-specific errors.
///
/// A request that matches no route is not an error; see
/// [`Dispatch::NotFound`](crate::Dispatch::NotFound).
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A route, group or config was set up incorrectly.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A route or filter pattern did not translate into a valid regex.
    #[error("invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A handler or filter failed while serving `pattern`.
    #[error("handler for `{pattern}` failed: {source}")]
    Handler {
        pattern: String,
        #[source]
        source: BoxError,
    },

    /// Neither the requested action nor the fallback action is registered.
    #[error("no handler registered for target `{0}`")]
    UnresolvedTarget(String),

    /// No route carries the requested name.
    #[error("route not found: {0}")]
    RouteNotFound(String),

    /// URL generation ran out of parameters for a mandatory wildcard.
    #[error("missing parameter {index} for wildcard `{token}`")]
    MissingParameter { index: usize, token: String },

    /// Reading a manifest or config file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A manifest or config document is not valid JSON.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DispatchError {
    /// Returns true for failures raised while running a handler or filter.
    pub const fn is_handler_error(&self) -> bool {
        matches!(self, Self::Handler { .. } | Self::UnresolvedTarget(_))
    }
}

/// Result type alias for dispatch operations.
pub type Result<T> = std::result::Result<T, DispatchError>;
