//! Error and outcome types.
//!
//! - [`NavigationResult`]: the outcome of every navigation request
//!   (`Success`, `NotFound`, `Blocked`, `Superseded`, `Cancelled`, `Error`).
//! - [`NavigationError`]: detailed failure variants carried by
//!   [`NavigationResult::Error`] and by after-hook warnings.
//! - [`DialogError`]: why a dialog future resolved without a value.
//! - [`ConfigError`]: problems found while assembling routes or configuration.
//!
//! # Examples
//!
//! ```
//! use villa_navigator::NavigationResult;
//!
//! let result = NavigationResult::NotFound { key: "reports".into() };
//! assert!(result.is_not_found());
//! assert!(!result.is_success());
//! ```

use std::fmt;

/// Error type returned by navigation hooks.
pub type HookError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error type returned by dialog renderers.
pub type RenderError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Outcome of a navigation attempt through the hook pipeline.
#[derive(Debug, Clone)]
pub enum NavigationResult {
    /// The route was committed.
    Success {
        /// Key of the committed route (after any redirects).
        key: String,
        /// Application-relative path of the committed route.
        path: String,
        /// Failures reported by after-navigate hooks. The commit stands.
        warnings: Vec<NavigationError>,
    },
    /// No route is registered under the requested key or path.
    NotFound { key: String },
    /// A before-navigate hook vetoed the transition.
    Blocked { reason: String },
    /// A newer navigation request replaced this one before it committed.
    Superseded { key: String },
    /// The pending navigation was cancelled through [`Navigator::cancel_pending`](crate::Navigator::cancel_pending).
    Cancelled { key: String },
    /// The pipeline failed.
    Error(NavigationError),
}

impl NavigationResult {
    /// The route was committed.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// No route matched the key or path.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// A before hook denied the navigation.
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked { .. })
    }

    /// A newer request replaced this one.
    pub fn is_superseded(&self) -> bool {
        matches!(self, Self::Superseded { .. })
    }

    /// Aborted through `cancel_pending`.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// The pipeline failed.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Key of the committed route, if the navigation succeeded.
    pub fn committed_key(&self) -> Option<&str> {
        match self {
            NavigationResult::Success { key, .. } => Some(key),
            _ => None,
        }
    }

    /// After-hook warnings of a successful navigation (empty otherwise).
    pub fn warnings(&self) -> &[NavigationError] {
        match self {
            NavigationResult::Success { warnings, .. } => warnings,
            _ => &[],
        }
    }

    /// The error, if the pipeline failed.
    pub fn error(&self) -> Option<&NavigationError> {
        match self {
            NavigationResult::Error(err) => Some(err),
            _ => None,
        }
    }
}

/// Why a navigation failed, or what an after hook reported.
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationError {
    /// No route registered under this key or path
    RouteNotFound { key: String },

    /// A before or after hook returned an error
    HookFailed { hook: String, message: String },

    /// Params do not fill the route's path pattern
    InvalidParams { message: String },

    /// Another navigation is resolving and the policy rejects overlap
    Busy { pending: String },

    /// The before-hook chain exceeded the configured deadline
    TimedOut { key: String, after_ms: u128 },

    /// Redirects nested deeper than the configured limit
    RedirectLoop { depth: usize, key: String },
}

impl fmt::Display for NavigationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigationError::RouteNotFound { key } => {
                write!(f, "Route not found: {}", key)
            }
            NavigationError::HookFailed { hook, message } => {
                write!(f, "Hook '{}' failed: {}", hook, message)
            }
            NavigationError::InvalidParams { message } => {
                write!(f, "Invalid parameters: {}", message)
            }
            NavigationError::Busy { pending } => {
                write!(f, "Navigation to '{}' is still resolving", pending)
            }
            NavigationError::TimedOut { key, after_ms } => {
                write!(f, "Navigation to '{}' timed out after {}ms", key, after_ms)
            }
            NavigationError::RedirectLoop { depth, key } => {
                write!(f, "Redirect loop detected (depth {}): target '{}'", depth, key)
            }
        }
    }
}

impl std::error::Error for NavigationError {}

// ============================================================================
// Dialog errors
// ============================================================================

/// Reasons a dialog future resolves without a value.
#[derive(Debug, Clone, PartialEq)]
pub enum DialogError {
    /// The renderer returned an error while building the overlay
    Render { message: String },

    /// The renderer panicked while building the overlay
    RendererPanicked { message: String },

    /// The overlay was removed without a result
    Dismissed,

    /// No result arrived before the deadline
    TimedOut { after_ms: u128 },
}

impl fmt::Display for DialogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DialogError::Render { message } => write!(f, "Dialog failed to render: {}", message),
            DialogError::RendererPanicked { message } => {
                write!(f, "Dialog renderer panicked: {}", message)
            }
            DialogError::Dismissed => write!(f, "Dialog dismissed without a result"),
            DialogError::TimedOut { after_ms } => {
                write!(f, "Dialog got no result within {}ms", after_ms)
            }
        }
    }
}

impl std::error::Error for DialogError {}

// ============================================================================
// Configuration errors
// ============================================================================

/// Problems found while building the route table or reading configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The process-wide base path was already initialised with another value
    BasePathAlreadySet { current: String, requested: String },

    /// Two descriptors share a key
    DuplicateRoute { key: String },

    /// A path pattern could not be registered
    InvalidPattern { pattern: String, message: String },

    /// An environment variable held an unusable value
    InvalidEnv { var: String, value: String },

    /// The initial route key is not registered
    UnknownInitialRoute { key: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::BasePathAlreadySet { current, requested } => write!(
                f,
                "Base path already set to '{}', cannot change it to '{}'",
                current, requested
            ),
            ConfigError::DuplicateRoute { key } => write!(f, "Duplicate route key: {}", key),
            ConfigError::InvalidPattern { pattern, message } => {
                write!(f, "Invalid path pattern '{}': {}", pattern, message)
            }
            ConfigError::InvalidEnv { var, value } => {
                write!(f, "Invalid value '{}' for {}", value, var)
            }
            ConfigError::UnknownInitialRoute { key } => {
                write!(f, "Initial route '{}' is not registered", key)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Tests
// ============================================================================
