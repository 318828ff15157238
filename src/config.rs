//! Navigator configuration.
//!
//! ```
//! use std::time::Duration;
//! use villa_navigator::{ConcurrencyPolicy, NavigatorConfig};
//!
//! let config = NavigatorConfig::new()
//!     .base_path("/app")
//!     .hook_timeout(Duration::from_secs(10))
//!     .concurrency(ConcurrencyPolicy::Reject)
//!     .initial_route("dashboard");
//!
//! assert_eq!(config.base_path.as_str(), "/app");
//! ```

use crate::error::ConfigError;
use crate::path::{initialised_base_path, BasePath, BASE_PATH_ENV};
use std::time::Duration;

/// Environment variable holding the before-hook deadline in milliseconds.
pub const HOOK_TIMEOUT_ENV: &str = "APP_NAV_TIMEOUT_MS";

/// What happens when a navigation is requested while another one is resolving.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConcurrencyPolicy {
    /// Abort the pending navigation (it resolves as `Superseded`) and start
    /// the new one.
    #[default]
    Supersede,
    /// Refuse the new request with `NavigationError::Busy`.
    Reject,
}

/// Settings for a [`Navigator`](crate::Navigator).
#[derive(Debug, Clone)]
pub struct NavigatorConfig {
    /// Prefix prepended to every address
    pub base_path: BasePath,
    /// Deadline for the whole before-hook chain. `None` waits indefinitely.
    pub hook_timeout: Option<Duration>,
    /// Overlapping request policy
    pub concurrency: ConcurrencyPolicy,
    /// Redirects followed before the request fails with `RedirectLoop`
    pub max_redirects: usize,
    /// Entries kept by the path resolution cache
    pub cache_capacity: usize,
    /// Route committed by [`Navigator::start`](crate::Navigator::start)
    pub initial_route: Option<String>,
}

impl NavigatorConfig {
    /// Default redirect limit.
    pub const DEFAULT_MAX_REDIRECTS: usize = 5;

    /// Default resolution cache size.
    pub const DEFAULT_CACHE_CAPACITY: usize = 256;

    /// Defaults. The base path is the process-wide one when
    /// [`init_base_path`](crate::init_base_path) ran before, root otherwise.
    pub fn new() -> Self {
        Self {
            base_path: initialised_base_path().cloned().unwrap_or_default(),
            hook_timeout: None,
            concurrency: ConcurrencyPolicy::default(),
            max_redirects: Self::DEFAULT_MAX_REDIRECTS,
            cache_capacity: Self::DEFAULT_CACHE_CAPACITY,
            initial_route: None,
        }
    }

    /// Read `APP_BASE_PATH` and `APP_NAV_TIMEOUT_MS` on top of the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Like [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::new();
        if let Some(base) = lookup(BASE_PATH_ENV) {
            config.base_path = BasePath::new(base);
        }
        if let Some(raw) = lookup(HOOK_TIMEOUT_ENV) {
            let millis: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                var: HOOK_TIMEOUT_ENV.to_string(),
                value: raw.clone(),
            })?;
            config.hook_timeout = (millis > 0).then(|| Duration::from_millis(millis));
        }
        Ok(config)
    }

    /// Serve under `base_path` instead of the process-wide prefix.
    pub fn base_path(mut self, base_path: impl AsRef<str>) -> Self {
        self.base_path = BasePath::new(base_path);
        self
    }

    /// Bound the before-hook chain of every navigation.
    pub fn hook_timeout(mut self, timeout: Duration) -> Self {
        self.hook_timeout = Some(timeout);
        self
    }

    /// Choose what an overlapping request does.
    pub fn concurrency(mut self, policy: ConcurrencyPolicy) -> Self {
        self.concurrency = policy;
        self
    }

    /// Redirects followed before giving up with `RedirectLoop`.
    pub fn max_redirects(mut self, max: usize) -> Self {
        self.max_redirects = max;
        self
    }

    /// Size of the path resolution cache.
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Route committed by `Navigator::start`.
    pub fn initial_route(mut self, key: impl Into<String>) -> Self {
        self.initial_route = Some(key.into());
        self
    }
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self::new()
    }
}
