//! Base-path translation and link classification.
//!
//! The client is deployed under a prefix (`/app`, `/manage/villas`, or the
//! origin root). Inside the application every address is *relative* to that
//! prefix; the platform address bar shows the *absolute* form.
//!
//! - [`BasePath`]: a normalized prefix with [`to_absolute`](BasePath::to_absolute)
//!   and [`to_relative`](BasePath::to_relative).
//! - [`init_base_path`] / [`base_path`]: the process-wide, write-once prefix,
//!   and the free functions [`to_absolute`] / [`to_relative`] that use it.
//! - [`classify`]: external, hash, or internal link.
//!
//! ```
//! use villa_navigator::path::{BasePath, classify, LinkKind};
//!
//! let base = BasePath::new("/app");
//! assert_eq!(base.to_absolute("/home"), "/app/home");
//! assert_eq!(base.to_relative("/app/home"), "/home");
//!
//! assert_eq!(classify("https://example.com"), LinkKind::External);
//! assert_eq!(classify("#reviews"), LinkKind::Hash);
//! assert_eq!(classify("/bookings"), LinkKind::Internal);
//! ```

use crate::error::ConfigError;
use crate::{debug_log, info_log};
use std::sync::OnceLock;

/// Environment variable holding the deployment base path.
pub const BASE_PATH_ENV: &str = "APP_BASE_PATH";

static BASE_PATH: OnceLock<BasePath> = OnceLock::new();

// ============================================================================
// BasePath
// ============================================================================

/// Deployment prefix under which the application is served.
///
/// Stored normalized: empty for the origin root, otherwise a leading slash and
/// no trailing slash (`"app/"` and `"/app"` both become `"/app"`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BasePath {
    prefix: String,
}

impl BasePath {
    /// Normalize and wrap a prefix.
    pub fn new(prefix: impl AsRef<str>) -> Self {
        let segments = split_path(prefix.as_ref());
        if segments.is_empty() {
            return Self::root();
        }
        Self {
            prefix: format!("/{}", segments.join("/")),
        }
    }

    /// The origin root (empty prefix).
    pub fn root() -> Self {
        Self {
            prefix: String::new(),
        }
    }

    /// Read the prefix from [`BASE_PATH_ENV`]. Unset means root.
    pub fn from_env() -> Self {
        std::env::var(BASE_PATH_ENV)
            .map(Self::new)
            .unwrap_or_default()
    }

    /// The normalized prefix (`""` for root).
    pub fn as_str(&self) -> &str {
        &self.prefix
    }

    /// Return `true` if the application is served from the origin root.
    pub fn is_root(&self) -> bool {
        self.prefix.is_empty()
    }

    /// Prepend the prefix to an application-relative path.
    ///
    /// Only rooted paths (and the empty path, which maps to the bare prefix)
    /// are prefixed. Document-relative input such as `"bookings"` or
    /// `"?tab=fees"` is returned unchanged, so it never gains a prefix that
    /// [`to_relative`](Self::to_relative) could not take away again. Under the
    /// root prefix every input is returned unchanged.
    pub fn to_absolute(&self, relative: &str) -> String {
        if self.is_root() || !(relative.is_empty() || relative.starts_with('/')) {
            return relative.to_string();
        }
        format!("{}{}", self.prefix, relative)
    }

    /// Strip the prefix from an absolute path.
    ///
    /// The prefix only matches on a segment boundary, so with `/app` the path
    /// `/application` is returned unchanged. Paths without the prefix are
    /// returned unchanged.
    pub fn to_relative(&self, absolute: &str) -> String {
        if self.is_root() {
            return absolute.to_string();
        }
        match absolute.strip_prefix(self.prefix.as_str()) {
            Some(rest) if rest.is_empty() => String::new(),
            Some(rest) if rest.starts_with(['/', '?', '#']) => {
                if rest.starts_with('/') {
                    rest.to_string()
                } else {
                    format!("/{}", rest)
                }
            }
            _ => absolute.to_string(),
        }
    }

    /// Return `true` if `absolute` lies under this prefix.
    pub fn contains(&self, absolute: &str) -> bool {
        self.is_root() || self.to_relative(absolute) != absolute
    }
}

impl std::fmt::Display for BasePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_root() {
            write!(f, "/")
        } else {
            write!(f, "{}", self.prefix)
        }
    }
}

// ============================================================================
// Process-wide base path
// ============================================================================

/// Set the process-wide base path. Succeeds once; repeating the same value is
/// accepted, a different value is an error.
pub fn init_base_path(prefix: impl AsRef<str>) -> Result<&'static BasePath, ConfigError> {
    let requested = BasePath::new(prefix);
    let current = BASE_PATH.get_or_init(|| {
        info_log!("Base path initialised to '{}'", requested);
        requested.clone()
    });
    if *current == requested {
        Ok(current)
    } else {
        Err(ConfigError::BasePathAlreadySet {
            current: current.to_string(),
            requested: requested.to_string(),
        })
    }
}

/// The process-wide base path.
///
/// Reading before [`init_base_path`] freezes the root prefix.
pub fn base_path() -> &'static BasePath {
    BASE_PATH.get_or_init(|| {
        debug_log!("Base path read before initialisation, using root");
        BasePath::root()
    })
}

/// The process-wide base path, without freezing it when unset.
pub(crate) fn initialised_base_path() -> Option<&'static BasePath> {
    BASE_PATH.get()
}

/// [`BasePath::to_absolute`] with the process-wide base path.
pub fn to_absolute(relative: &str) -> String {
    base_path().to_absolute(relative)
}

/// [`BasePath::to_relative`] with the process-wide base path.
pub fn to_relative(absolute: &str) -> String {
    base_path().to_relative(absolute)
}

// ============================================================================
// Link classification
// ============================================================================

/// Category of a link target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    /// `http://` or `https://` URL, handled by the platform
    External,
    /// In-page anchor (`#section`)
    Hash,
    /// Application route
    Internal,
}

/// Classify a link. Every input falls in exactly one category; the scheme
/// check runs first so an external URL containing `#` stays external.
pub fn classify(path: &str) -> LinkKind {
    if has_http_scheme(path) {
        LinkKind::External
    } else if path.starts_with('#') {
        LinkKind::Hash
    } else {
        LinkKind::Internal
    }
}

fn has_http_scheme(path: &str) -> bool {
    ["http://", "https://"].iter().any(|scheme| {
        path.get(..scheme.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(scheme))
    })
}

// ============================================================================
// Helpers
// ============================================================================

/// Split a path into segments, filtering empty segments
///
/// ```ignore
/// assert_eq!(split_path("/bookings/12"), vec!["bookings", "12"]);
/// assert_eq!(split_path("/"), Vec::<&str>::new());
/// ```
pub(crate) fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Root a path and drop a trailing slash: `"bookings/"` becomes `"/bookings"`.
pub fn normalize_path(path: &str) -> String {
    format!("/{}", split_path(path).join("/"))
}

/// Split `"/bookings/1?tab=fees#notes"` into path, query and fragment.
pub fn split_link(link: &str) -> (&str, Option<&str>, Option<&str>) {
    let (rest, fragment) = match link.split_once('#') {
        Some((rest, fragment)) => (rest, Some(fragment)),
        None => (link, None),
    };
    match rest.split_once('?') {
        Some((path, query)) => (path, Some(query), fragment),
        None => (rest, None, fragment),
    }
}

// ============================================================================
// Tests
// ============================================================================
