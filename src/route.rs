//! Route descriptors and the route table.
//!
//! A [`RouteDescriptor`] names a navigable view: its unique key, the component
//! that renders it, display metadata (label, icon), where it shows up in the
//! chrome ([`Visibility`]), and the path pattern used for its address.
//!
//! A [`RouteTable`] holds descriptors in registration order. That order is the
//! default display order of navigation menus. The table is assembled once and
//! then handed to a [`Navigator`](crate::Navigator), which never mutates it.
//!
//! ```
//! use villa_navigator::{RouteDescriptor, RouteTable};
//!
//! let table = RouteTable::from_routes([
//!     RouteDescriptor::new("home", |_| "Home").path("/").label("Home"),
//!     RouteDescriptor::new("booking", |_| "Booking").path("/bookings/:bookingId").label("Booking"),
//! ])
//! .unwrap();
//!
//! let (route, params) = table.resolve("/bookings/42").unwrap();
//! assert_eq!(route.key(), "booking");
//! assert_eq!(params.get("bookingId"), Some(&"42".to_string()));
//! ```

use crate::error::{ConfigError, NavigationError};
use crate::params::decode_component;
use crate::path::normalize_path;
use crate::{trace_log, RouteParams};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Function that renders a route's view from its parameters.
pub type ComponentFn<V> = Arc<dyn Fn(&RouteParams) -> V + Send + Sync>;

// ============================================================================
// Visibility
// ============================================================================

/// Where a route appears in the application chrome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Visibility {
    /// Listed in the side navigation
    pub nav: bool,
    /// Listed in the header
    pub header: bool,
    /// Listed in the footer
    pub footer: bool,
}

impl Visibility {
    /// Visible everywhere.
    pub const ALL: Self = Self {
        nav: true,
        header: true,
        footer: true,
    };

    /// Reachable only by navigation requests (detail pages, wizards).
    pub const HIDDEN: Self = Self {
        nav: false,
        header: false,
        footer: false,
    };
}

impl Default for Visibility {
    fn default() -> Self {
        Self::ALL
    }
}

// ============================================================================
// RouteDescriptor
// ============================================================================

/// A navigable view and its display metadata.
pub struct RouteDescriptor<V> {
    key: String,
    path: String,
    label: String,
    icon: Option<String>,
    visibility: Visibility,
    component: ComponentFn<V>,
}

impl<V> RouteDescriptor<V> {
    /// Create a descriptor. The path defaults to `/<key>` and the label to the key.
    pub fn new<F>(key: impl Into<String>, component: F) -> Self
    where
        F: Fn(&RouteParams) -> V + Send + Sync + 'static,
    {
        let key = key.into();
        Self {
            path: format!("/{}", key),
            label: key.clone(),
            key,
            icon: None,
            visibility: Visibility::default(),
            component: Arc::new(component),
        }
    }

    /// Set the path pattern (`/bookings/:bookingId`).
    pub fn path(mut self, pattern: impl AsRef<str>) -> Self {
        self.path = normalize_path(pattern.as_ref());
        self
    }

    /// Set the display label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set the icon name.
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Set where the route is listed.
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Hide the route from nav, header and footer.
    pub fn hidden(self) -> Self {
        self.visibility(Visibility::HIDDEN)
    }

    /// Unique route key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Path pattern, e.g. `/bookings/:bookingId`.
    pub fn path_pattern(&self) -> &str {
        &self.path
    }

    /// Label shown in menus and titles.
    pub fn display_label(&self) -> &str {
        &self.label
    }

    /// Icon name for menus, if any.
    pub fn icon_name(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    /// Menus this route appears in.
    pub fn visible_in(&self) -> Visibility {
        self.visibility
    }

    /// Render the route's view.
    pub fn render(&self, params: &RouteParams) -> V {
        (self.component)(params)
    }

    /// Build the relative path for this route from `params`.
    pub fn url_for(&self, params: &RouteParams) -> Result<String, NavigationError> {
        params
            .fill_pattern(&self.path)
            .map_err(|missing| NavigationError::InvalidParams {
                message: format!(
                    "route '{}' needs parameter '{}' for pattern '{}'",
                    self.key, missing, self.path
                ),
            })
    }
}

impl<V> fmt::Debug for RouteDescriptor<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDescriptor")
            .field("key", &self.key)
            .field("path", &self.path)
            .field("label", &self.label)
            .field("icon", &self.icon)
            .field("visibility", &self.visibility)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// RouteTable
// ============================================================================

/// Ordered, key-unique collection of route descriptors.
pub struct RouteTable<V> {
    routes: Vec<Arc<RouteDescriptor<V>>>,
    by_key: HashMap<String, usize>,
    matcher: matchit::Router<usize>,
}

impl<V> RouteTable<V> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            by_key: HashMap::new(),
            matcher: matchit::Router::new(),
        }
    }

    /// Build a table from descriptors in display order.
    pub fn from_routes(
        routes: impl IntoIterator<Item = RouteDescriptor<V>>,
    ) -> Result<Self, ConfigError> {
        let mut table = Self::new();
        for route in routes {
            table.register(route)?;
        }
        Ok(table)
    }

    /// Append a descriptor. Keys must be unique and patterns must not collide.
    pub fn register(&mut self, route: RouteDescriptor<V>) -> Result<&mut Self, ConfigError> {
        if self.by_key.contains_key(&route.key) {
            return Err(ConfigError::DuplicateRoute { key: route.key });
        }

        let index = self.routes.len();
        self.matcher
            .insert(to_matchit_pattern(&route.path), index)
            .map_err(|err| ConfigError::InvalidPattern {
                pattern: route.path.clone(),
                message: err.to_string(),
            })?;

        trace_log!("Route '{}' registered at '{}'", route.key, route.path);
        self.by_key.insert(route.key.clone(), index);
        self.routes.push(Arc::new(route));
        Ok(self)
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, route: RouteDescriptor<V>) -> Result<Self, ConfigError> {
        self.register(route)?;
        Ok(self)
    }

    /// Look up a descriptor by key.
    pub fn get(&self, key: &str) -> Option<&Arc<RouteDescriptor<V>>> {
        self.by_key.get(key).map(|&index| &self.routes[index])
    }

    /// Return `true` if `key` is registered.
    pub fn contains(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    /// Descriptors in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<RouteDescriptor<V>>> {
        self.routes.iter()
    }

    /// Keys in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(|r| r.key())
    }

    /// Number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Return `true` when no route is registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Routes listed in the side navigation, in display order.
    pub fn nav_items(&self) -> impl Iterator<Item = &Arc<RouteDescriptor<V>>> {
        self.routes.iter().filter(|r| r.visibility.nav)
    }

    /// Routes listed in the header, in display order.
    pub fn header_items(&self) -> impl Iterator<Item = &Arc<RouteDescriptor<V>>> {
        self.routes.iter().filter(|r| r.visibility.header)
    }

    /// Routes listed in the footer, in display order.
    pub fn footer_items(&self) -> impl Iterator<Item = &Arc<RouteDescriptor<V>>> {
        self.routes.iter().filter(|r| r.visibility.footer)
    }

    /// Resolve an application-relative path (no query or fragment) to a route.
    ///
    /// The empty path resolves like `/`.
    pub fn resolve(&self, path: &str) -> Option<(Arc<RouteDescriptor<V>>, RouteParams)> {
        let normalized = normalize_path(path);
        let matched = self.matcher.at(&normalized).ok()?;
        let params = matched
            .params
            .iter()
            .map(|(name, value)| (name, decode_component(value)))
            .collect::<RouteParams>();
        let route = Arc::clone(&self.routes[*matched.value]);
        trace_log!("Path '{}' resolved to route '{}'", path, route.key);
        Some((route, params))
    }

    /// Relative path of the route `key` filled with `params`.
    pub fn url_for(&self, key: &str, params: &RouteParams) -> Result<String, NavigationError> {
        self.get(key)
            .ok_or_else(|| NavigationError::RouteNotFound {
                key: key.to_string(),
            })?
            .url_for(params)
    }
}

impl<V> Default for RouteTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for RouteTable<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.routes.iter()).finish()
    }
}

/// Convert `:name` segments to matchit's `{name}` syntax.
fn to_matchit_pattern(pattern: &str) -> String {
    let segments: Vec<String> = pattern
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|segment| match segment.strip_prefix(':') {
            Some(name) => format!("{{{}}}", name),
            None => segment.to_string(),
        })
        .collect();
    format!("/{}", segments.join("/"))
}

// ============================================================================
// Tests
// ============================================================================
