//! Navigation and dialog core for the villa rental client.
//!
//! The crate is independent of any UI toolkit. Route components and dialog
//! contents are plain closures producing a caller-chosen view type `V`.
//!
//! - [`RouteTable`] holds the [`RouteDescriptor`]s in display order and
//!   resolves relative paths.
//! - [`path`] translates between relative paths and base-path addresses and
//!   classifies links.
//! - [`Navigator`] runs the before-hook chain, commits the route and runs the
//!   after hooks.
//! - [`DialogHost`] opens overlays whose result is awaited as a future.
//!
//! # Quick start
//!
//! ```
//! use villa_navigator::{
//!     guard_fn, NavigationAction, NavigationEvent, Navigator, NavigatorConfig,
//!     RouteDescriptor, RouteParams, RouteTable,
//! };
//!
//! let routes = RouteTable::from_routes([
//!     RouteDescriptor::new("home", |_| "Home").path("/").label("Home"),
//!     RouteDescriptor::new("dashboard", |_| "Dashboard").label("Dashboard"),
//!     RouteDescriptor::new("booking", |_| "Booking")
//!         .path("/bookings/:bookingId")
//!         .hidden(),
//! ])
//! .unwrap();
//!
//! let navigator = Navigator::with_config(routes, NavigatorConfig::new().base_path("/app")).unwrap();
//! navigator.before_each(guard_fn("open-hours", |_event: &NavigationEvent<&'static str>| {
//!     NavigationAction::Continue
//! }));
//!
//! let params = RouteParams::from_pairs([("bookingId", "12")]);
//! let result = pollster::block_on(navigator.navigate_to("booking", params));
//! assert!(result.is_success());
//! assert_eq!(navigator.address().as_deref(), Some("/app/bookings/12"));
//! ```
//!
//! # Feature flags
//!
//! | Feature   | Default | Effect |
//! |-----------|---------|--------|
//! | `log`     | yes     | Log through the `log` crate |
//! | `tracing` | no      | Log through `tracing` instead |
//! | `cache`   | yes     | LRU cache for path resolution |
//! | `timeout` | yes     | Hook and dialog deadlines via `tokio::time` |

#[cfg(feature = "cache")]
pub mod cache;
pub mod config;
pub mod dialog;
pub mod error;
pub mod hooks;
pub mod lifecycle;
pub mod logging;
pub mod navigator;
pub mod params;
pub mod path;
pub mod route;
pub mod state;
mod timeout;

#[cfg(feature = "cache")]
pub use cache::{CacheStats, ResolveCache};
pub use config::{ConcurrencyPolicy, NavigatorConfig, HOOK_TIMEOUT_ENV};
pub use dialog::{BlockingOverlay, CloseHandle, DialogFuture, DialogHost, DialogId, Overlay};
pub use error::{ConfigError, DialogError, HookError, NavigationError, NavigationResult, RenderError};
pub use hooks::{
    after_fn, before_fn, guard_fn, AfterNavigate, BeforeNavigate, DocumentTitle, TitleHook,
};
pub use lifecycle::{Continuation, NavigationAction};
pub use navigator::{LinkOutcome, NavigationEvent, Navigator};
pub use params::{QueryParams, RouteParams};
pub use path::{
    base_path, classify, init_base_path, normalize_path, to_absolute, to_relative, BasePath,
    LinkKind, BASE_PATH_ENV,
};
pub use route::{ComponentFn, RouteDescriptor, RouteTable, Visibility};
pub use state::{ActiveRoute, History, HistoryEntry, NavigationPhase};
