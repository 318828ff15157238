//! The navigation controller.
//!
//! A [`Navigator`] owns the committed route, the history stack and the hook
//! lists. It is a cheap `Clone` handle; every clone drives the same state.
//!
//! Each request runs the same pipeline:
//!
//! 1. Look up the target key. Unknown keys return `NotFound` without touching
//!    state.
//! 2. Run before hooks in registration order, one at a time. A hook's
//!    continuation must resolve with `proceed` before the next hook starts.
//!    A redirect restarts the chain on the new key.
//! 3. Commit: active route, address and history change together.
//! 4. Run after hooks in registration order. Their failures become warnings.
//!
//! ```
//! use villa_navigator::{Navigator, RouteDescriptor, RouteParams, RouteTable};
//!
//! let routes = RouteTable::from_routes([
//!     RouteDescriptor::new("home", |_| "home").path("/"),
//!     RouteDescriptor::new("dashboard", |_| "dashboard"),
//! ])
//! .unwrap();
//! let navigator = Navigator::new(routes);
//!
//! let result = pollster::block_on(navigator.navigate_to("dashboard", RouteParams::new()));
//! assert!(result.is_success());
//! assert_eq!(navigator.current_key().as_deref(), Some("dashboard"));
//! ```

#[cfg(feature = "cache")]
use crate::cache::{CacheStats, ResolveCache};
use crate::config::{ConcurrencyPolicy, NavigatorConfig};
use crate::error::{ConfigError, NavigationError, NavigationResult};
use crate::hooks::{AfterNavigate, BeforeNavigate};
use crate::lifecycle::{Continuation, NavigationAction};
use crate::path::{classify, split_link, BasePath, LinkKind};
use crate::route::{RouteDescriptor, RouteTable};
use crate::state::{ActiveRoute, History, NavigateOp, NavigationPhase, NavigatorState};
use crate::timeout::with_deadline;
use crate::{debug_log, error_log, info_log, trace_log, warn_log, QueryParams, RouteParams};
use futures::future::{select, AbortHandle, Abortable, Either};
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

// ============================================================================
// NavigationEvent
// ============================================================================

/// A single navigation attempt, handed to every hook.
pub struct NavigationEvent<V> {
    /// Route active when the attempt started
    pub source: Option<Arc<RouteDescriptor<V>>>,
    /// Route being navigated to
    pub target: Arc<RouteDescriptor<V>>,
    /// Parameters for the target
    pub params: RouteParams,
    /// Relative path the target will be committed at
    pub path: String,
    /// When the attempt was created
    pub timestamp: SystemTime,
}

impl<V> NavigationEvent<V> {
    /// Build an event for a navigation from `source` (if any) to `target`.
    pub fn new(
        source: Option<Arc<RouteDescriptor<V>>>,
        target: Arc<RouteDescriptor<V>>,
        params: RouteParams,
        path: impl Into<String>,
    ) -> Self {
        Self {
            source,
            target,
            params,
            path: path.into(),
            timestamp: SystemTime::now(),
        }
    }

    /// Key of the source route, if any.
    pub fn source_key(&self) -> Option<&str> {
        self.source.as_deref().map(RouteDescriptor::key)
    }
}

impl<V> fmt::Debug for NavigationEvent<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationEvent")
            .field("source", &self.source_key())
            .field("target", &self.target.key())
            .field("params", &self.params)
            .field("path", &self.path)
            .field("timestamp", &self.timestamp)
            .finish()
    }
}

// ============================================================================
// LinkOutcome
// ============================================================================

/// What [`Navigator::follow_link`] did with a link.
#[derive(Debug, Clone)]
pub enum LinkOutcome {
    /// `http(s)` URL, left to the platform
    External(String),
    /// In-page anchor, without the leading `#`
    Hash(String),
    /// Internal link, navigated through the pipeline
    Navigated(NavigationResult),
}

impl LinkOutcome {
    /// The navigation result for internal links.
    pub fn navigation(&self) -> Option<&NavigationResult> {
        match self {
            LinkOutcome::Navigated(result) => Some(result),
            _ => None,
        }
    }
}

// ============================================================================
// Navigator
// ============================================================================

/// Releases the pending slot of a navigation however its future ends,
/// including when the caller drops it mid-chain.
struct PendingGuard<'a, V> {
    state: &'a Mutex<NavigatorState<V>>,
    id: usize,
}

impl<V> Drop for PendingGuard<'_, V> {
    fn drop(&mut self) {
        self.state.lock().finish_navigation(self.id);
    }
}

/// How one pass of the before-hook chain ended.
enum ChainOutcome {
    Approved,
    Redirect(String),
    Finished(NavigationResult),
}

struct Inner<V> {
    routes: RouteTable<V>,
    config: NavigatorConfig,
    before: RwLock<Vec<Arc<dyn BeforeNavigate<V>>>>,
    after: RwLock<Vec<Arc<dyn AfterNavigate<V>>>>,
    state: Mutex<NavigatorState<V>>,
    #[cfg(feature = "cache")]
    cache: Mutex<ResolveCache>,
}

/// Navigation controller over a [`RouteTable`].
pub struct Navigator<V> {
    inner: Arc<Inner<V>>,
}

impl<V> Clone for Navigator<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: 'static> Navigator<V> {
    /// Create a navigator with the default configuration.
    pub fn new(routes: RouteTable<V>) -> Self {
        Self::build(routes, NavigatorConfig::default())
    }

    /// Create a navigator, validating the configured initial route.
    pub fn with_config(routes: RouteTable<V>, config: NavigatorConfig) -> Result<Self, ConfigError> {
        if let Some(key) = &config.initial_route {
            if !routes.contains(key) {
                return Err(ConfigError::UnknownInitialRoute { key: key.clone() });
            }
        }
        Ok(Self::build(routes, config))
    }

    fn build(routes: RouteTable<V>, config: NavigatorConfig) -> Self {
        info_log!(
            "Navigator created with {} routes under base path '{}'",
            routes.len(),
            config.base_path
        );
        Self {
            inner: Arc::new(Inner {
                #[cfg(feature = "cache")]
                cache: Mutex::new(ResolveCache::with_capacity(config.cache_capacity)),
                routes,
                config,
                before: RwLock::new(Vec::new()),
                after: RwLock::new(Vec::new()),
                state: Mutex::new(NavigatorState::new()),
            }),
        }
    }

    // ------------------------------------------------------------------------
    // Hook registration
    // ------------------------------------------------------------------------

    /// Register a before hook. Hooks run in registration order.
    pub fn before_each(&self, hook: impl BeforeNavigate<V>) -> &Self {
        debug_log!("Before hook '{}' registered", hook.name());
        self.inner.before.write().push(Arc::new(hook));
        self
    }

    /// Register an after hook. Hooks run in registration order.
    pub fn after_each(&self, hook: impl AfterNavigate<V>) -> &Self {
        debug_log!("After hook '{}' registered", hook.name());
        self.inner.after.write().push(Arc::new(hook));
        self
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// The route table this navigator resolves against.
    pub fn routes(&self) -> &RouteTable<V> {
        &self.inner.routes
    }

    /// Configuration the navigator was built with.
    pub fn config(&self) -> &NavigatorConfig {
        &self.inner.config
    }

    /// Base path addresses are prefixed with.
    pub fn base_path(&self) -> &BasePath {
        &self.inner.config.base_path
    }

    /// Current phase of the navigator.
    pub fn phase(&self) -> NavigationPhase {
        self.inner.state.lock().phase.clone()
    }

    /// The committed route.
    pub fn current(&self) -> Option<ActiveRoute<V>> {
        self.inner.state.lock().active.clone()
    }

    /// Key of the committed route, if any.
    pub fn current_key(&self) -> Option<String> {
        self.inner
            .state
            .lock()
            .active
            .as_ref()
            .map(|active| active.key().to_string())
    }

    /// Relative path of the committed route.
    pub fn current_path(&self) -> Option<String> {
        self.inner
            .state
            .lock()
            .active
            .as_ref()
            .map(|active| active.path.clone())
    }

    /// Address-bar path of the committed route.
    pub fn address(&self) -> Option<String> {
        self.inner
            .state
            .lock()
            .active
            .as_ref()
            .map(|active| active.address.clone())
    }

    /// Snapshot of the history stack.
    pub fn history(&self) -> History {
        self.inner.state.lock().history.clone()
    }

    /// Return `true` if there is an entry behind the current one.
    pub fn can_go_back(&self) -> bool {
        self.inner.state.lock().history.can_go_back()
    }

    /// Return `true` if there is an entry ahead of the current one.
    pub fn can_go_forward(&self) -> bool {
        self.inner.state.lock().history.can_go_forward()
    }

    /// Render the committed route's view.
    pub fn render(&self) -> Option<V> {
        // Render outside the lock; components may query the navigator.
        let active = self.current()?;
        Some(active.render())
    }

    /// Relative path of route `key` filled with `params`.
    pub fn url_for(&self, key: &str, params: &RouteParams) -> Result<String, NavigationError> {
        self.inner.routes.url_for(key, params)
    }

    /// Address-bar path of route `key`, under this navigator's base path.
    pub fn href_for(&self, key: &str, params: &RouteParams) -> Result<String, NavigationError> {
        let relative = self.url_for(key, params)?;
        Ok(self.base_path().to_absolute(&relative))
    }

    /// Resolve a relative path (query and fragment are ignored) to a route.
    pub fn resolve_path(&self, path: &str) -> Option<(Arc<RouteDescriptor<V>>, RouteParams)> {
        let (path, _, _) = split_link(path);

        #[cfg(feature = "cache")]
        if let Some(cached) = self.inner.cache.lock().get(path) {
            let (key, params) = cached?;
            let route = self.inner.routes.get(&key)?;
            return Some((Arc::clone(route), params));
        }

        let resolved = self.inner.routes.resolve(path);

        #[cfg(feature = "cache")]
        self.inner.cache.lock().insert(
            path.to_string(),
            resolved
                .as_ref()
                .map(|(route, params)| (route.key().to_string(), params.clone())),
        );

        resolved
    }

    /// Snapshot of the resolution cache counters.
    #[cfg(feature = "cache")]
    pub fn cache_stats(&self) -> CacheStats {
        self.inner.cache.lock().stats().clone()
    }

    // ------------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------------

    /// Commit the configured initial route, replacing the current entry.
    ///
    /// Returns `None` when no initial route is configured.
    pub async fn start(&self) -> Option<NavigationResult> {
        let key = self.inner.config.initial_route.clone()?;
        info_log!("Starting at initial route '{}'", key);
        Some(
            self.navigate(key, RouteParams::new(), NavigateOp::Replace)
                .await,
        )
    }

    /// Navigate to the route `key`, pushing a history entry.
    pub async fn navigate_to(&self, key: &str, params: RouteParams) -> NavigationResult {
        self.navigate(key.to_string(), params, NavigateOp::Push)
            .await
    }

    /// Navigate to the route `key`, replacing the current history entry.
    pub async fn replace_with(&self, key: &str, params: RouteParams) -> NavigationResult {
        self.navigate(key.to_string(), params, NavigateOp::Replace)
            .await
    }

    /// Navigate to a relative path such as `/bookings/12?tab=fees`.
    ///
    /// Query parameters are merged into the route parameters; path
    /// parameters win on conflicts. An unmatched path is `NotFound` with the
    /// path as key.
    pub async fn navigate_to_path(&self, path: &str) -> NavigationResult {
        let (route_path, query, _) = split_link(path);
        let Some((route, path_params)) = self.resolve_path(route_path) else {
            warn_log!("No route matches path '{}'", path);
            return NavigationResult::NotFound {
                key: path.to_string(),
            };
        };
        let params = match query {
            Some(query) => RouteParams::merge(
                &QueryParams::from_query_string(query).to_route_params(),
                &path_params,
            ),
            None => path_params,
        };
        self.navigate(route.key().to_string(), params, NavigateOp::Push)
            .await
    }

    /// Handle a clicked link.
    ///
    /// External URLs and in-page anchors are returned untouched. Internal
    /// links are navigated; links under the base path are made relative first.
    pub async fn follow_link(&self, href: &str) -> LinkOutcome {
        match classify(href) {
            LinkKind::External => {
                debug_log!("External link '{}' left to the platform", href);
                LinkOutcome::External(href.to_string())
            }
            LinkKind::Hash => LinkOutcome::Hash(href.trim_start_matches('#').to_string()),
            LinkKind::Internal => {
                let base = self.base_path();
                let relative = if base.contains(href) {
                    base.to_relative(href)
                } else {
                    href.to_string()
                };
                LinkOutcome::Navigated(self.navigate_to_path(&relative).await)
            }
        }
    }

    /// Navigate one step back in history. `None` at the oldest entry.
    pub async fn back(&self) -> Option<NavigationResult> {
        let (index, entry) = {
            let state = self.inner.state.lock();
            let (index, entry) = state.history.peek_back()?;
            (index, entry.clone())
        };
        Some(
            self.navigate(entry.key, entry.params, NavigateOp::Traverse(index))
                .await,
        )
    }

    /// Navigate one step forward in history. `None` at the newest entry.
    pub async fn forward(&self) -> Option<NavigationResult> {
        let (index, entry) = {
            let state = self.inner.state.lock();
            let (index, entry) = state.history.peek_forward()?;
            (index, entry.clone())
        };
        Some(
            self.navigate(entry.key, entry.params, NavigateOp::Traverse(index))
                .await,
        )
    }

    /// Abort the navigation that is still resolving. It returns `Cancelled`.
    ///
    /// Returns `false` if nothing was pending.
    pub fn cancel_pending(&self) -> bool {
        let state = self.inner.state.lock();
        match &state.pending {
            Some(pending) => {
                info_log!("Cancelling navigation to '{}'", pending.key);
                pending.abort.abort();
                true
            }
            None => false,
        }
    }

    // ------------------------------------------------------------------------
    // Pipeline
    // ------------------------------------------------------------------------

    async fn navigate(&self, key: String, params: RouteParams, op: NavigateOp) -> NavigationResult {
        if !self.inner.routes.contains(&key) {
            warn_log!("Navigation to unknown route '{}' rejected", key);
            return NavigationResult::NotFound { key };
        }

        let (abort, registration) = AbortHandle::new_pair();
        let id = {
            let mut state = self.inner.state.lock();
            if let Some(pending) = &state.pending {
                match self.inner.config.concurrency {
                    ConcurrencyPolicy::Reject => {
                        warn_log!(
                            "Navigation to '{}' rejected: '{}' is still resolving",
                            key,
                            pending.key
                        );
                        return NavigationResult::Error(NavigationError::Busy {
                            pending: pending.key.clone(),
                        });
                    }
                    ConcurrencyPolicy::Supersede => {
                        warn_log!(
                            "Navigation to '{}' supersedes pending '{}'",
                            key,
                            pending.key
                        );
                        pending.abort.abort();
                    }
                }
            }
            state.start_navigation(&key, abort)
        };
        info_log!("Navigation #{} {:?} to '{}'", id, op, key);
        let _pending = PendingGuard {
            state: &self.inner.state,
            id,
        };

        let requested = key.clone();
        let chain = Abortable::new(self.resolve_target(id, key, params), registration);
        let outcome = with_deadline(self.inner.config.hook_timeout, chain).await;

        let event = match outcome {
            Ok(Ok(Ok(event))) => event,
            Ok(Ok(Err(result))) => return result,
            Ok(Err(_aborted)) => {
                return if self.inner.state.lock().is_navigation_current(id) {
                    debug_log!("Navigation #{} to '{}' cancelled", id, requested);
                    NavigationResult::Cancelled { key: requested }
                } else {
                    debug_log!("Navigation #{} to '{}' superseded", id, requested);
                    NavigationResult::Superseded { key: requested }
                };
            }
            Err(elapsed) => {
                warn_log!(
                    "Before hooks for '{}' timed out after {}ms",
                    requested,
                    elapsed.millis()
                );
                return NavigationResult::Error(NavigationError::TimedOut {
                    key: requested,
                    after_ms: elapsed.millis(),
                });
            }
        };

        if let Err(result) = self.commit(id, &event, op) {
            return result;
        }

        let warnings = self.run_after_hooks(&event).await;
        info_log!(
            "Navigation #{} complete: '{}' at '{}'",
            id,
            event.target.key(),
            event.path
        );
        NavigationResult::Success {
            key: event.target.key().to_string(),
            path: event.path.clone(),
            warnings,
        }
    }

    /// Run the before-hook chain, following redirects, until a target is
    /// approved.
    async fn resolve_target(
        &self,
        id: usize,
        mut key: String,
        mut params: RouteParams,
    ) -> Result<Arc<NavigationEvent<V>>, NavigationResult> {
        let mut depth = 0;
        loop {
            let Some(target) = self.inner.routes.get(&key).cloned() else {
                warn_log!("Redirect target '{}' is not registered", key);
                return Err(NavigationResult::NotFound { key });
            };
            let path = target.url_for(&params).map_err(NavigationResult::Error)?;
            let source = self
                .inner
                .state
                .lock()
                .active
                .as_ref()
                .map(|active| Arc::clone(&active.descriptor));
            let event = Arc::new(NavigationEvent::new(source, target, params, path));

            match self.run_before_hooks(&event).await {
                ChainOutcome::Approved => return Ok(event),
                ChainOutcome::Finished(result) => return Err(result),
                ChainOutcome::Redirect(to) => {
                    depth += 1;
                    if depth > self.inner.config.max_redirects {
                        error_log!(
                            "Redirect loop detected (depth {}) navigating to '{}'",
                            depth,
                            to
                        );
                        return Err(NavigationResult::Error(NavigationError::RedirectLoop {
                            depth,
                            key: to,
                        }));
                    }
                    self.inner.state.lock().retarget(id, &to);
                    key = to;
                    params = RouteParams::new();
                }
            }
        }
    }

    async fn run_before_hooks(&self, event: &Arc<NavigationEvent<V>>) -> ChainOutcome {
        let hooks = self.inner.before.read().clone();
        debug_log!(
            "Running {} before hooks for '{}'",
            hooks.len(),
            event.target.key()
        );

        for hook in hooks {
            let name = hook.name().to_string();
            let (next, decision) = Continuation::new(&name);

            // The decision alone gates the chain. Work the hook still has
            // pending once it decided is dropped with its future.
            let running = hook.before_navigate(next, Arc::clone(event));
            let decision = match select(running, decision).await {
                Either::Left((Ok(()), decision)) => decision.await,
                Either::Left((Err(err), mut decision)) => match decision.try_recv() {
                    Ok(Some(action)) => Ok(action),
                    _ => {
                        warn_log!("Before hook '{}' failed: {}", name, err);
                        return ChainOutcome::Finished(NavigationResult::Error(
                            NavigationError::HookFailed {
                                hook: name,
                                message: err.to_string(),
                            },
                        ));
                    }
                },
                Either::Right((decision, _running)) => decision,
            };

            match decision {
                Ok(NavigationAction::Continue) => {
                    trace_log!("Before hook '{}' proceeded", name);
                }
                Ok(NavigationAction::Deny { reason }) => {
                    warn_log!(
                        "Navigation to '{}' blocked by '{}': {}",
                        event.target.key(),
                        name,
                        reason
                    );
                    return ChainOutcome::Finished(NavigationResult::Blocked { reason });
                }
                Ok(NavigationAction::Redirect { to, reason }) => {
                    debug_log!(
                        "Before hook '{}' redirecting from '{}' to '{}': {:?}",
                        name,
                        event.target.key(),
                        to,
                        reason
                    );
                    return ChainOutcome::Redirect(to);
                }
                Err(_canceled) => {
                    warn_log!(
                        "Before hook '{}' dropped its continuation, navigation to '{}' blocked",
                        name,
                        event.target.key()
                    );
                    return ChainOutcome::Finished(NavigationResult::Blocked {
                        reason: format!("hook '{}' dropped its continuation", name),
                    });
                }
            }
        }
        ChainOutcome::Approved
    }

    fn commit(
        &self,
        id: usize,
        event: &NavigationEvent<V>,
        op: NavigateOp,
    ) -> Result<(), NavigationResult> {
        let mut state = self.inner.state.lock();
        if !state.is_navigation_current(id) {
            debug_log!("Navigation #{} lost the race before commit", id);
            return Err(NavigationResult::Superseded {
                key: event.target.key().to_string(),
            });
        }

        let address = self.base_path().to_absolute(&event.path);
        state.commit(
            ActiveRoute {
                descriptor: Arc::clone(&event.target),
                params: event.params.clone(),
                path: event.path.clone(),
                address,
            },
            op,
        );
        state.finish_navigation(id);
        Ok(())
    }

    async fn run_after_hooks(&self, event: &Arc<NavigationEvent<V>>) -> Vec<NavigationError> {
        let hooks = self.inner.after.read().clone();
        let mut warnings = Vec::new();
        for hook in hooks {
            if let Err(err) = hook.after_navigate(Arc::clone(event)).await {
                warn_log!("After hook '{}' failed: {}", hook.name(), err);
                warnings.push(NavigationError::HookFailed {
                    hook: hook.name().to_string(),
                    message: err.to_string(),
                });
            }
        }
        warnings
    }
}

impl<V> fmt::Debug for Navigator<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Navigator")
            .field("routes", &self.inner.routes.len())
            .field("base_path", &self.inner.config.base_path)
            .field("phase", &state.phase)
            .field("current", &state.active.as_ref().map(|a| a.key().to_string()))
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
