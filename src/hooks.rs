//! Before- and after-navigate hooks.
//!
//! Hooks are registered on a [`Navigator`](crate::Navigator) and run for every
//! navigation, in registration order.
//!
//! - [`BeforeNavigate`] hooks receive a [`Continuation`] and the
//!   [`NavigationEvent`]. They proceed, deny or redirect by resolving the
//!   continuation, possibly long after their own future finished (for example
//!   after a "discard unsaved changes?" dialog closes). Returning `Err` aborts
//!   the navigation.
//! - [`AfterNavigate`] hooks run once the route is committed. They cannot veto;
//!   an `Err` is reported as a warning on the navigation result.
//!
//! # Creating hooks
//!
//! | Approach | When to use |
//! |----------|-------------|
//! | Implement the trait | Named hook with its own state |
//! | [`before_fn`] / [`after_fn`] | Async closure |
//! | [`guard_fn`] | Synchronous yes/no/redirect check |
//! | [`TitleHook`] | Keep the document title in sync with the route label |
//!
//! ```
//! use villa_navigator::{guard_fn, NavigationAction};
//!
//! let signed_in = false;
//! let guard = guard_fn::<(), _>("require-login", move |event| {
//!     if signed_in || event.target.key() == "login" {
//!         NavigationAction::Continue
//!     } else {
//!         NavigationAction::redirect("login")
//!     }
//! });
//! # let _ = guard;
//! ```

use crate::error::HookError;
use crate::lifecycle::{Continuation, NavigationAction};
use crate::NavigationEvent;
use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

// ============================================================================
// Traits
// ============================================================================

/// Interceptor that runs before a route is committed.
pub trait BeforeNavigate<V>: Send + Sync + 'static {
    /// Inspect the pending navigation and resolve `next`.
    ///
    /// The navigation waits until `next` is resolved, not until the returned
    /// future finishes. Once `next` is resolved the future is dropped, so work
    /// that must outlive the decision belongs in a spawned task. An `Err`
    /// returned before any decision fails the navigation. Dropping every clone
    /// of `next` unresolved counts as a denial.
    fn before_navigate(
        &self,
        next: Continuation,
        event: Arc<NavigationEvent<V>>,
    ) -> BoxFuture<'static, Result<(), HookError>>;

    /// Hook name for logs and error messages.
    fn name(&self) -> &str {
        "BeforeNavigate"
    }
}

/// Observer that runs after a route is committed.
pub trait AfterNavigate<V>: Send + Sync + 'static {
    /// React to a committed navigation (analytics, titles, scroll restore).
    fn after_navigate(&self, event: Arc<NavigationEvent<V>>)
        -> BoxFuture<'static, Result<(), HookError>>;

    /// Hook name for logs and warnings.
    fn name(&self) -> &str {
        "AfterNavigate"
    }
}

// ============================================================================
// Closure helpers
// ============================================================================

/// Create a before hook from an async closure.
///
/// ```
/// use std::sync::Arc;
/// use villa_navigator::{before_fn, Continuation, HookError, NavigationEvent};
///
/// let hook = before_fn(
///     "log-target",
///     |next: Continuation, event: Arc<NavigationEvent<()>>| async move {
///         println!("leaving for {}", event.target.key());
///         next.proceed();
///         Ok::<(), HookError>(())
///     },
/// );
/// # let _: &dyn villa_navigator::BeforeNavigate<()> = &hook;
/// ```
pub fn before_fn<V, F, Fut>(name: impl Into<String>, f: F) -> FnBefore<V, F>
where
    F: Fn(Continuation, Arc<NavigationEvent<V>>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HookError>> + Send + 'static,
{
    FnBefore {
        name: name.into(),
        f,
        _view: PhantomData,
    }
}

/// Before hook created via [`before_fn`].
pub struct FnBefore<V, F> {
    name: String,
    f: F,
    _view: PhantomData<fn() -> V>,
}

impl<V, F, Fut> BeforeNavigate<V> for FnBefore<V, F>
where
    V: 'static,
    F: Fn(Continuation, Arc<NavigationEvent<V>>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HookError>> + Send + 'static,
{
    fn before_navigate(
        &self,
        next: Continuation,
        event: Arc<NavigationEvent<V>>,
    ) -> BoxFuture<'static, Result<(), HookError>> {
        (self.f)(next, event).boxed()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Create an after hook from an async closure.
pub fn after_fn<V, F, Fut>(name: impl Into<String>, f: F) -> FnAfter<V, F>
where
    F: Fn(Arc<NavigationEvent<V>>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HookError>> + Send + 'static,
{
    FnAfter {
        name: name.into(),
        f,
        _view: PhantomData,
    }
}

/// After hook created via [`after_fn`].
pub struct FnAfter<V, F> {
    name: String,
    f: F,
    _view: PhantomData<fn() -> V>,
}

impl<V, F, Fut> AfterNavigate<V> for FnAfter<V, F>
where
    V: 'static,
    F: Fn(Arc<NavigationEvent<V>>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HookError>> + Send + 'static,
{
    fn after_navigate(
        &self,
        event: Arc<NavigationEvent<V>>,
    ) -> BoxFuture<'static, Result<(), HookError>> {
        (self.f)(event).boxed()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Create a before hook from a synchronous check.
///
/// The returned action resolves the continuation immediately.
pub fn guard_fn<V, F>(name: impl Into<String>, check: F) -> FnGuard<V, F>
where
    F: Fn(&NavigationEvent<V>) -> NavigationAction + Send + Sync + 'static,
{
    FnGuard {
        name: name.into(),
        check,
        _view: PhantomData,
    }
}

/// Synchronous before hook created via [`guard_fn`].
pub struct FnGuard<V, F> {
    name: String,
    check: F,
    _view: PhantomData<fn() -> V>,
}

impl<V, F> BeforeNavigate<V> for FnGuard<V, F>
where
    V: 'static,
    F: Fn(&NavigationEvent<V>) -> NavigationAction + Send + Sync + 'static,
{
    fn before_navigate(
        &self,
        next: Continuation,
        event: Arc<NavigationEvent<V>>,
    ) -> BoxFuture<'static, Result<(), HookError>> {
        next.resolve((self.check)(&*event));
        futures::future::ready(Ok(())).boxed()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ============================================================================
// Document title
// ============================================================================

/// Shared document title, written by [`TitleHook`] and read by the shell.
#[derive(Debug, Clone, Default)]
pub struct DocumentTitle {
    inner: Arc<Mutex<String>>,
}

impl DocumentTitle {
    /// Create an empty title.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current title.
    pub fn get(&self) -> String {
        self.inner.lock().clone()
    }

    /// Replace the title.
    pub fn set(&self, title: impl Into<String>) {
        *self.inner.lock() = title.into();
    }
}

/// After hook that sets the document title to `"<route label> | <app name>"`.
pub struct TitleHook {
    app_name: String,
    title: DocumentTitle,
}

impl TitleHook {
    /// Create a hook writing into `title`, suffixed with `app_name`.
    pub fn new(app_name: impl Into<String>, title: DocumentTitle) -> Self {
        Self {
            app_name: app_name.into(),
            title,
        }
    }
}

impl<V: 'static> AfterNavigate<V> for TitleHook {
    fn after_navigate(
        &self,
        event: Arc<NavigationEvent<V>>,
    ) -> BoxFuture<'static, Result<(), HookError>> {
        let label = event.target.display_label();
        if self.app_name.is_empty() {
            self.title.set(label);
        } else {
            self.title.set(format!("{} | {}", label, self.app_name));
        }
        futures::future::ready(Ok(())).boxed()
    }

    fn name(&self) -> &str {
        "TitleHook"
    }
}

// ============================================================================
// Tests
// ============================================================================
