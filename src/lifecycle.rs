//! Navigation decisions and the one-shot continuation handed to hooks.
//!
//! - [`NavigationAction`]: what a before-navigate hook decided: continue,
//!   deny with a reason, or redirect to another route key.
//! - [`Continuation`]: the handle a hook resolves to report that decision.
//!   Only the first resolution counts; later calls are no-ops.
//!
//! Order of a navigation:
//!
//! 1. **Before hooks**, in registration order. Each must resolve its
//!    continuation with `proceed` before the next one runs.
//! 2. **Commit**: the active route, address and history change.
//! 3. **After hooks**, in registration order. They cannot veto.

use crate::trace_log;
use futures::channel::oneshot;
use parking_lot::Mutex;
use std::sync::Arc;

/// What a before-navigate hook decided.
///
/// ```
/// use villa_navigator::NavigationAction;
///
/// assert!(NavigationAction::Continue.allows());
/// assert!(!NavigationAction::deny("Unsaved listing draft").allows());
/// assert_eq!(NavigationAction::redirect("login").redirect_key(), Some("login"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationAction {
    /// Hand over to the next hook, or commit after the last one.
    Continue,
    /// Stop here; the navigation ends as blocked.
    Deny { reason: String },
    /// Restart the chain towards route key `to`.
    Redirect { to: String, reason: Option<String> },
}

impl NavigationAction {
    /// Stop the navigation, giving a reason for the logs.
    pub fn deny(reason: impl Into<String>) -> Self {
        Self::Deny {
            reason: reason.into(),
        }
    }

    /// Abandon the navigation and start a new one to the route key `to`.
    pub fn redirect(to: impl Into<String>) -> Self {
        Self::Redirect {
            to: to.into(),
            reason: None,
        }
    }

    /// Redirect and record why, for the logs.
    pub fn redirect_with_reason(to: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Redirect {
            to: to.into(),
            reason: Some(reason.into()),
        }
    }

    /// `true` only for [`Continue`](Self::Continue).
    pub fn allows(&self) -> bool {
        *self == Self::Continue
    }

    /// Target key when this is a redirect.
    pub fn redirect_key(&self) -> Option<&str> {
        if let Self::Redirect { to, .. } = self {
            Some(to)
        } else {
            None
        }
    }
}

/// One-shot decision handle given to a before-navigate hook.
///
/// Clones share the same slot, so a hook may hand a clone to a dialog or a
/// spawned task. The first `proceed`/`deny`/`redirect` across all clones wins.
/// If every clone is dropped unresolved, the navigation is treated as denied.
///
/// ```
/// use villa_navigator::Continuation;
///
/// let (next, _decision) = Continuation::new("unsaved-changes");
/// assert!(next.proceed());
/// assert!(!next.deny("too late"));
/// assert!(next.is_resolved());
/// ```
#[derive(Clone)]
pub struct Continuation {
    slot: Arc<Mutex<Option<oneshot::Sender<NavigationAction>>>>,
    hook: Arc<str>,
}

impl Continuation {
    /// Create a continuation for the hook named `hook` and the receiver that
    /// observes its decision.
    pub fn new(hook: &str) -> (Self, oneshot::Receiver<NavigationAction>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                slot: Arc::new(Mutex::new(Some(tx))),
                hook: Arc::from(hook),
            },
            rx,
        )
    }

    /// Let the navigation continue. Returns `false` if already resolved.
    pub fn proceed(&self) -> bool {
        self.resolve(NavigationAction::Continue)
    }

    /// Veto the navigation. Returns `false` if already resolved.
    pub fn deny(&self, reason: impl Into<String>) -> bool {
        self.resolve(NavigationAction::deny(reason))
    }

    /// Redirect to another route key. Returns `false` if already resolved.
    pub fn redirect(&self, key: impl Into<String>) -> bool {
        self.resolve(NavigationAction::redirect(key))
    }

    /// Report an arbitrary decision. Only the first call across all clones
    /// is delivered.
    pub fn resolve(&self, action: NavigationAction) -> bool {
        let Some(tx) = self.slot.lock().take() else {
            trace_log!("Hook '{}' resolved its continuation again, ignored", self.hook);
            return false;
        };
        // The receiver is gone when the navigation was superseded or cancelled.
        let _ = tx.send(action);
        true
    }

    /// Return `true` once a decision has been reported.
    pub fn is_resolved(&self) -> bool {
        self.slot.lock().is_none()
    }

    /// Name of the hook this continuation belongs to.
    pub fn hook(&self) -> &str {
        &self.hook
    }
}

impl std::fmt::Debug for Continuation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Continuation")
            .field("hook", &self.hook)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}
