//! Overlay dialogs that resolve an awaited future exactly once.
//!
//! [`DialogHost::open_dialog`] calls a renderer with a [`CloseHandle`] and
//! pushes the returned view onto the overlay stack. The caller awaits the
//! returned [`DialogFuture`]; the first [`CloseHandle::close`] resolves it and
//! removes the overlay. Later calls return `false` and do nothing.
//!
//! A renderer that returns `Err` or panics never leaves the caller hanging:
//! the future resolves with a [`DialogError`] and no overlay remains.
//!
//! ```
//! use villa_navigator::DialogHost;
//!
//! let host: DialogHost<String> = DialogHost::new();
//! let answer = host.open_dialog(|close| {
//!     close.close(42);
//!     Ok("Confirm booking".to_string())
//! });
//! assert_eq!(pollster::block_on(answer), Ok(42));
//! assert!(host.is_empty());
//! ```

use crate::error::{DialogError, RenderError};
use crate::{debug_log, trace_log, warn_log};
use futures::channel::oneshot;
use futures::FutureExt;
use parking_lot::Mutex;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};

/// Removes an overlay from its host's stack by id.
type Teardown = Arc<dyn Fn(DialogId) + Send + Sync>;

/// Identifies one overlay on a [`DialogHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DialogId(u64);

impl fmt::Display for DialogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dialog#{}", self.0)
    }
}

// ============================================================================
// Overlay
// ============================================================================

/// One entry of the overlay stack.
pub struct Overlay<V> {
    id: DialogId,
    view: Arc<V>,
    /// Drops the result sender; `None` for blocking overlays.
    dismiss: Option<Arc<dyn Fn() + Send + Sync>>,
}

impl<V> Overlay<V> {
    /// Id of the dialog this overlay renders.
    pub fn id(&self) -> DialogId {
        self.id
    }

    /// The rendered dialog view.
    pub fn view(&self) -> &V {
        &self.view
    }

    /// `false` for overlays opened with [`DialogHost::open_blocking`].
    pub fn is_closeable(&self) -> bool {
        self.dismiss.is_some()
    }
}

impl<V> Clone for Overlay<V> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            view: Arc::clone(&self.view),
            dismiss: self.dismiss.clone(),
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for Overlay<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Overlay")
            .field("id", &self.id)
            .field("view", &self.view)
            .field("closeable", &self.is_closeable())
            .finish()
    }
}

// ============================================================================
// CloseHandle
// ============================================================================

/// Shared by every clone of a [`CloseHandle`]. Dropping the last clone
/// removes the overlay and drops the sender.
struct Resolver<T> {
    id: DialogId,
    sender: Mutex<Option<oneshot::Sender<T>>>,
    teardown: Teardown,
}

impl<T> Drop for Resolver<T> {
    fn drop(&mut self) {
        if self.sender.get_mut().is_some() {
            debug_log!("{} abandoned without a result", self.id);
        }
        (self.teardown)(self.id);
    }
}

/// One-shot resolver passed to a dialog renderer.
///
/// Clones share the same slot. Dropping every clone without closing resolves
/// the dialog with [`DialogError::Dismissed`].
pub struct CloseHandle<T> {
    inner: Arc<Resolver<T>>,
}

impl<T> CloseHandle<T> {
    /// Resolve the dialog with `value` and remove its overlay.
    ///
    /// Returns `false` if the dialog was already resolved or dismissed.
    pub fn close(&self, value: T) -> bool {
        let Some(tx) = self.inner.sender.lock().take() else {
            trace_log!("{} closed again, ignored", self.inner.id);
            return false;
        };
        (self.inner.teardown)(self.inner.id);
        // The caller may have stopped waiting.
        let _ = tx.send(value);
        debug_log!("{} closed", self.inner.id);
        true
    }

    /// Return `true` once the dialog has been resolved or dismissed.
    pub fn is_closed(&self) -> bool {
        self.inner.sender.lock().is_none()
    }

    /// Id of the dialog this handle closes.
    pub fn id(&self) -> DialogId {
        self.inner.id
    }
}

impl<T> Clone for CloseHandle<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for CloseHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloseHandle")
            .field("id", &self.inner.id)
            .field("closed", &self.is_closed())
            .finish()
    }
}

// ============================================================================
// DialogFuture
// ============================================================================

enum Outcome<T> {
    Waiting(oneshot::Receiver<T>),
    Failed(Option<DialogError>),
}

/// Result of [`DialogHost::open_dialog`]. Resolves once.
#[must_use = "a dialog result is lost unless the future is awaited"]
pub struct DialogFuture<T> {
    id: DialogId,
    outcome: Outcome<T>,
    teardown: Teardown,
}

impl<T> DialogFuture<T> {
    /// Id of the dialog this future waits on.
    pub fn id(&self) -> DialogId {
        self.id
    }

    /// Stop waiting and remove the overlay. A later close through a
    /// surviving handle is discarded.
    pub fn abandon(self) {
        debug_log!("{} abandoned by its caller", self.id);
        (self.teardown)(self.id);
    }

    /// Wait at most `limit` for a result.
    ///
    /// On expiry the overlay is removed and the future resolves with
    /// [`DialogError::TimedOut`]. Requires a tokio runtime with timers.
    #[cfg(feature = "timeout")]
    pub async fn timeout(self, limit: std::time::Duration) -> Result<T, DialogError> {
        let id = self.id;
        let teardown = Arc::clone(&self.teardown);
        match crate::timeout::with_deadline(Some(limit), self).await {
            Ok(result) => result,
            Err(elapsed) => {
                warn_log!("{} got no result within {}ms", id, elapsed.millis());
                teardown(id);
                Err(DialogError::TimedOut {
                    after_ms: elapsed.millis(),
                })
            }
        }
    }
}

impl<T> Future for DialogFuture<T> {
    type Output = Result<T, DialogError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match &mut this.outcome {
            Outcome::Waiting(rx) => rx
                .poll_unpin(cx)
                .map(|received| received.map_err(|_canceled| DialogError::Dismissed)),
            Outcome::Failed(err) => Poll::Ready(Err(err.take().unwrap_or(DialogError::Dismissed))),
        }
    }
}

impl<T> fmt::Debug for DialogFuture<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogFuture")
            .field("id", &self.id)
            .field("failed", &matches!(self.outcome, Outcome::Failed(_)))
            .finish()
    }
}

// ============================================================================
// BlockingOverlay
// ============================================================================

/// Guard for an overlay without a close handle, such as a loading indicator.
///
/// The overlay is removed when the guard is dismissed or dropped.
#[must_use = "dropping the guard removes the overlay immediately"]
pub struct BlockingOverlay {
    id: DialogId,
    teardown: Teardown,
}

impl BlockingOverlay {
    /// Id of the overlay.
    pub fn id(&self) -> DialogId {
        self.id
    }

    /// Remove the overlay now.
    pub fn dismiss(self) {}
}

impl Drop for BlockingOverlay {
    fn drop(&mut self) {
        trace_log!("{} released", self.id);
        (self.teardown)(self.id);
    }
}

impl fmt::Debug for BlockingOverlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockingOverlay").field("id", &self.id).finish()
    }
}

// ============================================================================
// DialogHost
// ============================================================================

/// Overlay stack. Cheap to clone; clones share the stack.
pub struct DialogHost<V> {
    stack: Arc<Mutex<Vec<Overlay<V>>>>,
    next_id: Arc<AtomicU64>,
}

impl<V> Clone for DialogHost<V> {
    fn clone(&self) -> Self {
        Self {
            stack: Arc::clone(&self.stack),
            next_id: Arc::clone(&self.next_id),
        }
    }
}

impl<V> Default for DialogHost<V> {
    fn default() -> Self {
        Self {
            stack: Arc::new(Mutex::new(Vec::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl<V: Send + Sync + 'static> DialogHost<V> {
    /// Create a host with no open overlays.
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> DialogId {
        DialogId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn teardown(&self) -> Teardown {
        let stack: Weak<Mutex<Vec<Overlay<V>>>> = Arc::downgrade(&self.stack);
        Arc::new(move |id| {
            if let Some(stack) = stack.upgrade() {
                let removed = remove_overlay(&stack, id);
                // Views may own close handles; drop them outside the lock.
                drop(removed);
            }
        })
    }

    /// Open a dialog and return the future of its result.
    ///
    /// `render` receives the dialog's [`CloseHandle`] and returns the view to
    /// show. It may close the dialog before returning, in which case no
    /// overlay is pushed.
    pub fn open_dialog<T, F>(&self, render: F) -> DialogFuture<T>
    where
        T: Send + 'static,
        F: FnOnce(CloseHandle<T>) -> Result<V, RenderError>,
    {
        let id = self.next_id();
        let teardown = self.teardown();
        let (tx, rx) = oneshot::channel();
        let resolver = Arc::new(Resolver {
            id,
            sender: Mutex::new(Some(tx)),
            teardown: Arc::clone(&teardown),
        });
        let handle = CloseHandle {
            inner: Arc::clone(&resolver),
        };

        let failure = match catch_unwind(AssertUnwindSafe(|| render(handle))) {
            Ok(Ok(view)) => {
                let mut stack = self.stack.lock();
                // Closed during render, or no handle outlived the renderer.
                let open = resolver.sender.lock().is_some() && Arc::strong_count(&resolver) > 1;
                if open {
                    let weak = Arc::downgrade(&resolver);
                    stack.push(Overlay {
                        id,
                        view: Arc::new(view),
                        dismiss: Some(Arc::new(move || {
                            if let Some(resolver) = weak.upgrade() {
                                resolver.sender.lock().take();
                            }
                        })),
                    });
                    debug_log!("{} opened ({} overlays)", id, stack.len());
                } else {
                    debug_log!("{} finished while rendering, not shown", id);
                }
                None
            }
            Ok(Err(err)) => Some(DialogError::Render {
                message: err.to_string(),
            }),
            Err(payload) => Some(DialogError::RendererPanicked {
                message: panic_message(&*payload),
            }),
        };

        let outcome = match failure {
            None => Outcome::Waiting(rx),
            Some(err) => {
                warn_log!("{} failed to open: {}", id, err);
                resolver.sender.lock().take();
                Outcome::Failed(Some(err))
            }
        };
        DialogFuture {
            id,
            outcome,
            teardown,
        }
    }

    /// Show an overlay that has no close handle.
    pub fn open_blocking<F>(&self, render: F) -> BlockingOverlay
    where
        F: FnOnce() -> V,
    {
        let id = self.next_id();
        let view = render();
        let mut stack = self.stack.lock();
        stack.push(Overlay {
            id,
            view: Arc::new(view),
            dismiss: None,
        });
        debug_log!("{} opened as blocking ({} overlays)", id, stack.len());
        BlockingOverlay {
            id,
            teardown: self.teardown(),
        }
    }

    /// Snapshot of the overlay stack, bottom first.
    pub fn overlays(&self) -> Vec<Overlay<V>> {
        self.stack.lock().clone()
    }

    /// The topmost overlay.
    pub fn top(&self) -> Option<Overlay<V>> {
        self.stack.lock().last().cloned()
    }

    /// Number of open overlays.
    pub fn len(&self) -> usize {
        self.stack.lock().len()
    }

    /// Return `true` when no overlay is open.
    pub fn is_empty(&self) -> bool {
        self.stack.lock().is_empty()
    }

    /// Return `true` while the dialog `id` is on the overlay stack.
    pub fn is_open(&self, id: DialogId) -> bool {
        self.stack.lock().iter().any(|overlay| overlay.id == id)
    }

    /// Remove a closeable overlay; its future resolves with `Dismissed`.
    ///
    /// Blocking overlays are owned by their guard and are left alone.
    pub fn dismiss(&self, id: DialogId) -> bool {
        let removed = {
            let mut stack = self.stack.lock();
            match stack
                .iter()
                .position(|overlay| overlay.id == id && overlay.is_closeable())
            {
                Some(index) => stack.remove(index),
                None => return false,
            }
        };
        if let Some(dismiss) = &removed.dismiss {
            dismiss();
        }
        debug_log!("{} dismissed", id);
        true
    }

    /// Dismiss every closeable overlay. Returns how many were removed.
    pub fn dismiss_all(&self) -> usize {
        let removed: Vec<Overlay<V>> = {
            let mut stack = self.stack.lock();
            let (closeable, blocking) = std::mem::take(&mut *stack)
                .into_iter()
                .partition(Overlay::is_closeable);
            *stack = blocking;
            closeable
        };
        for overlay in &removed {
            if let Some(dismiss) = &overlay.dismiss {
                dismiss();
            }
        }
        if !removed.is_empty() {
            debug_log!("Dismissed {} overlays", removed.len());
        }
        removed.len()
    }
}

impl<V> fmt::Debug for DialogHost<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<DialogId> = self.stack.lock().iter().map(|o| o.id).collect();
        f.debug_struct("DialogHost").field("overlays", &ids).finish()
    }
}

fn remove_overlay<V>(stack: &Mutex<Vec<Overlay<V>>>, id: DialogId) -> Option<Overlay<V>> {
    let mut stack = stack.lock();
    let index = stack.iter().position(|overlay| overlay.id == id)?;
    Some(stack.remove(index))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "renderer panicked".to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================
