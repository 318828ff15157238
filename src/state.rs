//! Navigator state: phase, active route, history and pending request.

use crate::route::RouteDescriptor;
use crate::RouteParams;
use futures::future::AbortHandle;
use std::fmt;
use std::sync::Arc;

/// Where the navigator is in its state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationPhase {
    /// Nothing committed yet, nothing pending
    Idle,
    /// Before hooks are running for `target`
    Resolving {
        target: String,
        navigation_id: usize,
    },
    /// A route is active and nothing is pending
    Committed,
}

impl NavigationPhase {
    /// Return `true` while a navigation is pending.
    pub fn is_resolving(&self) -> bool {
        matches!(self, NavigationPhase::Resolving { .. })
    }
}

/// The committed route.
pub struct ActiveRoute<V> {
    pub descriptor: Arc<RouteDescriptor<V>>,
    pub params: RouteParams,
    /// Application-relative path
    pub path: String,
    /// Address-bar path (base path + relative path)
    pub address: String,
}

impl<V> ActiveRoute<V> {
    /// Key of the committed route.
    pub fn key(&self) -> &str {
        self.descriptor.key()
    }

    /// Render the route's view.
    pub fn render(&self) -> V {
        self.descriptor.render(&self.params)
    }
}

impl<V> Clone for ActiveRoute<V> {
    fn clone(&self) -> Self {
        Self {
            descriptor: Arc::clone(&self.descriptor),
            params: self.params.clone(),
            path: self.path.clone(),
            address: self.address.clone(),
        }
    }
}

impl<V> fmt::Debug for ActiveRoute<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveRoute")
            .field("key", &self.key())
            .field("params", &self.params)
            .field("path", &self.path)
            .field("address", &self.address)
            .finish()
    }
}

/// One committed navigation in the history stack.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub key: String,
    pub params: RouteParams,
    pub path: String,
}

/// How a commit changes the history stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NavigateOp {
    Push,
    Replace,
    /// Move to an existing history index (back/forward)
    Traverse(usize),
}

/// Back/forward stack of committed entries.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<HistoryEntry>,
    current: Option<usize>,
}

impl History {
    /// Create an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry the navigator is on.
    pub fn current(&self) -> Option<&HistoryEntry> {
        self.current.map(|i| &self.entries[i])
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return `true` when nothing was committed yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Push an entry, dropping any forward history.
    pub fn push(&mut self, entry: HistoryEntry) {
        let next = self.current.map_or(0, |i| i + 1);
        self.entries.truncate(next);
        self.entries.push(entry);
        self.current = Some(next);
    }

    /// Replace the current entry (pushes when empty).
    pub fn replace(&mut self, entry: HistoryEntry) {
        match self.current {
            Some(i) => self.entries[i] = entry,
            None => self.push(entry),
        }
    }

    /// Index and entry one step back.
    pub fn peek_back(&self) -> Option<(usize, &HistoryEntry)> {
        let i = self.current?.checked_sub(1)?;
        Some((i, &self.entries[i]))
    }

    /// Index and entry one step forward.
    pub fn peek_forward(&self) -> Option<(usize, &HistoryEntry)> {
        let i = self.current? + 1;
        self.entries.get(i).map(|entry| (i, entry))
    }

    /// Return `true` if there is an entry behind the current one.
    pub fn can_go_back(&self) -> bool {
        self.peek_back().is_some()
    }

    /// Return `true` if there is an entry ahead of the current one.
    pub fn can_go_forward(&self) -> bool {
        self.peek_forward().is_some()
    }

    /// Move the cursor to `index`. Out-of-range indices are ignored.
    pub(crate) fn traverse(&mut self, index: usize) -> bool {
        if index < self.entries.len() {
            self.current = Some(index);
            true
        } else {
            false
        }
    }

    pub(crate) fn apply(&mut self, op: NavigateOp, entry: HistoryEntry) {
        match op {
            NavigateOp::Push => self.push(entry),
            NavigateOp::Replace => self.replace(entry),
            NavigateOp::Traverse(index) => {
                if !self.traverse(index) {
                    self.push(entry);
                }
            }
        }
    }
}

/// A navigation whose before hooks are still running.
#[derive(Debug)]
pub(crate) struct Pending {
    pub id: usize,
    pub key: String,
    pub abort: AbortHandle,
}

/// Mutable navigator state. Mutated only under the navigator's lock and never
/// across an await point.
pub(crate) struct NavigatorState<V> {
    pub phase: NavigationPhase,
    pub active: Option<ActiveRoute<V>>,
    pub history: History,
    pub pending: Option<Pending>,
    /// Incremented per request; a request commits only while its id is current.
    pub navigation_id: usize,
}

impl<V> NavigatorState<V> {
    /// Create an idle state with empty history.
    pub fn new() -> Self {
        Self {
            phase: NavigationPhase::Idle,
            active: None,
            history: History::new(),
            pending: None,
            navigation_id: 0,
        }
    }

    /// Start a new navigation and return its id.
    pub fn start_navigation(&mut self, key: &str, abort: AbortHandle) -> usize {
        self.navigation_id += 1;
        let id = self.navigation_id;
        self.pending = Some(Pending {
            id,
            key: key.to_string(),
            abort,
        });
        self.phase = NavigationPhase::Resolving {
            target: key.to_string(),
            navigation_id: id,
        };
        id
    }

    /// Check if a navigation is still current (not replaced by a newer one).
    pub fn is_navigation_current(&self, id: usize) -> bool {
        self.navigation_id == id
    }

    /// Point the pending navigation `id` at a redirect target.
    pub fn retarget(&mut self, id: usize, key: &str) {
        if let Some(pending) = self.pending.as_mut().filter(|p| p.id == id) {
            pending.key = key.to_string();
            self.phase = NavigationPhase::Resolving {
                target: key.to_string(),
                navigation_id: id,
            };
        }
    }

    /// Clear the pending slot of navigation `id` and settle the phase.
    pub fn finish_navigation(&mut self, id: usize) {
        if self.pending.as_ref().is_some_and(|p| p.id == id) {
            self.pending = None;
            self.phase = if self.active.is_some() {
                NavigationPhase::Committed
            } else {
                NavigationPhase::Idle
            };
        }
    }

    /// Install the committed route.
    pub fn commit(&mut self, active: ActiveRoute<V>, op: NavigateOp) {
        self.history.apply(
            op,
            HistoryEntry {
                key: active.key().to_string(),
                params: active.params.clone(),
                path: active.path.clone(),
            },
        );
        self.active = Some(active);
    }
}
