//! Ownership Scopes
//!
//! Every memo and effect belongs to the owner that was active when it was
//! created: a root, or the computation that was running. Disposing an owner
//! disposes everything it owns, depth-first, and then runs its cleanups.
//! A computation is also cleaned this way right before each re-run, so work
//! created by one run never outlives it.

use std::fmt;

use crate::graph::NodeId;

use super::context::ExecutionContext;
use super::runtime::Runtime;

/// Handle to the owner that was active at some point.
///
/// Deferred code (timers, callbacks from the outside) can use it with
/// [`run_with_owner`] to create work that is disposed with that owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Owner {
    id: NodeId,
}

impl Owner {
    pub fn id(&self) -> NodeId {
        self.id
    }
}

/// Disposes the root it was handed out for.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RootDisposer {
    id: NodeId,
}

impl RootDisposer {
    /// Dispose the root and everything created under it. Idempotent.
    pub fn dispose(&self) {
        tracing::debug!(root = %self.id, "disposing root");
        Runtime::with(|runtime| runtime.dispose(self.id));
    }

    pub fn is_disposed(&self) -> bool {
        !Runtime::with(|runtime| runtime.is_live(self.id))
    }
}

impl fmt::Debug for RootDisposer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RootDisposer").field(&self.id).finish()
    }
}

/// Create an ownership root and run `f` inside it.
///
/// `f` runs untracked. Everything it creates lives until the
/// [`RootDisposer`] is used; the root is not disposed with the owner that
/// was active when it was created.
///
/// # Example
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use ripple_core::{create_effect, create_root, create_signal};
///
/// let runs = Rc::new(Cell::new(0));
/// let counter = runs.clone();
/// let (count, set_count) = create_signal(0);
///
/// let dispose = create_root(move |dispose| {
///     create_effect(move || {
///         count.get();
///         counter.set(counter.get() + 1);
///     });
///     dispose
/// });
///
/// set_count.set(1).unwrap();
/// dispose.dispose();
/// set_count.set(2).unwrap();
/// assert_eq!(runs.get(), 2);
/// ```
pub fn create_root<R>(f: impl FnOnce(RootDisposer) -> R) -> R {
    Runtime::with(|runtime| {
        let id = runtime.create_root_node();
        let _context = runtime.enter_context(ExecutionContext::scope(Some(id)));
        f(RootDisposer { id })
    })
}

/// Run `f` under the shared unowned root.
///
/// Computations created directly inside `f` are never disposed by an owner,
/// and no warning is logged for them. Nothing is allocated per call.
pub fn create_root_unowned<R>(f: impl FnOnce() -> R) -> R {
    Runtime::with(|runtime| {
        let _context = runtime.enter_context(ExecutionContext::scope(Some(runtime.unowned())));
        f()
    })
}

/// Register `f` to run when the current owner is cleaned: before the owning
/// computation re-runs, or when the owner is disposed.
///
/// Cleanups of one owner run in the order they were registered.
pub fn on_cleanup(f: impl FnOnce() + 'static) {
    Runtime::with(|runtime| runtime.push_cleanup(Box::new(f)));
}

/// The owner currently active, if any.
pub fn get_owner() -> Option<Owner> {
    Runtime::with(|runtime| runtime.context().owner).map(|id| Owner { id })
}

/// Run `f` with `owner` as the active owner and no listener.
///
/// Returns `None` if the owner has been disposed since it was captured.
pub fn run_with_owner<R>(owner: &Owner, f: impl FnOnce() -> R) -> Option<R> {
    Runtime::with(|runtime| {
        if owner.id != runtime.unowned() && !runtime.is_live(owner.id) {
            return None;
        }
        let _context = runtime.enter_context(ExecutionContext::scope(Some(owner.id)));
        Some(f())
    })
}
