//! Execution Context
//!
//! The execution context records which computation is currently running (the
//! *listener*, which reads are attributed to) and which scope currently owns
//! newly created work (the *owner*). Usually both are the running
//! computation; `untrack` clears the listener, roots set an owner without a
//! listener.
//!
//! # Implementation
//!
//! The context is a small `Copy` value stored in the runtime. Entering a new
//! context swaps it in and returns a guard holding the previous one; dropping
//! the guard swaps it back. Because the restore happens in `Drop`, it also
//! happens when a computation panics and the panic is caught further up.

use std::cell::Cell;

use crate::graph::NodeId;

use super::runtime::Runtime;

/// Who is running right now.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ExecutionContext {
    /// The computation that reads are tracked against.
    pub(crate) listener: Option<NodeId>,
    /// The scope that newly created computations and cleanups attach to.
    pub(crate) owner: Option<NodeId>,
}

impl ExecutionContext {
    /// Context for running a computation: it both listens and owns.
    pub(crate) fn computation(id: NodeId) -> Self {
        Self {
            listener: Some(id),
            owner: Some(id),
        }
    }

    /// Context for running under an owner without tracking reads.
    pub(crate) fn scope(owner: Option<NodeId>) -> Self {
        Self {
            listener: None,
            owner,
        }
    }
}

/// Guard that restores the previous context when dropped.
pub(crate) struct ContextGuard<'a> {
    slot: &'a Cell<ExecutionContext>,
    previous: ExecutionContext,
}

impl<'a> ContextGuard<'a> {
    /// Install `next` in `slot` until the guard is dropped.
    pub(crate) fn enter(slot: &'a Cell<ExecutionContext>, next: ExecutionContext) -> Self {
        let previous = slot.replace(next);
        Self { slot, previous }
    }
}

impl Drop for ContextGuard<'_> {
    fn drop(&mut self) {
        self.slot.set(self.previous);
    }
}

/// Run `f` without tracking any reads it performs.
///
/// Signals and memos read inside `f` do not become dependencies of the
/// running computation. Work created inside `f` is still owned by the current
/// owner.
///
/// # Example
///
/// ```rust
/// use ripple_core::{create_effect, create_root, create_signal, untrack};
///
/// create_root(|_| {
///     let (a, set_a) = create_signal(1);
///     let (b, set_b) = create_signal(2);
///     create_effect(move || {
///         // Re-runs when `a` changes, not when `b` does.
///         let _sum = a.get() + untrack(|| b.get());
///     });
///     set_b.set(3).unwrap();
///     set_a.set(5).unwrap();
/// });
/// ```
pub fn untrack<R>(f: impl FnOnce() -> R) -> R {
    Runtime::with(|runtime| {
        let owner = runtime.context().owner;
        let _guard = runtime.enter_context(ExecutionContext::scope(owner));
        f()
    })
}

/// Whether a read performed right now would create a dependency.
pub fn is_tracking() -> bool {
    Runtime::with(|runtime| runtime.context().listener.is_some())
}

/// Build a computation body with explicit dependencies.
///
/// `deps` is the only tracked part. `f` runs untracked and receives the new
/// dependency value and the one from the previous run. The returned closure
/// is meant to be handed to [`create_effect`](crate::create_effect) or
/// [`create_memo`](crate::create_memo).
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use ripple_core::{create_effect, create_root, create_signal, on};
///
/// create_root(|_| {
///     let (count, set_count) = create_signal(0);
///     let seen = Rc::new(RefCell::new(Vec::new()));
///     let log = seen.clone();
///     create_effect(on(move || count.get(), move |now: &i32, before: Option<&i32>| {
///         log.borrow_mut().push((*now, before.copied()));
///     }));
///     set_count.set(1).unwrap();
///     assert_eq!(*seen.borrow(), vec![(0, None), (1, Some(0))]);
/// });
/// ```
pub fn on<D, R>(
    deps: impl Fn() -> D + 'static,
    f: impl Fn(&D, Option<&D>) -> R + 'static,
) -> impl Fn() -> R
where
    D: 'static,
{
    let previous = std::cell::RefCell::new(None::<D>);
    move || {
        let current = deps();
        let result = untrack(|| f(&current, previous.borrow().as_ref()));
        *previous.borrow_mut() = Some(current);
        result
    }
}
