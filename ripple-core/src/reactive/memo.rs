//! Memo Implementation
//!
//! A memo is a cached derived value. It is a computation (it reads other
//! cells) and a cell (others read it) at the same time.
//!
//! # How Memos Work
//!
//! 1. On creation, the memo runs its computation once and caches the result.
//!
//! 2. When a direct source changes, the memo is marked Stale. When something
//!    further upstream changes, it is marked Pending ("maybe dirty").
//!
//! 3. On the next read, a Stale memo recomputes. A Pending memo first checks
//!    its sources; it recomputes only if one of them really changed.
//!
//! 4. A recomputed value the comparator considers equal to the cached one
//!    does not notify observers.
//!
//! # Why This Matters
//!
//! This lazy approach avoids unnecessary recomputation:
//!
//! - A signal changes
//! - 10 memos depend on it
//! - Only the memos that are observed or read will recompute
//! - Memos that are never read stay dirty (no wasted work)

use std::cell::RefCell;
use std::fmt::{self, Debug};
use std::rc::Rc;

use crate::error::{ReactiveError, Result};
use crate::graph::{ComputationKind, Compute, NodeId, NodeState};

use super::context::untrack;
use super::runtime::Runtime;
use super::signal::MemoOptions;

/// The typed half of a memo node: its body and cached value.
struct MemoInner<T> {
    f: Box<dyn Fn(Option<&T>) -> T>,
    value: RefCell<Option<T>>,
    options: MemoOptions<T>,
}

impl<T> Compute for MemoInner<T> {
    fn run(&self) -> bool {
        let next = {
            let previous = self.value.borrow();
            (self.f)(previous.as_ref())
        };
        let changed = match self.value.borrow().as_ref() {
            Some(current) => self.options.is_change(current, &next),
            None => true,
        };
        if changed {
            let previous = self.value.replace(Some(next));
            drop(previous);
        }
        changed
    }
}

/// Create a memo compared with `PartialEq`.
///
/// `f` receives the previously cached value (`None` on the first run).
///
/// # Example
///
/// ```rust
/// use ripple_core::{create_memo, create_root, create_signal};
///
/// create_root(|_| {
///     let (count, set_count) = create_signal(2);
///     let squared = create_memo(move |_| count.get() * count.get());
///     assert_eq!(squared.get(), 4);
///
///     set_count.set(3).unwrap();
///     assert_eq!(squared.get(), 9);
/// });
/// ```
pub fn create_memo<T: PartialEq + 'static>(f: impl Fn(Option<&T>) -> T + 'static) -> Memo<T> {
    create_memo_with(f, MemoOptions::default())
}

/// Create a memo with explicit comparator options.
pub fn create_memo_with<T: 'static>(
    f: impl Fn(Option<&T>) -> T + 'static,
    options: MemoOptions<T>,
) -> Memo<T> {
    let inner = Rc::new(MemoInner {
        f: Box::new(f),
        value: RefCell::new(None),
        options,
    });
    let body: Rc<dyn Compute> = inner.clone();
    let id = Runtime::with(|runtime| {
        let id = runtime.create_computation(ComputationKind::Memo, body);
        runtime.run_initial(id);
        id
    });
    Memo { id, inner }
}

/// A cached derived value.
///
/// Memo handles are cheap to clone. The node itself belongs to the owner it
/// was created under and is disposed with it; a disposed memo keeps
/// returning its last value.
pub struct Memo<T> {
    id: NodeId,
    inner: Rc<MemoInner<T>>,
}

impl<T> Memo<T> {
    /// The memo's node in the graph.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Bring the memo up to date, track it, and borrow its value.
    pub fn try_with<R>(&self, f: impl FnOnce(&T) -> R) -> Result<R> {
        Runtime::with(|runtime| {
            runtime.update_if_necessary(self.id)?;
            runtime.track(self.id);
            Ok(())
        })?;
        let value = self.inner.value.borrow();
        match value.as_ref() {
            Some(value) => Ok(f(value)),
            None => Err(ReactiveError::MemoUnavailable { node: self.id }),
        }
    }

    /// Like [`try_with`](Self::try_with), but clones the value out.
    pub fn try_get(&self) -> Result<T>
    where
        T: Clone,
    {
        self.try_with(T::clone)
    }

    /// Read the current value, tracking this memo as a dependency.
    ///
    /// # Panics
    ///
    /// Panics if the memo has no value because its body never completed,
    /// or if the flush needed to bring it up to date failed. Use
    /// [`try_get`](Self::try_get) to handle those cases.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.try_get().unwrap_or_else(|err| panic!("{err}"))
    }

    /// Borrow the current value, tracking this memo as a dependency.
    ///
    /// # Panics
    ///
    /// Same as [`get`](Self::get).
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.try_with(f).unwrap_or_else(|err| panic!("{err}"))
    }

    /// Read the current value without creating a dependency.
    ///
    /// The memo is still brought up to date first.
    pub fn get_untracked(&self) -> T
    where
        T: Clone,
    {
        untrack(|| self.get())
    }

    /// The memo's staleness, or `None` once it has been disposed.
    pub fn state(&self) -> Option<NodeState> {
        Runtime::with(|runtime| runtime.state(self.id))
    }

    pub fn is_disposed(&self) -> bool {
        !Runtime::with(|runtime| runtime.is_live(self.id))
    }
}

impl<T> Clone for Memo<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Debug> Debug for Memo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memo")
            .field("id", &self.id)
            .field("value", &self.inner.value.borrow())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
