//! Effect Implementation
//!
//! An effect is a side-effecting computation that re-runs whenever its
//! dependencies change.
//!
//! # How Effects Work
//!
//! 1. When created, the effect runs immediately to establish its initial
//!    dependencies, even inside a `batch`.
//!
//! 2. When a dependency changes, the effect is queued. It runs once the
//!    flush has settled every memo of the same round.
//!
//! 3. Before re-running, the effect is cleaned: children it created are
//!    disposed, old dependencies are dropped and cleanups registered with
//!    `on_cleanup` run. Dependencies are tracked afresh during the run.
//!
//! # Differences from Memo
//!
//! - Memos return a value; effects do not.
//! - Memos are lazy (compute on access); effects are eager (run when deps change).
//! - Memos can be observed; nothing can observe an effect.

use std::rc::Rc;

use crate::graph::{ComputationKind, Compute, NodeId};

use super::runtime::Runtime;

struct EffectInner {
    f: Box<dyn Fn()>,
}

impl Compute for EffectInner {
    fn run(&self) -> bool {
        (self.f)();
        false
    }
}

/// Create an effect and run it once.
///
/// The effect belongs to the current owner and is disposed with it.
///
/// # Example
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use ripple_core::{create_effect, create_root, create_signal};
///
/// create_root(|_| {
///     let (count, set_count) = create_signal(0);
///     let seen = Rc::new(RefCell::new(Vec::new()));
///     let log = seen.clone();
///     create_effect(move || log.borrow_mut().push(count.get()));
///
///     set_count.set(5).unwrap();
///     assert_eq!(*seen.borrow(), vec![0, 5]);
/// });
/// ```
pub fn create_effect(f: impl Fn() + 'static) -> Effect {
    let body: Rc<dyn Compute> = Rc::new(EffectInner { f: Box::new(f) });
    let id = Runtime::with(|runtime| {
        let id = runtime.create_computation(ComputationKind::Effect, body);
        runtime.run_initial(id);
        id
    });
    Effect { id }
}

/// Handle to an effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Effect {
    id: NodeId,
}

impl Effect {
    /// The effect's node in the graph.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Stop the effect and run its cleanups. Further calls do nothing.
    pub fn dispose(&self) {
        Runtime::with(|runtime| runtime.dispose(self.id));
    }

    pub fn is_disposed(&self) -> bool {
        !Runtime::with(|runtime| runtime.is_live(self.id))
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
