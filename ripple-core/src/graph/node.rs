//! Graph Nodes
//!
//! This module defines the node types that live in the dependency graph.
//!
//! A node is one of four kinds:
//!
//! - `Signal`: a value cell. It only has observers.
//! - `Memo`: a pure computation that is also a value cell. It has sources,
//!   observers, and owns the work it creates.
//! - `Effect`: an impure computation. It has sources and owns work, but can
//!   never be observed.
//! - `Root`: an ownership scope with no computation attached.
//!
//! The kind is a tagged variant, so an effect with observers cannot be
//! represented.

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use super::edges::EdgeList;

/// Unique identifier for a node in the dependency graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Generate a new unique node ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Staleness of a computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeState {
    /// The computation is up to date.
    Clean,

    /// One of the computation's direct sources changed. It must re-run.
    Stale,

    /// Something further upstream changed. The direct sources have to settle
    /// before we know whether this computation must re-run.
    Pending,
}

/// The two kinds of computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComputationKind {
    /// A pure, cached, observable computation.
    Memo,
    /// A side-effecting computation.
    Effect,
}

impl fmt::Display for ComputationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComputationKind::Memo => f.write_str("memo"),
            ComputationKind::Effect => f.write_str("effect"),
        }
    }
}

/// The body of a computation, type-erased.
///
/// Implementations hold the user closure and, for memos, the cached value.
pub(crate) trait Compute {
    /// Run the body once.
    ///
    /// Returns `true` when the run produced an observable change, i.e. a memo
    /// whose new value differs from the cached one. Effects return `false`.
    fn run(&self) -> bool;
}

/// A cleanup callback registered against an owner.
pub(crate) type Cleanup = Box<dyn FnOnce()>;

/// Ownership data shared by roots and computations.
#[derive(Default)]
pub(crate) struct Scope {
    /// The owner this scope was created under.
    pub(crate) parent: Option<NodeId>,
    /// Computations created while this scope was the active owner.
    pub(crate) owned: Vec<NodeId>,
    /// Index of this node in its parent's `owned` list.
    pub(crate) slot: usize,
    /// Callbacks to run when this scope is cleaned.
    pub(crate) cleanups: Vec<Cleanup>,
}

impl Scope {
    /// Create an empty scope under `parent`.
    pub(crate) fn new(parent: Option<NodeId>) -> Self {
        Self {
            parent,
            owned: Vec::new(),
            slot: 0,
            cleanups: Vec::new(),
        }
    }
}

/// The computation half of a memo or effect node.
pub(crate) struct Computation {
    pub(crate) state: NodeState,
    /// Cells and memos read during the last run.
    pub(crate) sources: EdgeList,
    pub(crate) scope: Scope,
    /// Epoch of the last completed run, `None` before the first run.
    pub(crate) updated_at: Option<u64>,
    /// Dropped on disposal.
    pub(crate) body: Option<Rc<dyn Compute>>,
}

impl Computation {
    fn new(body: Rc<dyn Compute>, owner: Option<NodeId>) -> Self {
        Self {
            state: NodeState::Clean,
            sources: EdgeList::new(),
            scope: Scope::new(owner),
            updated_at: None,
            body: Some(body),
        }
    }
}

/// What a node is.
pub(crate) enum NodeKind {
    Signal {
        observers: EdgeList,
    },
    Memo {
        computation: Computation,
        observers: EdgeList,
    },
    Effect {
        computation: Computation,
    },
    Root {
        scope: Scope,
    },
}

/// A node in the dependency graph.
pub(crate) struct Node {
    kind: NodeKind,
    /// Set once the node has been disposed. A disposed node may still sit in
    /// a queue until the flush that holds it finishes.
    disposed: bool,
}

impl Node {
    fn with_kind(kind: NodeKind) -> Self {
        Self {
            kind,
            disposed: false,
        }
    }

    /// Create a value cell node.
    pub(crate) fn signal() -> Self {
        Self::with_kind(NodeKind::Signal {
            observers: EdgeList::new(),
        })
    }

    /// Create a memo node owned by `owner`.
    pub(crate) fn memo(body: Rc<dyn Compute>, owner: Option<NodeId>) -> Self {
        Self::with_kind(NodeKind::Memo {
            computation: Computation::new(body, owner),
            observers: EdgeList::new(),
        })
    }

    /// Create an effect node owned by `owner`.
    pub(crate) fn effect(body: Rc<dyn Compute>, owner: Option<NodeId>) -> Self {
        Self::with_kind(NodeKind::Effect {
            computation: Computation::new(body, owner),
        })
    }

    /// Create a root scope under `parent`.
    pub(crate) fn root(parent: Option<NodeId>) -> Self {
        Self::with_kind(NodeKind::Root {
            scope: Scope::new(parent),
        })
    }

    /// Whether the node has been disposed.
    pub(crate) fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub(crate) fn mark_disposed(&mut self) {
        self.disposed = true;
    }

    /// The computation kind, if this node is a computation.
    pub(crate) fn computation_kind(&self) -> Option<ComputationKind> {
        match self.kind {
            NodeKind::Memo { .. } => Some(ComputationKind::Memo),
            NodeKind::Effect { .. } => Some(ComputationKind::Effect),
            NodeKind::Signal { .. } | NodeKind::Root { .. } => None,
        }
    }

    /// Whether this node is a memo.
    pub(crate) fn is_memo(&self) -> bool {
        matches!(self.kind, NodeKind::Memo { .. })
    }

    pub(crate) fn computation(&self) -> Option<&Computation> {
        match &self.kind {
            NodeKind::Memo { computation, .. } | NodeKind::Effect { computation } => {
                Some(computation)
            }
            NodeKind::Signal { .. } | NodeKind::Root { .. } => None,
        }
    }

    pub(crate) fn computation_mut(&mut self) -> Option<&mut Computation> {
        match &mut self.kind {
            NodeKind::Memo { computation, .. } | NodeKind::Effect { computation } => {
                Some(computation)
            }
            NodeKind::Signal { .. } | NodeKind::Root { .. } => None,
        }
    }

    pub(crate) fn observers(&self) -> Option<&EdgeList> {
        match &self.kind {
            NodeKind::Signal { observers } | NodeKind::Memo { observers, .. } => Some(observers),
            NodeKind::Effect { .. } | NodeKind::Root { .. } => None,
        }
    }

    pub(crate) fn observers_mut(&mut self) -> Option<&mut EdgeList> {
        match &mut self.kind {
            NodeKind::Signal { observers } | NodeKind::Memo { observers, .. } => Some(observers),
            NodeKind::Effect { .. } | NodeKind::Root { .. } => None,
        }
    }

    /// Whether anything currently observes this node.
    pub(crate) fn has_observers(&self) -> bool {
        self.observers().is_some_and(|observers| !observers.is_empty())
    }

    /// The ownership scope of a root or computation.
    pub(crate) fn scope(&self) -> Option<&Scope> {
        match &self.kind {
            NodeKind::Root { scope } => Some(scope),
            NodeKind::Memo { computation, .. } | NodeKind::Effect { computation } => {
                Some(&computation.scope)
            }
            NodeKind::Signal { .. } => None,
        }
    }

    pub(crate) fn scope_mut(&mut self) -> Option<&mut Scope> {
        match &mut self.kind {
            NodeKind::Root { scope } => Some(scope),
            NodeKind::Memo { computation, .. } | NodeKind::Effect { computation } => {
                Some(&mut computation.scope)
            }
            NodeKind::Signal { .. } => None,
        }
    }

    /// The staleness state, if this node is a computation.
    pub(crate) fn state(&self) -> Option<NodeState> {
        self.computation().map(|computation| computation.state)
    }

    /// The owner this node was created under.
    pub(crate) fn parent(&self) -> Option<NodeId> {
        self.scope().and_then(|scope| scope.parent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    impl Compute for Noop {
        fn run(&self) -> bool {
            false
        }
    }

    #[test]
    fn node_ids_are_unique() {
        let id1 = NodeId::new();
        let id2 = NodeId::new();
        assert_ne!(id1, id2);
        assert!(id2.raw() > id1.raw());
    }

    #[test]
    fn signal_node_has_observers_but_no_computation() {
        let node = Node::signal();
        assert!(node.observers().is_some());
        assert!(node.computation().is_none());
        assert!(node.scope().is_none());
        assert_eq!(node.state(), None);
        assert!(!node.has_observers());
    }

    #[test]
    fn memo_node_is_both_cell_and_computation() {
        let owner = NodeId::new();
        let node = Node::memo(Rc::new(Noop), Some(owner));
        assert!(node.is_memo());
        assert!(node.observers().is_some());
        assert_eq!(node.state(), Some(NodeState::Clean));
        assert_eq!(node.parent(), Some(owner));
        assert_eq!(node.computation_kind(), Some(ComputationKind::Memo));
    }

    #[test]
    fn effect_node_cannot_be_observed() {
        let node = Node::effect(Rc::new(Noop), None);
        assert!(node.observers().is_none());
        assert!(!node.has_observers());
        assert_eq!(node.computation_kind(), Some(ComputationKind::Effect));
    }

    #[test]
    fn root_node_owns_but_does_not_compute() {
        let mut node = Node::root(None);
        assert!(node.computation().is_none());
        node.scope_mut().unwrap().owned.push(NodeId::new());
        assert_eq!(node.scope().unwrap().owned.len(), 1);
    }

    #[test]
    fn disposal_flag_sticks() {
        let mut node = Node::effect(Rc::new(Noop), None);
        assert!(!node.is_disposed());
        node.mark_disposed();
        assert!(node.is_disposed());
    }
}
