//! Dependency Graph
//!
//! This module implements the graph that tracks relationships between value
//! cells and the computations that read them.
//!
//! # Overview
//!
//! - Nodes are value cells (signals), computations (memos, effects) or
//!   ownership roots.
//! - A read creates an edge from the cell to the reading computation. Edges
//!   are stored on both sides with back-pointer slots, so adding and removing
//!   one is O(1).
//! - Ownership is a separate tree: every computation remembers the owner it
//!   was created under and every owner lists what it created.
//!
//! # Design Decisions
//!
//! 1. We use a centralized store rather than reference-counted node objects:
//!    - it keeps the graph free of `Rc` cycles between cells and observers
//!    - a disposed node can be removed without chasing pointers
//!
//! 2. The store is indexed by node ID for O(1) lookups.
//!
//! 3. Graph operations never run user code, so the runtime can perform each
//!    of them under a single borrow.

mod edges;
mod node;
mod scheduler;
mod store;

pub use edges::{Edge, EdgeList};
pub use node::{ComputationKind, NodeId, NodeState};

pub(crate) use node::{Cleanup, Compute, Node};
pub(crate) use scheduler::UpdateScheduler;
pub(crate) use store::NodeStore;
