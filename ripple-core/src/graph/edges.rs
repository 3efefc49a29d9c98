//! Indexed Edge Lists
//!
//! Every dependency in the graph is stored twice: once in the observer's
//! `sources` list and once in the source's `observers` list. Each entry
//! records the id of the node on the other side together with the *slot* the
//! matching entry occupies in that node's list.
//!
//! # Why Slots
//!
//! Keeping the back-pointer index on both sides makes removal O(1): the entry
//! to remove is found directly by its slot, the last entry is moved into the
//! hole, and only the moved entry's partner needs its slot patched. No list
//! is ever scanned.
//!
//! `EdgeList` is the single place where this swap-and-pop surgery lives. The
//! caller is responsible for patching the partner of the moved entry, because
//! the partner lives in a different node.

use smallvec::SmallVec;

use super::node::NodeId;

/// One half of a bidirectional edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    /// The node on the other side of the edge.
    pub node: NodeId,
    /// Index of the matching entry inside `node`'s opposite list.
    pub slot: usize,
}

impl Edge {
    /// Create an edge pointing at `node`, whose matching entry is at `slot`.
    pub fn new(node: NodeId, slot: usize) -> Self {
        Self { node, slot }
    }
}

/// An ordered list of edges supporting O(1) push and O(1) removal by slot.
///
/// Most computations read only a handful of cells, so the first few entries
/// live inline.
#[derive(Debug, Default, Clone)]
pub struct EdgeList {
    entries: SmallVec<[Edge; 4]>,
}

impl EdgeList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an edge and return the slot it was stored at.
    pub fn push(&mut self, edge: Edge) -> usize {
        let slot = self.entries.len();
        self.entries.push(edge);
        slot
    }

    /// Remove and return the last edge.
    pub fn pop(&mut self) -> Option<Edge> {
        self.entries.pop()
    }

    /// Remove the edge at `slot` by moving the last edge into its place.
    ///
    /// Returns the edge that was moved, if any. Its partner must be told that
    /// its entry now lives at `slot`. Returns `None` when `slot` was the last
    /// entry (nothing moved) or out of range.
    pub fn swap_remove(&mut self, slot: usize) -> Option<Edge> {
        if slot >= self.entries.len() {
            return None;
        }
        let last = self.entries.pop()?;
        if slot < self.entries.len() {
            self.entries[slot] = last;
            Some(last)
        } else {
            None
        }
    }

    /// Point the entry at `index` to a new partner slot.
    pub fn set_slot(&mut self, index: usize, slot: usize) {
        debug_assert!(index < self.entries.len(), "edge index {index} out of range");
        if let Some(edge) = self.entries.get_mut(index) {
            edge.slot = slot;
        }
    }

    /// Get the edge at `index`.
    pub fn get(&self, index: usize) -> Option<Edge> {
        self.entries.get(index).copied()
    }

    /// Number of edges.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the edges in slot order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = Edge> + '_ {
        self.entries.iter().copied()
    }

    /// Collect the node ids on the other side, in slot order.
    pub fn nodes(&self) -> Vec<NodeId> {
        self.entries.iter().map(|edge| edge.node).collect()
    }
}
