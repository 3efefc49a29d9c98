//! Node Store
//!
//! The store owns every node in the graph, indexed by `NodeId`, and performs
//! all edge surgery and marking. Nothing in here runs user code: marking only
//! flips states and fills queues, and edge removal only moves indices. That
//! lets the runtime hold a single mutable borrow of the store for the whole of
//! each operation.
//!
//! # Marking
//!
//! When a cell is written, each of its Clean observers becomes Stale and is
//! queued (memos to the updates queue, effects to the effects queue). If that
//! observer is itself a memo with observers, everything further downstream
//! becomes Pending rather than Stale: those nodes wait until their direct
//! source actually settles before deciding whether to re-run. This two-tier
//! marking is what keeps intermediate values from leaking into effects.

use std::collections::HashMap;

use crate::error::{ReactiveError, Result};

use super::edges::Edge;
use super::node::{Node, NodeId, NodeState};
use super::scheduler::UpdateScheduler;

/// All nodes of one runtime.
#[derive(Default)]
pub(crate) struct NodeStore {
    nodes: HashMap<NodeId, Node>,
}

impl NodeStore {
    /// Create an empty store.
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Add a node to the graph.
    pub(crate) fn insert(&mut self, node: Node) -> NodeId {
        let id = NodeId::new();
        self.nodes.insert(id, node);
        id
    }

    /// Remove a node from the graph entirely.
    ///
    /// Edges pointing at a removed node are left behind; every traversal
    /// skips ids that no longer resolve.
    pub(crate) fn remove(&mut self, id: NodeId) -> Option<Node> {
        self.nodes.remove(&id)
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Get a node only if it has not been disposed.
    pub(crate) fn live(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id).filter(|node| !node.is_disposed())
    }

    pub(crate) fn live_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id).filter(|node| !node.is_disposed())
    }

    /// The state of a live computation.
    pub(crate) fn state(&self, id: NodeId) -> Option<NodeState> {
        self.live(id).and_then(Node::state)
    }

    pub(crate) fn set_state(&mut self, id: NodeId, state: NodeState) {
        if let Some(computation) = self.live_mut(id).and_then(Node::computation_mut) {
            computation.state = state;
        }
    }

    /// Total number of nodes, disposed tombstones included.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Record that `observer` read `source`.
    ///
    /// Pushes one entry onto each side; each entry remembers where its
    /// partner lives. Repeated reads create repeated edges, which are removed
    /// together when the observer is cleaned.
    pub(crate) fn link(&mut self, source: NodeId, observer: NodeId) {
        let Some(source_slot) = self
            .live(observer)
            .and_then(Node::computation)
            .map(|computation| computation.sources.len())
        else {
            return;
        };
        let Some(observers) = self.live_mut(source).and_then(Node::observers_mut) else {
            return;
        };
        let observer_slot = observers.push(Edge::new(observer, source_slot));
        if let Some(computation) = self.get_mut(observer).and_then(Node::computation_mut) {
            computation.sources.push(Edge::new(source, observer_slot));
        }
    }

    /// Sever every source edge of `observer` in O(1) per edge.
    ///
    /// Edges are popped from the observer's own list one at a time, so when
    /// the moved entry belongs to the same observer (a cell read twice) its
    /// patch lands on an entry that is still in place.
    pub(crate) fn unlink_sources(&mut self, observer: NodeId) {
        loop {
            let Some(edge) = self
                .get_mut(observer)
                .and_then(Node::computation_mut)
                .and_then(|computation| computation.sources.pop())
            else {
                break;
            };
            let moved = self
                .get_mut(edge.node)
                .and_then(Node::observers_mut)
                .and_then(|observers| observers.swap_remove(edge.slot));
            if let Some(moved) = moved {
                let computation = self.get_mut(moved.node).and_then(Node::computation_mut);
                if let Some(computation) = computation {
                    computation.sources.set_slot(moved.slot, edge.slot);
                }
            }
        }
    }

    /// Record `child` as owned by `owner`.
    pub(crate) fn adopt(&mut self, owner: NodeId, child: NodeId) {
        let Some(owned) = self.get_mut(owner).and_then(Node::scope_mut).map(|s| &mut s.owned) else {
            return;
        };
        let slot = owned.len();
        owned.push(child);
        if let Some(scope) = self.get_mut(child).and_then(Node::scope_mut) {
            scope.slot = slot;
        }
    }

    /// Remove `child` from its owner's list in O(1).
    ///
    /// Does nothing when the owner does not hold it: roots and unowned work
    /// were never adopted, and an owner being cleaned has already taken its
    /// list.
    pub(crate) fn orphan(&mut self, child: NodeId) {
        let Some((Some(parent), slot)) = self
            .get(child)
            .and_then(Node::scope)
            .map(|scope| (scope.parent, scope.slot))
        else {
            return;
        };
        let Some(owned) = self.get_mut(parent).and_then(Node::scope_mut).map(|s| &mut s.owned)
        else {
            return;
        };
        if owned.get(slot) != Some(&child) {
            return;
        }
        owned.swap_remove(slot);
        let moved = owned.get(slot).copied();
        if let Some(scope) = moved.and_then(|id| self.get_mut(id)).and_then(Node::scope_mut) {
            scope.slot = slot;
        }
    }

    /// Mark the direct observers of a written cell.
    ///
    /// Returns how many nodes were newly queued.
    pub(crate) fn mark_observers(
        &mut self,
        source: NodeId,
        queues: &mut UpdateScheduler,
        max_depth: usize,
    ) -> Result<usize> {
        let Some(observers) = self.live(source).and_then(Node::observers).map(|o| o.nodes()) else {
            return Ok(0);
        };
        let mut queued = 0;
        for id in observers {
            let Some(node) = self.live_mut(id) else {
                continue;
            };
            let is_memo = node.is_memo();
            let has_observers = node.has_observers();
            let Some(computation) = node.computation_mut() else {
                continue;
            };
            let was_clean = computation.state == NodeState::Clean;
            computation.state = NodeState::Stale;
            if was_clean {
                queued += 1;
                if is_memo {
                    queues.push_update(id);
                } else {
                    queues.push_effect(id);
                }
            }
            // A memo left dirty by an aborted flush still has to reach its
            // observers; clean ones are skipped inside, so this stays cheap.
            if has_observers {
                queued += self.mark_downstream(id, queues, max_depth)?;
            }
        }
        Ok(queued)
    }

    /// Mark everything downstream of a stale memo as Pending.
    ///
    /// Walks depth-first over an explicit stack, so the queues receive nodes
    /// in the same order a recursive walk would produce and long chains
    /// cannot exhaust the native stack. `depth` counts memo hops from the
    /// written cell.
    fn mark_downstream(
        &mut self,
        memo: NodeId,
        queues: &mut UpdateScheduler,
        max_depth: usize,
    ) -> Result<usize> {
        let mut stack = Vec::new();
        self.push_observers(memo, 1, max_depth, &mut stack)?;
        let mut queued = 0;
        while let Some((id, depth)) = stack.pop() {
            let Some(node) = self.live_mut(id) else {
                continue;
            };
            let is_memo = node.is_memo();
            let has_observers = node.has_observers();
            let Some(computation) = node.computation_mut() else {
                continue;
            };
            if computation.state != NodeState::Clean {
                continue;
            }
            computation.state = NodeState::Pending;
            queued += 1;
            if is_memo {
                queues.push_update(id);
            } else {
                queues.push_effect(id);
            }
            if has_observers {
                self.push_observers(id, depth + 1, max_depth, &mut stack)?;
            }
        }
        Ok(queued)
    }

    /// Schedule the observers of `memo` for a visit at `depth`, first
    /// observer on top.
    fn push_observers(
        &self,
        memo: NodeId,
        depth: usize,
        max_depth: usize,
        stack: &mut Vec<(NodeId, usize)>,
    ) -> Result<()> {
        if depth > max_depth {
            return Err(ReactiveError::MarkDepthExceeded { depth });
        }
        if let Some(observers) = self.live(memo).and_then(Node::observers) {
            stack.extend(observers.iter().rev().map(|edge| (edge.node, depth)));
        }
        Ok(())
    }

    /// Check that every edge's slot points back at its partner.
    #[cfg(test)]
    pub(crate) fn edges_consistent(&self) -> bool {
        self.nodes.iter().all(|(id, node)| {
            let observers_ok = node.observers().map_or(true, |observers| {
                observers.iter().enumerate().all(|(slot, edge)| {
                    match self.get(edge.node).and_then(Node::computation) {
                        Some(computation) => computation
                            .sources
                            .get(edge.slot)
                            .is_some_and(|back| back.node == *id && back.slot == slot),
                        None => true,
                    }
                })
            });
            let sources_ok = node.computation().map_or(true, |computation| {
                computation.sources.iter().enumerate().all(|(slot, edge)| {
                    match self.get(edge.node).and_then(Node::observers) {
                        Some(observers) => observers
                            .get(edge.slot)
                            .is_some_and(|back| back.node == *id && back.slot == slot),
                        None => true,
                    }
                })
            });
            observers_ok && sources_ok
        })
    }
}
