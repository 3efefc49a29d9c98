//! Update Scheduler
//!
//! The scheduler holds the two queues a flush drains and the counters that
//! decide when a flush happens.
//!
//! # Algorithm
//!
//! 1. A write (or `batch`) *enters* the scheduler. Only the outermost entry,
//!    made while no flush is running, is responsible for flushing.
//! 2. Marking fills the queues: memos go to `updates`, effects to `effects`.
//! 3. The flush drains `updates` first, so every observed memo is settled
//!    before any effect of the same round runs.
//! 4. It then takes the whole `effects` queue and runs it. Writes made by
//!    those effects land in fresh queues, which the next round drains.
//! 5. Rounds repeat until both queues are empty.
//!
//! Each round bumps the epoch. Computations stamp the epoch of their last
//! run, which lets the runtime tell whether an owner already ran this round.

use super::node::NodeId;

/// Queues and counters for one runtime.
#[derive(Debug, Default)]
pub(crate) struct UpdateScheduler {
    /// Memos waiting to be settled this round.
    updates: Vec<NodeId>,
    /// Effects waiting for the next effects round.
    effects: Vec<NodeId>,
    /// Nesting depth of `batch`/write scopes.
    depth: usize,
    /// Whether a flush is currently draining the queues.
    flushing: bool,
    epoch: u64,
    /// Disposed nodes whose removal waits until no queue can reference them.
    graveyard: Vec<NodeId>,
}

impl UpdateScheduler {
    /// Create an idle scheduler.
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Enter a write scope.
    ///
    /// Returns `true` when the caller is the outermost scope and must flush
    /// once it exits.
    pub(crate) fn enter(&mut self) -> bool {
        self.depth += 1;
        self.depth == 1 && !self.flushing
    }

    /// Leave a write scope.
    pub(crate) fn exit(&mut self) {
        debug_assert!(self.depth > 0, "unbalanced scheduler exit");
        self.depth = self.depth.saturating_sub(1);
    }

    /// Whether writes are currently being collected rather than flushed.
    pub(crate) fn is_open(&self) -> bool {
        self.depth > 0 || self.flushing
    }

    pub(crate) fn is_flushing(&self) -> bool {
        self.flushing
    }

    pub(crate) fn begin_flush(&mut self) {
        self.flushing = true;
    }

    pub(crate) fn end_flush(&mut self) {
        self.flushing = false;
    }

    pub(crate) fn push_update(&mut self, id: NodeId) {
        self.updates.push(id);
    }

    pub(crate) fn push_effect(&mut self, id: NodeId) {
        self.effects.push(id);
    }

    /// Read the updates queue by index; it may grow while being drained.
    pub(crate) fn update_at(&self, index: usize) -> Option<NodeId> {
        self.updates.get(index).copied()
    }

    pub(crate) fn clear_updates(&mut self) {
        self.updates.clear();
    }

    /// Take the whole effects queue, leaving a fresh one for new writes.
    pub(crate) fn take_effects(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.effects)
    }

    pub(crate) fn has_pending(&self) -> bool {
        !self.updates.is_empty() || !self.effects.is_empty()
    }

    /// The current epoch.
    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Start a new epoch and return it.
    pub(crate) fn next_epoch(&mut self) -> u64 {
        self.epoch += 1;
        self.epoch
    }

    /// Defer removal of a disposed node.
    pub(crate) fn bury(&mut self, id: NodeId) {
        self.graveyard.push(id);
    }

    pub(crate) fn take_graveyard(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.graveyard)
    }

    /// Drop everything queued after a fatal flush error.
    ///
    /// Returns the dropped ids so their states can be reset.
    pub(crate) fn abort(&mut self) -> Vec<NodeId> {
        let mut dropped = std::mem::take(&mut self.updates);
        dropped.append(&mut self.effects);
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_outermost_entry_flushes() {
        let mut scheduler = UpdateScheduler::new();

        assert!(scheduler.enter());
        assert!(!scheduler.enter());
        scheduler.exit();
        assert!(scheduler.is_open());
        scheduler.exit();
        assert!(!scheduler.is_open());
    }

    #[test]
    fn entries_during_flush_never_flush() {
        let mut scheduler = UpdateScheduler::new();
        scheduler.begin_flush();

        assert!(!scheduler.enter());
        scheduler.exit();
        assert!(scheduler.is_open());

        scheduler.end_flush();
        assert!(!scheduler.is_open());
    }

    #[test]
    fn effects_are_taken_in_insertion_order() {
        let mut scheduler = UpdateScheduler::new();
        let ids: Vec<NodeId> = (0..3).map(|_| NodeId::new()).collect();
        for id in &ids {
            scheduler.push_effect(*id);
        }

        assert_eq!(scheduler.take_effects(), ids);
        assert!(scheduler.take_effects().is_empty());
    }

    #[test]
    fn updates_queue_grows_while_drained() {
        let mut scheduler = UpdateScheduler::new();
        let first = NodeId::new();
        let second = NodeId::new();
        scheduler.push_update(first);

        let mut seen = Vec::new();
        let mut index = 0;
        while let Some(id) = scheduler.update_at(index) {
            seen.push(id);
            if id == first {
                scheduler.push_update(second);
            }
            index += 1;
        }

        assert_eq!(seen, vec![first, second]);
    }

    #[test]
    fn abort_empties_both_queues() {
        let mut scheduler = UpdateScheduler::new();
        scheduler.push_update(NodeId::new());
        scheduler.push_effect(NodeId::new());

        assert_eq!(scheduler.abort().len(), 2);
        assert!(!scheduler.has_pending());
    }

    #[test]
    fn epoch_is_monotonic() {
        let mut scheduler = UpdateScheduler::new();
        assert_eq!(scheduler.epoch(), 0);
        assert_eq!(scheduler.next_epoch(), 1);
        assert_eq!(scheduler.next_epoch(), 2);
    }
}
