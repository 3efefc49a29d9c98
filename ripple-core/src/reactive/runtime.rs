//! Reactive Runtime
//!
//! The runtime is the central coordinator that connects signals, memos, and
//! effects. It owns the dependency graph and the update queues, and it is the
//! only place where user code is invoked.
//!
//! # How It Works
//!
//! 1. Reading a cell inside a running computation links the two (`track`).
//!
//! 2. Writing a cell marks its observers (`notify`): direct observers become
//!    Stale, anything further downstream becomes Pending, and everything
//!    marked is queued.
//!
//! 3. The outermost write (or `batch`) flushes the queues. Observed memos are
//!    settled first, then effects run in the order they were first marked.
//!
//! 4. Memos are pulled: a Stale memo recomputes when read; a Pending memo
//!    first asks its sources (`look_upstream`) and recomputes only if one of
//!    them really changed.
//!
//! 5. Before a computation re-runs it is cleaned: its children are disposed,
//!    its source edges severed and its cleanups run.
//!
//! # Borrow Discipline
//!
//! The store and the scheduler live in `RefCell`s. A borrow is only ever held
//! for the duration of a graph operation; it is always released before user
//! code (bodies, comparators, cleanups, value drops) runs, because that code
//! may re-enter the runtime.
//!
//! # Threading
//!
//! There is one runtime per thread. Handles are `!Send`, so a graph can only
//! be touched from the thread that built it.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use tracing::{debug, error, trace, warn};

use crate::config::RuntimeConfig;
use crate::error::{ReactiveError, Result};
use crate::graph::{
    Cleanup, ComputationKind, Compute, Node, NodeId, NodeState, NodeStore, UpdateScheduler,
};

use super::context::{ContextGuard, ExecutionContext};

thread_local! {
    static RUNTIME: Runtime = Runtime::new();
}

/// Callback told how many effects are about to run.
type EffectsReadyHook = Rc<dyn Fn(usize)>;

/// The per-thread reactive runtime.
pub(crate) struct Runtime {
    store: RefCell<NodeStore>,
    scheduler: RefCell<UpdateScheduler>,
    context: Cell<ExecutionContext>,
    config: RefCell<RuntimeConfig>,
    /// Recent computation errors, oldest first.
    errors: RefCell<VecDeque<ReactiveError>>,
    /// A fatal error raised inside a flush, picked up by the flush loop.
    fatal: RefCell<Option<ReactiveError>>,
    effects_ready: RefCell<Option<EffectsReadyHook>>,
    /// Shared owner for `create_root_unowned`. Work created directly under it
    /// is never attached to any scope.
    unowned: NodeId,
}

impl Runtime {
    fn new() -> Self {
        let mut store = NodeStore::new();
        let unowned = store.insert(Node::root(None));
        Self {
            store: RefCell::new(store),
            scheduler: RefCell::new(UpdateScheduler::new()),
            context: Cell::new(ExecutionContext::default()),
            config: RefCell::new(RuntimeConfig::default()),
            errors: RefCell::new(VecDeque::new()),
            fatal: RefCell::new(None),
            effects_ready: RefCell::new(None),
            unowned,
        }
    }

    /// Run `f` with this thread's runtime.
    pub(crate) fn with<R>(f: impl FnOnce(&Runtime) -> R) -> R {
        RUNTIME.with(f)
    }

    /// Like [`Runtime::with`], but returns `None` while the thread is being
    /// torn down.
    pub(crate) fn try_with<R>(f: impl FnOnce(&Runtime) -> R) -> Option<R> {
        RUNTIME.try_with(f).ok()
    }

    // ------------------------------------------------------------------------
    // Configuration and reporting
    // ------------------------------------------------------------------------

    pub(crate) fn config(&self) -> RuntimeConfig {
        self.config.borrow().clone()
    }

    pub(crate) fn set_config(&self, config: RuntimeConfig) {
        debug!(?config, "runtime reconfigured");
        *self.config.borrow_mut() = config;
    }

    /// Record a non-fatal error.
    pub(crate) fn report(&self, err: ReactiveError) {
        error!(error = %err, "reactive computation failed");
        let capacity = self.config.borrow().error_log_capacity;
        let mut errors = self.errors.borrow_mut();
        errors.push_back(err);
        while errors.len() > capacity {
            errors.pop_front();
        }
    }

    /// Drain the recorded errors.
    pub(crate) fn take_errors(&self) -> Vec<ReactiveError> {
        self.errors.borrow_mut().drain(..).collect()
    }

    /// Remember a fatal error so the running flush aborts.
    fn raise(&self, err: ReactiveError) {
        let mut fatal = self.fatal.borrow_mut();
        if fatal.is_none() {
            *fatal = Some(err);
        }
    }

    fn check_fatal(&self) -> Result<()> {
        match self.fatal.borrow_mut().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub(crate) fn set_effects_ready_hook(&self, hook: Option<EffectsReadyHook>) {
        *self.effects_ready.borrow_mut() = hook;
    }

    fn notify_effects_ready(&self, count: usize) {
        let hook = self.effects_ready.borrow().clone();
        if let Some(hook) = hook {
            hook(count);
        }
    }

    // ------------------------------------------------------------------------
    // Context
    // ------------------------------------------------------------------------

    pub(crate) fn context(&self) -> ExecutionContext {
        self.context.get()
    }

    pub(crate) fn enter_context(&self, next: ExecutionContext) -> ContextGuard<'_> {
        ContextGuard::enter(&self.context, next)
    }

    pub(crate) fn unowned(&self) -> NodeId {
        self.unowned
    }

    // ------------------------------------------------------------------------
    // Node creation and lookup
    // ------------------------------------------------------------------------

    pub(crate) fn create_signal_node(&self) -> NodeId {
        self.store.borrow_mut().insert(Node::signal())
    }

    /// Create a root scope under the current owner.
    ///
    /// Roots remember their parent for the owner chain but are not owned by
    /// it: disposing the parent does not dispose the root.
    pub(crate) fn create_root_node(&self) -> NodeId {
        let parent = self.context.get().owner;
        let id = self.store.borrow_mut().insert(Node::root(parent));
        debug!(root = %id, "created root");
        id
    }

    /// Allocate a memo or effect and attach it to the current owner.
    pub(crate) fn create_computation(
        &self,
        kind: ComputationKind,
        body: Rc<dyn Compute>,
    ) -> NodeId {
        let owner = self.context.get().owner;
        let mut store = self.store.borrow_mut();
        let attach_to = match owner {
            Some(owner) if owner == self.unowned => None,
            Some(owner) if store.live(owner).is_some() => Some(owner),
            _ => {
                if self.config.borrow().warn_unowned {
                    warn!(
                        %kind,
                        "computation created outside a `create_root` scope will never be disposed"
                    );
                }
                None
            }
        };
        let node = match kind {
            ComputationKind::Memo => Node::memo(body, owner),
            ComputationKind::Effect => Node::effect(body, owner),
        };
        let id = store.insert(node);
        if let Some(owner) = attach_to {
            store.adopt(owner, id);
        }
        trace!(node = %id, %kind, "created computation");
        id
    }

    /// Run a freshly created computation for the first time.
    pub(crate) fn run_initial(&self, id: NodeId) {
        let ((), flushed) = self.with_queues(|| self.update_computation(id));
        if let Err(err) = flushed {
            self.report(err);
        }
    }

    pub(crate) fn state(&self, id: NodeId) -> Option<NodeState> {
        self.store.borrow().state(id)
    }

    pub(crate) fn is_live(&self, id: NodeId) -> bool {
        self.store.borrow().live(id).is_some()
    }

    /// Register a cleanup with the current owner.
    pub(crate) fn push_cleanup(&self, cleanup: Cleanup) {
        let rejected = match self.context.get().owner {
            Some(owner) if owner == self.unowned => Some(cleanup),
            Some(owner) => {
                let mut store = self.store.borrow_mut();
                match store.live_mut(owner).and_then(Node::scope_mut) {
                    Some(scope) => {
                        scope.cleanups.push(cleanup);
                        None
                    }
                    None => Some(cleanup),
                }
            }
            None => {
                if self.config.borrow().warn_unowned {
                    warn!("cleanup registered outside a `create_root` scope will never run");
                }
                Some(cleanup)
            }
        };
        drop(rejected);
    }

    /// Release the node of a dropped signal.
    pub(crate) fn release(&self, id: NodeId) {
        if let Ok(mut store) = self.store.try_borrow_mut() {
            store.remove(id);
        }
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    /// Link `source` to the running computation, if any.
    pub(crate) fn track(&self, source: NodeId) {
        let Some(listener) = self.context.get().listener else {
            return;
        };
        if listener == source {
            return;
        }
        self.store.borrow_mut().link(source, listener);
    }

    /// Bring a memo up to date before it is read.
    pub(crate) fn update_if_necessary(&self, id: NodeId) -> Result<()> {
        if !matches!(self.state(id), Some(NodeState::Stale | NodeState::Pending)) {
            return Ok(());
        }
        let ((), flushed) = self.with_queues(|| {
            if self.state(id) == Some(NodeState::Pending) {
                self.look_upstream(id, None);
            }
            if self.state(id) == Some(NodeState::Stale) {
                self.update_computation(id);
            }
        });
        flushed
    }

    // ------------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------------

    /// Propagate a change of `source` to everything that observes it.
    pub(crate) fn notify(&self, source: NodeId) -> Result<()> {
        let observed = self.store.borrow().live(source).is_some_and(Node::has_observers);
        if !observed {
            return Ok(());
        }
        let (marked, flushed) = self.with_queues(|| self.mark(source));
        marked.and(flushed)
    }

    fn mark(&self, source: NodeId) -> Result<()> {
        let max_depth = self.config.borrow().max_mark_depth;
        let marked = {
            let mut store = self.store.borrow_mut();
            let mut scheduler = self.scheduler.borrow_mut();
            store.mark_observers(source, &mut scheduler, max_depth)
        };
        match marked {
            Ok(queued) => {
                trace!(source = %source, queued, "marked observers");
                Ok(())
            }
            Err(err) => {
                error!(error = %err, "aborting propagation");
                self.abort_queues();
                if self.scheduler.borrow().is_flushing() {
                    // Surfaces from the outermost write instead.
                    self.raise(err);
                    return Ok(());
                }
                Err(err)
            }
        }
    }

    // ------------------------------------------------------------------------
    // Queues and flushing
    // ------------------------------------------------------------------------

    /// Run `f` with the queues open and flush them if this was the outermost
    /// scope.
    ///
    /// Returns `f`'s value together with the outcome of the flush. Nested
    /// scopes, and scopes opened while a flush is running, never flush.
    pub(crate) fn with_queues<R>(&self, f: impl FnOnce() -> R) -> (R, Result<()>) {
        let outermost = self.scheduler.borrow_mut().enter();
        let scope = WriteScope {
            runtime: self,
            outermost,
        };
        let value = f();
        drop(scope);
        if !outermost {
            return (value, Ok(()));
        }
        let flushed = self.flush();
        self.collect_garbage();
        (value, flushed)
    }

    fn flush(&self) -> Result<()> {
        let pending = self.scheduler.borrow().has_pending();
        if !pending {
            return self.check_fatal();
        }
        let result = {
            let _flushing = FlushGuard::begin(self);
            self.drain()
        };
        if let Err(err) = &result {
            error!(error = %err, "flush aborted");
            self.abort_queues();
        }
        result
    }

    fn drain(&self) -> Result<()> {
        let limit = self.config.borrow().max_flush_iterations;
        let mut iterations = 0usize;
        let mut rounds = 0usize;
        loop {
            rounds += 1;
            self.scheduler.borrow_mut().next_epoch();

            let mut index = 0;
            loop {
                let next = self.scheduler.borrow().update_at(index);
                let Some(id) = next else {
                    break;
                };
                index += 1;
                iterations += 1;
                if iterations > limit {
                    return Err(ReactiveError::InfiniteLoop { iterations });
                }
                // Unobserved memos stay dirty until someone reads them.
                let observed = self.store.borrow().live(id).is_some_and(Node::has_observers);
                if observed {
                    self.run_top(id);
                }
                self.check_fatal()?;
            }
            self.scheduler.borrow_mut().clear_updates();

            let effects = self.scheduler.borrow_mut().take_effects();
            if effects.is_empty() {
                break;
            }
            self.notify_effects_ready(effects.len());
            self.scheduler.borrow_mut().next_epoch();
            for (index, &id) in effects.iter().enumerate() {
                iterations += 1;
                let outcome = if iterations > limit {
                    Err(ReactiveError::InfiniteLoop { iterations })
                } else {
                    self.run_top(id);
                    self.check_fatal()
                };
                if let Err(err) = outcome {
                    // Hand the rest back so the abort resets them.
                    let mut scheduler = self.scheduler.borrow_mut();
                    for &rest in &effects[index..] {
                        scheduler.push_effect(rest);
                    }
                    return Err(err);
                }
            }
        }
        debug!(rounds, iterations, "flush complete");
        Ok(())
    }

    /// Empty both queues after a fatal error.
    ///
    /// Dropped effects go back to Clean so the next write re-queues them.
    /// Dropped memos stay dirty and recompute when read.
    fn abort_queues(&self) {
        let dropped = match self.scheduler.try_borrow_mut() {
            Ok(mut scheduler) => scheduler.abort(),
            Err(_) => return,
        };
        let Ok(mut store) = self.store.try_borrow_mut() else {
            return;
        };
        for id in dropped {
            let is_effect = store.live(id).is_some_and(|node| !node.is_memo());
            if is_effect {
                store.set_state(id, NodeState::Clean);
            }
        }
    }

    /// Remove disposed nodes once no queue can refer to them.
    fn collect_garbage(&self) {
        let buried = {
            let mut scheduler = self.scheduler.borrow_mut();
            if scheduler.is_open() {
                return;
            }
            scheduler.take_graveyard()
        };
        if buried.is_empty() {
            return;
        }
        let removed: Vec<Node> = {
            let mut store = self.store.borrow_mut();
            buried.into_iter().filter_map(|id| store.remove(id)).collect()
        };
        trace!(count = removed.len(), "released disposed nodes");
        drop(removed);
    }

    // ------------------------------------------------------------------------
    // Pull phase and execution order
    // ------------------------------------------------------------------------

    /// Update `id` after every dirty owner above it.
    ///
    /// Owners that have not run this epoch and are not Clean are collected
    /// bottom-up and then processed top-down, so a parent re-runs (and
    /// possibly disposes `id`) before `id` itself is considered.
    fn run_top(&self, id: NodeId) {
        let ancestors = {
            let store = self.store.borrow();
            match store.state(id) {
                None | Some(NodeState::Clean) => return,
                Some(_) => {}
            }
            let epoch = self.scheduler.borrow().epoch();
            let mut ancestors = vec![id];
            let mut current = store.get(id).and_then(Node::parent);
            while let Some(owner) = current {
                let Some(node) = store.live(owner) else {
                    break;
                };
                if let Some(computation) = node.computation() {
                    if computation.updated_at.is_some_and(|at| at >= epoch) {
                        break;
                    }
                    if computation.state != NodeState::Clean {
                        ancestors.push(owner);
                    }
                }
                current = node.parent();
            }
            ancestors
        };

        for &node in ancestors.iter().rev() {
            match self.state(node) {
                Some(NodeState::Stale) => self.update_computation(node),
                Some(NodeState::Pending) => {
                    let ignore = (node != id).then_some(id);
                    self.look_upstream(node, ignore);
                    if self.state(node) == Some(NodeState::Stale) {
                        self.update_computation(node);
                    }
                }
                Some(NodeState::Clean) | None => {}
            }
        }
    }

    /// Settle the sources of a Pending node.
    ///
    /// The node is optimistically set Clean. Any source memo that turns out
    /// to change marks it Stale again through the normal write path.
    fn look_upstream(&self, id: NodeId, ignore: Option<NodeId>) {
        let sources = {
            let mut store = self.store.borrow_mut();
            store.set_state(id, NodeState::Clean);
            store
                .live(id)
                .and_then(Node::computation)
                .map(|computation| computation.sources.nodes())
                .unwrap_or_default()
        };
        for source in sources {
            if self.state(source) == Some(NodeState::Pending) {
                self.look_upstream(source, ignore);
            }
            if self.state(source) == Some(NodeState::Stale)
                && Some(source) != ignore
                && !self.failed_this_epoch(source)
            {
                self.run_top(source);
            }
        }
    }

    /// Whether `id` panicked during the current epoch. Such a memo is not
    /// retried until the next epoch or an explicit read.
    fn failed_this_epoch(&self, id: NodeId) -> bool {
        let epoch = self.scheduler.borrow().epoch();
        self.store
            .borrow()
            .live(id)
            .and_then(Node::computation)
            .and_then(|computation| computation.updated_at)
            .is_some_and(|at| at > epoch)
    }

    // ------------------------------------------------------------------------
    // Running computations
    // ------------------------------------------------------------------------

    /// Clean `id` and run its body again.
    pub(crate) fn update_computation(&self, id: NodeId) {
        let body = self
            .store
            .borrow()
            .live(id)
            .and_then(Node::computation)
            .and_then(|computation| computation.body.clone());
        let Some(body) = body else {
            return;
        };
        self.clean_node(id);
        if !self.is_live(id) {
            return;
        }
        let time = self.scheduler.borrow().epoch();
        self.run_computation(id, body, time);
    }

    fn run_computation(&self, id: NodeId, body: Rc<dyn Compute>, time: u64) {
        trace!(node = %id, epoch = time, "running computation");
        let outcome = {
            let _context = self.enter_context(ExecutionContext::computation(id));
            panic::catch_unwind(AssertUnwindSafe(|| body.run()))
        };
        let changed = match outcome {
            Ok(changed) => changed,
            Err(payload) => {
                self.fail_computation(id, time, payload.as_ref());
                return;
            }
        };
        let notify = {
            let mut store = self.store.borrow_mut();
            let Some(node) = store.live_mut(id) else {
                return;
            };
            let is_memo = node.is_memo();
            let Some(computation) = node.computation_mut() else {
                return;
            };
            let first_run = computation.updated_at.is_none();
            computation.updated_at = Some(time);
            is_memo && changed && !first_run
        };
        if notify {
            if let Err(err) = self.mark(id) {
                self.raise(err);
            }
        }
    }

    /// Roll back after a body panicked.
    ///
    /// A memo goes back to Stale and loses the children it created before
    /// the panic, so the next attempt starts clean. An effect keeps whatever
    /// it tracked before the panic and simply waits for the next change.
    fn fail_computation(&self, id: NodeId, time: u64, payload: &(dyn Any + Send)) {
        let message = panic_message(payload);
        let (kind, orphans) = {
            let mut store = self.store.borrow_mut();
            let Some(node) = store.live_mut(id) else {
                return;
            };
            let kind = node.computation_kind();
            let is_memo = node.is_memo();
            let Some(computation) = node.computation_mut() else {
                return;
            };
            computation.updated_at = Some(time + 1);
            let orphans = if is_memo {
                computation.state = NodeState::Stale;
                std::mem::take(&mut computation.scope.owned)
            } else {
                Vec::new()
            };
            (kind, orphans)
        };
        for child in orphans {
            self.dispose_node(child);
        }
        if let Some(kind) = kind {
            self.report(ReactiveError::Computation {
                node: id,
                kind,
                message,
            });
        }
    }

    // ------------------------------------------------------------------------
    // Cleanup and disposal
    // ------------------------------------------------------------------------

    /// Reset `id` to a blank computation or scope.
    ///
    /// Order: owned children depth-first, then source edges, then cleanups
    /// in registration order.
    pub(crate) fn clean_node(&self, id: NodeId) {
        let owned = self
            .store
            .borrow_mut()
            .get_mut(id)
            .and_then(Node::scope_mut)
            .map(|scope| std::mem::take(&mut scope.owned))
            .unwrap_or_default();
        for child in owned {
            self.dispose_node(child);
        }

        let cleanups = {
            let mut store = self.store.borrow_mut();
            store.unlink_sources(id);
            let Some(node) = store.get_mut(id) else {
                return;
            };
            if let Some(computation) = node.computation_mut() {
                computation.state = NodeState::Clean;
            }
            node.scope_mut()
                .map(|scope| std::mem::take(&mut scope.cleanups))
                .unwrap_or_default()
        };
        self.run_cleanups(id, cleanups);
    }

    fn run_cleanups(&self, id: NodeId, cleanups: Vec<Cleanup>) {
        if cleanups.is_empty() {
            return;
        }
        let owner = self.context.get().owner;
        let _context = self.enter_context(ExecutionContext::scope(owner));
        for cleanup in cleanups {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(cleanup)) {
                self.report(ReactiveError::Cleanup {
                    node: id,
                    message: panic_message(payload.as_ref()),
                });
            }
        }
    }

    /// Dispose `id` and everything it owns. Disposing twice is a no-op.
    pub(crate) fn dispose_node(&self, id: NodeId) {
        {
            let mut store = self.store.borrow_mut();
            let Some(node) = store.live_mut(id) else {
                return;
            };
            node.mark_disposed();
            store.orphan(id);
        }
        self.clean_node(id);

        let (body, removed) = {
            let mut store = self.store.borrow_mut();
            let body = store
                .get_mut(id)
                .and_then(Node::computation_mut)
                .and_then(|computation| computation.body.take());
            let mut scheduler = self.scheduler.borrow_mut();
            let removed = if scheduler.is_open() {
                scheduler.bury(id);
                None
            } else {
                store.remove(id)
            };
            (body, removed)
        };
        trace!(node = %id, "disposed");
        drop(removed);
        drop(body);
    }

    /// Dispose `id` as a top-level operation: writes made by its cleanups are
    /// flushed once disposal is complete.
    pub(crate) fn dispose(&self, id: NodeId) {
        let ((), flushed) = self.with_queues(|| self.dispose_node(id));
        if let Err(err) = flushed {
            self.report(err);
        }
    }

    /// Check every edge's back-pointer.
    #[cfg(test)]
    pub(crate) fn edges_consistent(&self) -> bool {
        self.store.borrow().edges_consistent()
    }

    #[cfg(test)]
    pub(crate) fn node_count(&self) -> usize {
        self.store.borrow().len()
    }
}

/// Leaves a scheduler scope, even when the closure inside it panics.
struct WriteScope<'a> {
    runtime: &'a Runtime,
    outermost: bool,
}

impl Drop for WriteScope<'_> {
    fn drop(&mut self) {
        if let Ok(mut scheduler) = self.runtime.scheduler.try_borrow_mut() {
            scheduler.exit();
        }
        if self.outermost && std::thread::panicking() {
            self.runtime.abort_queues();
        }
    }
}

/// Marks the scheduler as flushing until dropped, so a panicking hook
/// cannot leave it stuck.
struct FlushGuard<'a> {
    runtime: &'a Runtime,
}

impl<'a> FlushGuard<'a> {
    fn begin(runtime: &'a Runtime) -> Self {
        runtime.scheduler.borrow_mut().begin_flush();
        Self { runtime }
    }
}

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut scheduler) = self.runtime.scheduler.try_borrow_mut() {
            scheduler.end_flush();
        }
    }
}

/// Render a panic payload as text.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

// ----------------------------------------------------------------------------
// Public entry points
// ----------------------------------------------------------------------------

/// Group several writes into one flush.
///
/// Effects observing any of the written signals run once, after `f`
/// returns, and see every final value. Nested `batch` calls flush only when
/// the outermost one finishes. A fatal flush error is returned here.
///
/// # Example
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use ripple_core::{batch, create_effect, create_root, create_signal};
///
/// create_root(|_| {
///     let (a, set_a) = create_signal(1);
///     let (b, set_b) = create_signal(2);
///     let runs = Rc::new(Cell::new(0));
///     let counter = runs.clone();
///     create_effect(move || {
///         let _ = a.get() + b.get();
///         counter.set(counter.get() + 1);
///     });
///
///     batch(|| {
///         set_a.set(10).unwrap();
///         set_b.set(20).unwrap();
///     })
///     .unwrap();
///
///     assert_eq!(runs.get(), 2);
/// });
/// ```
pub fn batch<R>(f: impl FnOnce() -> R) -> Result<R> {
    Runtime::with(|runtime| {
        let (value, flushed) = runtime.with_queues(f);
        flushed.map(|()| value)
    })
}

/// Drain the computation errors recorded on this thread since the last call.
pub fn take_errors() -> Vec<ReactiveError> {
    Runtime::with(Runtime::take_errors)
}

/// Install a callback that is told how many effects are about to run at the
/// start of every effects round.
///
/// It is a notification for an outer scheduler; the order in which effects
/// run is still decided here.
pub fn set_effects_ready_hook(hook: impl Fn(usize) + 'static) {
    Runtime::with(|runtime| runtime.set_effects_ready_hook(Some(Rc::new(hook))));
}

/// Remove the hook installed with [`set_effects_ready_hook`].
pub fn clear_effects_ready_hook() {
    Runtime::with(|runtime| runtime.set_effects_ready_hook(None));
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
