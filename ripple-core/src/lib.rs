//! Ripple Core
//!
//! This crate provides a fine-grained reactive runtime. It implements:
//!
//! - Reactive primitives (signals, memos, effects)
//! - Glitch-free, lazy propagation over a dependency graph
//! - Ownership scopes with cascading disposal and cleanups
//! - Batching of writes into a single flush
//!
//! # Architecture
//!
//! The crate is organized into two modules:
//!
//! - `graph`: node storage, edge lists, marking and the update queues
//! - `reactive`: the thread-local runtime and the typed handles built on it
//!
//! Everything user-facing is re-exported at the crate root.
//!
//! # Example
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use ripple_core::{batch, create_effect, create_memo, create_root, create_signal};
//!
//! create_root(|dispose| {
//!     let (a, set_a) = create_signal(1);
//!     let (b, set_b) = create_signal(2);
//!     let sum = create_memo(move |_| a.get() + b.get());
//!
//!     let seen = Rc::new(RefCell::new(Vec::new()));
//!     let log = seen.clone();
//!     create_effect(move || log.borrow_mut().push(sum.get()));
//!
//!     batch(|| {
//!         set_a.set(10).unwrap();
//!         set_b.set(20).unwrap();
//!     })
//!     .unwrap();
//!
//!     assert_eq!(*seen.borrow(), vec![3, 30]);
//!     dispose.dispose();
//! });
//! ```
//!
//! # Threading
//!
//! Each thread has its own runtime. Handles are `!Send` and only work on
//! the thread that created them.

pub mod graph;
pub mod reactive;

mod config;
mod error;

pub use config::{configure, current_config, RuntimeConfig};
pub use error::{ReactiveError, Result};
pub use graph::{ComputationKind, NodeId, NodeState};
pub use reactive::{
    batch, clear_effects_ready_hook, create_effect, create_memo, create_memo_with, create_root,
    create_root_unowned, create_rw_signal, create_signal, create_signal_with, get_owner,
    is_tracking, on, on_cleanup, run_with_owner, set_effects_ready_hook, take_errors, untrack,
    Effect, Memo, MemoOptions, Owner, ReadSignal, RootDisposer, RwSignal, SignalOptions,
    WriteSignal,
};
