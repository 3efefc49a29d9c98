//! Reactive Primitives
//!
//! This module implements the user-facing side of the reactive system:
//! signals, memos, effects and the ownership scopes that dispose them.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A signal is a container for mutable state. Reading it inside a memo or
//! effect makes that computation depend on it; writing it re-runs whatever
//! depends on it.
//!
//! ## Memos
//!
//! A memo is a derived value that caches its result. It is recomputed only
//! when something it read has really changed, and only once someone needs
//! the new value.
//!
//! ## Effects
//!
//! An effect is a side-effecting computation that re-runs whenever its
//! dependencies change, after every memo of the same round has settled.
//!
//! ## Owners
//!
//! Every computation belongs to the root or computation it was created in.
//! Disposing an owner disposes its children and runs its cleanups.
//!
//! # Implementation Notes
//!
//! All graph state lives in a thread-local [`Runtime`]. The handles in this
//! module only hold a node id (plus the typed value for signals and memos)
//! and call into the runtime for everything else.

mod context;
mod effect;
mod memo;
mod owner;
mod runtime;
mod signal;

pub use context::{is_tracking, on, untrack};
pub use effect::{create_effect, Effect};
pub use memo::{create_memo, create_memo_with, Memo};
pub use owner::{
    create_root, create_root_unowned, get_owner, on_cleanup, run_with_owner, Owner, RootDisposer,
};
pub use runtime::{batch, clear_effects_ready_hook, set_effects_ready_hook, take_errors};
pub use signal::{
    create_rw_signal, create_signal, create_signal_with, MemoOptions, ReadSignal, RwSignal,
    SignalOptions, WriteSignal,
};

pub(crate) use runtime::Runtime;
