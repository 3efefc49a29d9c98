//! Signal Implementation
//!
//! A signal is the fundamental reactive primitive. It holds a value and
//! knows which computations read it.
//!
//! # How Signals Work
//!
//! 1. When a signal is read inside a running memo or effect, the runtime
//!    records an edge from the signal to that computation.
//!
//! 2. When a signal is written with a value its comparator considers
//!    different, every observer is marked and queued.
//!
//! 3. The write then flushes, unless it happened inside a `batch` or while a
//!    flush was already running, in which case it joins that flush.
//!
//! # Handles
//!
//! `create_signal` returns a read half and a write half sharing one
//! reference-counted cell. Both halves are cheap to clone. The graph node is
//! released when the last handle is dropped. Handles are `!Send`: a signal
//! belongs to the thread that created it.

use std::cell::RefCell;
use std::fmt::{self, Debug};
use std::rc::Rc;

use crate::error::Result;
use crate::graph::NodeId;

use super::runtime::Runtime;

/// Equality test deciding whether a write is a change.
pub(crate) type Comparator<T> = Rc<dyn Fn(&T, &T) -> bool>;

/// How a signal or memo decides that a new value is a change.
pub struct SignalOptions<T> {
    /// `None` means every write notifies.
    pub(crate) equals: Option<Comparator<T>>,
}

/// Memos take the same options as signals.
pub type MemoOptions<T> = SignalOptions<T>;

impl<T> SignalOptions<T> {
    /// Notify on every write, even when the value did not change.
    pub fn always_notify() -> Self {
        Self { equals: None }
    }

    /// Use a custom comparator. Writes it reports as equal are dropped.
    pub fn equals(f: impl Fn(&T, &T) -> bool + 'static) -> Self {
        Self {
            equals: Some(Rc::new(f)),
        }
    }

    /// Whether `next` counts as a change from `current`.
    pub(crate) fn is_change(&self, current: &T, next: &T) -> bool {
        self.equals.as_ref().map_or(true, |equals| !equals(current, next))
    }
}

impl<T: PartialEq + 'static> Default for SignalOptions<T> {
    fn default() -> Self {
        Self::equals(|a: &T, b: &T| a == b)
    }
}

impl<T> Clone for SignalOptions<T> {
    fn clone(&self) -> Self {
        Self {
            equals: self.equals.clone(),
        }
    }
}

impl<T> Debug for SignalOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalOptions")
            .field("always_notify", &self.equals.is_none())
            .finish()
    }
}

/// The shared cell behind both halves of a signal.
struct SignalInner<T> {
    id: NodeId,
    value: RefCell<T>,
    options: SignalOptions<T>,
}

impl<T> SignalInner<T> {
    fn track(&self) {
        Runtime::with(|runtime| runtime.track(self.id));
    }
}

impl<T> Drop for SignalInner<T> {
    fn drop(&mut self) {
        let id = self.id;
        Runtime::try_with(|runtime| runtime.release(id));
    }
}

/// Create a signal compared with `PartialEq`.
///
/// # Example
///
/// ```rust
/// use ripple_core::create_signal;
///
/// let (count, set_count) = create_signal(0);
/// set_count.set(5).unwrap();
/// assert_eq!(count.get(), 5);
/// ```
pub fn create_signal<T: PartialEq + 'static>(value: T) -> (ReadSignal<T>, WriteSignal<T>) {
    create_signal_with(value, SignalOptions::default())
}

/// Create a signal with explicit comparator options.
pub fn create_signal_with<T: 'static>(
    value: T,
    options: SignalOptions<T>,
) -> (ReadSignal<T>, WriteSignal<T>) {
    let id = Runtime::with(Runtime::create_signal_node);
    let inner = Rc::new(SignalInner {
        id,
        value: RefCell::new(value),
        options,
    });
    (
        ReadSignal {
            inner: Rc::clone(&inner),
        },
        WriteSignal { inner },
    )
}

/// Create a signal whose read and write halves travel together.
pub fn create_rw_signal<T: PartialEq + 'static>(value: T) -> RwSignal<T> {
    let (read, write) = create_signal(value);
    RwSignal { read, write }
}

/// The read half of a signal.
pub struct ReadSignal<T> {
    inner: Rc<SignalInner<T>>,
}

impl<T> ReadSignal<T> {
    /// The signal's node in the graph.
    pub fn id(&self) -> NodeId {
        self.inner.id
    }

    /// Read the value, tracking this signal as a dependency.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.inner.track();
        self.get_untracked()
    }

    /// Read the value without creating a dependency.
    pub fn get_untracked(&self) -> T
    where
        T: Clone,
    {
        self.inner.value.borrow().clone()
    }

    /// Borrow the value, tracking this signal as a dependency.
    ///
    /// `f` must not write this same signal.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.inner.track();
        self.with_untracked(f)
    }

    /// Borrow the value without creating a dependency.
    pub fn with_untracked<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Track this signal without reading it.
    pub fn track(&self) {
        self.inner.track();
    }
}

impl<T> Clone for ReadSignal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Debug> Debug for ReadSignal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadSignal")
            .field("id", &self.inner.id)
            .field("value", &self.inner.value.borrow())
            .finish()
    }
}

/// The write half of a signal.
pub struct WriteSignal<T> {
    inner: Rc<SignalInner<T>>,
}

impl<T> WriteSignal<T> {
    /// The signal's node in the graph.
    pub fn id(&self) -> NodeId {
        self.inner.id
    }

    /// Store a new value and notify observers.
    ///
    /// A value the comparator reports as equal is dropped without notifying
    /// anyone. Returns the error of the flush this write started, if any.
    pub fn set(&self, value: T) -> Result<()> {
        let changed = self.inner.options.is_change(&self.inner.value.borrow(), &value);
        if !changed {
            return Ok(());
        }
        let previous = self.inner.value.replace(value);
        drop(previous);
        Runtime::with(|runtime| runtime.notify(self.inner.id))
    }

    /// Compute the new value from the current one, then [`set`](Self::set) it.
    pub fn update(&self, f: impl FnOnce(&T) -> T) -> Result<()> {
        let next = f(&self.inner.value.borrow());
        self.set(next)
    }
}

impl<T> Clone for WriteSignal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Debug for WriteSignal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteSignal").field("id", &self.inner.id).finish()
    }
}

/// A signal with both halves in one handle.
pub struct RwSignal<T> {
    read: ReadSignal<T>,
    write: WriteSignal<T>,
}

impl<T> RwSignal<T> {
    pub fn id(&self) -> NodeId {
        self.read.id()
    }

    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.read.get()
    }

    pub fn get_untracked(&self) -> T
    where
        T: Clone,
    {
        self.read.get_untracked()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.read.with(f)
    }

    pub fn with_untracked<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.read.with_untracked(f)
    }

    pub fn track(&self) {
        self.read.track();
    }

    pub fn set(&self, value: T) -> Result<()> {
        self.write.set(value)
    }

    pub fn update(&self, f: impl FnOnce(&T) -> T) -> Result<()> {
        self.write.update(f)
    }

    /// A read-only handle to the same signal.
    pub fn read_only(&self) -> ReadSignal<T> {
        self.read.clone()
    }

    /// A write-only handle to the same signal.
    pub fn write_only(&self) -> WriteSignal<T> {
        self.write.clone()
    }

    /// Split into separate halves.
    pub fn split(self) -> (ReadSignal<T>, WriteSignal<T>) {
        (self.read, self.write)
    }
}

impl<T> Clone for RwSignal<T> {
    fn clone(&self) -> Self {
        Self {
            read: self.read.clone(),
            write: self.write.clone(),
        }
    }
}

impl<T: Debug> Debug for RwSignal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RwSignal")
            .field("id", &self.read.id())
            .field("value", &self.read.inner.value.borrow())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_effect, create_root};
    use std::cell::Cell;

    fn count_runs<T: Clone + 'static>(signal: &ReadSignal<T>) -> Rc<Cell<usize>> {
        let runs = Rc::new(Cell::new(0));
        let counter = runs.clone();
        let signal = signal.clone();
        create_effect(move || {
            signal.track();
            counter.set(counter.get() + 1);
        });
        runs
    }

    #[test]
    fn signal_get_and_set() {
        let (count, set_count) = create_signal(0);
        assert_eq!(count.get(), 0);

        set_count.set(42).unwrap();
        assert_eq!(count.get(), 42);
    }

    #[test]
    fn signal_update() {
        let (count, set_count) = create_signal(10);
        set_count.update(|v| v + 5).unwrap();
        assert_eq!(count.get(), 15);
    }

    #[test]
    fn equal_writes_do_not_notify() {
        create_root(|_| {
            let (name, set_name) = create_signal("ada".to_string());
            let runs = count_runs(&name);

            set_name.set("ada".to_string()).unwrap();
            assert_eq!(runs.get(), 1);

            set_name.set("grace".to_string()).unwrap();
            assert_eq!(runs.get(), 2);
        });
    }

    #[test]
    fn always_notify_skips_comparison() {
        create_root(|_| {
            let (tick, set_tick) = create_signal_with((), SignalOptions::always_notify());
            let runs = count_runs(&tick);

            set_tick.set(()).unwrap();
            set_tick.set(()).unwrap();
            assert_eq!(runs.get(), 3);
        });
    }

    #[test]
    fn custom_comparator_decides_changes() {
        create_root(|_| {
            let options = SignalOptions::equals(|a: &f64, b: &f64| (a - b).abs() < 0.5);
            let (level, set_level) = create_signal_with(1.0, options);
            let runs = count_runs(&level);

            set_level.set(1.2).unwrap();
            assert_eq!(runs.get(), 1);
            // Dropped writes leave the stored value alone.
            assert_eq!(level.get_untracked(), 1.0);

            set_level.set(2.0).unwrap();
            assert_eq!(runs.get(), 2);
        });
    }

    #[test]
    fn with_borrows_without_cloning() {
        let (items, set_items) = create_signal(vec![1, 2, 3]);
        assert_eq!(items.with(|items| items.len()), 3);

        set_items.update(|items| items.iter().map(|n| n * 10).collect()).unwrap();
        assert_eq!(items.with_untracked(|items| items[2]), 30);
    }

    #[test]
    fn untracked_reads_do_not_subscribe() {
        create_root(|_| {
            let (count, set_count) = create_signal(0);
            let runs = Rc::new(Cell::new(0));
            let counter = runs.clone();
            let reader = count.clone();
            create_effect(move || {
                reader.get_untracked();
                reader.with_untracked(|_| ());
                counter.set(counter.get() + 1);
            });

            set_count.set(1).unwrap();
            assert_eq!(runs.get(), 1);
        });
    }

    #[test]
    fn rw_signal_shares_one_cell() {
        let signal = create_rw_signal(1);
        let read = signal.read_only();
        let write = signal.write_only();

        write.set(2).unwrap();
        assert_eq!(signal.get(), 2);
        signal.update(|v| v * 3).unwrap();
        assert_eq!(read.get(), 6);

        let (read, _write) = signal.split();
        assert_eq!(read.get_untracked(), 6);
    }

    #[test]
    fn signal_ids_are_unique() {
        let (a, _) = create_signal(0);
        let (b, _) = create_signal(0);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn dropping_all_handles_releases_the_node() {
        let before = Runtime::with(Runtime::node_count);
        let (read, write) = create_signal(0);
        let copy = read.clone();
        assert_eq!(Runtime::with(Runtime::node_count), before + 1);

        drop(read);
        drop(write);
        assert_eq!(Runtime::with(Runtime::node_count), before + 1);

        drop(copy);
        assert_eq!(Runtime::with(Runtime::node_count), before);
    }
}
