//! Integration Tests for the Reactive System
//!
//! These tests drive signals, memos, effects and owners together through the
//! public API only.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use ripple_core::{
    batch, clear_effects_ready_hook, configure, create_effect, create_memo, create_root,
    create_signal, current_config, on_cleanup, set_effects_ready_hook, take_errors, Memo,
    NodeState, ReactiveError, RuntimeConfig,
};
use tracing_test::traced_test;

fn counter() -> (Rc<Cell<usize>>, Rc<Cell<usize>>) {
    let count = Rc::new(Cell::new(0));
    (count.clone(), count)
}

fn recorder<T>() -> (Rc<RefCell<Vec<T>>>, Rc<RefCell<Vec<T>>>) {
    let log = Rc::new(RefCell::new(Vec::new()));
    (log.clone(), log)
}

/// A diamond never exposes an intermediate value to its effect.
#[test]
fn propagation_is_glitch_free() {
    create_root(|_| {
        let (log, seen) = recorder();
        let (a, set_a) = create_signal(1);
        let (b, set_b) = create_signal(2);
        let sum = create_memo(move |_| a.get() + b.get());
        let doubled = create_memo(move |_| sum.get() * 2);
        create_effect(move || log.borrow_mut().push(doubled.get()));

        batch(|| {
            set_a.set(5).unwrap();
            set_b.set(10).unwrap();
        })
        .unwrap();

        assert_eq!(*seen.borrow(), vec![6, 30]);
        assert!(!seen.borrow().contains(&14));
    });
}

/// A memo nobody reads does not recompute.
#[test]
fn unread_memo_is_never_recomputed() {
    create_root(|_| {
        let (computes, seen) = counter();
        let (a, set_a) = create_signal(1);
        let _expensive = create_memo(move |_| {
            computes.set(computes.get() + 1);
            a.get() * 100
        });

        for value in 2..10 {
            set_a.set(value).unwrap();
        }

        assert_eq!(seen.get(), 1);
    });
}

/// Writing an equal value marks nothing and recomputes nothing.
#[test]
fn equal_write_is_a_no_op() {
    create_root(|_| {
        let (computes, memo_runs) = counter();
        let (effect_log, effect_runs) = counter();
        let (a, set_a) = create_signal(7);
        let plus_one = create_memo(move |_| {
            computes.set(computes.get() + 1);
            a.get() + 1
        });
        let observed = plus_one.clone();
        create_effect(move || {
            observed.get();
            effect_log.set(effect_log.get() + 1);
        });

        set_a.set(7).unwrap();

        assert_eq!(memo_runs.get(), 1);
        assert_eq!(effect_runs.get(), 1);
        assert_eq!(plus_one.state(), Some(NodeState::Clean));
    });
}

/// Disposing twice runs every cleanup once.
#[test]
fn disposal_is_idempotent() {
    let (cleanups, seen) = counter();
    let dispose = create_root(|dispose| {
        let (a, _set_a) = create_signal(0);
        let effect_cleanups = cleanups.clone();
        create_effect(move || {
            a.get();
            let cleanups = effect_cleanups.clone();
            on_cleanup(move || cleanups.set(cleanups.get() + 1));
        });
        on_cleanup(move || cleanups.set(cleanups.get() + 1));
        dispose
    });

    dispose.dispose();
    dispose.dispose();

    assert_eq!(seen.get(), 2);
}

/// N writes in one batch run a shared effect once with every final value.
#[test]
fn batch_coalesces_writes() {
    create_root(|_| {
        let (log, seen) = recorder();
        let signals: Vec<_> = (0..5).map(|_| create_signal(0)).collect();
        let reads: Vec<_> = signals.iter().map(|(read, _)| read.clone()).collect();
        create_effect(move || {
            let values: Vec<i32> = reads.iter().map(|read| read.get()).collect();
            log.borrow_mut().push(values);
        });

        batch(|| {
            for (index, (_, write)) in signals.iter().enumerate() {
                write.set(index as i32 + 1).unwrap();
            }
        })
        .unwrap();

        assert_eq!(*seen.borrow(), vec![vec![0; 5], vec![1, 2, 3, 4, 5]]);
    });
}

/// A child effect is cleaned once per parent re-run, before the parent.
#[test]
fn nested_effects_are_owned_by_their_parent() {
    let (log, seen) = recorder();
    let (trigger, set_trigger) = create_signal(0);

    let dispose = create_root(move |dispose| {
        create_effect(move || {
            trigger.get();
            let child_log = log.clone();
            create_effect(move || {
                let child_log = child_log.clone();
                on_cleanup(move || child_log.borrow_mut().push("child"));
            });
            let parent_log = log.clone();
            on_cleanup(move || parent_log.borrow_mut().push("parent"));
        });
        dispose
    });

    set_trigger.set(1).unwrap();
    assert_eq!(*seen.borrow(), vec!["child", "parent"]);

    dispose.dispose();
    assert_eq!(*seen.borrow(), vec!["child", "parent", "child", "parent"]);
}

/// A child that read the signal first still waits for its owner, whose
/// re-run replaces it before it could run with stale context.
#[test]
fn owners_settle_before_their_children() {
    create_root(|_| {
        let (log, seen) = recorder();
        let (value, set_value) = create_signal(0);
        create_effect(move || {
            let child_log = log.clone();
            let child_value = value.clone();
            create_effect(move || {
                child_log
                    .borrow_mut()
                    .push(format!("child {}", child_value.get()));
            });
            log.borrow_mut().push(format!("parent {}", value.get()));
        });

        set_value.set(1).unwrap();

        assert_eq!(
            *seen.borrow(),
            vec!["child 0", "parent 0", "child 1", "parent 1"]
        );
    });
}

/// A write whose marking runs past the depth limit fails instead of
/// recursing further.
#[test]
fn marking_past_the_depth_limit_fails_the_write() {
    configure(RuntimeConfig {
        max_mark_depth: 3,
        ..RuntimeConfig::default()
    });

    create_root(|_| {
        let (runs, seen) = counter();
        let (source, set_source) = create_signal(0);
        let mut last = create_memo(move |_| source.get());
        for _ in 0..4 {
            let previous = last.clone();
            last = create_memo(move |_| previous.get() + 1);
        }
        create_effect(move || {
            last.get();
            runs.set(runs.get() + 1);
        });

        let result = set_source.set(1);
        assert_eq!(result, Err(ReactiveError::MarkDepthExceeded { depth: 4 }));
        assert!(result.unwrap_err().is_fatal());
        assert_eq!(seen.get(), 1);
    });

    configure(RuntimeConfig::default());
}

/// Ten thousand chained memos propagate under the default limits.
#[test]
fn long_memo_chain_propagates() {
    const LENGTH: usize = 10_000;

    let (observed, seen) = counter();
    let dispose = create_root(move |dispose| {
        let (source, set_source) = create_signal(0usize);
        // Links read their predecessor through a weak list, so dropping the
        // chain does not recurse through every memo.
        let chain: Rc<RefCell<Vec<Memo<usize>>>> = Rc::new(RefCell::new(Vec::new()));
        let head = create_memo(move |_| source.get() + 1);
        chain.borrow_mut().push(head);
        for index in 1..LENGTH {
            let links = Rc::downgrade(&chain);
            let memo = create_memo(move |_| {
                let Some(links) = links.upgrade() else {
                    return 0;
                };
                let previous = links.borrow()[index - 1].clone();
                previous.get() + 1
            });
            chain.borrow_mut().push(memo);
        }
        let tail = chain.borrow()[LENGTH - 1].clone();
        create_effect(move || observed.set(tail.get()));

        assert_eq!(chain.borrow()[LENGTH - 1].get_untracked(), LENGTH);
        assert_eq!(set_source.set(1), Ok(()));
        dispose
    });

    assert_eq!(seen.get(), LENGTH + 1);
    dispose.dispose();
}

/// The reference scenario: two batched writes, one log entry, one recompute.
#[test]
fn batched_sum_scenario() {
    create_root(|_| {
        let (computes, seen_computes) = counter();
        let (log, seen) = recorder();
        let (a, set_a) = create_signal(1);
        let (b, set_b) = create_signal(2);
        let sum = create_memo(move |_| {
            computes.set(computes.get() + 1);
            a.get() + b.get()
        });
        create_effect(move || log.borrow_mut().push(sum.get()));

        batch(|| {
            set_a.set(10).unwrap();
            set_b.set(20).unwrap();
        })
        .unwrap();

        assert_eq!(*seen.borrow(), vec![3, 30]);
        // Once on creation, once for the batch.
        assert_eq!(seen_computes.get(), 2);
    });
}

/// One panicking effect does not stop its siblings or corrupt the graph.
#[test]
fn failing_effect_is_isolated() {
    create_root(|_| {
        let (log, seen) = recorder();
        let (value, set_value) = create_signal(1);
        let first = value.clone();
        create_effect(move || {
            first.get();
        });
        let failing = value.clone();
        create_effect(move || {
            if failing.get() % 2 == 0 {
                panic!("even values are not allowed");
            }
        });
        create_effect(move || log.borrow_mut().push(value.get()));

        set_value.set(2).unwrap();
        set_value.set(3).unwrap();

        assert_eq!(*seen.borrow(), vec![1, 2, 3]);
        let errors = take_errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("even values are not allowed"));
    });
}

/// A memo that panics drops the children it created in that run.
#[test]
fn failing_memo_disposes_its_children() {
    create_root(|_| {
        let (cleaned, seen) = counter();
        let (fail, set_fail) = create_signal(false);
        let guarded = create_memo(move |_| {
            let cleaned = cleaned.clone();
            create_effect(move || {
                let cleaned = cleaned.clone();
                on_cleanup(move || cleaned.set(cleaned.get() + 1));
            });
            assert!(!fail.get(), "refusing to compute");
            1
        });

        set_fail.set(true).unwrap();
        assert_eq!(guarded.try_get(), Ok(1));
        // The first run's child went on re-run, the failed run's child on rollback.
        assert_eq!(seen.get(), 2);
        assert_eq!(take_errors().len(), 1);
    });
}

/// An effect that keeps writing what it reads is stopped.
#[test]
fn runaway_feedback_is_detected() {
    configure(RuntimeConfig {
        max_flush_iterations: 1_000,
        ..RuntimeConfig::default()
    });

    create_root(|_| {
        let (count, set_count) = create_signal(0);
        let feedback = set_count.clone();
        let reader = count.clone();
        create_effect(move || {
            let n = reader.get();
            if n > 0 {
                feedback.set(n + 1).unwrap();
            }
        });

        let result = set_count.set(1);
        assert!(matches!(result, Err(ReactiveError::InfiniteLoop { .. })));
        assert!(result.unwrap_err().is_fatal());

        // The graph is still usable afterwards.
        assert_eq!(set_count.set(0), Ok(()));
        assert_eq!(count.get_untracked(), 0);
    });

    configure(RuntimeConfig::default());
}

#[traced_test]
#[test]
fn unowned_effect_logs_a_warning() {
    let (a, _set_a) = create_signal(1);
    create_effect(move || {
        a.get();
    });
    assert!(logs_contain("will never be disposed"));
}

#[traced_test]
#[test]
fn unowned_warning_can_be_disabled() {
    configure(RuntimeConfig {
        warn_unowned: false,
        ..RuntimeConfig::default()
    });
    create_effect(|| {});
    on_cleanup(|| {});
    assert!(!logs_contain("will never"));
    configure(RuntimeConfig::default());
}

#[test]
fn effects_ready_hook_sees_each_round() {
    let (rounds, seen) = recorder();
    set_effects_ready_hook(move |count| rounds.borrow_mut().push(count));

    create_root(|_| {
        let (a, set_a) = create_signal(0);
        let (b, set_b) = create_signal(0);
        let first = a.clone();
        create_effect(move || {
            first.get();
        });
        create_effect(move || {
            // Feeds a second round.
            set_b.set(a.get()).unwrap();
        });
        create_effect(move || {
            b.get();
        });

        set_a.set(1).unwrap();
    });
    clear_effects_ready_hook();

    assert_eq!(*seen.borrow(), vec![2, 1]);
}

#[test]
fn config_loads_from_json() {
    let config = RuntimeConfig::from_json(
        r#"{ "max_flush_iterations": 500, "warn_unowned": false, "error_log_capacity": 8 }"#,
    )
    .unwrap();
    configure(config.clone());

    assert_eq!(current_config(), config);
    assert_eq!(current_config().max_mark_depth, 100_000);
    configure(RuntimeConfig::default());
}
