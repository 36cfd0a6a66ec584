// Copyright Christian Daley 2021
// Copyright Frank Mori Hess 2007-2008.
// Distributed under the Boost Software License, Version 1.0.
// See http://www.boost.org/LICENSE_1_0.txt

use signal_dispatch::*;
use signal_dispatch::combiner::{DefaultVoidCollector, First, Last, Maximum, Minimum, Range};
use std::mem;
use std::sync::{atomic::AtomicUsize, atomic::Ordering, Arc};
use std::thread;
use std::time::Duration;

#[test]
fn basic_signal_test() {
    let sig: Signal<(i32,), i32> = Signal::new();
    assert_eq!(sig.count(), 0);
    assert_eq!(sig.emit(0), None);

    sig.connect(|x| x + 1);
    assert_eq!(sig.count(), 1);
    assert_eq!(sig.emit(0), Some(1));

    sig.connect(|x| x + 2);
    assert_eq!(sig.count(), 2);
    assert_eq!(sig.emit(0), Some(2));

    sig.clear();
    assert_eq!(sig.count(), 0);
    assert_eq!(sig.emit(0), None);
}

/// Invariant 1: a disconnected connection reports `is_connected() == false` forever after.
#[test]
fn disconnect_is_one_way() {
    let sig: Signal<()> = Signal::new();
    let conn = sig.connect(|| {});
    assert!(conn.is_connected());

    conn.disconnect();
    assert!(!conn.is_connected());

    // Reconnecting a new slot never revives the old handle.
    sig.connect(|| {});
    assert!(!conn.is_connected());
}

/// Invariant 2: `count()` tracks the number of connected slots exactly.
#[test]
fn count_tracks_connected_slots() {
    let counter = Arc::new(AtomicUsize::new(0));
    let inc = {
        let counter = counter.clone();
        move || {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    };

    let sig: Signal<()> = Signal::new();
    let conn1 = sig.connect(inc.clone());
    let conn2 = sig.connect(inc.clone());
    let conn2_copy = conn2.clone();
    let conn3 = sig.connect(inc).scoped();

    assert!(conn1.is_connected());
    assert!(conn2.is_connected());
    assert!(conn2_copy.is_connected());
    assert!(conn3.is_connected());
    assert_eq!(sig.count(), 3);

    sig.emit();
    assert_eq!(counter.load(Ordering::Relaxed), 3);
    counter.store(0, Ordering::Relaxed);

    conn1.disconnect();
    assert!(!conn1.is_connected());
    assert_eq!(sig.count(), 2);

    sig.emit();
    assert_eq!(counter.load(Ordering::Relaxed), 2);
    counter.store(0, Ordering::Relaxed);

    conn2.disconnect();
    assert!(!conn2.is_connected());
    assert!(!conn2_copy.is_connected());
    assert_eq!(sig.count(), 1);

    drop(conn3); // scoped: disconnects on drop
    assert_eq!(sig.count(), 0);

    sig.emit();
    assert_eq!(counter.load(Ordering::Relaxed), 0);
}

/// Invariant 3: emission order follows insertion order of currently connected slots.
#[test]
fn emission_order_follows_insertion_order() {
    let sig: Signal<(), i32, Range> = Signal::new_with_collector(Range);
    sig.connect(|| 1);
    sig.connect(|| 2);
    sig.connect(|| 3);
    assert_eq!(sig.emit(), vec![1, 2, 3]);
}

/// Invariant 4: a slot that disconnects itself during emission is not invoked again, in this
/// emission or any later one.
#[test]
fn self_disconnect_during_emission_is_permanent() {
    let calls = Arc::new(AtomicUsize::new(0));
    let sig: Signal<()> = Signal::new();

    let calls_clone = calls.clone();
    sig.connect(move || {
        calls_clone.fetch_add(1, Ordering::Relaxed);
        current_connection().disconnect();
    });
    sig.connect(|| {});

    sig.emit();
    assert_eq!(calls.load(Ordering::Relaxed), 1);
    assert_eq!(sig.count(), 1);

    sig.emit();
    assert_eq!(calls.load(Ordering::Relaxed), 1);
}

/// Invariant 5: a slot connected with `connect_first` during an in-progress emission is not
/// visited by that emission, only by later ones. Plain `connect` (append) during emission *is*
/// visited by the in-progress emission.
#[test]
fn connect_first_during_emission_is_not_visited_this_round() {
    let sig: Signal<(), i32, Range> = Signal::new_with_collector(Range);
    let weak_sig = sig.weak();

    sig.connect(move || {
        weak_sig.upgrade().unwrap().connect_first(|| 99);
        1
    });

    assert_eq!(sig.emit(), vec![1]);
    assert_eq!(sig.emit(), vec![99, 1]);
}

#[test]
fn connect_while_emitting_is_visited_by_the_same_emission() {
    let sig: Signal<(), i32, Range> = Signal::new_with_collector(Range);
    let weak_sig = sig.weak();

    sig.connect(move || {
        weak_sig.upgrade().unwrap().connect(|| 2);
        1
    });

    assert_eq!(sig.emit(), vec![1, 2]);
    assert_eq!(sig.emit(), vec![1, 2, 2]);
}

/// Invariant 6: destroying the signal leaves outstanding handles valid (no UB, no panic) and
/// permanently disconnected.
#[test]
fn dropping_the_signal_leaves_handles_disconnected() {
    let sig: Signal<()> = Signal::new();
    let conn = sig.connect(|| {});
    assert!(conn.is_connected());

    drop(sig);

    assert!(!conn.is_connected());
    conn.disconnect(); // must not panic
    let _ = conn.is_blocked(); // must not panic either
    assert_eq!(conn.blocker_count(), usize::MAX);
}

/// Invariant 7: a trackable receiver's destruction disconnects its slot before it can run again.
#[test]
fn tracked_slot_disconnects_once_its_dependency_is_gone() {
    let sig: Signal<()> = Signal::new();
    let owner = Arc::new(());
    let calls = Arc::new(AtomicUsize::new(0));

    let calls_clone = calls.clone();
    sig.connect_tracked(Arc::downgrade(&owner), move || {
        calls_clone.fetch_add(1, Ordering::Relaxed);
    });

    sig.emit();
    assert_eq!(calls.load(Ordering::Relaxed), 1);
    assert_eq!(sig.count(), 1);

    drop(owner);

    sig.emit();
    assert_eq!(calls.load(Ordering::Relaxed), 1);
    assert_eq!(sig.count(), 0);
}

#[test]
fn tracked_connections_group_disconnects_on_drop() {
    let sig: Signal<()> = Signal::new();
    let mut group = TrackedConnections::new();
    group.push(sig.connect(|| {}));
    group.push(sig.connect(|| {}));
    assert_eq!(sig.count(), 2);

    drop(group);
    assert_eq!(sig.count(), 0);
}

/// Invariant 8: blocking a connection skips it; other slots still run; unblocking restores it.
#[test]
fn shared_connection_block_test() {
    let sig: Signal<()> = Signal::new();
    let conn = sig.connect(|| ());

    assert!(sig.emit().is_some());

    {
        let block1 = conn.shared_block(true);
        assert!(conn.is_blocked());
        assert_eq!(conn.blocker_count(), 1);
        assert!(block1.blocking());
        assert!(sig.emit().is_none());

        let block2 = conn.shared_block(false);
        assert!(conn.is_blocked());
        assert_eq!(conn.blocker_count(), 1);
        assert!(!block2.blocking());

        let block3 = block1.clone();
        assert_eq!(conn.blocker_count(), 2);
        assert!(block3.blocking());

        block2.block();
        assert_eq!(conn.blocker_count(), 3);

        block1.unblock();
        block3.unblock();
        assert_eq!(conn.blocker_count(), 1);
        assert!(conn.is_blocked());

        block2.unblock();
        assert_eq!(conn.blocker_count(), 0);
        assert!(!conn.is_blocked());
        assert!(sig.emit().is_some());
    }

    assert_eq!(conn.blocker_count(), 0);
    assert!(!conn.is_blocked());
}

#[test]
fn other_slots_still_run_while_one_is_blocked() {
    let sig: Signal<(), i32, Range> = Signal::new_with_collector(Range);
    let conn = sig.connect(|| 1);
    sig.connect(|| 2);

    let block = conn.shared_block(true);
    assert_eq!(sig.emit(), vec![2]);
    block.unblock();
    assert_eq!(sig.emit(), vec![1, 2]);
}

/// Invariant 9: `First`, `Last`, `Minimum`, `Maximum` extract the expected extremum in emission
/// order; `Range` returns the full sequence.
#[test]
fn collectors_test() {
    let first: Signal<(), i32, First> = Signal::new_with_collector(First);
    let last: Signal<(), i32, Last> = Signal::new_with_collector(Last);
    let min: Signal<(), i32, Minimum> = Signal::new_with_collector(Minimum);
    let max: Signal<(), i32, Maximum> = Signal::new_with_collector(Maximum);

    first.connect(|| 5);
    first.connect(|| 1);
    first.connect(|| 9);
    assert_eq!(first.emit(), Some(5));

    last.connect(|| 5);
    last.connect(|| 1);
    last.connect(|| 9);
    assert_eq!(last.emit(), Some(9));

    min.connect(|| 5);
    min.connect(|| 1);
    min.connect(|| 9);
    assert_eq!(min.emit(), Some(1));

    max.connect(|| 5);
    max.connect(|| 1);
    max.connect(|| 9);
    assert_eq!(max.emit(), Some(9));
}

#[test]
fn current_connection_outside_a_slot_is_empty() {
    assert!(!current_connection().is_connected());
}

#[test]
fn abort_emission_stops_remaining_slots() {
    let ran_second = Arc::new(AtomicUsize::new(0));
    let sig: Signal<()> = Signal::new();

    sig.connect(|| abort_emission());
    let ran_second_clone = ran_second.clone();
    sig.connect(move || {
        ran_second_clone.fetch_add(1, Ordering::Relaxed);
    });

    sig.emit();
    assert_eq!(ran_second.load(Ordering::Relaxed), 0);

    // Aborting one emission does not affect the next.
    sig.emit();
    assert_eq!(ran_second.load(Ordering::Relaxed), 0); // first slot aborts every time
}

#[test]
fn panicking_slot_does_not_stop_other_slots_and_is_reported() {
    let sig: Signal<()> = Signal::new();
    let ran = Arc::new(AtomicUsize::new(0));

    sig.connect(|| panic!("boom"));
    let ran_clone = ran.clone();
    sig.connect(move || {
        ran_clone.fetch_add(1, Ordering::Relaxed);
    });

    let (_, error) = sig.try_emit();
    assert_eq!(ran.load(Ordering::Relaxed), 1);
    let error = error.expect("one slot panicked");
    assert_eq!(error.panicked_slots(), 1);
}

#[test]
fn emit_propagates_a_panic_as_invocation_slot_error() {
    let sig: Signal<()> = Signal::new();
    sig.connect(|| panic!("boom"));

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| sig.emit()));
    assert!(result.is_err());
}

#[test]
fn invoke_overrides_the_signals_configured_collector_for_one_call() {
    let sig: Signal<(), i32, Last> = Signal::new();
    sig.connect(|| 1);
    sig.connect(|| 2);
    sig.connect(|| 3);

    assert_eq!(sig.emit(), Some(3));
    assert_eq!(sig.invoke(&Range), vec![1, 2, 3]);
}

#[test]
fn signal_emitting_cloned_block_test() {
    // A `Signal` clone shares the same underlying core: blocking a connection while the other
    // clone's emission is in progress still takes effect for the node it's currently sitting on,
    // and a slot connected mid-emission after the blocked one is still reached by that emission
    // (it was spliced in before `tail`, which the walk hasn't passed yet).
    let sig: Signal<(), i32, Last, Synchronized> = Signal::new();
    let sig_clone = sig.clone();

    sig.connect(|| {
        thread::sleep(Duration::from_millis(200));
        0
    });

    let conn = sig.connect(|| 1);

    let thread = thread::spawn(move || sig_clone.emit());

    thread::sleep(Duration::from_millis(50));
    sig.connect(|| 2);
    let _block = conn.shared_block(true);
    let res = thread.join().unwrap();
    assert_eq!(res, Some(2));
}

#[test]
fn weak_signal_does_not_keep_the_signal_alive() {
    let sig: Signal<()> = Signal::new();
    let weak = sig.weak();
    assert!(weak.upgrade().is_some());
    mem::drop(sig);
    assert!(weak.upgrade().is_none());
}

#[test]
fn queued_void_slot_runs_on_its_owning_thread_without_blocking_the_emitter() {
    let sig: Signal<(), (), DefaultVoidCollector, Synchronized> =
        Signal::new_with_collector(DefaultVoidCollector);
    let ran = Arc::new(AtomicUsize::new(0));

    let worker = {
        let sig = sig.clone();
        let ran = ran.clone();
        thread::spawn(move || {
            sig.connect_queued(move || {
                ran.fetch_add(1, Ordering::Relaxed);
            });
            // Keep the worker thread alive long enough to drain its queue below.
            thread::sleep(Duration::from_millis(100));
            dispatch_queued_calls();
        })
    };

    thread::sleep(Duration::from_millis(20));
    sig.emit(); // does not block waiting for the queued void slot
    assert_eq!(ran.load(Ordering::Relaxed), 0);

    worker.join().unwrap();
    assert_eq!(ran.load(Ordering::Relaxed), 1);
}
