// Copyright Christian Daley 2021
// Copyright Frank Mori Hess 2007-2008.
// Distributed under the Boost Software License, Version 1.0.
// See http://www.boost.org/LICENSE_1_0.txt

//! Threading policies for [`Signal`](crate::Signal).
//!
//! A signal is parameterized by a [`Policy`] that decides whether list mutation and emission
//! need to synchronize against other threads at all. [`Unsynchronized`] costs nothing; it is
//! correct only when a signal (and every handle to it) never crosses a thread boundary.
//! [`Synchronized`] is always correct and additionally unlocks queued connections, at the cost of
//! a shared lock acquired around every `connect`/`disconnect`/`clear` and briefly during `emit`.

use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::ThreadId;

/// Selects the synchronization strategy used by a [`Signal`](crate::Signal) and the nodes it
/// owns.
///
/// This is a sealed, zero-sized marker trait; the only implementors are [`Unsynchronized`] and
/// [`Synchronized`]. Modeling the choice as a compile-time type parameter (rather than a runtime
/// flag or erased trait object) means the compiler proves at the call site whether a given
/// `Signal` can cross threads, and a single-threaded signal pays nothing for synchronization it
/// will never need.
pub trait Policy: private::Sealed + Clone + Send + Sync + 'static {
    /// The lock type shared between a signal and every node it owns.
    type Lock: Clone + Send + Sync;

    /// Creates a fresh, unlocked lock.
    fn new_lock() -> Self::Lock;

    /// Acquires the lock for the duration of the closure. A no-op under [`Unsynchronized`].
    fn with_lock<T>(lock: &Self::Lock, f: impl FnOnce() -> T) -> T;

    /// Returns the identity of a thread a queued slot should run on, or `None` for direct
    /// ("any thread") dispatch. Always `None` under [`Unsynchronized`], since queued connections
    /// are a multi-threaded-only feature.
    fn current_thread_for_queueing() -> Option<ThreadId>;
}

/// Single-threaded policy: no locking, no queued connections. All operations on a `Signal<.., ..,
/// .., Unsynchronized>` must happen on one thread; re-entrant emission on that thread remains
/// safe because the stable list tolerates mutation under iteration.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unsynchronized;

impl Policy for Unsynchronized {
    type Lock = ();

    fn new_lock() -> Self::Lock {}

    fn with_lock<T>(_lock: &Self::Lock, f: impl FnOnce() -> T) -> T {
        f()
    }

    fn current_thread_for_queueing() -> Option<ThreadId> {
        None
    }
}

/// Multi-threaded policy: every signal owns a shared, reference-counted mutex; connection nodes
/// hold a reference to it so `disconnect` on an outstanding handle stays well-defined even after
/// the owning signal has been dropped. Enables queued connections (see [`crate::dispatch`]).
#[derive(Clone, Debug, Default)]
pub struct Synchronized;

impl Policy for Synchronized {
    type Lock = Arc<Mutex<()>>;

    fn new_lock() -> Self::Lock {
        Arc::new(Mutex::new(()))
    }

    fn with_lock<T>(lock: &Self::Lock, f: impl FnOnce() -> T) -> T {
        let _guard: MutexGuard<'_, ()> = match lock.lock() {
            Ok(guard) => guard,
            // A panicking slot call cannot be allowed to poison the signal for every future
            // emission; recover the guard and carry on.
            Err(poisoned) => poisoned.into_inner(),
        };
        f()
    }

    fn current_thread_for_queueing() -> Option<ThreadId> {
        Some(std::thread::current().id())
    }
}

mod private {
    pub trait Sealed {}
    impl Sealed for super::Unsynchronized {}
    impl Sealed for super::Synchronized {}
}
