// Copyright Christian Daley 2021
// Copyright Frank Mori Hess 2007-2008.
// Distributed under the Boost Software License, Version 1.0.
// See http://www.boost.org/LICENSE_1_0.txt

//! # signal_dispatch
//!
//! `signal_dispatch` is a signal/slot event dispatch library based on the
//! [boost::signals2](https://www.boost.org/doc/libs/1_76_0/doc/html/signals2.html) C++ library.
//! [Signals](Signal) are objects that contain a list of callback functions ("slots") to be
//! executed when the signal is "emitted". Signals and their slots are managed through
//! [connections](Connection) and [shared connection blocks](SharedConnectionBlock).
//!
//! Slots may run either directly on the emitting thread or, for a
//! [`Synchronized`](policy::Synchronized) signal, on the thread that connected them, via
//! [`dispatch_queued_calls`]. A slot may inspect or influence the emission it is running inside
//! of through [`current_connection`] and [`abort_emission`].
//!
//! `signal_dispatch` contains no unsafe code and is distributed under the
//! [Boost Software License, Version 1.0](https://www.boost.org/LICENSE_1_0.txt).

#![deny(missing_docs)]

use std::sync::{Arc, Weak};

use signal_core::{ErasedNode, SignalCore};
use trackable::Trackable;

mod signal_core;
mod stable_list;
#[doc(inline)]
pub use signal_core::ConnectFlags;

/// The `Collector` trait and the standard collectors.
pub mod combiner;
use combiner::{Collector, DefaultCollector};

/// Thread-safety policies a [`Signal`] can be parameterized over.
pub mod policy;
use policy::Policy;
pub use policy::{Synchronized, Unsynchronized};

/// Defines the `emit` family of traits for signals.
pub mod emit;
#[doc(inline)]
pub use emit::{
    Emit0, Emit1, Emit10, Emit11, Emit12, Emit2, Emit3, Emit4, Emit5, Emit6, Emit7, Emit8, Emit9,
};

/// Connection handles and shared connection blocks.
pub mod connect;
#[doc(inline)]
pub use connect::{Connection, ScopedConnection, ScopedConnectionBlocker, SharedConnectionBlock};

/// Defines the `connect` family of traits for signals.
pub mod connect_traits;
#[doc(inline)]
pub use connect_traits::{
    Connect0, Connect1, Connect10, Connect11, Connect12, Connect2, Connect3, Connect4, Connect5,
    Connect6, Connect7, Connect8, Connect9,
};

/// The thread-local emission context queried from inside a running slot.
pub mod context;
#[doc(inline)]
pub use context::{abort_emission, current_connection};

/// The process-wide dispatch queue backing queued connections.
pub mod dispatch;
#[doc(inline)]
pub use dispatch::dispatch_queued_calls;

/// Tracked slots and the [`trackable::TrackedConnections`] container.
pub mod trackable;
#[doc(inline)]
pub use trackable::TrackedConnections;

/// The error returned by the `try_emit`/`try_invoke` family when one or more slots panic.
pub mod error;
#[doc(inline)]
pub use error::InvocationSlotError;

/// A handle to a signal whose slot functions accept arguments of type `Args` (given as a tuple)
/// and return `R`. `C` is the [`Collector`] used to combine slot return values into the
/// emission's result, and `P` is the [threading policy](policy) the signal is synchronized under.
///
/// # Examples
/// ```
/// use signal_dispatch::*;
///
/// let sig: Signal<()> = Signal::new();
/// sig.connect(|| println!("Hello, world!"));
/// sig.emit(); // prints "Hello, world!"
/// ```
/// The only required type parameter is the tuple of argument types the connected slots accept.
/// ```
/// use signal_dispatch::*;
///
/// let sig: Signal<(i32, i32)> = Signal::new();
/// sig.connect(|x, y| println!("x + y = {}", x + y));
/// sig.emit(2, 3); // prints "x + y = 5"
/// ```
/// A single-argument signal still needs a one-element tuple type, written with a trailing comma:
/// ```
/// use signal_dispatch::*;
///
/// let sig: Signal<(i32,)> = Signal::new(); // Signal<(i32)> or Signal<i32> will not compile
/// sig.connect(|x| println!("x = {}", x));
/// sig.emit(7); // prints "x = 7"
/// ```
/// Slot functions can return values, combined by the signal's [`Collector`]. The default
/// collector keeps the last slot's value, wrapped in `Some`, or `None` if no slot ran.
/// ```
/// use signal_dispatch::*;
///
/// let sig: Signal<(i32, i32), i32> = Signal::new();
/// assert_eq!(sig.emit(2, 3), None); // no slots connected yet
/// sig.connect(|x, y| x + y);
/// assert_eq!(sig.emit(2, 3), Some(5));
/// ```
pub struct Signal<Args, R = (), C = DefaultCollector, P = Unsynchronized>
where
    Args: Clone + Send + 'static,
    R: Send + 'static,
    C: Collector<R> + 'static,
    P: Policy,
{
    core: Arc<SignalCore<Args, R, C, P>>,
}

impl<Args, R, C, P> Clone for Signal<Args, R, C, P>
where
    Args: Clone + Send + 'static,
    R: Send + 'static,
    C: Collector<R> + 'static,
    P: Policy,
{
    /// A `Signal` is a handle to a shared list of slots; cloning it produces another handle to
    /// the same slots, not an independent copy.
    ///
    /// # Examples
    /// ```
    /// use signal_dispatch::*;
    ///
    /// let sig1: Signal<()> = Signal::new();
    /// let sig2 = sig1.clone();
    /// sig1.connect(|| println!("Hello, world!"));
    /// sig2.emit(); // prints "Hello, world!"; sig1 and sig2 share the same slots
    /// ```
    fn clone(&self) -> Self {
        Self { core: self.core.clone() }
    }
}

impl<Args, R, C, P> Signal<Args, R, C, P>
where
    Args: Clone + Send + 'static,
    R: Send + 'static,
    C: Collector<R> + 'static,
    P: Policy,
{
    /// Creates a new signal with the given [`Collector`].
    pub fn new_with_collector(collector: C) -> Self {
        Signal {
            core: Arc::new(SignalCore::new(collector)),
        }
    }

    /// Creates a [`WeakSignal`] holding a weak reference to this signal's slots.
    pub fn weak(&self) -> WeakSignal<Args, R, C, P> {
        WeakSignal {
            weak_core: Arc::downgrade(&self.core),
        }
    }

    /// Replaces the signal's collector.
    pub fn set_collector(&self, collector: C) {
        self.core.set_collector(collector);
    }

    /// Disconnects every slot currently connected. Outstanding [`Connection`]s for those slots
    /// become (and remain) disconnected; new slots may still be connected afterward.
    pub fn clear(&self) {
        self.core.clear();
    }

    /// The number of slots currently connected.
    pub fn count(&self) -> usize {
        self.core.count()
    }

    /// Connects a slot that checks `tracked` for liveness before every call. The first time
    /// `tracked.is_alive()` reports `false`, the slot disconnects itself instead of running.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use signal_dispatch::*;
    ///
    /// let sig: Signal<()> = Signal::new();
    /// let owner = Arc::new(());
    /// sig.connect_tracked(Arc::downgrade(&owner), || println!("still alive"));
    /// sig.emit(); // prints "still alive"
    /// drop(owner);
    /// sig.emit(); // prints nothing, and the slot disconnects itself
    /// assert_eq!(sig.count(), 0);
    /// ```
    pub fn connect_tracked<F>(&self, tracked: impl Trackable + 'static, f: F) -> Connection
    where
        F: Fn(Args) -> R + Send + Sync + 'static,
        R: Default,
    {
        let slot = move |args: Args| {
            if tracked.is_alive() {
                f(args)
            } else {
                context::current_connection().disconnect();
                R::default()
            }
        };
        let node = self.core.connect(Box::new(slot), ConnectFlags::new());
        let erased: Arc<dyn ErasedNode> = node;
        Connection::new(Arc::downgrade(&erased))
    }
}

impl<Args, R, C, P> Signal<Args, R, C, P>
where
    Args: Clone + Send + 'static,
    R: Send + 'static,
    C: Collector<R> + Default + 'static,
    P: Policy,
{
    /// Creates a new signal with `C::default()` as its collector.
    pub fn new() -> Self {
        Self::new_with_collector(C::default())
    }
}

impl<Args, R, C, P> Default for Signal<Args, R, C, P>
where
    Args: Clone + Send + 'static,
    R: Send + 'static,
    C: Collector<R> + Default + 'static,
    P: Policy,
{
    fn default() -> Self {
        Self::new()
    }
}

/// A weak reference to a signal's slots, useful for letting a slot hold a persistent reference
/// to its own signal without creating a reference cycle.
///
/// # Examples
/// ```
/// use signal_dispatch::*;
///
/// let sig: Signal<()> = Signal::new();
/// let weak_sig = sig.weak();
/// sig.connect(move || {
///     // A slot that captured a cloned `sig` here would leak: signals hold strong references
///     // to their slots, so a slot must not hold a strong reference back to its own signal.
///     weak_sig.upgrade().unwrap().connect(|| println!("Hello, world!"));
/// });
///
/// sig.emit(); // prints nothing
/// sig.emit(); // prints "Hello, world!" once
/// sig.emit(); // prints "Hello, world!" twice
/// ```
pub struct WeakSignal<Args, R = (), C = DefaultCollector, P = Unsynchronized>
where
    Args: Clone + Send + 'static,
    R: Send + 'static,
    C: Collector<R> + 'static,
    P: Policy,
{
    weak_core: Weak<SignalCore<Args, R, C, P>>,
}

impl<Args, R, C, P> Clone for WeakSignal<Args, R, C, P>
where
    Args: Clone + Send + 'static,
    R: Send + 'static,
    C: Collector<R> + 'static,
    P: Policy,
{
    fn clone(&self) -> Self {
        Self {
            weak_core: self.weak_core.clone(),
        }
    }
}

impl<Args, R, C, P> WeakSignal<Args, R, C, P>
where
    Args: Clone + Send + 'static,
    R: Send + 'static,
    C: Collector<R> + 'static,
    P: Policy,
{
    /// Returns `Some(signal)` if the signal this handle was created from (or one of its clones)
    /// is still alive, or `None` if every handle to it has been dropped.
    pub fn upgrade(&self) -> Option<Signal<Args, R, C, P>> {
        self.weak_core.upgrade().map(|core| Signal { core })
    }
}
