// Copyright Christian Daley 2021
// Copyright Frank Mori Hess 2007-2008.
// Distributed under the Boost Software License, Version 1.0.
// See http://www.boost.org/LICENSE_1_0.txt

//! Connection handles: [`Connection`], [`ScopedConnection`], and [`SharedConnectionBlock`].

use std::hash::{Hash, Hasher};
use std::sync::{Mutex, Weak};

use crate::signal_core::ErasedNode;

/// The implementation shared by [`Connection`] and [`ScopedConnection`]. The const parameter
/// selects whether dropping the handle disconnects its slot.
pub struct ConnectionImpl<const SCOPED: bool> {
    node: Option<Weak<dyn ErasedNode>>,
}

impl<const SCOPED: bool> ConnectionImpl<SCOPED> {
    pub(crate) fn new(node: Weak<dyn ErasedNode>) -> Self {
        Self { node: Some(node) }
    }

    pub(crate) fn from_weak(node: Weak<dyn ErasedNode>) -> Self {
        Self::new(node)
    }

    /// A handle that was never connected to anything; always reports `is_connected() == false`.
    /// Returned by [`crate::current_connection`] when called outside of a running slot.
    pub(crate) fn empty() -> Self {
        Self { node: None }
    }

    fn upgrade(&self) -> Option<std::sync::Arc<dyn ErasedNode>> {
        self.node.as_ref().and_then(Weak::upgrade)
    }

    /// Returns `true` if the underlying slot is still connected. Returns `false` if the
    /// underlying signal, or just this one slot, no longer exists.
    pub fn is_connected(&self) -> bool {
        self.upgrade().map(|node| node.is_connected()).unwrap_or(false)
    }

    /// Disconnects the underlying slot. Idempotent: repeated calls, or calling after the
    /// underlying signal is gone, do nothing. Once disconnected, a slot can never be
    /// reconnected — a fresh `connect` call is required.
    pub fn disconnect(&self) {
        if let Some(node) = self.upgrade() {
            node.disconnect();
        }
    }

    /// Returns `true` if the underlying slot is currently blocked (by any
    /// [`SharedConnectionBlock`]). Returns `true` if the underlying slot or signal no longer
    /// exists, matching the conservative "don't invoke it" reading of a missing slot.
    pub fn is_blocked(&self) -> bool {
        self.upgrade().map(|node| node.is_blocked()).unwrap_or(true)
    }

    /// The number of [`SharedConnectionBlock`]s currently blocking this slot. `usize::MAX` if the
    /// slot or its signal no longer exists.
    pub fn blocker_count(&self) -> usize {
        self.upgrade().map(|node| node.blocker_count()).unwrap_or(usize::MAX)
    }

    #[must_use = "a SharedConnectionBlock unblocks as soon as it is dropped"]
    /// Creates a [`SharedConnectionBlock`] that can be used to temporarily block the underlying
    /// slot, independent of any other outstanding blocks on it.
    pub fn shared_block(&self, initially_blocking: bool) -> SharedConnectionBlock {
        SharedConnectionBlock::new(self.node.clone(), initially_blocking)
    }

    /// Exchanges the nodes pointed to by two handles.
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(&mut self.node, &mut other.node);
    }

    fn identity(&self) -> usize {
        self.upgrade().map(|node| node.ptr_id()).unwrap_or(0)
    }
}

impl<const SCOPED: bool> Clone for ConnectionImpl<SCOPED> {
    fn clone(&self) -> Self {
        Self { node: self.node.clone() }
    }
}

impl<const SCOPED: bool> PartialEq for ConnectionImpl<SCOPED> {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl<const SCOPED: bool> Eq for ConnectionImpl<SCOPED> {}

impl<const SCOPED: bool> Hash for ConnectionImpl<SCOPED> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

impl<const SCOPED: bool> Drop for ConnectionImpl<SCOPED> {
    /// Disconnects the slot if and only if this handle is scoped.
    fn drop(&mut self) {
        if SCOPED {
            self.disconnect();
        }
    }
}

impl ConnectionImpl<false> {
    /// Consumes a [`Connection`] and returns the equivalent [`ScopedConnection`], which
    /// disconnects automatically when dropped.
    #[must_use = "a ScopedConnection disconnects as soon as it is dropped"]
    pub fn scoped(mut self) -> ScopedConnection {
        ScopedConnection { node: self.node.take() }
    }
}

/// A handle to one slot registered with one signal. Carries no type information about the
/// signal's argument or return types — the same `Connection` type serves every `Signal`
/// instantiation.
///
/// Dropping a `Connection` does **not** disconnect its slot; use [`ScopedConnection`] for that.
///
/// # Examples
/// ```
/// use signal_dispatch::*;
///
/// let sig: Signal<(), i32> = Signal::new();
/// let conn = sig.connect(|| 4);
/// assert_eq!(sig.emit(), Some(4));
/// conn.disconnect();
/// assert_eq!(sig.emit(), None);
/// ```
pub type Connection = ConnectionImpl<false>;

/// Identical to [`Connection`], except that it disconnects its slot automatically when dropped.
///
/// # Examples
/// ```
/// use signal_dispatch::*;
///
/// let sig: Signal<(), i32> = Signal::new();
/// {
///     let _conn = sig.connect(|| 4).scoped();
///     assert_eq!(sig.emit(), Some(4));
/// }
/// assert_eq!(sig.emit(), None);
/// ```
pub type ScopedConnection = ConnectionImpl<true>;

/// A reference-counted block on a slot. Any number of `SharedConnectionBlock`s may exist for one
/// slot at a time; the slot is skipped by emission as long as at least one of them is blocking.
///
/// # Examples
/// ```
/// use signal_dispatch::*;
///
/// let sig: Signal<(), i32> = Signal::new();
/// let conn = sig.connect(|| 4);
/// assert_eq!(sig.emit(), Some(4));
///
/// let blocker = conn.shared_block(true);
/// assert_eq!(sig.emit(), None);
///
/// blocker.unblock();
/// assert_eq!(sig.emit(), Some(4));
/// ```
pub struct SharedConnectionBlock {
    node: Option<Weak<dyn ErasedNode>>,
    blocking: Mutex<bool>,
}

impl SharedConnectionBlock {
    fn new(node: Option<Weak<dyn ErasedNode>>, initially_blocking: bool) -> Self {
        let block = Self {
            node,
            blocking: Mutex::new(false),
        };
        if initially_blocking {
            block.set_blocking(true, true);
        }
        block
    }

    /// Starts blocking, if not already.
    pub fn block(&self) {
        if !self.blocking() {
            self.set_blocking(true, true);
        }
    }

    /// Stops blocking, if not already.
    pub fn unblock(&self) {
        if self.blocking() {
            self.set_blocking(false, false);
        }
    }

    /// `true` if this particular block is currently contributing to the slot's blocked count.
    /// Does not imply the slot itself is unblocked when this returns `false` — other blocks may
    /// still be active.
    pub fn blocking(&self) -> bool {
        *self.blocking.lock().unwrap()
    }

    fn set_blocking(&self, blocking: bool, lock_signal_first: bool) {
        if let Some(node) = self.node.as_ref().and_then(Weak::upgrade) {
            if blocking {
                node.add_blocker(lock_signal_first);
            } else {
                node.remove_blocker();
            }
        }
        *self.blocking.lock().unwrap() = blocking;
    }
}

impl Clone for SharedConnectionBlock {
    /// Creates an independent block on the same slot, starting in the same blocking state.
    fn clone(&self) -> Self {
        SharedConnectionBlock::new(self.node.clone(), self.blocking())
    }
}

impl Drop for SharedConnectionBlock {
    fn drop(&mut self) {
        self.unblock();
    }
}

/// Blocks a connection for a lexical scope and unblocks it on drop.
pub struct ScopedConnectionBlocker {
    _block: SharedConnectionBlock,
}

impl ScopedConnectionBlocker {
    /// Blocks `conn` for the lifetime of the returned guard.
    pub fn new(conn: &Connection) -> Self {
        ScopedConnectionBlocker {
            _block: conn.shared_block(true),
        }
    }
}
