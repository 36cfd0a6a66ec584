// Copyright Christian Daley 2021
// Copyright Frank Mori Hess 2007-2008.
// Distributed under the Boost Software License, Version 1.0.
// See http://www.boost.org/LICENSE_1_0.txt

//! Tracked slots, which disconnect themselves once an object they depend on is gone, and
//! [`TrackedConnections`], a container that disconnects every connection it holds on drop.

use std::sync::{Arc, Weak};

/// An object a slot can depend on. A slot connected with `connect_tracked` checks
/// `is_alive` just before every call and disconnects itself the first time it reports `false`,
/// instead of running against a dangling dependency.
pub trait Trackable: Send + Sync {
    /// `false` once the tracked object is gone and the slot should stop running.
    fn is_alive(&self) -> bool;
}

impl<T: Send + Sync + 'static> Trackable for Weak<T> {
    fn is_alive(&self) -> bool {
        self.strong_count() > 0
    }
}

impl<T: Trackable> Trackable for Arc<T> {
    fn is_alive(&self) -> bool {
        (**self).is_alive()
    }
}

/// Disconnects every connection it holds when dropped. Useful for grouping the lifetime of a set
/// of slots with some owning object, without hand-rolling a `Vec<ScopedConnection>`.
///
/// # Examples
/// ```
/// use signal_dispatch::*;
///
/// let sig: Signal<()> = Signal::new();
/// let mut group = TrackedConnections::new();
/// group.push(sig.connect(|| {}));
/// assert_eq!(sig.count(), 1);
/// drop(group);
/// assert_eq!(sig.count(), 0);
/// ```
#[derive(Default)]
pub struct TrackedConnections {
    connections: Vec<crate::connect::ScopedConnection>,
}

impl TrackedConnections {
    /// Creates an empty group.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `connection` to the group. It will be disconnected when the group is dropped, or
    /// earlier, by [`TrackedConnections::disconnect_all`].
    pub fn push(&mut self, connection: crate::connect::Connection) {
        self.connections.push(connection.scoped());
    }

    /// Disconnects every connection currently in the group and empties it.
    pub fn disconnect_all(&mut self) {
        self.connections.clear();
    }

    /// The number of connections currently held by the group.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// `true` if the group holds no connections.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn weak_reports_alive_only_while_the_arc_lives() {
        let owner = Arc::new(());
        let weak = Arc::downgrade(&owner);
        assert!(weak.is_alive());
        drop(owner);
        assert!(!weak.is_alive());
    }

    #[test]
    fn tracked_connections_disconnects_everything_on_drop() {
        let mut group = TrackedConnections::new();
        assert!(group.is_empty());
        group.disconnect_all();
        assert_eq!(group.len(), 0);
    }
}
