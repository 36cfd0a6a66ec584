// Copyright Christian Daley 2021
// Copyright Frank Mori Hess 2007-2008.
// Distributed under the Boost Software License, Version 1.0.
// See http://www.boost.org/LICENSE_1_0.txt

//! A doubly-linked list whose nodes never move and whose erased nodes remain walkable.
//!
//! This is the data structure that makes safe re-entrant emission possible: an iterator that is
//! sitting on a node when that node (or some other node) is erased can still advance to whatever
//! live node comes next, because erasure only clears the erased node's `prev` link and relinks
//! its neighbors — it never touches the erased node's own `next` link.
//!
//! Ownership flows in one direction only: every node's `next` is a strong `Arc`, and every node's
//! `prev` is a `Weak`. A node is kept alive solely by its predecessor's `next` pointer (or, for
//! the first live node, by `head.next`) — never by both neighbors at once — so the list forms a
//! plain forward chain rather than a reference cycle, and dropping it deallocates every node in
//! turn instead of leaking.

use std::sync::{Arc, Mutex, Weak};

struct Links<T> {
    prev: Option<Weak<Node<T>>>,
    next: Option<Arc<Node<T>>>,
}

/// A single list node. Sentinels (`head`/`tail`) carry `payload: None`; every other node carries
/// `Some(payload)` for its entire lifetime, even after it is erased.
pub struct Node<T> {
    links: Mutex<Links<T>>,
    payload: Option<T>,
}

impl<T> Node<T> {
    fn sentinel() -> Arc<Self> {
        Arc::new(Node {
            links: Mutex::new(Links { prev: None, next: None }),
            payload: None,
        })
    }

    fn with_payload(payload: T) -> Arc<Self> {
        Arc::new(Node {
            links: Mutex::new(Links { prev: None, next: None }),
            payload: Some(payload),
        })
    }

    /// The node's payload. `None` only for the list's internal sentinels, which a caller of this
    /// module never observes directly.
    pub fn payload(&self) -> Option<&T> {
        self.payload.as_ref()
    }

    /// A clone of the link to the next node. Defined even for an erased node: erasure never
    /// clears a node's own `next`, only its `prev` and its former neighbors' links.
    pub fn next(&self) -> Option<Arc<Node<T>>> {
        self.links.lock().unwrap().next.clone()
    }

    /// `true` for a live (connected) payload-carrying node; `false` once the node has been
    /// erased. Always `false` for a sentinel, which is never visited as a "live" node by list
    /// consumers.
    pub fn is_linked(&self) -> bool {
        self.links.lock().unwrap().prev.is_some()
    }
}

/// A stable doubly-linked list. `T` is typically itself wrapped in further shared state (see
/// [`crate::signal_core::NodeData`]); the list only ever needs to move `Arc<Node<T>>` pointers
/// around.
pub struct List<T> {
    head: Arc<Node<T>>,
    tail: Arc<Node<T>>,
}

impl<T> List<T> {
    pub fn new() -> Self {
        let head = Node::sentinel();
        let tail = Node::sentinel();
        head.links.lock().unwrap().next = Some(tail.clone());
        tail.links.lock().unwrap().prev = Some(Arc::downgrade(&head));
        List { head, tail }
    }

    /// The sentinel preceding every live node. `head.next()` is the first live node, if any.
    pub fn head(&self) -> &Arc<Node<T>> {
        &self.head
    }

    /// The sentinel terminating the list. Iteration stops on reaching this node by pointer
    /// identity, never by dereferencing it.
    pub fn tail(&self) -> &Arc<Node<T>> {
        &self.tail
    }

    /// Splices a new node carrying `payload` immediately before `anchor`, and returns it.
    /// `anchor` must currently be linked into this list (it is always either `tail`, for
    /// `push_back`, or `head.next()`, for `push_front`).
    pub fn insert_before(&self, anchor: &Arc<Node<T>>, payload: T) -> Arc<Node<T>> {
        let node = Node::with_payload(payload);

        let prev = {
            let anchor_links = anchor.links.lock().unwrap();
            anchor_links
                .prev
                .as_ref()
                .expect("anchor must be linked")
                .upgrade()
                .expect("anchor's predecessor outlives anchor while anchor is linked")
        };

        // `prev` currently owns `anchor` strongly through its `next`; hand that ownership to
        // `node` instead, so `node` becomes `anchor`'s sole predecessor in the forward chain.
        prev.links.lock().unwrap().next = Some(node.clone());

        {
            let mut node_links = node.links.lock().unwrap();
            node_links.prev = Some(Arc::downgrade(&prev));
            node_links.next = Some(anchor.clone());
        }

        anchor.links.lock().unwrap().prev = Some(Arc::downgrade(&node));

        node
    }

    /// Appends `payload` just before `tail`. Because emission re-reads `current.next()` after
    /// every step, a slot appended while an emission is in progress is still visited by that
    /// emission if the walk has not yet passed `tail`.
    pub fn push_back(&self, payload: T) -> Arc<Node<T>> {
        self.insert_before(&self.tail, payload)
    }

    /// Inserts `payload` just after `head`, i.e. before every currently-connected slot. A slot
    /// connected this way during an emission is *not* visited by that emission, since the walk
    /// has already passed `head.next()` by the time any slot executes.
    pub fn push_front(&self, payload: T) -> Arc<Node<T>> {
        let first = self.head.next().expect("head always has a next pointer");
        self.insert_before(&first, payload)
    }

    /// Unlinks `node` from its neighbors and clears its own `prev`, marking it a tombstone. Its
    /// `next` is left untouched so that any reference retained to `node` (an outstanding
    /// `Connection`, or an in-flight emission's `current`) can still walk forward.
    ///
    /// Erasing a node that is already erased, or erasing a sentinel, is a safe no-op.
    pub fn erase(&self, node: &Arc<Node<T>>) {
        erase(node.as_ref())
    }

    /// Unlinks every live node. Each node's own `next` is preserved, exactly as in a single
    /// `erase`, so any in-flight emission converges on `tail` rather than observing a broken
    /// chain.
    pub fn clear(&self) {
        let mut current = self.head.next();
        while let Some(node) = current {
            if Arc::ptr_eq(&node, &self.tail) {
                break;
            }
            current = node.next();
            self.erase(&node);
        }

        self.head.links.lock().unwrap().next = Some(self.tail.clone());
        self.tail.links.lock().unwrap().prev = Some(Arc::downgrade(&self.head));
    }

    /// The number of currently-linked (connected) nodes. Tombstones reachable only through
    /// outstanding handles or in-flight iterators are not counted.
    pub fn len_live(&self) -> usize {
        let mut count = 0;
        let mut current = self.head.next();
        while let Some(node) = current {
            if Arc::ptr_eq(&node, &self.tail) {
                break;
            }
            if node.is_linked() {
                count += 1;
            }
            current = node.next();
        }
        count
    }

    pub fn is_empty(&self) -> bool {
        self.len_live() == 0
    }
}

impl<T> Default for List<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Unlinks `node` from its neighbors and clears its own `prev`, marking it a tombstone.
///
/// A free function rather than a `List` method: a node's own [`ErasedNode`](crate::signal_core)
/// disconnect path needs to unlink itself from `&self` without holding on to (or even knowing)
/// the `List` it once belonged to, and without reconstructing an `Arc<Node<T>>` from a borrow to
/// do it — the link pointers carried by the node and its neighbors are enough on their own.
///
/// Erasing a node that is already erased, or erasing a sentinel, is a safe no-op. Erasing a node
/// whose predecessor has itself already been fully dropped (only possible once the owning list
/// itself is gone) is also a no-op, since there is nothing left to relink.
pub fn erase<T>(node: &Node<T>) {
    if node.payload.is_none() {
        return;
    }

    let (prev, next) = {
        let mut node_links = node.links.lock().unwrap();
        let prev_weak = match node_links.prev.take() {
            Some(prev) => prev,
            None => return, // already erased
        };
        let prev = match prev_weak.upgrade() {
            Some(prev) => prev,
            None => return,
        };
        let next = node_links.next.clone().expect("linked node always has a next");
        (prev, next)
    };

    prev.links.lock().unwrap().next = Some(next.clone());
    next.links.lock().unwrap().prev = Some(Arc::downgrade(&prev));
}
