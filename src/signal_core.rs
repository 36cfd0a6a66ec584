// Copyright Christian Daley 2021
// Copyright Frank Mori Hess 2007-2008.
// Distributed under the Boost Software License, Version 1.0.
// See http://www.boost.org/LICENSE_1_0.txt

//! The connection node, the type-erased handle surface over it, and the signal's slot list.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::ThreadId;

use crate::combiner::Collector;
use crate::context;
use crate::error::InvocationSlotError;
use crate::policy::Policy;
use crate::stable_list::{self, List, Node};

/// Whether a newly-connected slot is spliced in at the front or the back of the list, and whether
/// it should run directly on the emitting thread or be routed through its connecting thread's
/// dispatch mailbox.
///
/// Mirrors the distilled spec's flag bitset `{direct, queued, connect_as_first_slot}`; `direct`
/// and `queued` are mutually exclusive so they are modeled as the two states of one field rather
/// than two independent booleans.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConnectFlags {
    pub(crate) queued: bool,
    pub(crate) first_slot: bool,
}

impl ConnectFlags {
    /// The default flags: direct dispatch, appended at the back of the slot list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Splices the new slot immediately after the signal's sentinel head instead of at the back.
    /// A slot connected this way during an emission is not visited by that emission.
    pub fn first_slot(mut self) -> Self {
        self.first_slot = true;
        self
    }

    /// Routes execution of this slot through the connecting thread's dispatch mailbox rather than
    /// running it directly on the emitting thread. Only meaningful under
    /// [`crate::policy::Synchronized`]; ignored (treated as direct) under
    /// [`crate::policy::Unsynchronized`], which has no notion of "the connecting thread".
    pub fn queued(mut self) -> Self {
        self.queued = true;
        self
    }
}

/// The payload carried by each live node in a signal's slot list.
pub(crate) struct NodeData<Args, R, P: Policy> {
    slot: Box<dyn Fn(Args) -> R + Send + Sync>,
    blocked: AtomicBool,
    blocker_count: AtomicUsize,
    owner_thread: Option<ThreadId>,
    shared_lock: P::Lock,
}

pub(crate) type SlotNode<Args, R, P> = Node<NodeData<Args, R, P>>;

/// Type-erased view over a connection node, independent of the signal's `Args`/`R`/`Collector`
/// types. [`crate::Connection`] holds a `Weak<dyn ErasedNode>`, which is what lets one connection
/// type serve every signal instantiation.
pub(crate) trait ErasedNode: Send + Sync {
    fn is_connected(&self) -> bool;
    fn is_blocked(&self) -> bool;
    fn blocker_count(&self) -> usize;
    fn add_blocker(&self, lock_first: bool);
    fn remove_blocker(&self);
    fn disconnect(&self);
    fn ptr_id(&self) -> usize;
}

impl<Args, R, P> ErasedNode for SlotNode<Args, R, P>
where
    Args: 'static,
    R: 'static,
    P: Policy,
{
    fn is_connected(&self) -> bool {
        self.is_linked()
    }

    fn is_blocked(&self) -> bool {
        self.payload()
            .map(|data| data.blocker_count.load(Ordering::SeqCst) != 0)
            .unwrap_or(true)
    }

    fn blocker_count(&self) -> usize {
        self.payload()
            .map(|data| data.blocker_count.load(Ordering::SeqCst))
            .unwrap_or(usize::MAX)
    }

    fn add_blocker(&self, lock_first: bool) {
        if let Some(data) = self.payload() {
            let bump = || {
                data.blocker_count.fetch_add(1, Ordering::SeqCst);
                data.blocked.store(true, Ordering::SeqCst);
            };
            if lock_first {
                P::with_lock(&data.shared_lock, bump);
            } else {
                bump();
            }
        }
    }

    fn remove_blocker(&self) {
        if let Some(data) = self.payload() {
            if data.blocker_count.fetch_sub(1, Ordering::SeqCst) == 1 {
                data.blocked.store(false, Ordering::SeqCst);
            }
        }
    }

    fn disconnect(&self) {
        stable_list::erase(self);
    }

    fn ptr_id(&self) -> usize {
        self as *const Self as *const () as usize
    }
}

impl<Args, R, P: Policy> NodeData<Args, R, P> {
    fn new(slot: Box<dyn Fn(Args) -> R + Send + Sync>, owner_thread: Option<ThreadId>, shared_lock: P::Lock) -> Self {
        Self {
            slot,
            blocked: AtomicBool::new(false),
            blocker_count: AtomicUsize::new(0),
            owner_thread,
            shared_lock,
        }
    }

    pub(crate) fn slot(&self) -> &(dyn Fn(Args) -> R + Send + Sync) {
        &*self.slot
    }

    pub(crate) fn owner_thread(&self) -> Option<ThreadId> {
        self.owner_thread
    }
}

/// The slot list and default collector owned by a [`crate::Signal`]. Cheap to clone (an `Arc`
/// bump); every clone of a `Signal` shares the same `SignalCore`.
pub(crate) struct SignalCore<Args, R, C, P: Policy> {
    list: List<NodeData<Args, R, P>>,
    lock: P::Lock,
    collector: Mutex<C>,
}

impl<Args, R, C, P> SignalCore<Args, R, C, P>
where
    Args: Clone + Send + 'static,
    R: Send + 'static,
    C: Collector<R>,
    P: Policy,
{
    pub(crate) fn new(collector: C) -> Self {
        Self {
            list: List::new(),
            lock: P::new_lock(),
            collector: Mutex::new(collector),
        }
    }

    pub(crate) fn set_collector(&self, collector: C) {
        *self.collector.lock().unwrap() = collector;
    }

    pub(crate) fn connect(
        &self,
        slot: Box<dyn Fn(Args) -> R + Send + Sync>,
        flags: ConnectFlags,
    ) -> Arc<SlotNode<Args, R, P>> {
        let owner_thread = if flags.queued {
            P::current_thread_for_queueing()
        } else {
            None
        };

        P::with_lock(&self.lock, || {
            let data = NodeData::new(slot, owner_thread, self.lock.clone());
            if flags.first_slot {
                self.list.push_front(data)
            } else {
                self.list.push_back(data)
            }
        })
    }

    pub(crate) fn clear(&self) {
        P::with_lock(&self.lock, || self.list.clear());
    }

    pub(crate) fn count(&self) -> usize {
        self.list.len_live()
    }

    pub(crate) fn emit(&self, args: &Args) -> (C::Output, Option<InvocationSlotError>) {
        let collector = self.collector.lock().unwrap();
        self.emit_with(args, &*collector)
    }

    /// Runs the emission algorithm described in SPEC_FULL.md §4.4 against an arbitrary collector,
    /// so `Signal::invoke::<C2>` can override the signal's configured collector per call without
    /// duplicating the traversal logic.
    pub(crate) fn emit_with<C2>(&self, args: &Args, collector: &C2) -> (C2::Output, Option<InvocationSlotError>)
    where
        C2: Collector<R>,
    {
        let _abort_scope = context::AbortScope::push();
        let mut panicked_slots = 0usize;

        let end = self.list.tail().clone();
        let mut current = P::with_lock(&self.lock, || self.list.head().next().unwrap());

        let values = std::iter::from_fn(|| loop {
            // List walking (reading the current node's connectedness/blocked state) happens under
            // the signal's lock; the slot call itself runs with the lock released so a re-entrant
            // `connect`/`disconnect`/`emit` from within the slot cannot deadlock against this
            // emission. Crucially, `current` is only advanced to `node.next()` *after* the slot
            // has run (see SPEC_FULL.md §4.4 step 2): a slot that appends a new node before `tail`
            // while it executes must still be visited by this same emission, which only works if
            // the successor pointer is re-read post-call rather than pre-fetched.
            let step = P::with_lock(&self.lock, || {
                if Arc::ptr_eq(&current, &end) {
                    return None;
                }
                let node = current.clone();
                let runnable = node.is_linked()
                    && node
                        .payload()
                        .map(|data| data.blocker_count.load(Ordering::SeqCst) == 0)
                        .unwrap_or(false);
                Some((node, runnable))
            });

            let (node, runnable) = match step {
                Some(step) => step,
                None => return None,
            };

            if !runnable {
                current = P::with_lock(&self.lock, || node.next().unwrap());
                if context::is_aborted() {
                    return None;
                }
                continue;
            }

            let erased: Arc<dyn ErasedNode> = node.clone();
            let _conn_scope = context::ConnectionScope::push(Arc::downgrade(&erased));

            let call_args = args.clone();
            let result = crate::dispatch::dispatch(node.clone(), call_args);

            current = P::with_lock(&self.lock, || node.next().unwrap());

            if context::is_aborted() {
                if result.is_err() {
                    panicked_slots += 1;
                }
                return None;
            }

            match result {
                Ok(value) => return Some(value),
                Err(_) => {
                    panicked_slots += 1;
                    continue;
                }
            }
        });

        let output = collector.combine(values);

        let error = if panicked_slots > 0 {
            Some(InvocationSlotError::new(panicked_slots))
        } else {
            None
        };

        (output, error)
    }
}

/// Wraps a slot call in `catch_unwind` so one panicking slot cannot abort emission for the rest.
/// Used by both direct dispatch (`dispatch.rs`) and the thread draining its queued calls, so the
/// two paths share one panic boundary.
pub(crate) fn call_slot<Args, R>(slot: &(dyn Fn(Args) -> R + Send + Sync), args: Args) -> std::thread::Result<R> {
    panic::catch_unwind(AssertUnwindSafe(|| slot(args)))
}
