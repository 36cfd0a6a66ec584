// Copyright Christian Daley 2021
// Copyright Frank Mori Hess 2007-2008.
// Distributed under the Boost Software License, Version 1.0.
// See http://www.boost.org/LICENSE_1_0.txt

//! The process-wide, thread-sharded dispatch queue backing queued connections, and the direct-vs-
//! queued dispatch decision described in SPEC_FULL.md §4.5.

use std::any::{Any, TypeId};
use std::collections::{HashMap, VecDeque};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, OnceLock};
use std::thread::ThreadId;

use crate::policy::Policy;
use crate::signal_core::{self, SlotNode};

type QueuedCall = Box<dyn FnOnce() + Send>;

static QUEUES: OnceLock<Mutex<HashMap<ThreadId, VecDeque<QueuedCall>>>> = OnceLock::new();

fn queues() -> &'static Mutex<HashMap<ThreadId, VecDeque<QueuedCall>>> {
    QUEUES.get_or_init(|| Mutex::new(HashMap::new()))
}

fn enqueue(owner: ThreadId, call: QueuedCall) {
    queues().lock().unwrap().entry(owner).or_default().push_back(call);
}

/// Runs every call currently queued for the calling thread, in FIFO enqueue order, then returns.
/// Calls enqueued by other threads *while* this drain is running are left for the next drain —
/// this function takes one snapshot of the calling thread's bucket rather than looping until it
/// observes an empty queue, so a slot that keeps re-queueing itself cannot starve the caller.
pub fn dispatch_queued_calls() {
    let owner = std::thread::current().id();
    let pending = {
        let mut queues = queues().lock().unwrap();
        match queues.get_mut(&owner) {
            Some(bucket) => std::mem::take(bucket),
            None => return,
        }
    };

    for call in pending {
        call();
    }
}

/// Executes `node`'s slot with `args`, either directly on the calling thread or by routing
/// through the dispatch queue of the thread the slot was connected with
/// [`crate::signal_core::ConnectFlags::queued`].
pub(crate) fn dispatch<Args, R, P>(node: Arc<SlotNode<Args, R, P>>, args: Args) -> std::thread::Result<R>
where
    Args: Send + 'static,
    R: Send + 'static,
    P: Policy,
{
    let owner_thread = node.payload().and_then(|data| data.owner_thread());

    match owner_thread {
        Some(id) if id != std::thread::current().id() => dispatch_queued(id, node, args),
        _ => {
            let data = node.payload().expect("node outlives a dispatch call on it");
            signal_core::call_slot(data.slot(), args)
        }
    }
}

fn dispatch_queued<Args, R, P>(owner: ThreadId, node: Arc<SlotNode<Args, R, P>>, args: Args) -> std::thread::Result<R>
where
    Args: Send + 'static,
    R: Send + 'static,
    P: Policy,
{
    let (tx, rx) = mpsc::channel::<std::thread::Result<R>>();

    let task: QueuedCall = Box::new(move || {
        let result = match node.payload() {
            Some(data) => signal_core::call_slot(data.slot(), args),
            // The node was part of a list that has since been cleared; the slot itself is
            // unreachable from here (it lived behind the node's own payload), so there is
            // nothing to run. This cannot happen in practice since `disconnect`/`clear` never
            // drop a node's payload, only unlink it — kept as a defensive fallback.
            None => return,
        };
        let _ = tx.send(result);
    });

    enqueue(owner, task);

    // `R`'s emission contract is asymmetric by design (SPEC_FULL.md §4.5, §9): a void-returning
    // queued slot is fire-and-forget, so the emitting thread must not block on it. Since `R` is
    // generic here, the unit case is detected at runtime via `TypeId` and the placeholder value
    // is produced through a safe `Any` downcast rather than waiting on `rx`.
    if TypeId::of::<R>() == TypeId::of::<()>() {
        let boxed_unit: Box<dyn Any> = Box::new(());
        let value = *boxed_unit
            .downcast::<R>()
            .expect("R is statically known to be the unit type in this branch");
        Ok(value)
    } else {
        rx.recv()
            .expect("owning thread dropped its dispatch queue without draining this call")
    }
}
