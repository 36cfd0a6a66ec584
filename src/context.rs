// Copyright Christian Daley 2021
// Copyright Frank Mori Hess 2007-2008.
// Distributed under the Boost Software License, Version 1.0.
// See http://www.boost.org/LICENSE_1_0.txt

//! The thread-local emission context: "who is currently running?" and "should emission stop?",
//! queryable from inside a running slot without any explicit plumbing, per SPEC_FULL.md §4.7.

use std::cell::RefCell;
use std::sync::Weak;

use crate::connect::Connection;
use crate::signal_core::ErasedNode;

struct EmissionState {
    current_connection: Option<Weak<dyn ErasedNode>>,
    emission_aborted: bool,
}

thread_local! {
    static STATE: RefCell<EmissionState> = RefCell::new(EmissionState {
        current_connection: None,
        emission_aborted: false,
    });
}

/// A handle to the slot currently executing on the calling thread, valid only from inside a
/// running slot; outside of one it is always disconnected and cannot be used to affect anything.
///
/// # Examples
/// ```
/// use signal_dispatch::*;
///
/// let sig: Signal<()> = Signal::new();
/// sig.connect(|| {
///     signal_dispatch::current_connection().disconnect();
/// });
/// sig.emit();
/// sig.emit();
/// assert_eq!(sig.count(), 0);
/// ```
pub fn current_connection() -> Connection {
    let weak = STATE.with(|state| state.borrow().current_connection.clone());
    match weak {
        Some(weak) => Connection::from_weak(weak),
        None => Connection::empty(),
    }
}

/// Sets the innermost emission's abort flag on the calling thread. Remaining slots in that
/// emission are skipped; they are not disconnected and will run normally next time.
///
/// # Examples
/// ```
/// use signal_dispatch::*;
///
/// let sig: Signal<()> = Signal::new();
/// sig.connect(|| signal_dispatch::abort_emission());
/// sig.connect(|| panic!("never runs"));
/// sig.emit();
/// ```
pub fn abort_emission() {
    STATE.with(|state| state.borrow_mut().emission_aborted = true);
}

pub(crate) fn is_aborted() -> bool {
    STATE.with(|state| state.borrow().emission_aborted)
}

/// RAII guard that saves and resets `emission_aborted` across one emission, and restores the
/// caller's prior flag (if any) on drop — including on an unwind, so a panicking slot cannot
/// leave a stale abort flag set for an unrelated, later emission on this thread.
pub(crate) struct AbortScope {
    previous: bool,
}

impl AbortScope {
    pub(crate) fn push() -> Self {
        let previous = STATE.with(|state| {
            let mut state = state.borrow_mut();
            std::mem::replace(&mut state.emission_aborted, false)
        });
        AbortScope { previous }
    }
}

impl Drop for AbortScope {
    fn drop(&mut self) {
        STATE.with(|state| state.borrow_mut().emission_aborted = self.previous);
    }
}

/// RAII guard that sets `current_connection` for the duration of one slot call and restores
/// whatever it was before (typically `None`, or an outer slot's node in a nested emission).
pub(crate) struct ConnectionScope {
    previous: Option<Weak<dyn ErasedNode>>,
}

impl ConnectionScope {
    pub(crate) fn push(node: Weak<dyn ErasedNode>) -> Self {
        let previous = STATE.with(|state| {
            let mut state = state.borrow_mut();
            std::mem::replace(&mut state.current_connection, Some(node))
        });
        ConnectionScope { previous }
    }
}

impl Drop for ConnectionScope {
    fn drop(&mut self) {
        STATE.with(|state| {
            state.borrow_mut().current_connection = self.previous.take();
        });
    }
}
