// Copyright Christian Daley 2021
// Copyright Frank Mori Hess 2007-2008.
// Distributed under the Boost Software License, Version 1.0.
// See http://www.boost.org/LICENSE_1_0.txt

//! Per-arity `connect` traits, so callers pass a closure of the natural arity instead of one
//! that takes the `Args` tuple directly.

use std::sync::Arc;

use crate::combiner::Collector;
use crate::connect::Connection;
use crate::policy::Policy;
use crate::signal_core::{ConnectFlags, ErasedNode};
use crate::Signal;

macro_rules! impl_connect {
    ($name:ident; $($args:ident)*; $($params:ident)*) => {
        /// Connect trait for signals with slots that accept the corresponding number of
        /// arguments.
        pub trait $name<R, C, P, $($args,)*>
        where
            ($($args,)*): Clone + Send + 'static,
            R: Send + 'static,
            C: Collector<R>,
            P: Policy,
        {
            /// Connects `f`, honoring the given [`ConnectFlags`].
            fn connect_with_flags<F>(&self, f: F, flags: ConnectFlags) -> Connection
            where
                F: Fn($($args,)*) -> R + Send + Sync + 'static;

            /// Connects `f` at the back of the slot list, run directly on the emitting thread.
            /// Equivalent to `connect_with_flags(f, ConnectFlags::new())`.
            fn connect<F>(&self, f: F) -> Connection
            where
                F: Fn($($args,)*) -> R + Send + Sync + 'static,
            {
                self.connect_with_flags(f, ConnectFlags::new())
            }

            /// Connects `f` at the front of the slot list. A slot connected this way during an
            /// emission is not visited by that emission.
            fn connect_first<F>(&self, f: F) -> Connection
            where
                F: Fn($($args,)*) -> R + Send + Sync + 'static,
            {
                self.connect_with_flags(f, ConnectFlags::new().first_slot())
            }

            /// Connects `f` so that it runs on the connecting thread's dispatch queue instead of
            /// directly on the emitting thread. See [`crate::dispatch_queued_calls`].
            fn connect_queued<F>(&self, f: F) -> Connection
            where
                F: Fn($($args,)*) -> R + Send + Sync + 'static,
            {
                self.connect_with_flags(f, ConnectFlags::new().queued())
            }
        }

        impl<R, C, P, $($args,)*> $name<R, C, P, $($args,)*> for Signal<($($args,)*), R, C, P>
        where
            ($($args,)*): Clone + Send + 'static,
            R: Send + 'static,
            C: Collector<R>,
            P: Policy,
        {
            fn connect_with_flags<F>(&self, f: F, flags: ConnectFlags) -> Connection
            where
                F: Fn($($args,)*) -> R + Send + Sync + 'static,
            {
                let wrapped = move |($($params,)*): ($($args,)*)| f($($params,)*);
                let node = self.core.connect(Box::new(wrapped), flags);
                let erased: Arc<dyn ErasedNode> = node;
                Connection::new(Arc::downgrade(&erased))
            }
        }
    };
}

impl_connect!(Connect0;;);
impl_connect!(Connect1; T0; a);
impl_connect!(Connect2; T0 T1; a b);
impl_connect!(Connect3; T0 T1 T2; a b c);
impl_connect!(Connect4; T0 T1 T2 T3; a b c d);
impl_connect!(Connect5; T0 T1 T2 T3 T4; a b c d e);
impl_connect!(Connect6; T0 T1 T2 T3 T4 T5; a b c d e f);
impl_connect!(Connect7; T0 T1 T2 T3 T4 T5 T6; a b c d e f g);
impl_connect!(Connect8; T0 T1 T2 T3 T4 T5 T6 T7; a b c d e f g h);
impl_connect!(Connect9; T0 T1 T2 T3 T4 T5 T6 T7 T8; a b c d e f g h i);
impl_connect!(Connect10; T0 T1 T2 T3 T4 T5 T6 T7 T8 T9; a b c d e f g h i j);
impl_connect!(Connect11; T0 T1 T2 T3 T4 T5 T6 T7 T8 T9 T10; a b c d e f g h i j k);
impl_connect!(Connect12; T0 T1 T2 T3 T4 T5 T6 T7 T8 T9 T10 T11; a b c d e f g h i j k l);
