// Copyright Christian Daley 2021
// Copyright Frank Mori Hess 2007-2008.
// Distributed under the Boost Software License, Version 1.0.
// See http://www.boost.org/LICENSE_1_0.txt

//! Per-arity `emit`/`try_emit`/`invoke`/`try_invoke` traits, so callers pass plain positional
//! arguments instead of hand-building the `Args` tuple. See SPEC_FULL.md §4.6.

use crate::combiner::Collector;
use crate::error::InvocationSlotError;
use crate::policy::Policy;
use crate::Signal;

macro_rules! impl_emit {
    ($name:ident; $($args:ident)*; $($params:ident)*) => {
        /// Emit trait for signals whose slots accept the corresponding number of arguments.
        pub trait $name<R, C, P, $($args,)*>
        where
            ($($args,)*): Clone + Send + 'static,
            R: Send + 'static,
            C: Collector<R>,
            P: Policy,
        {
            /// Runs every connected slot with the given arguments and combines their return
            /// values with the signal's configured collector.
            fn emit(&self, $($params: $args,)*) -> C::Output;

            /// Identical to [`emit`](Self::emit), but returns any panics raised by slots instead
            /// of letting them propagate out of emission.
            fn try_emit(&self, $($params: $args,)*) -> (C::Output, Option<InvocationSlotError>);

            /// Runs every connected slot, combining return values with `collector` instead of the
            /// signal's own configured collector.
            fn invoke<C2: Collector<R>>(&self, collector: &C2, $($params: $args,)*) -> C2::Output;

            /// Identical to [`invoke`](Self::invoke), but returns any panics raised by slots
            /// instead of letting them propagate out of emission.
            fn try_invoke<C2: Collector<R>>(&self, collector: &C2, $($params: $args,)*) -> (C2::Output, Option<InvocationSlotError>);
        }

        impl<R, C, P, $($args,)*> $name<R, C, P, $($args,)*> for Signal<($($args,)*), R, C, P>
        where
            ($($args,)*): Clone + Send + 'static,
            R: Send + 'static,
            C: Collector<R>,
            P: Policy,
        {
            fn emit(&self, $($params: $args,)*) -> C::Output {
                let (output, error) = self.core.emit(&($($params,)*));
                if let Some(error) = error {
                    panic::resume_slot_panic(error);
                }
                output
            }

            fn try_emit(&self, $($params: $args,)*) -> (C::Output, Option<InvocationSlotError>) {
                self.core.emit(&($($params,)*))
            }

            fn invoke<C2: Collector<R>>(&self, collector: &C2, $($params: $args,)*) -> C2::Output {
                let (output, error) = self.core.emit_with(&($($params,)*), collector);
                if let Some(error) = error {
                    panic::resume_slot_panic(error);
                }
                output
            }

            fn try_invoke<C2: Collector<R>>(&self, collector: &C2, $($params: $args,)*) -> (C2::Output, Option<InvocationSlotError>) {
                self.core.emit_with(&($($params,)*), collector)
            }
        }
    };
}

impl_emit!(Emit0;;);
impl_emit!(Emit1; T0; a);
impl_emit!(Emit2; T0 T1; a b);
impl_emit!(Emit3; T0 T1 T2; a b c);
impl_emit!(Emit4; T0 T1 T2 T3; a b c d);
impl_emit!(Emit5; T0 T1 T2 T3 T4; a b c d e);
impl_emit!(Emit6; T0 T1 T2 T3 T4 T5; a b c d e f);
impl_emit!(Emit7; T0 T1 T2 T3 T4 T5 T6; a b c d e f g);
impl_emit!(Emit8; T0 T1 T2 T3 T4 T5 T6 T7; a b c d e f g h);
impl_emit!(Emit9; T0 T1 T2 T3 T4 T5 T6 T7 T8; a b c d e f g h i);
impl_emit!(Emit10; T0 T1 T2 T3 T4 T5 T6 T7 T8 T9; a b c d e f g h i j);
impl_emit!(Emit11; T0 T1 T2 T3 T4 T5 T6 T7 T8 T9 T10; a b c d e f g h i j k);
impl_emit!(Emit12; T0 T1 T2 T3 T4 T5 T6 T7 T8 T9 T10 T11; a b c d e f g h i j k l);

mod panic {
    use crate::error::InvocationSlotError;

    /// `emit`/`invoke` propagate a slot panic as a real panic rather than swallowing it; callers
    /// who want the error value instead use `try_emit`/`try_invoke`.
    pub(crate) fn resume_slot_panic(error: InvocationSlotError) -> ! {
        panic!("{}", error);
    }
}
