// Copyright Christian Daley 2021
// Copyright Frank Mori Hess 2007-2008.
// Distributed under the Boost Software License, Version 1.0.
// See http://www.boost.org/LICENSE_1_0.txt

//! The [`Collector`] trait and the standard collectors listed in SPEC_FULL.md §4.6.

/// Types that can aggregate the sequence of values returned by a signal's slots into a single
/// output.
///
/// `iter` lazily runs the signal's slots: the first slot isn't called until `iter.next()` is
/// invoked for the first time, the second isn't called until the second `next()`, and so on.
/// Consuming `iter` is what drives emission — a collector that never touches `iter` causes no
/// slots to run at all.
pub trait Collector<R> {
    /// The aggregated output type, which may differ from the per-slot return type `R`.
    type Output;

    /// Combines the (lazily produced) per-slot return values into the collector's output.
    fn combine(&self, iter: impl Iterator<Item = R>) -> Self::Output;
}

/// Keeps the value returned by the *first* slot executed, ignoring the rest. `None` if no slot
/// ran.
#[derive(Clone, Copy, Debug, Default)]
pub struct First;

impl<R> Collector<R> for First {
    type Output = Option<R>;

    fn combine(&self, mut iter: impl Iterator<Item = R>) -> Option<R> {
        iter.next()
    }
}

/// Keeps the value returned by the *last* slot executed; every slot still runs. `None` if no slot
/// ran. This is also the signal's default collector (`DefaultCollector<T>` in SPEC_FULL.md §4.6).
#[derive(Clone, Copy, Debug, Default)]
pub struct Last;

impl<R> Collector<R> for Last {
    type Output = Option<R>;

    fn combine(&self, iter: impl Iterator<Item = R>) -> Option<R> {
        iter.last()
    }
}

/// The default collector for a signal returning `R`: `Option<R>`, holding the last slot's return
/// value, or `None` if no slot ran.
pub type DefaultCollector = Last;

/// The default collector for a `void`-returning signal (`Args -> ()`): running every connected
/// slot and discarding the (unit) results.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultVoidCollector;

impl Collector<()> for DefaultVoidCollector {
    type Output = ();

    fn combine(&self, iter: impl Iterator<Item = ()>) {
        iter.for_each(|_| {});
    }
}

/// Keeps the smallest of the slot return values seen, per their [`Ord`] impl. Every slot runs.
/// `None` if no slot ran.
#[derive(Clone, Copy, Debug, Default)]
pub struct Minimum;

impl<R: Ord> Collector<R> for Minimum {
    type Output = Option<R>;

    fn combine(&self, iter: impl Iterator<Item = R>) -> Option<R> {
        iter.min()
    }
}

/// Keeps the largest of the slot return values seen, per their [`Ord`] impl. Every slot runs.
/// `None` if no slot ran.
#[derive(Clone, Copy, Debug, Default)]
pub struct Maximum;

impl<R: Ord> Collector<R> for Maximum {
    type Output = Option<R>;

    fn combine(&self, iter: impl Iterator<Item = R>) -> Option<R> {
        iter.max()
    }
}

/// Collects every slot's return value, in emission order.
#[derive(Clone, Copy, Debug, Default)]
pub struct Range;

impl<R> Collector<R> for Range {
    type Output = Vec<R>;

    fn combine(&self, iter: impl Iterator<Item = R>) -> Vec<R> {
        iter.collect()
    }
}
