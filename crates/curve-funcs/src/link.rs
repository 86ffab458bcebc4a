//! Forwarding of update passes from inputs to derived curves.
//!
//! A derived curve registers one prioritized observer per distinct input.
//! The callbacks hold a `Weak` reference to the derived curve, so inputs
//! never keep their dependents alive; dropping a derived curve drops its
//! [`Subscription`]s, which unregister the callbacks.

use crate::handle::Handle;
use curve_core::{Curve, Interval, Observer, Result, Subscription};
use std::rc::Weak;
use tracing::trace;

/// A curve whose values depend on other curves.
pub(crate) trait Dependent: Curve + 'static {
    /// The part of this curve's domain touched by a change of input
    /// `source` (index of the first occurrence in the input list) over
    /// `interval`.
    fn affected(&self, source: usize, interval: &Interval) -> Interval;

    /// Drop cached state derived from input `source` over `interval`.
    fn invalidate(&self, source: usize, interval: &Interval);
}

/// Subscribe `this` to every distinct curve in `inputs`.
pub(crate) fn subscribe<D: Dependent>(this: &Weak<D>, inputs: &[Handle]) -> Vec<Subscription> {
    let mut subscriptions = Vec::new();
    for (source, input) in inputs.iter().enumerate() {
        if inputs[..source].iter().any(|seen| seen.ptr_eq(input)) {
            continue;
        }
        let on_begin = this.clone();
        let on_end = this.clone();
        let observer = Observer::new()
            .on_begin(move |interval| forward(&on_begin, source, interval, true))
            .on_end(move |interval| forward(&on_end, source, interval, false))
            .prioritized();
        subscriptions.push(Subscription::new(input.curve().clone(), observer));
    }
    subscriptions
}

fn forward<D: Dependent>(
    this: &Weak<D>,
    source: usize,
    interval: &Interval,
    begin: bool,
) -> Result<()> {
    let Some(curve) = this.upgrade() else {
        return Ok(());
    };
    let affected = curve.affected(source, interval);
    trace!(source, %interval, %affected, begin, "forwarding update");
    curve.invalidate(source, interval);
    if begin {
        curve.begin_update(&affected)
    } else {
        curve.end_update(&affected)
    }
}
