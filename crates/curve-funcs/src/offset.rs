//! Shifting a curve along x.
//!
//! [`Shift::Fixed`] moves every abscissa by the same amount.
//! [`Shift::Steps`] moves grid boundaries of a [`Duration`] by a number of
//! grid steps and maps abscissae in between linearly, so the shift stays
//! exact on grids whose spans differ in length (a 20h grid restarting each
//! day, calendar months).

use crate::handle::Handle;
use crate::link::{self, Dependent};
use curve_core::errors::Result;
use curve_core::{Curve, Interval, LazyDomain, Real, Subscription, UpdateNotifier};
use curve_time::Duration;
use std::rc::Rc;

/// How far an [`Offset`] moves its input.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Shift {
    /// Move by a constant distance.
    Fixed(Real),
    /// Move by `count` grid steps of `duration`.
    Steps {
        /// Number of steps; negative moves backwards.
        count: i32,
        /// The grid.
        duration: Duration,
    },
}

impl Shift {
    /// Input abscissa → output abscissa.
    pub fn forward(&self, x: Real) -> Real {
        match *self {
            Shift::Fixed(delta) => x + delta,
            Shift::Steps { count, duration } => remap(&duration, x, count),
        }
    }

    /// Output abscissa → input abscissa.
    pub fn backward(&self, x: Real) -> Real {
        match *self {
            Shift::Fixed(delta) => x - delta,
            Shift::Steps { count, duration } => remap(&duration, x, -count),
        }
    }

    fn interval(&self, interval: &Interval, forward: bool) -> Interval {
        if interval.is_empty() {
            return Interval::empty();
        }
        let map = |x| if forward { self.forward(x) } else { self.backward(x) };
        Interval::new(
            map(interval.start()),
            map(interval.end()),
            interval.start_open(),
            interval.end_open(),
        )
    }
}

/// Move `x` by `count` grid steps, keeping its relative position inside the
/// grid span.
fn remap(duration: &Duration, x: Real, count: i32) -> Real {
    if !x.is_finite() || count == 0 {
        return x;
    }
    let g0 = duration.floor(x);
    let t0 = duration.step(g0, count);
    if x == g0 {
        return t0;
    }
    let g1 = duration.next(g0);
    let t1 = duration.step(g1, count);
    t0 + (x - g0) / (g1 - g0) * (t1 - t0)
}

/// `x ↦ f(ψ(x))` where `ψ` undoes the [`Shift`].
#[derive(Debug)]
pub struct Offset {
    input: Handle,
    shift: Shift,
    notifier: UpdateNotifier,
    domain: LazyDomain,
    _subscriptions: Vec<Subscription>,
}

impl Offset {
    /// Shift `input`.
    ///
    /// # Errors
    /// A non-finite fixed distance.
    pub fn new(input: Handle, shift: Shift) -> Result<Rc<Self>> {
        if let Shift::Fixed(delta) = shift {
            curve_core::ensure_config!(delta.is_finite(), "offset must be finite, got {delta}");
        }
        Ok(Rc::new_cyclic(|this| Self {
            _subscriptions: link::subscribe(this, std::slice::from_ref(&input)),
            input,
            shift,
            notifier: UpdateNotifier::new(),
            domain: LazyDomain::new(),
        }))
    }

    /// The shift applied.
    pub fn shift(&self) -> Shift {
        self.shift
    }
}

impl Dependent for Offset {
    fn affected(&self, _source: usize, interval: &Interval) -> Interval {
        self.shift.interval(interval, true)
    }

    fn invalidate(&self, _source: usize, _interval: &Interval) {
        self.domain.invalidate();
    }
}

impl Curve for Offset {
    fn notifier(&self) -> &UpdateNotifier {
        &self.notifier
    }

    fn domain(&self) -> Interval {
        self.domain.get_or_compute(self.is_updating(), || {
            self.shift.interval(&self.input.domain(), true)
        })
    }

    fn min_step(&self) -> Real {
        self.input.min_step()
    }

    fn value(&self, x: Real) -> Option<Real> {
        if !self.domain().contains(x) {
            return None;
        }
        self.input.value(self.shift.backward(x))
    }

    fn next_defined(&self, x: Real, min_step: Real, limit: Option<Real>) -> Result<Option<Real>> {
        let next = self.input.next_defined(
            self.shift.backward(x),
            self.resolve_min_step(min_step),
            limit.map(|l| self.shift.backward(l)),
        )?;
        Ok(next.map(|n| self.shift.forward(n)))
    }

    fn previous_defined(
        &self,
        x: Real,
        min_step: Real,
        limit: Option<Real>,
    ) -> Result<Option<Real>> {
        let previous = self.input.previous_defined(
            self.shift.backward(x),
            self.resolve_min_step(min_step),
            limit.map(|l| self.shift.backward(l)),
        )?;
        Ok(previous.map(|p| self.shift.forward(p)))
    }
}
