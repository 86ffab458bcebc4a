//! Alternating local extremes of an input around a reference curve.
//!
//! The input's defined samples are grouped into runs that stay above or
//! below the reference. Each completed run contributes one point: the
//! maximum of a run above the reference, the minimum of a run below it. A
//! sample equal to the reference continues the current run. The last run
//! is still open and contributes nothing until the input crosses the
//! reference again.
//!
//! Between the points the curve is linear, so it traces the swings of the
//! input.

use crate::handle::Handle;
use crate::link::{self, Dependent};
use curve_core::errors::Result;
use curve_core::{Curve, Interval, Real, Subscription, UpdateNotifier};
use curve_math::interpolation::{self, Interpolation};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{trace, warn};

/// Alternating minima and maxima of `input` relative to `reference`.
#[derive(Debug)]
pub struct Extremas {
    input: Handle,
    reference: Handle,
    notifier: UpdateNotifier,
    points: RefCell<Option<Rc<[(Real, Real)]>>>,
    _subscriptions: Vec<Subscription>,
}

#[derive(Debug, Clone, Copy)]
struct Run {
    above: bool,
    extreme: (Real, Real),
}

impl Extremas {
    /// Track the swings of `input` around `reference`.
    pub fn new(input: Handle, reference: Handle) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            _subscriptions: link::subscribe(this, &[input.clone(), reference.clone()]),
            input,
            reference,
            notifier: UpdateNotifier::new(),
            points: RefCell::new(None),
        })
    }

    /// The extremes found so far, in ascending x.
    pub fn extremes(&self) -> Rc<[(Real, Real)]> {
        if let Some(points) = self.points.borrow().as_ref() {
            return Rc::clone(points);
        }
        let points: Rc<[(Real, Real)]> = match self.scan() {
            Ok(points) => points.into(),
            Err(err) => {
                warn!(%err, "extremas input cannot be walked");
                Rc::from(Vec::new())
            }
        };
        if !self.is_updating() {
            *self.points.borrow_mut() = Some(Rc::clone(&points));
        }
        points
    }

    fn scan(&self) -> Result<Vec<(Real, Real)>> {
        let domain = self.input.domain();
        let mut points = Vec::new();
        if domain.is_empty() || !domain.start().is_finite() {
            return Ok(points);
        }
        let limit = domain.end().is_finite().then(|| domain.end());
        let mut cursor = if domain.contains(domain.start()) {
            Some(domain.start())
        } else {
            self.input.next_defined(domain.start(), 0.0, limit)?
        };
        let mut run: Option<Run> = None;
        while let Some(x) = cursor {
            if let (Some(y), Some(r)) = (self.input.value(x), self.reference.value(x)) {
                let above = if y == r {
                    run.map_or(true, |run| run.above)
                } else {
                    y > r
                };
                run = Some(match run {
                    Some(current) if current.above == above => {
                        let better = if above {
                            y > current.extreme.1
                        } else {
                            y < current.extreme.1
                        };
                        if better {
                            Run {
                                above,
                                extreme: (x, y),
                            }
                        } else {
                            current
                        }
                    }
                    Some(finished) => {
                        points.push(finished.extreme);
                        Run {
                            above,
                            extreme: (x, y),
                        }
                    }
                    None => Run {
                        above,
                        extreme: (x, y),
                    },
                });
            }
            cursor = self.input.next_defined(x, 0.0, limit)?;
        }
        trace!(count = points.len(), "scanned extremas");
        Ok(points)
    }
}

impl Dependent for Extremas {
    fn affected(&self, _source: usize, interval: &Interval) -> Interval {
        if interval.is_empty() {
            return Interval::empty();
        }
        let cached = self.points.borrow().clone();
        let Some(points) = cached else {
            return Interval::infinite();
        };
        // The run holding the last extreme before the change may grow
        // backwards to the one before it.
        let before = points.partition_point(|p| p.0 < interval.start());
        let start = match before.checked_sub(2) {
            Some(i) => points[i].0,
            None => Real::NEG_INFINITY,
        };
        Interval::new(start, Real::INFINITY, false, true)
    }

    fn invalidate(&self, _source: usize, _interval: &Interval) {
        self.points.borrow_mut().take();
    }
}

impl Curve for Extremas {
    fn notifier(&self) -> &UpdateNotifier {
        &self.notifier
    }

    fn domain(&self) -> Interval {
        let points = self.extremes();
        match (points.first(), points.last()) {
            (Some(first), Some(last)) => Interval::closed(first.0, last.0),
            _ => Interval::empty(),
        }
    }

    fn min_step(&self) -> Real {
        self.input.min_step()
    }

    fn value(&self, x: Real) -> Option<Real> {
        let points = self.extremes();
        let xs: Vec<Real> = points.iter().map(|p| p.0).collect();
        let i = interpolation::locate_previous(&xs, x)?;
        let left = (points[i].0, Some(points[i].1));
        if left.0 == x {
            return left.1;
        }
        let right = points.get(i + 1).map(|&(x1, y1)| (x1, Some(y1)))?;
        Interpolation::Linear.interpolate(x, left, right)
    }

    fn next_defined(&self, x: Real, min_step: Real, limit: Option<Real>) -> Result<Option<Real>> {
        let target = x + self.resolve_min_step(min_step);
        let points = self.extremes();
        let next = points.iter().map(|p| p.0).find(|&px| px >= target);
        Ok(next.filter(|&n| limit.map_or(true, |l| n <= l)))
    }

    fn previous_defined(
        &self,
        x: Real,
        min_step: Real,
        limit: Option<Real>,
    ) -> Result<Option<Real>> {
        let target = x - self.resolve_min_step(min_step);
        let points = self.extremes();
        let previous = points.iter().rev().map(|p| p.0).find(|&px| px <= target);
        Ok(previous.filter(|&p| limit.map_or(true, |l| p >= l)))
    }
}
