//! Running integral of an input from its first defined abscissa.
//!
//! The integral is a sum of segment areas between consecutive defined
//! abscissae of the input. Each segment is integrated for an
//! [`Interpolation`] policy, which should match how the input behaves
//! between its samples: a step curve integrates to a piecewise linear one.
//!
//! The area up to every visited knot is cached as a checkpoint. An input
//! update drops the checkpoints at or after the start of the changed
//! interval.

use crate::handle::Handle;
use crate::link::{self, Dependent};
use curve_core::errors::Result;
use curve_core::{Curve, Interval, LazyDomain, Real, Subscription, UpdateNotifier};
use curve_math::integrals::segment_area;
use curve_math::interpolation::{self, Interpolation};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{trace, warn};

/// `F(x) = c + ∫ f` from the first defined x of `f` (or from 0 when `f` is
/// defined towards −∞).
#[derive(Debug)]
pub struct Integral {
    input: Handle,
    interpolation: Interpolation,
    constant: Real,
    notifier: UpdateNotifier,
    domain: LazyDomain,
    checkpoints: RefCell<Vec<(Real, Real)>>,
    _subscriptions: Vec<Subscription>,
}

impl Integral {
    /// Integrate `input` as a piecewise linear curve, starting at zero.
    pub fn new(input: Handle) -> Rc<Self> {
        Self::with_options(input, Interpolation::Linear, 0.0)
    }

    /// Integrate `input` with the given segment policy, starting at
    /// `constant`.
    pub fn with_options(input: Handle, interpolation: Interpolation, constant: Real) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            _subscriptions: link::subscribe(this, std::slice::from_ref(&input)),
            input,
            interpolation,
            constant,
            notifier: UpdateNotifier::new(),
            domain: LazyDomain::new(),
            checkpoints: RefCell::new(Vec::new()),
        })
    }

    /// The abscissa at which the integral equals its constant.
    pub fn origin(&self) -> Option<Real> {
        let domain = self.domain();
        if domain.is_empty() {
            None
        } else if domain.is_negative_infinite() {
            Some(0.0)
        } else {
            Some(domain.start())
        }
    }

    fn compute_domain(&self) -> Interval {
        let input = self.input.domain();
        if input.is_empty() || input.is_negative_infinite() {
            return input;
        }
        let start = if input.contains(input.start()) && self.input.value(input.start()).is_some() {
            Some(input.start())
        } else {
            let limit = input.end().is_finite().then(|| input.end());
            match self.input.next_defined(input.start(), 0.0, limit) {
                Ok(start) => start,
                Err(err) => {
                    warn!(%err, "integral origin cannot be located");
                    None
                }
            }
        };
        match start {
            Some(start) => Interval::new(start, input.end(), false, input.end_open()),
            None => Interval::empty(),
        }
    }

    fn knot(&self, x: Real) -> (Real, Option<Real>) {
        (x, self.input.value(x))
    }

    /// The knot closing the segment that starts at `a` and reaches `x`.
    fn segment_end(&self, a: Real, x: Real) -> Result<(Real, Option<Real>)> {
        let end = self.input.domain().end();
        let limit = if end.is_finite() { end } else { x };
        Ok(match self.input.next_defined(a, 0.0, Some(limit))? {
            Some(b) => self.knot(b),
            None => self.knot(x),
        })
    }

    fn forward(&self, origin: Real, x: Real) -> Result<Option<Real>> {
        let mut checkpoints = self.checkpoints.borrow_mut();
        if checkpoints.is_empty() {
            checkpoints.push((origin, self.constant));
        }
        let xs: Vec<Real> = checkpoints.iter().map(|c| c.0).collect();
        let Some(mut i) = interpolation::locate_previous(&xs, x) else {
            return Ok(None);
        };
        loop {
            let (a, area) = checkpoints[i];
            if a == x {
                return Ok(Some(area));
            }
            let left = self.knot(a);
            let right = match checkpoints.get(i + 1) {
                Some(&(b, _)) => self.knot(b),
                None => self.segment_end(a, x)?,
            };
            if right.0 > x {
                let Some(partial) = segment_area(self.interpolation, left, right, x) else {
                    return Ok(None);
                };
                return Ok(Some(area + partial));
            }
            let Some(full) = segment_area(self.interpolation, left, right, right.0) else {
                return Ok(None);
            };
            if i + 1 == checkpoints.len() {
                checkpoints.push((right.0, area + full));
            }
            i += 1;
        }
    }

    fn backward(&self, origin: Real, x: Real) -> Result<Option<Real>> {
        let mut a = origin;
        let mut area = self.constant;
        while a > x {
            let Some(b) = self.input.previous_defined(a, 0.0, Some(x))? else {
                return Ok(None);
            };
            let Some(full) = segment_area(self.interpolation, self.knot(b), self.knot(a), a) else {
                return Ok(None);
            };
            area -= full;
            a = b;
        }
        Ok(Some(area))
    }
}

impl Dependent for Integral {
    fn affected(&self, _source: usize, interval: &Interval) -> Interval {
        if interval.is_empty() {
            return Interval::empty();
        }
        let affected = interval.extended_to_positive_infinity();
        match self.origin() {
            Some(origin) if interval.start() > origin => affected,
            _ => affected.hull(&self.domain()),
        }
    }

    fn invalidate(&self, _source: usize, interval: &Interval) {
        self.domain.invalidate();
        if interval.is_empty() {
            return;
        }
        let mut checkpoints = self.checkpoints.borrow_mut();
        let keep = checkpoints.partition_point(|c| c.0 < interval.start());
        trace!(keep, cached = checkpoints.len(), "dropping integral checkpoints");
        // A change at the origin may move it.
        checkpoints.truncate(if keep < 2 { 0 } else { keep });
    }
}

impl Curve for Integral {
    fn notifier(&self) -> &UpdateNotifier {
        &self.notifier
    }

    fn domain(&self) -> Interval {
        self.domain
            .get_or_compute(self.is_updating(), || self.compute_domain())
    }

    fn min_step(&self) -> Real {
        self.input.min_step()
    }

    fn value(&self, x: Real) -> Option<Real> {
        if !self.domain().contains(x) {
            return None;
        }
        let origin = self.origin()?;
        let result = if x >= origin {
            self.forward(origin, x)
        } else {
            self.backward(origin, x)
        };
        result.unwrap_or_else(|err| {
            warn!(%err, x, "integral cannot be evaluated");
            None
        })
    }

    fn next_defined(&self, x: Real, min_step: Real, limit: Option<Real>) -> Result<Option<Real>> {
        let domain = self.domain();
        if domain.is_empty() {
            return Ok(None);
        }
        let step = self.resolve_min_step(min_step);
        if domain.start().is_finite() && x + step <= domain.start() {
            let start = domain.start();
            return Ok(limit.map_or(true, |l| start <= l).then_some(start));
        }
        let next = self.input.next_defined(x, step, limit)?;
        Ok(next.filter(|&n| domain.contains(n)))
    }

    fn previous_defined(
        &self,
        x: Real,
        min_step: Real,
        limit: Option<Real>,
    ) -> Result<Option<Real>> {
        let domain = self.domain();
        if domain.is_empty() {
            return Ok(None);
        }
        let limit = if domain.start().is_finite() {
            Some(limit.map_or(domain.start(), |l| l.max(domain.start())))
        } else {
            limit
        };
        let previous = self
            .input
            .previous_defined(x, self.resolve_min_step(min_step), limit)?;
        Ok(previous.filter(|&p| domain.contains(p)))
    }

    fn derivative(
        &self,
        x: Real,
        _forward: bool,
        _min_step: Real,
        _limit: Option<Real>,
    ) -> Option<Real> {
        if !self.domain().contains(x) {
            return None;
        }
        self.input.value(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant::Constant;
    use crate::line::Line;
    use crate::points::Points;
    use approx::assert_abs_diff_eq;

    #[test]
    fn constant_integrates_both_ways() {
        let f = Integral::new(Constant::new(1.0).into());
        assert!(f.domain().is_infinite());
        assert_eq!(f.value(0.0), Some(0.0));
        assert_abs_diff_eq!(f.value(2.0).unwrap(), 2.0);
        assert_abs_diff_eq!(f.value(-1.5).unwrap(), -1.5);
    }

    #[test]
    fn lines() {
        let f = Integral::new(Line::new(2.0, 1.0).into());
        assert_abs_diff_eq!(f.value(1.0).unwrap(), 2.5);
        assert_abs_diff_eq!(f.value(3.0).unwrap(), 10.5);

        let f = Integral::with_options(Line::new(2.0, 1.0).into(), Interpolation::Linear, 20.0);
        assert_abs_diff_eq!(f.value(0.0).unwrap(), 20.0);
        assert_abs_diff_eq!(f.value(3.0).unwrap(), 30.5);
    }

    #[test]
    fn step_policies() {
        let p: Handle = Points::new([(0.0, Some(2.0)), (1.0, Some(4.0)), (2.0, Some(6.0))])
            .unwrap()
            .into();
        let previous = Integral::with_options(p.clone(), Interpolation::Previous, 0.0);
        let next = Integral::with_options(p, Interpolation::Next, 0.0);
        let expect_previous = [0.0, 1.0, 2.0, 4.0, 6.0];
        let expect_next = [0.0, 2.0, 4.0, 7.0, 10.0];
        for (i, x) in [0.0, 0.5, 1.0, 1.5, 2.0].into_iter().enumerate() {
            assert_abs_diff_eq!(previous.value(x).unwrap(), expect_previous[i]);
            assert_abs_diff_eq!(next.value(x).unwrap(), expect_next[i]);
        }
    }

    #[test]
    fn starts_at_first_defined_sample() {
        let p = Points::new([(0.0, None), (1.0, Some(1.0)), (2.0, Some(2.0))]).unwrap();
        let f = Integral::new(p.into());
        assert_eq!(f.origin(), Some(1.0));
        assert_eq!(f.value(0.0), None);
        assert_eq!(f.value(1.0), Some(0.0));
        assert_abs_diff_eq!(f.value(2.0).unwrap(), 1.5);
    }

    #[test]
    fn derivative_is_the_input() {
        let f = Integral::new(Line::new(0.0, 3.0).into());
        assert_eq!(f.derivative(2.0, true, 0.0, None), Some(6.0));
    }
}
