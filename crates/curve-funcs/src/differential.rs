//! The derivative of an input as a curve.

use crate::handle::Handle;
use crate::link::{self, Dependent};
use curve_core::errors::Result;
use curve_core::{Curve, Interval, Real, Subscription, UpdateNotifier};
use std::rc::Rc;

/// `f'(x)`, taken backwards where possible and forwards at the left edge of
/// the input's domain.
#[derive(Debug)]
pub struct Differential {
    input: Handle,
    notifier: UpdateNotifier,
    _subscriptions: Vec<Subscription>,
}

impl Differential {
    /// Differentiate `input`.
    pub fn new(input: Handle) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            _subscriptions: link::subscribe(this, std::slice::from_ref(&input)),
            input,
            notifier: UpdateNotifier::new(),
        })
    }
}

impl Dependent for Differential {
    fn affected(&self, _source: usize, interval: &Interval) -> Interval {
        if interval.is_empty() {
            return Interval::empty();
        }
        let h = self.input.min_step();
        Interval::closed(interval.start() - h, interval.end() + h)
    }

    fn invalidate(&self, _source: usize, _interval: &Interval) {}
}

impl Curve for Differential {
    fn notifier(&self) -> &UpdateNotifier {
        &self.notifier
    }

    fn domain(&self) -> Interval {
        self.input.domain()
    }

    fn min_step(&self) -> Real {
        self.input.min_step()
    }

    fn value(&self, x: Real) -> Option<Real> {
        if !self.input.domain().contains(x) {
            return None;
        }
        self.input
            .derivative(x, false, 0.0, None)
            .or_else(|| self.input.derivative(x, true, 0.0, None))
            .filter(|d| d.is_finite())
    }

    fn next_defined(&self, x: Real, min_step: Real, limit: Option<Real>) -> Result<Option<Real>> {
        self.input
            .next_defined(x, self.resolve_min_step(min_step), limit)
    }

    fn previous_defined(
        &self,
        x: Real,
        min_step: Real,
        limit: Option<Real>,
    ) -> Result<Option<Real>> {
        self.input
            .previous_defined(x, self.resolve_min_step(min_step), limit)
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
    fn analytic_inputs() {
        assert_eq!(Differential::new(Constant::new(1.0).into()).value(0.0), Some(0.0));
        assert_abs_diff_eq!(Differential::new(Line::new(1.0, 2.0).into()).value(0.0).unwrap(), 2.0);
    }

    #[test]
    fn falls_forward_at_the_left_edge() {
        let f = Differential::new(Points::new([(0.0, 0.0), (1.0, 1.0)]).unwrap().into());
        assert_abs_diff_eq!(f.value(1.0).unwrap(), 1.0);
        assert_abs_diff_eq!(f.value(0.0).unwrap(), 1.0);
        assert_eq!(f.value(2.0), None);
    }
}
