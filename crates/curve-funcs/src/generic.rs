//! A curve backed by a closure.

use curve_core::{Curve, CurveConfig, Interval, Real, UpdateNotifier};
use std::fmt;
use std::rc::Rc;

type Function = Box<dyn Fn(Real) -> Option<Real>>;

/// `f(x)` for `x` in a fixed domain, computed by a user closure.
pub struct Generic {
    function: Function,
    domain: Interval,
    min_step: Real,
    notifier: UpdateNotifier,
}

impl Generic {
    /// Wrap `function` over `domain`.
    pub fn new<F>(domain: Interval, function: F) -> Rc<Self>
    where
        F: Fn(Real) -> Option<Real> + 'static,
    {
        Self::with_config(domain, &CurveConfig::default(), function)
    }

    /// Wrap `function` over `domain` with the resolution of `config`.
    pub fn with_config<F>(domain: Interval, config: &CurveConfig, function: F) -> Rc<Self>
    where
        F: Fn(Real) -> Option<Real> + 'static,
    {
        Rc::new(Self {
            function: Box::new(function),
            domain,
            min_step: config.min_step,
            notifier: UpdateNotifier::new(),
        })
    }
}

impl fmt::Debug for Generic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generic")
            .field("domain", &self.domain)
            .field("min_step", &self.min_step)
            .finish_non_exhaustive()
    }
}

impl Curve for Generic {
    fn notifier(&self) -> &UpdateNotifier {
        &self.notifier
    }

    fn domain(&self) -> Interval {
        self.domain
    }

    fn min_step(&self) -> Real {
        self.min_step
    }

    fn value(&self, x: Real) -> Option<Real> {
        if !self.domain.contains(x) {
            return None;
        }
        (self.function)(x).filter(|y| !y.is_nan())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clipped_to_domain() {
        let g = Generic::new(Interval::closed_open(0.0, 2.0), |x| Some(x * 10.0));
        assert_eq!(g.value(1.0), Some(10.0));
        assert_eq!(g.value(2.0), None);
        assert_eq!(g.next_defined(1.5, 1.0, None).unwrap(), None);
        let sqrt = Generic::new(Interval::infinite(), |x: Real| Some(x.sqrt()));
        assert_eq!(sqrt.value(-1.0), None);
    }
}
