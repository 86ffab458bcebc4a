//! A curve defined nowhere.

use curve_core::{Curve, CurveConfig, Interval, Real, UpdateNotifier};
use std::rc::Rc;

/// Empty domain, no values.
#[derive(Debug)]
pub struct Empty {
    min_step: Real,
    notifier: UpdateNotifier,
}

impl Empty {
    /// The empty curve.
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            min_step: CurveConfig::default().min_step,
            notifier: UpdateNotifier::new(),
        })
    }
}

impl Curve for Empty {
    fn notifier(&self) -> &UpdateNotifier {
        &self.notifier
    }

    fn domain(&self) -> Interval {
        Interval::empty()
    }

    fn min_step(&self) -> Real {
        self.min_step
    }

    fn value(&self, _x: Real) -> Option<Real> {
        None
    }
}
