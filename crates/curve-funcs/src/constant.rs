//! A curve with the same value everywhere.

use curve_core::curve::{jump_backward, jump_forward};
use curve_core::errors::Result;
use curve_core::{Curve, CurveConfig, Interval, Real, UpdateNotifier};
use std::cell::Cell;
use std::rc::Rc;
use tracing::debug;

/// `f(x) = c` on the whole real line.
///
/// The value can be changed later; a change notifies observers over the
/// infinite interval.
#[derive(Debug)]
pub struct Constant {
    value: Cell<Real>,
    min_step: Real,
    notifier: UpdateNotifier,
}

impl Constant {
    /// A constant with the default resolution.
    pub fn new(value: Real) -> Rc<Self> {
        Self::with_config(value, &CurveConfig::default())
    }

    /// A constant with the resolution of `config`.
    pub fn with_config(value: Real, config: &CurveConfig) -> Rc<Self> {
        Rc::new(Self {
            value: Cell::new(value),
            min_step: config.min_step,
            notifier: UpdateNotifier::new(),
        })
    }

    /// The current value.
    pub fn get(&self) -> Real {
        self.value.get()
    }

    /// Change the value.
    ///
    /// # Errors
    /// An error raised by an observer.
    pub fn set_value(&self, value: Real) -> Result<()> {
        let interval = Interval::infinite();
        debug!(value, "set constant");
        self.notifier.begin_update(&interval)?;
        self.value.set(value);
        self.notifier.end_update(&interval)
    }
}

impl Curve for Constant {
    fn notifier(&self) -> &UpdateNotifier {
        &self.notifier
    }

    fn domain(&self) -> Interval {
        Interval::infinite()
    }

    fn min_step(&self) -> Real {
        self.min_step
    }

    fn value(&self, x: Real) -> Option<Real> {
        (!x.is_nan()).then(|| self.value.get())
    }

    fn next_defined(&self, x: Real, min_step: Real, limit: Option<Real>) -> Result<Option<Real>> {
        jump_forward(&self.domain(), x, self.resolve_min_step(min_step), limit)
    }

    fn previous_defined(
        &self,
        x: Real,
        min_step: Real,
        limit: Option<Real>,
    ) -> Result<Option<Real>> {
        jump_backward(&self.domain(), x, self.resolve_min_step(min_step), limit)
    }

    fn derivative(
        &self,
        x: Real,
        _forward: bool,
        _min_step: Real,
        _limit: Option<Real>,
    ) -> Option<Real> {
        (!x.is_nan()).then_some(0.0)
    }
}
