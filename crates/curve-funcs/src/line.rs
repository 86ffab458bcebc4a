//! Straight lines.

use curve_core::curve::{jump_backward, jump_forward};
use curve_core::errors::Result;
use curve_core::{Curve, CurveConfig, Interval, Real, UpdateNotifier};
use curve_math::fit_line;
use std::rc::Rc;

/// `y = constant + slope·x` on the whole real line.
#[derive(Debug)]
pub struct Line {
    constant: Real,
    slope: Real,
    min_step: Real,
    notifier: UpdateNotifier,
}

impl Line {
    /// The line with intercept `constant` and gradient `slope`.
    pub fn new(constant: Real, slope: Real) -> Rc<Self> {
        Rc::new(Self {
            constant,
            slope,
            min_step: CurveConfig::default().min_step,
            notifier: UpdateNotifier::new(),
        })
    }

    /// The line through two points.
    ///
    /// # Errors
    /// Both points share the same `x`.
    pub fn through(p1: (Real, Real), p2: (Real, Real)) -> Result<Rc<Self>> {
        curve_core::ensure_config!(
            p1.0 != p2.0,
            "a line through two points needs distinct x, got {} twice",
            p1.0
        );
        let slope = (p2.1 - p1.1) / (p2.0 - p1.0);
        Ok(Self::from_point(p1, slope))
    }

    /// The line through `point` with gradient `slope`.
    pub fn from_point(point: (Real, Real), slope: Real) -> Rc<Self> {
        Self::new(point.1 - slope * point.0, slope)
    }

    /// Least-squares line through `points`.
    ///
    /// # Errors
    /// Fewer than two distinct abscissae.
    pub fn from_points(points: &[(Real, Real)]) -> Result<Rc<Self>> {
        let (x, y): (Vec<Real>, Vec<Real>) = points.iter().copied().unzip();
        let (constant, slope) = fit_line(&x, &y)?;
        Ok(Self::new(constant, slope))
    }

    /// The intercept at `x = 0`.
    pub fn constant(&self) -> Real {
        self.constant
    }

    /// The gradient.
    pub fn slope(&self) -> Real {
        self.slope
    }

    /// The point on the line at `x = 0`.
    pub fn ref_point(&self) -> (Real, Real) {
        (0.0, self.constant)
    }

    /// `∫ₐᵇ (c + m·x) dx`
    pub fn partial_integration(&self, a: Real, b: Real) -> Real {
        self.constant * (b - a) + 0.5 * self.slope * (b * b - a * a)
    }

    /// The crossing point with `other`, if the lines are not parallel.
    pub fn intersection(&self, other: &Line) -> Option<(Real, Real)> {
        let dm = self.slope - other.slope;
        if dm == 0.0 {
            return None;
        }
        let x = (other.constant - self.constant) / dm;
        Some((x, self.constant + self.slope * x))
    }
}

impl Curve for Line {
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
        (!x.is_nan()).then(|| self.constant + self.slope * x)
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
        (!x.is_nan()).then_some(self.slope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn constructors_agree() {
        let a = Line::through((1.0, 3.0), (3.0, 7.0)).unwrap();
        assert_abs_diff_eq!(a.slope(), 2.0);
        assert_abs_diff_eq!(a.constant(), 1.0);
        let b = Line::from_points(&[(0.0, 1.0), (1.0, 3.0), (2.0, 5.0)]).unwrap();
        assert_abs_diff_eq!(b.slope(), 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(b.constant(), 1.0, epsilon = 1e-12);
        assert!(Line::through((1.0, 0.0), (1.0, 2.0)).is_err());
    }

    #[test]
    fn integration_and_crossing() {
        let l = Line::new(1.0, 2.0);
        assert_abs_diff_eq!(l.partial_integration(0.0, 2.0), 6.0);
        let m = Line::new(4.0, -1.0);
        let (x, y) = l.intersection(&m).unwrap();
        assert_abs_diff_eq!(x, 1.0);
        assert_abs_diff_eq!(y, 3.0);
        assert!(l.intersection(&Line::new(0.0, 2.0)).is_none());
    }
}
