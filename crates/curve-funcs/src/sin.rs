//! Sinusoids.

use curve_core::errors::Result;
use curve_core::{Curve, CurveConfig, Interval, Real, UpdateNotifier};
use std::f64::consts::PI;
use std::rc::Rc;

/// `y = offset + amplitude·sin(2π(x + phase)/period)`
#[derive(Debug)]
pub struct Sin {
    amplitude: Real,
    period: Real,
    phase: Real,
    offset: Real,
    min_step: Real,
    notifier: UpdateNotifier,
}

impl Sin {
    /// A sinusoid described by its period.
    ///
    /// # Errors
    /// A non-positive or non-finite period.
    pub fn new(amplitude: Real, period: Real, phase: Real, offset: Real) -> Result<Rc<Self>> {
        curve_core::ensure_config!(
            period > 0.0 && period.is_finite(),
            "period must be positive, got {period}"
        );
        Ok(Rc::new(Self {
            amplitude,
            period,
            phase,
            offset,
            min_step: CurveConfig::default().min_step,
            notifier: UpdateNotifier::new(),
        }))
    }

    /// A sinusoid described by its frequency.
    ///
    /// # Errors
    /// A non-positive frequency.
    pub fn with_frequency(
        amplitude: Real,
        frequency: Real,
        phase: Real,
        offset: Real,
    ) -> Result<Rc<Self>> {
        curve_core::ensure_config!(frequency > 0.0, "frequency must be positive, got {frequency}");
        Self::new(amplitude, 1.0 / frequency, phase, offset)
    }

    /// The period.
    pub fn period(&self) -> Real {
        self.period
    }

    fn angle(&self, x: Real) -> Real {
        2.0 * PI * (x + self.phase) / self.period
    }
}

impl Curve for Sin {
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
        (!x.is_nan()).then(|| self.offset + self.amplitude * self.angle(x).sin())
    }

    fn derivative(
        &self,
        x: Real,
        _forward: bool,
        _min_step: Real,
        _limit: Option<Real>,
    ) -> Option<Real> {
        (!x.is_nan()).then(|| self.amplitude * 2.0 * PI / self.period * self.angle(x).cos())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn quarter_periods() {
        let s = Sin::new(2.0, 4.0, 0.0, 1.0).unwrap();
        assert_abs_diff_eq!(s.value(0.0).unwrap(), 1.0);
        assert_abs_diff_eq!(s.value(1.0).unwrap(), 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(s.value(3.0).unwrap(), -1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(s.derivative(1.0, true, 0.0, None).unwrap(), 0.0, epsilon = 1e-12);
        let f = Sin::with_frequency(2.0, 0.25, 1.0, 1.0).unwrap();
        assert_abs_diff_eq!(f.value(0.0).unwrap(), 3.0, epsilon = 1e-12);
        assert!(Sin::new(1.0, 0.0, 0.0, 0.0).is_err());
    }
}
