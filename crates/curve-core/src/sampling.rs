//! Lazy sampling of a curve over a finite domain.
//!
//! [`sample`] returns an iterator of `(x, y)` pairs. With a fixed step the
//! abscissae are `start + i·step`; otherwise the iterator starts at the
//! first defined abscissa and walks `next_defined`, which visits the
//! curve's own knots (sample points, piece boundaries) rather than an
//! arbitrary grid.

use crate::curve::Curve;
use crate::errors::{Error, Result};
use crate::interval::Interval;
use crate::Real;

/// Options for [`sample`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Sampling {
    /// Sub-domain to sample; defaults to the curve's domain.
    pub domain: Option<Interval>,
    /// Minimum step used when walking neighbours.
    pub min_step: Option<Real>,
    /// Fixed step between abscissae.
    pub step: Option<Real>,
}

impl Sampling {
    /// Sample the whole domain by walking neighbours.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict sampling to `domain`.
    pub fn over(mut self, domain: impl Into<Interval>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Walk neighbours with at least `min_step` between abscissae.
    pub fn with_min_step(mut self, min_step: Real) -> Self {
        self.min_step = Some(min_step);
        self
    }

    /// Sample on a fixed grid.
    pub fn with_step(mut self, step: Real) -> Self {
        self.step = Some(step);
        self
    }
}

#[derive(Debug, Clone, Copy)]
enum Walk {
    Grid { step: Real, index: usize },
    Neighbours { min_step: Real, last: Option<Real> },
}

/// Iterator returned by [`sample`].
///
/// It is not restartable: once exhausted (or after yielding an error) it
/// stays exhausted.
#[derive(Debug)]
pub struct Samples<'a> {
    curve: &'a dyn Curve,
    domain: Interval,
    walk: Walk,
    done: bool,
}

impl<'a> Samples<'a> {
    /// The effective sampling domain.
    pub fn domain(&self) -> Interval {
        self.domain
    }

    fn next_x(&mut self) -> Result<Option<Real>> {
        match &mut self.walk {
            Walk::Grid { step, index } => loop {
                let x = self.domain.start() + *index as Real * *step;
                *index += 1;
                if x > self.domain.end() || (x == self.domain.end() && self.domain.end_open()) {
                    return Ok(None);
                }
                if self.domain.contains(x) {
                    return Ok(Some(x));
                }
            },
            Walk::Neighbours { min_step, last } => {
                let next = match *last {
                    None if self.domain.contains(self.domain.start())
                        && self.curve.domain().contains(self.domain.start()) =>
                    {
                        Some(self.domain.start())
                    }
                    None => self.curve.next_defined(
                        self.domain.start(),
                        *min_step,
                        Some(self.domain.end()),
                    )?,
                    Some(x) => self
                        .curve
                        .next_defined(x, *min_step, Some(self.domain.end()))?,
                };
                let next = next.filter(|&x| self.domain.contains(x));
                *last = next;
                Ok(next)
            }
        }
    }
}

impl<'a> Iterator for Samples<'a> {
    type Item = Result<(Real, Option<Real>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_x() {
            Ok(Some(x)) => Some(Ok((x, self.curve.value(x)))),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Sample `curve` according to `options`.
///
/// # Errors
/// [`Error::Unbounded`] if the effective domain is infinite, and
/// [`Error::Precondition`] for a non-positive step.
pub fn sample<'a>(curve: &'a dyn Curve, options: &Sampling) -> Result<Samples<'a>> {
    let own = curve.domain();
    let domain = options
        .domain
        .map_or(own, |requested| requested.intersection(&own));
    if !domain.is_finite() {
        return Err(Error::Unbounded(format!(
            "cannot sample {curve:?} over {domain}; supply a finite domain"
        )));
    }
    let walk = match options.step {
        Some(step) => {
            crate::ensure!(step > 0.0, "sampling step must be positive, got {step}");
            Walk::Grid { step, index: 0 }
        }
        None => Walk::Neighbours {
            min_step: curve.resolve_min_step(options.min_step.unwrap_or(0.0)),
            last: None,
        },
    };
    Ok(Samples {
        curve,
        domain,
        walk,
        done: domain.is_empty(),
    })
}

/// Collect [`sample`] into a vector.
pub fn sample_points(curve: &dyn Curve, options: &Sampling) -> Result<Vec<(Real, Option<Real>)>> {
    sample(curve, options)?.collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::jump_forward;
    use crate::observable::UpdateNotifier;

    #[derive(Debug, Default)]
    struct Flat {
        notifier: UpdateNotifier,
    }

    impl Curve for Flat {
        fn notifier(&self) -> &UpdateNotifier {
            &self.notifier
        }
        fn domain(&self) -> Interval {
            Interval::infinite()
        }
        fn min_step(&self) -> Real {
            1e-9
        }
        fn value(&self, _x: Real) -> Option<Real> {
            Some(1.0)
        }
        fn next_defined(
            &self,
            x: Real,
            min_step: Real,
            limit: Option<Real>,
        ) -> Result<Option<Real>> {
            jump_forward(&self.domain(), x, self.resolve_min_step(min_step), limit)
        }
    }

    #[test]
    fn walks_knots() {
        let c = Flat::default();
        let points = sample_points(&c, &Sampling::new().over((0.0, 2.0))).unwrap();
        assert_eq!(points, vec![(0.0, Some(1.0)), (2.0, Some(1.0))]);
    }

    #[test]
    fn fixed_step() {
        let c = Flat::default();
        let options = Sampling::new()
            .over(Interval::closed_open(0.0, 1.0))
            .with_step(0.25);
        let xs: Vec<Real> = sample(&c, &options)
            .unwrap()
            .map(|r| r.unwrap().0)
            .collect();
        assert_eq!(xs, vec![0.0, 0.25, 0.5, 0.75]);
    }

    #[test]
    fn infinite_domain_is_rejected() {
        let c = Flat::default();
        assert!(matches!(
            sample(&c, &Sampling::new()),
            Err(Error::Unbounded(_))
        ));
        assert!(sample(&c, &Sampling::new().over((0.0, 1.0)).with_step(0.0)).is_err());
    }
}
