//! Different curves on adjacent sub-domains.

use crate::handle::Handle;
use crate::link::{self, Dependent};
use curve_core::errors::Result;
use curve_core::{Curve, Interval, LazyDomain, Real, Subscription, UpdateNotifier};
use std::rc::Rc;

/// Delegates to `curves[i]` inside `pieces[i]`.
///
/// Pieces are sorted and pairwise disjoint. Where a piece and its curve's
/// domain do not overlap, the piecewise curve is undefined. The domain is
/// the hull of the effective pieces, so a gap between non-adjacent pieces
/// is inside the domain and evaluates to `None`.
#[derive(Debug)]
pub struct Piecewise {
    pieces: Vec<Interval>,
    curves: Vec<Handle>,
    notifier: UpdateNotifier,
    domain: LazyDomain,
    _subscriptions: Vec<Subscription>,
}

impl Piecewise {
    /// Pair each piece with a curve.
    ///
    /// # Errors
    /// Mismatched lengths, no pieces, or pieces that are unsorted or
    /// overlap.
    pub fn new(pieces: Vec<Interval>, curves: Vec<Handle>) -> Result<Rc<Self>> {
        curve_core::ensure_config!(
            pieces.len() == curves.len(),
            "{} pieces for {} curves",
            pieces.len(),
            curves.len()
        );
        curve_core::ensure_config!(!pieces.is_empty(), "a piecewise curve needs a piece");
        for pair in pieces.windows(2) {
            curve_core::ensure_config!(
                !pair[0].intersects(&pair[1]) && pair[0].end() <= pair[1].start(),
                "pieces {} and {} are unsorted or overlap",
                pair[0],
                pair[1]
            );
        }
        Ok(Rc::new_cyclic(|this| Self {
            _subscriptions: link::subscribe(this, &curves),
            pieces,
            curves,
            notifier: UpdateNotifier::new(),
            domain: LazyDomain::new(),
        }))
    }

    /// Split `domain` at `breakpoints` and pair the pieces with `curves`.
    ///
    /// # Errors
    /// As [`Piecewise::new`].
    pub fn from_breakpoints(
        domain: &Interval,
        breakpoints: &[Real],
        curves: Vec<Handle>,
    ) -> Result<Rc<Self>> {
        Self::new(domain.partition(breakpoints), curves)
    }

    fn effective(&self, i: usize) -> Interval {
        self.pieces[i].intersection(&self.curves[i].domain())
    }
}

fn clamp_above(limit: Option<Real>, edge: Real) -> Option<Real> {
    match limit {
        Some(l) => Some(l.min(edge)),
        None => edge.is_finite().then_some(edge),
    }
}

fn clamp_below(limit: Option<Real>, edge: Real) -> Option<Real> {
    match limit {
        Some(l) => Some(l.max(edge)),
        None => edge.is_finite().then_some(edge),
    }
}

impl Dependent for Piecewise {
    fn affected(&self, source: usize, interval: &Interval) -> Interval {
        let changed = &self.curves[source];
        Interval::union_of(
            self.pieces
                .iter()
                .zip(&self.curves)
                .filter(|(_, curve)| curve.ptr_eq(changed))
                .map(|(piece, _)| piece.intersection(interval)),
        )
    }

    fn invalidate(&self, _source: usize, _interval: &Interval) {
        self.domain.invalidate();
    }
}

impl Curve for Piecewise {
    fn notifier(&self) -> &UpdateNotifier {
        &self.notifier
    }

    fn domain(&self) -> Interval {
        self.domain.get_or_compute(self.is_updating(), || {
            Interval::union_of((0..self.pieces.len()).map(|i| self.effective(i)))
        })
    }

    fn min_step(&self) -> Real {
        self.curves
            .iter()
            .map(|curve| curve.min_step())
            .fold(0.0, Real::max)
    }

    fn value(&self, x: Real) -> Option<Real> {
        let i = self.pieces.iter().position(|piece| piece.contains(x))?;
        self.curves[i].value(x)
    }

    fn next_defined(&self, x: Real, min_step: Real, limit: Option<Real>) -> Result<Option<Real>> {
        let step = self.resolve_min_step(min_step);
        for (i, curve) in self.curves.iter().enumerate() {
            let piece = self.effective(i);
            if piece.is_empty() || piece.end() < x + step {
                continue;
            }
            if x + step <= piece.start() && piece.contains(piece.start()) {
                return Ok(limit
                    .map_or(true, |l| piece.start() <= l)
                    .then(|| piece.start()));
            }
            let clamp = clamp_above(limit, piece.end());
            let mut cursor = if x + step < piece.start() {
                piece.start() - step
            } else {
                x
            };
            while let Some(next) = curve.next_defined(cursor, step, clamp)? {
                if piece.contains(next) {
                    return Ok(Some(next));
                }
                if next >= piece.end() {
                    break;
                }
                cursor = next;
            }
            if limit.is_some_and(|l| piece.end() >= l) {
                return Ok(None);
            }
        }
        Ok(None)
    }

    fn previous_defined(
        &self,
        x: Real,
        min_step: Real,
        limit: Option<Real>,
    ) -> Result<Option<Real>> {
        let step = self.resolve_min_step(min_step);
        for (i, curve) in self.curves.iter().enumerate().rev() {
            let piece = self.effective(i);
            if piece.is_empty() || piece.start() > x - step {
                continue;
            }
            if x - step >= piece.end() && piece.contains(piece.end()) {
                return Ok(limit
                    .map_or(true, |l| piece.end() >= l)
                    .then(|| piece.end()));
            }
            let clamp = clamp_below(limit, piece.start());
            let mut cursor = if x - step > piece.end() {
                piece.end() + step
            } else {
                x
            };
            while let Some(previous) = curve.previous_defined(cursor, step, clamp)? {
                if piece.contains(previous) {
                    return Ok(Some(previous));
                }
                if previous <= piece.start() {
                    break;
                }
                cursor = previous;
            }
            if limit.is_some_and(|l| piece.start() <= l) {
                return Ok(None);
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant::Constant;

    #[test]
    fn constant_steps() {
        let pw = Piecewise::from_breakpoints(
            &Interval::closed(0.0, 3.0),
            &[2.0],
            vec![Constant::new(2.0).into(), Constant::new(3.0).into()],
        )
        .unwrap();
        assert_eq!(pw.domain(), Interval::closed(0.0, 3.0));
        assert_eq!(pw.value(-0.1), None);
        assert_eq!(pw.value(1.9), Some(2.0));
        assert_eq!(pw.value(2.0), Some(3.0));
        assert_eq!(pw.value(3.1), None);
        assert_eq!(pw.next_defined(0.0, 0.5, None).unwrap(), Some(2.0));
        assert_eq!(pw.next_defined(2.0, 0.5, None).unwrap(), Some(3.0));
        assert_eq!(pw.next_defined(3.0, 0.5, None).unwrap(), None);
        assert_eq!(pw.previous_defined(3.0, 0.5, None).unwrap(), Some(2.0));
    }

    #[test]
    fn rejects_overlap() {
        let c: Handle = Constant::new(1.0).into();
        let overlapping = vec![Interval::closed(0.0, 2.0), Interval::closed(1.0, 3.0)];
        assert!(Piecewise::new(overlapping, vec![c.clone(), c.clone()]).is_err());
        assert!(Piecewise::new(vec![Interval::closed(0.0, 1.0)], vec![]).is_err());
    }
}
