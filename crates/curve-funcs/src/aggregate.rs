//! Pointwise reduction of several inputs.
//!
//! An [`Aggregate`] evaluates every input at `x` and hands the values to a
//! reducer. [`Combine`] decides the domain and how missing values are
//! treated:
//!
//! * [`Combine::Intersect`]: the domain is the intersection of the input
//!   domains and a single undefined input makes the result undefined;
//! * [`Combine::Union`]: the domain is the hull of the input domains and
//!   the result is only undefined where every input is.
//!
//! A reducer that returns NaN leaves a hole: `value` is `None` there even
//! inside the domain.

use crate::handle::Handle;
use crate::link::{self, Dependent};
use curve_core::errors::Result;
use curve_core::{Curve, Interval, LazyDomain, Real, Subscription, UpdateNotifier};
use std::fmt;
use std::rc::Rc;

/// `(x, values) -> value`
pub type Reducer = Rc<dyn Fn(Real, &[Option<Real>]) -> Option<Real>>;

/// How input domains and holes combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Combine {
    /// Defined where every input is.
    #[default]
    Intersect,
    /// Defined where any input is.
    Union,
}

/// A reduction over several curves.
pub struct Aggregate {
    inputs: Vec<Handle>,
    reducer: Reducer,
    combine: Combine,
    notifier: UpdateNotifier,
    domain: LazyDomain,
    _subscriptions: Vec<Subscription>,
}

impl Aggregate {
    /// Reduce `inputs` with `reducer`.
    ///
    /// # Errors
    /// An empty input list.
    pub fn new<F>(inputs: Vec<Handle>, combine: Combine, reducer: F) -> Result<Rc<Self>>
    where
        F: Fn(Real, &[Option<Real>]) -> Option<Real> + 'static,
    {
        curve_core::ensure_config!(!inputs.is_empty(), "an aggregate needs at least one input");
        Ok(Self::build(inputs, combine, Rc::new(reducer)))
    }

    pub(crate) fn binary(a: Handle, b: Handle, op: fn(Real, Real) -> Option<Real>) -> Rc<Self> {
        Self::build(
            vec![a, b],
            Combine::Intersect,
            Rc::new(move |_, ys: &[Option<Real>]| op(ys[0]?, ys[1]?)),
        )
    }

    fn build(inputs: Vec<Handle>, combine: Combine, reducer: Reducer) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            _subscriptions: link::subscribe(this, &inputs),
            inputs,
            reducer,
            combine,
            notifier: UpdateNotifier::new(),
            domain: LazyDomain::new(),
        })
    }

    /// `Σ yᵢ` over the common domain.
    ///
    /// # Errors
    /// An empty input list.
    pub fn sum(inputs: Vec<Handle>) -> Result<Rc<Self>> {
        Self::new(inputs, Combine::Intersect, |_, ys| {
            Some(ys.iter().flatten().sum())
        })
    }

    /// `Π yᵢ` over the common domain.
    ///
    /// # Errors
    /// An empty input list.
    pub fn product(inputs: Vec<Handle>) -> Result<Rc<Self>> {
        Self::new(inputs, Combine::Intersect, |_, ys| {
            Some(ys.iter().flatten().product())
        })
    }

    /// `min yᵢ` over the common domain.
    ///
    /// # Errors
    /// An empty input list.
    pub fn min(inputs: Vec<Handle>) -> Result<Rc<Self>> {
        Self::new(inputs, Combine::Intersect, |_, ys| {
            ys.iter().flatten().copied().reduce(Real::min)
        })
    }

    /// `max yᵢ` over the common domain.
    ///
    /// # Errors
    /// An empty input list.
    pub fn max(inputs: Vec<Handle>) -> Result<Rc<Self>> {
        Self::new(inputs, Combine::Intersect, |_, ys| {
            ys.iter().flatten().copied().reduce(Real::max)
        })
    }

    /// The first defined value, in input order, over the hull of domains.
    ///
    /// # Errors
    /// An empty input list.
    pub fn first(inputs: Vec<Handle>) -> Result<Rc<Self>> {
        Self::new(inputs, Combine::Union, |_, ys| ys.iter().flatten().next().copied())
    }

    /// `a` up to `x0`, `b` from `x1`, and a linear cross-fade in between.
    ///
    /// # Errors
    /// `x0 >= x1`.
    pub fn blend(a: Handle, b: Handle, x0: Real, x1: Real) -> Result<Rc<Self>> {
        curve_core::ensure_config!(x0 < x1, "blend needs x0 < x1, got {x0} and {x1}");
        Self::new(vec![a, b], Combine::Union, move |x, ys| {
            if x <= x0 {
                ys[0]
            } else if x >= x1 {
                ys[1]
            } else {
                let w = (x - x0) / (x1 - x0);
                Some(ys[0]? * (1.0 - w) + ys[1]? * w)
            }
        })
    }

    /// How the inputs combine.
    pub fn combine(&self) -> Combine {
        self.combine
    }

    fn compute_domain(&self) -> Interval {
        let domains = self.inputs.iter().map(|input| input.domain());
        match self.combine {
            Combine::Intersect => Interval::intersection_of(domains),
            Combine::Union => Interval::union_of(domains),
        }
    }

    fn distinct_inputs(&self) -> impl Iterator<Item = &Handle> {
        self.inputs
            .iter()
            .enumerate()
            .filter(|(i, input)| !self.inputs[..*i].iter().any(|seen| seen.ptr_eq(input)))
            .map(|(_, input)| input)
    }
}

impl fmt::Debug for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Aggregate")
            .field("inputs", &self.inputs)
            .field("combine", &self.combine)
            .finish_non_exhaustive()
    }
}

impl Dependent for Aggregate {
    fn affected(&self, _source: usize, interval: &Interval) -> Interval {
        *interval
    }

    fn invalidate(&self, _source: usize, _interval: &Interval) {
        self.domain.invalidate();
    }
}

impl Curve for Aggregate {
    fn notifier(&self) -> &UpdateNotifier {
        &self.notifier
    }

    fn domain(&self) -> Interval {
        self.domain
            .get_or_compute(self.is_updating(), || self.compute_domain())
    }

    fn min_step(&self) -> Real {
        self.inputs
            .iter()
            .map(|input| input.min_step())
            .fold(0.0, Real::max)
    }

    fn value(&self, x: Real) -> Option<Real> {
        if !self.domain().contains(x) {
            return None;
        }
        let ys: Vec<Option<Real>> = self.inputs.iter().map(|input| input.value(x)).collect();
        let defined = match self.combine {
            Combine::Intersect => ys.iter().all(Option::is_some),
            Combine::Union => ys.iter().any(Option::is_some),
        };
        if !defined {
            return None;
        }
        (self.reducer)(x, &ys).filter(|y| !y.is_nan())
    }

    fn next_defined(&self, x: Real, min_step: Real, limit: Option<Real>) -> Result<Option<Real>> {
        let domain = self.domain();
        if domain.is_empty() {
            return Ok(None);
        }
        let step = self.resolve_min_step(min_step);
        let edge = domain.end().is_finite().then(|| domain.end());
        let limit = match (limit, edge) {
            (Some(l), Some(e)) => Some(l.min(e)),
            (l, e) => l.or(e),
        };
        let mut cursor = x;
        loop {
            let mut best: Option<Real> = None;
            for input in self.distinct_inputs() {
                if let Some(next) = input.next_defined(cursor, step, limit)? {
                    best = Some(best.map_or(next, |b: Real| b.min(next)));
                }
            }
            let Some(next) = best else {
                return Ok(None);
            };
            if domain.contains(next) {
                return Ok(Some(next));
            }
            if next >= domain.end() {
                return Ok(None);
            }
            cursor = next;
        }
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
        let step = self.resolve_min_step(min_step);
        let edge = domain.start().is_finite().then(|| domain.start());
        let limit = match (limit, edge) {
            (Some(l), Some(e)) => Some(l.max(e)),
            (l, e) => l.or(e),
        };
        let mut cursor = x;
        loop {
            let mut best: Option<Real> = None;
            for input in self.distinct_inputs() {
                if let Some(previous) = input.previous_defined(cursor, step, limit)? {
                    best = Some(best.map_or(previous, |b: Real| b.max(previous)));
                }
            }
            let Some(previous) = best else {
                return Ok(None);
            };
            if domain.contains(previous) {
                return Ok(Some(previous));
            }
            if previous <= domain.start() {
                return Ok(None);
            }
            cursor = previous;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::points::Points;

    #[test]
    fn union_of_holes_is_undefined() {
        let p = Points::new([(0.0, None::<Real>), (1.0, None)]).unwrap();
        let f = Aggregate::new(vec![p.into()], Combine::Union, |_, ys| ys[0]).unwrap();
        assert_eq!(f.domain(), Interval::closed(0.0, 1.0));
        assert_eq!(f.value(0.0), None);
        assert_eq!(f.value(1.0), None);
    }

    #[test]
    fn needs_inputs() {
        assert!(Aggregate::sum(vec![]).is_err());
        let c = Handle::constant(1.0);
        assert!(Aggregate::blend(c.clone(), c, 2.0, 1.0).is_err());
    }
}
