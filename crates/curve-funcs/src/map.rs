//! Pointwise transform of a single input.

use crate::handle::Handle;
use crate::link::{self, Dependent};
use curve_core::errors::Result;
use curve_core::{Curve, Interval, Real, Subscription, UpdateNotifier};
use std::fmt;
use std::rc::Rc;

/// The function applied to each value of a [`Map`].
#[derive(Clone)]
pub enum Transform {
    /// `g(y)`; never sees holes.
    Y(Rc<dyn Fn(Real) -> Real>),
    /// `g(x, y)`; never sees holes.
    XY(Rc<dyn Fn(Real, Real) -> Real>),
    /// `g(x, y?)`; sees holes unless the map skips them, and may itself
    /// leave a value undefined.
    Partial(Rc<dyn Fn(Real, Option<Real>) -> Option<Real>>),
}

impl Transform {
    /// Wrap `g(y)`.
    pub fn y<F: Fn(Real) -> Real + 'static>(f: F) -> Self {
        Transform::Y(Rc::new(f))
    }

    /// Wrap `g(x, y)`.
    pub fn xy<F: Fn(Real, Real) -> Real + 'static>(f: F) -> Self {
        Transform::XY(Rc::new(f))
    }

    /// Wrap `g(x, y?)`.
    pub fn partial<F: Fn(Real, Option<Real>) -> Option<Real> + 'static>(f: F) -> Self {
        Transform::Partial(Rc::new(f))
    }

    fn apply(&self, x: Real, y: Option<Real>) -> Option<Real> {
        match self {
            Transform::Y(f) => y.map(|y| f(y)),
            Transform::XY(f) => y.map(|y| f(x, y)),
            Transform::Partial(f) => f(x, y),
        }
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Transform::Y(_) => "Transform::Y",
            Transform::XY(_) => "Transform::XY",
            Transform::Partial(_) => "Transform::Partial",
        })
    }
}

/// `x ↦ g(x, f(x))` over the domain of `f`.
#[derive(Debug)]
pub struct Map {
    input: Handle,
    transform: Transform,
    skip_none: bool,
    notifier: UpdateNotifier,
    _subscriptions: Vec<Subscription>,
}

impl Map {
    /// Map `input` through `transform`; holes stay holes.
    pub fn new(input: Handle, transform: Transform) -> Rc<Self> {
        Self::build(input, transform, true)
    }

    /// Map `input` through `transform`, handing holes to a
    /// [`Transform::Partial`].
    pub fn with_holes(input: Handle, transform: Transform) -> Rc<Self> {
        Self::build(input, transform, false)
    }

    fn build(input: Handle, transform: Transform, skip_none: bool) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            _subscriptions: link::subscribe(this, std::slice::from_ref(&input)),
            input,
            transform,
            skip_none,
            notifier: UpdateNotifier::new(),
        })
    }
}

impl Dependent for Map {
    fn affected(&self, _source: usize, interval: &Interval) -> Interval {
        *interval
    }

    fn invalidate(&self, _source: usize, _interval: &Interval) {}
}

impl Curve for Map {
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
        let y = self.input.value(x);
        if y.is_none() && self.skip_none {
            return None;
        }
        self.transform.apply(x, y).filter(|v| !v.is_nan())
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
    use crate::points::Points;

    #[test]
    fn follows_constant_updates() {
        let c = Constant::new(1.0);
        let f = Map::new(c.clone().into(), Transform::xy(|_, y| y * 2.0));
        assert_eq!(f.value(0.0), Some(2.0));
        c.set_value(2.0).unwrap();
        assert_eq!(f.value(0.0), Some(4.0));
    }

    #[test]
    fn holes() {
        let p = Points::new([(0.0, Some(1.0)), (1.0, None)]).unwrap();
        let skip = Map::new(p.clone().into(), Transform::partial(|_, y| Some(y.unwrap_or(-1.0))));
        let see = Map::with_holes(p.into(), Transform::partial(|_, y| Some(y.unwrap_or(-1.0))));
        assert_eq!(skip.value(1.0), None);
        assert_eq!(see.value(1.0), Some(-1.0));
        assert_eq!(see.value(2.0), None);
    }
}
