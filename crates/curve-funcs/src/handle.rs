//! `Handle` — a shared reference to any curve.
//!
//! Derived curves keep their inputs alive through handles. A handle derefs
//! to `dyn Curve`, supports the arithmetic operators (handle ⊕ handle builds
//! an [`Aggregate`], handle ⊕ number builds a [`Map`]) and offers builder
//! methods for every combinator.
//!
//! ```
//! use curve_funcs::{Handle, Points};
//! use curve_core::Curve;
//!
//! let prices: Handle = Points::new([(0.0, 1.0), (1.0, 3.0)]).unwrap().into();
//! let spread = &prices * 2.0 - &prices;
//! assert_eq!(spread.value(0.5), Some(2.0));
//! ```

use crate::accumulator::{
    Accumulator, ExponentialAverage, Extreme, FnAccumulate, MovingAverage, Smoothing, Trailing,
    Window,
};
use crate::aggregate::Aggregate;
use crate::constant::Constant;
use crate::differential::Differential;
use crate::extension::{Extension, ExtensionKind};
use crate::extremas::Extremas;
use crate::integral::Integral;
use crate::line::Line;
use crate::map::{Map, Transform};
use crate::offset::{Offset, Shift};
use crate::piecewise::Piecewise;
use curve_core::errors::{Error, Result};
use curve_core::{
    sample, sample_points, Curve, Interval, Observer, Real, Samples, Sampling, Subscription,
};
use curve_math::interpolation::Interpolation;
use curve_time::Duration;
use std::fmt;
use std::ops::{Add, Deref, Div, Mul, Neg, Sub};
use std::rc::Rc;

/// A cheaply clonable, shared reference to a curve.
#[derive(Clone)]
pub struct Handle(Rc<dyn Curve>);

impl Handle {
    /// Wrap a curve.
    pub fn new<C: Curve + 'static>(curve: Rc<C>) -> Self {
        Self(curve)
    }

    /// A handle to a [`Constant`].
    pub fn constant(value: Real) -> Self {
        Self(Constant::new(value))
    }

    /// The wrapped curve.
    pub fn curve(&self) -> &Rc<dyn Curve> {
        &self.0
    }

    /// `true` if both handles point at the same curve.
    pub fn ptr_eq(&self, other: &Handle) -> bool {
        std::ptr::eq(
            Rc::as_ptr(&self.0) as *const (),
            Rc::as_ptr(&other.0) as *const (),
        )
    }

    // ── Aggregates over sets ──────────────────────────────────────────────

    /// Pointwise sum over the common domain.
    ///
    /// # Errors
    /// An empty set of inputs.
    pub fn sum<I, H>(inputs: I) -> Result<Handle>
    where
        I: IntoIterator<Item = H>,
        H: Into<Handle>,
    {
        Ok(Aggregate::sum(collect(inputs))?.into())
    }

    /// Pointwise minimum over the common domain.
    ///
    /// # Errors
    /// An empty set of inputs.
    pub fn min<I, H>(inputs: I) -> Result<Handle>
    where
        I: IntoIterator<Item = H>,
        H: Into<Handle>,
    {
        Ok(Aggregate::min(collect(inputs))?.into())
    }

    /// Pointwise maximum over the common domain.
    ///
    /// # Errors
    /// An empty set of inputs.
    pub fn max<I, H>(inputs: I) -> Result<Handle>
    where
        I: IntoIterator<Item = H>,
        H: Into<Handle>,
    {
        Ok(Aggregate::max(collect(inputs))?.into())
    }

    /// The first defined input value at each x, over the hull of domains.
    ///
    /// # Errors
    /// An empty set of inputs.
    pub fn first<I, H>(inputs: I) -> Result<Handle>
    where
        I: IntoIterator<Item = H>,
        H: Into<Handle>,
    {
        Ok(Aggregate::first(collect(inputs))?.into())
    }

    // ── Maps ──────────────────────────────────────────────────────────────

    /// `g(f(x))`
    pub fn map_y<F>(&self, f: F) -> Handle
    where
        F: Fn(Real) -> Real + 'static,
    {
        Map::new(self.clone(), Transform::y(f)).into()
    }

    /// `g(x, f(x))`
    pub fn map_xy<F>(&self, f: F) -> Handle
    where
        F: Fn(Real, Real) -> Real + 'static,
    {
        Map::new(self.clone(), Transform::xy(f)).into()
    }

    /// `g(x, f(x))` where `g` also sees holes and may return `None`.
    pub fn map<F>(&self, f: F) -> Handle
    where
        F: Fn(Real, Option<Real>) -> Option<Real> + 'static,
    {
        Map::with_holes(self.clone(), Transform::partial(f)).into()
    }

    /// `|f(x)|`
    pub fn abs(&self) -> Handle {
        self.map_y(Real::abs)
    }

    // ── Structural ────────────────────────────────────────────────────────

    /// `f(x - delta)`
    ///
    /// # Errors
    /// A non-finite `delta`.
    pub fn offset(&self, delta: Real) -> Result<Handle> {
        Ok(Offset::new(self.clone(), Shift::Fixed(delta))?.into())
    }

    /// The curve moved `count` grid steps of `duration` along x.
    ///
    /// # Errors
    /// Never for well-formed durations; kept fallible like [`Handle::offset`].
    pub fn offset_steps(&self, count: i32, duration: Duration) -> Result<Handle> {
        Ok(Offset::new(self.clone(), Shift::Steps { count, duration })?.into())
    }

    /// The curve restricted to `domain`.
    ///
    /// # Errors
    /// Never for a single piece; kept fallible like [`Piecewise::new`].
    pub fn subset(&self, domain: Interval) -> Result<Handle> {
        Ok(Piecewise::new(vec![domain], vec![self.clone()])?.into())
    }

    /// This curve before `x0`, `other` after `x1`, and a linear blend in
    /// between.
    ///
    /// # Errors
    /// `x0 >= x1`.
    pub fn blend(&self, other: &Handle, x0: Real, x1: Real) -> Result<Handle> {
        Ok(Aggregate::blend(self.clone(), other.clone(), x0, x1)?.into())
    }

    /// Extrapolate beyond the domain.
    ///
    /// # Errors
    /// An invalid extension model.
    pub fn extension(&self, kind: ExtensionKind, start: bool, end: bool) -> Result<Handle> {
        Ok(Extension::new(self.clone(), kind, start, end)?.into())
    }

    // ── Accumulators ──────────────────────────────────────────────────────

    /// Simple moving average.
    ///
    /// # Errors
    /// An empty or non-positive window.
    pub fn sma(&self, window: Window) -> Result<Handle> {
        Ok(Accumulator::new(self.clone(), MovingAverage::new(window)?).into())
    }

    /// Exponential moving average.
    ///
    /// # Errors
    /// A smoothing factor outside `(0, 1]` or a non-positive period.
    pub fn ema(&self, smoothing: Smoothing) -> Result<Handle> {
        Ok(Accumulator::new(self.clone(), ExponentialAverage::new(smoothing)?).into())
    }

    /// Minimum over a trailing window.
    ///
    /// # Errors
    /// An empty or non-positive window.
    pub fn trailing_min(&self, window: Window) -> Result<Handle> {
        Ok(Accumulator::new(self.clone(), Trailing::new(window, Extreme::Min)?).into())
    }

    /// Maximum over a trailing window.
    ///
    /// # Errors
    /// An empty or non-positive window.
    pub fn trailing_max(&self, window: Window) -> Result<Handle> {
        Ok(Accumulator::new(self.clone(), Trailing::new(window, Extreme::Max)?).into())
    }

    /// Running fold `(x, y, previous output) -> output` over the samples.
    pub fn accumulate<F>(&self, f: F) -> Handle
    where
        F: Fn(Real, Real, Option<Real>) -> Option<Real> + 'static,
    {
        Accumulator::new(self.clone(), FnAccumulate::new(f)).into()
    }

    // ── Calculus ──────────────────────────────────────────────────────────

    /// Running integral from the first defined x.
    pub fn integral(&self) -> Handle {
        Integral::new(self.clone()).into()
    }

    /// Running integral with an explicit segment policy and starting value.
    pub fn integral_with(&self, interpolation: Interpolation, constant: Real) -> Handle {
        Integral::with_options(self.clone(), interpolation, constant).into()
    }

    /// The derivative as a curve.
    pub fn differential(&self) -> Handle {
        Differential::new(self.clone()).into()
    }

    /// Alternating extremes around `reference`.
    pub fn extremas(&self, reference: impl Into<Handle>) -> Handle {
        Extremas::new(self.clone(), reference.into()).into()
    }

    /// Least-squares line through the sampled values.
    ///
    /// # Errors
    /// An unbounded sampling domain or fewer than two defined samples.
    pub fn regression(&self, options: &Sampling) -> Result<Rc<Line>> {
        let points: Vec<(Real, Real)> = self
            .sample_points(options)?
            .into_iter()
            .filter_map(|(x, y)| Some((x, y?)))
            .collect();
        Line::from_points(&points)
    }

    /// Walk downhill from `x` and return the abscissa of the local minimum.
    ///
    /// # Errors
    /// An error of the neighbour search.
    pub fn minimise(&self, x: Real) -> Result<Option<Real>> {
        self.descend(x, |candidate, current| candidate < current)
    }

    /// Walk uphill from `x` and return the abscissa of the local maximum.
    ///
    /// # Errors
    /// An error of the neighbour search.
    pub fn maximise(&self, x: Real) -> Result<Option<Real>> {
        self.descend(x, |candidate, current| candidate > current)
    }

    fn descend(&self, x: Real, better: impl Fn(Real, Real) -> bool) -> Result<Option<Real>> {
        let Some(mut y) = self.value(x) else {
            return Ok(None);
        };
        let domain = self.domain();
        let (start, end) = (
            domain.start().is_finite().then(|| domain.start()),
            domain.end().is_finite().then(|| domain.end()),
        );
        let mut x = x;
        let mut direction: Option<bool> = None;
        loop {
            let mut moved = false;
            for forward in [true, false] {
                if direction == Some(!forward) {
                    continue;
                }
                let candidate = if forward {
                    self.next_defined(x, 0.0, end)?
                } else {
                    self.previous_defined(x, 0.0, start)?
                };
                let Some(candidate) = candidate else {
                    continue;
                };
                match self.value(candidate) {
                    Some(value) if better(value, y) => {
                        x = candidate;
                        y = value;
                        direction = Some(forward);
                        moved = true;
                        break;
                    }
                    _ => {}
                }
            }
            if !moved {
                return Ok(Some(x));
            }
        }
    }

    // ── Edges ─────────────────────────────────────────────────────────────

    /// The value at the first defined abscissa.
    ///
    /// # Errors
    /// [`Error::Unbounded`] when the domain is unbounded below.
    pub fn first_value(&self) -> Result<Option<Real>> {
        let domain = self.domain();
        if domain.is_empty() {
            return Ok(None);
        }
        if domain.is_negative_infinite() {
            return Err(Error::Unbounded(format!("{domain} has no first value")));
        }
        let x = if domain.contains(domain.start()) {
            Some(domain.start())
        } else {
            self.next_defined(domain.start(), 0.0, end_limit(&domain))?
        };
        Ok(x.and_then(|x| self.value(x)))
    }

    /// The value at the last defined abscissa.
    ///
    /// # Errors
    /// [`Error::Unbounded`] when the domain is unbounded above.
    pub fn last_value(&self) -> Result<Option<Real>> {
        let domain = self.domain();
        if domain.is_empty() {
            return Ok(None);
        }
        if domain.is_positive_infinite() {
            return Err(Error::Unbounded(format!("{domain} has no last value")));
        }
        let x = if domain.contains(domain.end()) {
            Some(domain.end())
        } else {
            let start = domain.start().is_finite().then(|| domain.start());
            self.previous_defined(domain.end(), 0.0, start)?
        };
        Ok(x.and_then(|x| self.value(x)))
    }

    // ── Sampling and observation ──────────────────────────────────────────

    /// Iterate over `(x, y)` samples.
    ///
    /// # Errors
    /// See [`sample`].
    pub fn sample(&self, options: &Sampling) -> Result<Samples<'_>> {
        sample(&*self.0, options)
    }

    /// Collect `(x, y)` samples.
    ///
    /// # Errors
    /// See [`sample`].
    pub fn sample_points(&self, options: &Sampling) -> Result<Vec<(Real, Option<Real>)>> {
        sample_points(&*self.0, options)
    }

    /// Register `observer` for as long as the returned guard lives.
    pub fn observe(&self, observer: Observer) -> Subscription {
        Subscription::new(Rc::clone(&self.0), observer)
    }
}

fn end_limit(domain: &Interval) -> Option<Real> {
    domain.end().is_finite().then(|| domain.end())
}

fn collect<I, H>(inputs: I) -> Vec<Handle>
where
    I: IntoIterator<Item = H>,
    H: Into<Handle>,
{
    inputs.into_iter().map(Into::into).collect()
}

impl Deref for Handle {
    type Target = dyn Curve;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({:?})", self.0)
    }
}

impl<C: Curve + 'static> From<Rc<C>> for Handle {
    fn from(curve: Rc<C>) -> Self {
        Self(curve)
    }
}

impl From<Rc<dyn Curve>> for Handle {
    fn from(curve: Rc<dyn Curve>) -> Self {
        Self(curve)
    }
}

impl From<&Handle> for Handle {
    fn from(handle: &Handle) -> Self {
        handle.clone()
    }
}

impl From<Real> for Handle {
    fn from(value: Real) -> Self {
        Self::constant(value)
    }
}

// ── Operators ─────────────────────────────────────────────────────────────────

fn binary(a: &Handle, b: &Handle, op: fn(Real, Real) -> Option<Real>) -> Handle {
    Aggregate::binary(a.clone(), b.clone(), op).into()
}

fn scalar(a: &Handle, op: impl Fn(Real) -> Real + 'static) -> Handle {
    Map::new(a.clone(), Transform::y(op)).into()
}

/// Division by zero is a hole, not an infinity.
fn checked_div(a: Real, b: Real) -> Option<Real> {
    (b != 0.0).then(|| a / b)
}

macro_rules! impl_ops {
    ($trait:ident, $method:ident, $combine:expr, $left:expr, $right:expr) => {
        impl $trait<&Handle> for &Handle {
            type Output = Handle;
            fn $method(self, rhs: &Handle) -> Handle {
                binary(self, rhs, $combine)
            }
        }

        impl $trait<Handle> for Handle {
            type Output = Handle;
            fn $method(self, rhs: Handle) -> Handle {
                binary(&self, &rhs, $combine)
            }
        }

        impl $trait<&Handle> for Handle {
            type Output = Handle;
            fn $method(self, rhs: &Handle) -> Handle {
                binary(&self, rhs, $combine)
            }
        }

        impl $trait<Handle> for &Handle {
            type Output = Handle;
            fn $method(self, rhs: Handle) -> Handle {
                binary(self, &rhs, $combine)
            }
        }

        impl $trait<Real> for &Handle {
            type Output = Handle;
            fn $method(self, rhs: Real) -> Handle {
                let f: fn(Real, Real) -> Real = $left;
                scalar(self, move |y| f(y, rhs))
            }
        }

        impl $trait<Real> for Handle {
            type Output = Handle;
            fn $method(self, rhs: Real) -> Handle {
                (&self).$method(rhs)
            }
        }

        impl $trait<&Handle> for Real {
            type Output = Handle;
            fn $method(self, rhs: &Handle) -> Handle {
                let f: fn(Real, Real) -> Real = $right;
                scalar(rhs, move |y| f(self, y))
            }
        }

        impl $trait<Handle> for Real {
            type Output = Handle;
            fn $method(self, rhs: Handle) -> Handle {
                self.$method(&rhs)
            }
        }
    };
}

impl_ops!(Add, add, |a, b| Some(a + b), |y, c| y + c, |c, y| c + y);
impl_ops!(Sub, sub, |a, b| Some(a - b), |y, c| y - c, |c, y| c - y);
impl_ops!(Mul, mul, |a, b| Some(a * b), |y, c| y * c, |c, y| c * y);
impl_ops!(Div, div, checked_div, |y, c| y / c, |c, y| c / y);

impl Neg for &Handle {
    type Output = Handle;
    fn neg(self) -> Handle {
        scalar(self, |y| -y)
    }
}

impl Neg for Handle {
    type Output = Handle;
    fn neg(self) -> Handle {
        -&self
    }
}
