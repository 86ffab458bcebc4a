//! The `Curve` trait.
//!
//! A curve is a partially defined real function of one real variable.
//! Implementors provide their domain, their resolution and a value lookup;
//! neighbour search, numeric derivatives and observer management come as
//! provided methods that concrete curves override where they know better.
//!
//! Invariant: outside `domain()` the value is always `None`. Inside the
//! domain a value may still be `None` only where a sample is an explicit
//! hole.

use crate::errors::{Error, Result};
use crate::interval::Interval;
use crate::observable::{Observer, ObserverToken, OwnerId, UpdateNotifier};
use crate::Real;
use std::fmt;
use std::rc::Rc;

/// A lazily evaluated, partially defined function `f: R → R`.
pub trait Curve: fmt::Debug {
    /// The registry and update state of this curve.
    fn notifier(&self) -> &UpdateNotifier;

    /// The interval over which the curve is currently defined.
    fn domain(&self) -> Interval;

    /// Smallest x increment this curve can resolve.
    fn min_step(&self) -> Real;

    /// The value at `x`, or `None` if undefined there.
    fn value(&self, x: Real) -> Option<Real>;

    /// Smallest `x' >= x + min_step` at which the curve is defined.
    ///
    /// Returns `Ok(None)` past the domain edge or beyond `limit`.
    ///
    /// # Errors
    /// [`Error::Unbounded`] if the domain is unbounded above and no `limit`
    /// is given.
    fn next_defined(&self, x: Real, min_step: Real, limit: Option<Real>) -> Result<Option<Real>> {
        step_forward(&self.domain(), x, self.resolve_min_step(min_step), limit)
    }

    /// Largest `x' <= x - min_step` at which the curve is defined.
    ///
    /// # Errors
    /// [`Error::Unbounded`] if the domain is unbounded below and no `limit`
    /// is given.
    fn previous_defined(
        &self,
        x: Real,
        min_step: Real,
        limit: Option<Real>,
    ) -> Result<Option<Real>> {
        step_backward(&self.domain(), x, self.resolve_min_step(min_step), limit)
    }

    /// One-sided difference quotient of width `min_step` at `x`.
    ///
    /// `None` unless both abscissae are defined and inside `limit`.
    fn derivative(
        &self,
        x: Real,
        forward: bool,
        min_step: Real,
        limit: Option<Real>,
    ) -> Option<Real> {
        difference_quotient(self, x, forward, min_step, limit)
    }

    /// `max(min_step, self.min_step())`
    fn resolve_min_step(&self, min_step: Real) -> Real {
        min_step.max(self.min_step())
    }

    /// `true` strictly inside an update pass.
    fn is_updating(&self) -> bool {
        self.notifier().is_updating()
    }

    /// Start (or join) an update pass over `interval`.
    fn begin_update(&self, interval: &Interval) -> Result<()> {
        self.notifier().begin_update(interval)
    }

    /// Finish one level of an update pass over `interval`.
    fn end_update(&self, interval: &Interval) -> Result<()> {
        self.notifier().end_update(interval)
    }

    /// Register an observer.
    fn add_observer(&self, observer: Observer) -> ObserverToken {
        self.notifier().add(observer)
    }

    /// Remove an observer by token. Unknown tokens are ignored.
    fn remove_observer(&self, token: ObserverToken) {
        self.notifier().remove(token)
    }

    /// Remove every observer registered for `owner`.
    fn remove_observers_of(&self, owner: OwnerId) {
        self.notifier().remove_owner(owner)
    }
}

/// The numeric derivative used by [`Curve::derivative`], callable from
/// overrides that only special-case part of the input.
pub fn difference_quotient<C: Curve + ?Sized>(
    curve: &C,
    x: Real,
    forward: bool,
    min_step: Real,
    limit: Option<Real>,
) -> Option<Real> {
    let h = curve.resolve_min_step(min_step);
    let (x0, x1) = if forward { (x, x + h) } else { (x - h, x) };
    if let Some(limit) = limit {
        if (forward && x1 > limit) || (!forward && x0 < limit) {
            return None;
        }
    }
    let y0 = curve.value(x0)?;
    let y1 = curve.value(x1)?;
    Some((y1 - y0) / (x1 - x0))
}

// ── Neighbour search helpers ──────────────────────────────────────────────────

/// Continuous forward search: the domain is dense, so the answer is
/// `x + step`, or the domain start when `x` lies before the domain.
pub fn step_forward(
    domain: &Interval,
    x: Real,
    step: Real,
    limit: Option<Real>,
) -> Result<Option<Real>> {
    if domain.is_empty() {
        return Ok(None);
    }
    if limit.is_none() && domain.is_positive_infinite() {
        return Err(Error::Unbounded(format!(
            "next_defined from {x} on {domain} needs a limit"
        )));
    }
    let mut next = x + step;
    if next < domain.start() || (next == domain.start() && domain.start_open()) {
        next = if domain.start_open() {
            domain.start() + step
        } else {
            domain.start()
        };
    }
    Ok(accept(domain, next, limit.map(|l| next <= l)))
}

/// Mirror image of [`step_forward`].
pub fn step_backward(
    domain: &Interval,
    x: Real,
    step: Real,
    limit: Option<Real>,
) -> Result<Option<Real>> {
    if domain.is_empty() {
        return Ok(None);
    }
    if limit.is_none() && domain.is_negative_infinite() {
        return Err(Error::Unbounded(format!(
            "previous_defined from {x} on {domain} needs a limit"
        )));
    }
    let mut previous = x - step;
    if previous > domain.end() || (previous == domain.end() && domain.end_open()) {
        previous = if domain.end_open() {
            domain.end() - step
        } else {
            domain.end()
        };
    }
    Ok(accept(domain, previous, limit.map(|l| previous >= l)))
}

/// Forward search for curves that are linear between their knots: the
/// furthest point worth visiting is the limit (or the domain end).
pub fn jump_forward(
    domain: &Interval,
    x: Real,
    step: Real,
    limit: Option<Real>,
) -> Result<Option<Real>> {
    let Some(next) = step_forward(domain, x, step, limit)? else {
        return Ok(None);
    };
    if x < domain.start() {
        return Ok(Some(next));
    }
    let target = limit.map_or(domain.end(), |l| l.min(domain.end()));
    if domain.contains(target) {
        Ok(Some(target.max(next)))
    } else {
        Ok(Some(next))
    }
}

/// Mirror image of [`jump_forward`].
pub fn jump_backward(
    domain: &Interval,
    x: Real,
    step: Real,
    limit: Option<Real>,
) -> Result<Option<Real>> {
    let Some(previous) = step_backward(domain, x, step, limit)? else {
        return Ok(None);
    };
    if x > domain.end() {
        return Ok(Some(previous));
    }
    let target = limit.map_or(domain.start(), |l| l.max(domain.start()));
    if domain.contains(target) {
        Ok(Some(target.min(previous)))
    } else {
        Ok(Some(previous))
    }
}

fn accept(domain: &Interval, x: Real, within_limit: Option<bool>) -> Option<Real> {
    if !domain.contains(x) || within_limit == Some(false) {
        None
    } else {
        Some(x)
    }
}

// ── Subscription ──────────────────────────────────────────────────────────────

/// A registration that is removed when the guard is dropped.
///
/// Derived curves hold one per input so that dropping the derived curve
/// detaches it from its inputs. Callers use the same guard for scoped
/// observation.
pub struct Subscription {
    source: Rc<dyn Curve>,
    token: ObserverToken,
}

/// A [`Subscription`] handed to callers for scoped observation.
pub type ObserverGuard = Subscription;

impl Subscription {
    /// Register `observer` on `source` and return the guard.
    pub fn new(source: Rc<dyn Curve>, observer: Observer) -> Self {
        let token = source.add_observer(observer);
        Self { source, token }
    }

    /// The token of the guarded registration.
    pub fn token(&self) -> ObserverToken {
        self.token
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.source.remove_observer(self.token);
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("source", &self.source)
            .field("token", &self.token)
            .finish()
    }
}
