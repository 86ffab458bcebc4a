//! Mutable sample-backed curve.
//!
//! [`Points`] stores `(x, y)` samples with strictly increasing `x`. A `y`
//! of `None` is a hole: the curve's domain still spans it but the value
//! there (and wherever interpolation needs it) is `None`. Values between
//! samples follow the configured [`Interpolation`].
//!
//! Every mutation validates its input first, then runs an update pass over
//! the smallest interval whose values can change:
//!
//! | operation       | interval                                        |
//! |-----------------|-------------------------------------------------|
//! | `append`        | `(x_last, x]`, or `[x, x]` on an empty curve    |
//! | `append_list`   | `(x_last, x_new_last]`                          |
//! | `replace` at i  | `(x_{i-1}, x_{i+1})`, closed at a sequence end  |
//! | `reset` of i0..i1 | from the kept neighbour before to the kept neighbour after |
//! | `set`           | hull of the old and new domains                 |
//!
//! Samples on a uniform grid are looked up arithmetically. The uniform
//! flag is tracked automatically; with [`PointsOptions::uniform`] set it is
//! enforced instead and off-grid insertions are rejected.

use curve_core::errors::{Error, Result};
use curve_core::{Curve, CurveConfig, Interval, Real, UpdateNotifier};
use curve_math::comparison::{close, on_grid, EPSILON};
use curve_math::interpolation::{self, Interpolation, UniformGrid};
use std::cell::{Cell, RefCell};
use std::ops::Range;
use std::rc::Rc;
use tracing::debug;

/// Construction options for [`Points`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PointsOptions {
    /// Policy between samples.
    pub interpolation: Interpolation,
    /// Reject samples that break a uniform grid.
    pub uniform: bool,
    /// Resolution of the curve.
    pub min_step: Real,
}

impl Default for PointsOptions {
    fn default() -> Self {
        Self::from_config(&CurveConfig::default())
    }
}

impl PointsOptions {
    /// Linear interpolation with the resolution of `config`.
    pub fn from_config(config: &CurveConfig) -> Self {
        Self {
            interpolation: Interpolation::Linear,
            uniform: false,
            min_step: config.min_step,
        }
    }

    /// Use `interpolation` between samples.
    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    /// Enforce a uniform grid.
    pub fn strict_uniform(mut self) -> Self {
        self.uniform = true;
        self
    }
}

// ── Storage ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Store {
    xs: Vec<Real>,
    ys: Vec<Option<Real>>,
    uniform: bool,
}

impl Store {
    fn len(&self) -> usize {
        self.xs.len()
    }

    fn step(&self) -> Option<Real> {
        (self.xs.len() >= 2).then(|| self.xs[1] - self.xs[0])
    }

    fn grid(&self) -> Option<UniformGrid> {
        if !self.uniform {
            return None;
        }
        self.step().map(|step| UniformGrid {
            origin: self.xs[0],
            step,
        })
    }

    fn domain(&self) -> Interval {
        match (self.xs.first(), self.xs.last()) {
            (Some(&first), Some(&last)) => Interval::closed(first, last),
            _ => Interval::empty(),
        }
    }

    /// Index of the last sample `<= x`.
    fn locate_previous(&self, x: Real) -> Option<usize> {
        match self.grid() {
            Some(grid) => grid.locate_previous(&self.xs, x),
            None => interpolation::locate_previous(&self.xs, x),
        }
    }

    /// Index of the first sample `>= x`.
    fn locate_next(&self, x: Real) -> Option<usize> {
        let index = match self.locate_previous(x) {
            Some(i) if self.xs[i] == x => i,
            Some(i) => i + 1,
            None => 0,
        };
        (index < self.len()).then_some(index)
    }

    fn position(&self, x: Real) -> Option<usize> {
        self.locate_previous(x).filter(|&i| self.xs[i] == x)
    }

    fn is_next_on_grid(&self, x: Real) -> bool {
        match (self.step(), self.xs.last()) {
            (Some(step), Some(&last)) => close(x - last, step, EPSILON * step.abs().max(1.0)),
            _ => true,
        }
    }

    fn push(&mut self, x: Real, y: Option<Real>) {
        if self.xs.len() < 2 {
            self.uniform = true;
        } else {
            self.uniform = self.uniform && self.is_next_on_grid(x);
        }
        self.xs.push(x);
        self.ys.push(y);
    }

    fn retrack(&mut self) {
        self.uniform = is_uniform(&self.xs);
    }

    fn index_range(&self, domain: &Interval) -> Range<usize> {
        if domain.is_empty() || self.xs.is_empty() {
            return 0..0;
        }
        let start = self.xs.partition_point(|&x| {
            x < domain.start() || (x == domain.start() && domain.start_open())
        });
        let end = self.xs.partition_point(|&x| {
            x < domain.end() || (x == domain.end() && !domain.end_open())
        });
        start..end.max(start)
    }
}

fn is_uniform(xs: &[Real]) -> bool {
    if xs.len() < 3 {
        return true;
    }
    let step = xs[1] - xs[0];
    xs.windows(2)
        .all(|w| close(w[1] - w[0], step, EPSILON * step.abs().max(1.0)))
}

fn validate(samples: &[(Real, Option<Real>)], after: Option<Real>) -> Result<()> {
    let mut previous = after;
    for &(x, _) in samples {
        curve_core::ensure!(x.is_finite(), "sample abscissa must be finite, got {x}");
        if let Some(p) = previous {
            if x <= p {
                return Err(Error::OutOfOrder(format!(
                    "sample at {x} does not follow {p}"
                )));
            }
        }
        previous = Some(x);
    }
    Ok(())
}

/// Marks a mutation in progress; a second mutation from inside an
/// observer callback of the first is rejected.
struct MutationGuard<'a>(&'a Cell<bool>);

impl<'a> MutationGuard<'a> {
    fn acquire(flag: &'a Cell<bool>) -> Result<Self> {
        if flag.replace(true) {
            return Err(Error::ReentrantMutation(
                "points mutated from inside one of their own update callbacks".into(),
            ));
        }
        Ok(Self(flag))
    }
}

impl Drop for MutationGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

// ── Points ────────────────────────────────────────────────────────────────────

/// A curve defined by stored samples.
#[derive(Debug)]
pub struct Points {
    store: RefCell<Store>,
    options: PointsOptions,
    notifier: UpdateNotifier,
    mutating: Cell<bool>,
}

impl Points {
    /// Samples with linear interpolation.
    ///
    /// # Errors
    /// Non-ascending or non-finite abscissae.
    pub fn new<I, Y>(samples: I) -> Result<Rc<Self>>
    where
        I: IntoIterator<Item = (Real, Y)>,
        Y: Into<Option<Real>>,
    {
        Self::with_options(samples, PointsOptions::default())
    }

    /// Samples with explicit options.
    ///
    /// # Errors
    /// Non-ascending or non-finite abscissae, or an irregular grid when
    /// `options.uniform` is set.
    pub fn with_options<I, Y>(samples: I, options: PointsOptions) -> Result<Rc<Self>>
    where
        I: IntoIterator<Item = (Real, Y)>,
        Y: Into<Option<Real>>,
    {
        curve_core::ensure_config!(
            options.min_step > 0.0 && options.min_step.is_finite(),
            "min_step must be positive, got {}",
            options.min_step
        );
        let samples: Vec<(Real, Option<Real>)> =
            samples.into_iter().map(|(x, y)| (x, y.into())).collect();
        validate(&samples, None)?;
        let (xs, ys): (Vec<Real>, Vec<Option<Real>>) = samples.into_iter().unzip();
        let uniform = is_uniform(&xs);
        curve_core::ensure_config!(
            uniform || !options.uniform,
            "samples are not evenly spaced"
        );
        Ok(Rc::new(Self {
            store: RefCell::new(Store { xs, ys, uniform }),
            options,
            notifier: UpdateNotifier::new(),
            mutating: Cell::new(false),
        }))
    }

    /// A curve with no samples.
    pub fn empty() -> Rc<Self> {
        Rc::new(Self {
            store: RefCell::new(Store::default()),
            options: PointsOptions::default(),
            notifier: UpdateNotifier::new(),
            mutating: Cell::new(false),
        })
    }

    /// `values[i]` at `start + i·step`.
    ///
    /// # Errors
    /// A non-positive step.
    pub fn from_values(values: &[Real], start: Real, step: Real) -> Result<Rc<Self>> {
        curve_core::ensure_config!(step > 0.0, "step must be positive, got {step}");
        Self::new(
            values
                .iter()
                .enumerate()
                .map(|(i, &y)| (start + i as Real * step, y)),
        )
    }

    // ── Inspectors ────────────────────────────────────────────────────────

    /// Number of stored samples, holes included.
    pub fn len(&self) -> usize {
        self.store.borrow().len()
    }

    /// `true` without samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A copy of the stored samples.
    pub fn samples(&self) -> Vec<(Real, Option<Real>)> {
        let store = self.store.borrow();
        store.xs.iter().copied().zip(store.ys.iter().copied()).collect()
    }

    /// The first stored sample.
    pub fn first(&self) -> Option<(Real, Option<Real>)> {
        let store = self.store.borrow();
        Some((*store.xs.first()?, *store.ys.first()?))
    }

    /// The last stored sample.
    pub fn last(&self) -> Option<(Real, Option<Real>)> {
        let store = self.store.borrow();
        Some((*store.xs.last()?, *store.ys.last()?))
    }

    /// `true` while the samples lie on a uniform grid.
    pub fn is_uniform(&self) -> bool {
        self.store.borrow().uniform
    }

    /// The policy between samples.
    pub fn interpolation(&self) -> Interpolation {
        self.options.interpolation
    }

    /// Indices of the samples inside `domain`.
    pub fn index_range(&self, domain: &Interval) -> Range<usize> {
        self.store.borrow().index_range(domain)
    }

    // ── Mutations ─────────────────────────────────────────────────────────

    /// Append a sample after the last one.
    ///
    /// # Errors
    /// [`Error::OutOfOrder`] unless `x` follows the last sample,
    /// [`Error::InvalidConfiguration`] for an off-grid `x` in strict
    /// uniform mode, [`Error::ReentrantMutation`] from inside a callback.
    pub fn append(&self, x: Real, y: impl Into<Option<Real>>) -> Result<()> {
        let _guard = MutationGuard::acquire(&self.mutating)?;
        self.append_unguarded(x, y.into())
    }

    fn append_unguarded(&self, x: Real, y: Option<Real>) -> Result<()> {
        let interval = {
            let store = self.store.borrow();
            let last = store.xs.last().copied();
            validate(&[(x, y)], last)?;
            curve_core::ensure_config!(
                !self.options.uniform || store.is_next_on_grid(x),
                "{x} is off the uniform grid"
            );
            last.map_or(Interval::point(x), |last| Interval::open_closed(last, x))
        };
        debug!(x, ?y, "append");
        self.notifier.begin_update(&interval)?;
        self.store.borrow_mut().push(x, y);
        self.notifier.end_update(&interval)
    }

    /// Append several samples in one update pass.
    ///
    /// # Errors
    /// As [`Points::append`]. Nothing is stored unless every sample is
    /// valid.
    pub fn append_list<I, Y>(&self, samples: I) -> Result<()>
    where
        I: IntoIterator<Item = (Real, Y)>,
        Y: Into<Option<Real>>,
    {
        let _guard = MutationGuard::acquire(&self.mutating)?;
        let samples: Vec<(Real, Option<Real>)> =
            samples.into_iter().map(|(x, y)| (x, y.into())).collect();
        let (Some(&(first, _)), Some(&(end, _))) = (samples.first(), samples.last()) else {
            return Ok(());
        };
        let interval = {
            let store = self.store.borrow();
            let last = store.xs.last().copied();
            validate(&samples, last)?;
            if self.options.uniform {
                let mut xs = store.xs.clone();
                xs.extend(samples.iter().map(|&(x, _)| x));
                curve_core::ensure_config!(
                    is_uniform(&xs),
                    "appended samples break the uniform grid"
                );
            }
            last.map_or(Interval::closed(first, end), |last| {
                Interval::open_closed(last, end)
            })
        };
        debug!(count = samples.len(), %interval, "append_list");
        self.notifier.begin_update(&interval)?;
        {
            let mut store = self.store.borrow_mut();
            for (x, y) in samples {
                store.push(x, y);
            }
        }
        self.notifier.end_update(&interval)
    }

    /// Overwrite the value at an existing `x`, or append when `or_append`
    /// is set and `x` follows the last sample.
    ///
    /// # Errors
    /// [`Error::NotFound`] for an unknown `x` without `or_append`,
    /// [`Error::OutOfOrder`] for an unknown `x` that does not follow the
    /// last sample, [`Error::InvalidConfiguration`] for an off-grid `x` in
    /// strict uniform mode.
    pub fn replace(&self, x: Real, y: impl Into<Option<Real>>, or_append: bool) -> Result<()> {
        let _guard = MutationGuard::acquire(&self.mutating)?;
        let y = y.into();
        let (index, interval) = {
            let store = self.store.borrow();
            match store.position(x) {
                Some(i) => {
                    let n = store.len();
                    let (start, start_open) = if i > 0 {
                        (store.xs[i - 1], true)
                    } else {
                        (store.xs[i], false)
                    };
                    let (end, end_open) = if i + 1 < n {
                        (store.xs[i + 1], true)
                    } else {
                        (store.xs[i], false)
                    };
                    (i, Interval::new(start, end, start_open, end_open))
                }
                None => {
                    if self.options.uniform {
                        if let Some(step) = store.step() {
                            curve_core::ensure_config!(
                                on_grid(x, store.xs[0], step),
                                "{x} is off the uniform grid"
                            );
                        }
                    }
                    if !or_append {
                        return Err(Error::NotFound(format!("no sample at {x}")));
                    }
                    if let Some(&last) = store.xs.last() {
                        if x <= last {
                            return Err(Error::OutOfOrder(format!(
                                "cannot insert {x} before the last sample {last}"
                            )));
                        }
                    }
                    drop(store);
                    return self.append_unguarded(x, y);
                }
            }
        };
        debug!(x, ?y, "replace");
        self.notifier.begin_update(&interval)?;
        self.store.borrow_mut().ys[index] = y;
        self.notifier.end_update(&interval)
    }

    /// Remove the samples inside `domain`, or all samples for `None`.
    ///
    /// # Errors
    /// [`Error::ReentrantMutation`] from inside a callback, or an error of
    /// an observer.
    pub fn reset(&self, domain: Option<Interval>) -> Result<()> {
        let _guard = MutationGuard::acquire(&self.mutating)?;
        let (range, interval) = {
            let store = self.store.borrow();
            let range = domain.map_or(0..store.len(), |d| store.index_range(&d));
            if range.is_empty() {
                return Ok(());
            }
            let (start, start_open) = match range.start.checked_sub(1) {
                Some(before) => (store.xs[before], true),
                None => (store.xs[range.start], false),
            };
            let (end, end_open) = if range.end < store.len() {
                (store.xs[range.end], true)
            } else {
                (store.xs[range.end - 1], false)
            };
            (range, Interval::new(start, end, start_open, end_open))
        };
        debug!(removed = range.len(), %interval, "reset");
        self.notifier.begin_update(&interval)?;
        {
            let mut store = self.store.borrow_mut();
            store.xs.drain(range.clone());
            store.ys.drain(range);
            store.retrack();
        }
        self.notifier.end_update(&interval)
    }

    /// Replace every sample.
    ///
    /// # Errors
    /// As [`Points::with_options`]; the old samples are kept on error.
    pub fn set<I, Y>(&self, samples: I) -> Result<()>
    where
        I: IntoIterator<Item = (Real, Y)>,
        Y: Into<Option<Real>>,
    {
        let _guard = MutationGuard::acquire(&self.mutating)?;
        let samples: Vec<(Real, Option<Real>)> =
            samples.into_iter().map(|(x, y)| (x, y.into())).collect();
        validate(&samples, None)?;
        let (xs, ys): (Vec<Real>, Vec<Option<Real>>) = samples.into_iter().unzip();
        let uniform = is_uniform(&xs);
        curve_core::ensure_config!(
            uniform || !self.options.uniform,
            "samples are not evenly spaced"
        );
        let replacement = Store { xs, ys, uniform };
        let interval = self.store.borrow().domain().hull(&replacement.domain());
        debug!(count = replacement.len(), %interval, "set");
        self.notifier.begin_update(&interval)?;
        *self.store.borrow_mut() = replacement;
        self.notifier.end_update(&interval)
    }

    fn segment_slope(store: &Store, left: usize) -> Option<Real> {
        let right = left + 1;
        if right >= store.len() {
            return None;
        }
        let (y0, y1) = (store.ys[left]?, store.ys[right]?);
        Some((y1 - y0) / (store.xs[right] - store.xs[left]))
    }
}

impl Curve for Points {
    fn notifier(&self) -> &UpdateNotifier {
        &self.notifier
    }

    fn domain(&self) -> Interval {
        self.store.borrow().domain()
    }

    fn min_step(&self) -> Real {
        self.options.min_step
    }

    fn value(&self, x: Real) -> Option<Real> {
        let store = self.store.borrow();
        let i = store.locate_previous(x)?;
        if store.xs[i] == x {
            return store.ys[i];
        }
        if i + 1 >= store.len() {
            return None;
        }
        self.options.interpolation.interpolate(
            x,
            (store.xs[i], store.ys[i]),
            (store.xs[i + 1], store.ys[i + 1]),
        )
    }

    fn next_defined(&self, x: Real, min_step: Real, limit: Option<Real>) -> Result<Option<Real>> {
        let store = self.store.borrow();
        let Some(mut i) = store.locate_next(x + self.resolve_min_step(min_step)) else {
            return Ok(None);
        };
        while i < store.len() && store.ys[i].is_none() {
            i += 1;
        }
        Ok(store
            .xs
            .get(i)
            .copied()
            .filter(|&next| limit.map_or(true, |l| next <= l)))
    }

    fn previous_defined(
        &self,
        x: Real,
        min_step: Real,
        limit: Option<Real>,
    ) -> Result<Option<Real>> {
        let store = self.store.borrow();
        let Some(mut i) = store.locate_previous(x - self.resolve_min_step(min_step)) else {
            return Ok(None);
        };
        while store.ys[i].is_none() {
            let Some(before) = i.checked_sub(1) else {
                return Ok(None);
            };
            i = before;
        }
        let previous = store.xs[i];
        Ok(limit.map_or(true, |l| previous >= l).then_some(previous))
    }

    fn derivative(
        &self,
        x: Real,
        forward: bool,
        min_step: Real,
        limit: Option<Real>,
    ) -> Option<Real> {
        if self.options.interpolation != Interpolation::Linear {
            return curve_core::curve::difference_quotient(self, x, forward, min_step, limit);
        }
        let store = self.store.borrow();
        if !store.domain().contains(x) {
            return None;
        }
        let i = store.locate_previous(x)?;
        let left = if forward {
            i
        } else if store.xs[i] == x {
            i.checked_sub(1)?
        } else {
            i
        };
        Self::segment_slope(&store, left)
    }
}
