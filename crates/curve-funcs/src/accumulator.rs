//! Running computations over the samples of an input.
//!
//! An [`Accumulator`] walks its input's defined abscissae from the start of
//! the input's domain and computes one output per sample with an
//! [`Accumulate`] rule. Outputs are cached and extended lazily as callers
//! look further right. An input update truncates the cache at the start of
//! the changed interval, so only the suffix is recomputed.
//!
//! Rules provided here:
//!
//! * [`MovingAverage`]: simple moving average over a [`Window`];
//! * [`ExponentialAverage`]: exponential moving average;
//! * [`Trailing`]: minimum or maximum over a trailing window;
//! * [`FnAccumulate`]: a user fold `(x, y, previous) -> output`.

use crate::handle::Handle;
use crate::link::{self, Dependent};
use curve_core::errors::Result;
use curve_core::{Curve, Interval, LazyDomain, Real, Subscription, UpdateNotifier};
use curve_math::interpolation::{self, Interpolation};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use tracing::{trace, warn};

// ── Rules ─────────────────────────────────────────────────────────────────────

/// A per-sample computation for an [`Accumulator`].
pub trait Accumulate: fmt::Debug + 'static {
    /// The output at sample `index`.
    ///
    /// `xs` and `ys` hold the input samples known so far, at least up to
    /// `index` and possibly one more. `outputs` holds the outputs before
    /// `index`.
    fn accumulate(
        &self,
        index: usize,
        xs: &[Real],
        ys: &[Real],
        outputs: &[Option<Real>],
    ) -> Option<Real>;

    /// The outputs that may change when the input changes over `interval`.
    ///
    /// `xs` are the input abscissae cached before the change. By default
    /// everything from the start of `interval` onwards.
    fn reach(&self, interval: &Interval, xs: &[Real]) -> Interval {
        let _ = xs;
        interval.extended_to_positive_infinity()
    }
}

/// The samples a windowed rule looks at.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Window {
    /// The last `n` samples.
    Count(usize),
    /// The samples within a distance `p` along x.
    Period(Real),
}

impl Window {
    fn validated(self) -> Result<Self> {
        match self {
            Window::Count(n) => {
                curve_core::ensure_config!(n > 0, "a window must hold at least one sample")
            }
            Window::Period(p) => curve_core::ensure_config!(
                p > 0.0 && p.is_finite(),
                "window period must be positive, got {p}"
            ),
        }
        Ok(self)
    }

    fn reach(self, interval: &Interval, xs: &[Real]) -> Interval {
        if interval.is_empty() {
            return Interval::empty();
        }
        match self {
            Window::Period(p) => Interval::new(
                interval.start(),
                interval.end() + p,
                interval.start_open(),
                false,
            ),
            Window::Count(n) => {
                // Samples past the cache are unknown, so is the reach.
                if xs.last().map_or(true, |&cached| interval.end() > cached) {
                    return interval.extended_to_positive_infinity();
                }
                let last = interpolation::locate_previous(xs, interval.end()).unwrap_or(0);
                match xs.get(last + n - 1) {
                    Some(&end) if end > interval.end() => {
                        Interval::new(interval.start(), end, interval.start_open(), false)
                    }
                    Some(_) => *interval,
                    None => interval.extended_to_positive_infinity(),
                }
            }
        }
    }
}

fn mean(ys: &[Real]) -> Option<Real> {
    (!ys.is_empty()).then(|| ys.iter().sum::<Real>() / ys.len() as Real)
}

/// Simple moving average.
///
/// With [`Window::Count`]`(n)` the output is defined from the n-th sample.
/// With [`Window::Period`]`(p)` the window is `(x − p, x]` and the output
/// is defined once `x − p ≥ x₀ − Δ₀`, where `Δ₀` is the first sample gap,
/// i.e. once the window holds as many samples as it would on a regular
/// grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovingAverage {
    window: Window,
}

impl MovingAverage {
    /// # Errors
    /// An empty or non-positive window.
    pub fn new(window: Window) -> Result<Self> {
        Ok(Self {
            window: window.validated()?,
        })
    }
}

impl Accumulate for MovingAverage {
    fn accumulate(
        &self,
        index: usize,
        xs: &[Real],
        ys: &[Real],
        _outputs: &[Option<Real>],
    ) -> Option<Real> {
        match self.window {
            Window::Count(n) => {
                let start = (index + 1).checked_sub(n)?;
                mean(&ys[start..=index])
            }
            Window::Period(p) => {
                let x = xs[index];
                let first_gap = xs.get(1)? - xs[0];
                let tolerance = 1e-9 * x.abs().max(1.0);
                if x - p < xs[0] - first_gap - tolerance {
                    return None;
                }
                let start = xs[..=index].partition_point(|&xi| xi <= x - p + tolerance);
                mean(&ys[start..=index])
            }
        }
    }

    fn reach(&self, interval: &Interval, xs: &[Real]) -> Interval {
        let reach = self.window.reach(interval, xs);
        match (self.window, xs.first(), xs.get(1)) {
            (Window::Period(_), Some(&x0), Some(&x1)) if interval.start() <= x1 => {
                reach.hull(&Interval::point(x0))
            }
            _ => reach,
        }
    }
}

/// How fast an [`ExponentialAverage`] forgets.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Smoothing {
    /// A fixed factor in `(0, 1]`.
    Alpha(Real),
    /// `α = min(1, Δx / p)` for the gap `Δx` to the previous sample.
    Period(Real),
}

/// Exponential moving average `eᵢ = eᵢ₋₁ + α·(yᵢ − eᵢ₋₁)`, seeded with the
/// first sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialAverage {
    smoothing: Smoothing,
}

impl ExponentialAverage {
    /// # Errors
    /// A factor outside `(0, 1]` or a non-positive period.
    pub fn new(smoothing: Smoothing) -> Result<Self> {
        match smoothing {
            Smoothing::Alpha(alpha) => curve_core::ensure_config!(
                alpha > 0.0 && alpha <= 1.0,
                "smoothing factor must lie in (0, 1], got {alpha}"
            ),
            Smoothing::Period(p) => curve_core::ensure_config!(
                p > 0.0 && p.is_finite(),
                "smoothing period must be positive, got {p}"
            ),
        }
        Ok(Self { smoothing })
    }
}

impl Accumulate for ExponentialAverage {
    fn accumulate(
        &self,
        index: usize,
        xs: &[Real],
        ys: &[Real],
        outputs: &[Option<Real>],
    ) -> Option<Real> {
        let Some(previous) = index.checked_sub(1) else {
            return Some(ys[0]);
        };
        let last = outputs[previous]?;
        let alpha = match self.smoothing {
            Smoothing::Alpha(alpha) => alpha,
            Smoothing::Period(p) => ((xs[index] - xs[previous]) / p).min(1.0),
        };
        Some(last + alpha * (ys[index] - last))
    }
}

/// Which extreme a [`Trailing`] rule keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Extreme {
    /// The smallest value.
    Min,
    /// The largest value.
    Max,
}

/// Minimum or maximum over the last `n` samples or the closed window
/// `[x − p, x]`. Partial windows at the start count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trailing {
    window: Window,
    extreme: Extreme,
}

impl Trailing {
    /// # Errors
    /// An empty or non-positive window.
    pub fn new(window: Window, extreme: Extreme) -> Result<Self> {
        Ok(Self {
            window: window.validated()?,
            extreme,
        })
    }
}

impl Accumulate for Trailing {
    fn accumulate(
        &self,
        index: usize,
        xs: &[Real],
        ys: &[Real],
        _outputs: &[Option<Real>],
    ) -> Option<Real> {
        let start = match self.window {
            Window::Count(n) => (index + 1).saturating_sub(n),
            Window::Period(p) => xs[..=index].partition_point(|&xi| xi < xs[index] - p),
        };
        let window = ys[start..=index].iter().copied();
        match self.extreme {
            Extreme::Min => window.reduce(Real::min),
            Extreme::Max => window.reduce(Real::max),
        }
    }

    fn reach(&self, interval: &Interval, xs: &[Real]) -> Interval {
        self.window.reach(interval, xs)
    }
}

/// A user fold `(x, y, previous output) -> output`.
#[derive(Clone)]
pub struct FnAccumulate(Rc<dyn Fn(Real, Real, Option<Real>) -> Option<Real>>);

impl FnAccumulate {
    /// Wrap `f`.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Real, Real, Option<Real>) -> Option<Real> + 'static,
    {
        Self(Rc::new(f))
    }
}

impl fmt::Debug for FnAccumulate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnAccumulate")
    }
}

impl Accumulate for FnAccumulate {
    fn accumulate(
        &self,
        index: usize,
        xs: &[Real],
        ys: &[Real],
        outputs: &[Option<Real>],
    ) -> Option<Real> {
        (self.0)(xs[index], ys[index], outputs.last().copied().flatten())
    }
}

// ── Accumulator ───────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Cache {
    xs: Vec<Real>,
    ys: Vec<Real>,
    outputs: Vec<Option<Real>>,
    /// Last abscissa visited on the input, holes included.
    cursor: Option<Real>,
    exhausted: bool,
}

impl Cache {
    fn truncate(&mut self, keep: usize) {
        self.xs.truncate(keep);
        self.ys.truncate(keep);
        // The first output may look one sample ahead.
        self.outputs.truncate(if keep < 2 { 0 } else { keep });
        self.cursor = self.xs.last().copied();
        self.exhausted = false;
    }
}

/// Outputs of an [`Accumulate`] rule at the input's sample abscissae,
/// interpolated in between. A NaN output is stored as a hole.
#[derive(Debug)]
pub struct Accumulator<A: Accumulate> {
    input: Handle,
    rule: A,
    interpolation: Interpolation,
    notifier: UpdateNotifier,
    domain: LazyDomain,
    cache: RefCell<Cache>,
    _subscriptions: Vec<Subscription>,
}

impl<A: Accumulate> Accumulator<A> {
    /// Accumulate `input` with `rule`, interpolating outputs linearly.
    pub fn new(input: Handle, rule: A) -> Rc<Self> {
        Self::with_interpolation(input, rule, Interpolation::Linear)
    }

    /// Accumulate `input` with `rule` and an explicit output
    /// interpolation.
    pub fn with_interpolation(input: Handle, rule: A, interpolation: Interpolation) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            _subscriptions: link::subscribe(this, std::slice::from_ref(&input)),
            input,
            rule,
            interpolation,
            notifier: UpdateNotifier::new(),
            domain: LazyDomain::new(),
            cache: RefCell::new(Cache::default()),
        })
    }

    /// The rule.
    pub fn rule(&self) -> &A {
        &self.rule
    }

    /// Number of outputs computed so far.
    pub fn cached_len(&self) -> usize {
        self.cache.borrow().outputs.len()
    }

    /// Pull the next defined input sample into the cache.
    fn fetch(&self, cache: &mut Cache) -> bool {
        if cache.exhausted {
            return false;
        }
        let domain = self.input.domain();
        if domain.is_empty() || !domain.start().is_finite() {
            cache.exhausted = true;
            return false;
        }
        let limit = domain.end().is_finite().then(|| domain.end());
        loop {
            let next = match cache.cursor {
                None if domain.contains(domain.start()) => Ok(Some(domain.start())),
                None => self.input.next_defined(domain.start(), 0.0, limit),
                Some(x) => self.input.next_defined(x, 0.0, limit),
            };
            let x = match next {
                Ok(Some(x)) => x,
                Ok(None) => {
                    cache.exhausted = true;
                    return false;
                }
                Err(err) => {
                    warn!(%err, "accumulator input cannot be walked");
                    cache.exhausted = true;
                    return false;
                }
            };
            cache.cursor = Some(x);
            if let Some(y) = self.input.value(x) {
                cache.xs.push(x);
                cache.ys.push(y);
                return true;
            }
        }
    }

    /// Compute outputs up to and including `index` where samples allow.
    fn compute(&self, cache: &mut Cache, index: usize) {
        while cache.outputs.len() <= index {
            let i = cache.outputs.len();
            while cache.xs.len() <= i + 1 && self.fetch(cache) {}
            if i >= cache.xs.len() {
                return;
            }
            let output = self
                .rule
                .accumulate(i, &cache.xs, &cache.ys, &cache.outputs)
                .filter(|y| !y.is_nan());
            cache.outputs.push(output);
        }
    }

    fn compute_domain(&self) -> Interval {
        let input = self.input.domain();
        if input.is_empty() || !input.start().is_finite() {
            return Interval::empty();
        }
        let mut cache = self.cache.borrow_mut();
        let mut i = 0;
        loop {
            self.compute(&mut cache, i);
            match cache.outputs.get(i) {
                None => return Interval::empty(),
                Some(Some(_)) => break,
                Some(None) => i += 1,
            }
        }
        let start = cache.xs[i];
        if start > input.end() {
            return Interval::empty();
        }
        Interval::new(start, input.end(), false, input.end_open())
    }
}

impl<A: Accumulate> Dependent for Accumulator<A> {
    fn affected(&self, _source: usize, interval: &Interval) -> Interval {
        self.rule.reach(interval, &self.cache.borrow().xs)
    }

    fn invalidate(&self, _source: usize, interval: &Interval) {
        self.domain.invalidate();
        let mut cache = self.cache.borrow_mut();
        cache.exhausted = false;
        if interval.is_empty() {
            return;
        }
        let keep = cache.xs.partition_point(|&x| x < interval.start());
        trace!(keep, cached = cache.xs.len(), "truncating accumulator cache");
        cache.truncate(keep);
    }
}

impl<A: Accumulate> Curve for Accumulator<A> {
    fn notifier(&self) -> &UpdateNotifier {
        &self.notifier
    }

    fn domain(&self) -> Interval {
        self.domain
            .get_or_compute(self.is_updating(), || self.compute_domain())
    }

    fn min_step(&self) -> Real {
        self.input.min_step()
    }

    fn value(&self, x: Real) -> Option<Real> {
        if !self.domain().contains(x) {
            return None;
        }
        let mut cache = self.cache.borrow_mut();
        while cache.xs.last().map_or(true, |&last| last < x) && self.fetch(&mut cache) {}
        let i = interpolation::locate_previous(&cache.xs, x)?;
        self.compute(&mut cache, i + 1);
        let left = (cache.xs[i], *cache.outputs.get(i)?);
        if left.0 == x {
            return left.1;
        }
        let right = (*cache.xs.get(i + 1)?, *cache.outputs.get(i + 1)?);
        self.interpolation.interpolate(x, left, right)
    }

    fn next_defined(&self, x: Real, min_step: Real, limit: Option<Real>) -> Result<Option<Real>> {
        let domain = self.domain();
        if domain.is_empty() {
            return Ok(None);
        }
        let step = self.resolve_min_step(min_step);
        if x + step <= domain.start() {
            let start = domain.start();
            return Ok(limit.map_or(true, |l| start <= l).then_some(start));
        }
        let next = self.input.next_defined(x, step, limit)?;
        Ok(next.filter(|&n| domain.contains(n)))
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
        let limit = Some(limit.map_or(domain.start(), |l| l.max(domain.start())));
        let previous = self
            .input
            .previous_defined(x, self.resolve_min_step(min_step), limit)?;
        Ok(previous.filter(|&p| domain.contains(p)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::points::Points;
    use approx::assert_abs_diff_eq;

    fn series(values: &[Real]) -> Handle {
        Points::from_values(values, 0.0, 1.0).unwrap().into()
    }

    #[test]
    fn moving_average_by_count() {
        let sma = MovingAverage::new(Window::Count(2)).unwrap();
        let f = Accumulator::new(series(&[1.0, 2.0, 3.0, 4.0]), sma);
        assert_eq!(f.domain(), Interval::closed(1.0, 3.0));
        assert_eq!(f.value(0.0), None);
        assert_abs_diff_eq!(f.value(1.0).unwrap(), 1.5);
        assert_abs_diff_eq!(f.value(1.5).unwrap(), 2.0);
        assert_abs_diff_eq!(f.value(3.0).unwrap(), 3.5);
    }

    #[test]
    fn moving_average_by_period() {
        let sma = MovingAverage::new(Window::Period(3.0)).unwrap();
        let f = Accumulator::new(series(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]), sma);
        assert_eq!(f.domain(), Interval::closed(2.0, 5.0));
        assert_abs_diff_eq!(f.value(2.0).unwrap(), 2.0);
        assert_abs_diff_eq!(f.value(2.5).unwrap(), 2.5);
        assert_abs_diff_eq!(f.value(5.0).unwrap(), 5.0);
    }

    #[test]
    fn exponential_average() {
        let ema = ExponentialAverage::new(Smoothing::Alpha(0.5)).unwrap();
        let f = Accumulator::new(series(&[1.0, 2.0, 1.0, 2.0]), ema);
        assert_abs_diff_eq!(f.value(0.0).unwrap(), 1.0);
        assert_abs_diff_eq!(f.value(1.0).unwrap(), 1.5);
        assert_abs_diff_eq!(f.value(2.0).unwrap(), 1.25);
        assert_abs_diff_eq!(f.value(3.0).unwrap(), 1.625);
        assert!(ExponentialAverage::new(Smoothing::Alpha(1.5)).is_err());
    }

    #[test]
    fn lookups_only_compute_what_they_need() {
        let sma = MovingAverage::new(Window::Count(3)).unwrap();
        let f = Accumulator::new(series(&[1.0; 100]), sma);
        assert_abs_diff_eq!(f.value(10.0).unwrap(), 1.0);
        assert!(f.cached_len() < 20);
    }

    #[test]
    fn count_reach_stops_after_the_window() {
        let xs = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let reach = Window::Count(3).reach(&Interval::closed(1.0, 1.0), &xs);
        assert_eq!(reach, Interval::closed(1.0, 3.0));
        let open = Window::Count(3).reach(&Interval::closed(4.0, 4.0), &xs);
        assert!(open.is_positive_infinite());
    }

    #[test]
    fn single_sample_reach_never_shrinks() {
        let xs = [0.0, 1.0, 2.0];
        let inside = Window::Count(1).reach(&Interval::closed(1.0, 1.0), &xs);
        assert_eq!(inside, Interval::closed(1.0, 1.0));
        let past = Window::Count(1).reach(&Interval::open_closed(2.0, 3.0), &xs);
        assert!(!past.is_empty());
        assert!(past.contains(3.0));
        assert!(past.is_positive_infinite());
    }
}
