//! Extrapolation beyond the edges of an input's domain.
//!
//! Inside the input's domain an [`Extension`] returns the input's values.
//! Past a selected edge it evaluates a model fitted to the samples nearest
//! that edge:
//!
//! * [`ExtensionKind::Constant`]: the edge value;
//! * [`ExtensionKind::Tangent`]: a least-squares line;
//! * [`ExtensionKind::Harmonic`]: a truncated Fourier series of known
//!   period.
//!
//! An edge is only extended when its model can be fitted, e.g. a tangent
//! needs two samples. Models are refitted lazily after input updates.

use crate::handle::Handle;
use crate::link::{self, Dependent};
use curve_core::curve::{step_backward, step_forward};
use curve_core::errors::Result;
use curve_core::{Curve, Interval, Real, Subscription, UpdateNotifier};
use curve_math::{fit_harmonics, fit_line, HarmonicSeries};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, warn};

/// Which samples near an edge a model is fitted to.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Fit {
    /// The fewest samples the model needs: one for a constant, two for a
    /// tangent, every sample for a harmonic series.
    #[default]
    Edge,
    /// The `n` samples nearest the edge.
    Count(usize),
    /// The samples within distance `p` of the edge sample.
    Period(Real),
}

/// The model used past an edge.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExtensionKind {
    /// Hold the edge value.
    Constant,
    /// Continue along a least-squares line.
    Tangent(Fit),
    /// Continue a Fourier series with `harmonics` terms and a known period.
    Harmonic {
        /// Period of the fundamental.
        period: Real,
        /// Number of harmonics.
        harmonics: usize,
        /// Samples the series is fitted to.
        fit: Fit,
    },
}

impl ExtensionKind {
    /// A single-harmonic series: a sinusoid with an offset.
    pub fn sine(period: Real, fit: Fit) -> Self {
        ExtensionKind::Harmonic {
            period,
            harmonics: 1,
            fit,
        }
    }

    fn fit(self) -> Fit {
        match self {
            ExtensionKind::Constant => Fit::Count(1),
            ExtensionKind::Tangent(Fit::Edge) => Fit::Count(2),
            ExtensionKind::Tangent(fit) => fit,
            ExtensionKind::Harmonic { fit, .. } => fit,
        }
    }

    fn validated(self) -> Result<Self> {
        match self {
            ExtensionKind::Constant => {}
            ExtensionKind::Tangent(fit) => validate_fit(fit)?,
            ExtensionKind::Harmonic {
                period,
                harmonics,
                fit,
            } => {
                curve_core::ensure_config!(
                    period > 0.0 && period.is_finite(),
                    "harmonic period must be positive, got {period}"
                );
                curve_core::ensure_config!(harmonics > 0, "at least one harmonic is required");
                validate_fit(fit)?;
            }
        }
        Ok(self)
    }
}

fn validate_fit(fit: Fit) -> Result<()> {
    match fit {
        Fit::Edge => {}
        Fit::Count(n) => curve_core::ensure_config!(n > 0, "a fit needs at least one sample"),
        Fit::Period(p) => curve_core::ensure_config!(
            p > 0.0 && p.is_finite(),
            "fit period must be positive, got {p}"
        ),
    }
    Ok(())
}

// ── Models ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Model {
    Constant(Real),
    Line { intercept: Real, slope: Real },
    Harmonic(HarmonicSeries),
}

impl Model {
    fn value(&self, x: Real) -> Real {
        match self {
            Model::Constant(y) => *y,
            Model::Line { intercept, slope } => intercept + slope * x,
            Model::Harmonic(series) => series.value(x),
        }
    }
}

/// A fitted model and the span of the samples it was fitted to.
#[derive(Debug, Clone)]
struct Side {
    model: Model,
    window: Interval,
}

#[derive(Debug, Clone, Default)]
struct Models {
    start: Option<Side>,
    end: Option<Side>,
}

// ── Extension ─────────────────────────────────────────────────────────────────

/// An input extended past one or both edges of its domain.
#[derive(Debug)]
pub struct Extension {
    input: Handle,
    kind: ExtensionKind,
    start: bool,
    end: bool,
    notifier: UpdateNotifier,
    models: RefCell<Option<Models>>,
    _subscriptions: Vec<Subscription>,
}

impl Extension {
    /// Extend `input` with `kind` past the selected edges.
    ///
    /// # Errors
    /// An invalid model configuration.
    pub fn new(input: Handle, kind: ExtensionKind, start: bool, end: bool) -> Result<Rc<Self>> {
        let kind = kind.validated()?;
        Ok(Rc::new_cyclic(|this| Self {
            _subscriptions: link::subscribe(this, std::slice::from_ref(&input)),
            input,
            kind,
            start,
            end,
            notifier: UpdateNotifier::new(),
            models: RefCell::new(None),
        }))
    }

    /// The extension model.
    pub fn kind(&self) -> ExtensionKind {
        self.kind
    }

    /// The extrapolated value past the start edge, ignoring the input.
    pub fn start_value(&self, x: Real) -> Option<Real> {
        self.models().start.map(|side| side.model.value(x))
    }

    /// The extrapolated value past the end edge, ignoring the input.
    pub fn end_value(&self, x: Real) -> Option<Real> {
        self.models().end.map(|side| side.model.value(x))
    }

    fn models(&self) -> Models {
        if let Some(models) = self.models.borrow().as_ref() {
            return models.clone();
        }
        let models = self.fit_models();
        if !self.is_updating() {
            *self.models.borrow_mut() = Some(models.clone());
        }
        models
    }

    fn fit_models(&self) -> Models {
        let domain = self.input.domain();
        if domain.is_empty() {
            return Models::default();
        }
        let side = |forward: bool| match self.fit_side(&domain, forward) {
            Ok(side) => side,
            Err(err) => {
                warn!(%err, forward, "extension model cannot be fitted");
                None
            }
        };
        Models {
            start: (self.start && domain.start().is_finite())
                .then(|| side(true))
                .flatten(),
            end: (self.end && domain.end().is_finite())
                .then(|| side(false))
                .flatten(),
        }
    }

    /// Fit the model at the start (`forward`) or end edge.
    fn fit_side(&self, domain: &Interval, forward: bool) -> Result<Option<Side>> {
        let samples = self.edge_samples(domain, forward, self.kind.fit())?;
        let Some(&(x0, y0)) = samples.first() else {
            return Ok(None);
        };
        let (xs, ys): (Vec<Real>, Vec<Real>) = samples.iter().copied().unzip();
        let model = match self.kind {
            ExtensionKind::Constant => Model::Constant(y0),
            ExtensionKind::Tangent(_) => {
                if samples.len() < 2 {
                    return Ok(None);
                }
                let (intercept, slope) = fit_line(&xs, &ys)?;
                Model::Line { intercept, slope }
            }
            ExtensionKind::Harmonic {
                period, harmonics, ..
            } => {
                if samples.len() < 2 * harmonics + 1 {
                    debug!(
                        samples = samples.len(),
                        harmonics,
                        "too few samples for a harmonic fit"
                    );
                    return Ok(None);
                }
                Model::Harmonic(fit_harmonics(&xs, &ys, period, harmonics)?)
            }
        };
        let last = samples.last().map_or(x0, |s| s.0);
        Ok(Some(Side {
            model,
            window: Interval::closed(x0.min(last), x0.max(last)),
        }))
    }

    /// Defined samples walking inwards from one edge of `domain`.
    fn edge_samples(
        &self,
        domain: &Interval,
        forward: bool,
        fit: Fit,
    ) -> Result<Vec<(Real, Real)>> {
        let (edge, far) = if forward {
            (domain.start(), domain.end())
        } else {
            (domain.end(), domain.start())
        };
        let limit = far.is_finite().then_some(far);
        let mut samples: Vec<(Real, Real)> = Vec::new();
        let mut cursor: Option<Real> = None;
        loop {
            match fit {
                Fit::Count(n) if samples.len() >= n => break,
                _ => {}
            }
            let next = match cursor {
                None if domain.contains(edge) => Some(edge),
                _ => {
                    let from = cursor.unwrap_or(edge);
                    if forward {
                        self.input.next_defined(from, 0.0, limit)?
                    } else {
                        self.input.previous_defined(from, 0.0, limit)?
                    }
                }
            };
            let Some(x) = next else { break };
            cursor = Some(x);
            if let (Fit::Period(p), Some(&(x0, _))) = (fit, samples.first()) {
                if (x - x0).abs() > p {
                    break;
                }
            }
            if let Some(y) = self.input.value(x) {
                samples.push((x, y));
            }
        }
        Ok(samples)
    }
}

impl Dependent for Extension {
    fn affected(&self, _source: usize, interval: &Interval) -> Interval {
        if interval.is_empty() {
            return Interval::empty();
        }
        let cached = self.models.borrow().clone();
        let mut affected = *interval;
        let start_moves = match cached.as_ref().and_then(|m| m.start.as_ref()) {
            Some(side) => interval.start() <= side.window.end(),
            None => self.start,
        };
        let end_moves = match cached.as_ref().and_then(|m| m.end.as_ref()) {
            Some(side) => interval.end() >= side.window.start(),
            None => self.end,
        };
        if start_moves {
            affected = affected.extended_to_negative_infinity();
        }
        if end_moves {
            affected = affected.extended_to_positive_infinity();
        }
        affected
    }

    fn invalidate(&self, _source: usize, _interval: &Interval) {
        self.models.borrow_mut().take();
    }
}

impl Curve for Extension {
    fn notifier(&self) -> &UpdateNotifier {
        &self.notifier
    }

    fn domain(&self) -> Interval {
        let domain = self.input.domain();
        if domain.is_empty() {
            return domain;
        }
        let models = self.models();
        let mut extended = domain;
        if models.start.is_some() {
            extended = extended.extended_to_negative_infinity();
        }
        if models.end.is_some() {
            extended = extended.extended_to_positive_infinity();
        }
        extended
    }

    fn min_step(&self) -> Real {
        self.input.min_step()
    }

    fn value(&self, x: Real) -> Option<Real> {
        let domain = self.input.domain();
        if domain.contains(x) {
            return self.input.value(x);
        }
        if domain.is_empty() || x.is_nan() {
            return None;
        }
        let models = self.models();
        let side = if x <= domain.start() {
            models.start
        } else if x >= domain.end() {
            models.end
        } else {
            None
        };
        side.map(|side| side.model.value(x)).filter(|y| y.is_finite())
    }

    fn next_defined(&self, x: Real, min_step: Real, limit: Option<Real>) -> Result<Option<Real>> {
        let own = self.domain();
        let input = self.input.domain();
        let step = self.resolve_min_step(min_step);
        if input.is_empty() || x + step < input.start() {
            return step_forward(&own, x, step, limit);
        }
        if x + step <= input.end() || !input.end().is_finite() {
            let inner = if input.end().is_finite() {
                Some(limit.map_or(input.end(), |l| l.min(input.end())))
            } else {
                limit
            };
            if let Some(next) = self.input.next_defined(x, step, inner)? {
                return Ok(Some(next));
            }
        }
        if !own.is_positive_infinite() {
            return Ok(None);
        }
        let mut next = (x + step).max(input.end());
        if self.value(next).is_none() {
            next += step;
        }
        Ok(limit.map_or(true, |l| next <= l).then_some(next))
    }

    fn previous_defined(
        &self,
        x: Real,
        min_step: Real,
        limit: Option<Real>,
    ) -> Result<Option<Real>> {
        let own = self.domain();
        let input = self.input.domain();
        let step = self.resolve_min_step(min_step);
        if input.is_empty() || x - step > input.end() {
            return step_backward(&own, x, step, limit);
        }
        if x - step >= input.start() || !input.start().is_finite() {
            let inner = if input.start().is_finite() {
                Some(limit.map_or(input.start(), |l| l.max(input.start())))
            } else {
                limit
            };
            if let Some(previous) = self.input.previous_defined(x, step, inner)? {
                return Ok(Some(previous));
            }
        }
        if !own.is_negative_infinite() {
            return Ok(None);
        }
        let mut previous = (x - step).min(input.start());
        if self.value(previous).is_none() {
            previous -= step;
        }
        Ok(limit.map_or(true, |l| previous >= l).then_some(previous))
    }
}
