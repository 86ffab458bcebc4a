//! OHLCV quotes on a time grid.
//!
//! [`Quotes`] stores one [`Quote`] per span of a [`Duration`] grid, without
//! gaps. As a curve it holds each quote's close from the start of its span
//! until the next quote. The individual fields are exposed as their own
//! curves ([`QuoteField`]), and a few standard indicators are built from
//! them.

use crate::accumulator::{Accumulator, Extreme, Trailing, Window};
use crate::handle::Handle;
use crate::link::{self, Dependent};
use curve_core::errors::{Error, Result};
use curve_core::{Curve, Interval, Real, Subscription, UpdateNotifier};
use curve_math::comparison::{close, EPSILON};
use curve_math::interpolation::{locate_previous, Interpolation, UniformGrid};
use curve_time::Duration;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::debug;

// ── Quote ─────────────────────────────────────────────────────────────────────

/// One bar: prices over the span starting at `start`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Quote {
    /// Start of the span, in seconds since the epoch.
    pub start: Real,
    /// First traded price.
    pub open: Real,
    /// Highest traded price.
    pub high: Real,
    /// Lowest traded price.
    pub low: Real,
    /// Last traded price.
    pub close: Real,
    /// Traded volume.
    pub volume: Real,
}

impl Quote {
    /// A quote.
    pub fn new(start: Real, open: Real, high: Real, low: Real, close: Real, volume: Real) -> Self {
        Self {
            start,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Midpoint of the high and the low.
    pub fn hl2(&self) -> Real {
        0.5 * (self.high + self.low)
    }

    /// The value of `field`.
    pub fn get(&self, field: Field) -> Real {
        match field {
            Field::Open => self.open,
            Field::High => self.high,
            Field::Low => self.low,
            Field::Close => self.close,
            Field::Hl2 => self.hl2(),
            Field::Volume => self.volume,
        }
    }
}

/// A scalar view of a [`Quote`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Field {
    /// [`Quote::open`]
    Open,
    /// [`Quote::high`]
    High,
    /// [`Quote::low`]
    Low,
    /// [`Quote::close`]
    Close,
    /// [`Quote::hl2`]
    Hl2,
    /// [`Quote::volume`]
    Volume,
}

// ── Quotes ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Store {
    xs: Vec<Real>,
    quotes: Vec<Quote>,
}

impl Store {
    fn domain(&self) -> Interval {
        match (self.xs.first(), self.xs.last()) {
            (Some(&first), Some(&last)) => Interval::closed(first, last),
            _ => Interval::empty(),
        }
    }
}

/// Contiguous quotes of one [`Duration`].
#[derive(Debug)]
pub struct Quotes {
    duration: Duration,
    store: RefCell<Store>,
    notifier: UpdateNotifier,
    mutating: Cell<bool>,
}

impl Quotes {
    /// Quotes of `duration`, starting with `quotes`.
    ///
    /// # Errors
    /// [`Error::InvalidConfiguration`] if consecutive quotes leave a gap in
    /// the grid, [`Error::OutOfOrder`] if they are not ascending.
    pub fn new(duration: Duration, quotes: Vec<Quote>) -> Result<Rc<Self>> {
        let this = Rc::new(Self {
            duration,
            store: RefCell::new(Store::default()),
            notifier: UpdateNotifier::new(),
            mutating: Cell::new(false),
        });
        this.check(&quotes, None)?;
        *this.store.borrow_mut() = Store {
            xs: quotes.iter().map(|q| q.start).collect(),
            quotes,
        };
        Ok(this)
    }

    /// The grid duration.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Number of quotes.
    pub fn len(&self) -> usize {
        self.store.borrow().quotes.len()
    }

    /// `true` without quotes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The quote whose span holds `x`.
    pub fn quote(&self, x: Real) -> Option<Quote> {
        let store = self.store.borrow();
        if !store.domain().contains(x) {
            return None;
        }
        let index = if self.duration.is_uniform() {
            let grid = UniformGrid {
                origin: store.xs[0],
                step: self.duration.min_seconds(),
            };
            grid.locate_previous(&store.xs, x)
        } else {
            locate_previous(&store.xs, x)
        };
        index.map(|i| store.quotes[i])
    }

    /// The first quote.
    pub fn first_quote(&self) -> Option<Quote> {
        self.store.borrow().quotes.first().copied()
    }

    /// The last quote.
    pub fn last_quote(&self) -> Option<Quote> {
        self.store.borrow().quotes.last().copied()
    }

    /// Quotes whose span intersects `domain`.
    pub fn quotes_in(&self, domain: &Interval) -> Vec<Quote> {
        self.store
            .borrow()
            .quotes
            .iter()
            .filter(|q| {
                let span = Interval::closed_open(q.start, self.duration.next(q.start));
                span.intersects(domain)
            })
            .copied()
            .collect()
    }

    /// `[lowest low, highest high]` over the quotes intersecting `domain`.
    pub fn price_range(&self, domain: &Interval) -> Interval {
        let quotes = self.quotes_in(domain);
        let low = quotes.iter().map(|q| q.low).reduce(Real::min);
        let high = quotes.iter().map(|q| q.high).reduce(Real::max);
        match (low, high) {
            (Some(low), Some(high)) => Interval::closed(low, high),
            _ => Interval::empty(),
        }
    }

    /// Ensure `quotes` continue the grid after `after` without gaps.
    fn check(&self, quotes: &[Quote], after: Option<Real>) -> Result<()> {
        let mut previous = after;
        for q in quotes {
            curve_core::ensure!(q.start.is_finite(), "quote start must be finite, got {}", q.start);
            if let Some(p) = previous {
                if q.start <= p {
                    return Err(Error::OutOfOrder(format!(
                        "quote at {} does not follow {p}",
                        q.start
                    )));
                }
                let expected = self.duration.next(p);
                curve_core::ensure_config!(
                    close(q.start, expected, EPSILON * expected.abs().max(1.0)),
                    "gap in {} quotes: expected {expected}, got {}",
                    self.duration,
                    q.start
                );
            }
            previous = Some(q.start);
        }
        Ok(())
    }

    fn acquire(&self) -> Result<MutationGuard<'_>> {
        if self.mutating.replace(true) {
            return Err(Error::ReentrantMutation(
                "quotes mutated from inside one of their own update callbacks".into(),
            ));
        }
        Ok(MutationGuard(&self.mutating))
    }

    // ── Mutations ─────────────────────────────────────────────────────────

    /// Append the quote following the last one.
    ///
    /// # Errors
    /// As [`Quotes::append_list`].
    pub fn append(&self, quote: Quote) -> Result<()> {
        self.append_list(vec![quote])
    }

    /// Append quotes continuing the grid, in one update pass.
    ///
    /// # Errors
    /// A gap or out-of-order quote (nothing is stored), or a mutation from
    /// inside an update callback.
    pub fn append_list(&self, quotes: Vec<Quote>) -> Result<()> {
        let _guard = self.acquire()?;
        let (Some(first), Some(last)) = (quotes.first(), quotes.last()) else {
            return Ok(());
        };
        let interval = {
            let store = self.store.borrow();
            let previous = store.xs.last().copied();
            self.check(&quotes, previous)?;
            previous.map_or(Interval::closed(first.start, last.start), |p| {
                Interval::open_closed(p, last.start)
            })
        };
        debug!(count = quotes.len(), %interval, "append quotes");
        self.notifier.begin_update(&interval)?;
        {
            let mut store = self.store.borrow_mut();
            store.xs.extend(quotes.iter().map(|q| q.start));
            store.quotes.extend(quotes);
        }
        self.notifier.end_update(&interval)
    }

    /// Replace every quote.
    ///
    /// # Errors
    /// A gap or out-of-order quote (nothing is replaced), or a mutation
    /// from inside an update callback.
    pub fn set(&self, quotes: Vec<Quote>) -> Result<()> {
        let _guard = self.acquire()?;
        self.check(&quotes, None)?;
        let new_domain = match (quotes.first(), quotes.last()) {
            (Some(first), Some(last)) => Interval::closed(first.start, last.start),
            _ => Interval::empty(),
        };
        let interval = self.store.borrow().domain().hull(&new_domain);
        debug!(count = quotes.len(), %interval, "set quotes");
        self.notifier.begin_update(&interval)?;
        *self.store.borrow_mut() = Store {
            xs: quotes.iter().map(|q| q.start).collect(),
            quotes,
        };
        self.notifier.end_update(&interval)
    }

    // ── Derived curves ────────────────────────────────────────────────────

    /// One field of every quote as a curve.
    pub fn field(self: &Rc<Self>, field: Field) -> Handle {
        QuoteField::new(Rc::clone(self), field).into()
    }

    /// Awesome oscillator: 5-quote SMA minus 34-quote SMA of the midpoint.
    ///
    /// # Errors
    /// Never for valid windows; propagated from the moving averages.
    pub fn awesome_oscillator(self: &Rc<Self>) -> Result<Handle> {
        let hl2 = self.field(Field::Hl2);
        Ok(hl2.sma(Window::Count(5))? - hl2.sma(Window::Count(34))?)
    }

    /// The alligator's jaw, teeth and lips: SMAs of the midpoint over 13, 8
    /// and 5 quotes, shifted forward by 8, 5 and 3 grid steps.
    ///
    /// # Errors
    /// Propagated from the moving averages and offsets.
    pub fn alligator(self: &Rc<Self>) -> Result<(Handle, Handle, Handle)> {
        let hl2 = self.field(Field::Hl2);
        let line = |window: usize, shift: i32| {
            hl2.sma(Window::Count(window))?
                .offset_steps(shift, self.duration)
        };
        Ok((line(13, 8)?, line(8, 5)?, line(5, 3)?))
    }

    /// Highest high over a trailing window.
    ///
    /// # Errors
    /// An empty window.
    pub fn trailing_high(self: &Rc<Self>, window: Window) -> Result<Handle> {
        self.trailing(Field::High, window, Extreme::Max)
    }

    /// Lowest low over a trailing window.
    ///
    /// # Errors
    /// An empty window.
    pub fn trailing_low(self: &Rc<Self>, window: Window) -> Result<Handle> {
        self.trailing(Field::Low, window, Extreme::Min)
    }

    fn trailing(self: &Rc<Self>, field: Field, window: Window, extreme: Extreme) -> Result<Handle> {
        let rule = Trailing::new(window, extreme)?;
        Ok(Accumulator::with_interpolation(self.field(field), rule, Interpolation::Previous).into())
    }
}

struct MutationGuard<'a>(&'a Cell<bool>);

impl Drop for MutationGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl Curve for Quotes {
    fn notifier(&self) -> &UpdateNotifier {
        &self.notifier
    }

    fn domain(&self) -> Interval {
        self.store.borrow().domain()
    }

    fn min_step(&self) -> Real {
        self.duration.min_seconds() * 0.01
    }

    fn value(&self, x: Real) -> Option<Real> {
        self.quote(x).map(|q| q.close)
    }

    fn next_defined(&self, x: Real, min_step: Real, limit: Option<Real>) -> Result<Option<Real>> {
        let target = x + self.resolve_min_step(min_step);
        let store = self.store.borrow();
        let i = store.xs.partition_point(|&xi| xi < target);
        let next = store.xs.get(i).copied();
        Ok(next.filter(|&n| limit.map_or(true, |l| n <= l)))
    }

    fn previous_defined(
        &self,
        x: Real,
        min_step: Real,
        limit: Option<Real>,
    ) -> Result<Option<Real>> {
        let target = x - self.resolve_min_step(min_step);
        let store = self.store.borrow();
        let previous = locate_previous(&store.xs, target).map(|i| store.xs[i]);
        Ok(previous.filter(|&p| limit.map_or(true, |l| p >= l)))
    }
}

// ── QuoteField ────────────────────────────────────────────────────────────────

/// One field of a [`Quotes`] series, held from each quote's start.
#[derive(Debug)]
pub struct QuoteField {
    quotes: Rc<Quotes>,
    field: Field,
    notifier: UpdateNotifier,
    _subscriptions: Vec<Subscription>,
}

impl QuoteField {
    /// `field` of `quotes`.
    pub fn new(quotes: Rc<Quotes>, field: Field) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            _subscriptions: link::subscribe(this, &[Handle::new(Rc::clone(&quotes))]),
            quotes,
            field,
            notifier: UpdateNotifier::new(),
        })
    }

    /// Which field this curve shows.
    pub fn field(&self) -> Field {
        self.field
    }
}

impl Dependent for QuoteField {
    fn affected(&self, _source: usize, interval: &Interval) -> Interval {
        *interval
    }

    fn invalidate(&self, _source: usize, _interval: &Interval) {}
}

impl Curve for QuoteField {
    fn notifier(&self) -> &UpdateNotifier {
        &self.notifier
    }

    fn domain(&self) -> Interval {
        self.quotes.domain()
    }

    fn min_step(&self) -> Real {
        self.quotes.min_step()
    }

    fn value(&self, x: Real) -> Option<Real> {
        self.quotes.quote(x).map(|q| q.get(self.field))
    }

    fn next_defined(&self, x: Real, min_step: Real, limit: Option<Real>) -> Result<Option<Real>> {
        self.quotes
            .next_defined(x, self.resolve_min_step(min_step), limit)
    }

    fn previous_defined(
        &self,
        x: Real,
        min_step: Real,
        limit: Option<Real>,
    ) -> Result<Option<Real>> {
        self.quotes
            .previous_defined(x, self.resolve_min_step(min_step), limit)
    }
}
