//! `Interval` — a range of reals with independently open or closed edges.
//!
//! Every curve reports where it is defined as an [`Interval`]. Infinite
//! bounds are always open. All empty intervals compare equal and are stored
//! in a single canonical form (`start = +∞`, `end = -∞`) so that ordering
//! comparisons against an empty interval's bounds fail naturally.

use crate::Real;
use std::fmt;

/// An interval of the real line.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Interval {
    start: Real,
    end: Real,
    start_open: bool,
    end_open: bool,
}

impl Interval {
    // ── Constructors ─────────────────────────────────────────────────────────

    /// Create an interval, normalising degenerate input to the empty interval.
    pub fn new(start: Real, end: Real, start_open: bool, end_open: bool) -> Self {
        if start.is_nan() || end.is_nan() {
            return Self::empty();
        }
        let candidate = Self {
            start,
            end,
            start_open: start_open || start.is_infinite(),
            end_open: end_open || end.is_infinite(),
        };
        if candidate.start > candidate.end
            || (candidate.start == candidate.end && (candidate.start_open || candidate.end_open))
        {
            Self::empty()
        } else {
            candidate
        }
    }

    /// `[start, end]`
    pub fn closed(start: Real, end: Real) -> Self {
        Self::new(start, end, false, false)
    }

    /// `(start, end)`
    pub fn open(start: Real, end: Real) -> Self {
        Self::new(start, end, true, true)
    }

    /// `[start, end)`
    pub fn closed_open(start: Real, end: Real) -> Self {
        Self::new(start, end, false, true)
    }

    /// `(start, end]`
    pub fn open_closed(start: Real, end: Real) -> Self {
        Self::new(start, end, true, false)
    }

    /// `[x, x]`
    pub fn point(x: Real) -> Self {
        Self::closed(x, x)
    }

    /// The empty interval.
    pub const fn empty() -> Self {
        Self {
            start: Real::INFINITY,
            end: Real::NEG_INFINITY,
            start_open: true,
            end_open: true,
        }
    }

    /// `(-∞, +∞)`
    pub fn infinite() -> Self {
        Self::open(Real::NEG_INFINITY, Real::INFINITY)
    }

    /// `[start, +∞)`
    pub fn positive_infinite(start: Real) -> Self {
        Self::closed(start, Real::INFINITY)
    }

    /// `(-∞, end]`
    pub fn negative_infinite(end: Real) -> Self {
        Self::closed(Real::NEG_INFINITY, end)
    }

    // ── Inspectors ───────────────────────────────────────────────────────────

    /// Lower bound (`+∞` when empty).
    #[inline]
    pub fn start(&self) -> Real {
        self.start
    }

    /// Upper bound (`-∞` when empty).
    #[inline]
    pub fn end(&self) -> Real {
        self.end
    }

    /// `true` if the lower bound is excluded.
    #[inline]
    pub fn start_open(&self) -> bool {
        self.start_open
    }

    /// `true` if the upper bound is excluded.
    #[inline]
    pub fn end_open(&self) -> bool {
        self.end_open
    }

    /// `true` if the interval contains no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    /// `true` if the interval holds exactly one point.
    pub fn is_point(&self) -> bool {
        !self.is_empty() && self.start == self.end
    }

    /// `true` if both bounds are finite. The empty interval is finite.
    pub fn is_finite(&self) -> bool {
        self.is_empty() || (self.start.is_finite() && self.end.is_finite())
    }

    /// `true` if either bound is infinite.
    pub fn is_infinite(&self) -> bool {
        self.is_negative_infinite() || self.is_positive_infinite()
    }

    /// `true` if the interval extends to `-∞`.
    pub fn is_negative_infinite(&self) -> bool {
        !self.is_empty() && self.start == Real::NEG_INFINITY
    }

    /// `true` if the interval extends to `+∞`.
    pub fn is_positive_infinite(&self) -> bool {
        !self.is_empty() && self.end == Real::INFINITY
    }

    /// `end - start`, or zero when empty.
    pub fn length(&self) -> Real {
        if self.is_empty() {
            0.0
        } else {
            self.end - self.start
        }
    }

    // ── Membership ───────────────────────────────────────────────────────────

    /// `true` if `x` lies inside the interval.
    #[inline]
    pub fn contains(&self, x: Real) -> bool {
        self.contains_with(x, true, true)
    }

    /// Membership test where an open edge may be treated as closed.
    ///
    /// When `enforce_start` (`enforce_end`) is false the lower (upper)
    /// bound is tested inclusively regardless of its openness.
    pub fn contains_with(&self, x: Real, enforce_start: bool, enforce_end: bool) -> bool {
        if self.is_empty() || x.is_nan() {
            return false;
        }
        let after_start = if self.start_open && enforce_start {
            x > self.start
        } else {
            x >= self.start
        };
        let before_end = if self.end_open && enforce_end {
            x < self.end
        } else {
            x <= self.end
        };
        after_start && before_end
    }

    /// `true` if the two intervals share at least one point.
    pub fn intersects(&self, other: &Interval) -> bool {
        !self.intersection(other).is_empty()
    }

    /// `true` if every point of `self` is in `other`.
    pub fn is_subset_of(&self, other: &Interval) -> bool {
        self.is_empty() || self.intersection(other) == *self
    }

    /// `true` if every point of `other` is in `self`.
    pub fn is_superset_of(&self, other: &Interval) -> bool {
        other.is_subset_of(self)
    }

    // ── Set operations ───────────────────────────────────────────────────────

    /// The points common to both intervals.
    pub fn intersection(&self, other: &Interval) -> Interval {
        if self.is_empty() || other.is_empty() {
            return Self::empty();
        }
        let (start, start_open) = if self.start > other.start {
            (self.start, self.start_open)
        } else if other.start > self.start {
            (other.start, other.start_open)
        } else {
            (self.start, self.start_open || other.start_open)
        };
        let (end, end_open) = if self.end < other.end {
            (self.end, self.end_open)
        } else if other.end < self.end {
            (other.end, other.end_open)
        } else {
            (self.end, self.end_open || other.end_open)
        };
        Self::new(start, end, start_open, end_open)
    }

    /// Intersection of every interval in `intervals` (empty for no input).
    pub fn intersection_of<I>(intervals: I) -> Interval
    where
        I: IntoIterator<Item = Interval>,
    {
        let mut iter = intervals.into_iter();
        match iter.next() {
            Some(first) => iter.fold(first, |acc, i| acc.intersection(&i)),
            None => Self::empty(),
        }
    }

    /// The smallest interval covering both; empty operands are ignored.
    pub fn hull(&self, other: &Interval) -> Interval {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let (start, start_open) = if self.start < other.start {
            (self.start, self.start_open)
        } else if other.start < self.start {
            (other.start, other.start_open)
        } else {
            (self.start, self.start_open && other.start_open)
        };
        let (end, end_open) = if self.end > other.end {
            (self.end, self.end_open)
        } else if other.end > self.end {
            (other.end, other.end_open)
        } else {
            (self.end, self.end_open && other.end_open)
        };
        Self::new(start, end, start_open, end_open)
    }

    /// Union of two intervals, taken as their covering hull.
    pub fn union(&self, other: &Interval) -> Interval {
        self.hull(other)
    }

    /// Covering hull of every interval in `intervals`.
    pub fn union_of<I>(intervals: I) -> Interval
    where
        I: IntoIterator<Item = Interval>,
    {
        intervals
            .into_iter()
            .fold(Self::empty(), |acc, i| acc.hull(&i))
    }

    /// Everything below this interval's start.
    pub fn rest_to_negative_infinity(&self) -> Interval {
        if self.is_empty() {
            return Self::empty();
        }
        Self::new(Real::NEG_INFINITY, self.start, true, !self.start_open)
    }

    /// Everything above this interval's end.
    pub fn rest_to_positive_infinity(&self) -> Interval {
        if self.is_empty() {
            return Self::empty();
        }
        Self::new(self.end, Real::INFINITY, !self.end_open, true)
    }

    /// The same bounds with both edges open.
    pub fn as_open(&self) -> Interval {
        if self.is_empty() {
            return Self::empty();
        }
        Self::open(self.start, self.end)
    }

    /// The same bounds with both edges closed (infinite edges stay open).
    pub fn as_closed(&self) -> Interval {
        if self.is_empty() {
            return Self::empty();
        }
        Self::closed(self.start, self.end)
    }

    /// The same interval with its start moved to `-∞`.
    pub fn extended_to_negative_infinity(&self) -> Interval {
        if self.is_empty() {
            return Self::empty();
        }
        Self::new(Real::NEG_INFINITY, self.end, true, self.end_open)
    }

    /// The same interval with its end moved to `+∞`.
    pub fn extended_to_positive_infinity(&self) -> Interval {
        if self.is_empty() {
            return Self::empty();
        }
        Self::new(self.start, Real::INFINITY, self.start_open, true)
    }

    /// Translate both bounds by `delta`.
    pub fn shifted(&self, delta: Real) -> Interval {
        if self.is_empty() {
            return Self::empty();
        }
        Self::new(
            self.start + delta,
            self.end + delta,
            self.start_open,
            self.end_open,
        )
    }

    /// Split into adjacent pieces at `breakpoints`.
    ///
    /// Pieces are `[a, b0), [b0, b1), …, [bn, end]`; the outer edges keep
    /// this interval's openness. Breakpoints outside the interior are
    /// ignored.
    pub fn partition(&self, breakpoints: &[Real]) -> Vec<Interval> {
        if self.is_empty() {
            return Vec::new();
        }
        let mut cuts: Vec<Real> = breakpoints
            .iter()
            .copied()
            .filter(|&b| b > self.start && b < self.end)
            .collect();
        cuts.sort_by(|a, b| a.total_cmp(b));
        cuts.dedup();

        let mut pieces = Vec::with_capacity(cuts.len() + 1);
        let mut start = self.start;
        let mut start_open = self.start_open;
        for cut in cuts {
            pieces.push(Self::new(start, cut, start_open, true));
            start = cut;
            start_open = false;
        }
        pieces.push(Self::new(start, self.end, start_open, self.end_open));
        pieces
    }
}

impl Default for Interval {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for Interval {
    fn eq(&self, other: &Self) -> bool {
        if self.is_empty() || other.is_empty() {
            return self.is_empty() && other.is_empty();
        }
        self.start == other.start
            && self.end == other.end
            && self.start_open == other.start_open
            && self.end_open == other.end_open
    }
}

impl From<(Real, Real)> for Interval {
    fn from((start, end): (Real, Real)) -> Self {
        Self::closed(start, end)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "∅");
        }
        let open = if self.start_open { '(' } else { '[' };
        let close = if self.end_open { ')' } else { ']' };
        write!(f, "{open}{}, {}{close}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_input_is_empty() {
        assert!(Interval::closed(1.0, 0.0).is_empty());
        assert!(Interval::open(1.0, 1.0).is_empty());
        assert!(Interval::closed_open(1.0, 1.0).is_empty());
        assert!(Interval::closed(Real::NAN, 1.0).is_empty());
        assert!(Interval::point(1.0).is_point());
        assert_eq!(Interval::open(3.0, 1.0), Interval::empty());
    }

    #[test]
    fn infinite_bounds_are_open() {
        let i = Interval::closed(Real::NEG_INFINITY, 0.0);
        assert!(i.start_open());
        assert!(!i.end_open());
        assert!(i.is_negative_infinite());
        assert!(!i.is_positive_infinite());
        assert!(Interval::infinite().is_infinite());
        assert!(!Interval::infinite().is_finite());
    }

    #[test]
    fn containment_respects_edges() {
        let i = Interval::closed_open(0.0, 1.0);
        assert!(i.contains(0.0));
        assert!(!i.contains(1.0));
        assert!(i.contains_with(1.0, true, false));
        assert!(!Interval::open(0.0, 1.0).contains(0.0));
        assert!(Interval::open(0.0, 1.0).contains_with(0.0, false, true));
        assert!(!Interval::empty().contains(0.0));
    }

    #[test]
    fn intersection_takes_tighter_edges() {
        let a = Interval::closed(0.0, 2.0);
        let b = Interval::open(0.0, 3.0);
        assert_eq!(a.intersection(&b), Interval::open_closed(0.0, 2.0));
        assert!(Interval::closed_open(0.0, 1.0)
            .intersection(&Interval::closed(1.0, 2.0))
            .is_empty());
        assert!(Interval::closed(0.0, 1.0).intersects(&Interval::closed(1.0, 2.0)));
        assert_eq!(
            Interval::intersection_of([a, b, Interval::closed(1.0, 5.0)]),
            Interval::closed(1.0, 2.0)
        );
    }

    #[test]
    fn hull_takes_looser_edges() {
        let a = Interval::open(0.0, 1.0);
        let b = Interval::closed(0.0, 0.5);
        assert_eq!(a.hull(&b), Interval::closed_open(0.0, 1.0));
        assert_eq!(a.hull(&Interval::empty()), a);
        assert_eq!(
            Interval::union_of([Interval::point(3.0), Interval::point(-1.0)]),
            Interval::closed(-1.0, 3.0)
        );
        assert!(Interval::union_of(Vec::new()).is_empty());
    }

    #[test]
    fn subsets() {
        let outer = Interval::closed(0.0, 10.0);
        assert!(Interval::open(0.0, 10.0).is_subset_of(&outer));
        assert!(outer.is_superset_of(&Interval::point(10.0)));
        assert!(!Interval::closed(-1.0, 1.0).is_subset_of(&outer));
        assert!(Interval::empty().is_subset_of(&outer));
    }

    #[test]
    fn rests_flip_edge_openness() {
        let i = Interval::closed_open(1.0, 2.0);
        assert_eq!(
            i.rest_to_negative_infinity(),
            Interval::new(Real::NEG_INFINITY, 1.0, true, true)
        );
        assert_eq!(
            i.rest_to_positive_infinity(),
            Interval::new(2.0, Real::INFINITY, false, true)
        );
        assert!(Interval::infinite().rest_to_positive_infinity().is_empty());
    }

    #[test]
    fn partition_into_adjacent_pieces() {
        let pieces = Interval::closed(0.0, 3.0).partition(&[2.0]);
        assert_eq!(
            pieces,
            vec![Interval::closed_open(0.0, 2.0), Interval::closed(2.0, 3.0)]
        );
        let pieces = Interval::open(0.0, 3.0).partition(&[2.0, 1.0, 5.0]);
        assert_eq!(pieces.len(), 3);
        assert_eq!(pieces[0], Interval::open(0.0, 1.0));
        assert_eq!(pieces[2], Interval::closed_open(2.0, 3.0));
    }

    #[test]
    fn display() {
        assert_eq!(Interval::closed_open(0.0, 1.5).to_string(), "[0, 1.5)");
        assert_eq!(Interval::positive_infinite(1.0).to_string(), "[1, inf)");
        assert_eq!(Interval::empty().to_string(), "∅");
    }
}
