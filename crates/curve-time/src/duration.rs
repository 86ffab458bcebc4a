//! `Duration` — a length of time that defines a grid of boundaries.
//!
//! Grid rules:
//!
//! * seconds, minutes and hours restart at every UTC midnight, so a
//!   `20h` grid visits `00:00, 20:00, 00:00, 20:00, …` and has spans of
//!   20 and 4 hours;
//! * days align to the Unix epoch;
//! * weeks align to Monday 1970-01-05;
//! * months and years align to calendar month starts whose month index
//!   (`year·12 + month0`) is a multiple of the duration.
//!
//! Timestamps outside the calendar range representable by `chrono`
//! saturate to `±∞`; infinite timestamps pass through unchanged.

use crate::time_unit::TimeUnit;
use crate::{DAY, WEEK};
use chrono::{DateTime, Datelike, NaiveDate};
use curve_core::errors::{Error, Result};
use curve_core::{Interval, Real};
use std::fmt;
use std::str::FromStr;

/// Monday 1970-01-05 00:00 UTC.
const WEEK_ORIGIN: Real = 4.0 * DAY;

/// A grid-defining length of time, e.g. `20h` or `1M`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Duration {
    /// Number of units (at least one).
    pub length: u32,
    /// The unit of time.
    pub unit: TimeUnit,
}

impl Duration {
    /// Create a duration.
    ///
    /// # Errors
    /// Returns an error if `length` is zero.
    pub fn new(length: u32, unit: TimeUnit) -> Result<Self> {
        curve_core::ensure_config!(length > 0, "duration length must be positive");
        Ok(Self { length, unit })
    }

    /// Parse an expression such as `"20h"`, `"5min"` or `"1M"`.
    ///
    /// # Errors
    /// [`Error::InvalidConfiguration`] for malformed input.
    pub fn parse(expression: &str) -> Result<Self> {
        let expression = expression.trim();
        let split = expression
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(expression.len());
        let (digits, symbol) = expression.split_at(split);
        let length = if digits.is_empty() {
            1
        } else {
            digits.parse::<u32>().map_err(|e| {
                Error::InvalidConfiguration(format!("bad duration length in {expression:?}: {e}"))
            })?
        };
        let unit = TimeUnit::from_symbol(symbol.trim()).ok_or_else(|| {
            Error::InvalidConfiguration(format!("unknown duration unit in {expression:?}"))
        })?;
        Self::new(length, unit)
    }

    /// `true` if every span of the grid has the same length.
    pub fn is_uniform(&self) -> bool {
        match self.unit {
            TimeUnit::Seconds | TimeUnit::Minutes | TimeUnit::Hours => {
                DAY % self.fixed_length() == 0.0
            }
            TimeUnit::Days | TimeUnit::Weeks => true,
            TimeUnit::Months | TimeUnit::Years => false,
        }
    }

    /// Length of the shortest span of the grid, in seconds.
    pub fn min_seconds(&self) -> Real {
        let length = Real::from(self.length);
        match self.unit {
            TimeUnit::Seconds | TimeUnit::Minutes | TimeUnit::Hours => {
                let span = self.fixed_length();
                let remainder = DAY % span;
                if remainder > 0.0 {
                    span.min(remainder)
                } else {
                    span
                }
            }
            TimeUnit::Days => length * DAY,
            TimeUnit::Weeks => length * WEEK,
            TimeUnit::Months => length * 28.0 * DAY,
            TimeUnit::Years => length * 365.0 * DAY,
        }
    }

    /// The largest grid boundary at or before `t`.
    pub fn floor(&self, t: Real) -> Real {
        if !t.is_finite() {
            return t;
        }
        match self.unit {
            TimeUnit::Seconds | TimeUnit::Minutes | TimeUnit::Hours => {
                let span = self.fixed_length();
                let day = (t / DAY).floor() * DAY;
                day + ((t - day) / span).floor() * span
            }
            TimeUnit::Days => {
                let span = self.fixed_length();
                (t / span).floor() * span
            }
            TimeUnit::Weeks => {
                let span = self.fixed_length();
                WEEK_ORIGIN + ((t - WEEK_ORIGIN) / span).floor() * span
            }
            TimeUnit::Months | TimeUnit::Years => match month_index(t) {
                Some(index) => {
                    let months = self.months();
                    month_start(index - index.rem_euclid(months))
                }
                None => saturate(t),
            },
        }
    }

    /// The smallest grid boundary at or after `t`.
    pub fn ceil(&self, t: Real) -> Real {
        let floor = self.floor(t);
        if floor == t {
            t
        } else {
            self.next(t)
        }
    }

    /// The smallest grid boundary strictly after `t`.
    pub fn next(&self, t: Real) -> Real {
        if !t.is_finite() {
            return t;
        }
        let floor = self.floor(t);
        match self.unit {
            TimeUnit::Seconds | TimeUnit::Minutes | TimeUnit::Hours => {
                let day_end = (floor / DAY).floor() * DAY + DAY;
                (floor + self.fixed_length()).min(day_end)
            }
            TimeUnit::Days | TimeUnit::Weeks => floor + self.fixed_length(),
            TimeUnit::Months | TimeUnit::Years => match month_index(floor) {
                Some(index) => month_start(index + self.months()),
                None => saturate(t),
            },
        }
    }

    /// The largest grid boundary strictly before `t`.
    pub fn previous(&self, t: Real) -> Real {
        if !t.is_finite() {
            return t;
        }
        let floor = self.floor(t);
        if floor < t {
            return floor;
        }
        match self.unit {
            TimeUnit::Seconds | TimeUnit::Minutes | TimeUnit::Hours => {
                let span = self.fixed_length();
                let day = (t / DAY).floor() * DAY;
                if t > day {
                    t - span
                } else {
                    let last = (DAY / span).ceil() - 1.0;
                    day - DAY + last * span
                }
            }
            TimeUnit::Days | TimeUnit::Weeks => t - self.fixed_length(),
            TimeUnit::Months | TimeUnit::Years => match month_index(t) {
                Some(index) => month_start(index - self.months()),
                None => saturate(t),
            },
        }
    }

    /// Move `count` grid boundaries from `t` (backwards when negative).
    ///
    /// For a grid-aligned `t` this lands exactly `count` spans away; an
    /// unaligned `t` first moves to the adjacent boundary.
    pub fn step(&self, t: Real, count: i32) -> Real {
        let mut x = t;
        if count >= 0 {
            for _ in 0..count {
                x = self.next(x);
            }
        } else {
            for _ in 0..count.unsigned_abs() {
                x = self.previous(x);
            }
        }
        x
    }

    /// The grid span `[floor(t), next(floor(t)))` containing `t`.
    pub fn span(&self, t: Real) -> Interval {
        let start = self.floor(t);
        Interval::closed_open(start, self.next(start))
    }

    /// Consecutive grid spans starting with the one containing `start`.
    pub fn walk(&self, start: Real) -> Spans {
        Spans {
            duration: *self,
            next_start: self.floor(start),
        }
    }

    /// Widen `interval` to grid boundaries plus `count` spans on each side.
    pub fn pad(&self, interval: &Interval, count: u32) -> Interval {
        if interval.is_empty() {
            return Interval::empty();
        }
        let count = i32::try_from(count).unwrap_or(i32::MAX);
        let start = self.step(self.floor(interval.start()), -count);
        let end = self.step(self.ceil(interval.end()), count);
        Interval::closed(start, end)
    }

    fn fixed_length(&self) -> Real {
        Real::from(self.length) * self.unit.seconds().unwrap_or(DAY)
    }

    fn months(&self) -> i64 {
        match self.unit {
            TimeUnit::Years => i64::from(self.length) * 12,
            _ => i64::from(self.length),
        }
    }
}

/// Iterator over consecutive grid spans. See [`Duration::walk`].
#[derive(Debug, Clone)]
pub struct Spans {
    duration: Duration,
    next_start: Real,
}

impl Iterator for Spans {
    type Item = Interval;

    fn next(&mut self) -> Option<Interval> {
        if !self.next_start.is_finite() {
            return None;
        }
        let start = self.next_start;
        let end = self.duration.next(start);
        self.next_start = end;
        Some(Interval::closed_open(start, end))
    }
}

fn month_index(t: Real) -> Option<i64> {
    let seconds = t.floor();
    if !seconds.is_finite() || seconds.abs() > i64::MAX as Real {
        return None;
    }
    let datetime = DateTime::from_timestamp(seconds as i64, 0)?;
    Some(i64::from(datetime.year()) * 12 + i64::from(datetime.month0()))
}

fn month_start(index: i64) -> Real {
    let year = index.div_euclid(12);
    let month = index.rem_euclid(12) as u32 + 1;
    i32::try_from(year)
        .ok()
        .and_then(|year| NaiveDate::from_ymd_opt(year, month, 1))
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map_or_else(
            || if index < 0 { Real::NEG_INFINITY } else { Real::INFINITY },
            |datetime| datetime.and_utc().timestamp() as Real,
        )
}

fn saturate(t: Real) -> Real {
    if t < 0.0 {
        Real::NEG_INFINITY
    } else {
        Real::INFINITY
    }
}

impl FromStr for Duration {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.length, self.unit)
    }
}

impl fmt::Debug for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Duration({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HOUR;

    #[test]
    fn parse_and_display() {
        let d = Duration::parse("20h").unwrap();
        assert_eq!(d, Duration::new(20, TimeUnit::Hours).unwrap());
        assert_eq!(d.to_string(), "20h");
        assert_eq!("5min".parse::<Duration>().unwrap().unit, TimeUnit::Minutes);
        assert_eq!(Duration::parse("M").unwrap().length, 1);
        assert!(Duration::parse("0d").is_err());
        assert!(Duration::parse("3x").is_err());
    }

    #[test]
    fn sub_day_grid_restarts_at_midnight() {
        let d = Duration::parse("20h").unwrap();
        assert!(!d.is_uniform());
        assert_eq!(d.min_seconds(), 4.0 * HOUR);
        assert_eq!(d.floor(22.0 * HOUR), 20.0 * HOUR);
        assert_eq!(d.next(20.0 * HOUR), DAY);
        assert_eq!(d.next(0.0), 20.0 * HOUR);
        assert_eq!(d.previous(DAY), 20.0 * HOUR);
        assert_eq!(d.previous(20.0 * HOUR), 0.0);
        assert_eq!(d.step(0.0, 3), DAY + 20.0 * HOUR);
        assert_eq!(d.step(DAY, -2), 0.0);
        assert_eq!(d.ceil(1.0), 20.0 * HOUR);
    }

    #[test]
    fn uniform_units() {
        let h = Duration::parse("1h").unwrap();
        assert!(h.is_uniform());
        assert_eq!(h.previous(0.0), -HOUR);
        let w = Duration::parse("1w").unwrap();
        assert_eq!(w.floor(12.0 * DAY), WEEK_ORIGIN + WEEK);
        assert_eq!(w.floor(10.0 * DAY), WEEK_ORIGIN);
        assert_eq!(w.floor(0.0), WEEK_ORIGIN - WEEK);
    }

    #[test]
    fn calendar_months() {
        let m = Duration::parse("1M").unwrap();
        // 1970-02-01 and 1970-03-01.
        let feb = 31.0 * DAY;
        let mar = feb + 28.0 * DAY;
        assert_eq!(m.floor(feb + 3.0 * DAY), feb);
        assert_eq!(m.next(feb), mar);
        assert_eq!(m.previous(feb), 0.0);
        assert_eq!(m.span(feb + 1.0), Interval::closed_open(feb, mar));
        let q = Duration::parse("3M").unwrap();
        assert_eq!(q.floor(mar), 0.0);
        let y = Duration::parse("1y").unwrap();
        assert_eq!(y.next(0.0), 365.0 * DAY);
    }

    #[test]
    fn walk_spans() {
        let d = Duration::parse("20h").unwrap();
        let starts: Vec<Real> = d.walk(0.0).take(3).map(|s| s.start()).collect();
        assert_eq!(starts, vec![0.0, 20.0 * HOUR, DAY]);
    }

    #[test]
    fn pad_to_grid() {
        let d = Duration::parse("1d").unwrap();
        let padded = d.pad(&Interval::closed(0.5 * DAY, 1.5 * DAY), 1);
        assert_eq!(padded, Interval::closed(-DAY, 3.0 * DAY));
    }

    #[test]
    fn infinite_passes_through() {
        let m = Duration::parse("1M").unwrap();
        assert_eq!(m.floor(Real::INFINITY), Real::INFINITY);
        assert_eq!(m.next(Real::NEG_INFINITY), Real::NEG_INFINITY);
    }
}
