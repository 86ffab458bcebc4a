//! # curve-time
//!
//! Durations on calendar-aligned grids.
//!
//! Timestamps are UTC seconds since the Unix epoch, carried as
//! [`Real`](curve_core::Real). A [`Duration`] such as `"20h"` or `"1M"`
//! defines a grid of boundaries; sub-day grids restart at every UTC
//! midnight, day grids align to the epoch, week grids to Monday and
//! month/year grids to calendar month starts.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Grid-aligned durations.
pub mod duration;

/// Units of time.
pub mod time_unit;

pub use duration::{Duration, Spans};
pub use time_unit::TimeUnit;

/// Seconds in a minute.
pub const MINUTE: curve_core::Real = 60.0;
/// Seconds in an hour.
pub const HOUR: curve_core::Real = 3_600.0;
/// Seconds in a day.
pub const DAY: curve_core::Real = 86_400.0;
/// Seconds in a week.
pub const WEEK: curve_core::Real = 7.0 * DAY;
