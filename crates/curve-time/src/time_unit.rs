//! `TimeUnit` — units of time used in [`Duration`](crate::Duration).

use crate::{DAY, HOUR, MINUTE, WEEK};
use curve_core::Real;

/// A unit of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TimeUnit {
    /// Seconds.
    Seconds,
    /// Minutes.
    Minutes,
    /// Hours.
    Hours,
    /// Calendar days.
    Days,
    /// Calendar weeks starting on Monday.
    Weeks,
    /// Calendar months.
    Months,
    /// Calendar years (12 months).
    Years,
}

impl TimeUnit {
    /// Length in seconds, or `None` for calendar units of varying length.
    pub fn seconds(self) -> Option<Real> {
        match self {
            TimeUnit::Seconds => Some(1.0),
            TimeUnit::Minutes => Some(MINUTE),
            TimeUnit::Hours => Some(HOUR),
            TimeUnit::Days => Some(DAY),
            TimeUnit::Weeks => Some(WEEK),
            TimeUnit::Months | TimeUnit::Years => None,
        }
    }

    /// `true` for units shorter than a day.
    pub fn is_sub_day(self) -> bool {
        matches!(self, TimeUnit::Seconds | TimeUnit::Minutes | TimeUnit::Hours)
    }

    /// Short symbol used when formatting and parsing durations.
    pub fn symbol(self) -> &'static str {
        match self {
            TimeUnit::Seconds => "s",
            TimeUnit::Minutes => "min",
            TimeUnit::Hours => "h",
            TimeUnit::Days => "d",
            TimeUnit::Weeks => "w",
            TimeUnit::Months => "M",
            TimeUnit::Years => "y",
        }
    }

    /// Parse a unit symbol. `m` means minutes and `M` months.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "s" | "sec" => Some(TimeUnit::Seconds),
            "m" | "min" => Some(TimeUnit::Minutes),
            "h" => Some(TimeUnit::Hours),
            "d" => Some(TimeUnit::Days),
            "w" => Some(TimeUnit::Weeks),
            "M" | "mo" => Some(TimeUnit::Months),
            "y" | "Y" => Some(TimeUnit::Years),
            _ => None,
        }
    }
}

impl std::fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_round_trip() {
        for unit in [
            TimeUnit::Seconds,
            TimeUnit::Minutes,
            TimeUnit::Hours,
            TimeUnit::Days,
            TimeUnit::Weeks,
            TimeUnit::Months,
            TimeUnit::Years,
        ] {
            assert_eq!(TimeUnit::from_symbol(unit.symbol()), Some(unit));
        }
        assert_eq!(TimeUnit::from_symbol("m"), Some(TimeUnit::Minutes));
        assert_eq!(TimeUnit::from_symbol("q"), None);
    }

    #[test]
    fn fixed_lengths() {
        assert_eq!(TimeUnit::Hours.seconds(), Some(3600.0));
        assert_eq!(TimeUnit::Months.seconds(), None);
        assert!(TimeUnit::Minutes.is_sub_day());
        assert!(!TimeUnit::Days.is_sub_day());
    }
}
