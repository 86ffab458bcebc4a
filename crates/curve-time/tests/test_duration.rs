//! Grid arithmetic across units.

use curve_core::{Interval, Real};
use curve_time::{Duration, TimeUnit, DAY, HOUR, MINUTE, WEEK};

fn d(expression: &str) -> Duration {
    Duration::parse(expression).unwrap()
}

/// 2024-02-01 00:00 UTC.
const FEB_2024: Real = 1_706_745_600.0;
/// 2024-03-01 00:00 UTC (leap year).
const MAR_2024: Real = FEB_2024 + 29.0 * DAY;

#[test]
fn every_unit_parses() {
    let cases = [
        ("1s", TimeUnit::Seconds),
        ("15min", TimeUnit::Minutes),
        ("4h", TimeUnit::Hours),
        ("1d", TimeUnit::Days),
        ("2w", TimeUnit::Weeks),
        ("1M", TimeUnit::Months),
        ("1y", TimeUnit::Years),
    ];
    for (expression, unit) in cases {
        let duration = d(expression);
        assert_eq!(duration.unit, unit, "{expression}");
        assert_eq!(duration.to_string(), expression);
    }
}

#[test]
fn next_and_previous_are_inverse_on_the_grid() {
    let start = FEB_2024 + 3.0 * DAY;
    for expression in ["1s", "15min", "7min", "20h", "1d", "1w", "1M", "3M", "1y"] {
        let duration = d(expression);
        let mut x = duration.floor(start);
        for _ in 0..50 {
            let next = duration.next(x);
            assert!(next > x, "{expression} at {x}");
            assert_eq!(duration.previous(next), x, "{expression} at {next}");
            assert_eq!(duration.floor(next), next);
            x = next;
        }
    }
}

#[test]
fn uneven_sub_day_grids() {
    let grid = d("7min");
    assert!(!grid.is_uniform());
    // 1440 minutes = 205 · 7 + 5
    assert_eq!(grid.min_seconds(), 5.0 * MINUTE);
    let last = 205.0 * 7.0 * MINUTE;
    assert_eq!(grid.next(last), DAY);
    assert_eq!(grid.previous(DAY), last);
    assert_eq!(grid.span(DAY - 1.0), Interval::closed_open(last, DAY));
}

#[test]
fn month_lengths_follow_the_calendar() {
    let month = d("1M");
    assert_eq!(month.next(FEB_2024), MAR_2024);
    assert_eq!(month.floor(MAR_2024 - 1.0), FEB_2024);
    assert_eq!(month.step(FEB_2024, 12), FEB_2024 + 366.0 * DAY);
    assert_eq!(month.step(MAR_2024, -1), FEB_2024);
    assert_eq!(month.min_seconds(), 28.0 * DAY);
}

#[test]
fn weeks_start_on_monday() {
    let week = d("1w");
    // 2024-02-01 is a Thursday.
    let monday = FEB_2024 - 3.0 * DAY;
    assert_eq!(week.floor(FEB_2024), monday);
    assert_eq!(week.next(FEB_2024), monday + WEEK);
}

#[test]
fn walking_hours() {
    let spans: Vec<Interval> = d("4h").walk(FEB_2024 + HOUR).take(7).collect();
    assert_eq!(spans[0], Interval::closed_open(FEB_2024, FEB_2024 + 4.0 * HOUR));
    assert_eq!(spans[6].start(), FEB_2024 + DAY);
    assert!(spans.windows(2).all(|w| w[0].end() == w[1].start()));
}
