//! Moving averages, exponential averages, trailing extremes and custom
//! folds over sample-backed inputs.

use approx::assert_abs_diff_eq;
use curve_core::{Curve, Interval, Observer, Real, Sampling};
use curve_funcs::{Handle, Points, Smoothing, Window};
use std::cell::RefCell;
use std::rc::Rc;

fn series(values: &[Real], start: Real) -> Rc<Points> {
    Points::from_values(values, start, 1.0).unwrap()
}

fn values(f: &Handle) -> Vec<(Real, Real)> {
    f.sample_points(&Sampling::new())
        .unwrap()
        .into_iter()
        .filter_map(|(x, y)| Some((x, y?)))
        .collect()
}

#[test]
fn sma_by_count() {
    let f = Handle::from(series(&[1.0, 2.0, 3.0, 4.0], 0.0))
        .sma(Window::Count(2))
        .unwrap();
    assert_eq!(values(&f), vec![(1.0, 1.5), (2.0, 2.5), (3.0, 3.5)]);
    assert_eq!(f.value(0.5), None);
    assert_abs_diff_eq!(f.value(1.5).unwrap(), 2.0);
}

#[test]
fn sma_with_late_start() {
    let f = Handle::from(series(&[1.0, 2.0, 3.0, 4.0], 2.0))
        .sma(Window::Count(3))
        .unwrap();
    assert_eq!(f.domain(), Interval::closed(4.0, 5.0));
    assert_eq!(values(&f), vec![(4.0, 2.0), (5.0, 3.0)]);
}

#[test]
fn sma_by_period() {
    let f = Handle::from(series(&[1.0, 2.0, 3.0], 0.0))
        .sma(Window::Period(1.0))
        .unwrap();
    assert_eq!(values(&f), vec![(0.0, 1.0), (1.0, 2.0), (2.0, 3.0)]);

    let f = Handle::from(series(&(0..8).map(Real::from).collect::<Vec<_>>(), 0.0))
        .sma(Window::Period(3.0))
        .unwrap();
    assert_eq!(f.domain().start(), 2.0);
    assert_abs_diff_eq!(f.value(6.1).unwrap(), 5.1, epsilon = 1e-12);
}

#[test]
fn sma_follows_updates() {
    let p = series(&[1.0, 2.0, 3.0], 0.0);
    let f = Handle::from(p.clone()).sma(Window::Count(2)).unwrap();
    assert_abs_diff_eq!(f.value(2.0).unwrap(), 2.5);
    p.replace(2.0, 5.0, false).unwrap();
    assert_abs_diff_eq!(f.value(2.0).unwrap(), 3.5);
    assert_abs_diff_eq!(f.value(1.0).unwrap(), 1.5);
    p.append(3.0, 7.0).unwrap();
    assert_abs_diff_eq!(f.value(3.0).unwrap(), 6.0);
    assert_eq!(f.domain(), Interval::closed(1.0, 3.0));
}

#[test]
fn sma_samples_grow_by_one_per_append() {
    let p = series(&[1.0, 2.0, 3.0, 4.0], 0.0);
    let f = Handle::from(p.clone()).sma(Window::Count(2)).unwrap();
    let before = values(&f);
    assert_eq!(before, vec![(1.0, 1.5), (2.0, 2.5), (3.0, 3.5)]);
    p.append(4.0, 5.0).unwrap();
    let after = values(&f);
    assert_eq!(after.len(), before.len() + 1);
    assert_eq!(after[..before.len()], before[..]);
    assert_eq!(after.last(), Some(&(4.0, 4.5)));
}

#[test]
fn window_of_one_forwards_appends() {
    let p = series(&[1.0, 2.0, 3.0], 0.0);
    let s = Handle::from(p.clone()).sma(Window::Count(1)).unwrap();
    let t = s.trailing_max(Window::Count(2)).unwrap();
    assert_eq!(s.value(2.0), Some(3.0));
    assert_eq!(t.value(2.0), Some(3.0));

    let intervals = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&intervals);
    let _guard = s.observe(Observer::new().on_end(move |interval| {
        sink.borrow_mut().push(*interval);
        Ok(())
    }));
    p.append(3.0, 4.0).unwrap();

    let seen = intervals.borrow();
    assert_eq!(seen.len(), 1);
    assert!(!seen[0].is_empty());
    assert!(seen[0].contains(3.0));
    assert_eq!(s.value(3.0), Some(4.0));
    assert_eq!(t.domain(), Interval::closed(0.0, 3.0));
    assert_eq!(t.value(3.0), Some(4.0));

    p.append(4.0, 1.0).unwrap();
    assert_eq!(t.value(4.0), Some(4.0));
}

#[test]
fn sma_from_empty() {
    let p = Points::empty();
    let f = Handle::from(p.clone()).sma(Window::Count(2)).unwrap();
    assert_eq!(f.value(1.0), None);
    assert!(f.domain().is_empty());
    p.append_list([(0.0, 1.0), (1.0, 2.0), (2.0, 3.0)]).unwrap();
    assert_abs_diff_eq!(f.value(1.0).unwrap(), 1.5);
    assert_abs_diff_eq!(f.value(2.0).unwrap(), 2.5);
}

#[test]
fn ema_by_factor_and_period() {
    let p = Handle::from(series(&[1.0, 2.0, 1.0, 2.0], 0.0));
    let f = p.ema(Smoothing::Alpha(0.5)).unwrap();
    let expected = [1.0, 1.5, 1.25, 1.625];
    for (x, want) in expected.into_iter().enumerate() {
        assert_abs_diff_eq!(f.value(x as Real).unwrap(), want);
    }
    let f = p.ema(Smoothing::Period(2.0)).unwrap();
    assert_abs_diff_eq!(f.value(1.0).unwrap(), 1.5);
}

#[test]
fn ema_follows_appends() {
    let p = series(&[1.0, 2.0], 0.0);
    let f = Handle::from(p.clone()).ema(Smoothing::Alpha(0.5)).unwrap();
    assert_abs_diff_eq!(f.value(1.0).unwrap(), 1.5);
    p.append(2.0, 1.0).unwrap();
    assert_abs_diff_eq!(f.value(2.0).unwrap(), 1.25);
}

#[test]
fn trailing_extremes() {
    let p = Handle::from(series(&[1.0, 2.0, 3.0, 2.0, 1.0, 1.5], 0.0));
    let f = p.trailing_max(Window::Count(3)).unwrap();
    let ys: Vec<Real> = values(&f).into_iter().map(|(_, y)| y).collect();
    assert_eq!(ys, vec![1.0, 2.0, 3.0, 3.0, 3.0, 2.0]);

    let p = Handle::from(series(&[3.0, 1.0, 2.0, 4.0, 5.0], 0.0));
    let f = p.trailing_min(Window::Period(2.0)).unwrap();
    let ys: Vec<Real> = values(&f).into_iter().map(|(_, y)| y).collect();
    assert_eq!(ys, vec![3.0, 1.0, 1.0, 1.0, 2.0]);
}

#[test]
fn custom_fold() {
    let p = series(&[1.0, 2.0, 3.0], 1.0);
    let running =
        Handle::from(p.clone()).accumulate(|_, y, previous| Some(previous.unwrap_or(0.0) + y));
    assert_eq!(values(&running), vec![(1.0, 1.0), (2.0, 3.0), (3.0, 6.0)]);

    let identity = Handle::from(p).accumulate(|_, y, _| Some(y));
    assert_eq!(identity.next_defined(0.0, 0.0, None).unwrap(), Some(1.0));
    assert_eq!(identity.previous_defined(1.0, 0.0, None).unwrap(), None);
    assert_eq!(identity.previous_defined(4.0, 0.0, None).unwrap(), Some(3.0));
}

#[test]
fn invalid_windows_are_rejected() {
    let p = Handle::from(series(&[1.0], 0.0));
    assert!(p.sma(Window::Count(0)).is_err());
    assert!(p.sma(Window::Period(-1.0)).is_err());
    assert!(p.ema(Smoothing::Alpha(0.0)).is_err());
}
