//! Sample-backed curves: lookups, neighbours and mutations.

use approx::assert_abs_diff_eq;
use curve_core::{Curve, Error, Interval, Real, Sampling};
use curve_funcs::{Points, PointsOptions};
use curve_math::Interpolation;
use proptest::prelude::*;

fn ramp() -> std::rc::Rc<Points> {
    Points::new([(0.0, 1.0), (1.0, 2.0), (3.0, 4.0)]).unwrap()
}

#[test]
fn interpolation_policies() {
    let samples = [(0.0, 1.0), (1.0, 3.0)];
    let linear = Points::new(samples).unwrap();
    let previous = Points::with_options(
        samples,
        PointsOptions::default().with_interpolation(Interpolation::Previous),
    )
    .unwrap();
    let next = Points::with_options(
        samples,
        PointsOptions::default().with_interpolation(Interpolation::Next),
    )
    .unwrap();
    assert_eq!(linear.value(0.5), Some(2.0));
    assert_eq!(previous.value(0.5), Some(1.0));
    assert_eq!(next.value(0.5), Some(3.0));
    assert_eq!(linear.value(-0.5), None);
    assert_eq!(linear.value(1.5), None);
}

#[test]
fn neighbours() {
    let p = ramp();
    assert_eq!(p.next_defined(-1.0, 0.0, None).unwrap(), Some(0.0));
    assert_eq!(p.next_defined(0.0, 0.0, None).unwrap(), Some(1.0));
    assert_eq!(p.next_defined(1.5, 0.0, None).unwrap(), Some(3.0));
    assert_eq!(p.next_defined(3.0, 0.0, None).unwrap(), None);
    assert_eq!(p.next_defined(0.0, 0.0, Some(0.5)).unwrap(), None);
    assert_eq!(p.previous_defined(3.0, 0.0, None).unwrap(), Some(1.0));
    assert_eq!(p.previous_defined(0.0, 0.0, None).unwrap(), None);
    assert_eq!(p.previous_defined(10.0, 0.0, None).unwrap(), Some(3.0));
}

#[test]
fn holes_are_skipped_by_neighbours() {
    let p = Points::new([(0.0, Some(1.0)), (1.0, None), (2.0, Some(3.0))]).unwrap();
    assert_eq!(p.domain(), Interval::closed(0.0, 2.0));
    assert_eq!(p.value(1.0), None);
    assert_eq!(p.value(0.5), None);
    assert_eq!(p.next_defined(0.0, 0.0, None).unwrap(), Some(2.0));
    assert_eq!(p.previous_defined(2.0, 0.0, None).unwrap(), Some(0.0));
}

#[test]
fn mutations() {
    let p = ramp();
    p.append(4.0, 5.0).unwrap();
    assert_eq!(p.domain(), Interval::closed(0.0, 4.0));
    assert!(matches!(p.append(4.0, 0.0), Err(Error::OutOfOrder(_))));

    p.replace(1.0, 10.0, false).unwrap();
    assert_eq!(p.value(1.0), Some(10.0));
    assert!(matches!(p.replace(2.0, 0.0, false), Err(Error::NotFound(_))));
    p.replace(5.0, 6.0, true).unwrap();
    assert_eq!(p.last(), Some((5.0, Some(6.0))));

    p.reset(Some(Interval::closed(3.0, 4.0))).unwrap();
    assert_eq!(p.len(), 3);
    assert_abs_diff_eq!(p.value(3.0).unwrap(), 8.0);

    p.set([(10.0, 1.0)]).unwrap();
    assert_eq!(p.domain(), Interval::point(10.0));
    p.reset(None).unwrap();
    assert!(p.is_empty());
    assert!(p.domain().is_empty());
}

#[test]
fn reset_keeps_both_edges() {
    let p = Points::new([(0.0, 1.0), (1.0, 5.0), (2.0, 3.0)]).unwrap();
    let intervals = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
    let sink = std::rc::Rc::clone(&intervals);
    let _guard = curve_funcs::Handle::from(p.clone()).observe(
        curve_core::Observer::new().on_begin(move |interval| {
            sink.borrow_mut().push(*interval);
            Ok(())
        }),
    );
    p.reset(Some(Interval::open(0.0, 2.0))).unwrap();
    assert_eq!(p.samples(), vec![(0.0, Some(1.0)), (2.0, Some(3.0))]);
    assert_eq!(p.domain(), Interval::closed(0.0, 2.0));
    assert_eq!(p.value(1.0), Some(2.0));
    assert_eq!(*intervals.borrow(), vec![Interval::open(0.0, 2.0)]);
}

#[test]
fn failed_appends_store_nothing() {
    let p = ramp();
    assert!(p.append_list([(4.0, 1.0), (3.5, 1.0)]).is_err());
    assert_eq!(p.len(), 3);
    assert!(p.append(Real::NAN, 1.0).is_err());
}

#[test]
fn strict_uniform_grid() {
    let options = PointsOptions::default().strict_uniform();
    let p = Points::with_options([(0.0, 1.0), (2.0, 1.0)], options).unwrap();
    assert!(p.is_uniform());
    assert!(matches!(p.append(5.0, 1.0), Err(Error::InvalidConfiguration(_))));
    p.append(4.0, 1.0).unwrap();
    assert!(Points::with_options([(0.0, 1.0), (1.0, 1.0), (3.0, 1.0)], options).is_err());
}

#[test]
fn sampling_walks_samples() {
    let p = ramp();
    let points = p.samples();
    let sampled = curve_core::sample_points(&*p, &Sampling::new()).unwrap();
    assert_eq!(sampled, points);
    let options = Sampling::new().over(Interval::open(0.0, 3.0));
    let window = curve_core::sample_points(&*p, &options).unwrap();
    assert_eq!(window, vec![(1.0, Some(2.0))]);
}

fn ascending() -> impl Strategy<Value = Vec<(Real, Real)>> {
    prop::collection::vec((0.01..10.0f64, -100.0..100.0f64), 1..40).prop_map(|steps| {
        let mut x = 0.0;
        steps
            .into_iter()
            .map(|(dx, y)| {
                x += dx;
                (x, y)
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn stored_samples_are_returned_exactly(samples in ascending()) {
        let p = Points::empty();
        for &(x, y) in &samples {
            p.append(x, y).unwrap();
        }
        let (first, last) = (samples[0].0, samples[samples.len() - 1].0);
        prop_assert_eq!(p.domain(), Interval::closed(first, last));
        for &(x, y) in &samples {
            prop_assert_eq!(p.value(x), Some(y));
        }
    }

    #[test]
    fn linear_values_stay_between_neighbours(samples in ascending(), t in 0.0..1.0f64) {
        prop_assume!(samples.len() >= 2);
        let p = Points::new(samples.iter().copied()).unwrap();
        for pair in samples.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let x = a.0 + t * (b.0 - a.0);
            prop_assume!(x > a.0 && x < b.0);
            let y = p.value(x).unwrap();
            prop_assert!(y >= a.1.min(b.1) - 1e-9 && y <= a.1.max(b.1) + 1e-9);
        }
    }

    #[test]
    fn domain_points_are_defined(samples in ascending()) {
        let p = Points::new(samples.iter().copied()).unwrap();
        let domain = p.domain();
        let mut x = p.next_defined(domain.start() - 1.0, 0.0, None).unwrap();
        while let Some(at) = x {
            prop_assert!(domain.contains(at));
            prop_assert!(p.value(at).is_some());
            x = p.next_defined(at, 0.0, None).unwrap();
        }
    }
}
