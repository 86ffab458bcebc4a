//! Algebraic properties of the interval type.

use curve_core::{Interval, Real};
use proptest::prelude::*;

fn interval() -> impl Strategy<Value = Interval> {
    (
        -100.0..100.0f64,
        0.0..50.0f64,
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(start, length, start_open, end_open)| {
            Interval::new(start, start + length, start_open, end_open)
        })
}

proptest! {
    #[test]
    fn intersection_is_commutative(a in interval(), b in interval()) {
        prop_assert_eq!(a.intersection(&b), b.intersection(&a));
    }

    #[test]
    fn hull_is_commutative(a in interval(), b in interval()) {
        prop_assert_eq!(a.hull(&b), b.hull(&a));
    }

    #[test]
    fn intersection_is_subset_of_both(a in interval(), b in interval()) {
        let i = a.intersection(&b);
        prop_assert!(i.is_subset_of(&a));
        prop_assert!(i.is_subset_of(&b));
    }

    #[test]
    fn hull_is_superset_of_both(a in interval(), b in interval()) {
        let h = a.hull(&b);
        prop_assert!(h.is_superset_of(&a));
        prop_assert!(h.is_superset_of(&b));
    }

    #[test]
    fn membership_matches_intersection(a in interval(), b in interval(), x in -150.0..150.0f64) {
        let both = a.contains(x) && b.contains(x);
        prop_assert_eq!(a.intersection(&b).contains(x), both);
    }

    #[test]
    fn rests_do_not_overlap(a in interval(), x in -150.0..150.0f64) {
        prop_assume!(!a.is_empty());
        let inside = a.contains(x);
        let below = a.rest_to_negative_infinity().contains(x);
        let above = a.rest_to_positive_infinity().contains(x);
        prop_assert_eq!(inside as u8 + below as u8 + above as u8, 1);
    }

    #[test]
    fn partition_covers_exactly(
        a in interval(),
        cuts in prop::collection::vec(-100.0..150.0f64, 0..4),
        x in -150.0..150.0f64,
    ) {
        let pieces = a.partition(&cuts);
        let hits = pieces.iter().filter(|p| p.contains(x)).count();
        prop_assert_eq!(hits, a.contains(x) as usize);
    }
}

#[test]
fn empty_intervals_are_equal() {
    assert_eq!(Interval::closed(2.0, 1.0), Interval::open(0.0, 0.0));
    assert_eq!(Interval::empty().length(), 0.0);
    assert!(!Interval::empty().is_infinite());
}

#[test]
fn shift_and_extend() {
    let i = Interval::closed_open(0.0, 1.0);
    assert_eq!(i.shifted(10.0), Interval::closed_open(10.0, 11.0));
    assert_eq!(
        i.extended_to_positive_infinity(),
        Interval::positive_infinite(0.0)
    );
    assert_eq!(
        i.extended_to_negative_infinity(),
        Interval::new(Real::NEG_INFINITY, 1.0, true, true)
    );
    assert_eq!(i.as_closed(), Interval::closed(0.0, 1.0));
    assert_eq!(i.as_open(), Interval::open(0.0, 1.0));
}
