//! Quadrature over interpolated samples.
//!
//! The running integral of a sample-backed curve is a sum of per-segment
//! areas. Each segment is integrated exactly for its interpolation policy:
//! trapezoids for linear segments, rectangles for step segments.

use crate::interpolation::Interpolation;
use curve_core::Real;

/// Area under the segment `[left.0, right.0]` from `left.0` to `upto`.
///
/// * linear: trapezoid with the interpolated value at `upto`;
/// * previous: rectangle of height `left.1`;
/// * next: rectangle of height `right.1` (the next sample's value, not the
///   value at `upto`).
///
/// Returns `None` when a sample the policy needs is a hole.
pub fn segment_area(
    interpolation: Interpolation,
    left: (Real, Option<Real>),
    right: (Real, Option<Real>),
    upto: Real,
) -> Option<Real> {
    let width = upto - left.0;
    if width == 0.0 {
        return Some(0.0);
    }
    match interpolation {
        Interpolation::Previous => Some(left.1? * width),
        Interpolation::Next => Some(right.1? * width),
        Interpolation::Linear => {
            let y0 = left.1?;
            let y = Interpolation::Linear.interpolate(upto, left, right)?;
            Some(0.5 * width * (y0 + y))
        }
    }
}

/// Composite trapezoidal rule on discrete data points.
///
/// Given abscissae `x[0..n]` and ordinates `f[0..n]`, returns
///
/// $$\sum_{i=0}^{n-2} \tfrac12 (x_{i+1}-x_i)(f_i + f_{i+1}).$$
pub fn discrete_trapezoid(x: &[Real], f: &[Real]) -> Real {
    debug_assert_eq!(x.len(), f.len());
    let n = x.len();
    if n < 2 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n - 1 {
        sum += (x[i + 1] - x[i]) * (f[i] + f[i + 1]);
    }
    0.5 * sum
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn segment_policies() {
        let l = (0.0, Some(2.0));
        let r = (1.0, Some(4.0));
        assert_abs_diff_eq!(segment_area(Interpolation::Linear, l, r, 1.0).unwrap(), 3.0);
        assert_abs_diff_eq!(segment_area(Interpolation::Linear, l, r, 0.5).unwrap(), 1.25);
        assert_abs_diff_eq!(segment_area(Interpolation::Previous, l, r, 0.5).unwrap(), 1.0);
        assert_abs_diff_eq!(segment_area(Interpolation::Next, l, r, 0.5).unwrap(), 2.0);
        assert_eq!(segment_area(Interpolation::Linear, (0.0, None), r, 0.5), None);
        assert_eq!(segment_area(Interpolation::Linear, (0.0, None), r, 0.0), Some(0.0));
    }

    #[test]
    fn trapezoid_on_array_linear() {
        // ∫₀¹ x dx = 0.5, exact for the trapezoid rule
        let x = [0.0, 0.25, 0.5, 0.75, 1.0];
        let f: Vec<Real> = x.to_vec();
        let result = discrete_trapezoid(&x, &f);
        assert!((result - 0.5).abs() < 1e-14, "got {result}");
    }

    #[test]
    fn segments_sum_to_trapezoid() {
        let x = [0.0, 1.0, 3.0, 3.5];
        let f = [1.0, -1.0, 2.0, 0.0];
        let total: Real = (0..x.len() - 1)
            .map(|i| {
                segment_area(
                    Interpolation::Linear,
                    (x[i], Some(f[i])),
                    (x[i + 1], Some(f[i + 1])),
                    x[i + 1],
                )
                .unwrap()
            })
            .sum();
        assert_abs_diff_eq!(total, discrete_trapezoid(&x, &f), epsilon = 1e-12);
    }
}
