//! Tolerant float comparison for abscissae and grid checks.

use curve_core::Real;

/// Absolute tolerance used for grid and spacing checks, scaled by the step.
pub const EPSILON: Real = 1e-10;

/// `|a − b| ≤ tolerance`.
#[inline]
pub fn close(a: Real, b: Real, tolerance: Real) -> bool {
    (a - b).abs() <= tolerance
}

/// `a` and `b` are within `ulps` machine epsilons of the larger magnitude.
#[inline]
pub fn close_enough(a: Real, b: Real, ulps: u32) -> bool {
    a == b || (a - b).abs() <= a.abs().max(b.abs()) * Real::EPSILON * Real::from(ulps)
}

/// `x` lies on the grid `origin + k·step` for some integer `k`, allowing for
/// rounding accumulated over many steps.
pub fn on_grid(x: Real, origin: Real, step: Real) -> bool {
    if step <= 0.0 || !x.is_finite() {
        return false;
    }
    let k = ((x - origin) / step).round();
    let node = origin + k * step;
    close_enough(x, node, 64) || close(x, node, EPSILON * step)
}
