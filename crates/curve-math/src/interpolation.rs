//! Interpolation between stored samples.
//!
//! A sample-backed curve stores `(x, y)` pairs with strictly increasing
//! `x` and optional `y` (a missing `y` is a hole). Between two samples the
//! value follows one of three policies:
//!
//! * [`Interpolation::Previous`] — hold the left sample;
//! * [`Interpolation::Next`] — take the right sample;
//! * [`Interpolation::Linear`] — straight line between both.
//!
//! The lookup helpers below take sorted abscissae and use a binary search
//! (`partition_point`); uniformly spaced samples skip the search with
//! [`UniformGrid`].

use curve_core::Real;

/// How values between two samples are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Interpolation {
    /// Hold the value of the sample at or before `x`.
    Previous,
    /// Take the value of the sample at or after `x`.
    Next,
    /// Interpolate linearly between the bracketing samples.
    #[default]
    Linear,
}

impl Interpolation {
    /// Value at `x` inside the segment `[left.0, right.0]`.
    ///
    /// Returns `None` when a sample the policy needs is a hole.
    pub fn interpolate(
        self,
        x: Real,
        left: (Real, Option<Real>),
        right: (Real, Option<Real>),
    ) -> Option<Real> {
        let (x0, y0) = left;
        let (x1, y1) = right;
        if x == x0 {
            return y0;
        }
        if x == x1 {
            return y1;
        }
        match self {
            Interpolation::Previous => y0,
            Interpolation::Next => y1,
            Interpolation::Linear => {
                let (y0, y1) = (y0?, y1?);
                let dx = x1 - x0;
                if dx.abs() < f64::EPSILON {
                    return Some(y0);
                }
                Some(y0 + (x - x0) * (y1 - y0) / dx)
            }
        }
    }
}

/// Index of the last abscissa `<= x`.
pub fn locate_previous(xs: &[Real], x: Real) -> Option<usize> {
    let count = xs.partition_point(|&xi| xi <= x);
    count.checked_sub(1)
}

/// Index of the first abscissa `>= x`.
pub fn locate_next(xs: &[Real], x: Real) -> Option<usize> {
    let index = xs.partition_point(|&xi| xi < x);
    (index < xs.len()).then_some(index)
}

/// Index of the first abscissa `> x`.
pub fn locate_after(xs: &[Real], x: Real) -> usize {
    xs.partition_point(|&xi| xi <= x)
}

/// Arithmetic lookup on samples spaced `origin + k·step`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformGrid {
    /// Abscissa of the first sample.
    pub origin: Real,
    /// Distance between consecutive samples.
    pub step: Real,
}

impl UniformGrid {
    /// Index of the last sample `<= x` among `len` samples.
    ///
    /// The arithmetic guess is corrected against `xs` so rounding cannot
    /// place `x` in the wrong cell.
    pub fn locate_previous(&self, xs: &[Real], x: Real) -> Option<usize> {
        if xs.is_empty() || x < xs[0] {
            return None;
        }
        let guess = ((x - self.origin) / self.step).floor();
        let last = xs.len() - 1;
        let mut i = if guess.is_finite() && guess >= 0.0 {
            (guess as usize).min(last)
        } else {
            last
        };
        while i > 0 && xs[i] > x {
            i -= 1;
        }
        while i < last && xs[i + 1] <= x {
            i += 1;
        }
        Some(i)
    }
}
