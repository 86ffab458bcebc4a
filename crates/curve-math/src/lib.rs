//! # curve-math
//!
//! Numerical helpers shared by the curve implementations: floating-point
//! comparison, the interpolation policy applied between samples, segment
//! quadrature and linear least-squares regression (over nalgebra).

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Floating-point comparison utilities.
pub mod comparison;

/// Quadrature over a single interpolated segment.
pub mod integrals;

/// Interpolation policies and sorted-abscissa lookup.
pub mod interpolation;

/// Linear least-squares regression.
pub mod linear_least_squares;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use comparison::{close, close_enough};
pub use integrals::{discrete_trapezoid, segment_area};
pub use interpolation::Interpolation;
pub use linear_least_squares::{
    fit_harmonics, fit_line, HarmonicSeries, LinearLeastSquaresRegression,
};
