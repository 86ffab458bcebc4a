//! # curvelib
//!
//! Lazily evaluated curves that stay current as their inputs change.
//!
//! This crate is a **façade** that re-exports all public items from the
//! underlying workspace crates. Application code should depend on this
//! crate rather than the individual `curve-*` crates.
//!
//! ## Quick start
//!
//! ```toml
//! [dependencies]
//! curvelib = "0.1"
//! ```
//!
//! ```rust
//! use curvelib::core::Curve;
//! use curvelib::funcs::{Handle, Points, Window};
//!
//! let prices = Points::from_values(&[1.0, 2.0, 3.0], 0.0, 1.0).unwrap();
//! let sma = Handle::from(prices.clone()).sma(Window::Count(2)).unwrap();
//! assert_eq!(sma.value(2.0), Some(2.5));
//!
//! prices.append(3.0, 5.0).unwrap();
//! assert_eq!(sma.value(3.0), Some(4.0));
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Core types, intervals, update propagation and the `Curve` trait.
pub use curve_core as core;

/// Calendar-aligned durations and time grids.
pub use curve_time as time;

/// Interpolation, integration and least-squares fitting.
pub use curve_math as math;

/// Concrete curves and combinators.
pub use curve_funcs as funcs;
