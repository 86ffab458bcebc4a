//! # curve-funcs
//!
//! Concrete curves and the combinators that derive new curves from old ones.
//!
//! Leaves own data ([`Points`], [`Constant`], [`Quotes`]) or are analytic
//! ([`Line`], [`Sin`], [`Generic`]). Every combinator subscribes to its
//! inputs when it is built and forwards their update passes, translated
//! into its own x coordinates, to whoever observes it. [`Handle`] wraps any
//! curve and adds arithmetic operators and builder methods.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// `Handle` — shared curve reference with operators and builders.
pub mod handle;

/// Subscription plumbing shared by the combinators.
mod link;

/// `Points` — mutable sample-backed curve.
pub mod points;

/// `Constant` — the same value everywhere.
pub mod constant;

/// `Line` — `y = c + m·x`.
pub mod line;

/// `Sin` — sinusoid with amplitude, period, phase and offset.
pub mod sin;

/// `Generic` — a closure over a fixed domain.
pub mod generic;

/// `Empty` — defined nowhere.
pub mod empty;

/// `Map` — pointwise transform of one input.
pub mod map;

/// `Aggregate` — pointwise reduction of several inputs.
pub mod aggregate;

/// `Offset` — shift along x by a fixed amount or by grid steps.
pub mod offset;

/// `Piecewise` — different inputs on disjoint sub-domains.
pub mod piecewise;

/// `Accumulator` — running computations over the input's samples (moving
/// averages, exponential averages, trailing extremes).
pub mod accumulator;

/// `Integral` — running integral from the first defined x.
pub mod integral;

/// `Differential` — one-sided derivative.
pub mod differential;

/// `Extension` — extrapolation beyond the input's domain.
pub mod extension;

/// `Extremas` — alternating local minima and maxima around a reference.
pub mod extremas;

/// `Quotes` — OHLCV bars on a time grid.
pub mod quotes;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use accumulator::{
    Accumulate, Accumulator, ExponentialAverage, Extreme, FnAccumulate, MovingAverage, Smoothing,
    Trailing, Window,
};
pub use aggregate::{Aggregate, Combine};
pub use constant::Constant;
pub use differential::Differential;
pub use empty::Empty;
pub use extension::{Extension, ExtensionKind, Fit};
pub use extremas::Extremas;
pub use generic::Generic;
pub use handle::Handle;
pub use integral::Integral;
pub use line::Line;
pub use map::{Map, Transform};
pub use offset::{Offset, Shift};
pub use piecewise::Piecewise;
pub use points::{Points, PointsOptions};
pub use quotes::{Field, Quote, QuoteField, Quotes};
pub use sin::Sin;
