//! # curve-core
//!
//! Core types, traits, and error definitions for curvelib.
//!
//! This crate provides the foundational building blocks shared across all
//! other crates in the workspace – the `Real` alias, the error hierarchy,
//! the [`Interval`] algebra every curve uses to describe where it is
//! defined, the update-propagation protocol ([`UpdateNotifier`]), the
//! [`Curve`] trait and sampling.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Public modules ───────────────────────────────────────────────────────────

/// Explicit configuration values (minimum step).
pub mod config;

/// The `Curve` trait, neighbour-search helpers and subscriptions.
pub mod curve;

/// Error types and the `ensure!` / `ensure_config!` / `fail!` macros.
pub mod errors;

/// Interval algebra with open, closed and infinite edges.
pub mod interval;

/// Domain cache that is only trusted between update passes.
pub mod lazy;

/// Observer registry and begin/end update propagation.
pub mod observable;

/// Lazy sampling of curves over finite domains.
pub mod sampling;

// ── Primitive type aliases ────────────────────────────────────────────────────

/// Floating-point type used throughout the library.
pub type Real = f64;

/// Alias used for sample counts and indices.
pub type Size = usize;

// ── Re-exports for convenience ────────────────────────────────────────────────

pub use config::CurveConfig;
pub use curve::{Curve, ObserverGuard, Subscription};
pub use errors::{Error, Result};
pub use interval::Interval;
pub use lazy::LazyDomain;
pub use observable::{Observer, ObserverToken, OwnerId, UpdateNotifier};
pub use sampling::{sample, sample_points, Samples, Sampling};
