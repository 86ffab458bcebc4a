//! Error types for curvelib.
//!
//! Every failure the library can report is a variant of a single
//! `thiserror`-derived enum. All errors are synchronous and local: a failed
//! call has no partial effect except where documented for
//! [`Error::Propagation`].

use thiserror::Error;

/// The top-level error type used throughout curvelib.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// General runtime error (target of `fail!`).
    #[error("{0}")]
    Runtime(String),

    /// Precondition violated (target of `ensure!`).
    #[error("precondition not satisfied: {0}")]
    Precondition(String),

    /// A mutation would break strictly ascending x order.
    #[error("out of order: {0}")]
    OutOfOrder(String),

    /// A sample addressed by x does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A search or sampling request has no finite bound.
    #[error("unbounded operation: {0}")]
    Unbounded(String),

    /// A curve was constructed or mutated with incompatible inputs.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// An observer callback failed during a begin/end fan-out.
    ///
    /// Curves touched by the aborted pass may be left in the updating
    /// state; callers must not keep mutating the graph.
    #[error("update propagation failed: {0}")]
    Propagation(Box<Error>),

    /// A leaf was mutated from inside its own update pass.
    #[error("re-entrant mutation: {0}")]
    ReentrantMutation(String),

    /// `end_update` was called without a matching `begin_update`.
    #[error("end_update called without a matching begin_update")]
    UnbalancedUpdate,
}

impl Error {
    /// Wrap `self` in [`Error::Propagation`] unless it already is one.
    pub fn into_propagation(self) -> Self {
        match self {
            err @ Error::Propagation(_) => err,
            other => Error::Propagation(Box::new(other)),
        }
    }

    /// The innermost error, looking through [`Error::Propagation`].
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Propagation(inner) => inner.root_cause(),
            other => other,
        }
    }
}

/// Shorthand `Result` type used throughout curvelib.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Returns `Err(Error::Precondition(...))` if `$cond` is false.
///
/// # Example
/// ```
/// use curve_core::{ensure, errors::Error};
/// fn positive(x: f64) -> curve_core::errors::Result<f64> {
///     ensure!(x > 0.0, "x must be positive, got {x}");
///     Ok(x)
/// }
/// assert!(positive(1.0).is_ok());
/// assert!(positive(-1.0).is_err());
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::Precondition(
                format!($($msg)*)
            ));
        }
    };
}

/// Returns `Err(Error::InvalidConfiguration(...))` if `$cond` is false.
///
/// # Example
/// ```
/// use curve_core::{ensure_config, errors::Error};
/// fn window(n: usize) -> curve_core::errors::Result<usize> {
///     ensure_config!(n > 0, "window must hold at least one sample");
///     Ok(n)
/// }
/// assert!(window(3).is_ok());
/// assert!(matches!(window(0), Err(Error::InvalidConfiguration(_))));
/// ```
#[macro_export]
macro_rules! ensure_config {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::InvalidConfiguration(
                format!($($msg)*)
            ));
        }
    };
}

/// Returns `Err(Error::Runtime(...))` immediately.
///
/// # Example
/// ```
/// use curve_core::{fail, errors::Error};
/// fn always_err() -> curve_core::errors::Result<()> {
///     fail!("something went wrong");
/// }
/// assert!(always_err().is_err());
/// ```
#[macro_export]
macro_rules! fail {
    ($($msg:tt)*) => {
        return Err($crate::errors::Error::Runtime(format!($($msg)*)))
    };
}
