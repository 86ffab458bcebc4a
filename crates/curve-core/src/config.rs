//! Library configuration.
//!
//! [`CurveConfig`] holds the values that every curve constructor needs a
//! default for. There is no process-wide instance: callers build one (or
//! use [`CurveConfig::default`]) and hand it to the option structs of the
//! curves they create.

use crate::errors::Result;
use crate::Real;

/// Default smallest meaningful x increment.
pub const DEFAULT_MIN_STEP: Real = 1e-9;

/// Explicit configuration threaded through curve construction.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CurveConfig {
    /// Smallest x increment used when searching for neighbouring samples.
    pub min_step: Real,
}

impl Default for CurveConfig {
    fn default() -> Self {
        Self {
            min_step: DEFAULT_MIN_STEP,
        }
    }
}

impl CurveConfig {
    /// Replace the minimum step.
    ///
    /// # Errors
    /// Returns an error if `min_step` is not a positive finite number.
    pub fn with_min_step(mut self, min_step: Real) -> Result<Self> {
        crate::ensure_config!(
            min_step.is_finite() && min_step > 0.0,
            "min_step must be positive and finite, got {min_step}"
        );
        self.min_step = min_step;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_min_step() {
        assert_eq!(CurveConfig::default().min_step, DEFAULT_MIN_STEP);
    }

    #[test]
    fn rejects_non_positive_step() {
        assert!(CurveConfig::default().with_min_step(0.0).is_err());
        assert!(CurveConfig::default().with_min_step(Real::NAN).is_err());
        let config = CurveConfig::default().with_min_step(0.5).unwrap();
        assert_eq!(config.min_step, 0.5);
    }
}
