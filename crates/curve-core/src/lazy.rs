//! Cached domain of a derived curve.
//!
//! A combinator's domain is a pure function of its inputs' domains, but it
//! can be expensive to recompute. [`LazyDomain`] caches the result in a
//! `Cell` so it can be refreshed through `&self`. The cached value is only
//! stored while the owning curve is idle: a value computed mid-pass may
//! mix pre- and post-mutation input state.

use crate::interval::Interval;
use std::cell::Cell;

/// A domain cache that is only trusted between update passes.
#[derive(Debug, Default)]
pub struct LazyDomain {
    cached: Cell<Option<Interval>>,
}

impl LazyDomain {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached domain, computing it with `compute` when stale.
    ///
    /// The computed value is stored only when `updating` is false.
    pub fn get_or_compute<F>(&self, updating: bool, compute: F) -> Interval
    where
        F: FnOnce() -> Interval,
    {
        if let Some(domain) = self.cached.get() {
            return domain;
        }
        let domain = compute();
        if !updating {
            self.cached.set(Some(domain));
        }
        domain
    }

    /// Drop the cached value.
    pub fn invalidate(&self) {
        self.cached.set(None);
    }

    /// `true` if a value is currently cached.
    pub fn is_cached(&self) -> bool {
        self.cached.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caches_only_when_idle() {
        let lazy = LazyDomain::new();
        let d = lazy.get_or_compute(true, || Interval::closed(0.0, 1.0));
        assert_eq!(d, Interval::closed(0.0, 1.0));
        assert!(!lazy.is_cached());

        lazy.get_or_compute(false, || Interval::closed(0.0, 2.0));
        assert!(lazy.is_cached());
        let d = lazy.get_or_compute(false, || Interval::closed(5.0, 6.0));
        assert_eq!(d, Interval::closed(0.0, 2.0));

        lazy.invalidate();
        assert!(!lazy.is_cached());
    }
}
