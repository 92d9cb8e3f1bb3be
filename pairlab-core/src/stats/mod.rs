//! Statistics over in-memory numeric series.
//!
//! Every function here is pure. Invalid input is reported through
//! [`StatsError`] so that "no result" is never confused with a legitimately
//! empty output.

pub mod cointegration;
pub mod descriptive;
pub mod regression;
pub mod sma;
pub mod spread;

pub use cointegration::{
    cointegration, cointegration_with_lags, Cointegration, CriticalValues, DEFAULT_ADF_LAGS,
};
pub use descriptive::{mean, stddev, zscore, zscores, ZScores};
pub use regression::{hedge_ratio, Regression};
pub use sma::sma;
pub use spread::spread;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatsError {
    #[error("series lengths differ: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("window {window} is invalid for a series of length {len} (need 1 <= window <= len)")]
    InvalidWindow { window: usize, len: usize },

    #[error("statistic is undefined for an empty series")]
    EmptySeries,

    #[error("regressor has zero variance")]
    DegenerateRegressor,

    #[error("need at least {needed} observations, got {got}")]
    TooFewObservations { needed: usize, got: usize },
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub(crate) fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for statistics tests.
#[cfg(test)]
pub(crate) const DEFAULT_EPSILON: f64 = 1e-10;
