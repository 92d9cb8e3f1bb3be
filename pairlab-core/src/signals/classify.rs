//! Threshold classification of a series against `mean ± stddev`.
//!
//! [`classify`] uses one mean and stddev computed over the whole series, so
//! later values shape the thresholds applied to earlier ones (look-ahead).
//! That is fine for describing a finished history but not for anything
//! predictive; [`classify_rolling`] only looks at the trailing window ending
//! at each index.

use crate::stats::{mean, stddev, StatsError};
use serde::{Deserialize, Serialize};

/// Per-index mean-reversion call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i8)]
pub enum Signal {
    /// Value is below `mean - stddev`.
    Buy = 1,
    /// Value is above `mean + stddev`.
    Sell = -1,
    Hold = 0,
}

impl Signal {
    pub fn value(self) -> i8 {
        self as i8
    }

    /// Strict comparison on both bounds: a value exactly on a band is `Hold`.
    pub fn from_bands(x: f64, mean: f64, stddev: f64) -> Self {
        if x > mean + stddev {
            Signal::Sell
        } else if x < mean - stddev {
            Signal::Buy
        } else {
            Signal::Hold
        }
    }
}

impl TryFrom<i8> for Signal {
    type Error = i8;

    fn try_from(v: i8) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(Signal::Buy),
            -1 => Ok(Signal::Sell),
            0 => Ok(Signal::Hold),
            other => Err(other),
        }
    }
}

/// Classify every element against the whole series' mean and stddev.
pub fn classify(series: &[f64]) -> Result<Vec<Signal>, StatsError> {
    let m = mean(series)?;
    let sd = stddev(series)?;
    Ok(series
        .iter()
        .map(|&x| Signal::from_bands(x, m, sd))
        .collect())
}

/// Classify each element against the trailing `window` values ending at it.
///
/// Indices before the first full window are `Hold`.
pub fn classify_rolling(series: &[f64], window: usize) -> Result<Vec<Signal>, StatsError> {
    let n = series.len();
    if window == 0 || window > n {
        return Err(StatsError::InvalidWindow { window, len: n });
    }

    let mut signals = vec![Signal::Hold; n];
    for i in (window - 1)..n {
        let slice = &series[(i + 1 - window)..=i];
        signals[i] = Signal::from_bands(series[i], mean(slice)?, stddev(slice)?);
    }
    Ok(signals)
}
