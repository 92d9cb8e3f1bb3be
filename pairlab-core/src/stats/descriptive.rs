//! Mean, population standard deviation and z-score.

use super::StatsError;
use serde::{Deserialize, Serialize};

/// Arithmetic mean.
pub fn mean(series: &[f64]) -> Result<f64, StatsError> {
    if series.is_empty() {
        return Err(StatsError::EmptySeries);
    }
    Ok(series.iter().sum::<f64>() / series.len() as f64)
}

/// Population standard deviation: `sqrt(mean((x - mean)^2))`.
pub fn stddev(series: &[f64]) -> Result<f64, StatsError> {
    let m = mean(series)?;
    let squared: Vec<f64> = series.iter().map(|x| (x - m).powi(2)).collect();
    Ok(mean(&squared)?.sqrt())
}

/// `(x - mean) / stddev`.
///
/// Not guarded: a zero `stddev` yields `±inf`, or `NaN` when `x == mean`.
/// Check [`ZScores::is_degenerate`] when scoring a whole series.
pub fn zscore(x: f64, mean: f64, stddev: f64) -> f64 {
    (x - mean) / stddev
}

/// Z-scores of every element against the series' own mean and stddev.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZScores {
    pub mean: f64,
    pub stddev: f64,
    pub values: Vec<f64>,
}

impl ZScores {
    /// True when the stddev is zero and `values` holds NaN/inf.
    pub fn is_degenerate(&self) -> bool {
        self.stddev == 0.0
    }

    pub fn latest(&self) -> Option<f64> {
        self.values.last().copied()
    }
}

pub fn zscores(series: &[f64]) -> Result<ZScores, StatsError> {
    let m = mean(series)?;
    let sd = stddev(series)?;
    Ok(ZScores {
        mean: m,
        stddev: sd,
        values: series.iter().map(|&x| zscore(x, m, sd)).collect(),
    })
}
