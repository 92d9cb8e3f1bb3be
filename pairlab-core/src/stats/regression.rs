//! Ordinary least squares of one leg on the other.
//!
//! The slope is the hedge ratio: holding one unit of `y` against `beta` units
//! of `x` leaves the residual spread `y - beta * x`.

use super::descriptive::mean;
use super::spread::spread;
use super::StatsError;
use serde::{Deserialize, Serialize};

/// Fit of `y = intercept + beta * x`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Regression {
    pub beta: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub observations: usize,
}

impl Regression {
    /// `y[i] - (intercept + beta * x[i])`.
    pub fn residuals(&self, y: &[f64], x: &[f64]) -> Result<Vec<f64>, StatsError> {
        let fitted: Vec<f64> = x.iter().map(|xi| self.intercept + self.beta * xi).collect();
        spread(y, &fitted)
    }
}

pub fn hedge_ratio(y: &[f64], x: &[f64]) -> Result<Regression, StatsError> {
    if y.len() != x.len() {
        return Err(StatsError::LengthMismatch {
            left: y.len(),
            right: x.len(),
        });
    }
    let mx = mean(x)?;
    let my = mean(y)?;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    let mut syy = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mx;
        let dy = yi - my;
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }

    if sxx == 0.0 {
        return Err(StatsError::DegenerateRegressor);
    }

    let beta = sxy / sxx;
    let intercept = my - beta * mx;
    // Constant y is fitted exactly by a zero slope.
    let r_squared = if syy == 0.0 { 1.0 } else { (sxy * sxy) / (sxx * syy) };

    Ok(Regression {
        beta,
        intercept,
        r_squared,
        observations: x.len(),
    })
}
