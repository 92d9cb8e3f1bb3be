//! Engle-Granger two-step cointegration test.
//!
//! Step one fits `y = intercept + beta * x` by OLS. Step two runs an
//! augmented Dickey-Fuller regression (no constant) on the residuals:
//!
//! ```text
//! Δe[t] = gamma * e[t-1] + phi_1 * Δe[t-1] + ... + phi_p * Δe[t-p] + u[t]
//! ```
//!
//! The t-statistic of `gamma` is compared against MacKinnon (2010) critical
//! values for two variables with a constant. More negative means stronger
//! evidence that the spread mean-reverts.

use super::regression::{hedge_ratio, Regression};
use super::StatsError;
use serde::{Deserialize, Serialize};

/// Lagged differences used by [`cointegration`].
pub const DEFAULT_ADF_LAGS: usize = 1;

/// MacKinnon (2010) response-surface coefficients, N = 2, constant term:
/// `cv(T) = b0 + b1 / T + b2 / T^2` at 1%, 5% and 10%.
const MACKINNON_N2_C: [[f64; 3]; 3] = [
    [-3.89644, -10.9519, -22.527],
    [-3.33613, -6.1101, -6.823],
    [-3.04445, -4.2412, -2.720],
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriticalValues {
    pub one_pct: f64,
    pub five_pct: f64,
    pub ten_pct: f64,
}

impl CriticalValues {
    /// Critical values for a sample of `nobs` residuals.
    pub fn for_sample(nobs: usize) -> Self {
        let t = nobs as f64;
        let cv = |[b0, b1, b2]: [f64; 3]| b0 + b1 / t + b2 / (t * t);
        Self {
            one_pct: cv(MACKINNON_N2_C[0]),
            five_pct: cv(MACKINNON_N2_C[1]),
            ten_pct: cv(MACKINNON_N2_C[2]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cointegration {
    /// First-step fit; its residuals are the tested spread.
    pub hedge: Regression,
    /// t-statistic of the lagged residual in the ADF regression.
    pub adf_statistic: f64,
    pub lags: usize,
    pub critical_values: CriticalValues,
}

impl Cointegration {
    /// Smallest of 0.01 / 0.05 / 0.10 at which "no cointegration" is rejected.
    pub fn significance(&self) -> Option<f64> {
        let cv = &self.critical_values;
        if self.adf_statistic < cv.one_pct {
            Some(0.01)
        } else if self.adf_statistic < cv.five_pct {
            Some(0.05)
        } else if self.adf_statistic < cv.ten_pct {
            Some(0.10)
        } else {
            None
        }
    }

    /// Rejected at the 5% level.
    pub fn is_cointegrated(&self) -> bool {
        self.adf_statistic < self.critical_values.five_pct
    }
}

/// Engle-Granger test with [`DEFAULT_ADF_LAGS`] lagged differences.
pub fn cointegration(y: &[f64], x: &[f64]) -> Result<Cointegration, StatsError> {
    cointegration_with_lags(y, x, DEFAULT_ADF_LAGS)
}

pub fn cointegration_with_lags(
    y: &[f64],
    x: &[f64],
    lags: usize,
) -> Result<Cointegration, StatsError> {
    let hedge = hedge_ratio(y, x)?;
    let residuals = hedge.residuals(y, x)?;

    // A perfect fit leaves nothing to test.
    let ssr: f64 = residuals.iter().map(|e| e * e).sum();
    let sst: f64 = {
        let my = y.iter().sum::<f64>() / y.len() as f64;
        y.iter().map(|v| (v - my).powi(2)).sum()
    };
    if ssr <= f64::EPSILON * sst.max(f64::MIN_POSITIVE) {
        return Err(StatsError::DegenerateRegressor);
    }

    let adf_statistic = adf_tstat(&residuals, lags)?;
    Ok(Cointegration {
        hedge,
        adf_statistic,
        lags,
        critical_values: CriticalValues::for_sample(y.len().saturating_sub(1)),
    })
}

/// t-statistic of `gamma` in the no-constant ADF regression on `e`.
fn adf_tstat(e: &[f64], lags: usize) -> Result<f64, StatsError> {
    let k = lags + 1;
    // Need at least one residual degree of freedom.
    let needed = 2 * lags + 3;
    if e.len() < needed {
        return Err(StatsError::TooFewObservations {
            needed,
            got: e.len(),
        });
    }

    let diff: Vec<f64> = e.windows(2).map(|w| w[1] - w[0]).collect();

    // Row for diff index t (t >= lags): [e[t], diff[t-1], .., diff[t-lags]] -> diff[t].
    let rows: Vec<(Vec<f64>, f64)> = (lags..diff.len())
        .map(|t| {
            let mut row = Vec::with_capacity(k);
            row.push(e[t]);
            row.extend((1..=lags).map(|i| diff[t - i]));
            (row, diff[t])
        })
        .collect();
    let m = rows.len();

    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];
    for (row, target) in &rows {
        for i in 0..k {
            xty[i] += row[i] * target;
            for j in 0..k {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }

    let coef = solve(&xtx, &xty)?;
    let mut unit = vec![0.0; k];
    unit[0] = 1.0;
    // (X'X)^-1 [0][0]
    let inv00 = solve(&xtx, &unit)?[0];

    let ssr: f64 = rows
        .iter()
        .map(|(row, target)| {
            let fitted: f64 = row.iter().zip(&coef).map(|(a, b)| a * b).sum();
            (target - fitted).powi(2)
        })
        .sum();
    let sigma2 = ssr / (m - k) as f64;
    let se = (sigma2 * inv00).sqrt();
    if se == 0.0 || !se.is_finite() {
        return Err(StatsError::DegenerateRegressor);
    }
    Ok(coef[0] / se)
}

/// Gaussian elimination with partial pivoting on a small dense system.
fn solve(a: &[Vec<f64>], b: &[f64]) -> Result<Vec<f64>, StatsError> {
    let n = b.len();
    let mut m: Vec<Vec<f64>> = a
        .iter()
        .zip(b)
        .map(|(row, &rhs)| {
            let mut r = row.clone();
            r.push(rhs);
            r
        })
        .collect();

    let scale = (0..n).map(|i| a[i][i].abs()).fold(0.0, f64::max);
    let tol = scale * 1e-12;

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| m[i][col].abs().total_cmp(&m[j][col].abs()))
            .unwrap_or(col);
        if m[pivot][col].abs() <= tol {
            return Err(StatsError::DegenerateRegressor);
        }
        m.swap(col, pivot);
        for r in (col + 1)..n {
            let f = m[r][col] / m[col][col];
            for c in col..=n {
                m[r][c] -= f * m[col][c];
            }
        }
    }

    let mut out = vec![0.0; n];
    for i in (0..n).rev() {
        let tail: f64 = ((i + 1)..n).map(|j| m[i][j] * out[j]).sum();
        out[i] = (m[i][n] - tail) / m[i][i];
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::assert_approx;

    /// Deterministic uniform noise in [-0.5, 0.5).
    struct XorShift(u64);

    impl XorShift {
        fn next(&mut self) -> f64 {
            self.0 ^= self.0 << 13;
            self.0 ^= self.0 >> 7;
            self.0 ^= self.0 << 17;
            (self.0 >> 11) as f64 / (1u64 << 53) as f64 - 0.5
        }
    }

    fn random_walk(rng: &mut XorShift, n: usize, start: f64) -> Vec<f64> {
        let mut level = start;
        (0..n)
            .map(|_| {
                level += rng.next();
                level
            })
            .collect()
    }

    #[test]
    fn critical_values_match_published_table() {
        // MacKinnon (2010) asymptotic values for two variables.
        let cv = CriticalValues::for_sample(usize::MAX);
        assert_approx(cv.one_pct, -3.89644, 1e-9);
        assert_approx(cv.five_pct, -3.33613, 1e-9);
        assert_approx(cv.ten_pct, -3.04445, 1e-9);

        let small = CriticalValues::for_sample(100);
        assert!(small.one_pct < small.five_pct && small.five_pct < small.ten_pct);
        assert!(small.five_pct < cv.five_pct);
    }

    #[test]
    fn stationary_spread_is_cointegrated() {
        let mut rng = XorShift(0x9E37_79B9_7F4A_7C15);
        let x = random_walk(&mut rng, 500, 100.0);
        let y: Vec<f64> = x.iter().map(|v| 10.0 + 1.5 * v + rng.next()).collect();

        let result = cointegration(&y, &x).unwrap();
        assert_approx(result.hedge.beta, 1.5, 0.05);
        assert!(result.is_cointegrated(), "adf = {}", result.adf_statistic);
        assert_eq!(result.significance(), Some(0.01));
    }

    #[test]
    fn independent_random_walks_are_not_cointegrated() {
        let mut rng = XorShift(0x2545_F491_4F6C_DD1D);
        let x = random_walk(&mut rng, 500, 100.0);
        let y = random_walk(&mut rng, 500, 50.0);

        let result = cointegration(&y, &x).unwrap();
        assert!(!result.is_cointegrated(), "adf = {}", result.adf_statistic);
    }

    #[test]
    fn exact_linear_pair_is_degenerate() {
        let x: Vec<f64> = (1..=20).map(|i| i as f64 * 1.3).collect();
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v + 1.0).collect();
        assert_eq!(cointegration(&y, &x), Err(StatsError::DegenerateRegressor));
    }

    #[test]
    fn short_series_is_rejected() {
        let x = [1.0, 2.0, 4.0, 3.0];
        let y = [2.0, 1.0, 3.0, 5.0];
        assert_eq!(
            cointegration(&y, &x),
            Err(StatsError::TooFewObservations { needed: 5, got: 4 })
        );
    }

    #[test]
    fn solver_recovers_known_system() {
        let a = vec![vec![2.0, 1.0], vec![1.0, 3.0]];
        let x = solve(&a, &[5.0, 10.0]).unwrap();
        assert_approx(x[0], 1.0, 1e-12);
        assert_approx(x[1], 3.0, 1e-12);
        assert!(solve(&[vec![1.0, 2.0], vec![2.0, 4.0]], &[1.0, 2.0]).is_err());
    }
}
