//! Simple Moving Average (SMA).
//!
//! Only full windows are emitted: a series of length `n` gives `n - window + 1`
//! values, and value `j` is the mean of `series[j..j + window]`.

use super::StatsError;

pub fn sma(series: &[f64], window: usize) -> Result<Vec<f64>, StatsError> {
    let n = series.len();
    if window == 0 || window > n {
        return Err(StatsError::InvalidWindow { window, len: n });
    }

    let w = window as f64;
    let mut result = Vec::with_capacity(n - window + 1);

    let mut sum: f64 = series[..window].iter().sum();
    result.push(sum / w);

    // Roll the window forward
    for i in window..n {
        sum += series[i] - series[i - window];
        result.push(sum / w);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn sma_3_basic() {
        assert_eq!(sma(&[1.0, 2.0, 3.0, 4.0, 5.0], 3).unwrap(), vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn sma_5_rolls() {
        let result = sma(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0], 5).unwrap();
        assert_eq!(result.len(), 3);
        assert_approx(result[0], 12.0, DEFAULT_EPSILON);
        assert_approx(result[1], 13.0, DEFAULT_EPSILON);
        assert_approx(result[2], 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_1_is_identity() {
        assert_eq!(sma(&[100.0, 200.0, 300.0], 1).unwrap(), vec![100.0, 200.0, 300.0]);
    }

    #[test]
    fn sma_full_window_is_mean() {
        let result = sma(&[2.0, 4.0, 9.0], 3).unwrap();
        assert_eq!(result.len(), 1);
        assert_approx(result[0], 5.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_zero_window_is_error() {
        assert_eq!(
            sma(&[1.0, 2.0], 0),
            Err(StatsError::InvalidWindow { window: 0, len: 2 })
        );
    }

    #[test]
    fn sma_window_longer_than_series_is_error() {
        assert_eq!(
            sma(&[10.0, 11.0], 5),
            Err(StatsError::InvalidWindow { window: 5, len: 2 })
        );
        assert!(sma(&[], 1).is_err());
    }
}
