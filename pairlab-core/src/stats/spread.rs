//! Element-wise spread of two aligned series.

use super::StatsError;

/// `a[i] - b[i]` for every index.
///
/// Two empty inputs give a valid empty spread; any length difference is an
/// error.
pub fn spread(a: &[f64], b: &[f64]) -> Result<Vec<f64>, StatsError> {
    if a.len() != b.len() {
        return Err(StatsError::LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    Ok(a.iter().zip(b).map(|(x, y)| x - y).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spread_basic() {
        assert_eq!(
            spread(&[5.0, 6.0, 7.0], &[2.0, 2.0, 2.0]).unwrap(),
            vec![3.0, 4.0, 5.0]
        );
    }

    #[test]
    fn spread_length_mismatch() {
        assert_eq!(
            spread(&[1.0, 2.0], &[1.0]),
            Err(StatsError::LengthMismatch { left: 2, right: 1 })
        );
    }

    #[test]
    fn spread_of_empty_inputs_is_empty_not_error() {
        assert_eq!(spread(&[], &[]), Ok(vec![]));
    }
}
