//! Pair time alignment.
//!
//! Two symbols rarely report exactly the same periods (listing dates,
//! halts, holidays on one exchange). Spread math is positional, so both legs
//! are reduced to the dates they share before any statistic is computed.

use crate::domain::PriceSeries;
use chrono::NaiveDate;
use std::collections::HashMap;

/// Two legs reduced to a common timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedPair {
    pub left_symbol: String,
    pub right_symbol: String,
    /// The shared date axis (sorted ascending).
    pub dates: Vec<NaiveDate>,
    /// Left leg closes, one per entry of `dates`.
    pub left: Vec<f64>,
    /// Right leg closes, one per entry of `dates`.
    pub right: Vec<f64>,
    /// Periods present only in the left leg.
    pub dropped_left: usize,
    /// Periods present only in the right leg.
    pub dropped_right: usize,
}

impl AlignedPair {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Inner-join two series on date.
///
/// Unlike a union with NaN fill, no synthetic prices are introduced: every
/// value in the result is a real close.
pub fn align_pair(left: &PriceSeries, right: &PriceSeries) -> AlignedPair {
    let right_by_date: HashMap<NaiveDate, f64> =
        right.points().iter().map(|p| (p.date, p.close)).collect();

    let mut dates = Vec::with_capacity(left.len().min(right.len()));
    let mut left_vals = Vec::with_capacity(dates.capacity());
    let mut right_vals = Vec::with_capacity(dates.capacity());

    // Left is already ascending, so the output is too.
    for p in left.points() {
        if let Some(&r) = right_by_date.get(&p.date) {
            dates.push(p.date);
            left_vals.push(p.close);
            right_vals.push(r);
        }
    }

    AlignedPair {
        left_symbol: left.symbol().to_string(),
        right_symbol: right.symbol().to_string(),
        dropped_left: left.len() - dates.len(),
        dropped_right: right.len() - dates.len(),
        dates,
        left: left_vals,
        right: right_vals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Interval, PricePoint};

    fn series(symbol: &str, points: &[(&str, f64)]) -> PriceSeries {
        PriceSeries::new(
            symbol,
            Interval::Daily,
            points
                .iter()
                .map(|(date, close)| {
                    PricePoint::new(NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(), *close)
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn align_keeps_only_shared_dates() {
        let spy = series(
            "SPY",
            &[("2024-01-02", 100.0), ("2024-01-03", 101.0), ("2024-01-04", 102.0)],
        );
        let qqq = series(
            "QQQ",
            &[
                ("2024-01-02", 200.0),
                // QQQ missing 2024-01-03
                ("2024-01-04", 202.0),
                ("2024-01-05", 203.0),
            ],
        );

        let aligned = align_pair(&spy, &qqq);

        assert_eq!(aligned.len(), 2);
        assert_eq!(aligned.left, vec![100.0, 102.0]);
        assert_eq!(aligned.right, vec![200.0, 202.0]);
        assert_eq!(aligned.dropped_left, 1);
        assert_eq!(aligned.dropped_right, 1);
        assert_eq!(aligned.left_symbol, "SPY");
        assert_eq!(aligned.right_symbol, "QQQ");
    }

    #[test]
    fn identical_timelines_drop_nothing() {
        let a = series("A", &[("2024-01-02", 1.0), ("2024-01-03", 2.0)]);
        let b = series("B", &[("2024-01-02", 3.0), ("2024-01-03", 4.0)]);

        let aligned = align_pair(&a, &b);
        assert_eq!(aligned.len(), 2);
        assert_eq!(aligned.dropped_left, 0);
        assert_eq!(aligned.dropped_right, 0);
    }

    #[test]
    fn disjoint_timelines_align_to_nothing() {
        let a = series("A", &[("2024-01-02", 1.0)]);
        let b = series("B", &[("2024-02-02", 3.0)]);
        assert!(align_pair(&a, &b).is_empty());
    }
}
