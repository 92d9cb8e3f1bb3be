//! Price series, the chronological closing prices of one symbol.

use super::interval::Interval;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One sampled period: the period label (as a date) and its closing price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("close on {date} is not a finite non-negative price: {value}")]
    InvalidClose { date: NaiveDate, value: f64 },

    #[error("dates out of order at index {index}: {previous} is not before {date}")]
    NotChronological {
        index: usize,
        previous: NaiveDate,
        date: NaiveDate,
    },
}

/// Chronologically ascending closing prices for a single symbol.
///
/// Invariants, checked by [`PriceSeries::new`]:
/// - every close is finite and >= 0
/// - dates are strictly increasing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: String,
    interval: Interval,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(
        symbol: impl Into<String>,
        interval: Interval,
        points: Vec<PricePoint>,
    ) -> Result<Self, SeriesError> {
        for (i, p) in points.iter().enumerate() {
            if !p.close.is_finite() || p.close < 0.0 {
                return Err(SeriesError::InvalidClose {
                    date: p.date,
                    value: p.close,
                });
            }
            if i > 0 && points[i - 1].date >= p.date {
                return Err(SeriesError::NotChronological {
                    index: i,
                    previous: points[i - 1].date,
                    date: p.date,
                });
            }
        }
        Ok(Self {
            symbol: symbol.into(),
            interval,
            points,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Closing prices in chronological order.
    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    /// Keep periods dated on or after `as_of - lookback_days`, then keep at
    /// most the `max_samples` most recent of those.
    ///
    /// Filtering preserves order, so the result still satisfies the series
    /// invariants.
    pub fn trailing(
        &self,
        as_of: NaiveDate,
        lookback_days: i64,
        max_samples: Option<usize>,
    ) -> Self {
        // Lookbacks reaching past the calendar's start keep everything.
        let cutoff = as_of
            .checked_sub_days(Days::new(u64::try_from(lookback_days).unwrap_or(0)))
            .unwrap_or(NaiveDate::MIN);
        let mut points: Vec<PricePoint> = self
            .points
            .iter()
            .copied()
            .filter(|p| p.date >= cutoff && p.date <= as_of)
            .collect();

        if let Some(cap) = max_samples {
            if points.len() > cap {
                points.drain(..points.len() - cap);
            }
        }

        Self {
            symbol: self.symbol.clone(),
            interval: self.interval,
            points,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn series(points: &[(&str, f64)]) -> PriceSeries {
        PriceSeries::new(
            "SPY",
            Interval::Daily,
            points.iter().map(|(date, c)| PricePoint::new(d(date), *c)).collect(),
        )
        .unwrap()
    }

    #[test]
    fn rejects_negative_close() {
        let err = PriceSeries::new(
            "SPY",
            Interval::Daily,
            vec![PricePoint::new(d("2024-01-02"), -1.0)],
        )
        .unwrap_err();
        assert!(matches!(err, SeriesError::InvalidClose { .. }));
    }

    #[test]
    fn rejects_nan_close() {
        let err = PriceSeries::new(
            "SPY",
            Interval::Daily,
            vec![PricePoint::new(d("2024-01-02"), f64::NAN)],
        )
        .unwrap_err();
        assert!(matches!(err, SeriesError::InvalidClose { .. }));
    }

    #[test]
    fn rejects_out_of_order_dates() {
        let err = PriceSeries::new(
            "SPY",
            Interval::Daily,
            vec![
                PricePoint::new(d("2024-01-03"), 1.0),
                PricePoint::new(d("2024-01-02"), 1.0),
            ],
        )
        .unwrap_err();
        assert_eq!(
            err,
            SeriesError::NotChronological {
                index: 1,
                previous: d("2024-01-03"),
                date: d("2024-01-02"),
            }
        );
    }

    #[test]
    fn zero_close_is_allowed() {
        let s = series(&[("2024-01-02", 0.0)]);
        assert_eq!(s.closes(), vec![0.0]);
    }

    #[test]
    fn trailing_drops_old_periods() {
        let s = series(&[
            ("2022-06-01", 1.0),
            ("2023-06-03", 2.0),
            ("2024-01-02", 3.0),
            ("2024-05-01", 4.0),
        ]);
        let t = s.trailing(d("2024-06-01"), 365, None);
        assert_eq!(t.closes(), vec![2.0, 3.0, 4.0]);
        assert_eq!(t.symbol(), "SPY");
    }

    #[test]
    fn trailing_year_spanning_leap_day_is_365_days() {
        // 2023-06-01 .. 2024-06-01 is 366 days because of 2024-02-29.
        let s = series(&[
            ("2023-06-01", 1.0),
            ("2023-06-02", 2.0),
            ("2024-06-01", 3.0),
        ]);
        let t = s.trailing(d("2024-06-01"), 365, None);
        assert_eq!(t.first_date(), Some(d("2023-06-02")));
        assert_eq!(t.closes(), vec![2.0, 3.0]);
    }

    #[test]
    fn huge_lookback_keeps_everything() {
        let s = series(&[("1990-01-02", 1.0), ("2024-01-02", 2.0)]);
        let t = s.trailing(d("2024-06-01"), 10_000_000_000, None);
        assert_eq!(t.closes(), vec![1.0, 2.0]);
        let t = s.trailing(d("2024-06-01"), i64::MAX, Some(1));
        assert_eq!(t.closes(), vec![2.0]);
    }

    #[test]
    fn trailing_caps_to_most_recent_samples() {
        let s = series(&[
            ("2024-01-02", 1.0),
            ("2024-01-03", 2.0),
            ("2024-01-04", 3.0),
            ("2024-01-05", 4.0),
        ]);
        let t = s.trailing(d("2024-01-10"), 365, Some(2));
        assert_eq!(t.closes(), vec![3.0, 4.0]);
        assert_eq!(t.first_date(), Some(d("2024-01-04")));
    }

    #[test]
    fn trailing_excludes_future_periods() {
        let s = series(&[("2024-01-02", 1.0), ("2024-02-02", 2.0)]);
        let t = s.trailing(d("2024-01-15"), 365, None);
        assert_eq!(t.closes(), vec![1.0]);
    }
}
