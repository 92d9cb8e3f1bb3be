//! Domain types for PairLab

pub mod interval;
pub mod series;

pub use interval::{Interval, IntervalParseError};
pub use series::{PricePoint, PriceSeries, SeriesError};
