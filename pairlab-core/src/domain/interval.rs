//! Sampling interval of a quote series.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// How often a price series is sampled.
///
/// Each interval maps to one quote API function and to the JSON key the
/// series is returned under. Weekly data comes from the adjusted endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interval {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl Interval {
    pub const ALL: [Interval; 3] = [Interval::Daily, Interval::Weekly, Interval::Monthly];

    /// Quote API `function` query parameter.
    pub fn api_function(self) -> &'static str {
        match self {
            Interval::Daily => "TIME_SERIES_DAILY",
            Interval::Weekly => "TIME_SERIES_WEEKLY_ADJUSTED",
            Interval::Monthly => "TIME_SERIES_MONTHLY",
        }
    }

    /// Top-level JSON key holding the period map.
    pub fn series_key(self) -> &'static str {
        match self {
            Interval::Daily => "Time Series (Daily)",
            Interval::Weekly => "Weekly Adjusted Time Series",
            Interval::Monthly => "Monthly Time Series",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Interval::Daily => "daily",
            Interval::Weekly => "weekly",
            Interval::Monthly => "monthly",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown interval '{0}' (expected daily, weekly or monthly)")]
pub struct IntervalParseError(pub String);

impl FromStr for Interval {
    type Err = IntervalParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" | "d" => Ok(Interval::Daily),
            "weekly" | "w" => Ok(Interval::Weekly),
            "monthly" | "m" => Ok(Interval::Monthly),
            _ => Err(IntervalParseError(s.to_string())),
        }
    }
}
