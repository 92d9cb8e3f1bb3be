//! Quote provider trait and structured error types.
//!
//! The QuoteProvider trait abstracts over quote sources so the pipeline can
//! run against a stub in tests. Trailing-window filtering is applied here,
//! above the provider, so every source gets the same windowing rules.

use crate::domain::{Interval, PriceSeries, SeriesError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Structured error types for quote fetching.
///
/// `NetworkUnreachable`, `HttpStatus` and `Provider` are transport-level
/// failures. The remaining variants mean a response arrived but could not be
/// decoded into a price series.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("HTTP {status} fetching {symbol}")]
    HttpStatus { status: u16, symbol: String },

    #[error("quote provider rejected request for {symbol}: {message}")]
    Provider { symbol: String, message: String },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("close for {symbol} on {date} is not a valid price: '{raw}'")]
    InvalidPrice {
        symbol: String,
        date: NaiveDate,
        raw: String,
    },

    #[error("no price data returned for {symbol}")]
    EmptySeries { symbol: String },

    #[error(transparent)]
    Series(#[from] SeriesError),

    #[error("HTTP client setup failed: {0}")]
    Client(String),
}

impl DataError {
    /// True for errors raised before a usable response body was received.
    pub fn is_fetch_error(&self) -> bool {
        matches!(
            self,
            DataError::NetworkUnreachable(_)
                | DataError::HttpStatus { .. }
                | DataError::Provider { .. }
                | DataError::Client(_)
        )
    }
}

/// Restrict a fetched series to a trailing period relative to `as_of`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrailingWindow {
    pub as_of: NaiveDate,
    pub lookback_days: i64,
    pub max_samples: Option<usize>,
}

impl TrailingWindow {
    /// One year back from `as_of`, capped to `max_samples` periods.
    pub fn one_year(as_of: NaiveDate, max_samples: Option<usize>) -> Self {
        Self {
            as_of,
            lookback_days: 365,
            max_samples,
        }
    }
}

/// What to fetch: one symbol at one interval, optionally windowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub symbol: String,
    pub interval: Interval,
    pub window: Option<TrailingWindow>,
}

impl FetchRequest {
    pub fn new(symbol: impl Into<String>, interval: Interval) -> Self {
        Self {
            symbol: symbol.into(),
            interval,
            window: None,
        }
    }

    pub fn with_window(mut self, window: TrailingWindow) -> Self {
        self.window = Some(window);
        self
    }
}

/// Trait for quote sources.
///
/// Implementations return the full chronological series the source has for
/// the symbol; windowing is handled by [`fetch_series`].
pub trait QuoteProvider {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch closing prices for `symbol` sampled at `interval`.
    fn fetch(&self, symbol: &str, interval: Interval) -> Result<PriceSeries, DataError>;
}

/// Fetch a series through `provider` and apply the request's trailing window.
///
/// An empty result after windowing is an error: nothing downstream can use it.
pub fn fetch_series(
    provider: &dyn QuoteProvider,
    request: &FetchRequest,
) -> Result<PriceSeries, DataError> {
    info!(
        provider = provider.name(),
        symbol = %request.symbol,
        interval = %request.interval,
        "fetching quotes"
    );
    let full = provider.fetch(&request.symbol, request.interval)?;

    let series = match request.window {
        Some(w) => {
            let windowed = full.trailing(w.as_of, w.lookback_days, w.max_samples);
            let dropped = full.len() - windowed.len();
            if dropped > 0 {
                warn!(
                    symbol = %request.symbol,
                    kept = windowed.len(),
                    dropped,
                    "trailing window truncated series"
                );
            } else {
                debug!(symbol = %request.symbol, "trailing window kept every period");
            }
            windowed
        }
        None => full,
    };

    if series.is_empty() {
        return Err(DataError::EmptySeries {
            symbol: request.symbol.clone(),
        });
    }

    info!(symbol = %request.symbol, points = series.len(), "quotes ready");
    Ok(series)
}
