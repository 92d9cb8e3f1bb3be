//! Alpha Vantage quote provider.
//!
//! Fetches daily, weekly (adjusted) and monthly series from the `/query`
//! endpoint. The response is a map of period label to price fields, keyed by
//! an interval-dependent series name, with no ordering guarantee. Decoding
//! goes straight into typed structs keyed by `NaiveDate`, which also sorts the
//! periods.
//!
//! A single request is made per fetch. Failures are returned, never retried.

use super::provider::{DataError, QuoteProvider};
use crate::domain::{Interval, PricePoint, PriceSeries};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co";

/// Fields of one period entry that we read. Other fields are ignored.
#[derive(Debug, Deserialize)]
struct PeriodEntry {
    #[serde(rename = "4. close")]
    close: String,
}

/// Keys the API uses to report a rejected request inside a 200 response.
const PROVIDER_MESSAGE_KEYS: [&str; 3] = ["Error Message", "Note", "Information"];

pub struct AlphaVantageProvider {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
}

impl AlphaVantageProvider {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DataError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    fn query_endpoint(&self) -> String {
        format!("{}/query", self.base_url.trim_end_matches('/'))
    }

    /// Decode a response body into a price series.
    pub fn parse_response(
        symbol: &str,
        interval: Interval,
        body: &str,
    ) -> Result<PriceSeries, DataError> {
        let mut top: Map<String, Value> = serde_json::from_str(body).map_err(|e| {
            DataError::ResponseFormatChanged(format!(
                "response for {symbol} is not a JSON object: {e}"
            ))
        })?;

        for key in PROVIDER_MESSAGE_KEYS {
            if let Some(message) = top.get(key).and_then(Value::as_str) {
                return Err(DataError::Provider {
                    symbol: symbol.to_string(),
                    message: message.to_string(),
                });
            }
        }

        let key = interval.series_key();
        let raw = top.remove(key).ok_or_else(|| {
            DataError::ResponseFormatChanged(format!("missing '{key}' in response for {symbol}"))
        })?;

        let periods: BTreeMap<NaiveDate, PeriodEntry> = serde_json::from_value(raw).map_err(|e| {
            DataError::ResponseFormatChanged(format!("malformed '{key}' for {symbol}: {e}"))
        })?;

        let mut points = Vec::with_capacity(periods.len());
        for (date, entry) in periods {
            let close = parse_close(&entry.close).ok_or_else(|| DataError::InvalidPrice {
                symbol: symbol.to_string(),
                date,
                raw: entry.close.clone(),
            })?;
            points.push(PricePoint::new(date, close));
        }

        if points.is_empty() {
            return Err(DataError::EmptySeries {
                symbol: symbol.to_string(),
            });
        }

        Ok(PriceSeries::new(symbol, interval, points)?)
    }
}

fn parse_close(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

impl QuoteProvider for AlphaVantageProvider {
    fn name(&self) -> &str {
        "alpha_vantage"
    }

    fn fetch(&self, symbol: &str, interval: Interval) -> Result<PriceSeries, DataError> {
        debug!(symbol, function = interval.api_function(), "GET /query");

        // without_url() keeps the api key out of error messages.
        let resp = self
            .client
            .get(self.query_endpoint())
            .query(&[
                ("function", interval.api_function()),
                ("symbol", symbol),
                ("outputsize", "full"),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .map_err(|e| DataError::NetworkUnreachable(e.without_url().to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DataError::HttpStatus {
                status: status.as_u16(),
                symbol: symbol.to_string(),
            });
        }

        let body = resp
            .text()
            .map_err(|e| DataError::NetworkUnreachable(e.without_url().to_string()))?;

        Self::parse_response(symbol, interval, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_close_accepts_decimal_text() {
        assert_eq!(parse_close("470.5000"), Some(470.5));
        assert_eq!(parse_close(" 12 "), Some(12.0));
    }

    #[test]
    fn parse_close_rejects_garbage_and_negatives() {
        assert_eq!(parse_close("n/a"), None);
        assert_eq!(parse_close("-3.0"), None);
        assert_eq!(parse_close("NaN"), None);
        assert_eq!(parse_close(""), None);
    }

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        let p = AlphaVantageProvider::new("http://localhost:9/", "k").unwrap();
        assert_eq!(p.query_endpoint(), "http://localhost:9/query");
    }

    #[test]
    fn monthly_series_is_read_from_its_own_key() {
        let body = r#"{
            "Meta Data": {"1. Information": "Monthly Prices"},
            "Monthly Time Series": {
                "2024-02-29": {"1. open": "1", "4. close": "20.5"},
                "2024-01-31": {"1. open": "1", "4. close": "19.25"}
            }
        }"#;
        let s = AlphaVantageProvider::parse_response("IBM", Interval::Monthly, body).unwrap();
        assert_eq!(s.closes(), vec![19.25, 20.5]);
        assert_eq!(s.interval(), Interval::Monthly);
    }

    #[test]
    fn wrong_interval_key_is_format_error() {
        let body = r#"{"Monthly Time Series": {"2024-01-31": {"4. close": "1"}}}"#;
        let err = AlphaVantageProvider::parse_response("IBM", Interval::Daily, body).unwrap_err();
        assert!(matches!(err, DataError::ResponseFormatChanged(_)));
    }
}
