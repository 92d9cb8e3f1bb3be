//! Alpaca positions API (read-only).

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const PAPER_BASE_URL: &str = "https://paper-api.alpaca.markets";

pub const KEY_ID_VAR: &str = "APCA_API_KEY_ID";
pub const SECRET_KEY_VAR: &str = "APCA_API_SECRET_KEY";
pub const BASE_URL_VAR: &str = "APCA_API_BASE_URL";

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("missing credential: set {0}")]
    MissingCredential(&'static str),

    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("HTTP {status} from broker: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("unexpected broker response: {0}")]
    Decode(String),
}

/// API key pair plus endpoint.
///
/// `Debug` redacts the secret.
#[derive(Clone)]
pub struct AlpacaCredentials {
    pub key_id: String,
    pub secret_key: String,
    pub base_url: String,
}

impl std::fmt::Debug for AlpacaCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlpacaCredentials")
            .field("key_id", &self.key_id)
            .field("secret_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl AlpacaCredentials {
    /// Read credentials from `APCA_API_KEY_ID` / `APCA_API_SECRET_KEY`.
    /// The base URL falls back to the paper-trading endpoint.
    pub fn from_env() -> Result<Self, BrokerError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, BrokerError> {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Ok(Self {
            key_id: non_empty(KEY_ID_VAR).ok_or(BrokerError::MissingCredential(KEY_ID_VAR))?,
            secret_key: non_empty(SECRET_KEY_VAR)
                .ok_or(BrokerError::MissingCredential(SECRET_KEY_VAR))?,
            base_url: non_empty(BASE_URL_VAR).unwrap_or_else(|| PAPER_BASE_URL.to_string()),
        })
    }
}

/// Wire format of one position. Quantities arrive as decimal strings.
#[derive(Debug, Deserialize)]
struct PositionWire {
    symbol: String,
    qty: String,
    #[serde(default)]
    side: Option<String>,
    #[serde(default)]
    avg_entry_price: Option<String>,
    #[serde(default)]
    market_value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeldPosition {
    pub symbol: String,
    pub qty: f64,
    pub side: String,
    pub avg_entry_price: Option<f64>,
    pub market_value: Option<f64>,
}

impl TryFrom<PositionWire> for HeldPosition {
    type Error = BrokerError;

    fn try_from(w: PositionWire) -> Result<Self, Self::Error> {
        let qty = w.qty.trim().parse::<f64>().map_err(|_| {
            BrokerError::Decode(format!("qty '{}' for {} is not a number", w.qty, w.symbol))
        })?;
        let optional = |v: Option<String>| v.and_then(|s| s.trim().parse::<f64>().ok());
        Ok(Self {
            symbol: w.symbol,
            qty,
            side: w.side.unwrap_or_else(|| "long".to_string()),
            avg_entry_price: optional(w.avg_entry_price),
            market_value: optional(w.market_value),
        })
    }
}

pub struct AlpacaClient {
    client: reqwest::blocking::Client,
    credentials: AlpacaCredentials,
}

impl AlpacaClient {
    pub fn new(credentials: AlpacaCredentials) -> Result<Self, BrokerError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| BrokerError::NetworkUnreachable(e.to_string()))?;
        Ok(Self {
            client,
            credentials,
        })
    }

    fn get(&self, path: &str) -> Result<Option<String>, BrokerError> {
        let url = format!(
            "{}/{}",
            self.credentials.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        let resp = self
            .client
            .get(url)
            .header("APCA-API-KEY-ID", &self.credentials.key_id)
            .header("APCA-API-SECRET-KEY", &self.credentials.secret_key)
            .send()
            .map_err(|e| BrokerError::NetworkUnreachable(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = resp
            .text()
            .map_err(|e| BrokerError::NetworkUnreachable(e.to_string()))?;
        if !status.is_success() {
            return Err(BrokerError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }
        Ok(Some(body))
    }

    /// Open position in `symbol`, or `None` when nothing is held.
    pub fn position(&self, symbol: &str) -> Result<Option<HeldPosition>, BrokerError> {
        match self.get(&format!("v2/positions/{symbol}"))? {
            Some(body) => parse_position(&body).map(Some),
            None => Ok(None),
        }
    }

    /// Every open position in the account.
    pub fn positions(&self) -> Result<Vec<HeldPosition>, BrokerError> {
        match self.get("v2/positions")? {
            Some(body) => parse_positions(&body),
            None => Ok(Vec::new()),
        }
    }
}

fn parse_position(body: &str) -> Result<HeldPosition, BrokerError> {
    let wire: PositionWire =
        serde_json::from_str(body).map_err(|e| BrokerError::Decode(e.to_string()))?;
    wire.try_into()
}

fn parse_positions(body: &str) -> Result<Vec<HeldPosition>, BrokerError> {
    let wires: Vec<PositionWire> =
        serde_json::from_str(body).map_err(|e| BrokerError::Decode(e.to_string()))?;
    wires.into_iter().map(HeldPosition::try_from).collect()
}
