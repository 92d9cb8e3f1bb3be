//! Pair configuration loaded from TOML, with credentials from the environment.
//!
//! Nothing secret lives in the config file. The quote API key is read from
//! `ALPHAVANTAGE_API_KEY` after `.env` (if any) has been loaded.

use chrono::NaiveDate;
use pairlab_core::data::alpha_vantage::DEFAULT_BASE_URL;
use pairlab_core::data::{FetchRequest, TrailingWindow};
use pairlab_core::domain::Interval;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const API_KEY_VAR: &str = "ALPHAVANTAGE_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("missing credential: set {0} (environment or .env)")]
    MissingCredential(&'static str),
}

/// The two legs and their sampling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairSection {
    pub left: String,
    pub right: String,
    #[serde(default)]
    pub interval: Interval,
}

/// Optional trailing window applied at fetch time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WindowSection {
    pub trailing_days: Option<i64>,
    pub max_samples: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSection {
    #[serde(default = "default_sma_windows")]
    pub sma_windows: Vec<usize>,
    /// When set, backtests use the causal rolling classifier.
    pub rolling_window: Option<usize>,
}

impl Default for StatsSection {
    fn default() -> Self {
        Self {
            sma_windows: default_sma_windows(),
            rolling_window: None,
        }
    }
}

fn default_sma_windows() -> Vec<usize> {
    vec![20, 50]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSection {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiSection {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

/// Full configuration for one pair run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairConfig {
    pub pair: PairSection,
    #[serde(default)]
    pub window: WindowSection,
    #[serde(default)]
    pub stats: StatsSection,
    #[serde(default)]
    pub output: OutputSection,
    #[serde(default)]
    pub api: ApiSection,
}

impl PairConfig {
    /// Config with defaults for everything but the pair itself.
    pub fn for_pair(left: impl Into<String>, right: impl Into<String>, interval: Interval) -> Self {
        Self {
            pair: PairSection {
                left: left.into(),
                right: right.into(),
                interval,
            },
            window: WindowSection::default(),
            stats: StatsSection::default(),
            output: OutputSection::default(),
            api: ApiSection::default(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let left = self.pair.left.trim();
        let right = self.pair.right.trim();
        if left.is_empty() || right.is_empty() {
            return Err(ConfigError::Invalid("pair symbols must not be empty".into()));
        }
        if left.eq_ignore_ascii_case(right) {
            return Err(ConfigError::Invalid(format!(
                "pair legs must differ (both are '{left}')"
            )));
        }
        if let Some(w) = self.stats.sma_windows.iter().find(|w| **w == 0) {
            return Err(ConfigError::Invalid(format!("sma window must be >= 1, got {w}")));
        }
        if self.stats.rolling_window == Some(0) {
            return Err(ConfigError::Invalid("rolling_window must be >= 1".into()));
        }
        if self.window.max_samples == Some(0) {
            return Err(ConfigError::Invalid("max_samples must be >= 1".into()));
        }
        if matches!(self.window.trailing_days, Some(d) if d <= 0) {
            return Err(ConfigError::Invalid("trailing_days must be positive".into()));
        }
        Ok(())
    }

    /// Trailing window relative to `as_of`, if one is configured.
    ///
    /// A sample cap without a day count still applies, over a one-year lookback.
    pub fn trailing_window(&self, as_of: NaiveDate) -> Option<TrailingWindow> {
        match (self.window.trailing_days, self.window.max_samples) {
            (None, None) => None,
            (days, max_samples) => Some(TrailingWindow {
                as_of,
                lookback_days: days.unwrap_or(365),
                max_samples,
            }),
        }
    }

    /// Fetch requests for the left and right legs.
    pub fn requests(&self, as_of: NaiveDate) -> (FetchRequest, FetchRequest) {
        let build = |symbol: &str| {
            let req = FetchRequest::new(symbol.trim().to_uppercase(), self.pair.interval);
            match self.trailing_window(as_of) {
                Some(w) => req.with_window(w),
                None => req,
            }
        };
        (build(&self.pair.left), build(&self.pair.right))
    }
}

/// Load `.env` if present, then read the quote API key.
pub fn api_key_from_env() -> Result<String, ConfigError> {
    // A missing .env is normal; real environment variables still apply.
    let _ = dotenvy::dotenv();
    std::env::var(API_KEY_VAR)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::MissingCredential(API_KEY_VAR))
}
