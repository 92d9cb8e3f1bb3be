//! PairLab Runner: pair pipeline orchestration, output files, configuration.
//!
//! This crate builds on `pairlab-core` to provide:
//! - TOML pair configuration and credential lookup
//! - The fetch → align → spread → z-score → signal pipeline
//! - CSV export of computed series
//! - Self-contained HTML line charts
//! - Logging setup shared by the binaries

pub mod chart;
pub mod config;
pub mod export;
pub mod logging;
pub mod pipeline;

pub use chart::{render_html, write_html, LineChart, LineSeries};
pub use config::{api_key_from_env, ConfigError, PairConfig, API_KEY_VAR};
pub use export::{export_series_csv, read_series, write_json, write_series};
pub use logging::{init_logging, LogFormat};
pub use pipeline::{
    align_legs, analyze_backtest, analyze_sma, analyze_spread, analyze_zscore, fetch_pair,
    run_backtest, run_pair, run_sma, run_spread, run_zscore, write_closes, write_sma_artifacts,
    write_spread_artifacts, write_zscore_artifacts,
    BacktestAnalysis, Classifier, PairReport, PipelineError, SmaAnalysis, SpreadAnalysis,
    ZScoreAnalysis,
};
