//! Pair pipeline. Wires together fetching, alignment, statistics and output.
//!
//! The analysis functions are pure given their inputs and return
//! [`PipelineError`]. The `write_*` functions turn analyses into files and
//! return `anyhow::Result`. [`run_pair`] does everything for one configured
//! pair and stops at the first error.

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use pairlab_core::data::{
    align_pair, fetch_series, AlignedPair, DataError, FetchRequest, QuoteProvider,
};
use pairlab_core::domain::{Interval, PriceSeries};
use pairlab_core::signals::{classify, classify_rolling, step, Signal, TradeEvent};
use pairlab_core::stats::{
    cointegration, hedge_ratio, sma, spread, zscores, Cointegration, Regression, StatsError,
    ZScores,
};

use crate::chart::{write_html, LineChart};
use crate::config::PairConfig;
use crate::export::{write_json, write_series};

/// Errors from the analysis stages.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("data error: {0}")]
    Data(#[from] DataError),
    #[error("statistics error: {0}")]
    Stats(#[from] StatsError),
    #[error("{left} and {right} have no periods in common")]
    NoOverlap { left: String, right: String },
}

// ─── Fetch ──────────────────────────────────────────────────────────

/// Fetch both legs of the configured pair and align them on date.
pub fn fetch_pair(
    provider: &dyn QuoteProvider,
    config: &PairConfig,
    as_of: NaiveDate,
) -> Result<AlignedPair, PipelineError> {
    let (left_req, right_req) = config.requests(as_of);
    let left = fetch_series(provider, &left_req)?;
    let right = fetch_series(provider, &right_req)?;
    align_legs(&left, &right)
}

/// Align two fetched legs, logging any periods only one side has.
pub fn align_legs(left: &PriceSeries, right: &PriceSeries) -> Result<AlignedPair, PipelineError> {
    let aligned = align_pair(left, right);
    if aligned.dropped_left > 0 || aligned.dropped_right > 0 {
        warn!(
            left = %aligned.left_symbol,
            right = %aligned.right_symbol,
            dropped_left = aligned.dropped_left,
            dropped_right = aligned.dropped_right,
            "legs report different periods; keeping shared dates only"
        );
    }
    if aligned.is_empty() {
        return Err(PipelineError::NoOverlap {
            left: aligned.left_symbol,
            right: aligned.right_symbol,
        });
    }
    Ok(aligned)
}

// ─── Analyses ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct SpreadAnalysis {
    pub left_symbol: String,
    pub right_symbol: String,
    pub dates: Vec<NaiveDate>,
    pub left: Vec<f64>,
    pub right: Vec<f64>,
    pub spread: Vec<f64>,
}

impl SpreadAnalysis {
    pub fn label(&self) -> String {
        format!("{} - {}", self.left_symbol, self.right_symbol)
    }
}

pub fn analyze_spread(pair: &AlignedPair) -> Result<SpreadAnalysis, PipelineError> {
    Ok(SpreadAnalysis {
        left_symbol: pair.left_symbol.clone(),
        right_symbol: pair.right_symbol.clone(),
        dates: pair.dates.clone(),
        left: pair.left.clone(),
        right: pair.right.clone(),
        spread: spread(&pair.left, &pair.right)?,
    })
}

/// One named series with its moving averages.
#[derive(Debug, Clone, PartialEq)]
pub struct SmaAnalysis {
    pub name: String,
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
    /// `(window, averages)`; each averages vec has `values.len() - window + 1` entries.
    pub averages: Vec<(usize, Vec<f64>)>,
}

pub fn analyze_sma(
    name: impl Into<String>,
    dates: &[NaiveDate],
    values: &[f64],
    windows: &[usize],
) -> Result<SmaAnalysis, PipelineError> {
    let averages = windows
        .iter()
        .map(|&w| sma(values, w).map(|avg| (w, avg)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(SmaAnalysis {
        name: name.into(),
        dates: dates.to_vec(),
        values: values.to_vec(),
        averages,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct ZScoreAnalysis {
    pub zscores: ZScores,
    /// Global mean ± stddev classification of the spread.
    pub signals: Vec<Signal>,
    /// OLS of the left leg on the right; `None` when the right leg is flat.
    pub hedge: Option<Regression>,
    /// Engle-Granger test of the legs; `None` when it cannot be computed.
    pub cointegration: Option<Cointegration>,
}

pub fn analyze_zscore(spread: &SpreadAnalysis) -> Result<ZScoreAnalysis, PipelineError> {
    let z = zscores(&spread.spread)?;
    if z.is_degenerate() {
        warn!(
            spread = %spread.label(),
            "spread has zero standard deviation; z-scores are not finite"
        );
    }

    let hedge = match hedge_ratio(&spread.left, &spread.right) {
        Ok(fit) => Some(fit),
        Err(StatsError::DegenerateRegressor) => {
            warn!(leg = %spread.right_symbol, "flat leg; hedge ratio undefined");
            None
        }
        Err(e) => return Err(e.into()),
    };

    let cointegration = match cointegration(&spread.left, &spread.right) {
        Ok(test) => {
            info!(
                spread = %spread.label(),
                adf = test.adf_statistic,
                critical_5pct = test.critical_values.five_pct,
                cointegrated = test.is_cointegrated(),
                "engle-granger test"
            );
            Some(test)
        }
        Err(e @ (StatsError::DegenerateRegressor | StatsError::TooFewObservations { .. })) => {
            warn!(spread = %spread.label(), reason = %e, "cointegration test skipped");
            None
        }
        Err(e) => return Err(e.into()),
    };

    Ok(ZScoreAnalysis {
        signals: classify(&spread.spread)?,
        zscores: z,
        hedge,
        cointegration,
    })
}

/// Which threshold rule produced the signals of a backtest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "window", rename_all = "snake_case")]
pub enum Classifier {
    /// One mean/stddev over the whole series (has look-ahead).
    Global,
    /// Trailing window ending at each index.
    Rolling(usize),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestAnalysis {
    pub symbol: String,
    pub classifier: Classifier,
    pub signals: Vec<Signal>,
    pub events: Vec<TradeEvent>,
}

/// Classify a raw price series and replay it through the long/flat stepper.
pub fn analyze_backtest(
    symbol: impl Into<String>,
    closes: &[f64],
    rolling_window: Option<usize>,
) -> Result<BacktestAnalysis, PipelineError> {
    let (classifier, signals) = match rolling_window {
        Some(w) => (Classifier::Rolling(w), classify_rolling(closes, w)?),
        None => (Classifier::Global, classify(closes)?),
    };
    let events = step(&signals);
    Ok(BacktestAnalysis {
        symbol: symbol.into(),
        classifier,
        signals,
        events,
    })
}

// ─── Output ─────────────────────────────────────────────────────────

/// Lowercase alphanumerics; any run of other characters becomes one `_`.
fn file_stem(name: &str) -> String {
    let mut stem = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            stem.push(c.to_ascii_lowercase());
        } else if !stem.is_empty() && !stem.ends_with('_') {
            stem.push('_');
        }
    }
    stem.trim_end_matches('_').to_string()
}

fn pair_stem(spread: &SpreadAnalysis) -> String {
    format!("{}_{}", file_stem(&spread.left_symbol), file_stem(&spread.right_symbol))
}

fn date_labels(dates: &[NaiveDate]) -> Vec<String> {
    dates.iter().map(|d| d.to_string()).collect()
}

/// Write a price series' closes to `{dir}/{symbol}.csv`.
pub fn write_closes(series: &PriceSeries, dir: &Path) -> Result<PathBuf> {
    let path = dir.join(format!("{}.csv", file_stem(series.symbol())));
    write_series(&path, &series.closes())?;
    info!(symbol = series.symbol(), path = %path.display(), "wrote closes");
    Ok(path)
}

pub fn spread_chart(spread: &SpreadAnalysis) -> Vec<LineChart> {
    let labels = date_labels(&spread.dates);
    vec![
        LineChart::new(format!("{} vs {}", spread.left_symbol, spread.right_symbol))
            .with_subtitle("closing prices")
            .with_x_labels(labels.clone())
            .with_series(spread.left_symbol.clone(), spread.left.clone())
            .with_series(spread.right_symbol.clone(), spread.right.clone()),
        LineChart::new(format!("Spread {}", spread.label()))
            .with_x_labels(labels)
            .with_series(spread.label(), spread.spread.clone()),
    ]
}

pub fn sma_chart(analysis: &SmaAnalysis) -> LineChart {
    let mut chart = LineChart::new(format!("{} moving averages", analysis.name))
        .with_x_labels(date_labels(&analysis.dates))
        .with_series(analysis.name.clone(), analysis.values.clone());
    for (w, avg) in &analysis.averages {
        chart = chart.with_series(format!("SMA {w}"), avg.clone());
    }
    chart
}

pub fn zscore_chart(spread: &SpreadAnalysis, z: &ZScoreAnalysis) -> LineChart {
    LineChart::new(format!("Z-score {}", spread.label()))
        .with_subtitle(format!(
            "mean {:.4}, stddev {:.4}",
            z.zscores.mean, z.zscores.stddev
        ))
        .with_x_labels(date_labels(&spread.dates))
        .with_series("z-score", z.zscores.values.clone())
}

/// Spread CSV plus a chart of both legs and the spread.
pub fn write_spread_artifacts(spread: &SpreadAnalysis, dir: &Path) -> Result<Vec<PathBuf>> {
    let stem = pair_stem(spread);
    let csv_path = dir.join(format!("spread_{stem}.csv"));
    write_series(&csv_path, &spread.spread)?;

    let html_path = dir.join(format!("spread_{stem}.html"));
    write_html(&html_path, &format!("Spread {}", spread.label()), &spread_chart(spread))?;

    info!(csv = %csv_path.display(), html = %html_path.display(), "wrote spread");
    Ok(vec![csv_path, html_path])
}

pub fn write_sma_artifacts(analysis: &SmaAnalysis, dir: &Path) -> Result<Vec<PathBuf>> {
    let stem = file_stem(&analysis.name);
    let mut paths = Vec::with_capacity(analysis.averages.len() + 1);
    for (w, avg) in &analysis.averages {
        let path = dir.join(format!("sma{w}_{stem}.csv"));
        write_series(&path, avg)?;
        paths.push(path);
    }
    let html_path = dir.join(format!("sma_{stem}.html"));
    write_html(&html_path, &format!("{} SMA", analysis.name), &[sma_chart(analysis)])?;
    paths.push(html_path);

    info!(series = %analysis.name, files = paths.len(), "wrote moving averages");
    Ok(paths)
}

pub fn write_zscore_artifacts(
    spread: &SpreadAnalysis,
    z: &ZScoreAnalysis,
    dir: &Path,
) -> Result<Vec<PathBuf>> {
    let stem = pair_stem(spread);
    let csv_path = dir.join(format!("zscore_{stem}.csv"));
    write_series(&csv_path, &z.zscores.values)?;

    let html_path = dir.join(format!("zscore_{stem}.html"));
    write_html(
        &html_path,
        &format!("Z-score {}", spread.label()),
        &[zscore_chart(spread, z)],
    )?;

    info!(csv = %csv_path.display(), html = %html_path.display(), "wrote z-scores");
    Ok(vec![csv_path, html_path])
}

// ─── Single-stage runs ──────────────────────────────────────────────

/// Fetch the pair, write the spread CSV and legs/spread chart into `config.output.dir`.
pub fn run_spread(
    provider: &dyn QuoteProvider,
    config: &PairConfig,
    as_of: NaiveDate,
) -> Result<(SpreadAnalysis, Vec<PathBuf>)> {
    let aligned = fetch_pair(provider, config, as_of)?;
    let spread = analyze_spread(&aligned)?;
    let outputs = write_spread_artifacts(&spread, &config.output.dir)?;
    Ok((spread, outputs))
}

/// Fetch one symbol and write its moving averages and chart into `dir`.
pub fn run_sma(
    provider: &dyn QuoteProvider,
    request: &FetchRequest,
    windows: &[usize],
    dir: &Path,
) -> Result<(SmaAnalysis, Vec<PathBuf>)> {
    let series = fetch_series(provider, request).map_err(PipelineError::from)?;
    let analysis = analyze_sma(series.symbol(), &series.dates(), &series.closes(), windows)?;
    let outputs = write_sma_artifacts(&analysis, dir)?;
    Ok((analysis, outputs))
}

/// Spread plus z-scores and hedge ratio, with the z-score CSV and chart.
pub fn run_zscore(
    provider: &dyn QuoteProvider,
    config: &PairConfig,
    as_of: NaiveDate,
) -> Result<(SpreadAnalysis, ZScoreAnalysis, Vec<PathBuf>)> {
    let aligned = fetch_pair(provider, config, as_of)?;
    let spread = analyze_spread(&aligned)?;
    let z = analyze_zscore(&spread)?;
    let outputs = write_zscore_artifacts(&spread, &z, &config.output.dir)?;
    Ok((spread, z, outputs))
}

/// Fetch one symbol, classify its closes and replay the signals.
pub fn run_backtest(
    provider: &dyn QuoteProvider,
    request: &FetchRequest,
    rolling_window: Option<usize>,
) -> Result<BacktestAnalysis, PipelineError> {
    let series = fetch_series(provider, request)?;
    let analysis = analyze_backtest(series.symbol(), &series.closes(), rolling_window)?;
    info!(
        symbol = %analysis.symbol,
        events = analysis.events.len(),
        "backtest replayed"
    );
    Ok(analysis)
}

// ─── Full run ───────────────────────────────────────────────────────

/// Current schema version of [`PairReport`].
pub const REPORT_SCHEMA_VERSION: u32 = 1;

/// JSON summary of one pair run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairReport {
    pub schema_version: u32,
    pub left: String,
    pub right: String,
    pub interval: Interval,
    pub as_of: NaiveDate,
    pub observations: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub dropped_left: usize,
    pub dropped_right: usize,
    pub spread_mean: f64,
    pub spread_stddev: f64,
    /// `None` when the spread is flat (z-score undefined).
    pub latest_zscore: Option<f64>,
    pub latest_signal: Option<Signal>,
    pub hedge: Option<Regression>,
    #[serde(default)]
    pub cointegration: Option<Cointegration>,
    pub backtests: Vec<BacktestAnalysis>,
    pub outputs: Vec<PathBuf>,
}

/// Fetch, analyze and write everything for the configured pair.
///
/// Every analysis runs before the first file is written, so a failing stage
/// leaves the output directory untouched.
pub fn run_pair(
    provider: &dyn QuoteProvider,
    config: &PairConfig,
    as_of: NaiveDate,
) -> Result<PairReport> {
    let dir = config.output.dir.as_path();
    let (left_req, right_req) = config.requests(as_of);

    let left = fetch_series(provider, &left_req).map_err(PipelineError::from)?;
    let right = fetch_series(provider, &right_req).map_err(PipelineError::from)?;

    let aligned = align_legs(&left, &right)?;
    let spread = analyze_spread(&aligned)?;

    let windows: Vec<usize> = config
        .stats
        .sma_windows
        .iter()
        .copied()
        .filter(|&w| w <= spread.spread.len())
        .collect();
    if windows.len() < config.stats.sma_windows.len() {
        warn!(
            observations = spread.spread.len(),
            configured = ?config.stats.sma_windows,
            "skipping SMA windows longer than the aligned series"
        );
    }
    let sma_analysis = analyze_sma(spread.label(), &spread.dates, &spread.spread, &windows)?;
    let z = analyze_zscore(&spread)?;

    let rolling = config.stats.rolling_window;
    let backtests = vec![
        analyze_backtest(left.symbol(), &left.closes(), rolling)?,
        analyze_backtest(right.symbol(), &right.closes(), rolling)?,
    ];
    for bt in &backtests {
        info!(symbol = %bt.symbol, events = bt.events.len(), "backtest replayed");
    }

    let mut outputs = vec![write_closes(&left, dir)?, write_closes(&right, dir)?];
    outputs.extend(write_spread_artifacts(&spread, dir)?);
    outputs.extend(write_sma_artifacts(&sma_analysis, dir)?);
    outputs.extend(write_zscore_artifacts(&spread, &z, dir)?);

    let mut report = PairReport {
        schema_version: REPORT_SCHEMA_VERSION,
        left: spread.left_symbol.clone(),
        right: spread.right_symbol.clone(),
        interval: config.pair.interval,
        as_of,
        observations: aligned.len(),
        first_date: aligned.dates.first().copied(),
        last_date: aligned.dates.last().copied(),
        dropped_left: aligned.dropped_left,
        dropped_right: aligned.dropped_right,
        spread_mean: z.zscores.mean,
        spread_stddev: z.zscores.stddev,
        latest_zscore: z.zscores.latest().filter(|v| v.is_finite()),
        latest_signal: z.signals.last().copied(),
        hedge: z.hedge,
        cointegration: z.cointegration,
        backtests,
        outputs,
    };

    let report_path = dir.join(format!("report_{}.json", pair_stem(&spread)));
    report.outputs.push(report_path.clone());
    write_json(&report_path, &report)?;
    info!(path = %report_path.display(), "wrote report");

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn pair(left: Vec<f64>, right: Vec<f64>) -> AlignedPair {
        let dates = (0..left.len())
            .map(|i| d("2024-01-01") + chrono::Duration::days(i as i64))
            .collect();
        AlignedPair {
            left_symbol: "AAA".into(),
            right_symbol: "BBB".into(),
            dates,
            left,
            right,
            dropped_left: 0,
            dropped_right: 0,
        }
    }

    #[test]
    fn spread_analysis_subtracts_right_from_left() {
        let s = analyze_spread(&pair(vec![5.0, 6.0, 7.0], vec![2.0, 2.0, 2.0])).unwrap();
        assert_eq!(s.spread, vec![3.0, 4.0, 5.0]);
        assert_eq!(s.label(), "AAA - BBB");
    }

    #[test]
    fn misaligned_pair_reports_length_mismatch() {
        let mut p = pair(vec![1.0, 2.0], vec![1.0, 2.0]);
        p.right.pop();
        let err = analyze_spread(&p).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Stats(StatsError::LengthMismatch { left: 2, right: 1 })
        ));
    }

    #[test]
    fn sma_analysis_keeps_each_window() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let dates: Vec<NaiveDate> = pair(values.to_vec(), values.to_vec()).dates;
        let a = analyze_sma("X", &dates, &values, &[3, 5]).unwrap();
        assert_eq!(a.averages[0], (3, vec![2.0, 3.0, 4.0]));
        assert_eq!(a.averages[1], (5, vec![3.0]));
    }

    #[test]
    fn sma_analysis_rejects_oversized_window() {
        let err = analyze_sma("X", &[], &[1.0], &[2]).unwrap_err();
        assert!(matches!(err, PipelineError::Stats(StatsError::InvalidWindow { .. })));
    }

    #[test]
    fn zscore_analysis_runs_engle_granger_on_the_legs() {
        let left = vec![10.0, 11.2, 11.9, 13.4, 13.8, 15.1, 16.3, 16.8, 18.2, 19.1];
        let right = vec![5.0, 5.5, 6.0, 6.5, 7.0, 7.5, 8.0, 8.5, 9.0, 9.5];
        let s = analyze_spread(&pair(left, right)).unwrap();
        let z = analyze_zscore(&s).unwrap();

        let test = z.cointegration.unwrap();
        assert_eq!(Some(test.hedge), z.hedge);
        assert!(test.adf_statistic.is_finite());
        assert!(test.critical_values.one_pct < test.critical_values.ten_pct);
    }

    #[test]
    fn zscore_analysis_with_flat_right_leg_has_no_hedge() {
        let s = analyze_spread(&pair(vec![1.0, 2.0, 3.0], vec![1.0, 1.0, 1.0])).unwrap();
        let z = analyze_zscore(&s).unwrap();
        assert!(z.hedge.is_none());
        assert!(z.cointegration.is_none());
        assert_eq!(z.signals.len(), 3);
        assert!(!z.zscores.is_degenerate());
    }

    #[test]
    fn backtest_uses_requested_classifier() {
        let closes = [10.0, 12.0, 1.0, 11.0, 30.0, 10.0];
        let global = analyze_backtest("X", &closes, None).unwrap();
        assert_eq!(global.classifier, Classifier::Global);
        assert_eq!(global.signals.len(), closes.len());

        let rolling = analyze_backtest("X", &closes, Some(3)).unwrap();
        assert_eq!(rolling.classifier, Classifier::Rolling(3));
        assert_eq!(rolling.signals[0], Signal::Hold);
        assert_eq!(rolling.signals[1], Signal::Hold);
    }

    #[test]
    fn file_stems_are_filesystem_safe() {
        assert_eq!(file_stem("BRK.B"), "brk_b");
        assert_eq!(file_stem("spy"), "spy");
        assert_eq!(file_stem("SPY - QQQ"), "spy_qqq");
    }

    #[test]
    fn write_closes_names_file_by_stem() {
        let dir = tempfile::tempdir().unwrap();
        let series = PriceSeries::new(
            "BRK.B",
            Interval::Daily,
            vec![
                pairlab_core::domain::PricePoint::new(d("2024-01-02"), 410.5),
                pairlab_core::domain::PricePoint::new(d("2024-01-03"), 412.0),
            ],
        )
        .unwrap();

        let path = write_closes(&series, dir.path()).unwrap();
        assert_eq!(path, dir.path().join("brk_b.csv"));
        assert_eq!(crate::export::read_series(&path).unwrap(), vec![410.5, 412.0]);
    }

    #[test]
    fn classifier_serializes_with_window() {
        assert_eq!(
            serde_json::to_string(&Classifier::Rolling(20)).unwrap(),
            r#"{"type":"rolling","window":20}"#
        );
        assert_eq!(
            serde_json::to_string(&Classifier::Global).unwrap(),
            r#"{"type":"global"}"#
        );
    }
}
