//! PairLab CLI: fetch quotes and compute pair statistics.
//!
//! Commands:
//! - `fetch`: download one symbol's closes to a CSV file
//! - `spread`: left minus right leg, CSV plus chart
//! - `sma`: simple moving averages of one symbol, CSV plus chart
//! - `zscore`: spread z-scores and hedge ratio
//! - `backtest`: classify one symbol's closes and replay the long/flat stepper
//! - `run`: every stage for a pair described by a TOML config file
//! - `positions`: read-only brokerage position lookup

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use pairlab_core::broker::{AlpacaClient, AlpacaCredentials, HeldPosition};
use pairlab_core::data::alpha_vantage::DEFAULT_BASE_URL;
use pairlab_core::data::{fetch_series, AlphaVantageProvider, FetchRequest, TrailingWindow};
use pairlab_core::domain::Interval;
use pairlab_core::signals::TradeEvent;
use pairlab_core::stats::Cointegration;
use pairlab_runner::{
    api_key_from_env, init_logging, run_backtest, run_pair, run_sma, run_spread, run_zscore,
    write_closes, write_series, LogFormat, PairConfig, PairReport,
};

#[derive(Parser)]
#[command(
    name = "pairlab",
    about = "PairLab CLI: pairs-trading statistics over daily, weekly or monthly closes"
)]
struct Cli {
    /// Quote API base URL [default: https://www.alphavantage.co].
    /// For `run`, overrides `[api] base_url` from the config file.
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Reference date for trailing windows (YYYY-MM-DD). Defaults to today.
    #[arg(long, global = true)]
    as_of: Option<NaiveDate>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download one symbol's closing prices to a CSV file.
    Fetch {
        symbol: String,

        #[command(flatten)]
        window: WindowArgs,

        /// Output file. Defaults to output/<stem>.csv, using the same symbol stem as `run`.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Spread between two symbols (left minus right).
    Spread {
        left: String,
        right: String,

        #[command(flatten)]
        window: WindowArgs,

        #[arg(long, default_value = "output")]
        out_dir: PathBuf,
    },
    /// Simple moving averages of one symbol.
    Sma {
        symbol: String,

        /// Comma-separated window lengths.
        #[arg(long, value_delimiter = ',', default_value = "20,50")]
        windows: Vec<usize>,

        #[command(flatten)]
        window: WindowArgs,

        #[arg(long, default_value = "output")]
        out_dir: PathBuf,
    },
    /// Z-scores of the spread between two symbols.
    Zscore {
        left: String,
        right: String,

        #[command(flatten)]
        window: WindowArgs,

        #[arg(long, default_value = "output")]
        out_dir: PathBuf,
    },
    /// Classify one symbol's closes and replay buy/sell transitions.
    Backtest {
        symbol: String,

        /// Use a trailing window of this many periods instead of whole-series bands.
        #[arg(long)]
        rolling: Option<usize>,

        #[command(flatten)]
        window: WindowArgs,
    },
    /// Run every stage for the pair in a TOML config file.
    Run {
        #[arg(long)]
        config: PathBuf,
    },
    /// Show open brokerage positions (all, or one symbol).
    Positions { symbol: Option<String> },
}

/// Sampling and trailing-window options shared by the fetching commands.
#[derive(Args, Clone, Copy)]
struct WindowArgs {
    /// daily, weekly or monthly.
    #[arg(long, default_value_t = Interval::Daily)]
    interval: Interval,

    /// Keep only the last year of periods before --as-of.
    #[arg(long, default_value_t = false)]
    trailing: bool,

    /// Keep at most this many of the most recent periods.
    #[arg(long)]
    max_samples: Option<usize>,
}

impl WindowArgs {
    fn trailing_window(&self, as_of: NaiveDate) -> Option<TrailingWindow> {
        if self.trailing || self.max_samples.is_some() {
            Some(TrailingWindow::one_year(as_of, self.max_samples))
        } else {
            None
        }
    }

    fn request(&self, symbol: &str, as_of: NaiveDate) -> FetchRequest {
        let req = FetchRequest::new(symbol.trim().to_uppercase(), self.interval);
        match self.trailing_window(as_of) {
            Some(w) => req.with_window(w),
            None => req,
        }
    }

    fn pair_config(&self, left: String, right: String, out_dir: PathBuf) -> Result<PairConfig> {
        let mut config = PairConfig::for_pair(left, right, self.interval);
        config.window.trailing_days = self.trailing.then_some(365);
        config.window.max_samples = self.max_samples;
        config.output.dir = out_dir;
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_logging(LogFormat::from_env());

    let cli = Cli::parse();
    let as_of = cli
        .as_of
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    tracing::debug!(%as_of, base_url = ?cli.base_url, "starting");
    let base_url = cli.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);

    match cli.command {
        Commands::Fetch { symbol, window, out } => {
            run_fetch(base_url, &symbol, window, out, as_of)
        }
        Commands::Spread {
            left,
            right,
            window,
            out_dir,
        } => {
            let config = window.pair_config(left, right, out_dir)?;
            run_spread_cmd(base_url, &config, as_of)
        }
        Commands::Sma {
            symbol,
            windows,
            window,
            out_dir,
        } => run_sma_cmd(base_url, &symbol, &windows, window, out_dir, as_of),
        Commands::Zscore {
            left,
            right,
            window,
            out_dir,
        } => {
            let config = window.pair_config(left, right, out_dir)?;
            run_zscore_cmd(base_url, &config, as_of)
        }
        Commands::Backtest {
            symbol,
            rolling,
            window,
        } => run_backtest_cmd(base_url, &symbol, rolling, window, as_of),
        Commands::Run { config } => run_config(&config, cli.base_url.as_deref(), as_of),
        Commands::Positions { symbol } => run_positions(symbol.as_deref()),
    }
}

fn quote_provider(base_url: &str) -> Result<AlphaVantageProvider> {
    let api_key = api_key_from_env()?;
    Ok(AlphaVantageProvider::new(base_url, api_key)?)
}

fn print_outputs(outputs: &[PathBuf]) {
    println!("Files:");
    for path in outputs {
        println!("  {}", path.display());
    }
}

fn run_fetch(
    base_url: &str,
    symbol: &str,
    window: WindowArgs,
    out: Option<PathBuf>,
    as_of: NaiveDate,
) -> Result<()> {
    let provider = quote_provider(base_url)?;
    let request = window.request(symbol, as_of);
    let series = fetch_series(&provider, &request)?;

    let out = match out {
        Some(path) => {
            write_series(&path, &series.closes())?;
            path
        }
        None => write_closes(&series, Path::new("output"))?,
    };

    println!("Symbol:   {} ({})", series.symbol(), series.interval());
    println!("Points:   {}", series.len());
    if let (Some(first), Some(last)) = (series.first_date(), series.last_date()) {
        println!("Range:    {first} to {last}");
    }
    if let Some(p) = series.points().last() {
        println!("Last:     {:.4}", p.close);
    }
    println!("Saved to: {}", out.display());
    Ok(())
}

fn run_spread_cmd(base_url: &str, config: &PairConfig, as_of: NaiveDate) -> Result<()> {
    let provider = quote_provider(base_url)?;
    let (spread, outputs) = run_spread(&provider, config, as_of)?;

    println!("Spread:   {}", spread.label());
    println!("Points:   {}", spread.spread.len());
    if let Some(last) = spread.spread.last() {
        println!("Last:     {last:.4}");
    }
    print_outputs(&outputs);
    Ok(())
}

fn run_sma_cmd(
    base_url: &str,
    symbol: &str,
    windows: &[usize],
    window: WindowArgs,
    out_dir: PathBuf,
    as_of: NaiveDate,
) -> Result<()> {
    let provider = quote_provider(base_url)?;
    let request = window.request(symbol, as_of);
    let (analysis, outputs) = run_sma(&provider, &request, windows, &out_dir)?;

    println!("Symbol:   {}", analysis.name);
    println!("Points:   {}", analysis.values.len());
    for (w, avg) in &analysis.averages {
        match avg.last() {
            Some(v) => println!("SMA {w:<4}  {v:.4}"),
            None => println!("SMA {w:<4}  -"),
        }
    }
    print_outputs(&outputs);
    Ok(())
}

fn run_zscore_cmd(base_url: &str, config: &PairConfig, as_of: NaiveDate) -> Result<()> {
    let provider = quote_provider(base_url)?;
    let (spread, z, outputs) = run_zscore(&provider, config, as_of)?;

    println!("Spread:   {}", spread.label());
    println!("Points:   {}", z.zscores.values.len());
    println!("Mean:     {:.4}", z.zscores.mean);
    println!("Stddev:   {:.4}", z.zscores.stddev);
    if let Some(latest) = z.zscores.latest() {
        println!("Latest z: {latest:.3}");
    }
    match z.hedge {
        Some(h) => println!(
            "Hedge:    beta {:.4}, intercept {:.4}, R² {:.3}",
            h.beta, h.intercept, h.r_squared
        ),
        None => println!("Hedge:    undefined ({} is flat)", spread.right_symbol),
    }
    print_cointegration("Coint:    ", z.cointegration.as_ref());
    print_outputs(&outputs);
    Ok(())
}

fn print_events(events: &[TradeEvent]) {
    if events.is_empty() {
        println!("No transitions.");
        return;
    }
    for event in events {
        match event {
            TradeEvent::Buy(i) => println!("  buy  @ {i}"),
            TradeEvent::Sell(i) => println!("  sell @ {i}"),
        }
    }
}

fn run_backtest_cmd(
    base_url: &str,
    symbol: &str,
    rolling: Option<usize>,
    window: WindowArgs,
    as_of: NaiveDate,
) -> Result<()> {
    let provider = quote_provider(base_url)?;
    let request = window.request(symbol, as_of);
    let result = run_backtest(&provider, &request, rolling)?;

    println!("Symbol:   {}", result.symbol);
    println!("Signals:  {}", result.signals.len());
    println!("Events:   {}", result.events.len());
    print_events(&result.events);
    Ok(())
}

/// Load a pair config; an explicit `--base-url` wins over `[api] base_url`.
fn load_run_config(path: &Path, base_url: Option<&str>) -> Result<PairConfig> {
    let mut config = PairConfig::from_file(path)
        .with_context(|| format!("failed to load config {}", path.display()))?;
    if let Some(url) = base_url {
        config.api.base_url = url.to_string();
    }
    Ok(config)
}

fn run_config(path: &Path, base_url: Option<&str>, as_of: NaiveDate) -> Result<()> {
    let config = load_run_config(path, base_url)?;
    let provider = quote_provider(&config.api.base_url)?;
    let report = run_pair(&provider, &config, as_of)?;
    print_report(&report);
    Ok(())
}

fn print_cointegration(label: &str, result: Option<&Cointegration>) {
    match result {
        Some(c) => {
            let verdict = match c.significance() {
                Some(level) => format!("cointegrated at {:.0}%", level * 100.0),
                None => "not cointegrated".to_string(),
            };
            println!(
                "{label}ADF {:.3} (5% critical {:.3}), {verdict}",
                c.adf_statistic, c.critical_values.five_pct
            );
        }
        None => println!("{label}undefined"),
    }
}

fn print_report(report: &PairReport) {
    println!();
    println!("=== Pair Report ===");
    println!("Pair:           {} / {} ({})", report.left, report.right, report.interval);
    if let (Some(first), Some(last)) = (report.first_date, report.last_date) {
        println!("Period:         {first} to {last}");
    }
    println!("Observations:   {}", report.observations);
    if report.dropped_left > 0 || report.dropped_right > 0 {
        println!(
            "Dropped:        {} {} / {} {}",
            report.dropped_left, report.left, report.dropped_right, report.right
        );
    }
    println!();
    println!("--- Spread ---");
    println!("Mean:           {:.4}", report.spread_mean);
    println!("Stddev:         {:.4}", report.spread_stddev);
    match report.latest_zscore {
        Some(z) => println!("Latest z:       {z:.3}"),
        None => println!("Latest z:       undefined"),
    }
    if let Some(signal) = report.latest_signal {
        println!("Latest signal:  {signal:?}");
    }
    if let Some(h) = &report.hedge {
        println!("Hedge ratio:    {:.4} (R² {:.3})", h.beta, h.r_squared);
    }
    print_cointegration("Cointegration:  ", report.cointegration.as_ref());
    println!();
    println!("--- Backtests ---");
    for bt in &report.backtests {
        println!("{} ({:?}): {} events", bt.symbol, bt.classifier, bt.events.len());
        print_events(&bt.events);
    }
    println!();
    print_outputs(&report.outputs);
}

fn run_positions(symbol: Option<&str>) -> Result<()> {
    let client = AlpacaClient::new(AlpacaCredentials::from_env()?)?;
    let positions: Vec<HeldPosition> = match symbol {
        Some(sym) => client.position(&sym.to_uppercase())?.into_iter().collect(),
        None => client.positions()?,
    };

    if positions.is_empty() {
        match symbol {
            Some(sym) => println!("No open position in {}.", sym.to_uppercase()),
            None => println!("No open positions."),
        }
        return Ok(());
    }

    println!(
        "{:<8} {:<6} {:>12} {:>12} {:>14}",
        "Symbol", "Side", "Qty", "Avg entry", "Market value"
    );
    println!("{}", "-".repeat(56));
    for p in &positions {
        let fmt = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |x| format!("{x:.2}"));
        println!(
            "{:<8} {:<6} {:>12} {:>12} {:>14}",
            p.symbol,
            p.side,
            p.qty,
            fmt(p.avg_entry_price),
            fmt(p.market_value)
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn sma_windows_split_on_commas() {
        let cli = Cli::try_parse_from(["pairlab", "sma", "spy", "--windows", "5,10,30"]).unwrap();
        match cli.command {
            Commands::Sma { windows, .. } => assert_eq!(windows, vec![5, 10, 30]),
            _ => panic!("expected sma"),
        }
    }

    #[test]
    fn max_samples_implies_one_year_window() {
        let cli = Cli::try_parse_from([
            "pairlab",
            "--as-of",
            "2024-06-30",
            "backtest",
            "qqq",
            "--interval",
            "weekly",
            "--max-samples",
            "52",
        ])
        .unwrap();
        let as_of = cli.as_of.unwrap();
        let Commands::Backtest { window, .. } = cli.command else {
            panic!("expected backtest");
        };
        let req = window.request("qqq", as_of);
        assert_eq!(req.symbol, "QQQ");
        assert_eq!(req.interval, Interval::Weekly);
        assert_eq!(req.window, Some(TrailingWindow::one_year(as_of, Some(52))));
    }

    #[test]
    fn base_url_flag_is_optional_and_global() {
        let cli = Cli::try_parse_from(["pairlab", "run", "--config", "pair.toml"]).unwrap();
        assert_eq!(cli.base_url, None);

        let cli = Cli::try_parse_from([
            "pairlab",
            "run",
            "--config",
            "pair.toml",
            "--base-url",
            "http://127.0.0.1:8080",
        ])
        .unwrap();
        assert_eq!(cli.base_url.as_deref(), Some("http://127.0.0.1:8080"));
    }

    #[test]
    fn base_url_flag_overrides_config_for_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pair.toml");
        std::fs::write(
            &path,
            "[pair]\nleft = \"SPY\"\nright = \"QQQ\"\n\n[api]\nbase_url = \"http://config.invalid\"\n",
        )
        .unwrap();

        let config = load_run_config(&path, Some("http://127.0.0.1:8080")).unwrap();
        assert_eq!(config.api.base_url, "http://127.0.0.1:8080");

        let config = load_run_config(&path, None).unwrap();
        assert_eq!(config.api.base_url, "http://config.invalid");
    }

    #[test]
    fn pair_commands_reject_identical_legs() {
        let window = WindowArgs {
            interval: Interval::Daily,
            trailing: false,
            max_samples: None,
        };
        assert!(window
            .pair_config("SPY".into(), "spy".into(), PathBuf::from("out"))
            .is_err());
    }
}
