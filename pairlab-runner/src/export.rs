//! Flat-file export: one value per line, plus JSON run reports.
//!
//! Values are written with Rust's shortest round-trip float formatting, so
//! reading a file back yields bit-identical numbers. There is no header row.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

// ─── Series CSV ─────────────────────────────────────────────────────

fn series_writer<W: std::io::Write>(inner: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(inner)
}

/// Render a series as newline-separated text.
pub fn export_series_csv(values: &[f64]) -> Result<String> {
    let mut wtr = series_writer(vec![]);
    for v in values {
        wtr.write_record([v.to_string()])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Write a series to `path`, one value per line.
pub fn write_series(path: &Path, values: &[f64]) -> Result<()> {
    ensure_parent(path)?;
    let text = export_series_csv(values)?;
    std::fs::write(path, text)
        .with_context(|| format!("failed to create series file {}", path.display()))
}

/// Read a file written by [`write_series`].
pub fn read_series(path: &Path) -> Result<Vec<f64>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("failed to open series file {}", path.display()))?;

    let mut values = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("bad record in {}", path.display()))?;
        let field = record.get(0).unwrap_or("").trim();
        let v = field.parse::<f64>().with_context(|| {
            format!("line {} of {}: '{field}' is not a number", line + 1, path.display())
        })?;
        values.push(v);
    }
    Ok(values)
}

// ─── JSON report ────────────────────────────────────────────────────

/// Write any serializable report as pretty JSON.
pub fn write_json<T: Serialize>(path: &Path, report: &T) -> Result<()> {
    ensure_parent(path)?;
    let json = serde_json::to_string_pretty(report).context("failed to serialize report")?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write report {}", path.display()))
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    Ok(())
}
