//! Static HTML line charts.
//!
//! Each chart is serialized to an ECharts option object and embedded in the
//! page as JSON; the page loads the ECharts runtime from a CDN and renders one
//! `<div>` per chart.
//!
//! All series on a chart share one index-based x-axis sized for the longest
//! series. Shorter series are left-padded with gaps, so a moving average's
//! value lines up with the last period of its window.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{json, Value};

pub const ECHARTS_CDN: &str = "https://cdn.jsdelivr.net/npm/echarts@5/dist/echarts.min.js";

#[derive(Debug, Clone, PartialEq)]
pub struct LineSeries {
    pub name: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineChart {
    pub title: String,
    pub subtitle: Option<String>,
    /// Optional axis labels (e.g. dates). Falls back to 0-based indices.
    pub x_labels: Vec<String>,
    pub series: Vec<LineSeries>,
}

impl LineChart {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: None,
            x_labels: Vec::new(),
            series: Vec::new(),
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn with_x_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        self.x_labels = labels.into_iter().map(|l| l.to_string()).collect();
        self
    }

    pub fn with_series(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.series.push(LineSeries {
            name: name.into(),
            values,
        });
        self
    }

    /// Length of the shared x-axis.
    pub fn axis_len(&self) -> usize {
        self.series
            .iter()
            .map(|s| s.values.len())
            .max()
            .unwrap_or(0)
            .max(self.x_labels.len())
    }

    fn axis_labels(&self) -> Vec<String> {
        let n = self.axis_len();
        (0..n)
            .map(|i| self.x_labels.get(i).cloned().unwrap_or_else(|| i.to_string()))
            .collect()
    }

    /// Series values left-padded to the axis length. Gaps and non-finite
    /// values become `None` (rendered as breaks in the line).
    pub fn padded(&self, series: &LineSeries) -> Vec<Option<f64>> {
        let pad = self.axis_len().saturating_sub(series.values.len());
        std::iter::repeat(None)
            .take(pad)
            .chain(
                series
                    .values
                    .iter()
                    .map(|v| if v.is_finite() { Some(*v) } else { None }),
            )
            .collect()
    }

    /// ECharts option object for this chart.
    pub fn to_option(&self) -> Value {
        let names: Vec<&str> = self.series.iter().map(|s| s.name.as_str()).collect();
        let series: Vec<Value> = self
            .series
            .iter()
            .map(|s| {
                json!({
                    "name": s.name,
                    "type": "line",
                    "showSymbol": false,
                    "connectNulls": false,
                    "data": self.padded(s),
                })
            })
            .collect();

        json!({
            "title": { "text": self.title, "subtext": self.subtitle.clone().unwrap_or_default() },
            "tooltip": { "trigger": "axis" },
            "legend": { "data": names, "top": 40 },
            "grid": { "top": 80 },
            "xAxis": { "type": "category", "data": self.axis_labels() },
            "yAxis": { "type": "value", "scale": true },
            "series": series,
        })
    }
}

/// Render charts to a standalone HTML page.
pub fn render_html(page_title: &str, charts: &[LineChart]) -> Result<String> {
    let mut output = String::new();

    output.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
    output.push_str("<meta charset=\"UTF-8\">\n");
    output.push_str(&format!("<title>{}</title>\n", escape_html(page_title)));
    output.push_str(&format!("<script src=\"{ECHARTS_CDN}\"></script>\n"));
    output.push_str("<style>\n");
    output.push_str("body { font-family: Arial, sans-serif; max-width: 1200px; margin: 0 auto; padding: 20px; }\n");
    output.push_str(".chart { width: 100%; height: 480px; margin-bottom: 40px; }\n");
    output.push_str("</style>\n</head>\n<body>\n");
    output.push_str(&format!("<h1>{}</h1>\n", escape_html(page_title)));

    for i in 0..charts.len() {
        output.push_str(&format!("<div class=\"chart\" id=\"chart-{i}\"></div>\n"));
    }

    output.push_str("<script>\n");
    for (i, chart) in charts.iter().enumerate() {
        let option = serde_json::to_string(&chart.to_option())
            .with_context(|| format!("failed to serialize chart '{}'", chart.title))?;
        output.push_str(&format!(
            "echarts.init(document.getElementById(\"chart-{i}\")).setOption({});\n",
            escape_script(&option)
        ));
    }
    output.push_str("</script>\n</body>\n</html>\n");

    Ok(output)
}

/// Render and write charts to `path`.
pub fn write_html(path: &Path, page_title: &str, charts: &[LineChart]) -> Result<()> {
    let html = render_html(page_title, charts)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    std::fs::write(path, html).with_context(|| format!("failed to write chart {}", path.display()))
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Keep embedded JSON from closing the surrounding `<script>` element.
fn escape_script(json: &str) -> String {
    json.replace("</", "<\\/")
}
