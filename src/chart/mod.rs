//! Chart specifications.
//!
//! A chart is described, not drawn: kind, titles, categories, one or more
//! series and the annotations layered on top (highlighted points, reference
//! lines, per-point colours and value labels). Specs serialise to JSON so any
//! renderer can pick them up.

pub mod gallery;

use crate::export::write_json;
use crate::stats;
use crate::table::{access::array_f64, access::array_str, column};
use anyhow::{ensure, Result};
use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const GREEN: &str = "#27AE60";
pub const RED: &str = "#E74C3C";
pub const ORANGE: &str = "#E67E22";
pub const BLUE: &str = "#2E86AB";

pub const PROFESSIONAL: [&str; 4] = ["#2E86AB", "#A23B72", "#F18F01", "#C73E1D"];
pub const CORPORATE: [&str; 4] = ["#003f5c", "#58508d", "#bc5090", "#ff6361"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Line,
    Bar,
    HorizontalBar,
    GroupedBar,
    Scatter,
    Pie,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub values: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Per-point colours; overrides `color` when present.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub point_colors: Vec<String>,
    /// Text drawn on each point or bar.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub value_labels: Vec<String>,
}

impl Series {
    pub fn new(name: &str, values: Vec<f64>) -> Self {
        Series {
            name: name.to_string(),
            values,
            color: None,
            point_colors: Vec::new(),
            value_labels: Vec::new(),
        }
    }

    pub fn color(mut self, color: &str) -> Self {
        self.color = Some(color.to_string());
        self
    }

    pub fn point_colors(mut self, colors: Vec<String>) -> Self {
        self.point_colors = colors;
        self
    }

    /// Fixed text per point, e.g. category names on a scatter.
    pub fn labels<S: AsRef<str>>(mut self, labels: &[S]) -> Self {
        self.value_labels = labels.iter().map(|l| l.as_ref().to_string()).collect();
        self
    }

    /// Label every value with `fmt`.
    pub fn labelled<F: Fn(f64) -> String>(mut self, fmt: F) -> Self {
        self.value_labels = self.values.iter().map(|v| fmt(*v)).collect();
        self
    }
}

/// A single annotated point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub index: usize,
    pub value: f64,
    pub label: String,
    pub color: String,
}

/// Horizontal line across the plot, e.g. an average or a target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceLine {
    pub value: f64,
    pub label: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Category axis; empty for scatter charts.
    #[serde(default)]
    pub categories: Vec<String>,
    /// Numeric x positions for scatter charts.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub x_values: Vec<f64>,
    pub series: Vec<Series>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub highlights: Vec<Highlight>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reference_lines: Vec<ReferenceLine>,
}

impl ChartSpec {
    pub fn new(kind: ChartKind, title: &str) -> Self {
        ChartSpec {
            kind,
            title: title.to_string(),
            x_label: String::new(),
            y_label: String::new(),
            categories: Vec::new(),
            x_values: Vec::new(),
            series: Vec::new(),
            highlights: Vec::new(),
            reference_lines: Vec::new(),
        }
    }

    pub fn axes(mut self, x: &str, y: &str) -> Self {
        self.x_label = x.to_string();
        self.y_label = y.to_string();
        self
    }

    pub fn categories<S: AsRef<str>>(mut self, categories: &[S]) -> Self {
        self.categories = categories.iter().map(|c| c.as_ref().to_string()).collect();
        self
    }

    pub fn x_values(mut self, xs: Vec<f64>) -> Self {
        self.x_values = xs;
        self
    }

    pub fn series(mut self, series: Series) -> Self {
        self.series.push(series);
        self
    }

    pub fn highlights(mut self, highlights: Vec<Highlight>) -> Self {
        self.highlights.extend(highlights);
        self
    }

    pub fn reference(mut self, line: ReferenceLine) -> Self {
        self.reference_lines.push(line);
        self
    }

    /// Every series must line up with the axis it is plotted against, and
    /// colours and labels with the series.
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.series.is_empty(), "chart `{}` has no series", self.title);
        let expected = if self.kind == ChartKind::Scatter {
            self.x_values.len()
        } else {
            self.categories.len()
        };
        for s in &self.series {
            ensure!(
                s.values.len() == expected,
                "series `{}` of `{}` has {} values for {} positions",
                s.name,
                self.title,
                s.values.len(),
                expected
            );
            for (what, n) in [("colours", s.point_colors.len()), ("labels", s.value_labels.len())] {
                ensure!(
                    n == 0 || n == s.values.len(),
                    "series `{}` has {} {} for {} values",
                    s.name,
                    n,
                    what,
                    s.values.len()
                );
            }
        }
        for h in &self.highlights {
            ensure!(h.index < expected, "highlight `{}` is off the axis", h.label);
        }
        Ok(())
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        self.validate()?;
        write_json(self, path)
    }

    /// Bar (or line/pie) chart of `value` per `category` straight from a table.
    pub fn from_table(batch: &RecordBatch, kind: ChartKind, title: &str, category: &str, value: &str) -> Result<Self> {
        let labels: Vec<String> = array_str(column(batch, category)?)?
            .into_iter()
            .map(Option::unwrap_or_default)
            .collect();
        let values: Vec<f64> = array_f64(column(batch, value)?)?
            .into_iter()
            .map(|v| v.unwrap_or(0.0))
            .collect();
        Ok(ChartSpec::new(kind, title)
            .axes(category, value)
            .categories(&labels)
            .series(Series::new(value, values)))
    }
}

/// Peak in green and low in red; the first occurrence wins ties.
pub fn peak_and_low<F: Fn(f64) -> String>(values: &[f64], fmt: F) -> Vec<Highlight> {
    let mut out = Vec::new();
    if let Some(i) = stats::argmax(values) {
        out.push(Highlight {
            index: i,
            value: values[i],
            label: format!("Peak: {}", fmt(values[i])),
            color: GREEN.to_string(),
        });
    }
    if let Some(i) = stats::argmin(values) {
        out.push(Highlight {
            index: i,
            value: values[i],
            label: format!("Low: {}", fmt(values[i])),
            color: RED.to_string(),
        });
    }
    out
}

pub fn average_line<F: Fn(f64) -> String>(values: &[f64], fmt: F) -> Option<ReferenceLine> {
    if values.is_empty() {
        return None;
    }
    let avg = stats::mean(values);
    Some(ReferenceLine {
        value: avg,
        label: format!("Average: {}", fmt(avg)),
        color: ORANGE.to_string(),
    })
}

/// Green at or above `target`, red below.
pub fn target_colors(values: &[f64], target: f64) -> Vec<String> {
    values
        .iter()
        .map(|&v| (if v >= target { GREEN } else { RED }).to_string())
        .collect()
}

/// `n` colours stepping evenly from `from` to `to` (`#rrggbb`).
pub fn gradient(from: &str, to: &str, n: usize) -> Result<Vec<String>> {
    let parse = |hex: &str| -> Result<[f64; 3]> {
        let hex = hex.trim_start_matches('#');
        ensure!(hex.len() == 6, "`{}` is not a #rrggbb colour", hex);
        let mut rgb = [0.0; 3];
        for (i, c) in rgb.iter_mut().enumerate() {
            *c = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)? as f64;
        }
        Ok(rgb)
    };
    let (a, b) = (parse(from)?, parse(to)?);
    Ok((0..n)
        .map(|i| {
            let t = if n > 1 { i as f64 / (n - 1) as f64 } else { 0.0 };
            let c: Vec<u8> = (0..3).map(|k| (a[k] + (b[k] - a[k]) * t).round() as u8).collect();
            format!("#{:02x}{:02x}{:02x}", c[0], c[1], c[2])
        })
        .collect())
}

/// Several charts laid out on one grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub title: String,
    pub rows: usize,
    pub cols: usize,
    pub panels: Vec<ChartSpec>,
}

/// Near-square grid: `ceil(sqrt(n))` columns.
pub fn dashboard(title: &str, panels: Vec<ChartSpec>) -> Result<Dashboard> {
    ensure!(!panels.is_empty(), "dashboard `{}` has no panels", title);
    for p in &panels {
        p.validate()?;
    }
    let cols = (panels.len() as f64).sqrt().ceil() as usize;
    let rows = panels.len().div_ceil(cols);
    Ok(Dashboard {
        title: title.to_string(),
        rows,
        cols,
        panels,
    })
}

impl Dashboard {
    pub fn write(&self, path: &Path) -> Result<()> {
        write_json(self, path)
    }
}
