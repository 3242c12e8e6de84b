use crate::stats;
use crate::table::from_columns;
use anyhow::{bail, Result};
use arrow::{
    array::{ArrayRef, Float64Array, StringArray},
    record_batch::RecordBatch,
};
use ndarray::{Array1, Array2, Axis};
use serde::Serialize;
use std::sync::Arc;

/// Row labels × period columns of one metric, e.g. products × quarters.
#[derive(Debug, Clone, PartialEq)]
pub struct QuarterlyMatrix {
    pub labels: Vec<String>,
    pub periods: Vec<String>,
    pub values: Array2<f64>,
}

/// Best and worst period of one row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowExtremes {
    pub label: String,
    pub best: String,
    pub best_value: f64,
    pub worst: String,
    pub worst_value: f64,
    pub range: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallMetrics {
    pub total: f64,
    pub mean_period_total: f64,
    /// First to last period, percent.
    pub growth: Option<f64>,
    pub best_period: String,
    pub best_period_total: f64,
    pub worst_period: String,
    pub worst_period_total: f64,
}

/// `High` below 30, `Medium` below 50, `Low` otherwise.
pub fn consistency_label(std: f64) -> &'static str {
    if std < 30.0 {
        "High"
    } else if std < 50.0 {
        "Medium"
    } else {
        "Low"
    }
}

impl QuarterlyMatrix {
    pub fn new(labels: &[&str], periods: &[&str], rows: &[&[f64]]) -> Result<Self> {
        if rows.len() != labels.len() {
            bail!("{} labels for {} rows", labels.len(), rows.len());
        }
        if let Some(bad) = rows.iter().position(|r| r.len() != periods.len()) {
            bail!(
                "row `{}` has {} values, expected {}",
                labels[bad],
                rows[bad].len(),
                periods.len()
            );
        }
        let flat: Vec<f64> = rows.iter().flat_map(|r| r.iter().copied()).collect();
        Ok(QuarterlyMatrix {
            labels: labels.iter().map(|s| s.to_string()).collect(),
            periods: periods.iter().map(|s| s.to_string()).collect(),
            values: Array2::from_shape_vec((labels.len(), periods.len()), flat)?,
        })
    }

    /// Sum across periods, one per row.
    pub fn row_totals(&self) -> Array1<f64> {
        self.values.sum_axis(Axis(1))
    }

    /// Sum across rows, one per period.
    pub fn period_totals(&self) -> Array1<f64> {
        self.values.sum_axis(Axis(0))
    }

    pub fn row_means(&self) -> Array1<f64> {
        self.values
            .mean_axis(Axis(1))
            .unwrap_or_else(|| Array1::from_elem(self.labels.len(), f64::NAN))
    }

    /// Population standard deviation of each row.
    pub fn row_std(&self) -> Array1<f64> {
        self.values.std_axis(Axis(1), 0.0)
    }

    /// Period-over-period growth of the period totals, percent.
    pub fn qoq_growth(&self) -> Vec<Option<f64>> {
        self.period_totals()
            .as_slice()
            .unwrap_or_default()
            .windows(2)
            .map(|w| stats::growth_rate(w[0], w[1]))
            .collect()
    }

    /// Row with the largest total.
    pub fn best_row(&self) -> Option<usize> {
        stats::argmax(&self.row_totals().to_vec())
    }

    /// Row with the smallest standard deviation.
    pub fn most_consistent(&self) -> Option<usize> {
        stats::argmin(&self.row_std().to_vec())
    }

    pub fn extremes(&self) -> Vec<RowExtremes> {
        self.values
            .outer_iter()
            .zip(&self.labels)
            .filter_map(|(row, label)| {
                let row = row.to_vec();
                let best = stats::argmax(&row)?;
                let worst = stats::argmin(&row)?;
                Some(RowExtremes {
                    label: label.clone(),
                    best: self.periods[best].clone(),
                    best_value: row[best],
                    worst: self.periods[worst].clone(),
                    worst_value: row[worst],
                    range: row[best] - row[worst],
                })
            })
            .collect()
    }

    /// Rows whose total is strictly above `target`, with the margin.
    pub fn rows_above(&self, target: f64) -> Vec<(String, f64, f64)> {
        self.row_totals()
            .iter()
            .zip(&self.labels)
            .filter(|(total, _)| **total > target)
            .map(|(total, label)| (label.clone(), *total, total - target))
            .collect()
    }

    pub fn overall(&self) -> Option<OverallMetrics> {
        let totals = self.period_totals().to_vec();
        let best = stats::argmax(&totals)?;
        let worst = stats::argmin(&totals)?;
        Some(OverallMetrics {
            total: self.values.sum(),
            mean_period_total: stats::mean(&totals),
            growth: stats::growth_rate(totals[0], totals[totals.len() - 1]),
            best_period: self.periods[best].clone(),
            best_period_total: totals[best],
            worst_period: self.periods[worst].clone(),
            worst_period_total: totals[worst],
        })
    }

    /// One row per label: the label column, one column per period, `Total`.
    pub fn to_batch(&self, label_name: &str) -> Result<RecordBatch> {
        let mut columns: Vec<(String, ArrayRef)> = vec![(
            label_name.to_string(),
            Arc::new(StringArray::from(self.labels.clone())),
        )];
        for (j, period) in self.periods.iter().enumerate() {
            let col = self.values.column(j).to_vec();
            columns.push((period.clone(), Arc::new(Float64Array::from(col))));
        }
        columns.push((
            "Total".to_string(),
            Arc::new(Float64Array::from(self.row_totals().to_vec())),
        ));
        from_columns(columns)
    }
}
