//! The concrete reports. Each `analyze`/`run` returns a value holding its
//! tables and headline figures; `print` renders it as report text and the
//! writers put the aggregate tables under the output directory.

pub mod business;
pub mod ecommerce;
pub mod executive;
pub mod quarterly;
pub mod transformation;

use crate::derive::round_all;
use crate::group::{group_agg, Agg};
use crate::report::with_share;
use crate::sort::{sort_values, SortKey};
use crate::table::{access::array_f64, access::array_str, column};
use anyhow::{Context, Result};
use arrow::record_batch::RecordBatch;

/// Aggregate by `key`, largest `Total_Revenue` first, with `share` as each
/// row's percent of revenue; floats rounded to two places.
pub(crate) fn ranked(df: &RecordBatch, key: &str, aggs: &[Agg], share: &str) -> Result<RecordBatch> {
    let t = group_agg(df, &[key], aggs).with_context(|| format!("{} summary", key))?;
    let t = sort_values(&t, &[SortKey::desc("Total_Revenue")])?;
    round_all(&with_share(&t, "Total_Revenue", share)?, 2)
}

/// Text of `name` at `row`, if present.
pub(crate) fn text_at(batch: &RecordBatch, name: &str, row: usize) -> Result<Option<String>> {
    if row >= batch.num_rows() {
        return Ok(None);
    }
    Ok(array_str(&column(batch, name)?.slice(row, 1))?.remove(0))
}

/// Number in `name` at `row`, if present.
pub(crate) fn number_at(batch: &RecordBatch, name: &str, row: usize) -> Result<Option<f64>> {
    if row >= batch.num_rows() {
        return Ok(None);
    }
    Ok(array_f64(&column(batch, name)?.slice(row, 1))?.remove(0))
}

/// Label and value of the first row, e.g. the leader of a sorted aggregate.
pub(crate) fn leader(batch: &RecordBatch, label: &str, value: &str) -> Result<Option<(String, f64)>> {
    Ok(text_at(batch, label, 0)?.zip(number_at(batch, value, 0)?))
}

/// Label and value of the last row.
pub(crate) fn trailer(batch: &RecordBatch, label: &str, value: &str) -> Result<Option<(String, f64)>> {
    match batch.num_rows() {
        0 => Ok(None),
        n => Ok(text_at(batch, label, n - 1)?.zip(number_at(batch, value, n - 1)?)),
    }
}

/// For a pivot with `index` as its first column and one numeric column per
/// category: each row's label, its best category and that value. The first
/// category wins ties; `skip` names columns to ignore (e.g. margins).
pub(crate) fn best_per_row(pivot: &RecordBatch, index: &str, skip: &[&str]) -> Result<Vec<(String, String, f64)>> {
    let schema = pivot.schema();
    let categories: Vec<&str> = schema
        .fields()
        .iter()
        .map(|f| f.name().as_str())
        .filter(|n| *n != index && !skip.contains(n))
        .collect();
    let columns = categories
        .iter()
        .map(|c| array_f64(column(pivot, c)?))
        .collect::<Result<Vec<_>>>()?;
    let labels = array_str(column(pivot, index)?)?;

    let mut out = Vec::with_capacity(pivot.num_rows());
    for (row, label) in labels.into_iter().enumerate() {
        let Some(label) = label else { continue };
        let row_values: Vec<f64> = columns
            .iter()
            .map(|c| c[row].unwrap_or(f64::NEG_INFINITY))
            .collect();
        if let Some(best) = crate::stats::argmax(&row_values) {
            out.push((label, categories[best].to_string(), row_values[best]));
        }
    }
    Ok(out)
}

/// For each category column of a pivot: the index label holding its largest
/// value. The first row wins ties.
pub(crate) fn best_per_column(pivot: &RecordBatch, index: &str) -> Result<Vec<(String, String, f64)>> {
    let labels = array_str(column(pivot, index)?)?;
    let mut out = Vec::new();
    for field in pivot.schema().fields() {
        if field.name() == index {
            continue;
        }
        let values: Vec<f64> = array_f64(column(pivot, field.name())?)?
            .into_iter()
            .map(|v| v.unwrap_or(f64::NEG_INFINITY))
            .collect();
        if let Some(best) = crate::stats::argmax(&values) {
            if let Some(label) = &labels[best] {
                out.push((field.name().clone(), label.clone(), values[best]));
            }
        }
    }
    Ok(out)
}
