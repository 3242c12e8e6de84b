// src/table/summary.rs
use crate::stats;
use crate::table::{
    access::array_f64,
    access::str_values,
    columns::from_columns,
    frame::{frame_of, to_batch},
};
use anyhow::{Context, Result};
use arrow::{
    array::{Array, ArrayRef, Float64Array, Int64Array, StringArray},
    datatypes::DataType,
    record_batch::RecordBatch,
};
use polars::prelude::{self as pl, IntoLazy, SortMultipleOptions};
use std::sync::Arc;

/// Distinct non-null values in first-seen order.
pub fn unique(batch: &RecordBatch, col: &str) -> Result<Vec<String>> {
    let mut seen = Vec::new();
    for v in str_values(batch, col)?.into_iter().flatten() {
        if !seen.contains(&v) {
            seen.push(v);
        }
    }
    Ok(seen)
}

pub fn nunique(batch: &RecordBatch, col: &str) -> Result<usize> {
    Ok(unique(batch, col)?.len())
}

/// `(value, count)` table, most frequent first; ties keep first appearance.
pub fn value_counts(batch: &RecordBatch, col: &str) -> Result<RecordBatch> {
    let by_count = SortMultipleOptions::default()
        .with_order_descending(true)
        .with_maintain_order(true);
    let counts = frame_of(batch, &[col])?
        .lazy()
        .select([pl::col(col).cast(pl::DataType::String)])
        .filter(pl::col(col).is_not_null())
        .group_by_stable([pl::col(col)])
        .agg([pl::len().cast(pl::DataType::Int64).alias("count")])
        .sort_by_exprs([pl::col("count")], by_count)
        .collect()
        .with_context(|| format!("counting values of `{}`", col))?;
    to_batch(&counts)
}

fn is_numeric(dt: &DataType) -> bool {
    matches!(
        dt,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// count / mean / std / min / quartiles / max for every numeric column.
/// Standard deviation is the sample one (ddof 1).
pub fn describe(batch: &RecordBatch) -> Result<RecordBatch> {
    const STATS: [&str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

    let mut columns: Vec<(String, ArrayRef)> = vec![(
        "stat".to_string(),
        Arc::new(StringArray::from(STATS.to_vec())) as ArrayRef,
    )];

    let schema = batch.schema();
    for (field, arr) in schema.fields().iter().zip(batch.columns()) {
        if !is_numeric(field.data_type()) {
            continue;
        }
        let values: Vec<f64> = array_f64(arr)?.into_iter().flatten().collect();
        let present = !values.is_empty();
        let summary = vec![
            Some(values.len() as f64),
            present.then(|| stats::mean(&values)),
            (values.len() > 1).then(|| stats::std(&values, 1)),
            stats::min(&values),
            present.then(|| stats::percentile(&values, 25.0)),
            present.then(|| stats::percentile(&values, 50.0)),
            present.then(|| stats::percentile(&values, 75.0)),
            stats::max(&values),
        ];
        columns.push((
            field.name().clone(),
            Arc::new(Float64Array::from(summary)) as ArrayRef,
        ));
    }

    from_columns(columns)
}

/// Column name, Arrow type and non-null count per column.
pub fn info(batch: &RecordBatch) -> Result<RecordBatch> {
    let schema = batch.schema();
    let names: Vec<String> = schema.fields().iter().map(|f| f.name().clone()).collect();
    let types: Vec<String> = schema
        .fields()
        .iter()
        .map(|f| f.data_type().to_string())
        .collect();
    let non_null: Vec<i64> = batch
        .columns()
        .iter()
        .map(|c| (c.len() - c.null_count()) as i64)
        .collect();

    from_columns(vec![
        ("column", Arc::new(StringArray::from(names)) as ArrayRef),
        ("dtype", Arc::new(StringArray::from(types)) as ArrayRef),
        ("non_null", Arc::new(Int64Array::from(non_null)) as ArrayRef),
    ])
}
